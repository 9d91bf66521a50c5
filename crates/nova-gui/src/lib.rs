//! Screen-space GUI batching: per-texture index/vertex batches flushed to the native sink.
#![forbid(unsafe_code)]

pub mod atlas;
pub mod batch;
pub mod chrome;
pub mod color;
pub mod screen;

pub use atlas::{AtlasResolver, ResourceLocation};
pub use batch::{FLOATS_PER_VERTEX, GuiBatch, GuiDrawBatcher, LEGACY_UV_SCALE, legacy_uv};
pub use chrome::{IRect, WindowChrome, WindowTheme};
pub use color::Rgb;
pub use screen::{FrameContext, FrameReport, GuiScreen, nova_draw_screen};

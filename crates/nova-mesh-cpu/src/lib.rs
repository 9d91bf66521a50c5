//! CPU-side chunk geometry capture: vertex sinks, index lists and the per-section assembler.
#![forbid(unsafe_code)]

pub mod capture;
pub mod face;
pub mod index;
pub mod layout;
pub mod render_chunk;
pub mod renderer;

pub use capture::{CapturingVertexBuffer, DrawMode, VertexSink};
pub use face::Face;
pub use index::{IndexList, Winding};
pub use layout::{VertexElement, VertexLayout};
pub use render_chunk::{ChunkState, CompileStats, RenderChunk};
pub use renderer::{BlockRenderer, CubeBlockRenderer};

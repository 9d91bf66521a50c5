//! Block, material, registry and geometry-filter crate.
#![forbid(unsafe_code)]

pub mod config;
pub mod filter;
pub mod material;
pub mod registry;
pub mod types;

pub use filter::{FilterDef, FilterError, FilterSet, GeometryFilter, GeometryType};
pub use material::{MaterialCatalog, UvRect};
pub use registry::{BlockRegistry, RegistryError};
pub use types::{Block, BlockId, BlockState, BlockType, MaterialId};

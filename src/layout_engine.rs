mod graph;
pub mod tiling;

pub use graph::{LayoutKind, Orientation};
pub use tiling::{TilingLimits, tile};

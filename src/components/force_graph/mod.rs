//! Canvas renderer for a built [`Graph`](crate::graph::Graph): force-directed
//! layout, eased selection highlight and pan/zoom.

mod component;
mod render;
mod state;
mod types;

pub use component::ForceGraphCanvas;
pub use types::{Camera, PaintSettings};

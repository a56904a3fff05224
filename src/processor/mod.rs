//! Collaborators that turn level parts into drawable geometry.
//!
//! - [`WallProcessor`] / [`FlatProcessor`] - split sides and sections into parts
//! - [`MeshBuilder`] - temporary buffer the parts draw into, bucketed by state
//! - [`PipelineResolver`] - maps a bucket's state to a pipeline id
//!
//! The `Basic*` processors and [`PipelineCache`] are reference
//! implementations; renderers plug in their own.

mod builder;
mod flat;
mod pipeline;
mod wall;

pub use builder::*;
pub use flat::{BasicFlatProcessor, FlatPart, FlatProcessor};
pub use pipeline::{PipelineCache, PipelineResolver};
pub use wall::{BasicWallProcessor, WallPart, WallParts, WallProcessor};

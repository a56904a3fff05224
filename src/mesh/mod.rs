//! Submesh construction.
//!
//! A [`LevelSubmesh`] is built by a fixed sequence of stages:
//!
//! 1. `extract` - wall and flat parts become vertices and surfaces
//! 2. `link` - surfaces are registered against their sides and subsectors
//! 3. `index` - surfaces are triangulated and grouped into draw ranges
//! 4. `lightmap` - every surface gets a lightmap tile transform
//! 5. `atlas` - tiles are packed into lightmap pages

mod atlas;
mod extract;
mod index;
mod lightmap;
mod link;
mod submesh;
mod surface;

pub use atlas::{PackedRect, RectPacker};
pub use lightmap::{best_axis, round_sample_distance, PlaneAxis};
pub use link::SurfaceLinks;
pub use submesh::{BuildContext, LevelSubmesh, SubmeshStats};
pub use surface::*;

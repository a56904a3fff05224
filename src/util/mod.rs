//! Utility types shared by every stage.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - [`BBox3f`] / [`Plane`] - Bounds and plane math on top of `glam`

mod error;
mod math;

pub use error::*;
pub use math::*;

//! # levelmesh
//!
//! Turns a BSP-compiled Doom-style level into renderer-ready geometry: a
//! triangulated vertex/index buffer grouped into draw ranges, plus a lightmap
//! atlas parameterization for every surface.
//!
//! ## Modules
//!
//! - [`util`] - Errors, bounds and plane math
//! - [`level`] - Read-only level model and a builder for synthetic levels
//! - [`processor`] - Wall/flat processors, the bucketing mesh builder, pipeline ids
//! - [`mesh`] - Submesh extraction, indexing, linking, lightmap tiles and atlas packing
//! - [`config`] - Build settings
//!
//! ## Example
//!
//! ```ignore
//! use levelmesh::prelude::*;
//!
//! let level = Level::load("map01.json")?;
//! let config = MeshConfig::default();
//! let mut pipelines = PipelineCache::new();
//! let mut ctx = BuildContext::new(&level, &BasicWallProcessor, &BasicFlatProcessor, &mut pipelines, &config);
//!
//! let mesh = LevelSubmesh::new_static(&mut ctx, 0)?;
//! for range in mesh.draw_list() {
//!     println!("pipeline {}: {} indices", range.pipeline_id, range.count);
//! }
//! ```

pub mod config;
pub mod level;
pub mod mesh;
pub mod processor;
pub mod util;

// Re-export commonly used types
pub use config::MeshConfig;
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::MeshConfig;
    pub use crate::level::{Level, LevelBuilder, MaterialId, SecPlane, SectorDef};
    pub use crate::mesh::{
        BuildContext, DrawRange, LevelMeshSurface, LevelSubmesh, MeshVertex, SubmeshStats, SurfaceType,
    };
    pub use crate::processor::{
        BasicFlatProcessor, BasicWallProcessor, FlatProcessor, MeshBuilder, PipelineCache, PipelineResolver,
        WallProcessor,
    };
    pub use crate::util::{BBox3f, Error, Plane, Result};
}

//! Lightmap tile transforms: which texels of which tile cover a surface.

use glam::Vec3;
use tracing::debug;

use super::{AtlasTile, LevelSubmesh, TileTransform};
use crate::config::MeshConfig;
use crate::level::Level;
use crate::util::BBox3f;

/// Axis-aligned plane a surface is projected onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaneAxis {
    /// Normal mostly along X; texels span Y and Z.
    YZ,
    /// Normal mostly along Y; texels span X and Z.
    XZ,
    /// Normal mostly along Z; texels span X and Y.
    XY,
}

/// Dominant axis of a plane normal. Ties go to X, then Y.
pub fn best_axis(normal: Vec3) -> PlaneAxis {
    let n = normal.abs();
    if n.x >= n.y && n.x >= n.z {
        PlaneAxis::YZ
    } else if n.y >= n.x && n.y >= n.z {
        PlaneAxis::XZ
    } else {
        PlaneAxis::XY
    }
}

/// Effective sample distance in map units per texel.
///
/// The request is divided by the lightmap scale (never below 1/4), rounded
/// and kept at least 1, then rounded up to a power of two. Results beyond
/// 16 bits saturate to `0xFFFF`.
pub fn round_sample_distance(requested: u16, lightmap_scale: f32) -> u16 {
    let scaled = (f32::from(requested) / lightmap_scale.max(0.25)).round().max(1.0) as u32;
    u16::try_from(scaled.next_power_of_two()).unwrap_or(u16::MAX)
}

/// Compute the tile transform, tile size and tile-local lightmap
/// coordinates of every surface.
#[tracing::instrument(skip_all, fields(surfaces = mesh.surfaces.len()))]
pub(crate) fn setup_lightmap_uvs(mesh: &mut LevelSubmesh, level: &Level, config: &MeshConfig) {
    let page = config.page_size;
    mesh.page_size = page;
    let default_distance = config.sample_distance.unwrap_or(level.lightmap_sample_distance);

    for surface in &mut mesh.surfaces {
        let loc = surface.location;
        let verts = &mut mesh.vertices[loc.start_vert..loc.start_vert + loc.num_verts];

        let bounds = BBox3f::from_points(verts.iter().map(|v| v.position()));
        surface.bounds = bounds;

        let requested = if surface.sample_dimension > 0 { surface.sample_dimension } else { default_distance };
        surface.sample_dimension = round_sample_distance(requested, config.lightmap_scale);

        if bounds.is_empty() {
            surface.tile_transform = TileTransform::default();
            surface.atlas_tile = AtlasTile::default();
            continue;
        }

        let (transform, width, height) = tile_transform(bounds, surface.plane.normal, surface.sample_dimension, page);
        for v in verts.iter_mut() {
            let uv = transform.project(v.position());
            v.lu = uv.x;
            v.lv = uv.y;
        }
        surface.tile_transform = transform;
        surface.atlas_tile = AtlasTile { width, height, ..AtlasTile::default() };
    }

    debug!(page_size = page, default_distance, "lightmap tiles computed");
}

/// Tile transform and tile size for a surface's bounds.
fn tile_transform(bounds: BBox3f, normal: Vec3, sample_distance: u16, page: u32) -> (TileTransform, u32, u32) {
    let sd = f32::from(sample_distance);
    let snapped = bounds.snap_to_grid(sd);
    let rounded = (snapped.max - snapped.min) / sd;

    let step = 1.0 / sd;
    let (mut width, mut height, mut u, mut v) = match best_axis(normal) {
        PlaneAxis::YZ => (rounded.y, rounded.z, Vec3::new(0.0, step, 0.0), Vec3::new(0.0, 0.0, step)),
        PlaneAxis::XZ => (rounded.x, rounded.z, Vec3::new(step, 0.0, 0.0), Vec3::new(0.0, 0.0, step)),
        PlaneAxis::XY => (rounded.x, rounded.y, Vec3::new(step, 0.0, 0.0), Vec3::new(0.0, step, 0.0)),
    };

    let limit = page.saturating_sub(2) as f32;
    if width > limit {
        u *= limit / width;
        width = limit;
    }
    if height > limit {
        v *= limit / height;
        height = limit;
    }

    let transform = TileTransform {
        translate_world_to_local: snapped.min,
        proj_local_to_u: u,
        proj_local_to_v: v,
    };
    (transform, width as u32, height as u32)
}

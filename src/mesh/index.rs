//! Triangulation of surfaces and grouping into draw ranges.

use glam::Vec3;
use tracing::{debug, trace};

use super::{DrawRange, LevelSubmesh, MeshVertex, SurfaceType};

/// Squared cross product length at or below which a triangle has no area.
const DEGENERATE_EPSILON: f32 = 1.0e-6;

/// Whether the triangle `v0 v1 v2` has (almost) zero area.
#[inline]
pub(crate) fn is_degenerate(v0: Vec3, v1: Vec3, v2: Vec3) -> bool {
    (v1 - v0).cross(v2 - v0).length_squared() <= DEGENERATE_EPSILON
}

/// Rebuild the index buffer, the per-triangle surface indexes and both draw
/// range lists from the surfaces' vertex ranges.
///
/// Surfaces are grouped by `(pipeline_id, is_sky)`; within a group they keep
/// their extraction order. Sky groups go to the portal list.
#[tracing::instrument(skip_all, fields(surfaces = mesh.surfaces.len()))]
pub(crate) fn create_indexes(mesh: &mut LevelSubmesh) {
    mesh.indices.clear();
    mesh.surface_indexes.clear();
    mesh.draw_list.clear();
    mesh.portal_list.clear();

    let mut order: Vec<((i32, bool), usize)> = mesh
        .surfaces
        .iter()
        .enumerate()
        .map(|(i, s)| ((s.pipeline_id, s.is_sky), i))
        .collect();
    order.sort_by_key(|&(key, _)| key);

    for group in order.chunk_by(|a, b| a.0 == b.0) {
        let (pipeline_id, is_sky) = group[0].0;
        let start = mesh.indices.len();

        for &(_, surface_index) in group {
            let surface = &mut mesh.surfaces[surface_index];
            let loc = &mut surface.location;
            loc.start_element = mesh.indices.len();
            loc.num_elements = 0;

            let verts = &mesh.vertices[loc.start_vert..loc.start_vert + loc.num_verts];
            let mut emitter = TriangleEmitter {
                indices: &mut mesh.indices,
                surface_indexes: &mut mesh.surface_indexes,
                verts,
                base: loc.start_vert as u32,
                surface: surface_index as u32,
                emitted: 0,
            };

            match surface.ty {
                SurfaceType::Ceiling => {
                    for j in 2..verts.len() {
                        emitter.emit([0, j - 1, j], [0, j - 1, j]);
                    }
                }
                SurfaceType::Floor => {
                    for j in 2..verts.len() {
                        emitter.emit([j, j - 1, 0], [0, j - 1, j]);
                    }
                }
                SurfaceType::UpperSide | SurfaceType::MiddleSide | SurfaceType::LowerSide => {
                    if verts.len() >= 4 {
                        emitter.emit([0, 1, 2], [0, 2, 1]);
                        emitter.emit([0, 2, 3], [0, 2, 3]);
                    }
                }
            }
            loc.num_elements = emitter.emitted;
        }

        let count = mesh.indices.len() - start;
        if count == 0 {
            trace!(pipeline_id, is_sky, "skipping empty draw range");
            continue;
        }
        let range = DrawRange { pipeline_id, start, count };
        if is_sky {
            mesh.portal_list.push(range);
        } else {
            mesh.draw_list.push(range);
        }
    }

    debug!(
        triangles = mesh.surface_indexes.len(),
        draw_ranges = mesh.draw_list.len(),
        portal_ranges = mesh.portal_list.len(),
        "indexed surfaces"
    );
}

/// Appends the non-degenerate triangles of one surface.
struct TriangleEmitter<'a> {
    indices: &'a mut Vec<u32>,
    surface_indexes: &'a mut Vec<u32>,
    verts: &'a [MeshVertex],
    base: u32,
    surface: u32,
    emitted: usize,
}

impl TriangleEmitter<'_> {
    /// Push `tri` (local vertex numbers) unless the triangle `check` has no area.
    fn emit(&mut self, tri: [usize; 3], check: [usize; 3]) {
        let p = |i: usize| self.verts[i].position();
        if is_degenerate(p(check[0]), p(check[1]), p(check[2])) {
            return;
        }
        let base = self.base;
        self.indices.extend(tri.iter().map(|&i| base + i as u32));
        self.surface_indexes.push(self.surface);
        self.emitted += 3;
    }
}

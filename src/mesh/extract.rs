//! Geometry extraction: wall and flat parts become submesh vertices and surfaces.

use glam::{Vec2, Vec3};
use tracing::{debug, trace, warn};

use super::{LevelMeshSurface, LevelSubmesh, MeshLocation, MeshVertex, SurfaceType};
use crate::config::MeshConfig;
use crate::level::{Level, SidePart};
use crate::processor::{ApplyState, DepthFunc, MeshBuilder};
use crate::util::Plane;

use super::submesh::BuildContext;

/// Reset the builder to the state every static part is captured with.
fn reset_render_state(builder: &mut MeshBuilder, config: &MeshConfig, masked: bool) {
    builder.set_depth_func(DepthFunc::LessEqual);
    builder.clear_depth_bias();
    builder.enable_texture(config.use_textures);
    builder.enable_brightmap(true);
    builder.alpha_func(if masked { config.mask_threshold } else { 0.0 });
}

/// Record a bucket's uniforms and material, returning its uniform index.
fn push_uniforms(mesh: &mut LevelSubmesh, state: &ApplyState) -> u32 {
    let index = mesh.uniforms.len() as u32;
    mesh.uniforms.push(state.uniforms);
    mesh.materials.push(state.material);
    index
}

fn side_part_slot(ty: SurfaceType) -> usize {
    match ty {
        SurfaceType::UpperSide => SidePart::Upper as usize,
        SurfaceType::LowerSide => SidePart::Lower as usize,
        _ => SidePart::Middle as usize,
    }
}

/// Extract every non-polyobject wall part and every flat of the level.
#[tracing::instrument(skip_all, fields(sides = ctx.level.sides.len(), sectors = ctx.level.sectors.len()))]
pub(crate) fn create_static_surfaces(mesh: &mut LevelSubmesh, ctx: &mut BuildContext<'_>) {
    let mut builder = MeshBuilder::new();
    create_wall_surfaces(mesh, ctx, &mut builder);
    create_flat_surfaces(mesh, ctx, &mut builder);
    debug!(
        surfaces = mesh.surfaces.len(),
        vertices = mesh.vertices.len(),
        wall_portals = mesh.wall_portals.len(),
        "extracted static surfaces"
    );
}

/// Surfaces of moving geometry.
///
/// Polyobjects are rendered through the regular wall path; nothing in the
/// level is extracted into the dynamic set.
pub(crate) fn create_dynamic_surfaces(_mesh: &mut LevelSubmesh, _ctx: &mut BuildContext<'_>) {
    trace!("no dynamic surfaces to extract");
}

fn create_wall_surfaces(mesh: &mut LevelSubmesh, ctx: &mut BuildContext<'_>, builder: &mut MeshBuilder) {
    let level = ctx.level;
    let side_segs = level.side_segs();

    for (side_index, side) in level.sides.iter().enumerate() {
        if side.polyobj {
            trace!(side = side_index, "skipping polyobject side");
            continue;
        }
        let Some((subsector, seg_index)) = side_segs[side_index] else {
            trace!(side = side_index, "side has no seg");
            continue;
        };

        let front = side.sector;
        let back = level.back_sector(side_index);
        let line = &level.lines[side.line];
        let front_sector = &level.sectors[front];

        let result = ctx.walls.process(level, side_index, &level.segs[seg_index], front, back);

        for part in &result.parts {
            reset_render_state(builder, ctx.config, part.masked);
            part.draw(builder);

            let start_vert = mesh.vertices.len();
            let mut pipeline_id = 0;
            for (state, lists) in builder.buckets() {
                pipeline_id = ctx.pipelines.pipeline_id(state);
                let uniform_index = push_uniforms(mesh, state);
                for v in builder.flatten(lists) {
                    mesh.vertices.push(v);
                    mesh.uniform_indexes.push(uniform_index);
                }
            }
            builder.clear();

            let num_verts = mesh.vertices.len() - start_vert;
            debug_assert!(num_verts >= 4, "wall part produced {num_verts} vertices");
            if num_verts < 4 {
                warn!(side = side_index, num_verts, "dropping wall part that is not a quad");
                mesh.vertices.truncate(start_vert);
                mesh.uniform_indexes.truncate(start_vert);
                continue;
            }

            let p = |i: usize| mesh.vertices[start_vert + i].position();
            let plane = Plane::from_quad(p(3), p(2), p(1), p(0));

            let mut surface = LevelMeshSurface::new(part.ty, side_index);
            surface.side = Some(side_index);
            surface.subsector = Some(subsector);
            surface.control_sector = part.control_sector;
            surface.always_update = front_sector.dynamic_lighting;
            surface.sector_group = front_sector.sector_group;
            surface.alpha = line.alpha;
            surface.location = MeshLocation { start_vert, num_verts, ..MeshLocation::default() };
            surface.plane = plane;
            surface.material = part.material;
            surface.pipeline_id = pipeline_id;
            surface.portal_index = if part.ty == SurfaceType::MiddleSide { line.portal } else { 0 };
            surface.sample_dimension = side.sample_distance[side_part_slot(part.ty)];
            mesh.surfaces.push(surface);
        }

        mesh.wall_portals.extend(result.portals);
    }
}

fn create_flat_surfaces(mesh: &mut LevelSubmesh, ctx: &mut BuildContext<'_>, builder: &mut MeshBuilder) {
    let level = ctx.level;

    for (sector_index, sector) in level.sectors.iter().enumerate() {
        for (_, section) in level.sections_for_sector(sector_index) {
            let parts = ctx.flats.process(level, sector_index, section);

            for part in &parts {
                reset_render_state(builder, ctx.config, part.masked);
                part.draw(level, sector_index, section, builder);

                // Only the first bucket's state is kept; the rings are emitted below.
                let first = builder.buckets().first().map(|(state, _)| *state);
                builder.clear();
                let Some(state) = first else {
                    trace!(sector = sector_index, ceiling = part.ceiling, "flat part drew nothing");
                    continue;
                };
                let pipeline_id = ctx.pipelines.pipeline_id(&state);
                let uniform_index = push_uniforms(mesh, &state);

                let sec_plane = part.sec_plane(level, sector_index);
                let mut plane = Plane::new(sec_plane.normal, -sec_plane.d);
                if part.control_sector.is_some() {
                    plane = -plane;
                }
                let plane_index = usize::from(part.ceiling);

                for &sub_index in &section.subsectors {
                    let segs = level.subsector_segs(&level.subsectors[sub_index]);
                    let start_vert = mesh.vertices.len();

                    // Reverse seg order gives the ring the winding the fans expect.
                    for seg in segs.iter().rev() {
                        let p = level.vertex(seg.v1);
                        let pos = Vec3::new(p.x, p.y, sec_plane.z_at_point(p));
                        mesh.vertices.push(MeshVertex::new(pos, Vec2::new(p.x / 64.0, -p.y / 64.0)));
                        mesh.uniform_indexes.push(uniform_index);
                    }

                    let ty = if part.ceiling { SurfaceType::Ceiling } else { SurfaceType::Floor };
                    let mut surface = LevelMeshSurface::new(ty, sub_index);
                    surface.subsector = Some(sub_index);
                    surface.control_sector = part.control_sector;
                    surface.always_update = sector.dynamic_lighting;
                    surface.sector_group = sector.sector_group;
                    surface.alpha = part.alpha;
                    surface.material = state.material;
                    surface.pipeline_id = pipeline_id;
                    surface.portal_index = sector.portals[plane_index];
                    surface.is_sky = part.sky;
                    surface.plane = plane;
                    surface.sample_dimension = sector.sample_distance[plane_index];
                    surface.location = MeshLocation { start_vert, num_verts: segs.len(), ..MeshLocation::default() };
                    mesh.surfaces.push(surface);
                }
            }
        }
    }
}

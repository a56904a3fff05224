//! End-to-end tests: level in, indexed submesh with packed lightmap tiles out.

use glam::{Vec2, Vec3};

use levelmesh::level::Seg;
use levelmesh::prelude::*;
use levelmesh::processor::{ApplyState, WallPart, WallParts};

/// Wall processor that produces nothing; isolates the flats.
struct NoWalls;

impl WallProcessor for NoWalls {
    fn process(&self, _: &Level, _: usize, _: &Seg, _: usize, _: Option<usize>) -> WallParts {
        WallParts::default()
    }
}

fn build_with(
    level: &Level,
    walls: &dyn WallProcessor,
    pipelines: &mut dyn PipelineResolver,
    config: &MeshConfig,
) -> Result<LevelSubmesh> {
    let mut ctx = BuildContext::new(level, walls, &BasicFlatProcessor, pipelines, config);
    LevelSubmesh::new_static(&mut ctx, 0)
}

fn build(level: &Level) -> LevelSubmesh {
    let mut pipelines = PipelineCache::new();
    build_with(level, &BasicWallProcessor, &mut pipelines, &MeshConfig::default()).expect("build failed")
}

/// Rooms in a row, alternating floor heights, with a sloped ramp room.
fn stepped_level() -> Level {
    let mut b = LevelBuilder::new();
    for i in 0..5 {
        let step = (i % 2) as f32 * 24.0;
        let mut def = SectorDef::new(step, 160.0 - step);
        if i == 3 {
            def = def.sky_ceiling();
        }
        let s = b.add_sector(def);
        let x = i as f32 * 128.0;
        b.add_rect(s, Vec2::new(x, 0.0), Vec2::new(x + 128.0, 96.0));
    }
    let ramp = b.add_sector(
        SectorDef::new(0.0, 192.0).floor_plane(SecPlane::through(Vec3::new(0.0, 96.0, 0.0), Vec3::new(0.0, 0.25, 1.0))),
    );
    b.add_rect(ramp, Vec2::new(0.0, 96.0), Vec2::new(128.0, 224.0));
    b.sample_distance(16);
    b.build()
}

#[test]
fn test_single_floor_tile_at_origin() {
    let mut b = LevelBuilder::new();
    let a = b.add_sector(SectorDef::new(0.0, 128.0));
    let c = b.add_sector(SectorDef::new(0.0, 128.0));
    b.add_rect(a, Vec2::ZERO, Vec2::splat(128.0));
    b.add_rect(c, Vec2::new(1024.0, 0.0), Vec2::new(1152.0, 128.0));
    b.sample_distance(32);
    let level = b.build();

    let mut pipelines = PipelineCache::new();
    let mesh = build_with(&level, &NoWalls, &mut pipelines, &MeshConfig::default()).expect("build failed");

    let floors: Vec<&LevelMeshSurface> = mesh.surfaces().iter().filter(|s| s.ty == SurfaceType::Floor).collect();
    assert_eq!(floors.len(), 2);

    // 0..128 expanded by one 32-unit sample on each side: 6 texels.
    let first = floors[0].atlas_tile;
    assert_eq!((first.width, first.height), (6, 6));
    assert_eq!((first.x, first.y, first.page), (0, 0, Some(0)));
    assert_eq!(floors[0].sample_dimension, 32);

    let second = floors[1].atlas_tile;
    assert_eq!((second.width, second.height), (6, 6));
    assert!(!first.overlaps(&second));
    assert_eq!(mesh.page_count(), 1);
}

#[test]
fn test_collapsed_lower_wall_keeps_second_triangle() {
    let mut b = LevelBuilder::new();
    let left = b.add_sector(SectorDef::new(0.0, 128.0));
    // Floor height 0 at y = 64, rising to 32 at y = 0.
    let right = b.add_sector(
        SectorDef::new(0.0, 128.0).floor_plane(SecPlane::through(Vec3::new(0.0, 64.0, 0.0), Vec3::new(0.0, 0.5, 1.0))),
    );
    b.add_rect(left, Vec2::new(0.0, 0.0), Vec2::new(64.0, 64.0));
    b.add_rect(right, Vec2::new(64.0, 0.0), Vec2::new(128.0, 64.0));
    let level = b.build();
    let mesh = build(&level);

    let (index, lower) = mesh
        .surfaces()
        .iter()
        .enumerate()
        .find(|(_, s)| s.ty == SurfaceType::LowerSide)
        .expect("lower wall missing");
    let start = lower.location.start_vert as u32;

    // The seg starts where both floors meet, so corners 0 and 1 coincide.
    let triangles: Vec<[u32; 3]> = mesh.surface_triangles(index).collect();
    assert_eq!(triangles, vec![[start, start + 2, start + 3]]);
    assert_eq!(lower.location.num_elements, 3);
}

#[test]
fn test_no_degenerate_triangles_and_consistent_winding() {
    let level = stepped_level();
    let mesh = build(&level);
    let verts = mesh.vertices();

    assert_eq!(mesh.surface_indexes().len() * 3, mesh.indices().len());
    for (tri, &surface) in mesh.indices().chunks_exact(3).zip(mesh.surface_indexes()) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| verts[i as usize].position());
        let cross = (b - a).cross(c - a);
        assert!(cross.length_squared() > 1e-6, "degenerate triangle {tri:?}");

        let s = mesh.surface(surface as usize).expect("surface index out of range");
        assert!(
            cross.dot(s.plane.normal) < 0.0,
            "{:?} triangle {tri:?} is not clockwise around {:?}",
            s.ty,
            s.plane
        );
        let range = s.location.start_vert as u32..(s.location.start_vert + s.location.num_verts) as u32;
        assert!(tri.iter().all(|i| range.contains(i)), "triangle {tri:?} leaves its surface");
    }
}

#[test]
fn test_triangle_counts_per_surface() {
    let level = stepped_level();
    let mesh = build(&level);

    for (i, s) in mesh.surfaces().iter().enumerate() {
        let n = s.location.num_elements;
        if s.ty.is_side() {
            assert!(matches!(n, 0 | 3 | 6), "{:?} emitted {n} indices", s.ty);
        } else {
            let ring = s.location.num_verts;
            assert!(n / 3 <= ring - 2);
            let pivot = s.location.start_vert as u32;
            for tri in mesh.surface_triangles(i) {
                assert!(tri.contains(&pivot), "fan triangle {tri:?} misses pivot {pivot}");
            }
        }
    }
}

#[test]
fn test_lightmap_uvs_inside_tiles() {
    let level = stepped_level();
    let mesh = build(&level);
    let page = mesh.page_size() as f32;

    for (i, s) in mesh.surfaces().iter().enumerate() {
        let tile = s.atlas_tile;
        let page_index = tile.page.expect("surface was not packed");
        for v in mesh.surface_vertices(i) {
            assert_eq!(v.lindex, page_index as f32);
            let local = v.lightmap_uv() * page - Vec2::new(tile.x as f32, tile.y as f32);
            let eps = 1e-3;
            assert!(local.x >= -eps && local.x <= tile.width as f32 + eps, "u {} outside tile {tile:?}", local.x);
            assert!(local.y >= -eps && local.y <= tile.height as f32 + eps, "v {} outside tile {tile:?}", local.y);
        }
    }
}

#[test]
fn test_packed_tiles_do_not_overlap() {
    let level = stepped_level();
    let config = MeshConfig { page_size: 48, ..MeshConfig::default() };
    let mut pipelines = PipelineCache::new();
    let mesh = build_with(&level, &BasicWallProcessor, &mut pipelines, &config).expect("build failed");
    assert!(mesh.page_count() > 1, "expected the small pages to overflow");

    let tiles: Vec<_> = mesh.surfaces().iter().map(|s| s.atlas_tile).collect();
    for (i, a) in tiles.iter().enumerate() {
        assert!(a.x + a.width <= 48 && a.y + a.height <= 48);
        for b in &tiles[i + 1..] {
            assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
        }
    }
}

#[test]
fn test_oversized_wall_is_clamped() {
    let mut b = LevelBuilder::new();
    let s = b.add_sector(SectorDef::new(0.0, 64.0));
    b.add_rect(s, Vec2::ZERO, Vec2::new(4096.0, 64.0));
    b.sample_distance(16);
    let level = b.build();

    let config = MeshConfig { page_size: 128, ..MeshConfig::default() };
    let mut pipelines = PipelineCache::new();
    let mesh = build_with(&level, &BasicWallProcessor, &mut pipelines, &config).expect("build failed");

    let long_wall = mesh
        .surfaces()
        .iter()
        .find(|s| s.ty.is_side() && s.bounds.max.x - s.bounds.min.x > 1000.0)
        .expect("long wall missing");
    assert_eq!(long_wall.atlas_tile.width, 126);
    // (4096 + 2 * 16) / 16 texels squeezed into 126.
    let expected = (1.0 / 16.0) * (126.0 / 258.0);
    assert!((long_wall.tile_transform.proj_local_to_u.x - expected).abs() < 1e-6);
    assert_eq!(long_wall.atlas_tile.height, 6);
}

#[test]
fn test_page_limit_reports_atlas_full() {
    let level = stepped_level();
    let config = MeshConfig { page_size: 32, max_pages: Some(1), ..MeshConfig::default() };
    let mut pipelines = PipelineCache::new();
    let err = build_with(&level, &BasicWallProcessor, &mut pipelines, &config).expect_err("pack should fail");
    assert!(matches!(err, Error::AtlasFull { page_size: 32, pages: 1, .. }), "{err}");
}

#[test]
fn test_rebuild_is_deterministic() {
    let level = stepped_level();
    let a = build(&level);
    let b = build(&level);

    assert_eq!(a.stats(), b.stats());
    assert_eq!(a.indices(), b.indices());
    assert_eq!(a.draw_list(), b.draw_list());
    assert_eq!(a.portal_list(), b.portal_list());
    let tiles = |m: &LevelSubmesh| m.surfaces().iter().map(|s| s.atlas_tile).collect::<Vec<_>>();
    assert_eq!(tiles(&a), tiles(&b));

    let config = MeshConfig::default();
    let mut pipelines = PipelineCache::new();
    let mut ctx = BuildContext::new(&level, &BasicWallProcessor, &BasicFlatProcessor, &mut pipelines, &config);
    let mut dynamic = LevelSubmesh::new_dynamic();
    dynamic.update(&mut ctx, 0).expect("update failed");
    let first = dynamic.stats();
    dynamic.update(&mut ctx, 0).expect("update failed");
    assert_eq!(dynamic.stats(), first);
    assert!(dynamic.draw_list().is_empty());
}

#[test]
fn test_sky_ceilings_go_to_portal_list() {
    let level = stepped_level();
    let mesh = build(&level);

    assert!(!mesh.portal_list().is_empty());
    let sky_elements: usize = mesh.portal_list().iter().map(|r| r.count).sum();
    let expected: usize = mesh.surfaces().iter().filter(|s| s.is_sky).map(|s| s.location.num_elements).sum();
    assert_eq!(sky_elements, expected);

    for range in mesh.draw_list().iter().chain(mesh.portal_list()) {
        assert!(range.count > 0);
        assert!(range.start + range.count <= mesh.indices().len());
    }
}

#[test]
fn test_zero_height_part_gets_no_range() {
    /// Adds a zero-height quad with its own material to every side.
    struct FlatQuads;
    impl WallProcessor for FlatQuads {
        fn process(&self, level: &Level, side: usize, seg: &Seg, front: usize, back: Option<usize>) -> WallParts {
            let mut out = BasicWallProcessor.process(level, side, seg, front, back);
            let (v1, v2) = (level.vertex(seg.v1), level.vertex(seg.v2));
            let mut part = WallPart::quad(SurfaceType::MiddleSide, v1, v2, [32.0; 2], [32.0; 2]);
            part.material = Some(MaterialId(99));
            out.parts.push(part);
            out
        }
    }

    let mut b = LevelBuilder::new();
    let s = b.add_sector(SectorDef::new(0.0, 128.0));
    b.add_rect(s, Vec2::ZERO, Vec2::splat(64.0));
    let level = b.build();

    let mut pipelines = |state: &ApplyState| if state.material == Some(MaterialId(99)) { 7 } else { 1 };
    let mesh = build_with(&level, &FlatQuads, &mut pipelines, &MeshConfig::default()).expect("build failed");

    let empty: Vec<_> = mesh.surfaces().iter().filter(|s| s.pipeline_id == 7).collect();
    assert_eq!(empty.len(), 4);
    assert!(empty.iter().all(|s| s.location.num_elements == 0));
    assert!(mesh.draw_list().iter().all(|r| r.pipeline_id != 7));
    assert_eq!(mesh.draw_list().len(), 1);
}

#[test]
fn test_links_cover_sides_and_subsectors() {
    let mut b = LevelBuilder::new();
    let model = b.add_sector(SectorDef::new(48.0, 64.0));
    let hall = b.add_sector(SectorDef::new(0.0, 128.0));
    let pool = b.add_sector(SectorDef::new(16.0, 128.0).ffloor(model, Some(MaterialId(5))));
    b.add_rect(hall, Vec2::new(0.0, 0.0), Vec2::new(64.0, 64.0));
    b.add_rect(pool, Vec2::new(64.0, 0.0), Vec2::new(128.0, 64.0));
    let level = b.build();
    let mesh = build(&level);

    // Pool subsector: own floor and ceiling plus both faces of the 3D floor.
    let pool_sub = level.subsectors.iter().position(|s| s.sector == pool).expect("pool subsector");
    let linked: Vec<_> = mesh.subsector_surfaces(pool_sub).collect();
    assert_eq!(linked.len(), 4);
    assert_eq!(mesh.links().subsector_slot(pool_sub, 0, 1).map(|i| mesh.surfaces()[i].ty), Some(SurfaceType::Ceiling));
    assert_eq!(mesh.links().subsector_slot(pool_sub, 1, 1).map(|i| mesh.surfaces()[i].ty), Some(SurfaceType::Floor));
    assert!(mesh.sector_has_lightmaps(pool));
    assert!(!mesh.sector_has_lightmaps(model));

    // The hall side of the shared line shows a lower step.
    let shared = (0..level.sides.len())
        .find(|&i| level.sides[i].sector == hall && level.back_sector(i).is_some())
        .expect("shared side");
    let kinds: Vec<_> = mesh.side_surfaces(shared).map(|s| s.ty).collect();
    assert_eq!(kinds, vec![SurfaceType::LowerSide]);

    // The pool's 3D floor is drawn on the hall side, but the hall sector has no
    // 3D floors of its own, so that wall gets no 3D floor slot.
    let slab = mesh
        .surfaces()
        .iter()
        .position(|s| s.side == Some(shared) && s.control_sector == Some(model))
        .expect("3D floor wall on the hall side");
    assert_eq!(mesh.surfaces()[slab].ty, SurfaceType::MiddleSide);
    assert_eq!(mesh.links().side_slot(shared, 4), None);
    assert!(!mesh.links().side(shared).any(|i| i == slab));

    for side in 0..level.sides.len() {
        for s in mesh.side_surfaces(side) {
            assert_eq!(s.side, Some(side));
        }
    }
}

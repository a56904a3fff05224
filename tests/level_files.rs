//! Levels and build settings read from JSON files.

use std::io::Write;

use glam::Vec2;
use tempfile::NamedTempFile;

use levelmesh::prelude::*;

fn sample_level() -> Level {
    let mut b = LevelBuilder::new();
    let a = b.add_sector(SectorDef::new(0.0, 128.0).group(1));
    let c = b.add_sector(SectorDef::new(32.0, 96.0).sky_ceiling().portals(0, 2));
    b.add_rect(a, Vec2::new(0.0, 0.0), Vec2::new(128.0, 128.0));
    b.add_rect(c, Vec2::new(128.0, 0.0), Vec2::new(256.0, 128.0));
    b.sample_distance(32).lightmaps(true);
    b.build()
}

fn build(level: &Level, config: &MeshConfig) -> Result<LevelSubmesh> {
    let mut pipelines = PipelineCache::new();
    let mut ctx = BuildContext::new(level, &BasicWallProcessor, &BasicFlatProcessor, &mut pipelines, config);
    LevelSubmesh::new_static(&mut ctx, 0)
}

#[test]
fn test_level_json_roundtrip() {
    let level = sample_level();
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(serde_json::to_string(&level).expect("serialize").as_bytes())
        .expect("Failed to write level");

    let loaded = Level::load(file.path()).expect("Failed to load level");
    assert_eq!(loaded, level);

    let a = build(&level, &MeshConfig::default()).expect("build failed");
    let b = build(&loaded, &MeshConfig::default()).expect("build failed");
    assert_eq!(a.stats(), b.stats());
    assert_eq!(a.indices(), b.indices());
}

#[test]
fn test_minimal_level_json_defaults() {
    // One triangular sector; optional fields left out.
    let json = r#"{
        "vertices": [[0, 0], [0, 64], [64, 0]],
        "lines": [
            { "v1": 0, "v2": 1, "sides": [0, null] },
            { "v1": 1, "v2": 2, "sides": [1, null] },
            { "v1": 2, "v2": 0, "sides": [2, null] }
        ],
        "sides": [
            { "line": 0, "sector": 0, "textures": [null, 3, null] },
            { "line": 1, "sector": 0, "textures": [null, 3, null] },
            { "line": 2, "sector": 0, "textures": [null, 3, null] }
        ],
        "sectors": [{
            "floor": { "normal": [0, 0, 1], "d": 0 },
            "ceiling": { "normal": [0, 0, -1], "d": 64 },
            "floor_texture": 1,
            "ceiling_texture": 2
        }],
        "segs": [
            { "v1": 0, "v2": 1, "side": 0 },
            { "v1": 1, "v2": 2, "side": 1 },
            { "v1": 2, "v2": 0, "side": 2 }
        ],
        "subsectors": [{ "sector": 0, "first_seg": 0, "num_segs": 3 }],
        "sections": [{ "sector": 0, "subsectors": [0] }]
    }"#;
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(json.as_bytes()).expect("Failed to write level");

    let level = Level::load(file.path()).expect("Failed to load level");
    assert_eq!(level.lightmap_sample_distance, 16);
    assert!(!level.lightmaps);
    assert_eq!(level.lines[0].alpha, 1.0);

    let mesh = build(&level, &MeshConfig::default()).expect("build failed");
    let stats = mesh.stats();
    assert_eq!(stats.surfaces, 5);
    // Three wall quads and two single-triangle flats.
    assert_eq!(stats.triangles, 8);
}

#[test]
fn test_config_file_changes_build() {
    let level = sample_level();
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    write!(file, r#"{{ "lightmap_scale": 2.0, "page_size": 256 }}"#).expect("Failed to write config");

    let config = MeshConfig::load(file.path()).expect("Failed to load config");
    let mesh = build(&level, &config).expect("build failed");
    assert_eq!(mesh.page_size(), 256);
    // Level default 32 at twice the density.
    assert!(mesh.surfaces().iter().all(|s| s.sample_dimension == 16));
}

#[test]
fn test_broken_files_report_errors() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    write!(file, "{{ not json").expect("Failed to write");
    assert!(matches!(Level::load(file.path()), Err(Error::Json(_))));
    assert!(matches!(MeshConfig::load(file.path()), Err(Error::Json(_))));

    let missing = file.path().with_extension("missing");
    assert!(matches!(Level::load(&missing), Err(Error::Io(_))));
}

#[test]
fn test_dangling_indices_rejected_on_load() {
    let valid = sample_level();

    let mut bad_vertex = valid.clone();
    bad_vertex.segs[2].v1 = bad_vertex.vertices.len() + 10;
    let mut bad_seg_count = valid.clone();
    bad_seg_count.subsectors[1].num_segs = bad_seg_count.segs.len();

    for level in [bad_vertex, bad_seg_count] {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(serde_json::to_string(&level).expect("serialize").as_bytes())
            .expect("Failed to write level");
        let err = Level::load(file.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidLevel(_)), "{err}");
    }
}

//! Read-only level description consumed by the submesh builder.
//!
//! The layout follows a BSP-compiled Doom map: lines with one or two sides,
//! sectors with (possibly sloped) floor and ceiling planes, and the convex
//! subsectors the node builder produced, each a closed ring of segs.
//! Sections group the subsectors of one sector into contiguous regions.
//!
//! Map coordinates are `x`/`y` on the ground and `z` up. A line's front side
//! lies to the right of `v1 -> v2`, so subsector segs run clockwise when seen
//! from above.

mod builder;

pub use builder::{LevelBuilder, SectorDef};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::util::Error;

/// Opaque material handle resolved by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

/// Sector plane in implicit form: `normal · (x, y, z) + d = 0`.
///
/// Floors point their normal up, ceilings point it down.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SecPlane {
    pub normal: Vec3,
    pub d: f32,
}

impl SecPlane {
    /// Horizontal floor at `height`.
    pub fn floor(height: f32) -> Self {
        Self { normal: Vec3::Z, d: -height }
    }

    /// Horizontal ceiling at `height`.
    pub fn ceiling(height: f32) -> Self {
        Self { normal: Vec3::NEG_Z, d: height }
    }

    /// Plane through `point` with the given (not necessarily unit) normal.
    pub fn through(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        Self { normal, d: -normal.dot(point) }
    }

    /// Height of the plane above a map position.
    #[inline]
    pub fn z_at(&self, x: f32, y: f32) -> f32 {
        -(self.d + self.normal.x * x + self.normal.y * y) / self.normal.z
    }

    /// Height of the plane above a map position.
    #[inline]
    pub fn z_at_point(&self, p: Vec2) -> f32 {
        self.z_at(p.x, p.y)
    }
}

/// A 3D floor: a slab whose planes come from a separate control sector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FFloor {
    /// Control sector defining the slab (`model` in map terms).
    pub model: usize,
    /// Side texture of the slab.
    #[serde(default)]
    pub texture: Option<MaterialId>,
    #[serde(default = "default_alpha")]
    pub alpha: f32,
}

fn default_alpha() -> f32 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    pub floor: SecPlane,
    pub ceiling: SecPlane,
    #[serde(default)]
    pub floor_texture: Option<MaterialId>,
    #[serde(default)]
    pub ceiling_texture: Option<MaterialId>,
    /// Ceiling shows the sky.
    #[serde(default)]
    pub sky_ceiling: bool,
    #[serde(default)]
    pub light_level: u8,
    /// Lightmaps on this sector's surfaces are rebaked continuously.
    #[serde(default)]
    pub dynamic_lighting: bool,
    /// Group of sectors connected through portals.
    #[serde(default)]
    pub sector_group: u32,
    /// Sector portal ids for `[floor, ceiling]`, 0 = none.
    #[serde(default)]
    pub portals: [u32; 2],
    /// Lightmap sample distance for `[floor, ceiling]`, 0 = level default.
    #[serde(default)]
    pub sample_distance: [u16; 2],
    /// 3D floors inside this sector.
    #[serde(default)]
    pub ffloors: Vec<FFloor>,
}

impl Sector {
    /// The floor (`ceiling == false`) or ceiling plane.
    #[inline]
    pub fn plane(&self, ceiling: bool) -> &SecPlane {
        if ceiling { &self.ceiling } else { &self.floor }
    }

    /// Index of the 3D floor whose control sector is `model`.
    pub fn ffloor_index(&self, model: usize) -> Option<usize> {
        self.ffloors.iter().position(|f| f.model == model)
    }
}

/// Wall part slots on a side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SidePart {
    Upper = 0,
    Middle = 1,
    Lower = 2,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Side {
    pub line: usize,
    pub sector: usize,
    /// Textures for `[upper, middle, lower]`.
    #[serde(default)]
    pub textures: [Option<MaterialId>; 3],
    /// Lightmap sample distance for `[upper, middle, lower]`, 0 = level default.
    #[serde(default)]
    pub sample_distance: [u16; 3],
    /// Side belongs to a polyobject (moving sub-polygon).
    #[serde(default)]
    pub polyobj: bool,
}

impl Side {
    #[inline]
    pub fn texture(&self, part: SidePart) -> Option<MaterialId> {
        self.textures[part as usize]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub v1: usize,
    pub v2: usize,
    /// `[front, back]` sides.
    pub sides: [Option<usize>; 2],
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    /// Line portal id, 0 = none.
    #[serde(default)]
    pub portal: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Seg {
    pub v1: usize,
    pub v2: usize,
    /// Side this seg was split from; `None` for minisegs.
    #[serde(default)]
    pub side: Option<usize>,
}

/// Convex region produced by the node builder; a ring of segs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subsector {
    pub sector: usize,
    pub first_seg: usize,
    pub num_segs: usize,
}

/// Contiguous group of subsectors belonging to one sector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub sector: usize,
    pub subsectors: Vec<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub vertices: Vec<Vec2>,
    pub lines: Vec<Line>,
    pub sides: Vec<Side>,
    pub sectors: Vec<Sector>,
    pub segs: Vec<Seg>,
    pub subsectors: Vec<Subsector>,
    pub sections: Vec<Section>,
    /// Default lightmap sample distance in map units.
    #[serde(default = "default_sample_distance")]
    pub lightmap_sample_distance: u16,
    /// Lightmapping enabled for this level.
    #[serde(default)]
    pub lightmaps: bool,
}

fn default_sample_distance() -> u16 {
    16
}

impl Level {
    /// Load and validate a level from a JSON file.
    pub fn load(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let level: Self = serde_json::from_str(&text)?;
        level.validate()?;
        Ok(level)
    }

    /// Check that every cross reference points at an existing element.
    ///
    /// The accessors below index directly, so a level must pass this before
    /// it is handed to the builder.
    pub fn validate(&self) -> crate::Result<()> {
        let check = |what: &str, owner: usize, field: &str, index: usize, len: usize| {
            if index < len {
                Ok(())
            } else {
                Err(Error::level(format!("{what} {owner}: {field} {index} out of range ({len} available)")))
            }
        };

        for (i, line) in self.lines.iter().enumerate() {
            check("line", i, "vertex", line.v1, self.vertices.len())?;
            check("line", i, "vertex", line.v2, self.vertices.len())?;
            for side in line.sides.iter().flatten() {
                check("line", i, "side", *side, self.sides.len())?;
            }
        }
        for (i, side) in self.sides.iter().enumerate() {
            check("side", i, "line", side.line, self.lines.len())?;
            check("side", i, "sector", side.sector, self.sectors.len())?;
        }
        for (i, sector) in self.sectors.iter().enumerate() {
            for ffloor in &sector.ffloors {
                check("sector", i, "control sector", ffloor.model, self.sectors.len())?;
            }
        }
        for (i, seg) in self.segs.iter().enumerate() {
            check("seg", i, "vertex", seg.v1, self.vertices.len())?;
            check("seg", i, "vertex", seg.v2, self.vertices.len())?;
            if let Some(side) = seg.side {
                check("seg", i, "side", side, self.sides.len())?;
            }
        }
        for (i, sub) in self.subsectors.iter().enumerate() {
            check("subsector", i, "sector", sub.sector, self.sectors.len())?;
            match sub.first_seg.checked_add(sub.num_segs) {
                Some(end) if end <= self.segs.len() => {}
                _ => {
                    return Err(Error::level(format!(
                        "subsector {i}: segs {}+{} out of range ({} available)",
                        sub.first_seg,
                        sub.num_segs,
                        self.segs.len()
                    )));
                }
            }
        }
        for (i, section) in self.sections.iter().enumerate() {
            check("section", i, "sector", section.sector, self.sectors.len())?;
            for sub in &section.subsectors {
                check("section", i, "subsector", *sub, self.subsectors.len())?;
            }
        }
        Ok(())
    }

    #[inline]
    pub fn vertex(&self, index: usize) -> Vec2 {
        self.vertices[index]
    }

    /// Segs of a subsector in stored (clockwise) order.
    pub fn subsector_segs(&self, subsector: &Subsector) -> &[Seg] {
        &self.segs[subsector.first_seg..subsector.first_seg + subsector.num_segs]
    }

    /// Sector on the other side of a side's line.
    pub fn back_sector(&self, side_index: usize) -> Option<usize> {
        let side = &self.sides[side_index];
        let line = &self.lines[side.line];
        let other = if line.sides[0] == Some(side_index) { line.sides[1] } else { line.sides[0] };
        other.map(|s| self.sides[s].sector)
    }

    /// Sections covering a sector.
    pub fn sections_for_sector(&self, sector: usize) -> impl Iterator<Item = (usize, &Section)> {
        self.sections.iter().enumerate().filter(move |(_, s)| s.sector == sector)
    }

    /// For every side, the subsector and seg that carry it.
    ///
    /// Sides without a seg (fully culled by the node builder) map to `None`.
    pub fn side_segs(&self) -> Vec<Option<(usize, usize)>> {
        let mut side_segs = vec![None; self.sides.len()];
        for (sub_index, sub) in self.subsectors.iter().enumerate() {
            for seg_index in sub.first_seg..sub.first_seg + sub.num_segs {
                if let Some(side) = self.segs[seg_index].side {
                    side_segs[side] = Some((sub_index, seg_index));
                }
            }
        }
        side_segs
    }
}

//! Programmatic level construction from convex sector polygons.
//!
//! Used by tests and the CLI demo. Each polygon becomes one subsector; edges
//! shared by two sectors become two-sided lines, edges shared inside one
//! section become minisegs.

use std::collections::HashMap;

use glam::Vec2;

use super::{FFloor, Level, Line, MaterialId, SecPlane, Section, Sector, Seg, Side, Subsector};

/// Sector template for [`LevelBuilder::add_sector`].
#[derive(Clone, Debug)]
pub struct SectorDef {
    sector: Sector,
    wall_texture: Option<MaterialId>,
}

impl SectorDef {
    /// Flat floor and ceiling with default materials (floor 1, ceiling 2, walls 3).
    pub fn new(floor: f32, ceiling: f32) -> Self {
        Self {
            sector: Sector {
                floor: SecPlane::floor(floor),
                ceiling: SecPlane::ceiling(ceiling),
                floor_texture: Some(MaterialId(1)),
                ceiling_texture: Some(MaterialId(2)),
                sky_ceiling: false,
                light_level: 160,
                dynamic_lighting: false,
                sector_group: 0,
                portals: [0, 0],
                sample_distance: [0, 0],
                ffloors: Vec::new(),
            },
            wall_texture: Some(MaterialId(3)),
        }
    }

    pub fn floor_plane(mut self, plane: SecPlane) -> Self {
        self.sector.floor = plane;
        self
    }

    pub fn ceiling_plane(mut self, plane: SecPlane) -> Self {
        self.sector.ceiling = plane;
        self
    }

    pub fn textures(
        mut self,
        floor: Option<MaterialId>,
        ceiling: Option<MaterialId>,
        wall: Option<MaterialId>,
    ) -> Self {
        self.sector.floor_texture = floor;
        self.sector.ceiling_texture = ceiling;
        self.wall_texture = wall;
        self
    }

    pub fn sky_ceiling(mut self) -> Self {
        self.sector.sky_ceiling = true;
        self
    }

    pub fn dynamic_lighting(mut self) -> Self {
        self.sector.dynamic_lighting = true;
        self
    }

    pub fn light_level(mut self, light: u8) -> Self {
        self.sector.light_level = light;
        self
    }

    pub fn group(mut self, group: u32) -> Self {
        self.sector.sector_group = group;
        self
    }

    pub fn portals(mut self, floor: u32, ceiling: u32) -> Self {
        self.sector.portals = [floor, ceiling];
        self
    }

    pub fn sample_distance(mut self, floor: u16, ceiling: u16) -> Self {
        self.sector.sample_distance = [floor, ceiling];
        self
    }

    /// Add a 3D floor whose slab is defined by control sector `model`.
    pub fn ffloor(mut self, model: usize, texture: Option<MaterialId>) -> Self {
        self.sector.ffloors.push(FFloor { model, texture, alpha: 1.0 });
        self
    }
}

/// Incremental level builder.
#[derive(Default)]
pub struct LevelBuilder {
    sectors: Vec<SectorDef>,
    /// `(sector, polygons)` per section.
    sections: Vec<(usize, Vec<Vec<Vec2>>)>,
    sample_distance: Option<u16>,
    lightmaps: bool,
}

impl LevelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sector; returns its index.
    pub fn add_sector(&mut self, def: SectorDef) -> usize {
        self.sectors.push(def);
        self.sectors.len() - 1
    }

    /// Add a convex polygon as a one-subsector section; returns the section index.
    pub fn add_polygon(&mut self, sector: usize, points: &[Vec2]) -> usize {
        self.add_section(sector, &[points])
    }

    /// Add a section made of several convex polygons; returns the section index.
    pub fn add_section(&mut self, sector: usize, polygons: &[&[Vec2]]) -> usize {
        let polys = polygons.iter().map(|p| clockwise(p)).collect();
        self.sections.push((sector, polys));
        self.sections.len() - 1
    }

    /// Add an axis-aligned rectangle `[min, max]` as its own section.
    pub fn add_rect(&mut self, sector: usize, min: Vec2, max: Vec2) -> usize {
        self.add_polygon(
            sector,
            &[min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)],
        )
    }

    pub fn sample_distance(&mut self, distance: u16) -> &mut Self {
        self.sample_distance = Some(distance);
        self
    }

    pub fn lightmaps(&mut self, enabled: bool) -> &mut Self {
        self.lightmaps = enabled;
        self
    }

    pub fn build(&self) -> Level {
        let mut level = Level {
            sectors: self.sectors.iter().map(|d| d.sector.clone()).collect(),
            lightmap_sample_distance: self.sample_distance.unwrap_or(16),
            lightmaps: self.lightmaps,
            ..Level::default()
        };

        let mut vertex_ids: HashMap<(u32, u32), usize> = HashMap::new();
        let mut vertex = |level: &mut Level, p: Vec2| -> usize {
            *vertex_ids.entry((p.x.to_bits(), p.y.to_bits())).or_insert_with(|| {
                level.vertices.push(p);
                level.vertices.len() - 1
            })
        };

        // Directed edges per section, to tell minisegs from real lines.
        let mut rings: Vec<(usize, usize, Vec<Vec<usize>>)> = Vec::new();
        let mut section_edges: HashMap<(usize, usize), usize> = HashMap::new();
        for (section_index, (sector, polys)) in self.sections.iter().enumerate() {
            let mut section_rings = Vec::with_capacity(polys.len());
            for poly in polys {
                let ring: Vec<usize> = poly.iter().map(|&p| vertex(&mut level, p)).collect();
                for i in 0..ring.len() {
                    section_edges.insert((ring[i], ring[(i + 1) % ring.len()]), section_index);
                }
                section_rings.push(ring);
            }
            rings.push((section_index, *sector, section_rings));
        }

        let mut lines_by_edge: HashMap<(usize, usize), usize> = HashMap::new();
        for (section_index, sector, section_rings) in rings {
            let mut subsectors = Vec::with_capacity(section_rings.len());
            for ring in section_rings {
                let first_seg = level.segs.len();
                for i in 0..ring.len() {
                    let (v1, v2) = (ring[i], ring[(i + 1) % ring.len()]);
                    let side = if section_edges.get(&(v2, v1)) == Some(&section_index) {
                        None
                    } else {
                        Some(self.attach_side(&mut level, &mut lines_by_edge, sector, v1, v2))
                    };
                    level.segs.push(Seg { v1, v2, side });
                }
                level.subsectors.push(Subsector { sector, first_seg, num_segs: ring.len() });
                subsectors.push(level.subsectors.len() - 1);
            }
            level.sections.push(Section { sector, subsectors });
        }

        // Two-sided lines show upper/lower textures, no middle.
        for line in &level.lines {
            if let [Some(front), Some(back)] = line.sides {
                for side in [front, back] {
                    let wall = self.sectors[level.sides[side].sector].wall_texture;
                    level.sides[side].textures = [wall, None, wall];
                }
            }
        }

        level
    }

    fn attach_side(
        &self,
        level: &mut Level,
        lines_by_edge: &mut HashMap<(usize, usize), usize>,
        sector: usize,
        v1: usize,
        v2: usize,
    ) -> usize {
        let side_index = level.sides.len();
        let wall = self.sectors[sector].wall_texture;

        let line_index = match lines_by_edge.get(&(v2, v1)).copied() {
            Some(line) if level.lines[line].sides[1].is_none() => {
                level.lines[line].sides[1] = Some(side_index);
                line
            }
            _ => {
                level.lines.push(Line { v1, v2, sides: [Some(side_index), None], alpha: 1.0, portal: 0 });
                let line = level.lines.len() - 1;
                lines_by_edge.insert((v1, v2), line);
                line
            }
        };

        level.sides.push(Side {
            line: line_index,
            sector,
            textures: [None, wall, None],
            sample_distance: [0; 3],
            polyobj: false,
        });
        side_index
    }
}

/// Polygon in clockwise order (seen from above with `y` up).
fn clockwise(points: &[Vec2]) -> Vec<Vec2> {
    let twice_area: f32 = (0..points.len())
        .map(|i| {
            let (a, b) = (points[i], points[(i + 1) % points.len()]);
            a.x * b.y - b.x * a.y
        })
        .sum();
    let mut out = points.to_vec();
    if twice_area > 0.0 {
        out.reverse();
    }
    out
}

//! Flat parts and the reference flat processor.

use glam::Vec2;

use super::{MeshBuilder, SurfaceUniforms};
use crate::level::{Level, MaterialId, SecPlane, Section};
use crate::mesh::MeshVertex;

/// A floor or ceiling of one section, either of the sector itself or of a
/// 3D floor slab inside it.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatPart {
    pub ceiling: bool,
    /// Control sector when the flat belongs to a 3D floor.
    pub control_sector: Option<usize>,
    pub material: Option<MaterialId>,
    pub masked: bool,
    pub sky: bool,
    pub light_level: u8,
    pub alpha: f32,
}

impl FlatPart {
    /// Plane the flat lies on.
    ///
    /// A 3D floor seen as a floor is the top of its slab, i.e. the control
    /// sector's ceiling, and the other way round.
    pub fn sec_plane(&self, level: &Level, sector: usize) -> SecPlane {
        match self.control_sector {
            Some(model) => *level.sectors[model].plane(!self.ceiling),
            None => *level.sectors[sector].plane(self.ceiling),
        }
    }

    /// Draw the section's subsectors as triangle fans.
    ///
    /// Untextured parts draw nothing.
    pub fn draw(&self, level: &Level, sector: usize, section: &Section, builder: &mut MeshBuilder) {
        if self.material.is_none() {
            return;
        }
        builder.set_material(self.material);
        builder.set_uniforms(SurfaceUniforms {
            light_level: f32::from(self.light_level) / 255.0,
            alpha: self.alpha,
        });

        let plane = self.sec_plane(level, sector);
        for &sub_index in &section.subsectors {
            let segs = level.subsector_segs(&level.subsectors[sub_index]);
            let verts: Vec<MeshVertex> = segs
                .iter()
                .map(|seg| {
                    let p = level.vertex(seg.v1);
                    MeshVertex::new(p.extend(plane.z_at_point(p)), Vec2::new(p.x, -p.y) / 64.0)
                })
                .collect();
            let indices: Vec<u32> = (1..verts.len().saturating_sub(1) as u32)
                .flat_map(|i| [0, i, i + 1])
                .collect();
            builder.draw_indexed(&verts, &indices);
        }
    }
}

/// Splits a sector section into its flat parts.
pub trait FlatProcessor {
    fn process(&self, level: &Level, sector: usize, section: &Section) -> Vec<FlatPart>;
}

/// Floor, ceiling, and both faces of every 3D floor in the sector.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicFlatProcessor;

impl FlatProcessor for BasicFlatProcessor {
    fn process(&self, level: &Level, sector_index: usize, _section: &Section) -> Vec<FlatPart> {
        let sector = &level.sectors[sector_index];
        let base = FlatPart {
            ceiling: false,
            control_sector: None,
            material: sector.floor_texture,
            masked: false,
            sky: false,
            light_level: sector.light_level,
            alpha: 1.0,
        };

        let mut parts = Vec::with_capacity(2 + 2 * sector.ffloors.len());
        parts.push(base.clone());
        parts.push(FlatPart {
            ceiling: true,
            material: sector.ceiling_texture,
            sky: sector.sky_ceiling,
            ..base.clone()
        });

        for ffloor in &sector.ffloors {
            let model = &level.sectors[ffloor.model];
            parts.push(FlatPart {
                control_sector: Some(ffloor.model),
                material: model.ceiling_texture,
                alpha: ffloor.alpha,
                ..base.clone()
            });
            parts.push(FlatPart {
                ceiling: true,
                control_sector: Some(ffloor.model),
                material: model.floor_texture,
                alpha: ffloor.alpha,
                ..base.clone()
            });
        }
        parts
    }
}

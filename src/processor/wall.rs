//! Wall parts and the reference wall processor.

use glam::{Vec2, Vec3};

use super::{MeshBuilder, SurfaceUniforms};
use crate::level::{Level, MaterialId, SecPlane, Seg, SidePart};
use crate::mesh::{MeshVertex, SurfaceType};

/// Texels per world unit of the base texture mapping.
const TEXTURE_SCALE: f32 = 1.0 / 64.0;

/// One quad of a wall.
///
/// Corners are ordered bottom-left, top-left, top-right, bottom-right as seen
/// from the front, where left is the seg's `v1`.
#[derive(Clone, Debug, PartialEq)]
pub struct WallPart {
    pub ty: SurfaceType,
    pub control_sector: Option<usize>,
    pub corners: [Vec3; 4],
    pub uvs: [Vec2; 4],
    pub material: Option<MaterialId>,
    /// Texture has transparent texels and needs the alpha test.
    pub masked: bool,
    pub light_level: u8,
    pub alpha: f32,
}

impl WallPart {
    /// Build a quad between the seg endpoints from `bottom` to `top` heights
    /// (`[at v1, at v2]`).
    pub fn quad(ty: SurfaceType, v1: Vec2, v2: Vec2, bottom: [f32; 2], top: [f32; 2]) -> Self {
        let corners = [
            v1.extend(bottom[0]),
            v1.extend(top[0]),
            v2.extend(top[1]),
            v2.extend(bottom[1]),
        ];
        let len = v1.distance(v2) * TEXTURE_SCALE;
        let uvs = [
            Vec2::new(0.0, -bottom[0] * TEXTURE_SCALE),
            Vec2::new(0.0, -top[0] * TEXTURE_SCALE),
            Vec2::new(len, -top[1] * TEXTURE_SCALE),
            Vec2::new(len, -bottom[1] * TEXTURE_SCALE),
        ];
        Self {
            ty,
            control_sector: None,
            corners,
            uvs,
            material: None,
            masked: false,
            light_level: 255,
            alpha: 1.0,
        }
    }

    /// Emit the quad's four corners with the part's material and uniforms.
    pub fn draw(&self, builder: &mut MeshBuilder) {
        builder.set_material(self.material);
        builder.set_uniforms(SurfaceUniforms {
            light_level: f32::from(self.light_level) / 255.0,
            alpha: self.alpha,
        });
        let verts: [MeshVertex; 4] = std::array::from_fn(|i| MeshVertex::new(self.corners[i], self.uvs[i]));
        builder.draw(&verts);
    }
}

/// Output of a wall processor for one side.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WallParts {
    pub parts: Vec<WallPart>,
    /// Seam geometry of line portals; kept aside, never indexed.
    pub portals: Vec<WallPart>,
}

/// Splits a side into its visible wall parts.
pub trait WallProcessor {
    fn process(
        &self,
        level: &Level,
        side: usize,
        seg: &Seg,
        front: usize,
        back: Option<usize>,
    ) -> WallParts;
}

/// Doom-style upper/middle/lower split plus 3D floor sides of the back sector.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicWallProcessor;

impl WallProcessor for BasicWallProcessor {
    fn process(
        &self,
        level: &Level,
        side_index: usize,
        seg: &Seg,
        front: usize,
        back: Option<usize>,
    ) -> WallParts {
        let side = &level.sides[side_index];
        let line = &level.lines[side.line];
        let front_sector = &level.sectors[front];
        let (v1, v2) = (level.vertex(seg.v1), level.vertex(seg.v2));
        let heights = |plane: &SecPlane| [plane.z_at_point(v1), plane.z_at_point(v2)];

        let ff = heights(&front_sector.floor);
        let fc = heights(&front_sector.ceiling);
        let mut out = WallParts::default();

        let push = |out: &mut WallParts,
                    ty: SurfaceType,
                    bottom: [f32; 2],
                    top: [f32; 2],
                    material: Option<MaterialId>,
                    masked: bool| {
            if top[0] <= bottom[0] && top[1] <= bottom[1] {
                return;
            }
            let mut part = WallPart::quad(ty, v1, v2, bottom, top);
            part.material = material;
            part.masked = masked;
            part.light_level = front_sector.light_level;
            part.alpha = line.alpha;
            out.parts.push(part);
        };

        let Some(back) = back else {
            push(&mut out, SurfaceType::MiddleSide, ff, fc, side.texture(SidePart::Middle), false);
            if line.portal != 0 {
                out.portals.push(WallPart::quad(SurfaceType::MiddleSide, v1, v2, ff, fc));
            }
            return out;
        };

        let back_sector = &level.sectors[back];
        let bf = heights(&back_sector.floor);
        let bc = heights(&back_sector.ceiling);

        let both_sky = front_sector.sky_ceiling && back_sector.sky_ceiling;
        if !both_sky && (bc[0] < fc[0] || bc[1] < fc[1]) {
            let bottom = [bc[0].max(ff[0]), bc[1].max(ff[1])];
            push(&mut out, SurfaceType::UpperSide, bottom, fc, side.texture(SidePart::Upper), false);
        }

        if bf[0] > ff[0] || bf[1] > ff[1] {
            let top = [bf[0].min(fc[0]), bf[1].min(fc[1])];
            push(&mut out, SurfaceType::LowerSide, ff, top, side.texture(SidePart::Lower), false);
        }

        let open_bottom = [ff[0].max(bf[0]), ff[1].max(bf[1])];
        let open_top = [fc[0].min(bc[0]), fc[1].min(bc[1])];
        if line.portal != 0 {
            push(&mut out, SurfaceType::MiddleSide, open_bottom, open_top, side.texture(SidePart::Middle), false);
            out.portals.push(WallPart::quad(SurfaceType::MiddleSide, v1, v2, open_bottom, open_top));
        } else if let Some(material) = side.texture(SidePart::Middle) {
            push(&mut out, SurfaceType::MiddleSide, open_bottom, open_top, Some(material), true);
        }

        for ffloor in &back_sector.ffloors {
            if front_sector.ffloor_index(ffloor.model).is_some() {
                continue;
            }
            let model = &level.sectors[ffloor.model];
            // The slab's top is the model's ceiling, its bottom the model's floor.
            let bottom = heights(&model.floor);
            let top = heights(&model.ceiling);
            let before = out.parts.len();
            push(&mut out, SurfaceType::MiddleSide, bottom, top, ffloor.texture, false);
            if let Some(part) = out.parts.get_mut(before) {
                part.control_sector = Some(ffloor.model);
                part.alpha = ffloor.alpha;
            }
        }

        out
    }
}

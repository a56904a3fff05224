//! Vertex and surface records stored in a submesh.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::level::MaterialId;
use crate::util::{BBox3f, Plane};

/// Lightmap page index of a vertex not yet placed in the atlas.
pub const NO_LIGHTMAP: f32 = -1.0;

/// Vertex layout shared by walls and flats.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct MeshVertex {
    pub pos: [f32; 3],
    /// Texture coordinates.
    pub uv: [f32; 2],
    /// Lightmap coordinates: tile-local texels until packed, atlas UV after.
    pub lu: f32,
    pub lv: f32,
    /// Lightmap page, [`NO_LIGHTMAP`] when unset.
    pub lindex: f32,
}

impl MeshVertex {
    pub fn new(pos: Vec3, uv: Vec2) -> Self {
        Self {
            pos: pos.to_array(),
            uv: uv.to_array(),
            lu: 0.0,
            lv: 0.0,
            lindex: NO_LIGHTMAP,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.pos)
    }

    #[inline]
    pub fn lightmap_uv(&self) -> Vec2 {
        Vec2::new(self.lu, self.lv)
    }
}

/// What part of the level a surface came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceType {
    Floor,
    Ceiling,
    UpperSide,
    MiddleSide,
    LowerSide,
}

impl SurfaceType {
    #[inline]
    pub fn is_flat(self) -> bool {
        matches!(self, Self::Floor | Self::Ceiling)
    }

    #[inline]
    pub fn is_side(self) -> bool {
        !self.is_flat()
    }
}

/// Vertex and index ranges of a surface inside its submesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshLocation {
    pub start_vert: usize,
    pub num_verts: usize,
    pub start_element: usize,
    pub num_elements: usize,
}

/// World space to tile-local lightmap texel projection.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TileTransform {
    /// World position of the tile's texel origin.
    pub translate_world_to_local: Vec3,
    pub proj_local_to_u: Vec3,
    pub proj_local_to_v: Vec3,
}

impl TileTransform {
    /// Tile-local texel coordinates of a world position.
    #[inline]
    pub fn project(&self, pos: Vec3) -> Vec2 {
        let delta = pos - self.translate_world_to_local;
        Vec2::new(delta.dot(self.proj_local_to_u), delta.dot(self.proj_local_to_v))
    }
}

/// Placement of a surface's lightmap tile in the atlas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AtlasTile {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Absolute lightmap page, `None` until packed.
    pub page: Option<u32>,
}

impl AtlasTile {
    /// Whether two placed tiles share a page and overlap.
    pub fn overlaps(&self, other: &AtlasTile) -> bool {
        self.page.is_some()
            && self.page == other.page
            && self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// One renderable patch of the level: a wall part or a subsector flat.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelMeshSurface {
    pub ty: SurfaceType,
    /// Side index for walls, subsector index for flats.
    pub type_index: usize,
    pub side: Option<usize>,
    pub subsector: Option<usize>,
    /// Control sector of a 3D floor surface.
    pub control_sector: Option<usize>,
    pub sector_group: u32,
    pub alpha: f32,
    pub plane: Plane,
    pub location: MeshLocation,
    /// Requested lightmap sample distance; 0 until resolved from the level default.
    pub sample_dimension: u16,
    pub bounds: BBox3f,
    pub tile_transform: TileTransform,
    pub atlas_tile: AtlasTile,
    pub material: Option<MaterialId>,
    pub pipeline_id: i32,
    pub portal_index: u32,
    pub is_sky: bool,
    pub always_update: bool,
    pub needs_update: bool,
}

impl LevelMeshSurface {
    pub(crate) fn new(ty: SurfaceType, type_index: usize) -> Self {
        Self {
            ty,
            type_index,
            side: None,
            subsector: None,
            control_sector: None,
            sector_group: 0,
            alpha: 1.0,
            plane: Plane::default(),
            location: MeshLocation::default(),
            sample_dimension: 0,
            bounds: BBox3f::EMPTY,
            tile_transform: TileTransform::default(),
            atlas_tile: AtlasTile::default(),
            material: None,
            pipeline_id: 0,
            portal_index: 0,
            is_sky: false,
            always_update: false,
            needs_update: true,
        }
    }
}

/// Contiguous run of indices drawn with one pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawRange {
    pub pipeline_id: i32,
    pub start: usize,
    pub count: usize,
}

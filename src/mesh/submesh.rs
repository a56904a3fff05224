//! The submesh container and its build lifecycle.

use serde::Serialize;
use tracing::debug;

use super::{atlas, extract, index, lightmap, link};
use super::{DrawRange, LevelMeshSurface, MeshVertex, SurfaceLinks};
use crate::config::MeshConfig;
use crate::level::{Level, MaterialId};
use crate::processor::{FlatProcessor, PipelineResolver, SurfaceUniforms, WallPart, WallProcessor};
use crate::util::{Error, Result};

/// Everything a build borrows from the caller.
pub struct BuildContext<'a> {
    pub level: &'a Level,
    pub walls: &'a dyn WallProcessor,
    pub flats: &'a dyn FlatProcessor,
    pub pipelines: &'a mut dyn PipelineResolver,
    pub config: &'a MeshConfig,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        level: &'a Level,
        walls: &'a dyn WallProcessor,
        flats: &'a dyn FlatProcessor,
        pipelines: &'a mut dyn PipelineResolver,
        config: &'a MeshConfig,
    ) -> Self {
        Self { level, walls, flats, pipelines, config }
    }
}

/// Counts reported after a build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SubmeshStats {
    pub surfaces: usize,
    pub vertices: usize,
    pub triangles: usize,
    pub uniforms: usize,
    pub wall_portals: usize,
    pub draw_ranges: usize,
    pub portal_ranges: usize,
    pub lightmap_pages: usize,
}

/// Triangulated level geometry with per-surface lightmap placement.
///
/// A static submesh holds the unchanging level geometry and is built once.
/// A dynamic submesh is rebuilt from scratch on every [`update`](Self::update).
#[derive(Clone, Debug, Default)]
pub struct LevelSubmesh {
    is_static: bool,
    pub(crate) vertices: Vec<MeshVertex>,
    pub(crate) indices: Vec<u32>,
    /// Surface of every triangle.
    pub(crate) surface_indexes: Vec<u32>,
    /// Uniform block of every vertex.
    pub(crate) uniform_indexes: Vec<u32>,
    pub(crate) uniforms: Vec<SurfaceUniforms>,
    /// Material of every uniform block.
    pub(crate) materials: Vec<Option<MaterialId>>,
    pub(crate) surfaces: Vec<LevelMeshSurface>,
    pub(crate) wall_portals: Vec<WallPart>,
    pub(crate) draw_list: Vec<DrawRange>,
    pub(crate) portal_list: Vec<DrawRange>,
    pub(crate) links: SurfaceLinks,
    pub(crate) page_size: u32,
    pub(crate) page_count: usize,
}

impl LevelSubmesh {
    /// Build the static submesh: extract, link, index, parameterize and pack.
    #[tracing::instrument(skip_all, fields(start_index))]
    pub fn new_static(ctx: &mut BuildContext<'_>, start_index: u32) -> Result<Self> {
        ctx.config.validate()?;
        ctx.level.validate()?;
        let mut mesh = Self { is_static: true, ..Self::default() };

        extract::create_static_surfaces(&mut mesh, ctx);
        mesh.finish(ctx);
        atlas::pack_lightmap_atlas(&mut mesh, ctx.config, start_index)?;

        mesh.debug_validate();
        debug!("static submesh: {:?}", mesh.stats());
        Ok(mesh)
    }

    /// An empty dynamic submesh; geometry appears on [`update`](Self::update).
    pub fn new_dynamic() -> Self {
        Self::default()
    }

    /// Rebuild a dynamic submesh. Static submeshes are left untouched.
    ///
    /// Moving geometry (polyobjects) is not part of the dynamic set, so the
    /// rebuilt submesh is empty apart from its bookkeeping.
    #[tracing::instrument(skip_all, fields(start_index))]
    pub fn update(&mut self, ctx: &mut BuildContext<'_>, start_index: u32) -> Result<()> {
        if self.is_static {
            return Ok(());
        }
        ctx.config.validate()?;
        self.reset();

        extract::create_dynamic_surfaces(self, ctx);
        self.finish(ctx);
        if ctx.level.lightmaps {
            atlas::pack_lightmap_atlas(self, ctx.config, start_index)?;
        }

        self.debug_validate();
        debug!("dynamic submesh: {:?}", self.stats());
        Ok(())
    }

    /// Link, index and compute tile transforms for the extracted surfaces.
    fn finish(&mut self, ctx: &BuildContext<'_>) {
        link::link_surfaces(self, ctx.level);
        index::create_indexes(self);
        lightmap::setup_lightmap_uvs(self, ctx.level, ctx.config);
    }

    /// Drop all geometry, surfaces, links and atlas state.
    pub fn reset(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.surface_indexes.clear();
        self.uniform_indexes.clear();
        self.uniforms.clear();
        self.materials.clear();
        self.surfaces.clear();
        self.wall_portals.clear();
        self.draw_list.clear();
        self.portal_list.clear();
        self.links = SurfaceLinks::default();
        self.page_count = 0;
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn surface_indexes(&self) -> &[u32] {
        &self.surface_indexes
    }

    pub fn uniform_indexes(&self) -> &[u32] {
        &self.uniform_indexes
    }

    pub fn uniforms(&self) -> &[SurfaceUniforms] {
        &self.uniforms
    }

    pub fn materials(&self) -> &[Option<MaterialId>] {
        &self.materials
    }

    pub fn surfaces(&self) -> &[LevelMeshSurface] {
        &self.surfaces
    }

    pub fn surfaces_mut(&mut self) -> &mut [LevelMeshSurface] {
        &mut self.surfaces
    }

    /// Line portal seams; not part of the index buffer.
    pub fn wall_portals(&self) -> &[WallPart] {
        &self.wall_portals
    }

    /// Draw ranges of non-sky surfaces.
    pub fn draw_list(&self) -> &[DrawRange] {
        &self.draw_list
    }

    /// Draw ranges of sky surfaces.
    pub fn portal_list(&self) -> &[DrawRange] {
        &self.portal_list
    }

    pub fn links(&self) -> &SurfaceLinks {
        &self.links
    }

    /// Side length of a lightmap page in texels.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Lightmap pages used by the last pack.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn surface(&self, index: usize) -> Option<&LevelMeshSurface> {
        self.surfaces.get(index)
    }

    /// Surfaces linked to a side's part slots.
    pub fn side_surfaces(&self, side: usize) -> impl Iterator<Item = &LevelMeshSurface> + '_ {
        self.links.side(side).filter_map(move |i| self.surfaces.get(i))
    }

    /// Surfaces linked to a subsector's floor and ceiling slots.
    pub fn subsector_surfaces(&self, subsector: usize) -> impl Iterator<Item = &LevelMeshSurface> + '_ {
        self.links.subsector(subsector).filter_map(move |i| self.surfaces.get(i))
    }

    pub fn sector_has_lightmaps(&self, sector: usize) -> bool {
        self.links.sector_has_lightmaps(sector)
    }

    pub fn surface_vertices(&self, index: usize) -> &[MeshVertex] {
        match self.surfaces.get(index) {
            Some(s) => &self.vertices[s.location.start_vert..s.location.start_vert + s.location.num_verts],
            None => &[],
        }
    }

    /// Triangles of a surface as absolute vertex indices.
    pub fn surface_triangles(&self, index: usize) -> impl Iterator<Item = [u32; 3]> + '_ {
        let elements = match self.surfaces.get(index) {
            Some(s) => &self.indices[s.location.start_element..s.location.start_element + s.location.num_elements],
            None => &[],
        };
        elements.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    pub fn stats(&self) -> SubmeshStats {
        SubmeshStats {
            surfaces: self.surfaces.len(),
            vertices: self.vertices.len(),
            triangles: self.indices.len() / 3,
            uniforms: self.uniforms.len(),
            wall_portals: self.wall_portals.len(),
            draw_ranges: self.draw_list.len(),
            portal_ranges: self.portal_list.len(),
            lightmap_pages: self.page_count,
        }
    }

    /// Check that every range points inside its buffer.
    pub fn validate(&self) -> Result<()> {
        fn check(what: &'static str, start: usize, count: usize, len: usize) -> Result<()> {
            if start.checked_add(count).map_or(true, |end| end > len) {
                return Err(Error::InvalidRange { what, start, count, len });
            }
            Ok(())
        }

        let verts = self.vertices.len();
        for s in &self.surfaces {
            check("surface vertex", s.location.start_vert, s.location.num_verts, verts)?;
            check("surface element", s.location.start_element, s.location.num_elements, self.indices.len())?;
        }
        for range in self.draw_list.iter().chain(&self.portal_list) {
            check("draw", range.start, range.count, self.indices.len())?;
        }
        if let Some(&bad) = self.indices.iter().find(|&&i| i as usize >= verts) {
            return Err(Error::InvalidRange { what: "index", start: bad as usize, count: 1, len: verts });
        }
        if self.surface_indexes.len() * 3 != self.indices.len() {
            return Err(Error::InvalidRange {
                what: "surface index",
                start: 0,
                count: self.surface_indexes.len() * 3,
                len: self.indices.len(),
            });
        }
        if self.uniform_indexes.len() != verts {
            return Err(Error::InvalidRange {
                what: "uniform index",
                start: 0,
                count: self.uniform_indexes.len(),
                len: verts,
            });
        }
        if let Some(&bad) = self.uniform_indexes.iter().find(|&&u| u as usize >= self.uniforms.len()) {
            return Err(Error::InvalidRange {
                what: "uniform",
                start: bad as usize,
                count: 1,
                len: self.uniforms.len(),
            });
        }
        Ok(())
    }

    fn debug_validate(&self) {
        if cfg!(debug_assertions) {
            if let Err(e) = self.validate() {
                panic!("submesh invariant violated: {e}");
            }
        }
    }
}

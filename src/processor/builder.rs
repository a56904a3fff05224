//! Temporary vertex/index buffer bucketed by shading state.
//!
//! Wall and flat parts draw into a [`MeshBuilder`]; the extractor then walks
//! the buckets, resolves a pipeline per bucket and copies the vertices into
//! the submesh.

use crate::level::MaterialId;
use crate::mesh::MeshVertex;

/// Depth comparison used by a bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    Less,
    #[default]
    LessEqual,
    Always,
}

/// Fixed-function state captured with every draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderState {
    pub depth_func: DepthFunc,
    pub depth_bias: bool,
    pub texture_enabled: bool,
    pub brightmap_enabled: bool,
    /// Fragments with alpha below this are discarded; 0 disables the test.
    pub alpha_threshold: f32,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            depth_func: DepthFunc::LessEqual,
            depth_bias: false,
            texture_enabled: true,
            brightmap_enabled: false,
            alpha_threshold: 0.0,
        }
    }
}

/// Per-surface shader constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceUniforms {
    /// Sector light in `[0, 1]`.
    pub light_level: f32,
    pub alpha: f32,
}

impl Default for SurfaceUniforms {
    fn default() -> Self {
        Self { light_level: 1.0, alpha: 1.0 }
    }
}

/// Everything a bucket's draws share.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ApplyState {
    pub render: RenderState,
    pub uniforms: SurfaceUniforms,
    pub material: Option<MaterialId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawCommand {
    pub start: usize,
    pub count: usize,
}

/// Draws recorded for one apply state.
#[derive(Clone, Debug, Default)]
pub struct DrawLists {
    /// Ranges into the builder's vertices.
    pub draws: Vec<DrawCommand>,
    /// Ranges into the builder's indices.
    pub indexed_draws: Vec<DrawCommand>,
}

#[derive(Clone, Debug, Default)]
pub struct MeshBuilder {
    render: RenderState,
    uniforms: SurfaceUniforms,
    material: Option<MaterialId>,
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
    sorted_lists: Vec<(ApplyState, DrawLists)>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_depth_func(&mut self, func: DepthFunc) {
        self.render.depth_func = func;
    }

    pub fn set_depth_bias(&mut self, enabled: bool) {
        self.render.depth_bias = enabled;
    }

    pub fn clear_depth_bias(&mut self) {
        self.render.depth_bias = false;
    }

    pub fn enable_texture(&mut self, enabled: bool) {
        self.render.texture_enabled = enabled;
    }

    pub fn enable_brightmap(&mut self, enabled: bool) {
        self.render.brightmap_enabled = enabled;
    }

    /// Alpha test: keep fragments with alpha >= `threshold`.
    pub fn alpha_func(&mut self, threshold: f32) {
        self.render.alpha_threshold = threshold;
    }

    pub fn set_material(&mut self, material: Option<MaterialId>) {
        self.material = material;
    }

    pub fn set_uniforms(&mut self, uniforms: SurfaceUniforms) {
        self.uniforms = uniforms;
    }

    pub fn render_state(&self) -> RenderState {
        self.render
    }

    fn apply_state(&self) -> ApplyState {
        ApplyState { render: self.render, uniforms: self.uniforms, material: self.material }
    }

    fn current_list(&mut self) -> &mut DrawLists {
        let state = self.apply_state();
        let pos = match self.sorted_lists.iter().position(|(s, _)| *s == state) {
            Some(pos) => pos,
            None => {
                self.sorted_lists.push((state, DrawLists::default()));
                self.sorted_lists.len() - 1
            }
        };
        &mut self.sorted_lists[pos].1
    }

    /// Record a non-indexed draw of `vertices` with the current state.
    pub fn draw(&mut self, vertices: &[MeshVertex]) {
        if vertices.is_empty() {
            return;
        }
        let start = self.vertices.len();
        self.vertices.extend_from_slice(vertices);
        self.current_list().draws.push(DrawCommand { start, count: vertices.len() });
    }

    /// Record an indexed draw; `indices` refer into `vertices`.
    pub fn draw_indexed(&mut self, vertices: &[MeshVertex], indices: &[u32]) {
        if vertices.is_empty() || indices.is_empty() {
            return;
        }
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(vertices);
        let start = self.indices.len();
        self.indices.extend(indices.iter().map(|&i| i + base));
        self.current_list().indexed_draws.push(DrawCommand { start, count: indices.len() });
    }

    /// Buckets in first-use order.
    pub fn buckets(&self) -> &[(ApplyState, DrawLists)] {
        &self.sorted_lists
    }

    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// A bucket's vertices with indexed draws expanded, plain draws first.
    pub fn flatten<'a>(&'a self, lists: &'a DrawLists) -> impl Iterator<Item = MeshVertex> + 'a {
        let plain = lists
            .draws
            .iter()
            .flat_map(move |cmd| self.vertices[cmd.start..cmd.start + cmd.count].iter().copied());
        let indexed = lists.indexed_draws.iter().flat_map(move |cmd| {
            self.indices[cmd.start..cmd.start + cmd.count]
                .iter()
                .map(move |&i| self.vertices[i as usize])
        });
        plain.chain(indexed)
    }

    /// Drop recorded geometry and buckets; render state is kept.
    pub fn clear(&mut self) {
        self.sorted_lists.clear();
        self.vertices.clear();
        self.indices.clear();
    }
}

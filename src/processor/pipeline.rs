//! Pipeline id resolution for draw-range grouping.

use std::collections::HashMap;

use super::{ApplyState, DepthFunc};

/// Maps a bucket's apply state to the renderer's pipeline id.
///
/// The id is only used as a grouping key for draw ranges.
pub trait PipelineResolver {
    fn pipeline_id(&mut self, state: &ApplyState) -> i32;
}

impl<F: FnMut(&ApplyState) -> i32> PipelineResolver for F {
    fn pipeline_id(&mut self, state: &ApplyState) -> i32 {
        self(state)
    }
}

/// The parts of an apply state that select a pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct PipelineKey {
    depth_func: DepthFunc,
    depth_bias: bool,
    texture_enabled: bool,
    brightmap_enabled: bool,
    alpha_test: bool,
    textured: bool,
}

impl From<&ApplyState> for PipelineKey {
    fn from(state: &ApplyState) -> Self {
        Self {
            depth_func: state.render.depth_func,
            depth_bias: state.render.depth_bias,
            texture_enabled: state.render.texture_enabled,
            brightmap_enabled: state.render.brightmap_enabled,
            alpha_test: state.render.alpha_threshold > 0.0,
            textured: state.material.is_some(),
        }
    }
}

/// Hands out sequential ids, one per distinct pipeline state.
#[derive(Debug, Default)]
pub struct PipelineCache {
    ids: HashMap<PipelineKey, i32>,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct pipelines seen so far.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl PipelineResolver for PipelineCache {
    fn pipeline_id(&mut self, state: &ApplyState) -> i32 {
        let next = self.ids.len() as i32;
        *self.ids.entry(PipelineKey::from(state)).or_insert(next)
    }
}

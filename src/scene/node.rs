//! A single node in a parsed RWX model's output tree: a name, a local
//! transform, child indices, and any sub-meshes committed while it was
//! the current object. Pure data — no parent back-reference, no handle
//! type — referenced only by index into [`crate::scene::ModelPrefab::nodes`].

use crate::mesh::SubMesh;
use crate::transform::DisplayTransform;

#[derive(Debug, Clone)]
pub struct ModelNode {
    pub name: String,
    pub local: DisplayTransform,
    pub children: Vec<usize>,
    pub submeshes: Vec<SubMesh>,
}

impl ModelNode {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local: DisplayTransform::default(),
            children: Vec::new(),
            submeshes: Vec::new(),
        }
    }
}

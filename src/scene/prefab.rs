//! Immutable output of one RWX model parse: a flat node array with
//! index-based parent/child links, cheap to share across the prefab
//! cache via `Arc` (spec §4.8).

use crate::scene::node::ModelNode;

#[derive(Debug, Clone)]
pub struct ModelPrefab {
    pub nodes: Vec<ModelNode>,
    pub root: usize,
}

impl ModelPrefab {
    #[must_use]
    pub fn new() -> Self {
        let root = ModelNode::new("Root");
        Self {
            nodes: vec![root],
            root: 0,
        }
    }

    /// Allocates a new child of `parent`, returning the new node's index.
    pub fn push_child(&mut self, parent: usize, name: impl Into<String>) -> usize {
        let index = self.nodes.len();
        self.nodes.push(ModelNode::new(name));
        self.nodes[parent].children.push(index);
        index
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for ModelPrefab {
    fn default() -> Self {
        Self::new()
    }
}

//! Scene Assembler and the flat-index prefab output tree (spec §3, §4.8).

mod assembler;
mod node;
mod prefab;

pub use assembler::SceneAssembler;
pub use node::ModelNode;
pub use prefab::ModelPrefab;

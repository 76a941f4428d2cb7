//! Parse Context (spec §3, §4.5): the single mutable object threaded
//! through an RWX parse — current transform, current material, the open
//! mesh builder, the object-hierarchy cursor, every stack, and the
//! captured prototype table.

use glam::Mat4;
use rustc_hash::FxHashMap;

use crate::material::MaterialState;
use crate::mesh::MeshBuilder;
use crate::parser::directives;
use crate::parser::normalize::normalize_line;
use crate::prototype::PrototypeDefinition;
use crate::scene::ModelPrefab;
use crate::transform::TransformStack;

/// A `clumpbegin` snapshot: the parent's transform and the node that was
/// current before the clump was entered — popped together at `clumpend`
/// since both are restored in lockstep (spec §4.5, the clump-transform
/// and object stacks always move together).
struct ClumpFrame {
    transform: Mat4,
    node: usize,
}

/// Lines captured between `protobegin` and a matching `protoend`, plus a
/// depth counter so a nested `protobegin`/`protoend` pair inside the body
/// doesn't close the capture early.
struct CaptureState {
    name: String,
    lines: Vec<String>,
    depth: u32,
}

pub struct ParseContext {
    pub(crate) prefab: ModelPrefab,
    pub(crate) current_node: usize,
    pub(crate) current_transform: Mat4,
    pub(crate) joint_transform: Mat4,
    pub(crate) material: MaterialState,
    pub(crate) mesh: MeshBuilder,
    clump_stack: Vec<ClumpFrame>,
    pub(crate) transform_stack: TransformStack,
    pub(crate) joint_stack: TransformStack,
    /// `true` while replaying a prototype body; `vertex` bakes
    /// `current_transform` into the stored position when set (spec's
    /// Glossary entry "Transform bake").
    pub(crate) in_prototype_body: bool,
    pub(crate) prototypes: FxHashMap<String, PrototypeDefinition>,
    capture: Option<CaptureState>,
}

impl ParseContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            prefab: ModelPrefab::new(),
            current_node: 0,
            current_transform: Mat4::IDENTITY,
            joint_transform: Mat4::IDENTITY,
            material: MaterialState::new(),
            mesh: MeshBuilder::new(),
            clump_stack: Vec::new(),
            transform_stack: TransformStack::new(),
            joint_stack: TransformStack::new(),
            in_prototype_body: false,
            prototypes: FxHashMap::default(),
            capture: None,
        }
    }

    /// Runs one already-normalized source line through the dispatcher,
    /// unless a prototype body is currently being captured, in which case
    /// the line is buffered verbatim instead of being parsed.
    pub fn feed_line(&mut self, line: &str) {
        if self.capture.is_some() {
            self.feed_capture_line(line);
            return;
        }
        directives::dispatch(self, line);
    }

    fn feed_capture_line(&mut self, line: &str) {
        let directive = line
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let capture = self.capture.as_mut().expect("checked by caller");
        match directive.as_str() {
            "protobegin" => {
                capture.depth += 1;
                capture.lines.push(line.to_string());
            }
            "protoend" if capture.depth > 0 => {
                capture.depth -= 1;
                capture.lines.push(line.to_string());
            }
            "protoend" => {
                let capture = self.capture.take().expect("checked above");
                let proto = PrototypeDefinition::capture(capture.name.clone(), capture.lines);
                self.prototypes.insert(capture.name, proto);
            }
            _ => capture.lines.push(line.to_string()),
        }
    }

    pub(crate) fn begin_prototype_capture(&mut self, name: &str) {
        self.capture = Some(CaptureState {
            name: name.to_ascii_lowercase(),
            lines: Vec::new(),
            depth: 0,
        });
    }

    /// Flushes the open sub-mesh (if any) onto the node that is current
    /// right now, without clearing the vertex list.
    pub(crate) fn commit_mesh(&mut self) {
        if let Some(sub) = self.mesh.commit_current() {
            self.prefab.nodes[self.current_node].submeshes.push(sub);
        }
    }

    /// Flushes the open sub-mesh and clears the vertex list — end of
    /// stream, every `clumpend`, and prototype-instance close.
    pub(crate) fn final_commit_mesh(&mut self) {
        if let Some(sub) = self.mesh.final_commit() {
            self.prefab.nodes[self.current_node].submeshes.push(sub);
        }
    }

    pub(crate) fn clump_begin(&mut self) {
        self.commit_mesh();
        self.material.push_clone();
        self.clump_stack.push(ClumpFrame {
            transform: self.current_transform,
            node: self.current_node,
        });
        self.current_node = self.prefab.push_child(self.current_node, "Clump");
        self.mesh = MeshBuilder::new();
    }

    pub(crate) fn clump_end(&mut self) {
        self.final_commit_mesh();
        let Some(frame) = self.clump_stack.pop() else {
            log::warn!("rwx_forge: unmatched clumpend, resetting transform to identity");
            self.current_transform = Mat4::IDENTITY;
            self.material.reset();
            return;
        };
        let local = frame.transform.inverse() * self.current_transform;
        self.prefab.nodes[self.current_node].local = crate::transform::rwx_to_display(local);
        self.current_node = frame.node;
        self.current_transform = frame.transform;
        self.material.pop();
    }

    /// Prototype instance expansion (spec §4.7), steps 1–8.
    pub(crate) fn instantiate_prototype(&mut self, proto: &PrototypeDefinition) {
        self.commit_mesh();

        let node_name = format!("Proto_{}", proto.name);
        let instance_node = self.prefab.push_child(self.current_node, node_name);

        let saved_node = self.current_node;
        let saved_transform = self.current_transform;
        let saved_mesh = std::mem::take(&mut self.mesh);
        let was_in_prototype = self.in_prototype_body;

        self.current_node = instance_node;
        self.current_transform = if proto.has_own_transform {
            Mat4::IDENTITY
        } else {
            saved_transform
        };
        self.in_prototype_body = true;

        for raw_line in &proto.lines {
            if let Some(normalized) = normalize_line(raw_line) {
                directives::dispatch(self, &normalized);
            }
        }

        self.final_commit_mesh();

        self.current_node = saved_node;
        self.current_transform = saved_transform;
        self.mesh = saved_mesh;
        self.in_prototype_body = was_in_prototype;
    }

    /// True once every stack the spec tracks has unwound to empty (spec
    /// §8, testable property 5). An in-progress prototype capture also
    /// counts as "not well-formed" since its matching `protoend` never
    /// arrived.
    #[must_use]
    pub fn stacks_are_empty(&self) -> bool {
        self.clump_stack.is_empty()
            && self.transform_stack.is_empty()
            && self.joint_stack.is_empty()
            && self.material.is_stack_empty()
            && self.capture.is_none()
    }

    /// Consumes the context, flushing any still-open mesh, and returns the
    /// finished prefab.
    pub fn into_prefab(mut self) -> ModelPrefab {
        self.final_commit_mesh();
        self.prefab
    }
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::new()
    }
}

//! Incremental mesh assembly (spec §4.4): an open vertex list, an open
//! sub-mesh keyed by the current material, and the commit logic that
//! flushes it. The builder itself has no notion of a scene node —
//! every commit hands the caller a finished [`SubMesh`] to attach to
//! whatever the current object is at that moment.

use crate::material::MaterialKey;
use crate::mesh::vertex::{Primitive, Vertex};
use glam::Vec3;

/// A maximal run of primitives sharing one material key, with its own
/// copy of the vertex buffer so it renders standalone (spec §3,
/// "Sub-mesh").
#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh {
    pub material: MaterialKey,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// Accumulates vertices and primitives for the clump currently being
/// parsed. Vertex indices are one-based and clump-local on the wire;
/// `emit` takes raw one-based indices and converts/bounds-checks them.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    vertices: Vec<Vertex>,
    open_indices: Vec<u32>,
    open_key: Option<MaterialKey>,
}

impl MeshBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Stores a vertex, applying the RWX-to-display handedness flip
    /// (`R = diag(-1,1,1,1)`, spec §4.6) to its position. Geometry is the
    /// one place that flip has to land directly on data rather than as a
    /// transform conjugation: node transforms get `R * M * R` in
    /// [`crate::transform::rwx_to_display`], but raw vertex positions
    /// have no transform of their own to conjugate, so this is the
    /// single choke point — every vertex, baked-prototype or plain,
    /// passes through here exactly once.
    pub fn push_vertex(&mut self, position: Vec3, uv_u: f32, uv_v: f32) {
        let reflected = Vec3::new(-position.x, position.y, position.z);
        self.vertices.push(Vertex::new(reflected, uv_u, uv_v));
    }

    /// Converts a raw one-based wire index to a zero-based vertex index,
    /// bounds-checked against the current clump's vertex list (spec §7,
    /// testable property 1). Returns `None` for out-of-range indices;
    /// the caller logs and drops the offending primitive, not the model.
    fn resolve_index(&self, raw_one_based: i64) -> Option<u32> {
        if raw_one_based < 1 {
            return None;
        }
        let zero_based = raw_one_based - 1;
        if (zero_based as usize) < self.vertices.len() {
            Some(zero_based as u32)
        } else {
            None
        }
    }

    /// Emits one primitive under `key`, committing the open sub-mesh
    /// first if the material key has changed (spec §4.4, testable
    /// property 3) and returning it to the caller. Any triangle with an
    /// out-of-range index is skipped and logged; the rest of the
    /// primitive's triangles still emit.
    pub fn emit(&mut self, key: MaterialKey, primitive: &Primitive) -> Option<SubMesh> {
        let flushed = if self.open_key.as_ref() != Some(&key) {
            let flushed = self.commit_current();
            self.open_key = Some(key);
            flushed
        } else {
            None
        };

        for tri in primitive.tessellate() {
            let resolved: Option<[u32; 3]> = (|| {
                Some([
                    self.resolve_index(tri[0])?,
                    self.resolve_index(tri[1])?,
                    self.resolve_index(tri[2])?,
                ])
            })();
            match resolved {
                Some([a, b, c]) => self.open_indices.extend_from_slice(&[a, b, c]),
                None => log::warn!(
                    "rwx_forge: primitive {:?} references an out-of-range vertex index, skipping",
                    tri
                ),
            }
        }
        flushed
    }

    /// Flushes the open sub-mesh, if any. A no-op returning `None` when
    /// the open index list is empty (spec §4.4).
    pub fn commit_current(&mut self) -> Option<SubMesh> {
        if self.open_indices.is_empty() {
            self.open_key = None;
            return None;
        }
        let material = self.open_key.take()?;
        Some(SubMesh {
            material,
            vertices: self.vertices.clone(),
            indices: std::mem::take(&mut self.open_indices),
        })
    }

    /// Flushes the open sub-mesh and clears the vertex list, as required
    /// at end-of-stream, at every `clumpend`, and at prototype-instance
    /// close (spec §4.4).
    pub fn final_commit(&mut self) -> Option<SubMesh> {
        let flushed = self.commit_current();
        self.vertices.clear();
        flushed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialRecord;

    fn cube_builder() -> MeshBuilder {
        let mut b = MeshBuilder::new();
        b.push_vertex(Vec3::new(0.0, 0.0, 0.0), 0.0, 0.0);
        b.push_vertex(Vec3::new(1.0, 0.0, 0.0), 0.0, 0.0);
        b.push_vertex(Vec3::new(1.0, 1.0, 0.0), 0.0, 0.0);
        b.push_vertex(Vec3::new(0.0, 1.0, 0.0), 0.0, 0.0);
        b
    }

    #[test]
    fn quad_cube_produces_expected_indices() {
        let mut b = cube_builder();
        let key = MaterialRecord::default().mesh_commit_key();
        assert!(b.emit(key, &Primitive::Quad([1, 2, 3, 4])).is_none());
        let mesh = b.final_commit().expect("one sub-mesh");
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.vertices.len(), 4);
    }

    #[test]
    fn material_change_flushes_previous_submesh() {
        let mut b = MeshBuilder::new();
        b.push_vertex(Vec3::ZERO, 0.0, 0.0);
        b.push_vertex(Vec3::X, 0.0, 0.0);
        b.push_vertex(Vec3::Y, 0.0, 0.0);
        b.push_vertex(Vec3::Z, 0.0, 0.0);

        let mut red = MaterialRecord::default();
        red.color = [1.0, 0.0, 0.0];
        let mut green = MaterialRecord::default();
        green.color = [0.0, 1.0, 0.0];

        assert!(b.emit(red.mesh_commit_key(), &Primitive::Triangle([1, 2, 3])).is_none());
        let flushed = b
            .emit(green.mesh_commit_key(), &Primitive::Triangle([2, 3, 4]))
            .expect("material change flushes the red sub-mesh");
        assert_eq!(flushed.material, red.mesh_commit_key());
        assert_eq!(flushed.indices, vec![0, 1, 2]);

        let last = b.final_commit().expect("green sub-mesh");
        assert_eq!(last.material, green.mesh_commit_key());
    }

    #[test]
    fn one_based_indexing_converts_correctly() {
        let mut b = cube_builder();
        let key = MaterialRecord::default().mesh_commit_key();
        b.emit(key, &Primitive::Triangle([1, 2, 3]));
        let mesh = b.final_commit().expect("sub-mesh");
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn out_of_range_index_drops_primitive_not_model() {
        let mut b = cube_builder();
        let key = MaterialRecord::default().mesh_commit_key();
        b.emit(key.clone(), &Primitive::Triangle([1, 2, 99]));
        b.emit(key, &Primitive::Triangle([1, 2, 3]));
        let mesh = b.final_commit().expect("sub-mesh");
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }
}

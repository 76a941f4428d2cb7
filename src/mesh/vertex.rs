//! Vertex storage and raw primitive shapes (spec §3, §4.4).

use glam::Vec2;
use glam::Vec3;
use smallvec::SmallVec;

/// A clump-local vertex: position stored verbatim (display-space
/// conversion happens later, at the transform stage) plus texture
/// coordinates with the `v` flip already applied at push time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    /// `uv u v` on the wire becomes `(u, 1 - v)` in the vertex record
    /// (spec §8, "UV flip").
    #[must_use]
    pub fn new(position: Vec3, uv_u: f32, uv_v: f32) -> Self {
        Self {
            position,
            uv: Vec2::new(uv_u, 1.0 - uv_v),
        }
    }
}

/// A raw, one-based primitive as it appears on the wire, not yet
/// bounds-checked or converted to zero-based indices. `tessellate`
/// reduces any shape to the triangle list the mesh builder consumes.
#[derive(Debug, Clone)]
pub enum Primitive {
    Triangle([i64; 3]),
    Quad([i64; 4]),
    Polygon(Vec<i64>),
}

impl Primitive {
    /// Fan tessellation, one-based indices still. A triangle passes
    /// through; a quad splits `(a,b,c,d)` into `(a,b,c)` and `(a,c,d)`
    /// (spec §4.5); a convex n-gon fans from its first vertex (spec §4.4).
    #[must_use]
    pub fn tessellate(&self) -> SmallVec<[[i64; 3]; 4]> {
        match self {
            Primitive::Triangle(t) => SmallVec::from_slice(&[*t]),
            Primitive::Quad([a, b, c, d]) => SmallVec::from_slice(&[[*a, *b, *c], [*a, *c, *d]]),
            Primitive::Polygon(indices) => {
                let mut out = SmallVec::new();
                if indices.len() < 3 {
                    return out;
                }
                let v0 = indices[0];
                for i in 1..indices.len() - 1 {
                    out.push([v0, indices[i], indices[i + 1]]);
                }
                out
            }
        }
    }
}

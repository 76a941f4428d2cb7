//! Coordinate-system conversion from right-handed RWX space to the
//! left-handed display space used by the host engine (spec §4.6).

use glam::{Mat3, Mat4, Quat, Vec3, Vec4};

const DEGENERATE_EPSILON: f32 = 1e-8;

/// `diag(-1, 1, 1, 1)` — its own inverse, so `R * R == I` (testable property 7).
#[must_use]
pub fn reflection() -> Mat4 {
    Mat4::from_diagonal(Vec4::new(-1.0, 1.0, 1.0, 1.0))
}

/// Position, rotation, and scale of a node's local transform in display
/// space, derived from an accumulated RWX-space transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for DisplayTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Converts an RWX-space transform to display space and decomposes it.
///
/// `M' = R * M * R` is computed first; position is `M'`'s translation
/// column, scale is the magnitude of each linear-part column, and
/// rotation is read off the unit-length columns. A negative determinant
/// negates `scale.x` so the extracted rotation stays proper (no mirrored
/// basis baked into the quaternion). Non-finite or near-singular input
/// falls back to translation-only, with x negated, per spec §7.
#[must_use]
pub fn rwx_to_display(m: Mat4) -> DisplayTransform {
    if !matrix_is_finite(&m) {
        return translation_only_fallback(m);
    }

    let r = reflection();
    let m2 = r * m * r;

    let x_axis = m2.x_axis.truncate();
    let y_axis = m2.y_axis.truncate();
    let z_axis = m2.z_axis.truncate();
    let position = m2.w_axis.truncate();

    let det = Mat3::from_cols(x_axis, y_axis, z_axis).determinant();
    if !det.is_finite() || det.abs() < DEGENERATE_EPSILON {
        return translation_only_fallback(m);
    }

    let mut scale = Vec3::new(x_axis.length(), y_axis.length(), z_axis.length());
    if det < 0.0 {
        scale.x = -scale.x;
    }

    let rotation_basis = Mat3::from_cols(
        safe_div(x_axis, scale.x),
        safe_div(y_axis, scale.y),
        safe_div(z_axis, scale.z),
    );
    let rotation = Quat::from_mat3(&rotation_basis).normalize();

    DisplayTransform {
        position,
        rotation,
        scale,
    }
}

fn safe_div(v: Vec3, s: f32) -> Vec3 {
    if s.abs() < DEGENERATE_EPSILON {
        Vec3::ZERO
    } else {
        v / s
    }
}

fn matrix_is_finite(m: &Mat4) -> bool {
    m.to_cols_array().iter().all(|v| v.is_finite())
}

fn translation_only_fallback(m: Mat4) -> DisplayTransform {
    let t = m.w_axis;
    let x = if t.x.is_finite() { -t.x } else { 0.0 };
    let y = if t.y.is_finite() { t.y } else { 0.0 };
    let z = if t.z.is_finite() { t.z } else { 0.0 };
    DisplayTransform {
        position: Vec3::new(x, y, z),
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    }
}

/// Builds a matrix from 16 RWX `transform` tokens, row-major with
/// translation at indices 3, 7, 11 (spec §9, Open Question 1 resolved in
/// favor of this convention). `m[15]` is forced to `1.0` when parsed as
/// `0.0` (spec §4.5 / §8 "matrix sanitization").
#[must_use]
pub fn mat4_from_rwx_tokens(values: &[f32; 16]) -> Mat4 {
    let mut v = *values;
    if v[15] == 0.0 {
        v[15] = 1.0;
    }
    // `values` is row-major; glam's `from_cols_array` expects column-major,
    // so transpose by reading it as rows when building each column.
    Mat4::from_cols(
        Vec4::new(v[0], v[4], v[8], v[12]),
        Vec4::new(v[1], v[5], v[9], v[13]),
        Vec4::new(v[2], v[6], v[10], v[14]),
        Vec4::new(v[3], v[7], v[11], v[15]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn involution_on_identity() {
        let r = reflection();
        let result = r * Mat4::IDENTITY * r;
        assert_eq!(result, Mat4::IDENTITY);
    }

    #[test]
    fn cube_vertex_zero_maps_to_negated_x() {
        let m = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let display = rwx_to_display(Mat4::IDENTITY);
        assert_eq!(display.position, Vec3::ZERO);
        let display = rwx_to_display(m);
        assert_eq!(display.position, Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn sanitized_m33_decomposes_without_panicking() {
        let mut tokens = [0.0f32; 16];
        tokens[0] = 1.0;
        tokens[5] = 1.0;
        tokens[10] = 1.0;
        tokens[3] = 2.0;
        tokens[7] = 3.0;
        tokens[11] = 4.0;
        // tokens[15] left at 0.0 — sanitized to 1.0 by mat4_from_rwx_tokens,
        // so this decomposes normally rather than hitting the fallback path.
        let m = mat4_from_rwx_tokens(&tokens);
        let display = rwx_to_display(m);
        assert_eq!(display.position, Vec3::new(-2.0, 3.0, 4.0));
    }

    #[test]
    fn negative_determinant_negates_scale_x() {
        let m = Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0));
        let display = rwx_to_display(m);
        assert!(display.scale.x < 0.0 || display.scale.x.abs() - 1.0 < 1e-5);
    }
}

//! Transform stacks and the RWX-to-display coordinate conversion.

mod convert;
mod stack;

pub use convert::{mat4_from_rwx_tokens, reflection, rwx_to_display, DisplayTransform};
pub use stack::TransformStack;

use glam::{Mat4, Vec3};

/// Right-multiplies `current` by a translation, per spec §4.5
/// (`current <- current . T(x, y, z)`).
#[must_use]
pub fn translate(current: Mat4, delta: Vec3) -> Mat4 {
    current * Mat4::from_translation(delta)
}

/// Right-multiplies `current` by an axis-angle rotation; `degrees` matches
/// the RWX `rotate`/`rotatejointtm` directive's angle unit.
#[must_use]
pub fn rotate_axis_angle(current: Mat4, axis: Vec3, degrees: f32) -> Mat4 {
    let axis = if axis.length_squared() > 0.0 {
        axis.normalize()
    } else {
        Vec3::Y
    };
    current * Mat4::from_axis_angle(axis, degrees.to_radians())
}

/// Right-multiplies `current` by a non-uniform scale.
#[must_use]
pub fn scale(current: Mat4, factors: Vec3) -> Mat4 {
    current * Mat4::from_scale(factors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_rotate_scale_composes_in_order() {
        let t = Vec3::new(1.0, 2.0, 3.0);
        let angle = 90.0;
        let s = Vec3::new(2.0, 2.0, 2.0);

        let mut m = Mat4::IDENTITY;
        m = translate(m, t);
        m = rotate_axis_angle(m, Vec3::Y, angle);
        m = scale(m, s);

        let expected = Mat4::from_translation(t)
            * Mat4::from_axis_angle(Vec3::Y, angle.to_radians())
            * Mat4::from_scale(s);
        assert_eq!(m, expected);
    }
}

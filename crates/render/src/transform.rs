use glam::{Mat4, Vec3};
use tableau_common::TransformParams;

/// Build a model matrix from scale, per-axis rotations (degrees) and translation.
///
/// The product is `T * Rz * Ry * Rx * S` applied to column vectors: a vertex
/// is scaled first, then rotated about X, Y and Z in that order, then
/// translated. Reordering changes the result for non-uniform scale or
/// compound rotations.
pub fn compose(
    scale: Vec3,
    rot_x_degrees: f32,
    rot_y_degrees: f32,
    rot_z_degrees: f32,
    translation: Vec3,
) -> Mat4 {
    let scale = Mat4::from_scale(scale);
    let rotation_x = Mat4::from_rotation_x(rot_x_degrees.to_radians());
    let rotation_y = Mat4::from_rotation_y(rot_y_degrees.to_radians());
    let rotation_z = Mat4::from_rotation_z(rot_z_degrees.to_radians());
    let translation = Mat4::from_translation(translation);

    translation * rotation_z * rotation_y * rotation_x * scale
}

pub fn compose_params(params: &TransformParams) -> Mat4 {
    let r = params.rotation_degrees;
    compose(params.scale, r.x, r.y, r.z, params.translation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    const EPS: f32 = 1e-5;

    #[test]
    fn identity_params_give_identity() {
        let m = compose_params(&TransformParams::default());
        assert!(m.abs_diff_eq(Mat4::IDENTITY, EPS));
    }

    #[test]
    fn matches_explicit_product() {
        let m = compose(Vec3::new(2.0, 1.0, 1.0), 0.0, 90.0, 0.0, Vec3::new(5.0, 0.0, 0.0));

        // T(5,0,0) * Ry(90) * Rx(0) * Rz(0) * S(2,1,1), written out by hand.
        let t = Mat4::from_cols(
            Vec4::new(1.0, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(5.0, 0.0, 0.0, 1.0),
        );
        let ry = Mat4::from_cols(
            Vec4::new(0.0, 0.0, -1.0, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::new(1.0, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        );
        let s = Mat4::from_cols(
            Vec4::new(2.0, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        );
        let expected = t * ry * Mat4::IDENTITY * Mat4::IDENTITY * s;
        assert!(m.abs_diff_eq(expected, EPS), "{m:?} != {expected:?}");

        let expected_cols = Mat4::from_cols(
            Vec4::new(0.0, 0.0, -2.0, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::new(1.0, 0.0, 0.0, 0.0),
            Vec4::new(5.0, 0.0, 0.0, 1.0),
        );
        assert!(m.abs_diff_eq(expected_cols, EPS));
    }

    #[test]
    fn unit_x_axis_lands_where_expected() {
        let m = compose(Vec3::new(2.0, 1.0, 1.0), 0.0, 90.0, 0.0, Vec3::new(5.0, 0.0, 0.0));
        let p = m.transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(5.0, 0.0, -2.0), EPS), "{p:?}");
        let origin = m.transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), EPS));
    }

    #[test]
    fn x_rotation_applies_before_y() {
        // Rx(90) sends +Y to +Z, then Ry(90) sends +Z to +X.
        let m = compose(Vec3::ONE, 90.0, 90.0, 0.0, Vec3::ZERO);
        let v = m.transform_vector3(Vec3::Y);
        assert!(v.abs_diff_eq(Vec3::X, EPS), "{v:?}");

        // Applying Y first would leave +Y on the Z axis instead.
        let swapped = Mat4::from_rotation_x(90f32.to_radians())
            * Mat4::from_rotation_y(90f32.to_radians());
        let w = swapped.transform_vector3(Vec3::Y);
        assert!(w.abs_diff_eq(Vec3::Z, EPS), "{w:?}");
    }

    #[test]
    fn y_rotation_applies_before_z() {
        // Ry(90) sends +X to -Z, which Rz leaves alone.
        let m = compose(Vec3::ONE, 0.0, 90.0, 90.0, Vec3::ZERO);
        let v = m.transform_vector3(Vec3::X);
        assert!(v.abs_diff_eq(Vec3::NEG_Z, EPS), "{v:?}");
    }

    #[test]
    fn scale_applies_before_rotation() {
        let m = compose(Vec3::new(3.0, 1.0, 1.0), 0.0, 0.0, 90.0, Vec3::ZERO);
        // Scale stretches X to 3, then Rz(90) turns it onto +Y.
        let v = m.transform_vector3(Vec3::X);
        assert!(v.abs_diff_eq(Vec3::new(0.0, 3.0, 0.0), EPS), "{v:?}");

        let rotate_then_scale =
            Mat4::from_scale(Vec3::new(3.0, 1.0, 1.0)) * Mat4::from_rotation_z(90f32.to_radians());
        assert!(!m.abs_diff_eq(rotate_then_scale, EPS));
    }

    #[test]
    fn translation_is_applied_last() {
        let m = compose(Vec3::splat(2.0), 0.0, 0.0, 0.0, Vec3::new(1.0, 2.0, 3.0));
        let p = m.transform_point3(Vec3::ONE);
        assert!(p.abs_diff_eq(Vec3::new(3.0, 4.0, 5.0), EPS));
    }
}

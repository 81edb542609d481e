//! Transform composition for instance placement
//!
//! A scene description places each instance with an ordered list of primitive
//! operators. Composition starts from identity and applies every operator on
//! the outside of the accumulated matrix (`accumulated = op * accumulated`),
//! so the first listed operator is the first one a point goes through.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// One primitive transform operator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformOp {
    /// Arbitrary 4x4 matrix
    Matrix(Mat4),
    /// Translation by a vector
    Translate(Vec3),
    /// Non-uniform scale
    Scale(Vec3),
    /// Rotation around X in degrees
    RotateX(f32),
    /// Rotation around Y in degrees
    RotateY(f32),
    /// Rotation around Z in degrees
    RotateZ(f32),
    /// Euler rotation in degrees, expanded as `Rz * Ry * Rx`
    Rotate(Vec3),
}

impl TransformOp {
    /// Matrix of this operator on its own
    pub fn local_matrix(&self) -> Mat4 {
        match *self {
            Self::Matrix(m) => m,
            Self::Translate(v) => Mat4::new_translation(&v),
            Self::Scale(v) => Mat4::new_nonuniform_scaling(&v),
            Self::RotateX(deg) => Mat4::rotation_x(utils::deg_to_rad(deg)),
            Self::RotateY(deg) => Mat4::rotation_y(utils::deg_to_rad(deg)),
            Self::RotateZ(deg) => Mat4::rotation_z(utils::deg_to_rad(deg)),
            Self::Rotate(xyz) => {
                Mat4::rotation_z(utils::deg_to_rad(xyz.z))
                    * Mat4::rotation_y(utils::deg_to_rad(xyz.y))
                    * Mat4::rotation_x(utils::deg_to_rad(xyz.x))
            }
        }
    }

    /// Whether this operator is a translation
    pub fn is_translation(&self) -> bool {
        matches!(self, Self::Translate(_))
    }
}

/// Compose an ordered operator list into a single matrix
///
/// With `ban_translation` set, `Translate` operators are skipped so the
/// result only carries orientation and scale. An empty list yields identity.
pub fn compose(ops: &[TransformOp], ban_translation: bool) -> Mat4 {
    ops.iter()
        .filter(|op| !(ban_translation && op.is_translation()))
        .fold(Mat4::identity(), |accumulated, op| op.local_matrix() * accumulated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Point3;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_empty_is_identity() {
        assert_eq!(compose(&[], false), Mat4::identity());
        assert_eq!(compose(&[], true), Mat4::identity());
    }

    #[test]
    fn test_earlier_operator_applies_first() {
        let ops = [
            TransformOp::Translate(Vec3::new(1.0, 0.0, 0.0)),
            TransformOp::Scale(Vec3::new(2.0, 2.0, 2.0)),
        ];
        let m = compose(&ops, false);

        let expected = Mat4::new_nonuniform_scaling(&Vec3::new(2.0, 2.0, 2.0))
            * Mat4::new_translation(&Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(m, expected, epsilon = EPSILON);

        let p = m.transform_point(&Point3::origin());
        assert_relative_eq!(p, Point3::new(2.0, 0.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_ban_translation_yields_pure_rotation() {
        let ops = [
            TransformOp::Translate(Vec3::new(5.0, 5.0, 5.0)),
            TransformOp::RotateZ(90.0),
        ];
        let m = compose(&ops, true);

        assert_relative_eq!(m, TransformOp::RotateZ(90.0).local_matrix(), epsilon = EPSILON);
        assert_relative_eq!(m.translation_part(), Vec3::zeros(), epsilon = EPSILON);
        let p = m.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(0.0, 1.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_rotate_expands_to_zyx() {
        let xyz = Vec3::new(30.0, 45.0, 60.0);
        let expected = compose(
            &[
                TransformOp::RotateX(xyz.x),
                TransformOp::RotateY(xyz.y),
                TransformOp::RotateZ(xyz.z),
            ],
            false,
        );
        assert_relative_eq!(TransformOp::Rotate(xyz).local_matrix(), expected, epsilon = EPSILON);
    }

    #[test]
    fn test_matrix_operator_passes_through() {
        let m = Mat4::new_translation(&Vec3::new(0.0, 3.0, 0.0));
        assert_eq!(compose(&[TransformOp::Matrix(m)], false), m);
        // A raw matrix keeps its translation even in orientation-only mode
        assert_eq!(compose(&[TransformOp::Matrix(m)], true), m);
    }
}

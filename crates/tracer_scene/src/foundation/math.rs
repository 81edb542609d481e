//! Math utilities and types
//!
//! Provides the fundamental math types used by scene loading, bounds and
//! camera code. Everything is `f32` to match the layout of device-side data.

pub use nalgebra::{Matrix4, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a rotation matrix around the X axis (angle in radians)
    fn rotation_x(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Y axis (angle in radians)
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Z axis (angle in radians)
    fn rotation_z(angle: f32) -> Mat4;

    /// Create a right-handed look-at view matrix (camera looks down -Z, Y up)
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Invert a matrix that only carries rotation and translation.
    ///
    /// The upper 3x3 block is assumed orthonormal.
    fn invert_rot_trans(&self) -> Mat4;

    /// Translation column of an affine matrix
    fn translation_part(&self) -> Vec3;

    /// Whether every element is exactly zero
    fn is_zero(&self) -> bool;
}

impl Mat4Ext for Mat4 {
    fn rotation_x(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::x_axis(), angle)
    }

    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn rotation_z(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), angle)
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let camera_up = right.cross(&forward);

        let translation = Mat4::new(
            1.0, 0.0, 0.0, -eye.x,
            0.0, 1.0, 0.0, -eye.y,
            0.0, 0.0, 1.0, -eye.z,
            0.0, 0.0, 0.0, 1.0,
        );

        let rotation = Mat4::new(
            right.x, right.y, right.z, 0.0,
            camera_up.x, camera_up.y, camera_up.z, 0.0,
            -forward.x, -forward.y, -forward.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        rotation * translation
    }

    fn invert_rot_trans(&self) -> Mat4 {
        let rotation_t = self.fixed_view::<3, 3>(0, 0).transpose();
        let translation = -(rotation_t * self.translation_part());

        let mut result = Mat4::identity();
        result.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotation_t);
        result.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);
        result
    }

    fn translation_part(&self) -> Vec3 {
        Vec3::new(self[(0, 3)], self[(1, 3)], self[(2, 3)])
    }

    fn is_zero(&self) -> bool {
        self.iter().all(|v| *v == 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_rotation_z_quarter_turn() {
        let m = Mat4::rotation_z(utils::deg_to_rad(90.0));
        let p = m.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(0.0, 1.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_invert_rot_trans_matches_general_inverse() {
        let m = Mat4::new_translation(&Vec3::new(1.0, -2.0, 3.0))
            * Mat4::rotation_y(0.7)
            * Mat4::rotation_x(-0.3);
        let general = m.try_inverse().unwrap();
        assert_relative_eq!(m.invert_rot_trans(), general, epsilon = EPSILON);
    }

    #[test]
    fn test_look_at_moves_eye_to_origin() {
        let eye = Vec3::new(3.0, 4.0, 5.0);
        let view = Mat4::look_at(eye, Vec3::zeros(), Vec3::y());
        let p = view.transform_point(&Point3::from(eye));
        assert_relative_eq!(p, Point3::origin(), epsilon = EPSILON);

        // Target lies straight ahead on -Z
        let t = view.transform_point(&Point3::origin());
        assert!(t.z < 0.0);
        assert_relative_eq!(t.x, 0.0, epsilon = EPSILON);
        assert_relative_eq!(t.y, 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_is_zero() {
        assert!(Mat4::zeros().is_zero());
        assert!(!Mat4::identity().is_zero());
    }
}

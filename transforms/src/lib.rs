use nalgebra::{Isometry3, Matrix3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// A rigid transform describing the pose of a frame B relative to a frame A.
///
/// `rotation` rotates coordinates expressed in B into A and `translation` is
/// the position of B's origin expressed in A. Composition reads like matrix
/// multiplication: `a_from_c = a_from_b * b_from_c`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub rotation: UnitQuaternion<f64>,
    pub translation: Vector3<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self::new(UnitQuaternion::identity(), Vector3::zeros())
    }

    pub fn new(rotation: UnitQuaternion<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self::new(UnitQuaternion::identity(), Vector3::new(x, y, z))
    }

    pub fn from_rotation(rotation: UnitQuaternion<f64>) -> Self {
        Self::new(rotation, Vector3::zeros())
    }

    /// Rotation about a unit axis by `angle` radians, no translation.
    pub fn from_axis_angle(axis: &Vector3<f64>, angle: f64) -> Self {
        Self::from_rotation(UnitQuaternion::from_scaled_axis(axis.normalize() * angle))
    }

    #[inline]
    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        self.rotation.to_rotation_matrix().into_inner()
    }

    #[inline]
    pub fn inv(&self) -> Transform {
        let rotation = self.rotation.inverse();
        Transform::new(rotation, -(rotation * self.translation))
    }

    /// Maps a point expressed in B into A.
    #[inline]
    pub fn transform_point(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * point + self.translation
    }

    /// Maps a free vector expressed in B into A.
    #[inline]
    pub fn transform_vector(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * vector
    }

    /// Maps a point expressed in A into B.
    #[inline]
    pub fn inverse_transform_point(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.inverse_transform_vector(&(point - self.translation))
    }

    /// Maps a free vector expressed in A into B.
    #[inline]
    pub fn inverse_transform_vector(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.inverse_transform_vector(vector)
    }

    pub fn is_finite(&self) -> bool {
        self.translation.iter().all(|x| x.is_finite())
            && self.rotation.coords.iter().all(|x| x.is_finite())
    }
}

impl Mul<Transform> for Transform {
    type Output = Transform;
    #[inline]
    fn mul(self, rhs: Transform) -> Transform {
        Transform::new(
            self.rotation * rhs.rotation,
            self.rotation * rhs.translation + self.translation,
        )
    }
}

impl From<Isometry3<f64>> for Transform {
    fn from(value: Isometry3<f64>) -> Self {
        Transform::new(value.rotation, value.translation.vector)
    }
}

impl From<Transform> for Isometry3<f64> {
    fn from(value: Transform) -> Self {
        Isometry3::from_parts(Translation3::from(value.translation), value.rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_transform_inverse() {
        let transform = Transform::new(
            UnitQuaternion::from_euler_angles(0.1, -0.4, 1.2),
            Vector3::new(1.0, -2.0, 0.5),
        );
        let identity = transform * transform.inv();
        assert_abs_diff_eq!(identity.translation, Vector3::zeros(), epsilon = 1e-12);
        assert_abs_diff_eq!(identity.rotation.angle(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_transform_compose_point() {
        // a_from_b rotates 90 deg about z and shifts along x
        let a_from_b = Transform::new(
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
            Vector3::new(1.0, 0.0, 0.0),
        );
        let b_from_c = Transform::from_translation(0.0, 0.0, 2.0);
        let a_from_c = a_from_b * b_from_c;

        let p_c = Vector3::new(1.0, 0.0, 0.0);
        let expected = a_from_b.transform_point(&b_from_c.transform_point(&p_c));
        assert_abs_diff_eq!(a_from_c.transform_point(&p_c), expected, epsilon = 1e-12);
        assert_abs_diff_eq!(expected, Vector3::new(1.0, 1.0, 2.0), epsilon = 1e-12);
    }

    #[test]
    fn test_transform_inverse_point() {
        let transform = Transform::new(
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.3),
            Vector3::new(0.2, 0.1, -0.7),
        );
        let p = Vector3::new(0.4, 0.5, 0.6);
        let back = transform.inverse_transform_point(&transform.transform_point(&p));
        assert_abs_diff_eq!(back, p, epsilon = 1e-12);
    }
}

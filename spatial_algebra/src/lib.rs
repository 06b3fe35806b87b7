use mass_properties::MassProperties;
use nalgebra::{Matrix3, Matrix6, Vector3, Vector6};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use transforms::Transform;

/// Skew symmetric cross product matrix, `skew(a) * b == a.cross(b)`.
#[inline]
pub fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    v.cross_matrix()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialVector {
    pub rotation: Vector3<f64>,
    pub translation: Vector3<f64>,
}

impl SpatialVector {
    pub fn new(rotation: Vector3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn zeros() -> Self {
        Self::default()
    }

    pub fn vector(&self) -> Vector6<f64> {
        Vector6::new(
            self.rotation[0],
            self.rotation[1],
            self.rotation[2],
            self.translation[0],
            self.translation[1],
            self.translation[2],
        )
    }

    pub fn dot(&self, rhs: &SpatialVector) -> f64 {
        self.rotation.dot(&rhs.rotation) + self.translation.dot(&rhs.translation)
    }

    pub fn is_finite(&self) -> bool {
        self.rotation.iter().chain(self.translation.iter()).all(|x| x.is_finite())
    }

    ///Featherstone 2.34
    pub fn cross_force(self, rhs: SpatialVector) -> SpatialVector {
        let new_rotation =
            self.rotation.cross(&rhs.rotation) + self.translation.cross(&rhs.translation);
        let new_translation = self.rotation.cross(&rhs.translation);
        SpatialVector::new(new_rotation, new_translation)
    }

    /// Featherstone 2.33
    pub fn cross_motion(self, rhs: SpatialVector) -> SpatialVector {
        let new_rotation = self.rotation.cross(&rhs.rotation);
        let new_translation =
            self.rotation.cross(&rhs.translation) + self.translation.cross(&rhs.rotation);
        SpatialVector::new(new_rotation, new_translation)
    }
}

impl From<Vector6<f64>> for SpatialVector {
    fn from(v: Vector6<f64>) -> SpatialVector {
        let rotation = Vector3::new(v[0], v[1], v[2]);
        let translation = Vector3::new(v[3], v[4], v[5]);
        SpatialVector::new(rotation, translation)
    }
}

impl Add<SpatialVector> for SpatialVector {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.rotation + rhs.rotation,
            self.translation + rhs.translation,
        )
    }
}

impl Sub<SpatialVector> for SpatialVector {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.rotation - rhs.rotation,
            self.translation - rhs.translation,
        )
    }
}

impl Neg for SpatialVector {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.rotation, -self.translation)
    }
}

impl Mul<f64> for SpatialVector {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.rotation * rhs, self.translation * rhs)
    }
}

// Motion and force vectors share the same storage but transform differently,
// the newtypes keep them from being mixed up.
macro_rules! spatial_newtype {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
        pub struct $name(pub SpatialVector);

        impl $name {
            pub fn new(rotation: Vector3<f64>, translation: Vector3<f64>) -> Self {
                Self(SpatialVector::new(rotation, translation))
            }

            pub fn zeros() -> Self {
                Self::default()
            }

            #[inline]
            pub fn rotation(&self) -> Vector3<f64> {
                self.0.rotation
            }

            #[inline]
            pub fn translation(&self) -> Vector3<f64> {
                self.0.translation
            }

            pub fn vector(&self) -> Vector6<f64> {
                self.0.vector()
            }

            pub fn is_finite(&self) -> bool {
                self.0.is_finite()
            }
        }

        impl From<Vector6<f64>> for $name {
            fn from(v: Vector6<f64>) -> Self {
                Self(SpatialVector::from(v))
            }
        }

        impl Add<$name> for $name {
            type Output = $name;
            #[inline]
            fn add(self, rhs: $name) -> $name {
                $name(self.0 + rhs.0)
            }
        }

        impl AddAssign<$name> for $name {
            #[inline]
            fn add_assign(&mut self, rhs: $name) {
                self.0 = self.0 + rhs.0;
            }
        }

        impl Sub<$name> for $name {
            type Output = $name;
            #[inline]
            fn sub(self, rhs: $name) -> $name {
                $name(self.0 - rhs.0)
            }
        }

        impl SubAssign<$name> for $name {
            #[inline]
            fn sub_assign(&mut self, rhs: $name) {
                self.0 = self.0 - rhs.0;
            }
        }

        impl Neg for $name {
            type Output = $name;
            #[inline]
            fn neg(self) -> $name {
                $name(-self.0)
            }
        }

        impl Mul<f64> for $name {
            type Output = $name;
            #[inline]
            fn mul(self, rhs: f64) -> $name {
                $name(self.0 * rhs)
            }
        }
    };
}

spatial_newtype!(Velocity);
spatial_newtype!(Acceleration);
spatial_newtype!(Force);
spatial_newtype!(Momentum);

impl Velocity {
    pub fn cross_motion(self, rhs: Velocity) -> Acceleration {
        Acceleration(self.0.cross_motion(rhs.0))
    }

    pub fn cross_force(self, rhs: Momentum) -> Force {
        Force(self.0.cross_force(rhs.0))
    }

    /// Linear velocity of a point fixed in the frame, in the frame's coordinates.
    pub fn linear_velocity_at(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.0.translation + self.0.rotation.cross(point)
    }
}

impl Acceleration {
    /// Classical linear acceleration of a point fixed in the frame whose
    /// motion is `twist`, in the frame's coordinates.
    pub fn linear_acceleration_at(&self, twist: &Velocity, point: &Vector3<f64>) -> Vector3<f64> {
        let omega = twist.rotation();
        let point_velocity = twist.linear_velocity_at(point);
        self.0.translation + self.0.rotation.cross(point) + omega.cross(&point_velocity)
    }
}

impl Force {
    /// Builds a wrench in frame A from a pure force applied at `point`, both in A.
    pub fn from_force_at_point(force: Vector3<f64>, point: &Vector3<f64>) -> Force {
        Force::new(point.cross(&force), force)
    }

    /// Power delivered to a motion expressed in the same frame.
    pub fn power(&self, velocity: &Velocity) -> f64 {
        self.0.dot(&velocity.0)
    }
}

/// Featherstone's Plücker transform `B_from_A`.
///
/// `rotation` (E) rotates A coordinates into B and `translation` (r) is the
/// position of B's origin expressed in A.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpatialTransform {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

impl Default for SpatialTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl SpatialTransform {
    pub fn new(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity(), Vector3::zeros())
    }

    /// Given the pose of frame B relative to frame A, returns `B_from_A`.
    pub fn from_pose(pose: &Transform) -> Self {
        Self::new(pose.rotation_matrix().transpose(), pose.translation)
    }

    #[inline]
    pub fn inv(&self) -> SpatialTransform {
        SpatialTransform::new(self.rotation.transpose(), -(self.rotation * self.translation))
    }

    /// 6x6 motion transform matrix.
    pub fn motion_matrix(&self) -> Matrix6<f64> {
        let e = self.rotation;
        let mut m = Matrix6::zeros();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&e);
        m.fixed_view_mut::<3, 3>(3, 0)
            .copy_from(&(-e * skew(&self.translation)));
        m.fixed_view_mut::<3, 3>(3, 3).copy_from(&e);
        m
    }

    /// 6x6 force transform matrix, the inverse transpose of the motion matrix.
    pub fn force_matrix(&self) -> Matrix6<f64> {
        let e = self.rotation;
        let mut m = Matrix6::zeros();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&e);
        m.fixed_view_mut::<3, 3>(0, 3)
            .copy_from(&(-e * skew(&self.translation)));
        m.fixed_view_mut::<3, 3>(3, 3).copy_from(&e);
        m
    }

    /// Expresses an inertia given in B in the coordinates of A, `X^T I X`.
    pub fn inertia_to_parent(&self, inertia: &Matrix6<f64>) -> Matrix6<f64> {
        let x = self.motion_matrix();
        x.transpose() * inertia * x
    }

    fn transform_motion(&self, motion: &SpatialVector) -> SpatialVector {
        let e = self.rotation;
        let rotation = e * motion.rotation;
        let translation = e * (motion.translation - self.translation.cross(&motion.rotation));
        SpatialVector::new(rotation, translation)
    }

    fn transform_force(&self, force: &SpatialVector) -> SpatialVector {
        let e = self.rotation;
        let rotation = e * (force.rotation - self.translation.cross(&force.translation));
        let translation = e * force.translation;
        SpatialVector::new(rotation, translation)
    }
}

impl Mul<Velocity> for SpatialTransform {
    type Output = Velocity;
    #[inline]
    fn mul(self, velocity: Velocity) -> Velocity {
        Velocity(self.transform_motion(&velocity.0))
    }
}

impl Mul<Acceleration> for SpatialTransform {
    type Output = Acceleration;
    #[inline]
    fn mul(self, acceleration: Acceleration) -> Acceleration {
        Acceleration(self.transform_motion(&acceleration.0))
    }
}

impl Mul<Force> for SpatialTransform {
    type Output = Force;
    #[inline]
    fn mul(self, force: Force) -> Force {
        Force(self.transform_force(&force.0))
    }
}

impl Mul<Momentum> for SpatialTransform {
    type Output = Momentum;
    #[inline]
    fn mul(self, momentum: Momentum) -> Momentum {
        Momentum(self.transform_force(&momentum.0))
    }
}

impl Mul<SpatialTransform> for SpatialTransform {
    type Output = SpatialTransform;
    /// `C_from_B * B_from_A = C_from_A`
    #[inline]
    fn mul(self, rhs: SpatialTransform) -> SpatialTransform {
        SpatialTransform::new(
            self.rotation * rhs.rotation,
            rhs.translation + rhs.rotation.transpose() * self.translation,
        )
    }
}

/// Rigid body inertia about the body frame origin, with the center of mass
/// offset carried by the mass properties.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialInertia(pub MassProperties);

impl SpatialInertia {
    pub fn matrix(&self) -> Matrix6<f64> {
        let mp = self.0;
        let mass = mp.mass;
        let cx = skew(&mp.center_of_mass.vector());
        let cxt = cx.transpose();

        let mut m = Matrix6::zeros();
        m.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&(mp.inertia.matrix() + cx * cxt * mass));
        m.fixed_view_mut::<3, 3>(0, 3).copy_from(&(cx * mass));
        m.fixed_view_mut::<3, 3>(3, 0).copy_from(&(cxt * mass));
        m.fixed_view_mut::<3, 3>(3, 3)
            .copy_from(&(Matrix3::identity() * mass));
        m
    }
}

impl From<MassProperties> for SpatialInertia {
    fn from(value: MassProperties) -> SpatialInertia {
        SpatialInertia(value)
    }
}

impl Mul<Velocity> for SpatialInertia {
    type Output = Momentum;
    fn mul(self, velocity: Velocity) -> Momentum {
        Momentum::from(self.matrix() * velocity.vector())
    }
}

impl Mul<Acceleration> for SpatialInertia {
    type Output = Force;
    fn mul(self, acceleration: Acceleration) -> Force {
        Force::from(self.matrix() * acceleration.vector())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use mass_properties::{CenterOfMass, Inertia};
    use nalgebra::UnitQuaternion;

    fn pose() -> Transform {
        Transform::new(
            UnitQuaternion::from_euler_angles(0.3, -0.2, 0.9),
            Vector3::new(0.5, -1.0, 2.0),
        )
    }

    #[test]
    fn test_spatial_transform_inverse() {
        let x = SpatialTransform::from_pose(&pose());
        let identity = x * x.inv();
        assert_abs_diff_eq!(identity.rotation, Matrix3::identity(), epsilon = 1e-12);
        assert_abs_diff_eq!(identity.translation, Vector3::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn test_spatial_transform_matches_matrix() {
        let x = SpatialTransform::from_pose(&pose());
        let v = Velocity::new(Vector3::new(0.1, 0.2, 0.3), Vector3::new(-1.0, 0.5, 2.0));
        let f = Force::new(Vector3::new(1.0, -2.0, 0.3), Vector3::new(4.0, 0.0, -1.0));
        assert_abs_diff_eq!((x * v).vector(), x.motion_matrix() * v.vector(), epsilon = 1e-12);
        assert_abs_diff_eq!((x * f).vector(), x.force_matrix() * f.vector(), epsilon = 1e-12);
    }

    #[test]
    fn test_power_is_frame_invariant() {
        let x = SpatialTransform::from_pose(&pose());
        let v = Velocity::new(Vector3::new(0.4, -0.1, 0.3), Vector3::new(1.0, 0.5, -2.0));
        let f = Force::new(Vector3::new(0.2, 0.7, -0.3), Vector3::new(-3.0, 1.0, 1.5));
        assert_abs_diff_eq!((x * f).power(&(x * v)), f.power(&v), epsilon = 1e-12);
    }

    #[test]
    fn test_from_pose_moves_points_like_transform() {
        // a frame translating with the origin of A, seen from B, moves like -R^T v
        let pose = pose();
        let b_from_a = SpatialTransform::from_pose(&pose);
        let v_a = Velocity::new(Vector3::zeros(), Vector3::new(1.0, 2.0, 3.0));
        let v_b = b_from_a * v_a;
        assert_abs_diff_eq!(
            v_b.translation(),
            pose.inverse_transform_vector(&v_a.translation()),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_compose_matches_pose_compose() {
        let t_ab = pose();
        let t_bc = Transform::new(
            UnitQuaternion::from_euler_angles(-0.5, 0.1, 0.2),
            Vector3::new(0.0, 0.3, -0.4),
        );
        let composed = SpatialTransform::from_pose(&t_bc) * SpatialTransform::from_pose(&t_ab);
        let direct = SpatialTransform::from_pose(&(t_ab * t_bc));
        assert_abs_diff_eq!(composed.rotation, direct.rotation, epsilon = 1e-12);
        assert_abs_diff_eq!(composed.translation, direct.translation, epsilon = 1e-12);
    }

    #[test]
    fn test_spatial_inertia_shift() {
        // a body with its com offset equals a centered body seen from a shifted frame
        let inertia = Inertia::new(0.2, 0.3, 0.4, 0.01, 0.0, -0.02).unwrap();
        let com = Vector3::new(0.1, -0.2, 0.5);
        let offset = SpatialInertia(
            MassProperties::new(2.0, CenterOfMass::from(com), inertia).unwrap(),
        );
        let centered = SpatialInertia(
            MassProperties::new(2.0, CenterOfMass::default(), inertia).unwrap(),
        );
        // com_from_body: pose of com frame in body frame is a pure translation
        let com_from_body = SpatialTransform::from_pose(&Transform::new(
            UnitQuaternion::identity(),
            com,
        ));
        assert_abs_diff_eq!(
            com_from_body.inertia_to_parent(&centered.matrix()),
            offset.matrix(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_linear_acceleration_at_point_centripetal() {
        let twist = Velocity::new(Vector3::new(0.0, 0.0, 2.0), Vector3::zeros());
        let acceleration = Acceleration::zeros();
        let a = acceleration.linear_acceleration_at(&twist, &Vector3::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(a, Vector3::new(-4.0, 0.0, 0.0), epsilon = 1e-12);
    }
}

use crate::body::{BodyId, SimRigidBody};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use spatial_algebra::{Force, SpatialTransform, Velocity};
use transforms::Transform;

/// A frame rigidly attached to a body that tracks its pose and twist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinematicPoint {
    pub name: String,
    pub body: BodyId,
    /// Pose of the point in the body frame.
    pub offset: Transform,
    /// Pose in the inertial frame.
    pub pose: Transform,
    /// Twist of the point frame, in point coordinates.
    pub twist: Velocity,
}

impl KinematicPoint {
    pub fn new(name: &str, body: BodyId, offset: Transform) -> Self {
        Self {
            name: name.to_string(),
            body,
            offset,
            pose: offset,
            twist: Velocity::zeros(),
        }
    }

    pub fn update(&mut self, body: &SimRigidBody) {
        self.pose = body.pose * self.offset;
        self.twist = SpatialTransform::from_pose(&self.offset) * body.twist;
    }

    pub fn position(&self) -> Vector3<f64> {
        self.pose.translation
    }

    pub fn linear_velocity_world(&self) -> Vector3<f64> {
        self.pose.transform_vector(&self.twist.translation())
    }

    /// Expresses a wrench given in the point frame in the body frame.
    pub fn wrench_in_body(&self, wrench: Force) -> Force {
        SpatialTransform::from_pose(&self.offset).inv() * wrench
    }
}

/// A kinematic point where a wrench can be applied from outside the physics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalWrenchPoint {
    pub point: KinematicPoint,
    /// In the point frame.
    pub wrench: Force,
}

impl ExternalWrenchPoint {
    pub fn new(name: &str, body: BodyId, offset: Transform) -> Self {
        Self {
            point: KinematicPoint::new(name, body, offset),
            wrench: Force::zeros(),
        }
    }

    /// Sets the wrench from a force and moment expressed in the inertial frame.
    pub fn set_wrench_world(&mut self, moment: Vector3<f64>, force: Vector3<f64>) {
        let pose = &self.point.pose;
        self.wrench = Force::new(
            pose.inverse_transform_vector(&moment),
            pose.inverse_transform_vector(&force),
        );
    }

    pub fn wrench_in_body(&self) -> Force {
        self.point.wrench_in_body(self.wrench)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use mass_properties::MassProperties;
    use nalgebra::UnitQuaternion;
    use spatial_algebra::SpatialInertia;

    #[test]
    fn test_point_velocity_on_spinning_body() {
        let mut body = SimRigidBody::new("link", SpatialInertia(MassProperties::default()), None);
        body.pose = Transform::from_rotation(UnitQuaternion::from_axis_angle(
            &Vector3::z_axis(),
            std::f64::consts::FRAC_PI_2,
        ));
        body.twist = Velocity::new(Vector3::new(0.0, 0.0, 2.0), Vector3::zeros());
        let mut point = KinematicPoint::new("tip", BodyId(1), Transform::from_translation(1.0, 0.0, 0.0));
        point.update(&body);
        // body x axis points along world y, the tip moves along world -x
        assert_abs_diff_eq!(point.position(), Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(
            point.linear_velocity_world(),
            Vector3::new(-2.0, 0.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_wrench_in_body_adds_lever_moment() {
        let mut point =
            ExternalWrenchPoint::new("handle", BodyId(1), Transform::from_translation(0.0, 0.0, 0.5));
        point.wrench = Force::new(Vector3::zeros(), Vector3::new(2.0, 0.0, 0.0));
        let wrench = point.wrench_in_body();
        assert_abs_diff_eq!(wrench.translation(), Vector3::new(2.0, 0.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(wrench.rotation(), Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }
}

use super::kinematic_point::KinematicPoint;
use crate::body::BodyId;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use spatial_algebra::Force;
use transforms::Transform;

/// Contact history of a ground contact point, enough to resume a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundContactState {
    pub touchdown: Transform,
    pub contact_normal: Vector3<f64>,
    pub in_contact: bool,
    pub is_slipping: bool,
    pub wrench: Force,
}

/// A tracked point that interacts with the terrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundContactPoint {
    pub point: KinematicPoint,
    pub group_identifier: i32,
    /// Pose of the point when it last touched down, inertial frame.
    pub touchdown: Transform,
    /// Surface normal captured at touchdown, inertial frame.
    pub contact_normal: Vector3<f64>,
    pub in_contact: bool,
    pub is_slipping: bool,
    /// Contact wrench in the point frame.
    pub wrench: Force,
}

impl GroundContactPoint {
    pub fn new(name: &str, body: BodyId, offset: Transform, group_identifier: i32) -> Self {
        Self {
            point: KinematicPoint::new(name, body, offset),
            group_identifier,
            touchdown: Transform::identity(),
            contact_normal: Vector3::z(),
            in_contact: false,
            is_slipping: false,
            wrench: Force::zeros(),
        }
    }

    pub fn name(&self) -> &str {
        &self.point.name
    }

    pub fn clear_contact(&mut self) {
        self.in_contact = false;
        self.is_slipping = false;
        self.wrench = Force::zeros();
    }

    pub fn contact_state(&self) -> GroundContactState {
        GroundContactState {
            touchdown: self.touchdown,
            contact_normal: self.contact_normal,
            in_contact: self.in_contact,
            is_slipping: self.is_slipping,
            wrench: self.wrench,
        }
    }

    pub fn set_contact_state(&mut self, state: &GroundContactState) {
        self.touchdown = state.touchdown;
        self.contact_normal = state.contact_normal;
        self.in_contact = state.in_contact;
        self.is_slipping = state.is_slipping;
        self.wrench = state.wrench;
    }

    /// Contact force in the inertial frame.
    pub fn force_world(&self) -> Vector3<f64> {
        self.point.pose.transform_vector(&self.wrench.translation())
    }

    pub fn wrench_in_body(&self) -> Force {
        self.point.wrench_in_body(self.wrench)
    }
}

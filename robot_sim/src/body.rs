use crate::joint::JointId;
use serde::{Deserialize, Serialize};
use spatial_algebra::{SpatialInertia, Velocity};
use std::fmt;
use transforms::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub usize);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body[{}]", self.0)
    }
}

/// A rigid body of the runtime tree. The body frame is the frame after its
/// parent joint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimRigidBody {
    pub name: String,
    pub inertia: SpatialInertia,
    /// None for the root body, which is fixed to the robot's root frame.
    pub parent_joint: Option<JointId>,
    pub child_joints: Vec<JointId>,
    /// Pose of the body frame in the inertial frame.
    pub pose: Transform,
    /// Body twist relative to the inertial frame, in body coordinates.
    pub twist: Velocity,
}

impl SimRigidBody {
    pub fn new(name: &str, inertia: SpatialInertia, parent_joint: Option<JointId>) -> Self {
        Self {
            name: name.to_string(),
            inertia,
            parent_joint,
            child_joints: Vec::new(),
            pose: Transform::identity(),
            twist: Velocity::zeros(),
        }
    }
}

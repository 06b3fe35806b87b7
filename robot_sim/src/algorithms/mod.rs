pub mod articulated_body_algorithm;

use crate::{body::BodyId, joint::JointId, system::MultiBodySystem};
use nalgebra::{DVector, Vector3};
use spatial_algebra::{Acceleration, Force};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DynamicsErrors {
    #[error("articulated inertia of joint '{0}' is singular")]
    SingularArticulatedInertia(String),
    #[error("unreasonable acceleration for joint '{joint}': angular {angular}, linear {linear}")]
    UnreasonableAcceleration {
        joint: String,
        angular: f64,
        linear: f64,
    },
    #[error("acceleration of joint '{0}' is not finite")]
    NonFiniteAcceleration(String),
}

/// Computes joint and body accelerations of a tree from its current state,
/// the joint efforts and the external wrenches applied to its bodies.
pub trait ForwardDynamics {
    /// Sizes the buffers to the system and zeroes the external wrenches.
    fn reset(&mut self, system: &MultiBodySystem);
    /// External wrench accumulator of a body, in the body frame.
    fn external_wrench_mut(&mut self, body: BodyId) -> &mut Force;
    fn external_wrenches(&self) -> &[Force];
    fn compute(
        &mut self,
        system: &MultiBodySystem,
        gravity: &Vector3<f64>,
    ) -> Result<(), DynamicsErrors>;
    /// Body accelerations in body frames, including the gravity offset.
    fn body_accelerations(&self) -> &[Acceleration];
    fn joint_acceleration(&self, joint: JointId) -> &DVector<f64>;

    /// Copies the computed accelerations of the considered joints into their state.
    fn write_joint_accelerations(&self, system: &mut MultiBodySystem) {
        let joints = system.joints_to_consider().to_vec();
        for joint in joints {
            let qdd = self.joint_acceleration(joint).clone();
            system.joint_mut(joint).state.qdd = qdd;
        }
    }
}

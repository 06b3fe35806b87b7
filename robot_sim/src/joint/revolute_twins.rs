use crate::joint::{
    integrate_one_dof, joint_state::JointState, revolute_subspace_through, unit_axis, JointErrors,
    JointModel,
};
use nalgebra::{DVector, Matrix6xX, Vector3};
use serde::{Deserialize, Serialize};
use transforms::Transform;

/// Two revolute joints about the same axis with `q_b = ratio * q_a + offset`.
/// The joint coordinate is the total angle `q_a + q_b`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevoluteTwins {
    pub axis: Vector3<f64>,
    pub transform_a_to_b: Transform,
    pub ratio: f64,
    pub offset: f64,
}

impl RevoluteTwins {
    pub fn new(
        joint: &str,
        axis: &Vector3<f64>,
        transform_a_to_b: Transform,
        ratio: f64,
        offset: f64,
    ) -> Result<Self, JointErrors> {
        if (1.0 + ratio).abs() < 1e-9 {
            return Err(JointErrors::DegenerateTwinRatio(joint.to_string()));
        }
        Ok(Self {
            axis: unit_axis(joint, axis)?,
            transform_a_to_b,
            ratio,
            offset,
        })
    }

    /// Splits the total angle into the angles of the two twins.
    pub fn split(&self, q: f64) -> (f64, f64) {
        let q_a = (q - self.offset) / (1.0 + self.ratio);
        (q_a, self.ratio * q_a + self.offset)
    }
}

impl JointModel for RevoluteTwins {
    fn ndof(&self) -> usize {
        1
    }

    fn nq(&self) -> usize {
        1
    }

    fn neutral_configuration(&self) -> DVector<f64> {
        DVector::from_element(1, self.offset)
    }

    fn joint_transform(&self, q: &DVector<f64>) -> Transform {
        let (q_a, q_b) = self.split(q[0]);
        Transform::from_axis_angle(&self.axis, q_a)
            * self.transform_a_to_b
            * Transform::from_axis_angle(&self.axis, q_b)
    }

    fn motion_subspace(&self, q: &DVector<f64>) -> Matrix6xX<f64> {
        let (_, q_b) = self.split(q[0]);
        let weight_a = 1.0 / (1.0 + self.ratio);
        let weight_b = self.ratio * weight_a;
        let after_in_a = self.transform_a_to_b * Transform::from_axis_angle(&self.axis, q_b);
        let s_a = revolute_subspace_through(&self.axis, &after_in_a);
        let s_b = revolute_subspace_through(&self.axis, &Transform::identity());
        Matrix6xX::from_columns(&[s_a * weight_a + s_b * weight_b])
    }

    fn integrate(&self, state: &mut JointState, dt: f64) {
        integrate_one_dof(state, dt);
    }

    fn angular_dofs(&self) -> &'static [bool] {
        &[true]
    }
}

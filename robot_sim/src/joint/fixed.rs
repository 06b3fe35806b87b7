use crate::joint::{joint_state::JointState, JointModel};
use nalgebra::{DVector, Matrix6xX};
use serde::{Deserialize, Serialize};
use transforms::Transform;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixed;

impl JointModel for Fixed {
    fn ndof(&self) -> usize {
        0
    }

    fn nq(&self) -> usize {
        0
    }

    fn neutral_configuration(&self) -> DVector<f64> {
        DVector::zeros(0)
    }

    fn joint_transform(&self, _q: &DVector<f64>) -> Transform {
        Transform::identity()
    }

    fn motion_subspace(&self, _q: &DVector<f64>) -> Matrix6xX<f64> {
        Matrix6xX::zeros(0)
    }

    fn integrate(&self, _state: &mut JointState, _dt: f64) {}

    fn angular_dofs(&self) -> &'static [bool] {
        &[]
    }
}

use crate::joint::{integrate_one_dof, joint_state::JointState, unit_axis, JointErrors, JointModel};
use nalgebra::{DVector, Matrix6xX, Vector3, Vector6};
use serde::{Deserialize, Serialize};
use transforms::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Revolute {
    /// Unit rotation axis in the frame before the joint.
    pub axis: Vector3<f64>,
}

impl Revolute {
    pub fn new(joint: &str, axis: &Vector3<f64>) -> Result<Self, JointErrors> {
        Ok(Self {
            axis: unit_axis(joint, axis)?,
        })
    }
}

impl JointModel for Revolute {
    fn ndof(&self) -> usize {
        1
    }

    fn nq(&self) -> usize {
        1
    }

    fn neutral_configuration(&self) -> DVector<f64> {
        DVector::zeros(1)
    }

    fn joint_transform(&self, q: &DVector<f64>) -> Transform {
        Transform::from_axis_angle(&self.axis, q[0])
    }

    fn motion_subspace(&self, _q: &DVector<f64>) -> Matrix6xX<f64> {
        // the axis is unchanged by the rotation about itself
        let a = self.axis;
        Matrix6xX::from_columns(&[Vector6::new(a[0], a[1], a[2], 0.0, 0.0, 0.0)])
    }

    fn integrate(&self, state: &mut JointState, dt: f64) {
        integrate_one_dof(state, dt);
    }

    fn angular_dofs(&self) -> &'static [bool] {
        &[true]
    }
}

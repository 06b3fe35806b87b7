use crate::joint::{
    integrate_one_dof, joint_state::JointState, revolute_subspace_through, unit_axis, JointErrors,
    JointModel,
};
use nalgebra::{DVector, Matrix6xX, Vector3};
use serde::{Deserialize, Serialize};
use transforms::Transform;

/// Cross four bar linkage reduced to a rigid coupler.
///
/// The interior joints are not modeled: the output link turns by exactly the
/// master angle about `axis` and then sits at the fixed `output_offset`. The
/// angle ratio of a real crossed linkage, which varies with configuration, is
/// not reproduced, nor is the mass of the coupler links.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossFourBar {
    pub axis: Vector3<f64>,
    pub output_offset: Transform,
}

impl CrossFourBar {
    pub fn new(
        joint: &str,
        axis: &Vector3<f64>,
        output_offset: Transform,
    ) -> Result<Self, JointErrors> {
        Ok(Self {
            axis: unit_axis(joint, axis)?,
            output_offset,
        })
    }
}

impl JointModel for CrossFourBar {
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
        Transform::from_axis_angle(&self.axis, q[0]) * self.output_offset
    }

    fn motion_subspace(&self, _q: &DVector<f64>) -> Matrix6xX<f64> {
        Matrix6xX::from_columns(&[revolute_subspace_through(&self.axis, &self.output_offset)])
    }

    fn integrate(&self, state: &mut JointState, dt: f64) {
        integrate_one_dof(state, dt);
    }

    fn angular_dofs(&self) -> &'static [bool] {
        &[true]
    }
}

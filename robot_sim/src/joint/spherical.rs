use crate::joint::{
    joint_state::JointState, read_quaternion, rotation_increment, write_quaternion, JointModel,
};
use nalgebra::{DVector, Matrix6xX, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use transforms::Transform;

/// Configuration is a quaternion (x, y, z, w), velocity is the angular
/// velocity in the frame after the joint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Spherical;

impl JointModel for Spherical {
    fn ndof(&self) -> usize {
        3
    }

    fn nq(&self) -> usize {
        4
    }

    fn neutral_configuration(&self) -> DVector<f64> {
        DVector::from_vec(vec![0.0, 0.0, 0.0, 1.0])
    }

    fn joint_transform(&self, q: &DVector<f64>) -> Transform {
        Transform::from_rotation(read_quaternion(q, 0))
    }

    fn motion_subspace(&self, _q: &DVector<f64>) -> Matrix6xX<f64> {
        let mut s = Matrix6xX::zeros(3);
        s.fixed_view_mut::<3, 3>(0, 0).fill_with_identity();
        s
    }

    fn integrate(&self, state: &mut JointState, dt: f64) {
        let omega = Vector3::new(state.qd[0], state.qd[1], state.qd[2]);
        let alpha = Vector3::new(state.qdd[0], state.qdd[1], state.qdd[2]);
        let delta_omega = Vector3::new(state.delta_qd[0], state.delta_qd[1], state.delta_qd[2]);

        let increment = rotation_increment(&omega, &delta_omega, &alpha, dt);
        let omega_new = increment.inverse_transform_vector(&(omega + alpha * dt + delta_omega));
        let alpha_new = increment.inverse_transform_vector(&alpha);

        let orientation: UnitQuaternion<f64> = read_quaternion(&state.q, 0) * increment;
        write_quaternion(&mut state.q, 0, &orientation);
        for i in 0..3 {
            state.qd[i] = omega_new[i];
            state.qdd[i] = alpha_new[i];
        }
    }

    fn angular_dofs(&self) -> &'static [bool] {
        &[true, true, true]
    }
}

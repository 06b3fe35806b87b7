use crate::joint::{
    joint_state::JointState, read_quaternion, rotation_increment, write_quaternion, JointModel,
};
use nalgebra::{DVector, Matrix6xX, Vector3};
use serde::{Deserialize, Serialize};
use transforms::Transform;

/// Six degree of freedom joint. Configuration is a quaternion (x, y, z, w)
/// followed by the position in the frame before the joint. Velocity is the
/// body twist, angular then linear, in the frame after the joint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Floating;

impl JointModel for Floating {
    fn ndof(&self) -> usize {
        6
    }

    fn nq(&self) -> usize {
        7
    }

    fn neutral_configuration(&self) -> DVector<f64> {
        DVector::from_vec(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0])
    }

    fn joint_transform(&self, q: &DVector<f64>) -> Transform {
        Transform::new(read_quaternion(q, 0), Vector3::new(q[4], q[5], q[6]))
    }

    fn motion_subspace(&self, _q: &DVector<f64>) -> Matrix6xX<f64> {
        Matrix6xX::identity(6)
    }

    fn integrate(&self, state: &mut JointState, dt: f64) {
        let v3 = |v: &DVector<f64>, start: usize| Vector3::new(v[start], v[start + 1], v[start + 2]);
        let omega = v3(&state.qd, 0);
        let velocity = v3(&state.qd, 3);
        let alpha = v3(&state.qdd, 0);
        let delta_omega = v3(&state.delta_qd, 0);
        let delta_velocity = v3(&state.delta_qd, 3);

        // spatial to classical linear acceleration
        let acceleration = v3(&state.qdd, 3) + omega.cross(&velocity);

        let orientation = read_quaternion(&state.q, 0);
        let increment = rotation_increment(&omega, &delta_omega, &alpha, dt);
        let displacement =
            (velocity + delta_velocity * 0.5) * dt + acceleration * (0.5 * dt * dt);
        let position = v3(&state.q, 4) + orientation * displacement;

        let omega_new = increment.inverse_transform_vector(&(omega + alpha * dt + delta_omega));
        let velocity_new = increment
            .inverse_transform_vector(&(velocity + acceleration * dt + delta_velocity));
        let alpha_new = increment.inverse_transform_vector(&alpha);
        let acceleration_new = increment.inverse_transform_vector(&acceleration)
            - omega_new.cross(&velocity_new);

        write_quaternion(&mut state.q, 0, &(orientation * increment));
        for i in 0..3 {
            state.q[4 + i] = position[i];
            state.qd[i] = omega_new[i];
            state.qd[3 + i] = velocity_new[i];
            state.qdd[i] = alpha_new[i];
            state.qdd[3 + i] = acceleration_new[i];
        }
    }

    fn angular_dofs(&self) -> &'static [bool] {
        &[true, true, true, false, false, false]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_floating_free_fall_step() {
        let floating = Floating;
        let mut state = JointState::new(floating.neutral_configuration(), 6);
        state.qdd[5] = -9.81;
        let dt = 0.01;
        floating.integrate(&mut state, dt);
        assert_abs_diff_eq!(state.q[6], -0.5 * 9.81 * dt * dt, epsilon = 1e-12);
        assert_abs_diff_eq!(state.qd[5], -9.81 * dt, epsilon = 1e-12);
        assert_abs_diff_eq!(state.q[3], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_floating_spin_keeps_unit_quaternion() {
        let floating = Floating;
        let mut state = JointState::new(floating.neutral_configuration(), 6);
        state.qd[2] = 3.0;
        for _ in 0..100 {
            floating.integrate(&mut state, 0.01);
        }
        let rotation = read_quaternion(&state.q, 0);
        assert_abs_diff_eq!(rotation.angle(), 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(state.qd[2], 3.0, epsilon = 1e-12);
    }
}

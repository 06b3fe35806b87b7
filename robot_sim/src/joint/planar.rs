use crate::joint::{joint_state::JointState, JointModel};
use nalgebra::{DVector, Matrix6xX, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use transforms::Transform;

/// Motion in the x-z plane. Configuration is (pitch, x, z) and velocity is
/// (pitch rate, x velocity, z velocity) in the frame after the joint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Planar;

impl JointModel for Planar {
    fn ndof(&self) -> usize {
        3
    }

    fn nq(&self) -> usize {
        3
    }

    fn neutral_configuration(&self) -> DVector<f64> {
        DVector::zeros(3)
    }

    fn joint_transform(&self, q: &DVector<f64>) -> Transform {
        Transform::new(
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), q[0]),
            Vector3::new(q[1], 0.0, q[2]),
        )
    }

    fn motion_subspace(&self, _q: &DVector<f64>) -> Matrix6xX<f64> {
        let mut s = Matrix6xX::zeros(3);
        s[(1, 0)] = 1.0;
        s[(3, 1)] = 1.0;
        s[(5, 2)] = 1.0;
        s
    }

    fn integrate(&self, state: &mut JointState, dt: f64) {
        let (pitch, omega, alpha, delta_omega) =
            (state.q[0], state.qd[0], state.qdd[0], state.delta_qd[0]);
        let (vx, vz) = (state.qd[1], state.qd[2]);
        let (dvx, dvz) = (state.delta_qd[1], state.delta_qd[2]);

        // spatial to classical: a + w x v with w along y
        let ax = state.qdd[1] + omega * vz;
        let az = state.qdd[2] - omega * vx;

        let delta_pitch = omega * dt + 0.5 * delta_omega * dt + 0.5 * alpha * dt * dt;
        let px = (vx + 0.5 * dvx) * dt + 0.5 * ax * dt * dt;
        let pz = (vz + 0.5 * dvz) * dt + 0.5 * az * dt * dt;
        let (s, c) = pitch.sin_cos();
        state.q[1] += c * px + s * pz;
        state.q[2] += -s * px + c * pz;
        state.q[0] = pitch + delta_pitch;

        let omega_new = omega + alpha * dt + delta_omega;
        let vx_new = vx + ax * dt + dvx;
        let vz_new = vz + az * dt + dvz;
        // re-express in the rotated frame
        let (s, c) = delta_pitch.sin_cos();
        let (vx_new, vz_new) = (c * vx_new - s * vz_new, s * vx_new + c * vz_new);
        let (ax_new, az_new) = (c * ax - s * az, s * ax + c * az);

        state.qd[0] = omega_new;
        state.qd[1] = vx_new;
        state.qd[2] = vz_new;
        state.qdd[1] = ax_new - omega_new * vz_new;
        state.qdd[2] = az_new + omega_new * vx_new;
    }

    fn angular_dofs(&self) -> &'static [bool] {
        &[true, false, false]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_planar_translates_in_rotated_frame() {
        let planar = Planar;
        let mut state = JointState::new(planar.neutral_configuration(), 3);
        state.q[0] = std::f64::consts::FRAC_PI_2;
        state.qd[1] = 1.0;
        planar.integrate(&mut state, 0.1);
        // body x points along world -z after a quarter turn about y
        assert_abs_diff_eq!(state.q[1], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(state.q[2], -0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(state.qd[1], 1.0, epsilon = 1e-12);
    }
}

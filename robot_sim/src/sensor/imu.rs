use super::filter::AntiAliasingFilter;
use crate::{
    body::{BodyId, SimRigidBody},
    physics_output::RobotPhysicsOutput,
};
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use transforms::Transform;

/// Inertial measurement unit rigidly attached to a body.
///
/// Orientation is the sensor frame in the inertial frame. Angular velocity
/// and linear acceleration are expressed in the sensor frame, the latter as a
/// proper acceleration (an IMU at rest reads +g upward).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimIMUSensor {
    pub name: String,
    pub body: BodyId,
    /// Pose of the sensor in the body frame.
    pub offset: Transform,
    sampling_rate: f64,
    pose: Transform,
    angular_velocity: Vector3<f64>,
    linear_acceleration: Vector3<f64>,
    filtered_orientation: UnitQuaternion<f64>,
    filtered_angular_velocity: Vector3<f64>,
    filtered_linear_acceleration: Vector3<f64>,
    filter: AntiAliasingFilter,
    delta_twist_correction: bool,
}

impl SimIMUSensor {
    pub fn new(name: &str, body: BodyId, offset: Transform, update_period: f64) -> Self {
        let sampling_rate = AntiAliasingFilter::sampling_rate(update_period);
        Self {
            name: name.to_string(),
            body,
            offset,
            sampling_rate,
            pose: offset,
            angular_velocity: Vector3::zeros(),
            linear_acceleration: Vector3::zeros(),
            filtered_orientation: offset.rotation,
            filtered_angular_velocity: Vector3::zeros(),
            filtered_linear_acceleration: Vector3::zeros(),
            filter: AntiAliasingFilter::new(sampling_rate),
            delta_twist_correction: true,
        }
    }

    /// Whether the velocity correction applied since the last dynamics solve
    /// contributes `Δv / dt` to the linear acceleration.
    pub fn set_delta_twist_correction(&mut self, enabled: bool) {
        self.delta_twist_correction = enabled;
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn filter(&self) -> &AntiAliasingFilter {
        &self.filter
    }

    /// Overrides the low pass break frequency in Hz shared by every filtered
    /// reading of this sensor.
    pub fn set_filter_break_frequency(&mut self, break_frequency: f64) {
        self.filter.set_break_frequency(break_frequency);
    }

    pub fn pose(&self) -> &Transform {
        &self.pose
    }

    pub fn orientation(&self) -> UnitQuaternion<f64> {
        self.pose.rotation
    }

    pub fn angular_velocity(&self) -> Vector3<f64> {
        self.angular_velocity
    }

    pub fn linear_acceleration(&self) -> Vector3<f64> {
        self.linear_acceleration
    }

    pub fn filtered_orientation(&self) -> UnitQuaternion<f64> {
        self.filtered_orientation
    }

    pub fn filtered_angular_velocity(&self) -> Vector3<f64> {
        self.filtered_angular_velocity
    }

    pub fn filtered_linear_acceleration(&self) -> Vector3<f64> {
        self.filtered_linear_acceleration
    }

    pub fn update(&mut self, body: &SimRigidBody, output: &RobotPhysicsOutput) {
        self.pose = body.pose * self.offset;
        let offset = self.offset;
        let p = offset.translation;
        let sensor_from_body = |v: &Vector3<f64>| offset.inverse_transform_vector(v);

        self.angular_velocity = sensor_from_body(&body.twist.rotation());

        let acceleration = output.acceleration(self.body);
        let mut linear_acceleration = acceleration.linear_acceleration_at(&body.twist, &p);
        if self.delta_twist_correction && output.dt != 0.0 {
            if let Some(delta_twist) = output.delta_twist(self.body) {
                // velocity jump of the sensor point spread over the tick
                let delta_v = delta_twist.translation() + delta_twist.rotation().cross(&p);
                linear_acceleration += delta_v / output.dt;
            }
        }
        self.linear_acceleration = sensor_from_body(&linear_acceleration);

        let step = self.filter.step(output.dt);
        step.apply_rotation(&mut self.filtered_orientation, &self.pose.rotation);
        step.apply(&mut self.filtered_angular_velocity, &self.angular_velocity);
        step.apply(
            &mut self.filtered_linear_acceleration,
            &self.linear_acceleration,
        );
    }
}

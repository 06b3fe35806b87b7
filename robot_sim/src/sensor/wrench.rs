use super::filter::AntiAliasingFilter;
use crate::{body::BodyId, physics_output::RobotPhysicsOutput, system::MultiBodySystem};
use nalgebra::Vector6;
use serde::{Deserialize, Serialize};
use spatial_algebra::{Force, SpatialTransform};
use transforms::Transform;

/// Where the sensor sits relative to the body it is attached to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WrenchSensorLocation {
    /// Between the joint and the body, the body's own dynamics are measured.
    #[default]
    BeforeBody,
    /// Past the body, only what its children transmit is measured.
    AfterBody,
}

/// Force/torque sensor measuring the wrench transmitted into the subtree
/// below its joint, expressed in the sensor frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimWrenchSensor {
    pub name: String,
    pub body: BodyId,
    /// Pose of the sensor in the body frame.
    pub offset: Transform,
    pub location: WrenchSensorLocation,
    sampling_rate: f64,
    wrench: Vector6<f64>,
    filtered_wrench: Vector6<f64>,
    filter: AntiAliasingFilter,
}

impl SimWrenchSensor {
    pub fn new(name: &str, body: BodyId, offset: Transform, update_period: f64) -> Self {
        let sampling_rate = AntiAliasingFilter::sampling_rate(update_period);
        Self {
            name: name.to_string(),
            body,
            offset,
            location: WrenchSensorLocation::default(),
            sampling_rate,
            wrench: Vector6::zeros(),
            filtered_wrench: Vector6::zeros(),
            filter: AntiAliasingFilter::new(sampling_rate),
        }
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn filter(&self) -> &AntiAliasingFilter {
        &self.filter
    }

    /// Overrides the low pass break frequency in Hz of the filtered wrench.
    pub fn set_filter_break_frequency(&mut self, break_frequency: f64) {
        self.filter.set_break_frequency(break_frequency);
    }

    pub fn wrench(&self) -> Force {
        Force::from(self.wrench)
    }

    pub fn filtered_wrench(&self) -> Force {
        Force::from(self.filtered_wrench)
    }

    pub fn update(&mut self, system: &MultiBodySystem, output: &RobotPhysicsOutput) {
        let sensor_pose = system.body(self.body).pose * self.offset;
        let mut total = Force::zeros();
        for body_id in system.subtree_bodies(self.body) {
            if body_id == self.body && self.location == WrenchSensorLocation::AfterBody {
                continue;
            }
            let body = system.body(body_id);
            let inertia = body.inertia;
            let momentum = inertia * body.twist;
            let mut wrench =
                inertia * output.acceleration(body_id) + body.twist.cross_force(momentum);
            wrench -= output.external_wrench(body_id);
            if let Some(impulse) = output.external_impulse(body_id) {
                if output.dt > 0.0 {
                    wrench -= impulse * (1.0 / output.dt);
                }
            }
            let sensor_from_body = SpatialTransform::from_pose(&(body.pose.inv() * sensor_pose));
            total += sensor_from_body * wrench;
        }
        self.wrench = total.vector();

        let step = self.filter.step(output.dt);
        step.apply(&mut self.filtered_wrench, &self.wrench);
    }
}

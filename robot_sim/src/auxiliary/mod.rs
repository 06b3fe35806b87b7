pub mod ground_contact_point;
pub mod kinematic_point;

use crate::{
    body::BodyId,
    joint::JointId,
    physics_output::RobotPhysicsOutput,
    sensor::{camera::SimCameraSensor, imu::SimIMUSensor, wrench::SimWrenchSensor},
    system::MultiBodySystem,
};
use ground_contact_point::GroundContactPoint;
use kinematic_point::{ExternalWrenchPoint, KinematicPoint};
use robot_definition::{joint::JointDefinition, sensor::SensorDefinition};

/// Trackers and sensors carried by one joint, attached to its successor body.
#[derive(Debug, Clone)]
pub struct SimJointAuxiliaryData {
    pub joint: JointId,
    pub body: BodyId,
    pub kinematic_points: Vec<KinematicPoint>,
    pub external_wrench_points: Vec<ExternalWrenchPoint>,
    pub ground_contact_points: Vec<GroundContactPoint>,
    pub imu_sensors: Vec<SimIMUSensor>,
    pub wrench_sensors: Vec<SimWrenchSensor>,
    pub camera_sensors: Vec<SimCameraSensor>,
}

impl SimJointAuxiliaryData {
    pub fn new(joint: JointId, body: BodyId) -> Self {
        Self {
            joint,
            body,
            kinematic_points: Vec::new(),
            external_wrench_points: Vec::new(),
            ground_contact_points: Vec::new(),
            imu_sensors: Vec::new(),
            wrench_sensors: Vec::new(),
            camera_sensors: Vec::new(),
        }
    }

    /// Instantiates everything the joint definition declares. Sensor kinds
    /// without a simulation counterpart are reported and skipped.
    pub fn from_definition(definition: &JointDefinition, joint: JointId, body: BodyId) -> Self {
        let mut data = Self::new(joint, body);
        for point in &definition.kinematic_points {
            data.kinematic_points.push(KinematicPoint::new(
                &point.name,
                body,
                point.transform_to_parent,
            ));
        }
        for point in &definition.external_wrench_points {
            data.external_wrench_points.push(ExternalWrenchPoint::new(
                &point.name,
                body,
                point.transform_to_parent,
            ));
        }
        for point in &definition.ground_contact_points {
            data.ground_contact_points.push(GroundContactPoint::new(
                &point.name,
                body,
                point.transform_to_parent,
                point.group_identifier,
            ));
        }
        for sensor in &definition.sensors {
            let common = sensor.common();
            match sensor {
                SensorDefinition::Imu(_) => data.imu_sensors.push(SimIMUSensor::new(
                    &common.name,
                    body,
                    common.transform_to_joint,
                    common.update_period,
                )),
                SensorDefinition::Wrench(_) => data.wrench_sensors.push(SimWrenchSensor::new(
                    &common.name,
                    body,
                    common.transform_to_joint,
                    common.update_period,
                )),
                SensorDefinition::Camera(camera) => {
                    data.camera_sensors.push(SimCameraSensor::new(camera, body))
                }
                SensorDefinition::Lidar(_) => log::warn!(
                    "{} sensor '{}' on joint '{}' is not supported, skipping",
                    sensor.kind(),
                    common.name,
                    definition.name
                ),
            }
        }
        data
    }

    /// Refreshes trackers then sensors from the current frames and the
    /// physics output of the last tick.
    pub fn update(&mut self, system: &MultiBodySystem, output: &RobotPhysicsOutput) {
        self.update_trackers(system);
        let body = system.body(self.body);
        for imu in &mut self.imu_sensors {
            imu.update(body, output);
        }
        for sensor in &mut self.wrench_sensors {
            sensor.update(system, output);
        }
        for camera in &mut self.camera_sensors {
            camera.update(body);
        }
    }

    /// Moves kinematic, wrench and contact points with the current frames.
    pub fn update_trackers(&mut self, system: &MultiBodySystem) {
        let body = system.body(self.body);
        for point in &mut self.kinematic_points {
            point.update(body);
        }
        for point in &mut self.external_wrench_points {
            point.point.update(body);
        }
        for point in &mut self.ground_contact_points {
            point.point.update(body);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kinematic_points.is_empty()
            && self.external_wrench_points.is_empty()
            && self.ground_contact_points.is_empty()
            && self.imu_sensors.is_empty()
            && self.wrench_sensors.is_empty()
            && self.camera_sensors.is_empty()
    }
}

mod builder;

use crate::{
    auxiliary::{
        ground_contact_point::{GroundContactPoint, GroundContactState},
        SimJointAuxiliaryData,
    },
    collidable::Collidable,
    controller::RobotControllerManager,
    joint::{joint_state::JointState, JointErrors, JointId},
    registry::VariableRegistry,
    system::MultiBodySystem,
};
use mass_properties::MassPropertiesErrors;
use robot_definition::{joint::JointStateDefinition, RobotDefinition};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RobotErrors {
    #[error("joint name '{0}' is used more than once")]
    DuplicateJointName(String),
    #[error("body name '{0}' is used more than once")]
    DuplicateBodyName(String),
    #[error("joint '{0}' has no successor body")]
    MissingSuccessor(String),
    #[error("joint to ignore '{0}' is not in the robot")]
    UnknownJointToIgnore(String),
    #[error("joint '{joint}' requests soft limits on an invalid range [{lower}, {upper}]")]
    InvalidSoftLimits { joint: String, lower: f64, upper: f64 },
    #[error("loop closure '{joint}' of type '{joint_type}' is not supported")]
    UnsupportedLoopClosure { joint: String, joint_type: String },
    #[error("loop closure '{joint}' closes onto body '{body}' which is not in the robot")]
    LoopClosureBodyNotFound { joint: String, body: String },
    #[error("body '{body}': {source}")]
    MassProperties {
        body: String,
        #[source]
        source: MassPropertiesErrors,
    },
    #[error("{0}")]
    Joint(#[from] JointErrors),
    #[error("state snapshot has {got} joints, robot has {expected}")]
    StateSize { got: usize, expected: usize },
    #[error("state snapshot has {got} contact points, robot has {expected}")]
    ContactStateSize { got: usize, expected: usize },
}

/// Everything a robot needs to resume a run: joint states in joint order and
/// the contact history of every ground contact point in traversal order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotState {
    pub joints: Vec<JointState>,
    pub contacts: Vec<GroundContactState>,
}

/// Runtime instance of a robot definition.
///
/// `auxiliary[i]` belongs to joint `i` of `system`. Collidables carried by
/// bodies only have their bounding boxes kept current, contacts are resolved
/// against terrain.
#[derive(Debug)]
pub struct Robot {
    pub name: String,
    pub definition: RobotDefinition,
    pub system: MultiBodySystem,
    pub auxiliary: Vec<SimJointAuxiliaryData>,
    pub collidables: Vec<Collidable>,
    pub controller_manager: RobotControllerManager,
    pub registry: VariableRegistry,
    initial_states: Vec<Option<JointStateDefinition>>,
}

impl Robot {
    /// Applies the initial states of the definition and refreshes frames.
    /// Joints without one keep their current state.
    pub fn initialize_state(&mut self) -> Result<(), RobotErrors> {
        for (joint, initial_state) in self.system.joints.iter_mut().zip(&self.initial_states) {
            if let Some(initial_state) = initial_state {
                joint.apply_state_definition(initial_state)?;
            }
        }
        self.update_frames();
        Ok(())
    }

    /// Returns every joint to its neutral configuration at rest.
    pub fn reset_state(&mut self) {
        self.system.reset_state();
        self.update_frames();
    }

    /// Recomputes body poses and twists, then moves the body collidables.
    pub fn update_frames(&mut self) {
        self.system.update_frames();
        for collidable in &mut self.collidables {
            if let Some(body) = collidable.body {
                collidable.set_owner_pose(&self.system.body(body).pose);
            }
        }
    }

    pub fn update_collidable_bounding_boxes(&mut self) {
        for collidable in &mut self.collidables {
            if let Some(body) = collidable.body {
                collidable.set_owner_pose(&self.system.body(body).pose);
            }
            collidable.update_bounding_box();
        }
    }

    pub fn controller_manager_mut(&mut self) -> &mut RobotControllerManager {
        &mut self.controller_manager
    }

    pub fn joint_auxiliary(&self, joint_name: &str) -> Option<&SimJointAuxiliaryData> {
        self.system
            .find_joint(joint_name)
            .map(|joint| &self.auxiliary[joint.0])
    }

    pub fn joint_auxiliary_mut(&mut self, joint_name: &str) -> Option<&mut SimJointAuxiliaryData> {
        self.system
            .find_joint(joint_name)
            .map(|joint| &mut self.auxiliary[joint.0])
    }

    pub fn ground_contact_points(&self) -> impl Iterator<Item = &GroundContactPoint> {
        self.auxiliary
            .iter()
            .flat_map(|data| data.ground_contact_points.iter())
    }

    pub fn ground_contact_point(&self, name: &str) -> Option<&GroundContactPoint> {
        self.ground_contact_points().find(|gcp| gcp.name() == name)
    }

    pub fn save_state(&self) -> RobotState {
        RobotState {
            joints: self.system.joint_states(),
            contacts: self
                .ground_contact_points()
                .map(GroundContactPoint::contact_state)
                .collect(),
        }
    }

    /// Puts the robot back in a saved state. Frames and tracked points are
    /// recomputed so the next tick starts from the same poses.
    pub fn restore_state(&mut self, state: &RobotState) -> Result<(), RobotErrors> {
        if state.joints.len() != self.system.joints.len() {
            return Err(RobotErrors::StateSize {
                got: state.joints.len(),
                expected: self.system.joints.len(),
            });
        }
        let n_contacts = self.ground_contact_points().count();
        if state.contacts.len() != n_contacts {
            return Err(RobotErrors::ContactStateSize {
                got: state.contacts.len(),
                expected: n_contacts,
            });
        }
        for (joint, saved) in self.system.joints.iter_mut().zip(&state.joints) {
            joint.state = saved.clone();
        }
        let points = self
            .auxiliary
            .iter_mut()
            .flat_map(|data| data.ground_contact_points.iter_mut());
        for (gcp, saved) in points.zip(&state.contacts) {
            gcp.set_contact_state(saved);
        }
        self.update_frames();
        for data in &mut self.auxiliary {
            data.update_trackers(&self.system);
        }
        Ok(())
    }

    /// Copies joint states, contact points and sensor readings into the registry.
    pub fn publish_variables(&mut self) {
        let registry = &mut self.registry;
        for joint in &self.system.joints {
            registry.set_vector(&format!("q_{}", joint.name), &joint.state.q);
            registry.set_vector(&format!("qd_{}", joint.name), &joint.state.qd);
            registry.set_vector(&format!("qdd_{}", joint.name), &joint.state.qdd);
            registry.set_vector(&format!("tau_{}", joint.name), &joint.state.tau);
        }
        for data in &self.auxiliary {
            for gcp in &data.ground_contact_points {
                let name = gcp.name();
                registry.set(&format!("{name}_in_contact"), f64::from(u8::from(gcp.in_contact)));
                registry.set(&format!("{name}_is_slipping"), f64::from(u8::from(gcp.is_slipping)));
                let force = gcp.force_world();
                registry.set_vector(&format!("{name}_force"), &force);
            }
            for imu in &data.imu_sensors {
                registry.set_vector(&format!("{}_angular_velocity", imu.name), &imu.angular_velocity());
                registry.set_vector(
                    &format!("{}_linear_acceleration", imu.name),
                    &imu.linear_acceleration(),
                );
                // x, y, z, w
                registry.set_vector(
                    &format!("{}_filtered_orientation", imu.name),
                    &imu.filtered_orientation().coords,
                );
            }
            for sensor in &data.wrench_sensors {
                let wrench = sensor.wrench();
                registry.set_vector(&format!("{}_moment", sensor.name), &wrench.rotation());
                registry.set_vector(&format!("{}_force", sensor.name), &wrench.translation());
            }
        }
    }

    pub fn joint_id(&self, name: &str) -> Option<JointId> {
        self.system.find_joint(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::sphere::Sphere;
    use mass_properties::MassProperties;
    use nalgebra::Vector3;
    use robot_definition::{
        collision::CollisionShapeDefinition,
        joint::{JointDefinition, JointType, LoopClosureDefinition, OneDoFJointParameters},
        rigid_body::RigidBodyDefinition,
        sensor::SensorDefinition,
        tracker::GroundContactPointDefinition,
    };
    use transforms::Transform;

    fn hinge(name: &str, successor: RigidBodyDefinition) -> JointDefinition {
        JointDefinition::new(
            name,
            JointType::Revolute(OneDoFJointParameters::new(Vector3::y())),
        )
        .with_successor(successor)
    }

    fn body(name: &str) -> RigidBodyDefinition {
        RigidBodyDefinition::new(name, MassProperties::default())
    }

    fn leg() -> RobotDefinition {
        let foot = body("foot")
            .with_collision_shape(CollisionShapeDefinition::new("ball", Sphere::new(0.05)));
        let knee = hinge("knee", foot)
            .with_ground_contact_point(GroundContactPointDefinition::new(
                "toe",
                Transform::from_translation(0.0, 0.0, -0.5),
            ))
            .with_sensor(SensorDefinition::imu("foot_imu", Transform::identity()))
            .with_sensor(SensorDefinition::lidar("foot_lidar", Transform::identity()))
            .with_initial_state(JointStateDefinition::one_dof(0.2, 0.0));
        let hip = hinge("hip", body("thigh").with_child_joint(knee));
        let pelvis = body("pelvis")
            .with_child_joint(hip)
            .with_child_joint(hinge("tail", body("tail_link")));
        let floating = JointDefinition::new("floating", JointType::SixDoF).with_successor(pelvis);
        RobotDefinition::new("biped", body("world").with_child_joint(floating))
    }

    #[test]
    fn test_tree_mirrors_definition_depth_first() {
        let robot = Robot::new(leg(), Transform::identity()).unwrap();
        let names: Vec<&str> = robot.system.joints.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["floating", "hip", "knee", "tail"]);
        assert_eq!(robot.auxiliary.len(), 4);
        let knee = robot.joint_auxiliary("knee").unwrap();
        assert_eq!(knee.ground_contact_points.len(), 1);
        // the lidar is skipped
        assert_eq!(knee.imu_sensors.len(), 1);
        assert_eq!(robot.collidables.len(), 1);
        let foot = robot.system.find_body("foot").unwrap();
        assert_eq!(robot.collidables[0].body, Some(foot));
        assert_eq!(knee.body, foot);
    }

    #[test]
    fn test_initial_and_reset_state() {
        let mut robot = Robot::new(leg(), Transform::identity()).unwrap();
        robot.reset_state();
        let knee = robot.joint_id("knee").unwrap();
        assert_eq!(robot.system.joint(knee).state.q[0], 0.0);
        robot.initialize_state().unwrap();
        assert_eq!(robot.system.joint(knee).state.q[0], 0.2);
    }

    #[test]
    fn test_unknown_joint_type_fails() {
        let definition = RobotDefinition::new(
            "gearbox",
            body("world").with_child_joint(
                JointDefinition::new("gear", JointType::Other("gear".into()))
                    .with_successor(body("wheel")),
            ),
        );
        assert!(matches!(
            Robot::new(definition, Transform::identity()),
            Err(RobotErrors::Joint(JointErrors::UnsupportedJointType { .. }))
        ));
    }

    #[test]
    fn test_configuration_errors() {
        let duplicate = RobotDefinition::new(
            "twins",
            body("world")
                .with_child_joint(hinge("a", body("link")))
                .with_child_joint(hinge("b", body("link"))),
        );
        assert!(matches!(
            Robot::new(duplicate, Transform::identity()),
            Err(RobotErrors::DuplicateBodyName(_))
        ));

        let ignored = leg().with_joint_to_ignore("elbow");
        assert!(matches!(
            Robot::new(ignored, Transform::identity()),
            Err(RobotErrors::UnknownJointToIgnore(_))
        ));

        let unordered = RobotDefinition::new(
            "stop",
            body("world").with_child_joint(
                JointDefinition::new(
                    "hinge",
                    JointType::Revolute(
                        OneDoFJointParameters::new(Vector3::y())
                            .with_position_limits(1.0, -1.0)
                            .with_soft_limit_gains(10.0, 0.0),
                    ),
                )
                .with_successor(body("link")),
            ),
        );
        assert!(matches!(
            Robot::new(unordered, Transform::identity()),
            Err(RobotErrors::InvalidSoftLimits { .. })
        ));

        let orphan = RobotDefinition::new(
            "orphan",
            body("world").with_child_joint(JointDefinition::new("hinge", JointType::Fixed)),
        );
        assert!(matches!(
            Robot::new(orphan, Transform::identity()),
            Err(RobotErrors::MissingSuccessor(_))
        ));
    }

    #[test]
    fn test_loop_closure_becomes_controller() {
        let closure = |joint_type: JointType, successor: &str| {
            JointDefinition::new("closure", joint_type).with_loop_closure(LoopClosureDefinition::new(
                successor,
                Transform::from_translation(0.0, 0.0, 0.1),
            ))
        };
        let build = |joint_type: JointType, successor: &str| {
            let link_b = body("link_b").with_child_joint(closure(joint_type, successor));
            let definition = RobotDefinition::new(
                "four_bar",
                body("world")
                    .with_child_joint(hinge("a", body("link_a")))
                    .with_child_joint(hinge("b", link_b)),
            );
            Robot::new(definition, Transform::identity())
        };

        let robot = build(
            JointType::Revolute(OneDoFJointParameters::new(Vector3::y())),
            "link_a",
        )
        .unwrap();
        assert_eq!(robot.system.joints.len(), 2);
        assert!(robot.system.find_joint("closure").is_none());
        assert_eq!(robot.controller_manager.controller_names(), vec!["closure"]);

        assert!(matches!(
            build(JointType::Planar, "link_a"),
            Err(RobotErrors::UnsupportedLoopClosure { .. })
        ));
        assert!(matches!(
            build(JointType::Fixed, "link_z"),
            Err(RobotErrors::LoopClosureBodyNotFound { .. })
        ));
    }

    #[test]
    fn test_publish_and_restore() {
        let mut robot = Robot::new(leg(), Transform::identity()).unwrap();
        let saved = robot.save_state();
        let knee = robot.joint_id("knee").unwrap();
        robot.system.joint_mut(knee).state.q[0] = 1.0;
        robot.publish_variables();
        assert_eq!(robot.registry.get("q_knee"), Some(1.0));
        assert_eq!(robot.registry.get("q_floating_3"), Some(1.0));
        assert_eq!(robot.registry.get("toe_in_contact"), Some(0.0));
        assert!(robot.registry.get("foot_imu_linear_acceleration_2").is_some());
        assert_eq!(robot.registry.get("foot_imu_filtered_orientation_3"), Some(1.0));

        robot.restore_state(&saved).unwrap();
        assert_eq!(robot.system.joint(knee).state.q[0], 0.2);

        let mut short = saved.clone();
        short.joints.pop();
        assert!(matches!(
            robot.restore_state(&short),
            Err(RobotErrors::StateSize { .. })
        ));
        let mut short = saved.clone();
        short.contacts.clear();
        assert!(matches!(
            robot.restore_state(&short),
            Err(RobotErrors::ContactStateSize { .. })
        ));
    }
}

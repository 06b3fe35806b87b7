use crate::{
    rigid_body::RigidBodyDefinition,
    sensor::SensorDefinition,
    tracker::{
        ExternalWrenchPointDefinition, GroundContactPointDefinition, KinematicPointDefinition,
    },
};
use nalgebra::{Vector3, Vector6};
use serde::{Deserialize, Serialize};
use transforms::Transform;

/// Parameters shared by every joint with a single degree of freedom.
///
/// Negative gains and damping mean "not set". Limits default to an unbounded range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OneDoFJointParameters {
    pub axis: Vector3<f64>,
    pub position_lower_limit: f64,
    pub position_upper_limit: f64,
    pub damping: f64,
    pub kp_soft_limit_stop: f64,
    pub kd_soft_limit_stop: f64,
}

impl Default for OneDoFJointParameters {
    fn default() -> Self {
        Self {
            axis: Vector3::z(),
            position_lower_limit: f64::NEG_INFINITY,
            position_upper_limit: f64::INFINITY,
            damping: -1.0,
            kp_soft_limit_stop: -1.0,
            kd_soft_limit_stop: -1.0,
        }
    }
}

impl OneDoFJointParameters {
    pub fn new(axis: Vector3<f64>) -> Self {
        Self {
            axis,
            ..Default::default()
        }
    }

    pub fn with_position_limits(mut self, lower: f64, upper: f64) -> Self {
        self.position_lower_limit = lower;
        self.position_upper_limit = upper;
        self
    }

    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    pub fn with_soft_limit_gains(mut self, kp: f64, kd: f64) -> Self {
        self.kp_soft_limit_stop = kp;
        self.kd_soft_limit_stop = kd;
        self
    }
}

/// Two revolute joints sharing one axis whose angles are coupled,
/// `q_b = ratio * q_a + offset`. The joint's coordinate is `q_a + q_b`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevoluteTwinsParameters {
    pub one_dof: OneDoFJointParameters,
    pub transform_a_to_b: Transform,
    pub ratio: f64,
    pub offset: f64,
}

/// Closed four bar linkage reduced to its master angle. The output link is
/// reached through `output_offset` after the rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossFourBarParameters {
    pub one_dof: OneDoFJointParameters,
    pub output_offset: Transform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JointType {
    Fixed,
    Revolute(OneDoFJointParameters),
    Prismatic(OneDoFJointParameters),
    Spherical,
    /// Motion in the x-z plane: rotation about y then translation in x and z.
    Planar,
    SixDoF,
    CrossFourBar(CrossFourBarParameters),
    RevoluteTwins(RevoluteTwinsParameters),
    /// A type tag a loader produced that has no simulation counterpart.
    Other(String),
}

impl JointType {
    pub fn tag(&self) -> &str {
        match self {
            JointType::Fixed => "fixed",
            JointType::Revolute(_) => "revolute",
            JointType::Prismatic(_) => "prismatic",
            JointType::Spherical => "spherical",
            JointType::Planar => "planar",
            JointType::SixDoF => "sixdof",
            JointType::CrossFourBar(_) => "crossfourbar",
            JointType::RevoluteTwins(_) => "revolutetwins",
            JointType::Other(tag) => tag,
        }
    }

    pub fn one_dof_parameters(&self) -> Option<&OneDoFJointParameters> {
        match self {
            JointType::Revolute(p) | JointType::Prismatic(p) => Some(p),
            JointType::CrossFourBar(p) => Some(&p.one_dof),
            JointType::RevoluteTwins(p) => Some(&p.one_dof),
            _ => None,
        }
    }
}

/// A joint that would close a kinematic loop. Gains are for the soft
/// constraint that replaces it, angular part first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopClosureDefinition {
    /// Name of the body the loop closes onto, owned elsewhere in the tree.
    pub successor: String,
    pub transform_to_successor_parent: Transform,
    pub kp_soft_constraint: Vector6<f64>,
    pub kd_soft_constraint: Vector6<f64>,
}

impl LoopClosureDefinition {
    pub fn new(successor: &str, transform_to_successor_parent: Transform) -> Self {
        Self {
            successor: successor.to_string(),
            transform_to_successor_parent,
            kp_soft_constraint: Vector6::new(100.0, 100.0, 100.0, 1.0e4, 1.0e4, 1.0e4),
            kd_soft_constraint: Vector6::new(5.0, 5.0, 5.0, 100.0, 100.0, 100.0),
        }
    }

    pub fn with_gains(mut self, kp: Vector6<f64>, kd: Vector6<f64>) -> Self {
        self.kp_soft_constraint = kp;
        self.kd_soft_constraint = kd;
        self
    }
}

/// Initial joint state. Missing entries are left at zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointStateDefinition {
    pub configuration: Option<Vec<f64>>,
    pub velocity: Option<Vec<f64>>,
    pub effort: Option<Vec<f64>>,
}

impl JointStateDefinition {
    pub fn one_dof(q: f64, qd: f64) -> Self {
        Self {
            configuration: Some(vec![q]),
            velocity: Some(vec![qd]),
            effort: None,
        }
    }

    /// Pose as quaternion (x, y, z, w) then position, twist as angular then linear.
    pub fn six_dof(pose: &Transform, twist: &Vector6<f64>) -> Self {
        let q = pose.rotation.coords;
        let p = pose.translation;
        Self {
            configuration: Some(vec![q[0], q[1], q[2], q[3], p[0], p[1], p[2]]),
            velocity: Some(twist.iter().copied().collect()),
            effort: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointDefinition {
    pub name: String,
    pub joint_type: JointType,
    pub transform_to_parent: Transform,
    pub successor: Option<Box<RigidBodyDefinition>>,
    pub loop_closure: Option<LoopClosureDefinition>,
    pub kinematic_points: Vec<KinematicPointDefinition>,
    pub external_wrench_points: Vec<ExternalWrenchPointDefinition>,
    pub ground_contact_points: Vec<GroundContactPointDefinition>,
    pub sensors: Vec<SensorDefinition>,
    pub initial_state: Option<JointStateDefinition>,
}

impl JointDefinition {
    pub fn new(name: &str, joint_type: JointType) -> Self {
        Self {
            name: name.to_string(),
            joint_type,
            transform_to_parent: Transform::identity(),
            successor: None,
            loop_closure: None,
            kinematic_points: Vec::new(),
            external_wrench_points: Vec::new(),
            ground_contact_points: Vec::new(),
            sensors: Vec::new(),
            initial_state: None,
        }
    }

    pub fn with_transform_to_parent(mut self, transform: Transform) -> Self {
        self.transform_to_parent = transform;
        self
    }

    pub fn with_successor(mut self, body: RigidBodyDefinition) -> Self {
        self.successor = Some(Box::new(body));
        self
    }

    pub fn with_loop_closure(mut self, loop_closure: LoopClosureDefinition) -> Self {
        self.loop_closure = Some(loop_closure);
        self
    }

    pub fn with_kinematic_point(mut self, point: KinematicPointDefinition) -> Self {
        self.kinematic_points.push(point);
        self
    }

    pub fn with_external_wrench_point(mut self, point: ExternalWrenchPointDefinition) -> Self {
        self.external_wrench_points.push(point);
        self
    }

    pub fn with_ground_contact_point(mut self, point: GroundContactPointDefinition) -> Self {
        self.ground_contact_points.push(point);
        self
    }

    pub fn with_sensor(mut self, sensor: impl Into<SensorDefinition>) -> Self {
        self.sensors.push(sensor.into());
        self
    }

    pub fn with_initial_state(mut self, state: JointStateDefinition) -> Self {
        self.initial_state = Some(state);
        self
    }

    pub fn is_loop_closure(&self) -> bool {
        self.loop_closure.is_some()
    }
}

pub mod fixed;
pub mod floating;
pub mod four_bar;
pub mod joint_state;
pub mod planar;
pub mod prismatic;
pub mod revolute;
pub mod revolute_twins;
pub mod spherical;

use crate::body::BodyId;
use fixed::Fixed;
use floating::Floating;
use four_bar::CrossFourBar;
use joint_state::JointState;
use nalgebra::{DVector, Matrix6xX, Quaternion, UnitQuaternion, Vector3, Vector6};
use planar::Planar;
use prismatic::Prismatic;
use revolute::Revolute;
use revolute_twins::RevoluteTwins;
use robot_definition::joint::{JointStateDefinition, JointType, OneDoFJointParameters};
use serde::{Deserialize, Serialize};
use spatial_algebra::{SpatialTransform, Velocity};
use spherical::Spherical;
use std::fmt;
use thiserror::Error;
use transforms::Transform;

#[derive(Debug, Error)]
pub enum JointErrors {
    #[error("axis of joint '{0}' has zero length")]
    ZeroAxis(String),
    #[error("initial {kind} of joint '{joint}' has {got} entries, expected {expected}")]
    InitialStateSize {
        joint: String,
        kind: &'static str,
        got: usize,
        expected: usize,
    },
    #[error("joint type '{type_name}' of joint '{joint}' is not supported")]
    UnsupportedJointType { joint: String, type_name: String },
    #[error("revolute twins '{0}' cannot have a coupling ratio of -1")]
    DegenerateTwinRatio(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JointId(pub usize);

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "joint[{}]", self.0)
    }
}

pub trait JointModel {
    /// Number of degrees of freedom, the size of qd, qdd and tau.
    fn ndof(&self) -> usize;
    /// Size of the configuration vector q.
    fn nq(&self) -> usize;
    fn neutral_configuration(&self) -> DVector<f64>;
    /// Pose of the frame after the joint in the frame before the joint.
    fn joint_transform(&self, q: &DVector<f64>) -> Transform;
    /// Columns span the joint twist, expressed in the frame after the joint.
    fn motion_subspace(&self, q: &DVector<f64>) -> Matrix6xX<f64>;
    /// Advances q and qd over dt using qdd and the pending delta_qd.
    fn integrate(&self, state: &mut JointState, dt: f64);
    /// Whether each degree of freedom is rotational.
    fn angular_dofs(&self) -> &'static [bool];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JointModels {
    CrossFourBar(CrossFourBar),
    Fixed(Fixed),
    Floating(Floating),
    Planar(Planar),
    Prismatic(Prismatic),
    Revolute(Revolute),
    RevoluteTwins(RevoluteTwins),
    Spherical(Spherical),
}

impl JointModels {
    pub fn from_definition(joint: &str, joint_type: &JointType) -> Result<Self, JointErrors> {
        let model = match joint_type {
            JointType::Fixed => JointModels::Fixed(Fixed),
            JointType::Revolute(p) => JointModels::Revolute(Revolute::new(joint, &p.axis)?),
            JointType::Prismatic(p) => JointModels::Prismatic(Prismatic::new(joint, &p.axis)?),
            JointType::Spherical => JointModels::Spherical(Spherical),
            JointType::Planar => JointModels::Planar(Planar),
            JointType::SixDoF => JointModels::Floating(Floating),
            JointType::CrossFourBar(p) => JointModels::CrossFourBar(CrossFourBar::new(
                joint,
                &p.one_dof.axis,
                p.output_offset,
            )?),
            JointType::RevoluteTwins(p) => JointModels::RevoluteTwins(RevoluteTwins::new(
                joint,
                &p.one_dof.axis,
                p.transform_a_to_b,
                p.ratio,
                p.offset,
            )?),
            JointType::Other(type_name) => {
                return Err(JointErrors::UnsupportedJointType {
                    joint: joint.to_string(),
                    type_name: type_name.clone(),
                })
            }
        };
        Ok(model)
    }
}

impl JointModel for JointModels {
    fn ndof(&self) -> usize {
        match self {
            JointModels::CrossFourBar(model) => model.ndof(),
            JointModels::Fixed(model) => model.ndof(),
            JointModels::Floating(model) => model.ndof(),
            JointModels::Planar(model) => model.ndof(),
            JointModels::Prismatic(model) => model.ndof(),
            JointModels::Revolute(model) => model.ndof(),
            JointModels::RevoluteTwins(model) => model.ndof(),
            JointModels::Spherical(model) => model.ndof(),
        }
    }

    fn nq(&self) -> usize {
        match self {
            JointModels::CrossFourBar(model) => model.nq(),
            JointModels::Fixed(model) => model.nq(),
            JointModels::Floating(model) => model.nq(),
            JointModels::Planar(model) => model.nq(),
            JointModels::Prismatic(model) => model.nq(),
            JointModels::Revolute(model) => model.nq(),
            JointModels::RevoluteTwins(model) => model.nq(),
            JointModels::Spherical(model) => model.nq(),
        }
    }

    fn neutral_configuration(&self) -> DVector<f64> {
        match self {
            JointModels::CrossFourBar(model) => model.neutral_configuration(),
            JointModels::Fixed(model) => model.neutral_configuration(),
            JointModels::Floating(model) => model.neutral_configuration(),
            JointModels::Planar(model) => model.neutral_configuration(),
            JointModels::Prismatic(model) => model.neutral_configuration(),
            JointModels::Revolute(model) => model.neutral_configuration(),
            JointModels::RevoluteTwins(model) => model.neutral_configuration(),
            JointModels::Spherical(model) => model.neutral_configuration(),
        }
    }

    fn joint_transform(&self, q: &DVector<f64>) -> Transform {
        match self {
            JointModels::CrossFourBar(model) => model.joint_transform(q),
            JointModels::Fixed(model) => model.joint_transform(q),
            JointModels::Floating(model) => model.joint_transform(q),
            JointModels::Planar(model) => model.joint_transform(q),
            JointModels::Prismatic(model) => model.joint_transform(q),
            JointModels::Revolute(model) => model.joint_transform(q),
            JointModels::RevoluteTwins(model) => model.joint_transform(q),
            JointModels::Spherical(model) => model.joint_transform(q),
        }
    }

    fn motion_subspace(&self, q: &DVector<f64>) -> Matrix6xX<f64> {
        match self {
            JointModels::CrossFourBar(model) => model.motion_subspace(q),
            JointModels::Fixed(model) => model.motion_subspace(q),
            JointModels::Floating(model) => model.motion_subspace(q),
            JointModels::Planar(model) => model.motion_subspace(q),
            JointModels::Prismatic(model) => model.motion_subspace(q),
            JointModels::Revolute(model) => model.motion_subspace(q),
            JointModels::RevoluteTwins(model) => model.motion_subspace(q),
            JointModels::Spherical(model) => model.motion_subspace(q),
        }
    }

    fn integrate(&self, state: &mut JointState, dt: f64) {
        match self {
            JointModels::CrossFourBar(model) => model.integrate(state, dt),
            JointModels::Fixed(model) => model.integrate(state, dt),
            JointModels::Floating(model) => model.integrate(state, dt),
            JointModels::Planar(model) => model.integrate(state, dt),
            JointModels::Prismatic(model) => model.integrate(state, dt),
            JointModels::Revolute(model) => model.integrate(state, dt),
            JointModels::RevoluteTwins(model) => model.integrate(state, dt),
            JointModels::Spherical(model) => model.integrate(state, dt),
        }
    }

    fn angular_dofs(&self) -> &'static [bool] {
        match self {
            JointModels::CrossFourBar(model) => model.angular_dofs(),
            JointModels::Fixed(model) => model.angular_dofs(),
            JointModels::Floating(model) => model.angular_dofs(),
            JointModels::Planar(model) => model.angular_dofs(),
            JointModels::Prismatic(model) => model.angular_dofs(),
            JointModels::Revolute(model) => model.angular_dofs(),
            JointModels::RevoluteTwins(model) => model.angular_dofs(),
            JointModels::Spherical(model) => model.angular_dofs(),
        }
    }
}

/// A joint of the runtime tree. Its successor body is owned through the arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimJoint {
    pub name: String,
    pub model: JointModels,
    pub predecessor: BodyId,
    pub successor: BodyId,
    pub parent_joint: Option<JointId>,
    /// Pose of the frame before the joint in the predecessor body frame.
    pub transform_to_parent: Transform,
    pub state: JointState,
    /// Limits, damping and soft stop gains of one-DoF joints.
    pub one_dof_parameters: Option<OneDoFJointParameters>,
    /// Excluded from integration when set.
    pub is_pinned: bool,
}

impl SimJoint {
    pub fn new(
        name: &str,
        model: JointModels,
        predecessor: BodyId,
        successor: BodyId,
        transform_to_parent: Transform,
    ) -> Self {
        let state = JointState::new(model.neutral_configuration(), model.ndof());
        Self {
            name: name.to_string(),
            model,
            predecessor,
            successor,
            parent_joint: None,
            transform_to_parent,
            state,
            one_dof_parameters: None,
            is_pinned: false,
        }
    }

    pub fn ndof(&self) -> usize {
        self.model.ndof()
    }

    /// Pose of the frame after the joint relative to the frame before it.
    pub fn joint_transform(&self) -> Transform {
        self.model.joint_transform(&self.state.q)
    }

    pub fn motion_subspace(&self) -> Matrix6xX<f64> {
        self.model.motion_subspace(&self.state.q)
    }

    /// Pose of the successor body frame in the predecessor body frame.
    pub fn successor_pose_in_predecessor(&self) -> Transform {
        self.transform_to_parent * self.joint_transform()
    }

    /// Motion transform successor_from_predecessor.
    pub fn successor_from_predecessor(&self) -> SpatialTransform {
        SpatialTransform::from_pose(&self.successor_pose_in_predecessor())
    }

    /// Twist across the joint, in the successor frame.
    pub fn joint_twist(&self) -> Velocity {
        Velocity::from(self.motion_subspace() * &self.state.qd)
    }

    pub fn reset_state(&mut self) {
        self.state = JointState::new(self.model.neutral_configuration(), self.model.ndof());
    }

    pub fn apply_state_definition(
        &mut self,
        definition: &JointStateDefinition,
    ) -> Result<(), JointErrors> {
        let nq = self.model.nq();
        let ndof = self.model.ndof();
        let name = self.name.clone();
        let check = |kind: &'static str, values: &Vec<f64>, expected: usize| {
            if values.len() != expected {
                return Err(JointErrors::InitialStateSize {
                    joint: name.clone(),
                    kind,
                    got: values.len(),
                    expected,
                });
            }
            Ok(DVector::from_vec(values.clone()))
        };
        if let Some(q) = &definition.configuration {
            let q = check("configuration", q, nq)?;
            self.state.q = q;
            self.normalize_configuration();
        }
        if let Some(qd) = &definition.velocity {
            self.state.qd = check("velocity", qd, ndof)?;
        }
        if let Some(tau) = &definition.effort {
            self.state.tau = check("effort", tau, ndof)?;
        }
        Ok(())
    }

    /// Renormalizes quaternion blocks after external writes.
    pub fn normalize_configuration(&mut self) {
        match self.model {
            JointModels::Spherical(_) | JointModels::Floating(_) => {
                let rotation = read_quaternion(&self.state.q, 0);
                write_quaternion(&mut self.state.q, 0, &rotation);
            }
            _ => {}
        }
    }

    /// Norms of the angular and linear parts of qdd.
    pub fn acceleration_norms(&self) -> (f64, f64) {
        let mut angular = 0.0;
        let mut linear = 0.0;
        for (i, is_angular) in self.model.angular_dofs().iter().enumerate() {
            let a = self.state.qdd[i] * self.state.qdd[i];
            if *is_angular {
                angular += a;
            } else {
                linear += a;
            }
        }
        (angular.sqrt(), linear.sqrt())
    }
}

pub(crate) fn unit_axis(joint: &str, axis: &Vector3<f64>) -> Result<Vector3<f64>, JointErrors> {
    axis.try_normalize(1e-12)
        .ok_or_else(|| JointErrors::ZeroAxis(joint.to_string()))
}

/// Quaternion stored as (x, y, z, w) starting at `start`.
pub(crate) fn read_quaternion(q: &DVector<f64>, start: usize) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(
        q[start + 3],
        q[start],
        q[start + 1],
        q[start + 2],
    ))
}

pub(crate) fn write_quaternion(q: &mut DVector<f64>, start: usize, rotation: &UnitQuaternion<f64>) {
    let coords = rotation.coords;
    for i in 0..4 {
        q[start + i] = coords[i];
    }
}

/// First order step shared by every single degree of freedom joint.
pub(crate) fn integrate_one_dof(state: &mut JointState, dt: f64) {
    let qdd = state.qdd[0];
    let qd = state.qd[0];
    let delta_qd = state.delta_qd[0];
    state.q[0] += (qd + 0.5 * delta_qd) * dt + 0.5 * qdd * dt * dt;
    state.qd[0] = qd + qdd * dt + delta_qd;
}

/// Rotation over one step from angular velocity, its correction and acceleration.
pub(crate) fn rotation_increment(
    omega: &Vector3<f64>,
    delta_omega: &Vector3<f64>,
    alpha: &Vector3<f64>,
    dt: f64,
) -> UnitQuaternion<f64> {
    let rotation_vector = omega * dt + delta_omega * (0.5 * dt) + alpha * (0.5 * dt * dt);
    UnitQuaternion::from_scaled_axis(rotation_vector)
}

/// Twist of a unit rotation about `axis` in a frame whose pose in the rotating
/// frame is `after_in_rotating`, expressed in that frame.
pub(crate) fn revolute_subspace_through(
    axis: &Vector3<f64>,
    after_in_rotating: &Transform,
) -> Vector6<f64> {
    let after_from_rotating = SpatialTransform::from_pose(after_in_rotating);
    (after_from_rotating * Velocity::new(*axis, Vector3::zeros())).vector()
}

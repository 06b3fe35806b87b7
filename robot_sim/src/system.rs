use crate::{
    body::{BodyId, SimRigidBody},
    joint::{JointId, SimJoint},
};
use serde::{Deserialize, Serialize};
use spatial_algebra::Velocity;
use std::collections::HashMap;
use transforms::Transform;

/// Arena holding the bodies and joints of one robot.
///
/// Joints are stored depth first so a forward iteration visits every parent
/// before its children.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MultiBodySystem {
    pub bodies: Vec<SimRigidBody>,
    pub joints: Vec<SimJoint>,
    /// Pose of the root body in the inertial frame.
    pub root_pose: Transform,
    joint_lookup: HashMap<String, JointId>,
    body_lookup: HashMap<String, BodyId>,
    joints_to_consider: Vec<JointId>,
    joints_to_ignore: Vec<JointId>,
}

impl MultiBodySystem {
    pub fn new(root: SimRigidBody, root_pose: Transform) -> Self {
        let mut body_lookup = HashMap::new();
        body_lookup.insert(root.name.clone(), BodyId(0));
        let mut root = root;
        root.pose = root_pose;
        Self {
            bodies: vec![root],
            joints: Vec::new(),
            root_pose,
            joint_lookup: HashMap::new(),
            body_lookup,
            joints_to_consider: Vec::new(),
            joints_to_ignore: Vec::new(),
        }
    }

    pub fn root(&self) -> BodyId {
        BodyId(0)
    }

    pub fn contains_body_name(&self, name: &str) -> bool {
        self.body_lookup.contains_key(name)
    }

    pub fn contains_joint_name(&self, name: &str) -> bool {
        self.joint_lookup.contains_key(name)
    }

    /// Adds a joint together with its successor body.
    pub fn push_joint(&mut self, mut joint: SimJoint, mut successor: SimRigidBody) -> JointId {
        let joint_id = JointId(self.joints.len());
        let body_id = BodyId(self.bodies.len());
        joint.successor = body_id;
        joint.parent_joint = self.bodies[joint.predecessor.0].parent_joint;
        successor.parent_joint = Some(joint_id);
        self.bodies[joint.predecessor.0].child_joints.push(joint_id);
        self.joint_lookup.insert(joint.name.clone(), joint_id);
        self.body_lookup.insert(successor.name.clone(), body_id);
        self.joints.push(joint);
        self.bodies.push(successor);
        self.joints_to_consider.push(joint_id);
        joint_id
    }

    /// Moves a joint from the considered set to the ignored set.
    pub fn ignore_joint(&mut self, joint: JointId) {
        self.joints_to_consider.retain(|j| *j != joint);
        if !self.joints_to_ignore.contains(&joint) {
            self.joints_to_ignore.push(joint);
            self.joints_to_ignore.sort();
        }
    }

    pub fn joints_to_consider(&self) -> &[JointId] {
        &self.joints_to_consider
    }

    pub fn joints_to_ignore(&self) -> &[JointId] {
        &self.joints_to_ignore
    }

    pub fn is_ignored(&self, joint: JointId) -> bool {
        self.joints_to_ignore.contains(&joint)
    }

    pub fn find_joint(&self, name: &str) -> Option<JointId> {
        self.joint_lookup.get(name).copied()
    }

    pub fn find_body(&self, name: &str) -> Option<BodyId> {
        self.body_lookup.get(name).copied()
    }

    pub fn joint(&self, id: JointId) -> &SimJoint {
        &self.joints[id.0]
    }

    pub fn joint_mut(&mut self, id: JointId) -> &mut SimJoint {
        &mut self.joints[id.0]
    }

    pub fn body(&self, id: BodyId) -> &SimRigidBody {
        &self.bodies[id.0]
    }

    pub fn joint_by_name(&self, name: &str) -> Option<&SimJoint> {
        self.find_joint(name).map(|id| self.joint(id))
    }

    pub fn body_by_name(&self, name: &str) -> Option<&SimRigidBody> {
        self.find_body(name).map(|id| self.body(id))
    }

    /// The body and every body below it, parents first.
    pub fn subtree_bodies(&self, body: BodyId) -> Vec<BodyId> {
        let mut bodies = vec![body];
        let mut i = 0;
        while i < bodies.len() {
            let current = bodies[i];
            for joint in &self.bodies[current.0].child_joints {
                bodies.push(self.joints[joint.0].successor);
            }
            i += 1;
        }
        bodies
    }

    /// Recomputes body poses and twists from the joint states.
    pub fn update_frames(&mut self) {
        let root = &mut self.bodies[0];
        root.pose = self.root_pose;
        root.twist = Velocity::zeros();
        for joint in &self.joints {
            let predecessor = &self.bodies[joint.predecessor.0];
            let pose_in_predecessor = joint.successor_pose_in_predecessor();
            let pose = predecessor.pose * pose_in_predecessor;
            let twist = spatial_algebra::SpatialTransform::from_pose(&pose_in_predecessor)
                * predecessor.twist
                + joint.joint_twist();
            let successor = &mut self.bodies[joint.successor.0];
            successor.pose = pose;
            successor.twist = twist;
        }
    }

    /// Propagates the joint velocity corrections into body twist corrections.
    pub fn body_delta_twists(&self) -> Vec<Velocity> {
        let mut delta_twists = vec![Velocity::zeros(); self.bodies.len()];
        for joint in &self.joints {
            let x = joint.successor_from_predecessor();
            let joint_delta =
                Velocity::from(joint.motion_subspace() * &joint.state.delta_qd);
            delta_twists[joint.successor.0] = x * delta_twists[joint.predecessor.0] + joint_delta;
        }
        delta_twists
    }

    pub fn reset_state(&mut self) {
        for joint in &mut self.joints {
            joint.reset_state();
        }
        self.update_frames();
    }

    /// Bit-level snapshot of every joint state, in joint order.
    pub fn joint_states(&self) -> Vec<crate::joint::joint_state::JointState> {
        self.joints.iter().map(|j| j.state.clone()).collect()
    }
}

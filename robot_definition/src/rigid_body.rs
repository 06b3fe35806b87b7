use crate::{collision::CollisionShapeDefinition, joint::JointDefinition};
use mass_properties::MassProperties;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidBodyDefinition {
    pub name: String,
    /// Expressed in the frame after the parent joint.
    pub mass_properties: MassProperties,
    pub collision_shapes: Vec<CollisionShapeDefinition>,
    pub children_joints: Vec<JointDefinition>,
}

impl RigidBodyDefinition {
    pub fn new(name: &str, mass_properties: MassProperties) -> Self {
        Self {
            name: name.to_string(),
            mass_properties,
            collision_shapes: Vec::new(),
            children_joints: Vec::new(),
        }
    }

    pub fn with_collision_shape(mut self, shape: CollisionShapeDefinition) -> Self {
        self.collision_shapes.push(shape);
        self
    }

    pub fn with_child_joint(mut self, joint: JointDefinition) -> Self {
        self.children_joints.push(joint);
        self
    }

    /// Depth first, children in definition order.
    pub fn subtree_joints(&self) -> Vec<&JointDefinition> {
        let mut joints = Vec::new();
        collect_joints(self, &mut joints);
        joints
    }
}

fn collect_joints<'a>(body: &'a RigidBodyDefinition, joints: &mut Vec<&'a JointDefinition>) {
    for joint in &body.children_joints {
        joints.push(joint);
        if let Some(successor) = &joint.successor {
            collect_joints(successor, joints);
        }
    }
}

pub mod collision;
pub mod joint;
pub mod rigid_body;
pub mod sensor;
pub mod tracker;

use joint::JointDefinition;
use rigid_body::RigidBodyDefinition;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DefinitionErrors {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    RonDeserialize(#[from] ron::error::SpannedError),
    #[error("{0}")]
    RonSerialize(#[from] ron::Error),
}

/// Immutable template a robot is instantiated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotDefinition {
    pub name: String,
    /// Fixed to the inertial frame.
    pub root_body: RigidBodyDefinition,
    /// Joints whose motion is prescribed by controllers instead of dynamics.
    pub joints_to_ignore: Vec<String>,
}

impl RobotDefinition {
    pub fn new(name: &str, root_body: RigidBodyDefinition) -> Self {
        Self {
            name: name.to_string(),
            root_body,
            joints_to_ignore: Vec::new(),
        }
    }

    pub fn with_joint_to_ignore(mut self, joint_name: &str) -> Self {
        self.joints_to_ignore.push(joint_name.to_string());
        self
    }

    /// Every joint of the tree, loop closures included, depth first.
    pub fn all_joints(&self) -> Vec<&JointDefinition> {
        self.root_body.subtree_joints()
    }

    pub fn joint_definition(&self, name: &str) -> Option<&JointDefinition> {
        self.all_joints().into_iter().find(|joint| joint.name == name)
    }

    pub fn rigid_body_definition(&self, name: &str) -> Option<&RigidBodyDefinition> {
        if self.root_body.name == name {
            return Some(&self.root_body);
        }
        self.all_joints()
            .into_iter()
            .filter_map(|joint| joint.successor.as_deref())
            .find(|body| body.name == name)
    }

    pub fn from_ron_str(s: &str) -> Result<Self, DefinitionErrors> {
        Ok(ron::from_str(s)?)
    }

    pub fn to_ron_string(&self) -> Result<String, DefinitionErrors> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    pub fn load(path: &Path) -> Result<Self, DefinitionErrors> {
        let s = std::fs::read_to_string(path)?;
        Self::from_ron_str(&s)
    }

    pub fn save(&self, path: &Path) -> Result<(), DefinitionErrors> {
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collision::CollisionShapeDefinition;
    use geometry::sphere::Sphere;
    use joint::{JointType, OneDoFJointParameters};
    use mass_properties::MassProperties;
    use nalgebra::Vector3;
    use tracker::GroundContactPointDefinition;
    use transforms::Transform;

    fn two_link() -> RobotDefinition {
        let foot = RigidBodyDefinition::new("foot", MassProperties::default())
            .with_collision_shape(CollisionShapeDefinition::new("ball", Sphere::new(0.05)));
        let ankle = JointDefinition::new(
            "ankle",
            JointType::Revolute(
                OneDoFJointParameters::new(Vector3::y()).with_position_limits(-0.5, 0.8),
            ),
        )
        .with_successor(foot)
        .with_ground_contact_point(GroundContactPointDefinition::new(
            "heel",
            Transform::from_translation(0.0, 0.0, -0.1),
        ));
        let shin = RigidBodyDefinition::new("shin", MassProperties::default())
            .with_child_joint(ankle);
        let floating = JointDefinition::new("floating", JointType::SixDoF).with_successor(shin);
        let root = RigidBodyDefinition::new("world", MassProperties::default())
            .with_child_joint(floating);
        RobotDefinition::new("walker", root)
    }

    #[test]
    fn test_all_joints_depth_first() {
        let robot = two_link();
        let names: Vec<&str> = robot.all_joints().iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["floating", "ankle"]);
        assert!(robot.rigid_body_definition("foot").is_some());
        assert!(robot.rigid_body_definition("hand").is_none());
    }

    #[test]
    fn test_ron_text_reloads_same_definition() {
        let robot = two_link();
        let text = robot.to_ron_string().unwrap();
        assert!(text.contains("heel"));
        assert_eq!(RobotDefinition::from_ron_str(&text).unwrap(), robot);
    }

    #[test]
    fn test_one_dof_defaults_are_unset() {
        let params = OneDoFJointParameters::default();
        assert!(params.position_lower_limit.is_infinite());
        assert!(params.kp_soft_limit_stop < 0.0);
        assert!(params.damping < 0.0);
    }
}

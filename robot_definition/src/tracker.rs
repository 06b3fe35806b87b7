use serde::{Deserialize, Serialize};
use transforms::Transform;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinematicPointDefinition {
    pub name: String,
    pub transform_to_parent: Transform,
}

impl KinematicPointDefinition {
    pub fn new(name: &str, transform_to_parent: Transform) -> Self {
        Self {
            name: name.to_string(),
            transform_to_parent,
        }
    }
}

/// A point where users or controllers may apply an external wrench.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalWrenchPointDefinition {
    pub name: String,
    pub transform_to_parent: Transform,
}

impl ExternalWrenchPointDefinition {
    pub fn new(name: &str, transform_to_parent: Transform) -> Self {
        Self {
            name: name.to_string(),
            transform_to_parent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundContactPointDefinition {
    pub name: String,
    pub transform_to_parent: Transform,
    pub group_identifier: i32,
}

impl GroundContactPointDefinition {
    pub fn new(name: &str, transform_to_parent: Transform) -> Self {
        Self {
            name: name.to_string(),
            transform_to_parent,
            group_identifier: 0,
        }
    }

    pub fn with_group_identifier(mut self, group_identifier: i32) -> Self {
        self.group_identifier = group_identifier;
        self
    }
}

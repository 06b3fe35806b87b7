use geometry::Shape;
use serde::{Deserialize, Serialize};
use transforms::Transform;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionShapeDefinition {
    pub name: String,
    /// Pose of the shape in its owner's frame.
    pub origin: Transform,
    pub shape: Shape,
}

impl CollisionShapeDefinition {
    pub fn new(name: &str, shape: impl Into<Shape>) -> Self {
        Self {
            name: name.to_string(),
            origin: Transform::identity(),
            shape: shape.into(),
        }
    }

    pub fn with_origin(mut self, origin: Transform) -> Self {
        self.origin = origin;
        self
    }
}

/// Static environment geometry, posed in the inertial frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainObjectDefinition {
    pub name: String,
    pub collision_shapes: Vec<CollisionShapeDefinition>,
}

impl TerrainObjectDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            collision_shapes: Vec::new(),
        }
    }

    pub fn with_collision_shape(mut self, shape: CollisionShapeDefinition) -> Self {
        self.collision_shapes.push(shape);
        self
    }

    /// A flat ground whose surface sits at `height`.
    pub fn flat_ground(name: &str, height: f64) -> Self {
        Self::new(name).with_collision_shape(
            CollisionShapeDefinition::new("ground", geometry::half_space::HalfSpace::new())
                .with_origin(Transform::from_translation(0.0, 0.0, height)),
        )
    }
}

use crate::body::BodyId;
use geometry::{Aabb, PointCollision, Shape};
use nalgebra::Vector3;
use robot_definition::collision::CollisionShapeDefinition;
use transforms::Transform;

/// A shape placed in the inertial frame with a cached bounding box.
///
/// Moving the shape marks the box dirty, it is recomputed by the next call to
/// `update_bounding_box`.
#[derive(Debug, Clone)]
pub struct Collidable {
    pub name: String,
    pub shape: Shape,
    /// Body carrying the shape, none for terrain.
    pub body: Option<BodyId>,
    /// Pose of the shape in its owner's frame.
    origin: Transform,
    pose: Transform,
    bounding_box: Aabb,
    dirty: bool,
}

impl Collidable {
    pub fn new(definition: &CollisionShapeDefinition, body: Option<BodyId>) -> Self {
        Self {
            name: definition.name.clone(),
            shape: definition.shape,
            body,
            origin: definition.origin,
            pose: definition.origin,
            bounding_box: Aabb::infinite(),
            dirty: true,
        }
    }

    pub fn pose(&self) -> &Transform {
        &self.pose
    }

    /// Places the shape on its owner, `owner_pose` being the owner's pose in
    /// the inertial frame.
    pub fn set_owner_pose(&mut self, owner_pose: &Transform) {
        let pose = *owner_pose * self.origin;
        if pose != self.pose {
            self.pose = pose;
            self.dirty = true;
        }
    }

    pub fn update_bounding_box(&mut self) -> &Aabb {
        if self.dirty {
            self.bounding_box = self.shape.bounding_box(&self.pose);
            self.dirty = false;
        }
        &self.bounding_box
    }

    pub fn bounding_box(&self) -> &Aabb {
        &self.bounding_box
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_point_inside(&self, point: &Vector3<f64>) -> bool {
        self.shape.is_point_inside_posed(&self.pose, point)
    }

    pub fn evaluate_point_collision(&self, point: &Vector3<f64>) -> PointCollision {
        self.shape.evaluate_point_collision_posed(&self.pose, point)
    }
}

pub mod capsule;
pub mod cuboid;
pub mod half_space;
pub mod sphere;

use capsule::Capsule;
use cuboid::Cuboid;
use half_space::HalfSpace;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use sphere::Sphere;
use transforms::Transform;

/// Axis aligned bounding box. Unbounded directions use infinite extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vector3<f64>,
    pub max: Vector3<f64>,
}

impl Aabb {
    pub fn new(min: Vector3<f64>, max: Vector3<f64>) -> Self {
        Self { min, max }
    }

    pub fn infinite() -> Self {
        Self::new(
            Vector3::repeat(f64::NEG_INFINITY),
            Vector3::repeat(f64::INFINITY),
        )
    }

    /// Smallest box holding every point.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vector3<f64>>) -> Self {
        let mut min = Vector3::repeat(f64::INFINITY);
        let mut max = Vector3::repeat(f64::NEG_INFINITY);
        for p in points {
            min = min.inf(p);
            max = max.sup(p);
        }
        Self { min, max }
    }

    /// Boundary points count as inside.
    pub fn is_inside_inclusive(&self, point: &Vector3<f64>) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }

    pub fn corners(&self) -> [Vector3<f64>; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vector3::new(a.x, a.y, a.z),
            Vector3::new(b.x, a.y, a.z),
            Vector3::new(a.x, b.y, a.z),
            Vector3::new(b.x, b.y, a.z),
            Vector3::new(a.x, a.y, b.z),
            Vector3::new(b.x, a.y, b.z),
            Vector3::new(a.x, b.y, b.z),
            Vector3::new(b.x, b.y, b.z),
        ]
    }
}

/// Result of a point query against a shape, both expressed in the query frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointCollision {
    pub closest_point: Vector3<f64>,
    /// Outward unit normal of the surface at `closest_point`.
    pub normal: Vector3<f64>,
}

pub trait ShapeTrait {
    /// Points on the surface count as inside.
    fn is_point_inside(&self, point: &Vector3<f64>) -> bool;
    /// Closest surface point and outward normal, for points inside or outside.
    fn evaluate_point_collision(&self, point: &Vector3<f64>) -> PointCollision;
    /// Bounds in the shape frame.
    fn local_bounds(&self) -> Aabb;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Capsule(Capsule),
    Cuboid(Cuboid),
    HalfSpace(HalfSpace),
    Sphere(Sphere),
}

impl ShapeTrait for Shape {
    fn is_point_inside(&self, point: &Vector3<f64>) -> bool {
        match self {
            Shape::Capsule(shape) => shape.is_point_inside(point),
            Shape::Cuboid(shape) => shape.is_point_inside(point),
            Shape::HalfSpace(shape) => shape.is_point_inside(point),
            Shape::Sphere(shape) => shape.is_point_inside(point),
        }
    }

    fn evaluate_point_collision(&self, point: &Vector3<f64>) -> PointCollision {
        match self {
            Shape::Capsule(shape) => shape.evaluate_point_collision(point),
            Shape::Cuboid(shape) => shape.evaluate_point_collision(point),
            Shape::HalfSpace(shape) => shape.evaluate_point_collision(point),
            Shape::Sphere(shape) => shape.evaluate_point_collision(point),
        }
    }

    fn local_bounds(&self) -> Aabb {
        match self {
            Shape::Capsule(shape) => shape.local_bounds(),
            Shape::Cuboid(shape) => shape.local_bounds(),
            Shape::HalfSpace(shape) => shape.local_bounds(),
            Shape::Sphere(shape) => shape.local_bounds(),
        }
    }
}

impl Shape {
    /// Point containment for a point given in the frame the shape is posed in.
    pub fn is_point_inside_posed(&self, pose: &Transform, point: &Vector3<f64>) -> bool {
        self.is_point_inside(&pose.inverse_transform_point(point))
    }

    /// Point query for a point given in the frame the shape is posed in.
    pub fn evaluate_point_collision_posed(
        &self,
        pose: &Transform,
        point: &Vector3<f64>,
    ) -> PointCollision {
        let local = self.evaluate_point_collision(&pose.inverse_transform_point(point));
        PointCollision {
            closest_point: pose.transform_point(&local.closest_point),
            normal: pose.transform_vector(&local.normal),
        }
    }

    /// Axis aligned bounds of the shape placed at `pose`.
    pub fn bounding_box(&self, pose: &Transform) -> Aabb {
        match self {
            Shape::HalfSpace(shape) => shape.bounding_box(pose),
            _ => {
                let corners = self.local_bounds().corners();
                let world: Vec<Vector3<f64>> =
                    corners.iter().map(|c| pose.transform_point(c)).collect();
                Aabb::from_points(world.iter())
            }
        }
    }
}

impl From<Capsule> for Shape {
    fn from(value: Capsule) -> Self {
        Shape::Capsule(value)
    }
}
impl From<Cuboid> for Shape {
    fn from(value: Cuboid) -> Self {
        Shape::Cuboid(value)
    }
}
impl From<HalfSpace> for Shape {
    fn from(value: HalfSpace) -> Self {
        Shape::HalfSpace(value)
    }
}
impl From<Sphere> for Shape {
    fn from(value: Sphere) -> Self {
        Shape::Sphere(value)
    }
}

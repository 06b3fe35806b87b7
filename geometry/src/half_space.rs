use crate::{Aabb, PointCollision, ShapeTrait};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use transforms::Transform;

/// Everything on or below the frame's z = 0 plane, the surface normal is +z.
/// Used for flat ground.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HalfSpace;

impl HalfSpace {
    pub fn new() -> Self {
        Self
    }

    pub fn bounding_box(&self, pose: &Transform) -> Aabb {
        let normal = pose.transform_vector(&Vector3::z());
        let mut aabb = Aabb::infinite();
        // only a surface facing straight up or down gives a finite bound
        if (normal.z.abs() - 1.0).abs() < 1e-12 {
            if normal.z > 0.0 {
                aabb.max.z = pose.translation.z;
            } else {
                aabb.min.z = pose.translation.z;
            }
        }
        aabb
    }
}

impl ShapeTrait for HalfSpace {
    fn is_point_inside(&self, point: &Vector3<f64>) -> bool {
        point.z <= 0.0
    }

    fn evaluate_point_collision(&self, point: &Vector3<f64>) -> PointCollision {
        PointCollision {
            closest_point: Vector3::new(point.x, point.y, 0.0),
            normal: Vector3::z(),
        }
    }

    fn local_bounds(&self) -> Aabb {
        let mut aabb = Aabb::infinite();
        aabb.max.z = 0.0;
        aabb
    }
}

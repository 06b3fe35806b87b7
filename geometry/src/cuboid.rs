use crate::{Aabb, PointCollision, ShapeTrait};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Box centered on its frame with full side lengths `x`, `y`, `z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cuboid {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Cuboid {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn half_extents(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z) * 0.5
    }
}

impl ShapeTrait for Cuboid {
    fn is_point_inside(&self, point: &Vector3<f64>) -> bool {
        let half = self.half_extents();
        (0..3).all(|i| point[i].abs() <= half[i])
    }

    fn evaluate_point_collision(&self, point: &Vector3<f64>) -> PointCollision {
        let half = self.half_extents();
        if self.is_point_inside(point) {
            // push out through the nearest face
            let mut axis = 0;
            let mut depth = f64::INFINITY;
            for i in 0..3 {
                let d = half[i] - point[i].abs();
                if d < depth {
                    depth = d;
                    axis = i;
                }
            }
            let sign = if point[axis] >= 0.0 { 1.0 } else { -1.0 };
            let mut normal = Vector3::zeros();
            normal[axis] = sign;
            let mut closest_point = *point;
            closest_point[axis] = sign * half[axis];
            return PointCollision {
                closest_point,
                normal,
            };
        }
        let closest_point = point.sup(&(-half)).inf(&half);
        let normal = (point - closest_point).normalize();
        PointCollision {
            closest_point,
            normal,
        }
    }

    fn local_bounds(&self) -> Aabb {
        let half = self.half_extents();
        Aabb::new(-half, half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_cuboid_inside() {
        let cuboid = Cuboid::new(1.0, 2.0, 4.0);
        assert!(cuboid.is_point_inside(&Vector3::new(0.5, -1.0, 1.9)));
        assert!(!cuboid.is_point_inside(&Vector3::new(0.51, 0.0, 0.0)));
    }

    #[test]
    fn test_cuboid_inside_point_exits_nearest_face() {
        let cuboid = Cuboid::new(1.0, 2.0, 4.0);
        let collision = cuboid.evaluate_point_collision(&Vector3::new(0.1, 0.2, -1.95));
        assert_abs_diff_eq!(collision.normal, Vector3::new(0.0, 0.0, -1.0));
        assert_abs_diff_eq!(collision.closest_point, Vector3::new(0.1, 0.2, -2.0));
    }

    #[test]
    fn test_cuboid_outside_point_clamps() {
        let cuboid = Cuboid::new(2.0, 2.0, 2.0);
        let collision = cuboid.evaluate_point_collision(&Vector3::new(2.0, 0.5, 0.0));
        assert_abs_diff_eq!(collision.closest_point, Vector3::new(1.0, 0.5, 0.0));
        assert_abs_diff_eq!(collision.normal, Vector3::new(1.0, 0.0, 0.0));
    }
}

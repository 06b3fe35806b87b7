use crate::{Aabb, PointCollision, ShapeTrait};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub radius: f64,
}

impl Sphere {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }
}

impl ShapeTrait for Sphere {
    fn is_point_inside(&self, point: &Vector3<f64>) -> bool {
        point.norm_squared() <= self.radius * self.radius
    }

    fn evaluate_point_collision(&self, point: &Vector3<f64>) -> PointCollision {
        // the center has no preferred direction, pick +z
        let normal = point.try_normalize(1e-12).unwrap_or_else(Vector3::z);
        PointCollision {
            closest_point: normal * self.radius,
            normal,
        }
    }

    fn local_bounds(&self) -> Aabb {
        Aabb::new(
            Vector3::repeat(-self.radius),
            Vector3::repeat(self.radius),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_sphere_point_collision() {
        let sphere = Sphere::new(2.0);
        assert!(sphere.is_point_inside(&Vector3::new(0.0, 2.0, 0.0)));
        let collision = sphere.evaluate_point_collision(&Vector3::new(0.0, 0.0, -0.5));
        assert_abs_diff_eq!(collision.normal, Vector3::new(0.0, 0.0, -1.0));
        assert_abs_diff_eq!(collision.closest_point, Vector3::new(0.0, 0.0, -2.0));
    }
}

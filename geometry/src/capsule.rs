use crate::{Aabb, PointCollision, ShapeTrait};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Segment along the frame z axis of length `length`, swept by `radius`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    pub radius: f64,
    pub length: f64,
}

impl Capsule {
    pub fn new(radius: f64, length: f64) -> Self {
        Self { radius, length }
    }

    fn closest_on_axis(&self, point: &Vector3<f64>) -> Vector3<f64> {
        let half = 0.5 * self.length;
        Vector3::new(0.0, 0.0, point.z.clamp(-half, half))
    }
}

impl ShapeTrait for Capsule {
    fn is_point_inside(&self, point: &Vector3<f64>) -> bool {
        (point - self.closest_on_axis(point)).norm_squared() <= self.radius * self.radius
    }

    fn evaluate_point_collision(&self, point: &Vector3<f64>) -> PointCollision {
        let on_axis = self.closest_on_axis(point);
        let normal = (point - on_axis)
            .try_normalize(1e-12)
            .unwrap_or_else(Vector3::x);
        PointCollision {
            closest_point: on_axis + normal * self.radius,
            normal,
        }
    }

    fn local_bounds(&self) -> Aabb {
        let r = self.radius;
        let h = 0.5 * self.length + r;
        Aabb::new(Vector3::new(-r, -r, -h), Vector3::new(r, r, h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_capsule_end_cap() {
        let capsule = Capsule::new(0.1, 1.0);
        assert!(capsule.is_point_inside(&Vector3::new(0.0, 0.0, 0.59)));
        assert!(!capsule.is_point_inside(&Vector3::new(0.0, 0.0, 0.61)));
        let collision = capsule.evaluate_point_collision(&Vector3::new(0.05, 0.0, 0.2));
        assert_abs_diff_eq!(collision.normal, Vector3::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(collision.closest_point, Vector3::new(0.1, 0.0, 0.2));
    }
}

pub mod parameters;

use crate::{
    auxiliary::{ground_contact_point::GroundContactPoint, SimJointAuxiliaryData},
    collidable::Collidable,
    joint::JointId,
};
use nalgebra::Vector3;
use parameters::ContactParameters;
use spatial_algebra::Force;

/// Smallest distance left before the stiffening length, the normal spring
/// saturates below it.
const MIN_STIFFENING_GAP: f64 = 0.002;
/// Fraction of the touchdown distance the touchdown point follows a slipping
/// contact each tick.
const SLIP_TOUCHDOWN_DRAG: f64 = 0.05;

/// Orthonormal pair spanning the plane normal to `normal`.
pub fn in_plane_basis(normal: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let mut reference = Vector3::y();
    if (1.0 - reference.dot(normal).abs()).abs() < 1e-12 {
        reference = Vector3::x();
    }
    let v1 = reference.cross(normal).normalize();
    let v2 = normal.cross(&v1).normalize();
    (v1, v2)
}

/// Normal spring force for a penetration `depth` along the contact normal.
pub fn normal_spring_force(parameters: &ContactParameters, depth: f64) -> f64 {
    let gap = (parameters.stiffening_length - depth).max(MIN_STIFFENING_GAP);
    parameters.kz * depth / gap
}

/// Tangential over normal force magnitude.
pub fn force_ratio(parallel: f64, normal: f64) -> f64 {
    if normal == 0.0 {
        if parallel == 0.0 {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        parallel / normal
    }
}

/// Whether a contact slips given its force ratio and whether it was slipping.
pub fn stick_slip_state(ratio: f64, was_slipping: bool, parameters: &ContactParameters) -> bool {
    parameters.enable_slip
        && (ratio > parameters.alpha_stick || (was_slipping && ratio > parameters.alpha_slip))
}

/// Spring-damper response of a point in contact, inertial frame. `None`
/// means the surface would pull on a point leaving it.
fn spring_damper_force(
    parameters: &ContactParameters,
    gcp: &GroundContactPoint,
) -> Option<Vector3<f64>> {
    let normal = gcp.contact_normal;
    let delta = gcp.touchdown.translation - gcp.point.position();
    let velocity = gcp.point.linear_velocity_world();
    let (v1, v2) = in_plane_basis(&normal);

    let mut force_parallel = (v1 * v1.dot(&delta) + v2 * v2.dot(&delta)) * parameters.kxy;
    let mut force_normal = normal * normal_spring_force(parameters, normal.dot(&delta));

    force_parallel -= (v1 * v1.dot(&velocity) + v2 * v2.dot(&velocity)) * parameters.bxy;
    let normal_velocity = normal.dot(&velocity);
    force_normal -= normal * (parameters.bz * normal_velocity);

    if force_normal.dot(&normal) < 0.0 {
        if normal_velocity > 0.0 {
            return None;
        }
        force_normal = Vector3::zeros();
    }
    Some(force_parallel + force_normal)
}

/// Resolves ground contact points against static shapes with a
/// spring-damper model and stick-slip friction.
#[derive(Debug, Clone, Default)]
pub struct ContactPointBasedForceCalculator {
    parameters: ContactParameters,
    reported_multiple_collisions: bool,
}

impl ContactPointBasedForceCalculator {
    pub fn new(parameters: ContactParameters) -> Self {
        Self {
            parameters,
            reported_multiple_collisions: false,
        }
    }

    pub fn parameters(&self) -> &ContactParameters {
        &self.parameters
    }

    pub fn set_parameters(&mut self, parameters: ContactParameters) {
        self.parameters = parameters;
    }

    /// Releases every contact point of the considered joints.
    pub fn reset(&mut self, joints: &[JointId], auxiliary: &mut [SimJointAuxiliaryData]) {
        for joint in joints {
            for gcp in &mut auxiliary[joint.0].ground_contact_points {
                gcp.clear_contact();
            }
        }
    }

    pub fn resolve_contact_forces(
        &mut self,
        joints: &[JointId],
        auxiliary: &mut [SimJointAuxiliaryData],
        collidables: &[Collidable],
    ) {
        for joint in joints {
            for gcp in &mut auxiliary[joint.0].ground_contact_points {
                self.resolve_point(gcp, collidables);
            }
        }
    }

    pub fn resolve_point(&mut self, gcp: &mut GroundContactPoint, collidables: &[Collidable]) {
        let position = gcp.point.position();
        let mut active = collidables.iter().filter(|collidable| {
            collidable.bounding_box().is_inside_inclusive(&position)
                && collidable.is_point_inside(&position)
        });

        let Some(collidable) = active.next() else {
            gcp.clear_contact();
            return;
        };
        if active.next().is_some() && !self.reported_multiple_collisions {
            log::error!(
                "contact point '{}' is inside more than one collidable, only '{}' is used (reported once)",
                gcp.name(),
                collidable.name
            );
            self.reported_multiple_collisions = true;
        }

        let collision = collidable.evaluate_point_collision(&position);
        if !gcp.in_contact {
            gcp.in_contact = true;
            gcp.touchdown = gcp.point.pose;
            gcp.contact_normal = collision.normal;
        }

        let Some(mut force) = spring_damper_force(&self.parameters, gcp) else {
            gcp.clear_contact();
            return;
        };

        let normal = gcp.contact_normal;
        let force_normal = normal * normal.dot(&force);
        let mut force_parallel = force - force_normal;
        let parallel_magnitude = force_parallel.norm();
        let normal_magnitude = force_normal.norm();
        let ratio = force_ratio(parallel_magnitude, normal_magnitude);

        gcp.is_slipping = stick_slip_state(ratio, gcp.is_slipping, &self.parameters);
        if gcp.is_slipping {
            let scale = self.parameters.alpha_slip * normal_magnitude / parallel_magnitude;
            if scale < 1.0 {
                force_parallel *= scale;
            }
            force = force_normal + force_parallel;

            let length = force_parallel.norm();
            if length > 1e-7 {
                let distance = (position - gcp.touchdown.translation).norm();
                gcp.touchdown.translation -= force_parallel * (SLIP_TOUCHDOWN_DRAG * distance / length);
            }
            gcp.contact_normal = collision.normal;
        }

        gcp.wrench = Force::new(
            Vector3::zeros(),
            gcp.point.pose.inverse_transform_vector(&force),
        );
    }
}

use super::{Controller, ControllerErrors, ControllerInput, ControllerOutput};
use crate::body::BodyId;
use nalgebra::{Matrix3, Vector3, Vector6};
use robot_definition::joint::{JointDefinition, JointType};
use spatial_algebra::Force;
use transforms::Transform;

/// Directions, in the closing joint's frame, along which the constraint
/// pushes back as `(forces, moments)`. None when the joint kind cannot close
/// a loop.
pub fn constraint_subspaces(joint_type: &JointType) -> Option<(Matrix3<f64>, Matrix3<f64>)> {
    let all = Matrix3::identity();
    let orthogonal_to = |axis: &Vector3<f64>| {
        let a = axis.try_normalize(1e-12)?;
        Some(all - a * a.transpose())
    };
    match joint_type {
        JointType::Fixed => Some((all, all)),
        JointType::Revolute(p) => Some((all, orthogonal_to(&p.axis)?)),
        JointType::Prismatic(p) => Some((orthogonal_to(&p.axis)?, all)),
        JointType::Spherical => Some((all, Matrix3::zeros())),
        _ => None,
    }
}

/// Replaces a joint that would close a kinematic loop.
///
/// A frame on the predecessor body and a frame on the successor body should
/// coincide up to the motion the closing joint allows. Their pose and
/// velocity mismatch drive a PD wrench applied to the successor and,
/// opposite, to the predecessor.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopClosureSoftConstraintController {
    name: String,
    predecessor: BodyId,
    successor: BodyId,
    /// Closing joint frame in the predecessor body frame.
    transform_to_parent: Transform,
    /// Closing joint frame in the successor body frame.
    transform_to_successor_parent: Transform,
    force_subspace: Matrix3<f64>,
    moment_subspace: Matrix3<f64>,
    /// Angular gains first.
    kp: Vector6<f64>,
    kd: Vector6<f64>,
}

impl LoopClosureSoftConstraintController {
    pub fn new(
        name: &str,
        predecessor: BodyId,
        successor: BodyId,
        transform_to_parent: Transform,
        transform_to_successor_parent: Transform,
        force_subspace: Matrix3<f64>,
        moment_subspace: Matrix3<f64>,
    ) -> Self {
        Self {
            name: name.to_string(),
            predecessor,
            successor,
            transform_to_parent,
            transform_to_successor_parent,
            force_subspace,
            moment_subspace,
            kp: Vector6::zeros(),
            kd: Vector6::zeros(),
        }
    }

    /// None unless the joint is a loop closure of a kind with constraint sub-spaces.
    pub fn from_definition(
        joint: &JointDefinition,
        predecessor: BodyId,
        successor: BodyId,
    ) -> Option<Self> {
        let loop_closure = joint.loop_closure.as_ref()?;
        let (force_subspace, moment_subspace) = constraint_subspaces(&joint.joint_type)?;
        Some(
            Self::new(
                &joint.name,
                predecessor,
                successor,
                joint.transform_to_parent,
                loop_closure.transform_to_successor_parent,
                force_subspace,
                moment_subspace,
            )
            .with_gains(
                loop_closure.kp_soft_constraint,
                loop_closure.kd_soft_constraint,
            ),
        )
    }

    pub fn with_gains(mut self, kp: Vector6<f64>, kd: Vector6<f64>) -> Self {
        self.kp = kp;
        self.kd = kd;
        self
    }

    pub fn predecessor(&self) -> BodyId {
        self.predecessor
    }

    pub fn successor(&self) -> BodyId {
        self.successor
    }

    /// Force and moment acting on the successor at the origin of its
    /// closing frame, in the inertial frame.
    pub fn constraint_wrench(&self, input: &ControllerInput) -> (Vector3<f64>, Vector3<f64>) {
        let predecessor = input.system.body(self.predecessor);
        let successor = input.system.body(self.successor);
        let frame_a = predecessor.pose * self.transform_to_parent;
        let frame_b = successor.pose * self.transform_to_successor_parent;

        let position_error = frame_a.inverse_transform_vector(&(frame_b.translation - frame_a.translation));
        let rotation_error = (frame_a.rotation.inverse() * frame_b.rotation).scaled_axis();

        let point = frame_b.translation;
        let velocity_b = successor.pose.transform_vector(
            &successor
                .twist
                .linear_velocity_at(&successor.pose.inverse_transform_point(&point)),
        );
        let velocity_a = predecessor.pose.transform_vector(
            &predecessor
                .twist
                .linear_velocity_at(&predecessor.pose.inverse_transform_point(&point)),
        );
        let omega_b = successor.pose.transform_vector(&successor.twist.rotation());
        let omega_a = predecessor.pose.transform_vector(&predecessor.twist.rotation());
        let velocity_error = frame_a.inverse_transform_vector(&(velocity_b - velocity_a));
        let omega_error = frame_a.inverse_transform_vector(&(omega_b - omega_a));

        let kp_angular = self.kp.fixed_rows::<3>(0);
        let kp_linear = self.kp.fixed_rows::<3>(3);
        let kd_angular = self.kd.fixed_rows::<3>(0);
        let kd_linear = self.kd.fixed_rows::<3>(3);

        let force = -self.force_subspace
            * (kp_linear.component_mul(&position_error) + kd_linear.component_mul(&velocity_error));
        let moment = -self.moment_subspace
            * (kp_angular.component_mul(&rotation_error) + kd_angular.component_mul(&omega_error));

        (
            frame_a.transform_vector(&force),
            frame_a.transform_vector(&moment),
        )
    }
}

impl Controller for LoopClosureSoftConstraintController {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(
        &mut self,
        input: &ControllerInput,
        output: &mut ControllerOutput,
    ) -> Result<(), ControllerErrors> {
        let (force, moment) = self.constraint_wrench(input);
        if !(force.iter().all(|f| f.is_finite()) && moment.iter().all(|m| m.is_finite())) {
            return Err(ControllerErrors::Failed {
                controller: self.name.clone(),
                message: "constraint wrench is not finite".to_string(),
            });
        }
        let point = (input.system.body(self.successor).pose * self.transform_to_successor_parent)
            .translation;
        let on_successor = wrench_in_body(&input.system.body(self.successor).pose, &point, &force, &moment);
        let on_predecessor =
            wrench_in_body(&input.system.body(self.predecessor).pose, &point, &-force, &-moment);
        output.add_body_wrench(self.successor, on_successor);
        output.add_body_wrench(self.predecessor, on_predecessor);
        Ok(())
    }
}

/// Expresses a force and moment acting at a world point in a body frame.
fn wrench_in_body(
    body_pose: &Transform,
    point: &Vector3<f64>,
    force: &Vector3<f64>,
    moment: &Vector3<f64>,
) -> Force {
    let point = body_pose.inverse_transform_point(point);
    let force = body_pose.inverse_transform_vector(force);
    let moment = body_pose.inverse_transform_vector(moment);
    Force::from_force_at_point(force, &point) + Force::new(moment, Vector3::zeros())
}

use super::{DynamicsErrors, ForwardDynamics};
use crate::{body::BodyId, joint::JointId, system::MultiBodySystem};
use nalgebra::{DMatrix, DVector, Matrix6, Matrix6xX, Vector3};
use spatial_algebra::{Acceleration, Force, SpatialTransform};

#[derive(Clone, Debug)]
struct AbaCache {
    x: SpatialTransform,
    s: Matrix6xX<f64>,
    c: Acceleration,
    u_big: Matrix6xX<f64>, // U = IA S
    d_inv: DMatrix<f64>,
    u: DVector<f64>,
    prescribed: bool,
}

impl Default for AbaCache {
    fn default() -> Self {
        Self {
            x: SpatialTransform::identity(),
            s: Matrix6xX::zeros(0),
            c: Acceleration::zeros(),
            u_big: Matrix6xX::zeros(0),
            d_inv: DMatrix::zeros(0, 0),
            u: DVector::zeros(0),
            prescribed: true,
        }
    }
}

/// Featherstone's articulated body algorithm over the arena.
///
/// The root body is fixed to the robot's root frame and accelerates at `-g`
/// so gravity needs no body forces. Ignored joints and joints without degrees
/// of freedom are treated as prescribed motion with the acceleration already
/// in their state.
#[derive(Clone, Debug, Default)]
pub struct ArticulatedBodyCalculator {
    external_wrenches: Vec<Force>,
    body_accelerations: Vec<Acceleration>,
    joint_accelerations: Vec<DVector<f64>>,
    inertia_articulated: Vec<Matrix6<f64>>,
    p_big_a: Vec<Force>, //bias force pA
    cache: Vec<AbaCache>,
}

impl ArticulatedBodyCalculator {
    pub fn new(system: &MultiBodySystem) -> Self {
        let mut calculator = Self::default();
        calculator.reset(system);
        calculator
    }

    fn first_pass(&mut self, system: &MultiBodySystem) {
        for (i, body) in system.bodies.iter().enumerate() {
            let inertia = body.inertia;
            self.inertia_articulated[i] = inertia.matrix();
            self.p_big_a[i] =
                body.twist.cross_force(inertia * body.twist) - self.external_wrenches[i];
        }
        for (j, joint) in system.joints.iter().enumerate() {
            let v = system.body(joint.successor).twist;
            let cache = &mut self.cache[j];
            cache.x = joint.successor_from_predecessor();
            cache.s = joint.motion_subspace();
            cache.c = v.cross_motion(joint.joint_twist());
            cache.prescribed = joint.ndof() == 0 || system.is_ignored(JointId(j));
        }
    }

    fn second_pass(&mut self, system: &MultiBodySystem) -> Result<(), DynamicsErrors> {
        for (j, joint) in system.joints.iter().enumerate().rev() {
            let i = joint.successor.0;
            let parent = joint.predecessor.0;
            let ia = self.inertia_articulated[i];
            let pa_big = self.p_big_a[i];
            let cache = &mut self.cache[j];

            let (ia_lil, pa_lil) = if cache.prescribed {
                let a = cache.c.vector() + &cache.s * &joint.state.qdd;
                (ia, pa_big + Force::from(ia * a))
            } else {
                let u_big = ia * &cache.s;
                let d = cache.s.transpose() * &u_big;
                let d_inv = d
                    .try_inverse()
                    .ok_or_else(|| DynamicsErrors::SingularArticulatedInertia(joint.name.clone()))?;
                let u = &joint.state.tau - cache.s.transpose() * pa_big.vector();
                let ia_lil = ia - &u_big * &d_inv * u_big.transpose();
                let pa_lil = pa_big
                    + Force::from(ia_lil * cache.c.vector())
                    + Force::from(&u_big * &d_inv * &u);
                cache.u_big = u_big;
                cache.d_inv = d_inv;
                cache.u = u;
                (ia_lil, pa_lil)
            };

            let x = cache.x;
            self.inertia_articulated[parent] += x.inertia_to_parent(&ia_lil);
            self.p_big_a[parent] += x.inv() * pa_lil;
        }
        Ok(())
    }

    fn third_pass(&mut self, system: &MultiBodySystem, gravity: &Vector3<f64>) {
        self.body_accelerations[0] =
            Acceleration::new(Vector3::zeros(), system.root_pose.inverse_transform_vector(&-gravity));
        for (j, joint) in system.joints.iter().enumerate() {
            let cache = &self.cache[j];
            let a_parent = self.body_accelerations[joint.predecessor.0];
            let a_prime = cache.x * a_parent + cache.c;
            let qdd = if cache.prescribed {
                joint.state.qdd.clone()
            } else {
                &cache.d_inv * (&cache.u - cache.u_big.transpose() * a_prime.vector())
            };
            let a = a_prime + Acceleration::from(&cache.s * &qdd);
            self.body_accelerations[joint.successor.0] = a;
            self.joint_accelerations[j] = qdd;
        }
    }
}

impl ForwardDynamics for ArticulatedBodyCalculator {
    fn reset(&mut self, system: &MultiBodySystem) {
        let n_bodies = system.bodies.len();
        self.external_wrenches = vec![Force::zeros(); n_bodies];
        self.body_accelerations = vec![Acceleration::zeros(); n_bodies];
        self.inertia_articulated = vec![Matrix6::zeros(); n_bodies];
        self.p_big_a = vec![Force::zeros(); n_bodies];
        self.joint_accelerations = system
            .joints
            .iter()
            .map(|joint| DVector::zeros(joint.ndof()))
            .collect();
        self.cache = vec![AbaCache::default(); system.joints.len()];
    }

    fn external_wrench_mut(&mut self, body: BodyId) -> &mut Force {
        &mut self.external_wrenches[body.0]
    }

    fn external_wrenches(&self) -> &[Force] {
        &self.external_wrenches
    }

    fn compute(
        &mut self,
        system: &MultiBodySystem,
        gravity: &Vector3<f64>,
    ) -> Result<(), DynamicsErrors> {
        self.first_pass(system);
        self.second_pass(system)?;
        self.third_pass(system, gravity);
        Ok(())
    }

    fn body_accelerations(&self) -> &[Acceleration] {
        &self.body_accelerations
    }

    fn joint_acceleration(&self, joint: JointId) -> &DVector<f64> {
        &self.joint_accelerations[joint.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        body::SimRigidBody,
        joint::{JointModels, SimJoint},
    };
    use approx::assert_abs_diff_eq;
    use mass_properties::{CenterOfMass, Inertia, MassProperties};
    use robot_definition::joint::{JointType, OneDoFJointParameters};
    use spatial_algebra::SpatialInertia;
    use transforms::Transform;

    const G: f64 = 9.81;

    fn link(mass: f64, com: Vector3<f64>, iyy: f64) -> SpatialInertia {
        SpatialInertia(
            MassProperties::new(
                mass,
                CenterOfMass::from(com),
                Inertia::diagonal(iyy, iyy, iyy).unwrap(),
            )
            .unwrap(),
        )
    }

    fn pendulum(q: f64) -> MultiBodySystem {
        let world = SimRigidBody::new("world", SpatialInertia::default(), None);
        let mut system = MultiBodySystem::new(world, Transform::identity());
        let model = JointModels::from_definition(
            "pivot",
            &JointType::Revolute(OneDoFJointParameters::new(Vector3::y())),
        )
        .unwrap();
        let mut joint = SimJoint::new("pivot", model, BodyId(0), BodyId(1), Transform::identity());
        joint.state.q[0] = q;
        let body = SimRigidBody::new("link", link(1.0, Vector3::new(0.5, 0.0, 0.0), 0.01), None);
        system.push_joint(joint, body);
        system.update_frames();
        system
    }

    #[test]
    fn test_pendulum_angular_acceleration() {
        let system = pendulum(0.0);
        let mut aba = ArticulatedBodyCalculator::new(&system);
        aba.compute(&system, &Vector3::new(0.0, 0.0, -G)).unwrap();
        // gravity on a horizontal link about +y: moment m g L, rotation toward -z is +y
        let expected = 1.0 * G * 0.5 / (0.01 + 1.0 * 0.25);
        assert_abs_diff_eq!(aba.joint_acceleration(JointId(0))[0], expected, epsilon = 1e-9);
    }

    #[test]
    fn test_hanging_pendulum_is_at_rest() {
        let system = pendulum(std::f64::consts::FRAC_PI_2);
        let mut aba = ArticulatedBodyCalculator::new(&system);
        aba.compute(&system, &Vector3::new(0.0, 0.0, -G)).unwrap();
        assert_abs_diff_eq!(aba.joint_acceleration(JointId(0))[0], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_floating_body_free_falls() {
        let world = SimRigidBody::new("world", SpatialInertia::default(), None);
        let mut system = MultiBodySystem::new(world, Transform::identity());
        let model = JointModels::from_definition("floating", &JointType::SixDoF).unwrap();
        let joint = SimJoint::new("floating", model, BodyId(0), BodyId(1), Transform::identity());
        let body = SimRigidBody::new("box", link(2.0, Vector3::new(0.1, 0.0, 0.0), 0.1), None);
        system.push_joint(joint, body);
        system.update_frames();

        let mut aba = ArticulatedBodyCalculator::new(&system);
        aba.compute(&system, &Vector3::new(0.0, 0.0, -G)).unwrap();
        let qdd = aba.joint_acceleration(JointId(0));
        assert_abs_diff_eq!(qdd[0], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(qdd[1], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(qdd[2], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(qdd[5], -G, epsilon = 1e-9);
        // the body sees no proper acceleration
        assert_abs_diff_eq!(aba.body_accelerations()[1].translation(), Vector3::zeros(), epsilon = 1e-9);
    }

    #[test]
    fn test_external_wrench_supports_body() {
        let world = SimRigidBody::new("world", SpatialInertia::default(), None);
        let mut system = MultiBodySystem::new(world, Transform::identity());
        let model = JointModels::from_definition("floating", &JointType::SixDoF).unwrap();
        let joint = SimJoint::new("floating", model, BodyId(0), BodyId(1), Transform::identity());
        let body = SimRigidBody::new("box", link(2.0, Vector3::zeros(), 0.1), None);
        system.push_joint(joint, body);
        system.update_frames();

        let mut aba = ArticulatedBodyCalculator::new(&system);
        *aba.external_wrench_mut(BodyId(1)) =
            Force::new(Vector3::zeros(), Vector3::new(0.0, 0.0, 2.0 * G));
        aba.compute(&system, &Vector3::new(0.0, 0.0, -G)).unwrap();
        let qdd = aba.joint_acceleration(JointId(0));
        assert_abs_diff_eq!(qdd.norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ignored_joint_uses_given_acceleration() {
        let mut system = pendulum(0.0);
        system.ignore_joint(JointId(0));
        system.joint_mut(JointId(0)).state.qdd[0] = 3.0;
        let mut aba = ArticulatedBodyCalculator::new(&system);
        aba.compute(&system, &Vector3::new(0.0, 0.0, -G)).unwrap();
        assert_eq!(aba.joint_acceleration(JointId(0))[0], 3.0);
    }
}

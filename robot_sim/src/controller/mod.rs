pub mod loop_closure;

use crate::{
    auxiliary::SimJointAuxiliaryData,
    body::BodyId,
    joint::{joint_state::JointStateType, JointId},
    system::MultiBodySystem,
};
use nalgebra::DVector;
use spatial_algebra::Force;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerErrors {
    #[error("controller '{controller}' failed: {message}")]
    Failed { controller: String, message: String },
    #[error("desired {state_type:?} of joint '{joint}' has {got} entries, expected {expected}")]
    OutputSize {
        joint: String,
        state_type: JointStateType,
        got: usize,
        expected: usize,
    },
    #[error("throttle period must be positive, got {0}")]
    InvalidPeriod(f64),
}

/// Read-only view of a robot handed to its controllers.
#[derive(Clone, Copy)]
pub struct ControllerInput<'a> {
    pub time: f64,
    pub system: &'a MultiBodySystem,
    /// Indexed like the joints of `system`.
    pub auxiliary: &'a [SimJointAuxiliaryData],
}

/// Per-joint desired state. Only the entries a controller set are written back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointDesiredOutput {
    pub configuration: Option<DVector<f64>>,
    pub velocity: Option<DVector<f64>>,
    pub acceleration: Option<DVector<f64>>,
    pub effort: Option<DVector<f64>>,
}

impl JointDesiredOutput {
    pub fn get(&self, state_type: JointStateType) -> Option<&DVector<f64>> {
        match state_type {
            JointStateType::Configuration => self.configuration.as_ref(),
            JointStateType::Velocity => self.velocity.as_ref(),
            JointStateType::Acceleration => self.acceleration.as_ref(),
            JointStateType::Effort => self.effort.as_ref(),
        }
    }

    pub fn set(&mut self, state_type: JointStateType, value: DVector<f64>) {
        let slot = match state_type {
            JointStateType::Configuration => &mut self.configuration,
            JointStateType::Velocity => &mut self.velocity,
            JointStateType::Acceleration => &mut self.acceleration,
            JointStateType::Effort => &mut self.effort,
        };
        *slot = Some(value);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// What controllers ask of the robot: desired joint states and wrenches on
/// bodies, each wrench expressed in its body frame.
#[derive(Debug, Clone, Default)]
pub struct ControllerOutput {
    joint_outputs: Vec<JointDesiredOutput>,
    body_wrenches: Vec<Force>,
}

impl ControllerOutput {
    pub fn new(system: &MultiBodySystem) -> Self {
        Self {
            joint_outputs: vec![JointDesiredOutput::default(); system.joints.len()],
            body_wrenches: vec![Force::zeros(); system.bodies.len()],
        }
    }

    pub fn joint_output(&self, joint: JointId) -> &JointDesiredOutput {
        &self.joint_outputs[joint.0]
    }

    pub fn joint_output_mut(&mut self, joint: JointId) -> &mut JointDesiredOutput {
        &mut self.joint_outputs[joint.0]
    }

    pub fn body_wrench(&self, body: BodyId) -> &Force {
        &self.body_wrenches[body.0]
    }

    pub fn body_wrenches(&self) -> &[Force] {
        &self.body_wrenches
    }

    /// Accumulates onto the wrench already requested for the body.
    pub fn add_body_wrench(&mut self, body: BodyId, wrench: Force) {
        self.body_wrenches[body.0] = self.body_wrenches[body.0] + wrench;
    }

    pub fn clear_body_wrenches(&mut self) {
        self.body_wrenches.fill(Force::zeros());
    }
}

pub trait Controller: fmt::Debug {
    fn name(&self) -> &str;

    fn initialize(&mut self, _input: &ControllerInput) -> Result<(), ControllerErrors> {
        Ok(())
    }

    fn update(
        &mut self,
        input: &ControllerInput,
        output: &mut ControllerOutput,
    ) -> Result<(), ControllerErrors>;

    fn pause(&mut self) {}
}

/// Lets a controller run at a slower period than the simulation tick.
/// The period should be a multiple of the tick or the rate drifts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerThrottler {
    period: f64,
    next_update_time: Option<f64>,
}

impl ControllerThrottler {
    pub fn new(period: f64) -> Result<Self, ControllerErrors> {
        if !period.is_finite() || period <= 0.0 {
            return Err(ControllerErrors::InvalidPeriod(period));
        }
        Ok(Self {
            period,
            next_update_time: None,
        })
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    pub fn reset(&mut self) {
        self.next_update_time = None;
    }

    /// True when the controller is due at `time`, scheduling the next update.
    pub fn is_due(&mut self, time: f64) -> bool {
        // half a microsecond of slack so accumulated tick time still lands on the period
        let due = match self.next_update_time {
            None => true,
            Some(next) => time >= next - 5.0e-7,
        };
        if due {
            self.next_update_time = Some(time + self.period);
        }
        due
    }
}

#[derive(Debug)]
struct ControllerEntry {
    controller: Box<dyn Controller>,
    throttler: Option<ControllerThrottler>,
}

/// Runs the controllers of one robot and writes their output into the tree.
#[derive(Debug, Default)]
pub struct RobotControllerManager {
    controllers: Vec<ControllerEntry>,
    output: ControllerOutput,
    time: f64,
}

impl RobotControllerManager {
    pub fn new(system: &MultiBodySystem) -> Self {
        Self {
            controllers: Vec::new(),
            output: ControllerOutput::new(system),
            time: 0.0,
        }
    }

    /// Updated on every call to `update_controllers`.
    pub fn add_controller(&mut self, controller: Box<dyn Controller>) {
        self.controllers.push(ControllerEntry {
            controller,
            throttler: None,
        });
    }

    pub fn add_throttled_controller(
        &mut self,
        controller: Box<dyn Controller>,
        period: f64,
    ) -> Result<(), ControllerErrors> {
        let throttler = ControllerThrottler::new(period)?;
        self.controllers.push(ControllerEntry {
            controller,
            throttler: Some(throttler),
        });
        Ok(())
    }

    pub fn number_of_controllers(&self) -> usize {
        self.controllers.len()
    }

    pub fn controller_names(&self) -> Vec<&str> {
        self.controllers
            .iter()
            .map(|entry| entry.controller.name())
            .collect()
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn output(&self) -> &ControllerOutput {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut ControllerOutput {
        &mut self.output
    }

    pub fn initialize_controllers(
        &mut self,
        system: &MultiBodySystem,
        auxiliary: &[SimJointAuxiliaryData],
    ) -> Result<(), ControllerErrors> {
        self.time = 0.0;
        let input = ControllerInput {
            time: self.time,
            system,
            auxiliary,
        };
        for entry in &mut self.controllers {
            if let Some(throttler) = &mut entry.throttler {
                throttler.reset();
            }
            entry.controller.initialize(&input)?;
        }
        Ok(())
    }

    /// Body wrenches are requested anew each update, joint outputs persist
    /// until a controller overwrites or clears them.
    pub fn update_controllers(
        &mut self,
        time: f64,
        system: &MultiBodySystem,
        auxiliary: &[SimJointAuxiliaryData],
    ) -> Result<(), ControllerErrors> {
        self.time = time;
        self.output.clear_body_wrenches();
        let input = ControllerInput {
            time,
            system,
            auxiliary,
        };
        for entry in &mut self.controllers {
            if let Some(throttler) = &mut entry.throttler {
                if !throttler.is_due(time) {
                    continue;
                }
            }
            entry.controller.update(&input, &mut self.output)?;
        }
        Ok(())
    }

    pub fn pause_controllers(&mut self) {
        for entry in &mut self.controllers {
            entry.controller.pause();
        }
    }

    /// Writes one kind of desired state into the considered joints.
    ///
    /// Effort is the start of every tick's effort accumulation, so joints
    /// without a desired effort are written zero.
    pub fn write_controller_output(
        &self,
        state_type: JointStateType,
        system: &mut MultiBodySystem,
    ) -> Result<(), ControllerErrors> {
        let joints = system.joints_to_consider().to_vec();
        for joint in joints {
            let desired = self.output.joint_output(joint).get(state_type);
            match (desired, state_type) {
                (Some(value), _) => write_joint_state(system, joint, state_type, value)?,
                (None, JointStateType::Effort) => system.joint_mut(joint).state.tau.fill(0.0),
                (None, _) => {}
            }
        }
        Ok(())
    }

    /// Writes the requested kinds of desired state into the ignored joints,
    /// whose motion is entirely prescribed by controllers.
    pub fn write_controller_output_for_joints_to_ignore(
        &self,
        state_types: &[JointStateType],
        system: &mut MultiBodySystem,
    ) -> Result<(), ControllerErrors> {
        let joints = system.joints_to_ignore().to_vec();
        for joint in joints {
            let output = self.output.joint_output(joint);
            for state_type in state_types {
                if let Some(value) = output.get(*state_type) {
                    write_joint_state(system, joint, *state_type, value)?;
                }
            }
        }
        Ok(())
    }
}

fn write_joint_state(
    system: &mut MultiBodySystem,
    joint: JointId,
    state_type: JointStateType,
    value: &DVector<f64>,
) -> Result<(), ControllerErrors> {
    let joint = system.joint_mut(joint);
    let target = joint.state.get_mut(state_type);
    if target.len() != value.len() {
        return Err(ControllerErrors::OutputSize {
            joint: joint.name.clone(),
            state_type,
            got: value.len(),
            expected: target.len(),
        });
    }
    target.copy_from(value);
    if state_type == JointStateType::Configuration {
        joint.normalize_configuration();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        body::SimRigidBody,
        joint::{JointModels, SimJoint},
    };
    use nalgebra::Vector3;
    use robot_definition::joint::{JointType, OneDoFJointParameters};
    use spatial_algebra::SpatialInertia;
    use transforms::Transform;

    #[derive(Debug)]
    struct ConstantEffort {
        joint: JointId,
        effort: f64,
        updates: usize,
    }

    impl Controller for ConstantEffort {
        fn name(&self) -> &str {
            "constant_effort"
        }

        fn update(
            &mut self,
            _input: &ControllerInput,
            output: &mut ControllerOutput,
        ) -> Result<(), ControllerErrors> {
            self.updates += 1;
            output
                .joint_output_mut(self.joint)
                .set(JointStateType::Effort, DVector::from_element(1, self.effort));
            Ok(())
        }
    }

    fn two_sliders() -> MultiBodySystem {
        let world = SimRigidBody::new("world", SpatialInertia::default(), None);
        let mut system = MultiBodySystem::new(world, Transform::identity());
        for (name, body) in [("a", "cart_a"), ("b", "cart_b")] {
            let model = JointModels::from_definition(
                name,
                &JointType::Prismatic(OneDoFJointParameters::new(Vector3::x())),
            )
            .unwrap();
            let joint = SimJoint::new(name, model, BodyId(0), BodyId(0), Transform::identity());
            system.push_joint(joint, SimRigidBody::new(body, SpatialInertia::default(), None));
        }
        system
    }

    #[test]
    fn test_effort_written_and_zeroed_when_absent() {
        let mut system = two_sliders();
        system.joint_mut(JointId(1)).state.tau[0] = 7.0;
        let mut manager = RobotControllerManager::new(&system);
        manager.add_controller(Box::new(ConstantEffort {
            joint: JointId(0),
            effort: 3.0,
            updates: 0,
        }));
        manager.update_controllers(0.0, &system, &[]).unwrap();
        manager
            .write_controller_output(JointStateType::Effort, &mut system)
            .unwrap();
        assert_eq!(system.joint(JointId(0)).state.tau[0], 3.0);
        assert_eq!(system.joint(JointId(1)).state.tau[0], 0.0);
    }

    #[test]
    fn test_ignored_joints_only_receive_requested_types() {
        let mut system = two_sliders();
        system.ignore_joint(JointId(1));
        let mut manager = RobotControllerManager::new(&system);
        let output = manager.output_mut().joint_output_mut(JointId(1));
        output.set(JointStateType::Configuration, DVector::from_element(1, 0.4));
        output.set(JointStateType::Acceleration, DVector::from_element(1, 2.0));

        manager
            .write_controller_output(JointStateType::Configuration, &mut system)
            .unwrap();
        assert_eq!(system.joint(JointId(1)).state.q[0], 0.0);

        manager
            .write_controller_output_for_joints_to_ignore(
                &[JointStateType::Configuration, JointStateType::Velocity],
                &mut system,
            )
            .unwrap();
        let state = &system.joint(JointId(1)).state;
        assert_eq!(state.q[0], 0.4);
        assert_eq!(state.qdd[0], 0.0);
    }

    #[test]
    fn test_wrong_output_size_is_an_error() {
        let mut system = two_sliders();
        let mut manager = RobotControllerManager::new(&system);
        manager
            .output_mut()
            .joint_output_mut(JointId(0))
            .set(JointStateType::Velocity, DVector::zeros(3));
        let result = manager.write_controller_output(JointStateType::Velocity, &mut system);
        assert!(matches!(
            result,
            Err(ControllerErrors::OutputSize {
                got: 3,
                expected: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_throttler_runs_on_period() {
        let mut throttler = ControllerThrottler::new(0.01).unwrap();
        let dt = 0.001;
        let due: Vec<usize> = (0..35)
            .filter(|i| throttler.is_due(*i as f64 * dt))
            .collect();
        assert_eq!(due, vec![0, 10, 20, 30]);
        assert!(ControllerThrottler::new(0.0).is_err());
    }
}

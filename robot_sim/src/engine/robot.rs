use crate::{
    algorithms::{
        articulated_body_algorithm::ArticulatedBodyCalculator, DynamicsErrors, ForwardDynamics,
    },
    body::BodyId,
    config::PhysicsEngineConfig,
    controller::ControllerErrors,
    integrator::SingleRobotFirstOrderIntegrator,
    joint::joint_state::{JointState, JointStateType},
    limits::{JointDampingCalculator, JointSoftLimitCalculator},
    physics_output::RobotPhysicsOutput,
    robot::Robot,
    SimErrors,
};
use nalgebra::Vector3;

const ALL_STATE_TYPES: [JointStateType; 4] = [
    JointStateType::Configuration,
    JointStateType::Velocity,
    JointStateType::Acceleration,
    JointStateType::Effort,
];

/// A robot together with the calculators the contact point based engine
/// runs on it every tick.
#[derive(Debug)]
pub struct ContactPointBasedRobot {
    pub robot: Robot,
    forward_dynamics: ArticulatedBodyCalculator,
    integrator: SingleRobotFirstOrderIntegrator,
    soft_limits: Vec<JointSoftLimitCalculator>,
    joint_damping: Vec<JointDampingCalculator>,
    physics_output: RobotPhysicsOutput,
    before_physics_state: Vec<JointState>,
}

impl ContactPointBasedRobot {
    pub fn new(robot: Robot) -> Self {
        let mut soft_limits = Vec::new();
        let mut joint_damping = Vec::new();
        for id in robot.system.joints_to_consider() {
            let Some(parameters) = &robot.system.joint(*id).one_dof_parameters else {
                continue;
            };
            soft_limits.extend(JointSoftLimitCalculator::from_parameters(*id, parameters));
            joint_damping.extend(JointDampingCalculator::from_parameters(*id, parameters));
        }
        let forward_dynamics = ArticulatedBodyCalculator::new(&robot.system);
        let physics_output = RobotPhysicsOutput::new(robot.system.bodies.len());
        let before_physics_state = robot.system.joint_states();
        Self {
            robot,
            forward_dynamics,
            integrator: SingleRobotFirstOrderIntegrator::new(),
            soft_limits,
            joint_damping,
            physics_output,
            before_physics_state,
        }
    }

    pub fn physics_output(&self) -> &RobotPhysicsOutput {
        &self.physics_output
    }

    pub fn forward_dynamics(&self) -> &ArticulatedBodyCalculator {
        &self.forward_dynamics
    }

    pub fn soft_limits(&self) -> &[JointSoftLimitCalculator] {
        &self.soft_limits
    }

    pub fn disable_soft_limits(&mut self) {
        self.soft_limits.clear();
    }

    pub fn disable_joint_damping(&mut self) {
        self.joint_damping.clear();
    }

    /// Joint states as they were before the physics of the current tick.
    pub fn before_physics_state(&self) -> &[JointState] {
        &self.before_physics_state
    }

    pub fn initialize(&mut self, gravity: &Vector3<f64>) -> Result<(), SimErrors> {
        self.robot.initialize_state()?;
        self.reset_calculators();
        // seeds the accelerometers before any controller runs
        self.do_forward_dynamics(gravity)?;
        self.physics_output.dt = 0.0;
        self.capture_physics_output();
        self.update_sensors();
        let robot = &mut self.robot;
        robot
            .controller_manager
            .initialize_controllers(&robot.system, &robot.auxiliary)?;
        Ok(())
    }

    pub fn reset_calculators(&mut self) {
        self.forward_dynamics.reset(&self.robot.system);
    }

    /// Runs the controllers and writes their efforts, then the full desired
    /// state of the ignored joints.
    pub fn update_controllers(&mut self, time: f64) -> Result<(), ControllerErrors> {
        let robot = &mut self.robot;
        robot
            .controller_manager
            .update_controllers(time, &robot.system, &robot.auxiliary)?;
        robot
            .controller_manager
            .write_controller_output(JointStateType::Effort, &mut robot.system)?;
        robot
            .controller_manager
            .write_controller_output_for_joints_to_ignore(&ALL_STATE_TYPES, &mut robot.system)?;
        Ok(())
    }

    pub fn save_before_physics_state(&mut self) {
        self.before_physics_state = self.robot.system.joint_states();
    }

    pub fn compute_joint_damping(&mut self) {
        for calculator in &self.joint_damping {
            calculator.apply(self.robot.system.joint_mut(calculator.joint));
        }
    }

    pub fn compute_joint_soft_limits(&mut self) {
        for calculator in &self.soft_limits {
            calculator.apply(self.robot.system.joint_mut(calculator.joint));
        }
    }

    pub fn update_collidable_bounding_boxes(&mut self) {
        self.robot.update_collidable_bounding_boxes();
    }

    /// Adds contact, wrench point and controller wrenches to the external
    /// wrench of each body.
    pub fn fold_external_wrenches(&mut self) {
        let robot = &self.robot;
        for joint in robot.system.joints_to_consider() {
            let data = &robot.auxiliary[joint.0];
            let wrench = self.forward_dynamics.external_wrench_mut(data.body);
            for gcp in &data.ground_contact_points {
                *wrench += gcp.wrench_in_body();
            }
            for point in &data.external_wrench_points {
                *wrench += point.wrench_in_body();
            }
        }
        let body_wrenches = robot.controller_manager.output().body_wrenches();
        for (i, body_wrench) in body_wrenches.iter().enumerate() {
            *self.forward_dynamics.external_wrench_mut(BodyId(i)) += *body_wrench;
        }
    }

    pub fn do_forward_dynamics(&mut self, gravity: &Vector3<f64>) -> Result<(), DynamicsErrors> {
        self.forward_dynamics.compute(&self.robot.system, gravity)
    }

    /// Writes the accelerations of the considered joints and rejects
    /// non-finite or unreasonably large ones.
    pub fn write_joint_accelerations(
        &mut self,
        config: &PhysicsEngineConfig,
    ) -> Result<(), DynamicsErrors> {
        self.forward_dynamics
            .write_joint_accelerations(&mut self.robot.system);
        for id in self.robot.system.joints_to_consider() {
            let joint = self.robot.system.joint(*id);
            if joint.state.qdd.iter().any(|a| !a.is_finite()) {
                return Err(DynamicsErrors::NonFiniteAcceleration(joint.name.clone()));
            }
            let (angular, linear) = joint.acceleration_norms();
            if angular > config.max_angular_acceleration || linear > config.max_linear_acceleration
            {
                return Err(DynamicsErrors::UnreasonableAcceleration {
                    joint: joint.name.clone(),
                    angular,
                    linear,
                });
            }
        }
        Ok(())
    }

    /// Records what sensors read after this tick, then steps the joints.
    pub fn integrate_state(&mut self, dt: f64) {
        self.physics_output.dt = dt;
        self.capture_physics_output();
        self.integrator.integrate(&mut self.robot.system, dt);
    }

    pub fn update_frames(&mut self) {
        self.robot.update_frames();
    }

    pub fn update_sensors(&mut self) {
        let robot = &mut self.robot;
        for data in &mut robot.auxiliary {
            data.update(&robot.system, &self.physics_output);
        }
        robot.publish_variables();
    }

    fn capture_physics_output(&mut self) {
        let output = &mut self.physics_output;
        output
            .body_accelerations
            .copy_from_slice(self.forward_dynamics.body_accelerations());
        output
            .external_wrenches
            .copy_from_slice(self.forward_dynamics.external_wrenches());
        output.body_delta_twists = Some(self.robot.system.body_delta_twists());
    }
}

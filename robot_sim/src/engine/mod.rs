pub mod robot;

use crate::{
    collidable::Collidable,
    config::PhysicsEngineConfig,
    contact::{parameters::ContactParameters, ContactPointBasedForceCalculator},
    robot::{Robot, RobotErrors},
    registry::VariableRegistry,
    SimErrors,
};
use nalgebra::Vector3;
use robot::ContactPointBasedRobot;
use robot_definition::{collision::TerrainObjectDefinition, RobotDefinition};
use transforms::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initialized,
    Running,
}

/// Steps robots in contact with static terrain, one fixed tick at a time.
///
/// Contacts are resolved per ground contact point with a spring-damper and
/// stick-slip friction, the resulting wrenches go through forward dynamics
/// and a first order integration. Failures inside a tick are logged and the
/// tick is abandoned, the engine stays steppable.
#[derive(Debug)]
pub struct ContactPointBasedPhysicsEngine {
    state: EngineState,
    robots: Vec<ContactPointBasedRobot>,
    terrain_objects: Vec<TerrainObjectDefinition>,
    environment_collidables: Vec<Collidable>,
    force_calculator: ContactPointBasedForceCalculator,
    config: PhysicsEngineConfig,
    time: f64,
    tick: u64,
    registry: VariableRegistry,
}

impl Default for ContactPointBasedPhysicsEngine {
    fn default() -> Self {
        Self::new(PhysicsEngineConfig::default())
    }
}

impl ContactPointBasedPhysicsEngine {
    pub fn new(config: PhysicsEngineConfig) -> Self {
        Self {
            state: EngineState::Uninitialized,
            robots: Vec::new(),
            terrain_objects: Vec::new(),
            environment_collidables: Vec::new(),
            force_calculator: ContactPointBasedForceCalculator::new(config.contact),
            config,
            time: 0.0,
            tick: 0,
            registry: VariableRegistry::new("physics_engine"),
        }
    }

    /// Builds the robot with its root at the inertial frame origin.
    pub fn add_robot(&mut self, definition: RobotDefinition) -> Result<usize, RobotErrors> {
        self.add_robot_at(definition, Transform::identity())
    }

    /// Robots added after initialization get the whole engine initialized
    /// again on the next `simulate`.
    pub fn add_robot_at(
        &mut self,
        definition: RobotDefinition,
        root_pose: Transform,
    ) -> Result<usize, RobotErrors> {
        let robot = Robot::new(definition, root_pose)?;
        let mut robot = ContactPointBasedRobot::new(robot);
        if !self.config.compute_soft_limits {
            robot.disable_soft_limits();
        }
        if !self.config.compute_joint_damping {
            robot.disable_joint_damping();
        }
        log::info!("added robot '{}'", robot.robot.name);
        self.robots.push(robot);
        if self.state != EngineState::Uninitialized {
            log::info!("robot added to a running engine, it will initialize again");
            self.state = EngineState::Uninitialized;
        }
        Ok(self.robots.len() - 1)
    }

    pub fn add_terrain_object(&mut self, definition: TerrainObjectDefinition) {
        for shape in &definition.collision_shapes {
            let mut collidable = Collidable::new(shape, None);
            collidable.update_bounding_box();
            self.environment_collidables.push(collidable);
        }
        self.terrain_objects.push(definition);
    }

    /// Returns whether every robot initialized. On failure the engine stays
    /// uninitialized and the next `simulate` tries again.
    pub fn initialize(&mut self, gravity: &Vector3<f64>) -> bool {
        match self.try_initialize(gravity) {
            Ok(()) => {
                self.state = EngineState::Initialized;
                log::debug!("physics engine initialized with {} robots", self.robots.len());
                true
            }
            Err(e) => {
                log::error!("physics engine initialization failed: {e}");
                self.state = EngineState::Uninitialized;
                false
            }
        }
    }

    fn try_initialize(&mut self, gravity: &Vector3<f64>) -> Result<(), SimErrors> {
        for robot in &mut self.robots {
            robot.initialize(gravity)?;
        }
        for robot in &mut self.robots {
            let robot = &mut robot.robot;
            self.force_calculator
                .reset(robot.system.joints_to_consider(), &mut robot.auxiliary);
        }
        self.time = 0.0;
        self.tick = 0;
        self.publish_variables();
        Ok(())
    }

    /// Advances every robot by `dt`. An uninitialized engine only initializes.
    pub fn simulate(&mut self, dt: f64, gravity: &Vector3<f64>) {
        if self.state == EngineState::Uninitialized {
            self.initialize(gravity);
            return;
        }
        match self.try_simulate(dt, gravity) {
            Ok(()) => {
                if self.state == EngineState::Initialized {
                    log::debug!("physics engine running");
                }
                self.state = EngineState::Running;
                self.time += dt;
                self.tick += 1;
                self.publish_variables();
            }
            Err(e) => log::error!("physics tick {} abandoned: {e}", self.tick),
        }
    }

    fn try_simulate(&mut self, dt: f64, gravity: &Vector3<f64>) -> Result<(), SimErrors> {
        for robot in &mut self.robots {
            robot.reset_calculators();
            robot.update_controllers(self.time)?;
            robot.save_before_physics_state();
        }

        for robot in &mut self.robots {
            robot.compute_joint_damping();
            robot.compute_joint_soft_limits();
            robot.update_collidable_bounding_boxes();
        }

        for collidable in &mut self.environment_collidables {
            collidable.update_bounding_box();
        }
        for robot in &mut self.robots {
            let robot = &mut robot.robot;
            self.force_calculator.resolve_contact_forces(
                robot.system.joints_to_consider(),
                &mut robot.auxiliary,
                &self.environment_collidables,
            );
        }

        for robot in &mut self.robots {
            robot.fold_external_wrenches();
            robot.do_forward_dynamics(gravity)?;
        }

        for robot in &mut self.robots {
            robot.write_joint_accelerations(&self.config)?;
            robot.integrate_state(dt);
            robot.update_frames();
            robot.update_sensors();
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        for robot in &mut self.robots {
            robot.robot.controller_manager.pause_controllers();
        }
    }

    pub fn set_ground_contact_parameters(&mut self, parameters: ContactParameters) {
        self.config.contact = parameters;
        self.force_calculator.set_parameters(parameters);
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn config(&self) -> &PhysicsEngineConfig {
        &self.config
    }

    pub fn robots(&self) -> &[ContactPointBasedRobot] {
        &self.robots
    }

    pub fn robot(&self, name: &str) -> Option<&Robot> {
        self.robots
            .iter()
            .map(|robot| &robot.robot)
            .find(|robot| robot.name == name)
    }

    pub fn robot_mut(&mut self, name: &str) -> Option<&mut Robot> {
        self.robots
            .iter_mut()
            .map(|robot| &mut robot.robot)
            .find(|robot| robot.name == name)
    }

    pub fn robot_definitions(&self) -> Vec<&RobotDefinition> {
        self.robots
            .iter()
            .map(|robot| &robot.robot.definition)
            .collect()
    }

    pub fn terrain_objects(&self) -> &[TerrainObjectDefinition] {
        &self.terrain_objects
    }

    pub fn environment_collidables(&self) -> &[Collidable] {
        &self.environment_collidables
    }

    pub fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    fn publish_variables(&mut self) {
        self.registry.set("time", self.time);
        self.registry.set("tick", self.tick as f64);
    }
}

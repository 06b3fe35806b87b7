//! End to end scenarios driving the contact point based engine.

use approx::assert_abs_diff_eq;
use mass_properties::{CenterOfMass, Inertia, MassProperties};
use nalgebra::{DVector, Vector3};
use robot_definition::{
    collision::TerrainObjectDefinition,
    joint::{JointDefinition, JointType, OneDoFJointParameters},
    rigid_body::RigidBodyDefinition,
    sensor::SensorDefinition,
    tracker::{ExternalWrenchPointDefinition, GroundContactPointDefinition, KinematicPointDefinition},
    RobotDefinition,
};
use robot_sim::{
    controller::{Controller, ControllerErrors, ControllerInput, ControllerOutput},
    engine::{ContactPointBasedPhysicsEngine, EngineState},
    joint::{joint_state::JointStateType, JointId},
    robot::RobotState,
    sensor::wrench::WrenchSensorLocation,
};
use std::{cell::Cell, rc::Rc};
use transforms::Transform;

const DT: f64 = 0.001;
const G: f64 = 9.81;

fn gravity() -> Vector3<f64> {
    Vector3::new(0.0, 0.0, -G)
}

fn link(mass: f64, com: Vector3<f64>) -> MassProperties {
    MassProperties::new(
        mass,
        CenterOfMass::from(com),
        Inertia::diagonal(0.01, 0.01, 0.01).unwrap(),
    )
    .unwrap()
}

/// A horizontal link hinged about y at `pivot_height`, with a contact point
/// under its center of mass.
fn hinged_link(pivot_height: f64, parameters: OneDoFJointParameters) -> RobotDefinition {
    let arm = RigidBodyDefinition::new("arm", link(1.0, Vector3::new(0.5, 0.0, 0.0)));
    let hinge = JointDefinition::new("hinge", JointType::Revolute(parameters))
        .with_transform_to_parent(Transform::from_translation(0.0, 0.0, pivot_height))
        .with_successor(arm)
        .with_ground_contact_point(GroundContactPointDefinition::new(
            "tip",
            Transform::from_translation(0.5, 0.0, 0.0),
        ))
        .with_sensor(SensorDefinition::imu("arm_imu", Transform::identity()));
    RobotDefinition::new(
        "lever",
        RigidBodyDefinition::new("world", MassProperties::default()).with_child_joint(hinge),
    )
}

fn engine_with(definition: RobotDefinition) -> ContactPointBasedPhysicsEngine {
    let mut engine = ContactPointBasedPhysicsEngine::default();
    engine.add_robot(definition).unwrap();
    engine.add_terrain_object(TerrainObjectDefinition::flat_ground("ground", 0.0));
    assert!(engine.initialize(&gravity()));
    engine
}

#[test]
fn hinged_link_settles_on_the_ground() {
    let mut engine = engine_with(hinged_link(0.02, OneDoFJointParameters::new(Vector3::y())));

    let mut touchdown_tick = None;
    for tick in 0..2000 {
        engine.simulate(DT, &gravity());
        let tip = engine.robot("lever").unwrap().ground_contact_point("tip").unwrap();
        if tip.in_contact && touchdown_tick.is_none() {
            touchdown_tick = Some(tick);
        }
    }
    assert!(touchdown_tick.is_some_and(|tick| tick < 500));
    assert_eq!(engine.state(), EngineState::Running);
    assert_eq!(engine.tick(), 2000);

    let robot = engine.robot("lever").unwrap();
    let tip = robot.ground_contact_point("tip").unwrap();
    assert!(tip.in_contact);
    let weight = 1.0 * G;
    let fz = tip.force_world().z;
    assert!((fz - weight).abs() / weight < 0.05, "normal force {fz}");
    assert_eq!(robot.registry.get("tip_in_contact"), Some(1.0));
}

#[test]
fn identical_runs_are_bit_identical() {
    let run = || {
        let mut engine = engine_with(hinged_link(0.02, OneDoFJointParameters::new(Vector3::y())));
        for _ in 0..300 {
            engine.simulate(DT, &gravity());
        }
        engine.robot("lever").unwrap().save_state()
    };
    let a = run();
    let b = run();
    assert_same_bits(&a, &b);
}

fn bits<'a>(values: impl IntoIterator<Item = &'a f64>) -> Vec<u64> {
    values.into_iter().map(|x| x.to_bits()).collect()
}

fn assert_same_bits(a: &RobotState, b: &RobotState) {
    assert_eq!(a.joints.len(), b.joints.len());
    for (a, b) in a.joints.iter().zip(&b.joints) {
        assert_eq!(bits(&a.q), bits(&b.q));
        assert_eq!(bits(&a.qd), bits(&b.qd));
        assert_eq!(bits(&a.qdd), bits(&b.qdd));
    }
    assert_eq!(a.contacts.len(), b.contacts.len());
    for (a, b) in a.contacts.iter().zip(&b.contacts) {
        assert_eq!(a.in_contact, b.in_contact);
        assert_eq!(a.is_slipping, b.is_slipping);
        assert_eq!(bits(&a.wrench.vector()), bits(&b.wrench.vector()));
    }
}

#[test]
fn restored_state_replays_the_same_tick() {
    let mut engine = engine_with(hinged_link(0.02, OneDoFJointParameters::new(Vector3::y())));
    let in_contact = |engine: &ContactPointBasedPhysicsEngine| {
        engine.robot("lever").unwrap().ground_contact_point("tip").unwrap().in_contact
    };
    while !in_contact(&engine) && engine.tick() < 500 {
        engine.simulate(DT, &gravity());
    }
    assert!(in_contact(&engine));
    let saved = engine.robot("lever").unwrap().save_state();

    engine.simulate(DT, &gravity());
    let first = engine.robot("lever").unwrap().save_state();

    // wander off, then come back
    for _ in 0..50 {
        engine.simulate(DT, &gravity());
    }
    engine.robot_mut("lever").unwrap().restore_state(&saved).unwrap();
    let tip = engine.robot("lever").unwrap().ground_contact_point("tip").unwrap();
    assert_eq!(tip.contact_state(), saved.contacts[0]);
    engine.simulate(DT, &gravity());
    let second = engine.robot("lever").unwrap().save_state();

    assert_same_bits(&first, &second);
    assert_eq!(first.contacts[0].touchdown, second.contacts[0].touchdown);
}

#[test]
fn soft_stop_holds_the_link_above_the_limit() {
    let parameters = OneDoFJointParameters::new(Vector3::y())
        .with_position_limits(-0.3, 0.3)
        .with_soft_limit_gains(1000.0, 50.0);
    // high enough that the tip never reaches the ground
    let mut engine = engine_with(hinged_link(1.0, parameters));
    for _ in 0..2000 {
        engine.simulate(DT, &gravity());
    }
    let robot = engine.robot("lever").unwrap();
    let q = robot.system.joint_by_name("hinge").unwrap().state.q[0];
    // gravity torque m g L cos(q) balanced by kp (q - upper)
    let expected = 0.3 + G * 0.5 * 0.3_f64.cos() / 1000.0;
    assert_abs_diff_eq!(q, expected, epsilon = 1e-3);
    assert!(!robot.ground_contact_point("tip").unwrap().in_contact);
}

#[derive(Debug)]
struct HoldEffort {
    joint: JointId,
    effort: f64,
    fail_after: Option<f64>,
}

impl Controller for HoldEffort {
    fn name(&self) -> &str {
        "hold"
    }

    fn update(
        &mut self,
        input: &ControllerInput,
        output: &mut ControllerOutput,
    ) -> Result<(), ControllerErrors> {
        if self.fail_after.is_some_and(|t| input.time > t) {
            return Err(ControllerErrors::Failed {
                controller: self.name().to_string(),
                message: "lost the sensor".to_string(),
            });
        }
        output
            .joint_output_mut(self.joint)
            .set(JointStateType::Effort, DVector::from_element(1, self.effort));
        Ok(())
    }
}

#[test]
fn controller_effort_holds_the_link_level() {
    let mut engine = ContactPointBasedPhysicsEngine::default();
    engine
        .add_robot(hinged_link(1.0, OneDoFJointParameters::new(Vector3::y())))
        .unwrap();
    let robot = engine.robot_mut("lever").unwrap();
    let joint = robot.joint_id("hinge").unwrap();
    robot.controller_manager_mut().add_controller(Box::new(HoldEffort {
        joint,
        effort: -G * 0.5,
        fail_after: None,
    }));

    for _ in 0..500 {
        engine.simulate(DT, &gravity());
    }
    let robot = engine.robot("lever").unwrap();
    let state = &robot.system.joint(joint).state;
    assert_abs_diff_eq!(state.q[0], 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(state.tau[0], -G * 0.5, epsilon = 1e-12);
    // the IMU on the resting link reads gravity upward
    let imu = &robot.joint_auxiliary("hinge").unwrap().imu_sensors[0];
    assert_abs_diff_eq!(imu.linear_acceleration(), Vector3::new(0.0, 0.0, G), epsilon = 1e-6);
}

#[test]
fn failing_controller_abandons_ticks_without_stopping_the_engine() {
    let mut engine = ContactPointBasedPhysicsEngine::default();
    engine
        .add_robot(hinged_link(1.0, OneDoFJointParameters::new(Vector3::y())))
        .unwrap();
    let robot = engine.robot_mut("lever").unwrap();
    let joint = robot.joint_id("hinge").unwrap();
    robot.controller_manager_mut().add_controller(Box::new(HoldEffort {
        joint,
        effort: 0.0,
        fail_after: Some(0.0095),
    }));

    // the first call initializes, the next ten run
    for _ in 0..11 {
        engine.simulate(DT, &gravity());
    }
    assert_eq!(engine.tick(), 10);
    let q = engine.robot("lever").unwrap().system.joint(joint).state.q[0];

    for _ in 0..5 {
        engine.simulate(DT, &gravity());
    }
    assert_eq!(engine.tick(), 10);
    assert_eq!(engine.state(), EngineState::Running);
    assert_eq!(engine.robot("lever").unwrap().system.joint(joint).state.q[0], q);
}

#[test]
fn wrench_sensor_measures_the_supported_weight() {
    let payload = RigidBodyDefinition::new("payload", link(2.0, Vector3::zeros()));
    let mount = JointDefinition::new("mount", JointType::Fixed)
        .with_successor(payload)
        .with_sensor(SensorDefinition::wrench("load_cell", Transform::identity()));
    let definition = RobotDefinition::new(
        "scale",
        RigidBodyDefinition::new("world", MassProperties::default()).with_child_joint(mount),
    );
    let mut engine = ContactPointBasedPhysicsEngine::default();
    engine.add_robot(definition).unwrap();
    for _ in 0..3 {
        engine.simulate(DT, &gravity());
    }
    let robot = engine.robot("scale").unwrap();
    let sensor = &robot.joint_auxiliary("mount").unwrap().wrench_sensors[0];
    assert_abs_diff_eq!(
        sensor.wrench().translation(),
        Vector3::new(0.0, 0.0, 2.0 * G),
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(sensor.wrench().rotation(), Vector3::zeros(), epsilon = 1e-9);
    assert_abs_diff_eq!(sensor.filtered_wrench().translation().z, 2.0 * G, epsilon = 1e-9);
}

#[test]
fn wrench_filter_override_survives_ticks() {
    let payload = RigidBodyDefinition::new("payload", link(2.0, Vector3::zeros()));
    let mount = JointDefinition::new("mount", JointType::Fixed)
        .with_successor(payload)
        .with_sensor(SensorDefinition::wrench("load_cell", Transform::identity()));
    let definition = RobotDefinition::new(
        "scale",
        RigidBodyDefinition::new("world", MassProperties::default()).with_child_joint(mount),
    );
    let mut engine = ContactPointBasedPhysicsEngine::default();
    engine.add_robot(definition).unwrap();
    engine.simulate(DT, &gravity());
    engine
        .robot_mut("scale")
        .unwrap()
        .joint_auxiliary_mut("mount")
        .unwrap()
        .wrench_sensors[0]
        .set_filter_break_frequency(2.0);
    for _ in 0..3 {
        engine.simulate(DT, &gravity());
    }
    let sensor = &engine.robot("scale").unwrap().joint_auxiliary("mount").unwrap().wrench_sensors[0];
    assert_eq!(sensor.filter().break_frequency(), 2.0);
    assert_abs_diff_eq!(sensor.filtered_wrench().translation().z, 2.0 * G, epsilon = 1e-9);
}

#[test]
fn free_falling_imu_reads_zero() {
    let ball = RigidBodyDefinition::new("ball", link(1.0, Vector3::zeros()));
    let floating = JointDefinition::new("floating", JointType::SixDoF)
        .with_successor(ball)
        .with_sensor(SensorDefinition::imu("ball_imu", Transform::identity()));
    let definition = RobotDefinition::new(
        "ball",
        RigidBodyDefinition::new("world", MassProperties::default()).with_child_joint(floating),
    );
    let mut engine = ContactPointBasedPhysicsEngine::default();
    engine.add_robot(definition).unwrap();
    for _ in 0..50 {
        engine.simulate(DT, &gravity());
    }
    let robot = engine.robot("ball").unwrap();
    let imu = &robot.joint_auxiliary("floating").unwrap().imu_sensors[0];
    assert_abs_diff_eq!(imu.linear_acceleration(), Vector3::zeros(), epsilon = 1e-9);
    let z = robot.system.joint_by_name("floating").unwrap().state.q[6];
    let t = 49.0 * DT;
    assert_abs_diff_eq!(z, -0.5 * G * t * t, epsilon = 1e-3);
}

#[test]
fn reloaded_definition_simulates_the_same() {
    let definition = hinged_link(0.02, OneDoFJointParameters::new(Vector3::y()));
    let reloaded = RobotDefinition::from_ron_str(&definition.to_ron_string().unwrap()).unwrap();
    let mut a = engine_with(definition);
    let mut b = engine_with(reloaded);
    for _ in 0..100 {
        a.simulate(DT, &gravity());
        b.simulate(DT, &gravity());
    }
    let q = |engine: &ContactPointBasedPhysicsEngine| {
        engine.robot("lever").unwrap().system.joint_by_name("hinge").unwrap().state.q[0]
    };
    assert_eq!(q(&a), q(&b));
    assert!(q(&a) > 0.0);
}

#[test]
fn external_wrench_point_keeps_pushing() {
    let mut definition = hinged_link(1.0, OneDoFJointParameters::new(Vector3::y()));
    let hinge = definition
        .root_body
        .children_joints
        .remove(0)
        .with_external_wrench_point(ExternalWrenchPointDefinition::new(
            "lift",
            Transform::from_translation(0.5, 0.0, 0.0),
        ))
        .with_kinematic_point(KinematicPointDefinition::new(
            "end",
            Transform::from_translation(1.0, 0.0, 0.0),
        ));
    definition.root_body.children_joints.push(hinge);
    let mut engine = ContactPointBasedPhysicsEngine::default();
    engine.add_robot(definition).unwrap();
    engine
        .robot_mut("lever")
        .unwrap()
        .joint_auxiliary_mut("hinge")
        .unwrap()
        .external_wrench_points[0]
        .set_wrench_world(Vector3::zeros(), Vector3::new(0.0, 0.0, G));

    for _ in 0..500 {
        engine.simulate(DT, &gravity());
    }
    let robot = engine.robot("lever").unwrap();
    let q = robot.system.joint_by_name("hinge").unwrap().state.q[0];
    assert_abs_diff_eq!(q, 0.0, epsilon = 1e-9);
    let end = &robot.joint_auxiliary("hinge").unwrap().kinematic_points[0];
    assert_abs_diff_eq!(end.position(), Vector3::new(1.0, 0.0, 1.0), epsilon = 1e-9);
}

#[derive(Debug)]
struct CountUpdates(Rc<Cell<u32>>);

impl Controller for CountUpdates {
    fn name(&self) -> &str {
        "counter"
    }

    fn update(
        &mut self,
        _input: &ControllerInput,
        _output: &mut ControllerOutput,
    ) -> Result<(), ControllerErrors> {
        self.0.set(self.0.get() + 1);
        Ok(())
    }
}

#[test]
fn throttled_controller_runs_at_its_period() {
    let updates = Rc::new(Cell::new(0));
    let mut engine = engine_with(hinged_link(1.0, OneDoFJointParameters::new(Vector3::y())));
    engine
        .robot_mut("lever")
        .unwrap()
        .controller_manager_mut()
        .add_throttled_controller(Box::new(CountUpdates(updates.clone())), 0.01)
        .unwrap();
    for _ in 0..100 {
        engine.simulate(DT, &gravity());
    }
    assert_eq!(updates.get(), 10);
}

#[test]
fn wrench_sensor_after_body_skips_its_own_body() {
    let payload = RigidBodyDefinition::new("payload", link(2.0, Vector3::zeros()));
    let wrist = JointDefinition::new("wrist", JointType::Fixed).with_successor(payload);
    let upper = RigidBodyDefinition::new("upper", link(1.0, Vector3::zeros())).with_child_joint(wrist);
    let mount = JointDefinition::new("mount", JointType::Fixed)
        .with_successor(upper)
        .with_sensor(SensorDefinition::wrench("before", Transform::identity()))
        .with_sensor(SensorDefinition::wrench("after", Transform::identity()));
    let definition = RobotDefinition::new(
        "arm",
        RigidBodyDefinition::new("world", MassProperties::default()).with_child_joint(mount),
    );
    let mut engine = ContactPointBasedPhysicsEngine::default();
    engine.add_robot(definition).unwrap();
    engine
        .robot_mut("arm")
        .unwrap()
        .joint_auxiliary_mut("mount")
        .unwrap()
        .wrench_sensors[1]
        .location = WrenchSensorLocation::AfterBody;
    for _ in 0..3 {
        engine.simulate(DT, &gravity());
    }
    let robot = engine.robot("arm").unwrap();
    assert!(robot.system.body_by_name("payload").is_some());
    let sensors = &robot.joint_auxiliary("mount").unwrap().wrench_sensors;
    assert_abs_diff_eq!(sensors[0].wrench().translation().z, 3.0 * G, epsilon = 1e-9);
    assert_abs_diff_eq!(sensors[1].wrench().translation().z, 2.0 * G, epsilon = 1e-9);
}

use clap::Parser;
use env_logger::{Builder, Env};
use mass_properties::{CenterOfMass, Inertia, MassProperties};
use nalgebra::{Vector3, Vector6};
use robot_definition::{
    collision::TerrainObjectDefinition,
    joint::{JointDefinition, JointStateDefinition, JointType},
    rigid_body::RigidBodyDefinition,
    sensor::SensorDefinition,
    tracker::GroundContactPointDefinition,
    RobotDefinition,
};
use robot_sim::{config::PhysicsEngineConfig, engine::ContactPointBasedPhysicsEngine};
use std::{error::Error, path::PathBuf};
use transforms::Transform;

/// Drops a box on flat ground and reports the contact forces
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Simulated time in seconds
    #[arg(long, default_value_t = 2.0)]
    duration: f64,
    /// Physics timestep in seconds
    #[arg(long, default_value_t = 0.001)]
    dt: f64,
    /// Initial height of the box center
    #[arg(long, default_value_t = 0.3)]
    height: f64,
    /// Engine configuration (RON)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Robot definition (RON) replacing the built in box
    #[arg(long)]
    robot: Option<PathBuf>,
    /// Write the built in box definition to this path and exit
    #[arg(long)]
    save_robot: Option<PathBuf>,
}

const HALF_EXTENT: f64 = 0.1;

fn box_robot(height: f64) -> Result<RobotDefinition, Box<dyn Error>> {
    let mass_properties = MassProperties::new(
        2.0,
        CenterOfMass::new(0.0, 0.0, 0.0),
        Inertia::diagonal(0.0133, 0.0133, 0.0133)?,
    )?;
    let mut floating = JointDefinition::new("floating", JointType::SixDoF)
        .with_successor(RigidBodyDefinition::new("box", mass_properties))
        .with_sensor(
            SensorDefinition::imu("box_imu", Transform::identity()).with_update_period(0.002),
        )
        .with_initial_state(JointStateDefinition::six_dof(
            &Transform::from_translation(0.0, 0.0, height),
            &Vector6::zeros(),
        ));
    for (i, (x, y)) in [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)]
        .into_iter()
        .enumerate()
    {
        // front and back corners in separate contact groups
        let group = if x > 0.0 { 0 } else { 1 };
        floating = floating.with_ground_contact_point(
            GroundContactPointDefinition::new(
                &format!("corner_{i}"),
                Transform::from_translation(x * HALF_EXTENT, y * HALF_EXTENT, -HALF_EXTENT),
            )
            .with_group_identifier(group),
        );
    }
    Ok(RobotDefinition::new(
        "box",
        RigidBodyDefinition::new("world", MassProperties::default()).with_child_joint(floating),
    ))
}

fn main() -> Result<(), Box<dyn Error>> {
    Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PhysicsEngineConfig::load(path)?,
        None => PhysicsEngineConfig::default(),
    };
    let definition = match &args.robot {
        Some(path) => RobotDefinition::load(path)?,
        None => box_robot(args.height)?,
    };
    if let Some(path) = &args.save_robot {
        definition.save(path)?;
        log::info!("saved '{}' to {}", definition.name, path.display());
        return Ok(());
    }
    let name = definition.name.clone();

    let mut engine = ContactPointBasedPhysicsEngine::new(config);
    engine.add_robot(definition)?;
    engine.add_terrain_object(TerrainObjectDefinition::flat_ground("ground", 0.0));

    let gravity = Vector3::new(0.0, 0.0, -9.81);
    if !engine.initialize(&gravity) {
        return Err("engine failed to initialize".into());
    }

    let ticks = (args.duration / args.dt).round() as u64;
    let report_every = ((0.1 / args.dt).round() as u64).max(1);
    for _ in 0..ticks {
        engine.simulate(args.dt, &gravity);
        if engine.tick() % report_every != 0 {
            continue;
        }
        let Some(robot) = engine.robot(&name) else {
            break;
        };
        let mut total = Vector3::zeros();
        let mut in_contact = 0;
        for gcp in robot.ground_contact_points() {
            if gcp.in_contact {
                in_contact += 1;
                total += gcp.force_world();
            }
        }
        log::info!(
            "t = {:.3} s, {in_contact} points in contact, contact force [{:.3}, {:.3}, {:.3}] N",
            engine.time(),
            total.x,
            total.y,
            total.z
        );
    }
    Ok(())
}

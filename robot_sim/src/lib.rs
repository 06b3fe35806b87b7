pub mod algorithms;
pub mod auxiliary;
pub mod body;
pub mod collidable;
pub mod config;
pub mod contact;
pub mod controller;
pub mod engine;
pub mod integrator;
pub mod joint;
pub mod limits;
pub mod physics_output;
pub mod registry;
pub mod robot;
pub mod sensor;
pub mod system;

use algorithms::DynamicsErrors;
use config::ConfigErrors;
use controller::ControllerErrors;
use joint::JointErrors;
use mass_properties::MassPropertiesErrors;
use robot::RobotErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimErrors {
    #[error("{0}")]
    Config(#[from] ConfigErrors),
    #[error("{0}")]
    Controller(#[from] ControllerErrors),
    #[error("{0}")]
    Dynamics(#[from] DynamicsErrors),
    #[error("{0}")]
    Joint(#[from] JointErrors),
    #[error("{0}")]
    MassProperties(#[from] MassPropertiesErrors),
    #[error("{0}")]
    Robot(#[from] RobotErrors),
}

use crate::body::BodyId;
use spatial_algebra::{Acceleration, Force, Velocity};

/// Everything the auxiliary data of a robot reads after a tick.
///
/// All per-body quantities are indexed by `BodyId` and expressed in the body
/// frame. Accelerations include the gravity offset of the base.
#[derive(Debug, Clone, Default)]
pub struct RobotPhysicsOutput {
    pub dt: f64,
    pub body_accelerations: Vec<Acceleration>,
    pub body_delta_twists: Option<Vec<Velocity>>,
    pub external_wrenches: Vec<Force>,
    pub external_impulses: Option<Vec<Force>>,
}

impl RobotPhysicsOutput {
    pub fn new(n_bodies: usize) -> Self {
        Self {
            dt: 0.0,
            body_accelerations: vec![Acceleration::zeros(); n_bodies],
            body_delta_twists: None,
            external_wrenches: vec![Force::zeros(); n_bodies],
            external_impulses: None,
        }
    }

    pub fn acceleration(&self, body: BodyId) -> Acceleration {
        self.body_accelerations
            .get(body.0)
            .copied()
            .unwrap_or_default()
    }

    pub fn delta_twist(&self, body: BodyId) -> Option<Velocity> {
        self.body_delta_twists
            .as_ref()
            .and_then(|twists| twists.get(body.0).copied())
    }

    pub fn external_wrench(&self, body: BodyId) -> Force {
        self.external_wrenches.get(body.0).copied().unwrap_or_default()
    }

    pub fn external_impulse(&self, body: BodyId) -> Option<Force> {
        self.external_impulses
            .as_ref()
            .and_then(|impulses| impulses.get(body.0).copied())
    }
}

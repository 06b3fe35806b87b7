use crate::{
    joint::{JointModel, SimJoint},
    system::MultiBodySystem,
};

/// Steps the considered joints of one robot forward in time.
///
/// Pinned joints and joints ignored by the dynamics keep their configuration,
/// their motion is owned by whoever writes it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleRobotFirstOrderIntegrator;

impl SingleRobotFirstOrderIntegrator {
    pub fn new() -> Self {
        Self
    }

    pub fn integrate(&self, system: &mut MultiBodySystem, dt: f64) {
        let joints = system.joints_to_consider().to_vec();
        for id in joints {
            let SimJoint {
                model,
                state,
                is_pinned,
                ..
            } = system.joint_mut(id);
            if *is_pinned {
                continue;
            }
            model.integrate(state, dt);
            state.delta_qd.fill(0.0);
        }
    }
}

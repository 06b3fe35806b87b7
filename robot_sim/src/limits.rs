use crate::joint::{JointId, SimJoint};
use robot_definition::joint::OneDoFJointParameters;
use serde::{Deserialize, Serialize};

/// Penalty torque pushing a one-DoF joint back inside its position limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointSoftLimitCalculator {
    pub joint: JointId,
    pub lower: f64,
    pub upper: f64,
    pub kp: f64,
    pub kd: f64,
}

impl JointSoftLimitCalculator {
    /// Only joints with finite limits and a positive gain get a calculator.
    /// Callers validate the limits beforehand.
    pub fn from_parameters(joint: JointId, parameters: &OneDoFJointParameters) -> Option<Self> {
        let lower = parameters.position_lower_limit;
        let upper = parameters.position_upper_limit;
        let kp = parameters.kp_soft_limit_stop;
        let kd = parameters.kd_soft_limit_stop;
        if !lower.is_finite() || !upper.is_finite() || !(kp > 0.0 || kd > 0.0) {
            return None;
        }
        Some(Self {
            joint,
            lower,
            upper,
            kp: kp.max(0.0),
            kd: kd.max(0.0),
        })
    }

    pub fn torque(&self, q: f64, qd: f64) -> f64 {
        if q < self.lower {
            (self.kp * (self.lower - q) - self.kd * qd).max(0.0)
        } else if q > self.upper {
            (self.kp * (self.upper - q) - self.kd * qd).min(0.0)
        } else {
            0.0
        }
    }

    /// Adds the penalty torque to the commanded effort.
    pub fn apply(&self, joint: &mut SimJoint) {
        let tau = self.torque(joint.state.q[0], joint.state.qd[0]);
        joint.state.tau[0] += tau;
    }
}

/// Viscous friction of a one-DoF joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointDampingCalculator {
    pub joint: JointId,
    pub damping: f64,
}

impl JointDampingCalculator {
    pub fn from_parameters(joint: JointId, parameters: &OneDoFJointParameters) -> Option<Self> {
        (parameters.damping > 0.0).then_some(Self {
            joint,
            damping: parameters.damping,
        })
    }

    pub fn apply(&self, joint: &mut SimJoint) {
        joint.state.tau[0] -= self.damping * joint.state.qd[0];
    }
}

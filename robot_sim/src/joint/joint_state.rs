use nalgebra::DVector;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JointStateType {
    Configuration,
    Velocity,
    Acceleration,
    Effort,
}

/// State record shared by every joint kind.
///
/// `q` is the configuration and may be larger than the number of degrees of
/// freedom (quaternions). `qd`, `qdd`, `tau` and `delta_qd` are sized to the
/// degrees of freedom. `delta_qd` is a velocity-level correction applied on the
/// next integration step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointState {
    pub q: DVector<f64>,
    pub qd: DVector<f64>,
    pub qdd: DVector<f64>,
    pub tau: DVector<f64>,
    pub delta_qd: DVector<f64>,
}

impl JointState {
    pub fn new(neutral_configuration: DVector<f64>, ndof: usize) -> Self {
        Self {
            q: neutral_configuration,
            qd: DVector::zeros(ndof),
            qdd: DVector::zeros(ndof),
            tau: DVector::zeros(ndof),
            delta_qd: DVector::zeros(ndof),
        }
    }

    pub fn get(&self, state_type: JointStateType) -> &DVector<f64> {
        match state_type {
            JointStateType::Configuration => &self.q,
            JointStateType::Velocity => &self.qd,
            JointStateType::Acceleration => &self.qdd,
            JointStateType::Effort => &self.tau,
        }
    }

    pub fn get_mut(&mut self, state_type: JointStateType) -> &mut DVector<f64> {
        match state_type {
            JointStateType::Configuration => &mut self.q,
            JointStateType::Velocity => &mut self.qd,
            JointStateType::Acceleration => &mut self.qdd,
            JointStateType::Effort => &mut self.tau,
        }
    }

    pub fn is_finite(&self) -> bool {
        [&self.q, &self.qd, &self.qdd, &self.tau]
            .iter()
            .all(|v| v.iter().all(|x| x.is_finite()))
    }
}

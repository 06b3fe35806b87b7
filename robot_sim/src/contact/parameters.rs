use serde::{Deserialize, Serialize};

/// Gains of the point contact model.
///
/// The spring on the normal stiffens as the penetration approaches
/// `stiffening_length`. Friction sticks until the tangential to normal force
/// ratio exceeds `alpha_stick` and keeps slipping while it stays above
/// `alpha_slip`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactParameters {
    pub kxy: f64,
    pub bxy: f64,
    pub kz: f64,
    pub bz: f64,
    pub stiffening_length: f64,
    pub alpha_slip: f64,
    pub alpha_stick: f64,
    pub enable_slip: bool,
}

impl Default for ContactParameters {
    fn default() -> Self {
        Self {
            kxy: 1422.0,
            bxy: 15.6,
            kz: 125.0,
            bz: 300.0,
            stiffening_length: 0.008,
            alpha_slip: 0.7,
            alpha_stick: 0.7,
            enable_slip: true,
        }
    }
}

impl ContactParameters {
    pub fn with_slip(mut self, enable_slip: bool) -> Self {
        self.enable_slip = enable_slip;
        self
    }

    pub fn with_friction_ratios(mut self, alpha_stick: f64, alpha_slip: f64) -> Self {
        self.alpha_stick = alpha_stick;
        self.alpha_slip = alpha_slip;
        self
    }
}

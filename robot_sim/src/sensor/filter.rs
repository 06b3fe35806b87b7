use nalgebra::{SVector, UnitQuaternion};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Break frequency of the automatic filter as a fraction of the sampling rate.
pub const ANTIALIASING_FILTER_RATIO: f64 = 0.3;

/// What a filter does with the raw sample of the current tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterStep {
    /// The filtered value takes the raw value.
    Snap,
    /// The filtered value moves toward the raw value by the factor.
    Blend(f64),
}

impl FilterStep {
    pub fn apply<const D: usize>(&self, filtered: &mut SVector<f64, D>, raw: &SVector<f64, D>) {
        match self {
            FilterStep::Snap => *filtered = *raw,
            FilterStep::Blend(alpha) => *filtered = filtered.lerp(raw, *alpha),
        }
    }

    /// Same as `apply` for orientations, blending along the shortest arc.
    pub fn apply_rotation(&self, filtered: &mut UnitQuaternion<f64>, raw: &UnitQuaternion<f64>) {
        match self {
            FilterStep::Snap => *filtered = *raw,
            FilterStep::Blend(alpha) => *filtered = filtered.slerp(raw, *alpha),
        }
    }
}

/// First order low pass filter shared by every signal of one sensor.
///
/// With an infinite sampling rate the break frequency is chosen on the first
/// tick with a positive timestep as `ANTIALIASING_FILTER_RATIO / dt`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AntiAliasingFilter {
    break_frequency: f64,
    initialized: bool,
}

impl AntiAliasingFilter {
    pub fn new(sampling_rate: f64) -> Self {
        let break_frequency = if sampling_rate.is_finite() {
            sampling_rate * ANTIALIASING_FILTER_RATIO
        } else {
            f64::INFINITY
        };
        Self {
            break_frequency,
            initialized: false,
        }
    }

    /// Sampling rate in Hz for a period in seconds, infinite when the period
    /// is not positive.
    pub fn sampling_rate(update_period: f64) -> f64 {
        if update_period > 0.0 {
            1.0 / update_period
        } else {
            f64::INFINITY
        }
    }

    pub fn break_frequency(&self) -> f64 {
        self.break_frequency
    }

    /// Overrides the break frequency in Hz. An infinite value hands the choice
    /// back to the first tick that follows.
    pub fn set_break_frequency(&mut self, break_frequency: f64) {
        self.break_frequency = break_frequency;
    }

    /// Advances the filter by one tick. A non positive timestep restarts it.
    pub fn step(&mut self, dt: f64) -> FilterStep {
        if dt <= 0.0 {
            self.initialized = false;
        }
        if !self.initialized {
            self.initialized = true;
            return FilterStep::Snap;
        }
        if self.break_frequency.is_infinite() {
            self.break_frequency = ANTIALIASING_FILTER_RATIO / dt;
        }
        FilterStep::Blend(1.0 - (-2.0 * PI * self.break_frequency * dt).exp())
    }
}

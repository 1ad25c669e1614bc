//! Maintainability index (original three-metric SEI formula).
//!
//! `MI = 171 - 5.2 ln(V) - 0.23 CC - 16.2 ln(LOC)`, with `ln` taken on
//! `max(x, 1)` so empty code stays finite. The raw value is kept; clamping
//! happens only when displaying.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const MI_MAX: f64 = 171.0;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaintainabilityIndex(f64);

impl MaintainabilityIndex {
    pub fn new(raw: f64) -> Self {
        Self(raw)
    }

    /// Unclamped value; may exceed 171 or go negative.
    pub fn raw(&self) -> f64 {
        self.0
    }

    pub fn clamped(&self) -> f64 {
        self.0.clamp(0.0, MI_MAX)
    }

    /// Rescaled to 0-100.
    pub fn normalized(&self) -> f64 {
        (self.0 * 100.0 / MI_MAX).clamp(0.0, 100.0)
    }

    pub fn level(&self) -> MaintainabilityLevel {
        MaintainabilityLevel::from_normalized(self.normalized())
    }
}

impl Default for MaintainabilityIndex {
    fn default() -> Self {
        calculate_maintainability(0.0, 1, 0)
    }
}

impl fmt::Display for MaintainabilityIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.clamped())
    }
}

/// Bands on the normalized scale: 20 and above is good, below 10 is poor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintainabilityLevel {
    Good,
    Moderate,
    Poor,
}

impl MaintainabilityLevel {
    pub fn from_normalized(score: f64) -> Self {
        if score >= 20.0 {
            Self::Good
        } else if score >= 10.0 {
            Self::Moderate
        } else {
            Self::Poor
        }
    }
}

pub fn calculate_maintainability(volume: f64, cyclomatic: u32, loc: usize) -> MaintainabilityIndex {
    let ln_volume = volume.max(1.0).ln();
    let ln_loc = (loc as f64).max(1.0).ln();
    MaintainabilityIndex(MI_MAX - 5.2 * ln_volume - 0.23 * f64::from(cyclomatic) - 16.2 * ln_loc)
}

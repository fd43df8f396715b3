pub mod combine;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Mul;

use crate::constants::DEFAULT_CONFIDENCE;

/// Confidence score clamped to [0.0, 1.0].
/// Represents how reliable the system believes a node to be.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Confidence(f64);

impl Confidence {
    /// High confidence threshold.
    pub const HIGH: f64 = 0.8;
    /// Neutral: no evidence either way.
    pub const NEUTRAL: f64 = DEFAULT_CONFIDENCE;
    /// Low confidence threshold.
    pub const LOW: f64 = 0.3;

    /// Create a new Confidence, clamping to [0.0, 1.0]. NaN becomes neutral.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(Self::NEUTRAL);
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Get the raw f64 value.
    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_high(self) -> bool {
        self.0 >= Self::HIGH
    }

    pub fn is_low(self) -> bool {
        self.0 < Self::LOW
    }

    /// Complement: confidence that the node is wrong.
    pub fn complement(self) -> Self {
        Self(1.0 - self.0)
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self(Self::NEUTRAL)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

impl From<f64> for Confidence {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

impl Mul for Confidence {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(self.0 * rhs.0)
    }
}

impl Mul<f64> for Confidence {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.0 * rhs)
    }
}

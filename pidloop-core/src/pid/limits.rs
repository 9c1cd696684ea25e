//! Output clamp bounds.

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Inclusive output range `[min, max]` with `min < max`.
///
/// The only way to obtain a value is [`OutputLimits::new`] (or the default
/// `[0, 255]`), so an inverted or empty range cannot exist.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLimits", into = "RawLimits")]
pub struct OutputLimits {
    min: f64,
    max: f64,
}

impl OutputLimits {
    /// Build a range, rejecting `min >= max` and NaN bounds.
    pub fn new(
        min: f64,
        max: f64,
    ) -> Result<Self, ConfigError> {
        // `!(min < max)` also catches NaN on either side.
        if !(min < max) {
            return Err(ConfigError::InvalidOutputLimits);
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Clamp `value` into the range.
    #[inline]
    pub fn clamp(
        &self,
        value: f64,
    ) -> f64 {
        if value > self.max {
            self.max
        } else if value < self.min {
            self.min
        } else {
            value
        }
    }

    /// Whether `value` lies inside the range (bounds included).
    pub fn contains(
        &self,
        value: f64,
    ) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Default for OutputLimits {
    /// `[0, 255]`, an 8-bit PWM duty range.
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 255.0,
        }
    }
}

/// Unchecked wire form, validated on the way in.
#[derive(Serialize, Deserialize)]
struct RawLimits {
    min: f64,
    max: f64,
}

impl TryFrom<RawLimits> for OutputLimits {
    type Error = ConfigError;

    fn try_from(raw: RawLimits) -> Result<Self, Self::Error> {
        OutputLimits::new(raw.min, raw.max)
    }
}

impl From<OutputLimits> for RawLimits {
    fn from(limits: OutputLimits) -> Self {
        RawLimits {
            min: limits.min,
            max: limits.max,
        }
    }
}

//! Configuration errors reported by the controller setters.
//!
//! Every rejected call leaves the controller exactly as it was before the call.

use core::fmt;

/// Reasons a configuration change can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// One of `kp`, `ki`, `kd` was below zero.
    NegativeGain,
    /// One of `kp`, `ki`, `kd` was NaN or infinite.
    NonFiniteGain,
    /// A sample time of zero milliseconds was requested.
    ZeroSampleTime,
    /// Output limits with `min >= max`, or a NaN bound.
    InvalidOutputLimits,
}

impl fmt::Display for ConfigError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ConfigError::NegativeGain => f.write_str("tuning gains must not be negative"),
            ConfigError::NonFiniteGain => f.write_str("tuning gains must be finite"),
            ConfigError::ZeroSampleTime => f.write_str("sample time must be greater than zero"),
            ConfigError::InvalidOutputLimits => {
                f.write_str("output limits require min < max")
            }
        }
    }
}

impl core::error::Error for ConfigError {}

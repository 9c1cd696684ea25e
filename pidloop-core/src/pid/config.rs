//! Declarative controller configuration.
//!
//! A [`PidConfig`] captures everything a controller needs besides its process
//! variables, and deserializes from JSON (or any other serde format):
//!
//! ```json
//! { "tunings": { "kp": 2.0, "ki": 5.0, "kd": 1.0 },
//!   "direction": "reverse", "mode": "automatic",
//!   "sample_time_ms": 50, "output_limits": { "min": -100.0, "max": 100.0 } }
//! ```
//!
//! Every field except `tunings` is optional.

use serde::{Deserialize, Serialize};

use super::{
    controller::PidController,
    error::ConfigError,
    limits::OutputLimits,
    mode::Mode,
    process::ProcessVars,
    sampler::DEFAULT_SAMPLE_TIME_MS,
    tuning::{Direction, Tunings},
};

fn default_sample_time_ms() -> u32 {
    DEFAULT_SAMPLE_TIME_MS
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidConfig {
    pub tunings: Tunings,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default = "default_sample_time_ms")]
    pub sample_time_ms: u32,
    #[serde(default)]
    pub output_limits: OutputLimits,
}

impl PidConfig {
    /// Config with the given tunings and every other field at its default.
    pub fn new(tunings: Tunings) -> Self {
        Self {
            tunings,
            direction: Direction::default(),
            mode: Mode::default(),
            sample_time_ms: DEFAULT_SAMPLE_TIME_MS,
            output_limits: OutputLimits::default(),
        }
    }

    /// Check the config without building a controller.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tunings.validate()?;
        if self.sample_time_ms == 0 {
            return Err(ConfigError::ZeroSampleTime);
        }
        Ok(())
    }
}

impl<'a> PidController<'a> {
    /// Build a controller from `config`.
    ///
    /// Applies direction and tunings at the default sample time, then the
    /// configured sample time, output limits, and finally the mode, so
    /// entering `Automatic` performs the usual bumpless initialization
    /// against the limited output.
    pub fn from_config(
        vars: ProcessVars<'a>,
        config: &PidConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut pid = PidController::new(vars, config.tunings, config.direction)?;
        pid.set_sample_time(config.sample_time_ms)?;
        let limits = config.output_limits;
        pid.set_output_limits(limits.min(), limits.max())?;
        pid.set_mode(config.mode);
        Ok(pid)
    }
}

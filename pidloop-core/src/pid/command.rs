//! Runtime reconfiguration commands.
//!
//! [`PidCommand`] mirrors the controller setters so a host can queue
//! configuration changes (from a script, a serial console, a socket) and
//! apply them between ticks. Serialized as JSON with tag `"pc"`:
//!
//! ```json
//! { "pc": "tunings", "kp": 1.5, "ki": 0.2, "kd": 0.0 }
//! { "pc": "mode", "mode": "automatic" }
//! ```

use serde::{Deserialize, Serialize};

use super::{controller::PidController, error::ConfigError, mode::Mode, tuning::Direction};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pc", rename_all = "snake_case")] // pc = pid command
pub enum PidCommand {
    /// Replace the tunings.
    Tunings { kp: f64, ki: f64, kd: f64 },
    /// Change the sample period in milliseconds.
    SampleTime { ms: u32 },
    /// Switch operating mode.
    Mode { mode: Mode },
    /// Switch controller action.
    Direction { direction: Direction },
    /// Change the output clamp range.
    Limits { min: f64, max: f64 },
}

/// What an accepted command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// State changed.
    Applied,
    /// The requested mode or direction was already active.
    Unchanged,
}

impl From<bool> for CommandOutcome {
    fn from(changed: bool) -> Self {
        if changed {
            CommandOutcome::Applied
        } else {
            CommandOutcome::Unchanged
        }
    }
}

impl PidController<'_> {
    /// Dispatch `command` to the matching setter.
    pub fn apply(
        &mut self,
        command: PidCommand,
    ) -> Result<CommandOutcome, ConfigError> {
        tracing::debug!(?command, "applying pid command");
        match command {
            PidCommand::Tunings { kp, ki, kd } => {
                self.set_tunings(kp, ki, kd)?;
                Ok(CommandOutcome::Applied)
            }
            PidCommand::SampleTime { ms } => {
                self.set_sample_time(ms)?;
                Ok(CommandOutcome::Applied)
            }
            PidCommand::Mode { mode } => Ok(self.set_mode(mode).into()),
            PidCommand::Direction { direction } => Ok(self.set_direction(direction).into()),
            PidCommand::Limits { min, max } => {
                self.set_output_limits(min, max)?;
                Ok(CommandOutcome::Applied)
            }
        }
    }
}

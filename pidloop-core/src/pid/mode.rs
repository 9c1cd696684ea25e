//! Operating mode.

use serde::{Deserialize, Serialize};

/// Whether the controller drives the output.
///
/// In `Manual` the update step does nothing and whoever else holds the
/// actuator owns the output value. `Automatic` runs the PID math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Manual,
    Automatic,
}

impl Mode {
    pub fn is_automatic(self) -> bool {
        matches!(self, Mode::Automatic)
    }
}

//! PID controller and its supporting types.
//!
//! - `controller`: the controller, its update step and setters
//! - `sampler`: sample-time gating over a wrapping millisecond clock
//! - `tuning`: display tunings, direction, and normalized gains
//! - `limits`: output clamp range
//! - `mode`: manual/automatic operation
//! - `process`: borrowed handles to the caller's process variables
//! - `config`: serde-friendly initial configuration
//! - `command`: runtime reconfiguration commands
//! - `error`: configuration rejection reasons

pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod limits;
pub mod mode;
pub mod process;
pub mod sampler;
pub mod tuning;

pub use command::{CommandOutcome, PidCommand};
pub use config::PidConfig;
pub use controller::{PidController, PidStatus, PidTerms};
pub use error::ConfigError;
pub use limits::OutputLimits;
pub use mode::Mode;
pub use process::ProcessVars;
#[cfg(feature = "embassy")]
pub use sampler::EmbassyClock;
pub use sampler::{Clock, Sampler, DEFAULT_SAMPLE_TIME_MS};
pub use tuning::{Direction, InternalGains, Tunings};

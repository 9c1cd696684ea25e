//! Borrowed process variables.
//!
//! The caller owns the measurement, output, and setpoint storage. The
//! controller only holds shared borrows of three `Cell`s, so the caller can
//! keep writing the measurement and setpoint and reading the output between
//! ticks while the controller is alive.

use core::cell::Cell;

/// Handles to the three caller-owned scalars.
#[derive(Debug, Clone, Copy)]
pub struct ProcessVars<'a> {
    input: &'a Cell<f64>,
    output: &'a Cell<f64>,
    setpoint: &'a Cell<f64>,
}

impl<'a> ProcessVars<'a> {
    pub fn new(
        input: &'a Cell<f64>,
        output: &'a Cell<f64>,
        setpoint: &'a Cell<f64>,
    ) -> Self {
        Self {
            input,
            output,
            setpoint,
        }
    }

    /// Current measurement.
    pub fn input(&self) -> f64 {
        self.input.get()
    }

    /// Last written (or manually held) output.
    pub fn output(&self) -> f64 {
        self.output.get()
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint.get()
    }

    pub(crate) fn write_output(
        &self,
        value: f64,
    ) {
        self.output.set(value);
    }
}

//! The PID controller.
//!
//! [`PidController`] owns all controller state and borrows the caller's
//! process variables. It is driven by calling [`PidController::compute`] once
//! per loop iteration; the configuration setters may be called between ticks.
//!
//! # Example
//! ```rust
//! use core::cell::Cell;
//! use pidloop_core::pid::{Direction, Mode, PidController, ProcessVars, Tunings};
//!
//! let (input, output, setpoint) = (Cell::new(20.0), Cell::new(0.0), Cell::new(25.0));
//! let vars = ProcessVars::new(&input, &output, &setpoint);
//! let mut pid = PidController::new(vars, Tunings::new(2.0, 5.0, 1.0), Direction::Direct).unwrap();
//! pid.set_mode(Mode::Automatic);
//! assert!(pid.compute(0));
//! assert!(output.get() > 0.0);
//! ```

use serde::Serialize;

use super::{
    error::ConfigError,
    limits::OutputLimits,
    mode::Mode,
    process::ProcessVars,
    sampler::{Clock, Sampler},
    tuning::{Direction, InternalGains, Tunings},
};

/// Individual contributions of the most recent update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PidTerms {
    /// `setpoint - input`.
    pub error: f64,
    /// Proportional contribution.
    pub p: f64,
    /// Integral term after anti-windup clamping.
    pub i: f64,
    /// Derivative-on-measurement contribution (already signed).
    pub d: f64,
    /// Clamped output written to the output cell.
    pub output: f64,
}

/// Read-only snapshot of the controller, suitable for a front-end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PidStatus {
    pub mode: Mode,
    pub direction: Direction,
    pub tunings: Tunings,
    pub sample_time_ms: u32,
    pub output_limits: OutputLimits,
    pub input: f64,
    pub setpoint: f64,
    pub output: f64,
    pub integral: f64,
    /// Counter value of the most recent update, `None` before the first one.
    pub last_update_ms: Option<u32>,
    pub last_terms: Option<PidTerms>,
}

/// Discrete PID controller bound to three caller-owned process variables.
///
/// Invariants held across every operation:
/// - the output limits satisfy `min < max`,
/// - the integral term lies within the output limits after each update,
/// - the sample time is non-zero,
/// - the display tunings are finite and non-negative.
#[derive(Debug)]
pub struct PidController<'a> {
    vars: ProcessVars<'a>,
    disp: Tunings,
    gains: InternalGains,
    direction: Direction,
    mode: Mode,
    sampler: Sampler,
    limits: OutputLimits,
    integral: f64,
    last_input: f64,
    last_terms: Option<PidTerms>,
}

impl<'a> PidController<'a> {
    /// Create a controller in `Manual` mode with output limits `[0, 255]` and
    /// a 100 ms sample time.
    ///
    /// Fails if any gain is negative or non-finite.
    pub fn new(
        vars: ProcessVars<'a>,
        tunings: Tunings,
        direction: Direction,
    ) -> Result<Self, ConfigError> {
        tunings.validate()?;
        let sampler = Sampler::default();
        let gains = InternalGains::normalize(&tunings, sampler.sample_time_ms(), direction);
        Ok(Self {
            vars,
            disp: tunings,
            gains,
            direction,
            mode: Mode::Manual,
            sampler,
            limits: OutputLimits::default(),
            integral: 0.0,
            last_input: vars.input(),
            last_terms: None,
        })
    }

    /// Run one PID update at `now_ms` if the controller is in `Automatic` and
    /// at least one sample period has elapsed since the previous update.
    ///
    /// Returns `true` when an update ran and the output cell was written. A
    /// NaN or infinite measurement or setpoint skips the tick and leaves every
    /// piece of state untouched.
    pub fn compute(
        &mut self,
        now_ms: u32,
    ) -> bool {
        if !self.mode.is_automatic() || !self.sampler.is_due(now_ms) {
            return false;
        }

        let input = self.vars.input();
        let setpoint = self.vars.setpoint();
        if !input.is_finite() || !setpoint.is_finite() {
            tracing::warn!(now_ms, input, setpoint, "skipping update on non-finite process value");
            return false;
        }
        let error = setpoint - input;

        // Anti-windup: the integral alone is bounded to the output range.
        self.integral = self.limits.clamp(self.integral + self.gains.ki * error);

        // Derivative on measurement, so setpoint steps do not kick the output.
        // No usable history (non-finite input at seeding time): restart it here.
        let d_input = if self.last_input.is_finite() {
            input - self.last_input
        } else {
            0.0
        };

        let p = self.gains.kp * error;
        let d = -self.gains.kd * d_input;
        let output = self.limits.clamp(p + self.integral + d);

        self.vars.write_output(output);
        self.last_input = input;
        self.sampler.mark(now_ms);
        self.last_terms = Some(PidTerms {
            error,
            p,
            i: self.integral,
            d,
            output,
        });

        tracing::trace!(now_ms, error, p, i = self.integral, d, output, "pid update");
        true
    }

    /// Read `clock` once and run [`compute`](Self::compute).
    pub fn compute_with<C: Clock + ?Sized>(
        &mut self,
        clock: &C,
    ) -> bool {
        self.compute(clock.now_ms())
    }

    /// Switch between `Manual` and `Automatic`.
    ///
    /// Entering `Automatic` from `Manual` seeds the integral term with the
    /// current output and the derivative history with the current input, so
    /// the first automatic update continues from wherever the output was
    /// left. Returns `true` if the mode changed.
    pub fn set_mode(
        &mut self,
        mode: Mode,
    ) -> bool {
        if mode == self.mode {
            return false;
        }
        if mode.is_automatic() {
            self.initialize();
        }
        tracing::info!(from = ?self.mode, to = ?mode, "pid mode change");
        self.mode = mode;
        true
    }

    fn initialize(&mut self) {
        let output = self.vars.output();
        let seed = if output.is_finite() { output } else { 0.0 };
        self.integral = self.limits.clamp(seed);
        self.last_input = self.vars.input();
    }

    /// Replace the tunings.
    ///
    /// Integral and derivative gains are normalized to the sample time in
    /// effect right now. On error the previous tunings stay in place.
    pub fn set_tunings(
        &mut self,
        kp: f64,
        ki: f64,
        kd: f64,
    ) -> Result<(), ConfigError> {
        let tunings = Tunings::new(kp, ki, kd);
        if let Err(error) = tunings.validate() {
            tracing::warn!(%error, kp, ki, kd, "rejected tunings");
            return Err(error);
        }
        self.disp = tunings;
        self.gains =
            InternalGains::normalize(&tunings, self.sampler.sample_time_ms(), self.direction);
        tracing::debug!(kp, ki, kd, gains = ?self.gains, "tunings set");
        Ok(())
    }

    /// Change the sample period, rescaling the already-normalized integral and
    /// derivative gains by `new / old`. The display tunings are unaffected.
    pub fn set_sample_time(
        &mut self,
        sample_time_ms: u32,
    ) -> Result<(), ConfigError> {
        let old = match self.sampler.set_sample_time(sample_time_ms) {
            Ok(old) => old,
            Err(error) => {
                tracing::warn!(%error, sample_time_ms, "rejected sample time");
                return Err(error);
            }
        };
        self.gains.rescale(old, sample_time_ms);
        tracing::debug!(old, new = sample_time_ms, gains = ?self.gains, "sample time set");
        Ok(())
    }

    /// Change the controller action. Flips the sign of the internal gains once
    /// when the direction actually changes; returns whether it did.
    pub fn set_direction(
        &mut self,
        direction: Direction,
    ) -> bool {
        if direction == self.direction {
            return false;
        }
        self.gains.negate();
        tracing::info!(from = ?self.direction, to = ?direction, "pid direction change");
        self.direction = direction;
        true
    }

    /// Change the output clamp range and immediately pull the current output
    /// and integral term into it.
    pub fn set_output_limits(
        &mut self,
        min: f64,
        max: f64,
    ) -> Result<(), ConfigError> {
        let limits = match OutputLimits::new(min, max) {
            Ok(limits) => limits,
            Err(error) => {
                tracing::warn!(%error, min, max, "rejected output limits");
                return Err(error);
            }
        };
        self.limits = limits;
        self.vars.write_output(limits.clamp(self.vars.output()));
        self.integral = limits.clamp(self.integral);
        tracing::debug!(min, max, "output limits set");
        Ok(())
    }

    /// Proportional gain as entered.
    pub fn kp(&self) -> f64 {
        self.disp.kp
    }

    /// Integral gain as entered.
    pub fn ki(&self) -> f64 {
        self.disp.ki
    }

    /// Derivative gain as entered.
    pub fn kd(&self) -> f64 {
        self.disp.kd
    }

    pub fn tunings(&self) -> Tunings {
        self.disp
    }

    /// Gains the update step uses: normalized to the sample period and signed
    /// by direction.
    pub fn internal_gains(&self) -> InternalGains {
        self.gains
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn sample_time_ms(&self) -> u32 {
        self.sampler.sample_time_ms()
    }

    pub fn output_limits(&self) -> OutputLimits {
        self.limits
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Terms of the most recent update, `None` before the first one.
    pub fn last_terms(&self) -> Option<PidTerms> {
        self.last_terms
    }

    pub fn status(&self) -> PidStatus {
        PidStatus {
            mode: self.mode,
            direction: self.direction,
            tunings: self.disp,
            sample_time_ms: self.sampler.sample_time_ms(),
            output_limits: self.limits,
            input: self.vars.input(),
            setpoint: self.vars.setpoint(),
            output: self.vars.output(),
            integral: self.integral,
            last_update_ms: self.sampler.last_time(),
            last_terms: self.last_terms,
        }
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;

    fn cells(
        input: f64,
        output: f64,
        setpoint: f64,
    ) -> (Cell<f64>, Cell<f64>, Cell<f64>) {
        (Cell::new(input), Cell::new(output), Cell::new(setpoint))
    }

    #[test]
    fn starts_in_manual_with_defaults() {
        let (i, o, s) = cells(0.0, 0.0, 0.0);
        let pid = PidController::new(
            ProcessVars::new(&i, &o, &s),
            Tunings::new(1.0, 0.0, 0.0),
            Direction::Direct,
        )
        .unwrap();
        assert_eq!(pid.mode(), Mode::Manual);
        assert_eq!(pid.sample_time_ms(), 100);
        assert_eq!(pid.output_limits(), OutputLimits::default());
        assert!(pid.last_terms().is_none());
    }

    #[test]
    fn new_rejects_negative_gain() {
        let (i, o, s) = cells(0.0, 0.0, 0.0);
        let err = PidController::new(
            ProcessVars::new(&i, &o, &s),
            Tunings::new(1.0, -0.1, 0.0),
            Direction::Direct,
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::NegativeGain);
    }

    #[test]
    fn manual_mode_never_computes() {
        let (i, o, s) = cells(0.0, 7.0, 100.0);
        let mut pid = PidController::new(
            ProcessVars::new(&i, &o, &s),
            Tunings::new(1.0, 1.0, 0.0),
            Direction::Direct,
        )
        .unwrap();
        assert!(!pid.compute(0));
        assert!(!pid.compute(10_000));
        assert_eq!(o.get(), 7.0);
    }

    #[test]
    fn proportional_only_step() {
        let (i, o, s) = cells(10.0, 0.0, 15.0);
        let mut pid = PidController::new(
            ProcessVars::new(&i, &o, &s),
            Tunings::new(4.0, 0.0, 0.0),
            Direction::Direct,
        )
        .unwrap();
        pid.set_mode(Mode::Automatic);
        assert!(pid.compute(0));
        assert_eq!(o.get(), 20.0);
        let terms = pid.last_terms().unwrap();
        assert_eq!(terms.error, 5.0);
        assert_eq!(terms.p, 20.0);
        assert_eq!(terms.i, 0.0);
    }

    #[test]
    fn derivative_acts_on_measurement_not_setpoint() {
        let (i, o, s) = cells(50.0, 100.0, 50.0);
        let mut pid = PidController::new(
            ProcessVars::new(&i, &o, &s),
            Tunings::new(0.0, 0.0, 1.0),
            Direction::Direct,
        )
        .unwrap();
        pid.set_mode(Mode::Automatic);
        assert!(pid.compute(0));
        // Setpoint step: no derivative kick.
        s.set(80.0);
        assert!(pid.compute(100));
        assert_eq!(pid.last_terms().unwrap().d, 0.0);
        // Measurement rises by 2 over one 100 ms period: kd_internal = 10.
        i.set(52.0);
        assert!(pid.compute(200));
        assert!((pid.last_terms().unwrap().d + 20.0).abs() < 1e-9);
    }

    #[test]
    fn output_limit_change_clamps_integral_and_output() {
        let (i, o, s) = cells(0.0, 200.0, 0.0);
        let mut pid = PidController::new(
            ProcessVars::new(&i, &o, &s),
            Tunings::new(1.0, 1.0, 0.0),
            Direction::Direct,
        )
        .unwrap();
        pid.set_mode(Mode::Automatic);
        assert_eq!(pid.integral(), 200.0);
        pid.set_output_limits(0.0, 50.0).unwrap();
        assert_eq!(o.get(), 50.0);
        assert_eq!(pid.integral(), 50.0);
    }

    #[test]
    fn raising_min_limit_pulls_integral_and_output_up() {
        let (i, o, s) = cells(0.0, 10.0, 0.0);
        let mut pid = PidController::new(
            ProcessVars::new(&i, &o, &s),
            Tunings::new(1.0, 1.0, 0.0),
            Direction::Direct,
        )
        .unwrap();
        pid.set_mode(Mode::Automatic);
        assert_eq!(pid.integral(), 10.0);
        pid.set_output_limits(40.0, 100.0).unwrap();
        assert_eq!(o.get(), 40.0);
        assert_eq!(pid.integral(), 40.0);
        assert!(pid.compute(0));
        assert_eq!(o.get(), 40.0);
    }

    #[test]
    fn status_reflects_state() {
        let (i, o, s) = cells(1.0, 2.0, 3.0);
        let mut pid = PidController::new(
            ProcessVars::new(&i, &o, &s),
            Tunings::new(2.0, 5.0, 1.0),
            Direction::Reverse,
        )
        .unwrap();
        pid.set_sample_time(50).unwrap();
        let status = pid.status();
        assert_eq!(status.direction, Direction::Reverse);
        assert_eq!(status.tunings, Tunings::new(2.0, 5.0, 1.0));
        assert_eq!(status.sample_time_ms, 50);
        assert_eq!((status.input, status.output, status.setpoint), (1.0, 2.0, 3.0));
        assert_eq!(status.last_update_ms, None);

        pid.set_mode(Mode::Automatic);
        assert!(pid.compute(1_234));
        assert!(!pid.compute(1_250));
        assert_eq!(pid.status().last_update_ms, Some(1_234));
    }
}

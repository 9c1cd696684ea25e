//! Gain handling: display tunings, controller direction, and the
//! sample-time-normalized gains the update step actually uses.
//!
//! The integral and derivative gains are folded together with the sample
//! period once, when they are set, so the per-tick math needs no division.
//! A later sample-time change rescales the folded gains by the ratio of the
//! new to the old period instead of recomputing them from the display values.

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Controller action.
///
/// `Direct`: a positive error (setpoint above measurement) raises the output.
/// `Reverse`: a positive error lowers it, e.g. a cooler driven by temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Direct,
    Reverse,
}

impl Direction {
    /// Multiplier applied to every internal gain.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Direct => 1.0,
            Direction::Reverse => -1.0,
        }
    }
}

/// Gains exactly as the caller entered them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Tunings {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl Tunings {
    pub fn new(
        kp: f64,
        ki: f64,
        kd: f64,
    ) -> Self {
        Self { kp, ki, kd }
    }

    /// Check that every gain is finite and non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let gains = [self.kp, self.ki, self.kd];
        if gains.iter().any(|g| !g.is_finite()) {
            return Err(ConfigError::NonFiniteGain);
        }
        if gains.iter().any(|g| *g < 0.0) {
            return Err(ConfigError::NegativeGain);
        }
        Ok(())
    }
}

/// Gains normalized to the sample period and signed by direction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InternalGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl InternalGains {
    /// Fold display tunings with a sample period (ms) and a direction.
    pub fn normalize(
        tunings: &Tunings,
        sample_time_ms: u32,
        direction: Direction,
    ) -> Self {
        let sample_time_s = f64::from(sample_time_ms) / 1000.0;
        let sign = direction.sign();
        Self {
            kp: sign * tunings.kp,
            ki: sign * tunings.ki * sample_time_s,
            kd: sign * tunings.kd / sample_time_s,
        }
    }

    /// Re-fold for a new sample period: `ki` scales with the period, `kd`
    /// inversely.
    pub fn rescale(
        &mut self,
        old_ms: u32,
        new_ms: u32,
    ) {
        let ratio = f64::from(new_ms) / f64::from(old_ms);
        self.ki *= ratio;
        self.kd /= ratio;
    }

    /// Flip the sign of all three gains.
    pub fn negate(&mut self) {
        self.kp = -self.kp;
        self.ki = -self.ki;
        self.kd = -self.kd;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(
        a: f64,
        b: f64,
    ) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn normalize_folds_sample_period() {
        let g = InternalGains::normalize(&Tunings::new(2.0, 5.0, 1.0), 100, Direction::Direct);
        assert!(close(g.kp, 2.0));
        assert!(close(g.ki, 0.5));
        assert!(close(g.kd, 10.0));
    }

    #[test]
    fn reverse_negates_every_gain() {
        let g = InternalGains::normalize(&Tunings::new(2.0, 5.0, 1.0), 100, Direction::Reverse);
        assert!(close(g.kp, -2.0));
        assert!(close(g.ki, -0.5));
        assert!(close(g.kd, -10.0));
    }

    #[test]
    fn rescale_halving_period() {
        let mut g = InternalGains::normalize(&Tunings::new(2.0, 5.0, 1.0), 100, Direction::Direct);
        g.rescale(100, 50);
        assert!(close(g.kp, 2.0));
        assert!(close(g.ki, 0.25));
        assert!(close(g.kd, 20.0));
    }

    #[test]
    fn validate_rejects_bad_gains() {
        assert_eq!(Tunings::new(-1.0, 0.0, 0.0).validate(), Err(ConfigError::NegativeGain));
        assert_eq!(
            Tunings::new(1.0, f64::INFINITY, 0.0).validate(),
            Err(ConfigError::NonFiniteGain)
        );
        assert_eq!(Tunings::new(0.0, 0.0, 0.0).validate(), Ok(()));
    }
}

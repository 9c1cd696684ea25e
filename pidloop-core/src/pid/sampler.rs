//! Sample-time gating.
//!
//! Callers may poll the controller far more often than the control period.
//! The [`Sampler`] decides which polls actually run the update, using a free
//! running `u32` millisecond counter that is allowed to wrap.

use super::error::ConfigError;

/// Default control period in milliseconds.
pub const DEFAULT_SAMPLE_TIME_MS: u32 = 100;

/// Monotonic millisecond counter. Wrapping past `u32::MAX` back to zero is
/// the only permitted decrease.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

impl<F> Clock for F
where
    F: Fn() -> u32,
{
    fn now_ms(&self) -> u32 {
        self()
    }
}

/// Clock backed by the embassy time driver, truncated to the `u32` counter
/// width.
#[cfg(feature = "embassy")]
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

#[cfg(feature = "embassy")]
impl Clock for EmbassyClock {
    fn now_ms(&self) -> u32 {
        embassy_time::Instant::now().as_millis() as u32
    }
}

/// Milliseconds from `earlier` to `now` on a wrapping `u32` counter.
#[inline]
pub fn elapsed_ms(
    now: u32,
    earlier: u32,
) -> u32 {
    now.wrapping_sub(earlier)
}

/// Tracks the control period and when the last update ran.
#[derive(Debug, Clone, Copy)]
pub struct Sampler {
    sample_time_ms: u32,
    last_time: Option<u32>,
}

impl Sampler {
    pub fn new(sample_time_ms: u32) -> Result<Self, ConfigError> {
        if sample_time_ms == 0 {
            return Err(ConfigError::ZeroSampleTime);
        }
        Ok(Self {
            sample_time_ms,
            last_time: None,
        })
    }

    pub fn sample_time_ms(&self) -> u32 {
        self.sample_time_ms
    }

    pub fn last_time(&self) -> Option<u32> {
        self.last_time
    }

    /// True when no update has run yet or a full period has elapsed since the
    /// last one.
    pub fn is_due(
        &self,
        now: u32,
    ) -> bool {
        match self.last_time {
            None => true,
            Some(last) => elapsed_ms(now, last) >= self.sample_time_ms,
        }
    }

    /// Record that an update ran at `now`.
    pub fn mark(
        &mut self,
        now: u32,
    ) {
        self.last_time = Some(now);
    }

    /// Change the period, returning the previous one.
    pub fn set_sample_time(
        &mut self,
        sample_time_ms: u32,
    ) -> Result<u32, ConfigError> {
        if sample_time_ms == 0 {
            return Err(ConfigError::ZeroSampleTime);
        }
        let old = self.sample_time_ms;
        self.sample_time_ms = sample_time_ms;
        Ok(old)
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            sample_time_ms: DEFAULT_SAMPLE_TIME_MS,
            last_time: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_poll_is_always_due() {
        let s = Sampler::default();
        assert!(s.is_due(0));
        assert!(s.is_due(u32::MAX));
    }

    #[test]
    fn gates_until_period_elapses() {
        let mut s = Sampler::new(100).unwrap();
        s.mark(1_000);
        assert!(!s.is_due(1_050));
        assert!(!s.is_due(1_099));
        assert!(s.is_due(1_100));
    }

    #[test]
    fn counter_wraparound_is_measured_modulo() {
        let mut s = Sampler::new(100).unwrap();
        s.mark(u32::MAX - 40);
        // 41 ms to wrap plus 30 more.
        assert_eq!(elapsed_ms(30, u32::MAX - 40), 71);
        assert!(!s.is_due(30));
        assert!(s.is_due(59));
    }

    #[test]
    fn zero_period_is_rejected() {
        assert_eq!(Sampler::new(0).unwrap_err(), ConfigError::ZeroSampleTime);
        let mut s = Sampler::default();
        assert_eq!(s.set_sample_time(0), Err(ConfigError::ZeroSampleTime));
        assert_eq!(s.sample_time_ms(), DEFAULT_SAMPLE_TIME_MS);
        assert_eq!(s.set_sample_time(50), Ok(100));
    }

    #[test]
    fn closures_are_clocks() {
        let clock = || 42u32;
        assert_eq!(clock.now_ms(), 42);
    }
}

use std::fmt;
use std::ops::{Add, AddAssign};
use std::time::Duration;

/// A point in simulated time, counted in microseconds since run start.
///
/// Configuration values are seconds; the microsecond tick keeps event
/// ordering exact where `f64` seconds would not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimTime(u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    pub fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    pub fn from_secs_f64(secs: f64) -> Self {
        if secs <= 0.0 {
            return Self::ZERO;
        }
        Self((secs * 1_000_000.0) as u64)
    }

    pub fn as_micros(self) -> u64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Time elapsed since `earlier`, zero if `earlier` is in the future.
    pub fn since(self, earlier: SimTime) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for SimTime {
    type Output = SimTime;

    fn add(self, delay: Duration) -> SimTime {
        SimTime(self.0.saturating_add(delay.as_micros() as u64))
    }
}

impl AddAssign<Duration> for SimTime {
    fn add_assign(&mut self, delay: Duration) {
        *self = *self + delay;
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}s", self.as_secs_f64())
    }
}

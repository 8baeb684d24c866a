use serde::Serialize;
use std::num::ParseIntError;
use std::str::FromStr;

/// Seconds since 1970-01-01T00:00:00Z, as used by `exp`, `iat` and `nbf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NumericDate(i64);

impl NumericDate {
    /// Folds negative values to their absolute value, saturating at `i64::MAX`.
    pub fn from_secs(secs: i64) -> Self {
        NumericDate(secs.saturating_abs())
    }

    pub fn as_secs(self) -> i64 {
        self.0
    }
}

impl FromStr for NumericDate {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(NumericDate::from_secs)
    }
}

/// Source of the default `iat`.
pub trait Clock {
    fn now(&self) -> NumericDate;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NumericDate {
        NumericDate::from_secs(chrono::Utc::now().timestamp())
    }
}

#[cfg(test)]
pub struct FixedClock(pub NumericDate);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> NumericDate {
        self.0
    }
}

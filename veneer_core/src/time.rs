// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time in microseconds.
//!
//! [`HostTime`] is what a [`Platform`](crate::runtime::Platform) reports from
//! its clock (`performance.now()` on the web). Trace events carry it so phase
//! durations can be derived without a second clock read.

use core::fmt;
use core::ops::{Add, Sub};

/// A point in time in microseconds since an arbitrary platform origin.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Returns the raw microsecond value.
    #[inline]
    #[must_use]
    pub const fn micros(self) -> u64 {
        self.0
    }

    /// Converts a millisecond timestamp (as produced by `performance.now()`).
    ///
    /// Negative and NaN inputs map to zero.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "millisecond timestamps are small positive f64; µs fits in u64"
    )]
    pub fn from_millis_f64(ms: f64) -> Self {
        if ms.is_nan() || ms <= 0.0 {
            return Self(0);
        }
        Self((ms * 1000.0) as u64)
    }

    /// Returns the duration since an earlier time, or zero if `earlier` is
    /// later than `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({}µs)", self.0)
    }
}

/// A span of time in microseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// The zero duration.
    pub const ZERO: Self = Self(0);

    /// Returns the raw microsecond value.
    #[inline]
    #[must_use]
    pub const fn micros(self) -> u64 {
        self.0
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for HostTime {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.saturating_duration_since(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_convert_to_micros() {
        assert_eq!(HostTime::from_millis_f64(16.5), HostTime(16_500), "ms scale by 1000");
        assert_eq!(HostTime::from_millis_f64(-3.0), HostTime(0), "negative clamps to zero");
        assert_eq!(HostTime::from_millis_f64(f64::NAN), HostTime(0), "NaN clamps to zero");
    }

    #[test]
    fn subtraction_saturates() {
        let a = HostTime(100);
        let b = HostTime(250);
        assert_eq!(b - a, Duration(150), "later minus earlier");
        assert_eq!(a - b, Duration::ZERO, "earlier minus later saturates");
        assert_eq!(a + Duration(5), HostTime(105), "adding a duration");
    }
}

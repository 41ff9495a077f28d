//! Timestamp and time base handling.
//!
//! Raw packet timing is an integer tick count that only has meaning together
//! with the owning stream's time base. A stream's time base is fixed when the
//! stream is declared and never changes.

use crate::rational::Rational;
use std::cmp::Ordering;
use std::fmt;

/// A time base for converting between timestamp units.
///
/// Common time bases:
/// - 1/90000 for MPEG-TS
/// - 1/1000 for milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeBase(pub Rational);

impl TimeBase {
    /// Create a new time base from numerator and denominator.
    pub fn new(num: i64, den: i64) -> Self {
        Self(Rational::new(num, den))
    }

    /// Standard MPEG time base (1/90000).
    pub const MPEG: Self = Self(Rational { num: 1, den: 90000 });

    /// Millisecond time base (1/1000).
    pub const MILLISECONDS: Self = Self(Rational { num: 1, den: 1000 });

    /// Convert a tick count from this time base to another.
    ///
    /// Rounds to the nearest destination tick, ties away from zero.
    pub fn convert(&self, value: i64, target: TimeBase) -> i64 {
        self.0.rescale(value, target.0)
    }

    /// Convert a tick count to seconds as f64.
    pub fn to_seconds(&self, value: i64) -> f64 {
        value as f64 * self.0.to_f64()
    }

    /// Get the time base as a rational.
    pub fn as_rational(&self) -> Rational {
        self.0
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::MPEG
    }
}

impl From<(i32, i32)> for TimeBase {
    fn from((num, den): (i32, i32)) -> Self {
        Self::new(num as i64, den as i64)
    }
}

impl From<Rational> for TimeBase {
    fn from(r: Rational) -> Self {
        Self(r)
    }
}

/// A timestamp with an associated time base.
///
/// The sentinel [`Timestamp::NONE`] value means "no timestamp present"; it is
/// distinct from any valid tick count, including 0, and passes through
/// rescaling untouched.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp {
    /// The raw tick count.
    pub value: i64,
    /// The time base for interpreting the value.
    pub time_base: TimeBase,
}

impl Timestamp {
    /// Value representing an unset timestamp.
    pub const NONE: i64 = i64::MIN;

    /// Create a new timestamp.
    pub fn new(value: i64, time_base: TimeBase) -> Self {
        Self { value, time_base }
    }

    /// Create an unset timestamp.
    pub fn none() -> Self {
        Self {
            value: Self::NONE,
            time_base: TimeBase::default(),
        }
    }

    /// Check if this timestamp is set.
    pub fn is_valid(&self) -> bool {
        self.value != Self::NONE
    }

    /// Convert to a different time base.
    ///
    /// An unset timestamp stays unset.
    pub fn rescale(&self, target: TimeBase) -> Self {
        if !self.is_valid() {
            return Self {
                value: Self::NONE,
                time_base: target,
            };
        }
        Self {
            value: self.time_base.convert(self.value, target),
            time_base: target,
        }
    }

    /// Convert to seconds.
    pub fn to_seconds(&self) -> Option<f64> {
        if self.is_valid() {
            Some(self.time_base.to_seconds(self.value))
        } else {
            None
        }
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::none()
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        if !self.is_valid() || !other.is_valid() {
            return !self.is_valid() && !other.is_valid();
        }
        // Compare in the higher precision time base.
        let tb = if self.time_base.0.den > other.time_base.0.den {
            self.time_base
        } else {
            other.time_base
        };
        self.rescale(tb).value == other.rescale(tb).value
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        if !self.is_valid() {
            return if !other.is_valid() {
                Ordering::Equal
            } else {
                Ordering::Less
            };
        }
        if !other.is_valid() {
            return Ordering::Greater;
        }

        let tb = if self.time_base.0.den > other.time_base.0.den {
            self.time_base
        } else {
            other.time_base
        };
        self.rescale(tb).value.cmp(&other.rescale(tb).value)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "NOPTS")
        }
    }
}

/// A duration with an associated time base.
///
/// Unlike [`Timestamp`], a duration has no unset sentinel; an absent duration
/// is simply zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration {
    /// The raw tick count.
    pub value: i64,
    /// The time base for interpreting the value.
    pub time_base: TimeBase,
}

impl Duration {
    /// Create a new duration.
    pub fn new(value: i64, time_base: TimeBase) -> Self {
        Self { value, time_base }
    }

    /// Create a zero duration.
    pub fn zero() -> Self {
        Self {
            value: 0,
            time_base: TimeBase::default(),
        }
    }

    /// Check if this duration is zero.
    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Convert to a different time base.
    pub fn rescale(&self, target: TimeBase) -> Self {
        Self {
            value: self.time_base.convert(self.value, target),
            time_base: target,
        }
    }

    /// Convert to seconds.
    pub fn to_seconds(&self) -> f64 {
        self.time_base.to_seconds(self.value)
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_base_convert() {
        let millis = TimeBase::new(1, 1000);
        let mpeg = TimeBase::new(1, 90000);

        // 1000ms = 90000 in MPEG time base
        assert_eq!(millis.convert(1000, mpeg), 90000);
        assert_eq!(mpeg.convert(90000, millis), 1000);
    }

    #[test]
    fn test_none_passes_through_rescale() {
        let ts = Timestamp::none();
        let rescaled = ts.rescale(TimeBase::MILLISECONDS);
        assert!(!rescaled.is_valid());
        assert_eq!(rescaled.time_base, TimeBase::MILLISECONDS);
    }

    #[test]
    fn test_zero_is_valid() {
        // 0 is a real timestamp, distinct from the unset sentinel.
        let ts = Timestamp::new(0, TimeBase::MPEG);
        assert!(ts.is_valid());
    }

    #[test]
    fn test_timestamp_comparison_across_time_bases() {
        let ts1 = Timestamp::new(90000, TimeBase::MPEG);
        let ts2 = Timestamp::new(1000, TimeBase::MILLISECONDS);
        assert_eq!(ts1, ts2);
        assert!(Timestamp::new(90001, TimeBase::MPEG) > ts2);
    }

    #[test]
    fn test_unset_sorts_before_everything() {
        assert!(Timestamp::none() < Timestamp::new(i64::MIN + 1, TimeBase::MPEG));
    }

    #[test]
    fn test_duration_rescale() {
        let d = Duration::new(3000, TimeBase::MPEG);
        assert_eq!(d.rescale(TimeBase::MILLISECONDS).value, 33);
    }

    #[test]
    fn test_timestamp_display() {
        assert_eq!(format!("{}", Timestamp::new(1500, TimeBase::MPEG)), "1500");
        assert_eq!(format!("{}", Timestamp::none()), "NOPTS");
    }
}

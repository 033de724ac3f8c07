use std::{
    fmt,
    iter::Sum,
    ops::{Add, Neg, Sub},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Signed amount of time represented as **integer hundredths of an hour**.
///
/// Use this type for **all** time-bank values in the engine (balances,
/// durations, rates, rewards) to avoid floating-point drift.
///
/// # Examples
///
/// ```rust
/// use engine::Hours;
///
/// let amount = Hours::new(1_50);
/// assert_eq!(amount.minor(), 150);
/// assert_eq!(amount.to_string(), "1.50h");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects >
/// 2 decimals):
///
/// ```rust
/// use engine::Hours;
///
/// assert_eq!("2".parse::<Hours>().unwrap().minor(), 200);
/// assert_eq!("0,5".parse::<Hours>().unwrap().minor(), 50);
/// assert!("1.125".parse::<Hours>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Hours(i64);

impl Hours {
    pub const ZERO: Hours = Hours(0);
    /// Smallest bookable unit (half an hour).
    pub const HALF: Hours = Hours(50);

    /// Creates a new amount from hundredths of an hour.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Creates a new amount from whole hours.
    #[must_use]
    pub const fn whole(hours: i64) -> Self {
        Self(hours * 100)
    }

    /// Returns the raw value in hundredths of an hour.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Hours) -> Option<Hours> {
        self.0.checked_add(rhs.0).map(Hours)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Hours) -> Option<Hours> {
        self.0.checked_sub(rhs.0).map(Hours)
    }

    /// Addition that fails with `InvalidAmount` instead of overflowing.
    pub fn try_add(self, rhs: Hours) -> Result<Hours, EngineError> {
        self.checked_add(rhs).ok_or_else(out_of_range)
    }

    /// Subtraction that fails with `InvalidAmount` instead of overflowing.
    pub fn try_sub(self, rhs: Hours) -> Result<Hours, EngineError> {
        self.checked_sub(rhs).ok_or_else(out_of_range)
    }

    /// Converts a decimal number of hours, rounding to the nearest hundredth.
    pub fn from_f64(value: f64) -> Result<Self, EngineError> {
        if !value.is_finite() {
            return Err(EngineError::InvalidAmount(
                "hours must be a finite number".to_string(),
            ));
        }
        let minor = (value * 100.0).round();
        if minor.abs() > i64::MAX as f64 / 2.0 {
            return Err(EngineError::InvalidAmount("amount too large".to_string()));
        }
        Ok(Self(minor as i64))
    }

    /// Returns the amount as a decimal number of hours.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

fn out_of_range() -> EngineError {
    EngineError::InvalidAmount("amount out of range".to_string())
}

impl fmt::Display for Hours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}h", abs / 100, abs % 100)
    }
}

impl From<Hours> for i64 {
    fn from(value: Hours) -> Self {
        value.0
    }
}

impl Add for Hours {
    type Output = Hours;

    fn add(self, rhs: Hours) -> Self::Output {
        Hours(self.0 + rhs.0)
    }
}

impl Sub for Hours {
    type Output = Hours;

    fn sub(self, rhs: Hours) -> Self::Output {
        Hours(self.0 - rhs.0)
    }
}

impl Neg for Hours {
    type Output = Hours;

    fn neg(self) -> Self::Output {
        Hours(-self.0)
    }
}

impl Sum for Hours {
    fn sum<I: Iterator<Item = Hours>>(iter: I) -> Self {
        iter.fold(Hours::ZERO, Add::add)
    }
}

impl FromStr for Hours {
    type Err = EngineError;

    /// Parses a decimal string into hundredths of an hour.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount("invalid amount".to_string());
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let rest = rest.trim();
        if rest.is_empty() {
            return Err(empty());
        }

        let rest = rest.replace(',', ".");
        let (whole_str, frac_str) = match rest.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (rest.as_str(), ""),
        };

        if whole_str.is_empty() || !whole_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if !frac_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: i64 = whole_str.parse().map_err(|_| invalid())?;
        let frac: i64 = match frac_str.len() {
            0 => 0,
            1 => frac_str.parse::<i64>().map_err(|_| invalid())? * 10,
            2 => frac_str.parse::<i64>().map_err(|_| invalid())?,
            _ => return Err(EngineError::InvalidAmount("too many decimals".to_string())),
        };

        let total = whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(overflow)?;

        Ok(Hours(if negative { -total } else { total }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_hours() {
        assert_eq!(Hours::new(0).to_string(), "0.00h");
        assert_eq!(Hours::new(50).to_string(), "0.50h");
        assert_eq!(Hours::whole(10).to_string(), "10.00h");
        assert_eq!(Hours::new(-125).to_string(), "-1.25h");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("1".parse::<Hours>().unwrap(), Hours::whole(1));
        assert_eq!("1.5".parse::<Hours>().unwrap(), Hours::new(150));
        assert_eq!("0,25".parse::<Hours>().unwrap(), Hours::new(25));
        assert_eq!("-0.5".parse::<Hours>().unwrap(), -Hours::HALF);
        assert!("".parse::<Hours>().is_err());
        assert!("1.2.3".parse::<Hours>().is_err());
        assert!("0.001".parse::<Hours>().is_err());
    }

    #[test]
    fn from_f64_rounds_to_hundredths() {
        assert_eq!(Hours::from_f64(2.0).unwrap(), Hours::whole(2));
        assert_eq!(Hours::from_f64(0.333).unwrap(), Hours::new(33));
        assert_eq!(Hours::from_f64(1.005).unwrap().as_f64(), 1.0);
        assert!(Hours::from_f64(f64::NAN).is_err());
        assert!(Hours::from_f64(f64::INFINITY).is_err());
    }

    #[test]
    fn try_add_reports_overflow() {
        let big = Hours::new(i64::MAX - 10);
        assert_eq!(big.try_add(Hours::new(10)).unwrap(), Hours::new(i64::MAX));
        assert!(matches!(
            big.try_add(Hours::new(11)),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(Hours::new(i64::MIN).try_sub(Hours::new(1)).is_err());
    }
}

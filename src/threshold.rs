//! Inclusive pass/fail ranges shared by every metric.

use std::fmt;

use thiserror::Error;

/// Errors raised while building or validating a threshold range.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThresholdError {
    #[error("threshold bounds must be numbers")]
    NotANumber,

    #[error("minimum {min} is greater than maximum {max}")]
    Inverted { min: f64, max: f64 },

    #[error("{metric} thresholds must lie within [{lo}, {hi}], got [{min}, {max}]")]
    OutOfDomain {
        metric: &'static str,
        min: f64,
        max: f64,
        lo: f64,
        hi: f64,
    },
}

/// An inclusive range `[min, max]`; `max` may be `+inf` for a one-sided gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdRange {
    min: f64,
    max: f64,
}

impl ThresholdRange {
    /// Builds `[min, max]`.
    pub fn new(min: f64, max: f64) -> Result<Self, ThresholdError> {
        if min.is_nan() || max.is_nan() {
            return Err(ThresholdError::NotANumber);
        }
        if min > max {
            return Err(ThresholdError::Inverted { min, max });
        }
        Ok(Self { min, max })
    }

    /// Builds the one-sided range `[min, +inf)`.
    pub fn at_least(min: f64) -> Result<Self, ThresholdError> {
        Self::new(min, f64::INFINITY)
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn is_one_sided(&self) -> bool {
        self.max == f64::INFINITY
    }

    /// Checks that the range fits inside a metric's domain `[lo, hi]`.
    ///
    /// For one-sided ranges only the minimum is checked.
    pub fn check_domain(
        &self,
        metric: &'static str,
        (lo, hi): (f64, f64),
    ) -> Result<(), ThresholdError> {
        let max_ok = self.is_one_sided() || self.max <= hi;
        if self.min < lo || self.min > hi || !max_ok {
            return Err(ThresholdError::OutOfDomain {
                metric,
                min: self.min,
                max: self.max,
                lo,
                hi,
            });
        }
        Ok(())
    }

    /// Returns true if `value` lies within the range.
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

impl fmt::Display for ThresholdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_one_sided() {
            write!(f, "[{}, inf)", self.min)
        } else {
            write!(f, "[{}, {}]", self.min, self.max)
        }
    }
}

/// The gate: an undefined value always fails.
pub fn passes(value: Option<f64>, range: &ThresholdRange) -> bool {
    value.is_some_and(|v| range.contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inclusive_bounds() {
        let range = ThresholdRange::new(0.1, 0.8).unwrap();
        assert!(passes(Some(0.1), &range));
        assert!(passes(Some(0.8), &range));
        assert!(passes(Some(0.5), &range));
        assert!(!passes(Some(0.09), &range));
        assert!(!passes(Some(0.81), &range));
    }

    #[test]
    fn test_undefined_never_passes() {
        let range = ThresholdRange::new(0.0, 1.0).unwrap();
        assert!(!passes(None, &range));
        assert!(!passes(None, &ThresholdRange::at_least(0.0).unwrap()));
    }

    #[test]
    fn test_nan_value_fails() {
        let range = ThresholdRange::new(0.0, 1.0).unwrap();
        assert!(!passes(Some(f64::NAN), &range));
    }

    #[test]
    fn test_one_sided() {
        let range = ThresholdRange::at_least(0.05).unwrap();
        assert!(range.is_one_sided());
        assert!(passes(Some(1e9), &range));
        assert!(!passes(Some(0.0), &range));
        assert_eq!(range.to_string(), "[0.05, inf)");
    }

    #[test]
    fn test_invalid_ranges() {
        assert_eq!(
            ThresholdRange::new(0.8, 0.1),
            Err(ThresholdError::Inverted { min: 0.8, max: 0.1 })
        );
        assert_eq!(ThresholdRange::new(f64::NAN, 1.0), Err(ThresholdError::NotANumber));
    }

    #[test]
    fn test_domain_check() {
        let unit = (0.0, 1.0);
        assert!(ThresholdRange::new(0.0, 1.0).unwrap().check_domain("rate", unit).is_ok());
        assert!(ThresholdRange::new(-0.1, 0.5).unwrap().check_domain("rate", unit).is_err());
        assert!(ThresholdRange::new(0.2, 1.5).unwrap().check_domain("rate", unit).is_err());
        assert!(ThresholdRange::at_least(0.5).unwrap().check_domain("rate", unit).is_ok());
        assert!(ThresholdRange::at_least(1.5).unwrap().check_domain("rate", unit).is_err());
    }
}

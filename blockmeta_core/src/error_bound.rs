use serde::{Deserialize, Serialize};

use crate::error::{MetaError, Result};

/// The absolute error bound together with its precomputed companions.
///
/// `ebx2 = 2 * eb`, `eb_r = 1 / eb`, `ebx2_r = 1 / ebx2`. The only way to get
/// one is [`ErrorBound::new`] (or [`ErrorBound::relative`], which delegates),
/// so the four values can never drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ErrorBoundRepr")]
pub struct ErrorBound {
    eb: f64,
    ebx2: f64,
    eb_r: f64,
    ebx2_r: f64,
}

// Deserialization re-derives the companions from `eb`.
#[derive(Deserialize)]
struct ErrorBoundRepr {
    eb: f64,
}

impl TryFrom<ErrorBoundRepr> for ErrorBound {
    type Error = MetaError;

    fn try_from(repr: ErrorBoundRepr) -> Result<Self> {
        Self::new(repr.eb)
    }
}

impl ErrorBound {
    pub fn new(eb: f64) -> Result<Self> {
        if !eb.is_finite() || eb <= 0.0 {
            return Err(MetaError::InvalidErrorBound(eb));
        }
        let ebx2 = eb * 2.0;
        let derived = Self {
            eb,
            ebx2,
            eb_r: 1.0 / eb,
            ebx2_r: 1.0 / ebx2,
        };
        // subnormal bounds overflow the reciprocal
        if !derived.eb_r.is_finite() || !derived.ebx2.is_finite() {
            return Err(MetaError::InvalidErrorBound(eb));
        }
        Ok(derived)
    }

    /// Range-relative bound: `fraction` of the data's value `range`.
    pub fn relative(fraction: f64, range: f64) -> Result<Self> {
        if !range.is_finite() || range <= 0.0 {
            return Err(MetaError::InvalidRange(range));
        }
        if !fraction.is_finite() || fraction <= 0.0 {
            return Err(MetaError::InvalidErrorBound(fraction));
        }
        Self::new(fraction * range)
    }

    #[inline]
    pub fn eb(&self) -> f64 {
        self.eb
    }

    #[inline]
    pub fn ebx2(&self) -> f64 {
        self.ebx2
    }

    #[inline]
    pub fn eb_r(&self) -> f64 {
        self.eb_r
    }

    #[inline]
    pub fn ebx2_r(&self) -> f64 {
        self.ebx2_r
    }
}

/// `max - min` over the finite values of `data`, or `None` when there are none.
pub fn value_range(data: &[f32]) -> Option<f64> {
    let mut finite = data.iter().copied().filter(|v| v.is_finite());
    let first = finite.next()? as f64;
    let (lo, hi) = finite.fold((first, first), |(lo, hi), v| {
        let v = v as f64;
        (lo.min(v), hi.max(v))
    });
    Some(hi - lo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_tuple_for_0_01() {
        let eb = ErrorBound::new(0.01).unwrap();
        assert_eq!(eb.eb(), 0.01);
        assert!((eb.ebx2() - 0.02).abs() < 1e-15);
        assert!((eb.eb_r() - 100.0).abs() < 1e-9);
        assert!((eb.ebx2_r() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_positive_and_non_finite() {
        for bad in [0.0, -1e-3, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                ErrorBound::new(bad),
                Err(MetaError::InvalidErrorBound(_))
            ));
        }
        assert!(matches!(
            ErrorBound::new(f64::MAX),
            Err(MetaError::InvalidErrorBound(_))
        ));
    }

    #[test]
    fn relative_matches_absolute() {
        let rel = ErrorBound::relative(1e-4, 250.0).unwrap();
        let abs = ErrorBound::new(1e-4 * 250.0).unwrap();
        assert_eq!(rel, abs);
    }

    #[test]
    fn relative_rejects_bad_range() {
        assert_eq!(
            ErrorBound::relative(1e-3, 0.0),
            Err(MetaError::InvalidRange(0.0))
        );
        assert_eq!(
            ErrorBound::relative(1e-3, -2.0),
            Err(MetaError::InvalidRange(-2.0))
        );
        assert_eq!(
            ErrorBound::relative(-1e-3, 2.0),
            Err(MetaError::InvalidErrorBound(-1e-3))
        );
    }

    #[test]
    fn range_of_samples() {
        assert_eq!(value_range(&[]), None);
        assert_eq!(value_range(&[f32::NAN]), None);
        assert_eq!(value_range(&[3.0]), Some(0.0));
        assert_eq!(value_range(&[1.0, -2.0, f32::INFINITY, 5.0]), Some(7.0));
    }
}

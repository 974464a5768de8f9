use serde::{Deserialize, Serialize};

use crate::error::{MetaError, Result};

/// Default number of quantization bins.
pub const DEFAULT_BIN_NUM: i64 = 1024;

/// Quantization code space: `cap` codes, symmetric around the central bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuantConfigRepr")]
pub struct QuantConfig {
    cap: u32,
    radius: u32,
}

#[derive(Deserialize)]
struct QuantConfigRepr {
    cap: i64,
}

impl TryFrom<QuantConfigRepr> for QuantConfig {
    type Error = MetaError;

    fn try_from(repr: QuantConfigRepr) -> Result<Self> {
        Self::new(repr.cap)
    }
}

impl QuantConfig {
    /// `n` must be positive and even so that `radius = n / 2` is exact.
    pub fn new(n: i64) -> Result<Self> {
        if n <= 0 || n % 2 != 0 || n > u32::MAX as i64 {
            return Err(MetaError::InvalidBinCount(n));
        }
        let cap = n as u32;
        Ok(Self {
            cap,
            radius: cap / 2,
        })
    }

    #[inline]
    pub fn cap(&self) -> u32 {
        self.cap
    }

    #[inline]
    pub fn radius(&self) -> u32 {
        self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bins_1024() {
        let q = QuantConfig::new(1024).unwrap();
        assert_eq!(q.cap(), 1024);
        assert_eq!(q.radius(), 512);
    }

    #[test]
    fn odd_or_non_positive_rejected() {
        for bad in [3, 1, 0, -2, -1024] {
            assert_eq!(QuantConfig::new(bad), Err(MetaError::InvalidBinCount(bad)));
        }
    }

    #[test]
    fn smallest_valid() {
        let q = QuantConfig::new(2).unwrap();
        assert_eq!((q.cap(), q.radius()), (2, 1));
    }
}

//! Names of the pipeline choices a job is configured with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MetaError;

macro_rules! named_option {
    (
        $(#[$meta:meta])*
        $ty:ident, $kind:literal, default = $default:ident,
        { $($variant:ident => [$canonical:literal $(, $alias:literal)*]),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum $ty {
            $($variant),+
        }

        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $canonical),+
                }
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                $ty::$default
            }
        }

        impl FromStr for $ty {
            type Err = MetaError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($canonical $(| $alias)* => Ok($ty::$variant),)+
                    _ => Err(MetaError::UnknownOption {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $ty {
            type Error = MetaError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$ty> for String {
            fn from(v: $ty) -> String {
                v.as_str().to_string()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

named_option! {
    Predictor, "predictor", default = Lorenzo,
    { Lorenzo => ["lorenzo"], LorenzoII => ["lorenzoii"], Spline3 => ["spline3"] }
}

named_option! {
    /// How the user tolerance is interpreted: absolute units, or a fraction of
    /// the data's value range.
    ErrorMode, "error mode", default = R2r,
    { R2r => ["r2r", "rel"], Abs => ["abs"] }
}

named_option! {
    Dtype, "dtype", default = F32,
    { F32 => ["f32", "float"] }
}

named_option! {
    /// Outlier (sparse) storage scheme.
    SpReducer, "sparse reducer", default = Csr11,
    { Csr11 => ["csr11", "csr"], Spgs => ["spgs"] }
}

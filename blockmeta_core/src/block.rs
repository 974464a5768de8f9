use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MetaError;

/// Dimensionality selector of a compression job.
///
/// The wire codes are fixed: `1`, `2`, `3` for the isotropic layouts and
/// `0x101` / `0x201` for the two anisotropic 2D layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
#[repr(u32)]
pub enum DimCode {
    D1 = 1,
    D2AnisoA = 0x101,
    D2AnisoB = 0x201,
    D2 = 2,
    D3 = 3,
}

impl DimCode {
    pub const ALL: [DimCode; 5] = [
        DimCode::D1,
        DimCode::D2AnisoA,
        DimCode::D2AnisoB,
        DimCode::D2,
        DimCode::D3,
    ];

    /// Canonical per-axis block extent for this layout.
    pub const fn block(self) -> u32 {
        match self {
            DimCode::D1 => 256,
            DimCode::D2AnisoA => 128,
            DimCode::D2AnisoB => 64,
            DimCode::D2 => 16,
            DimCode::D3 => 8,
        }
    }

    #[inline]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Number of spatial axes the blocking logic walks.
    pub const fn spatial_axes(self) -> usize {
        match self {
            DimCode::D1 => 1,
            DimCode::D2AnisoA | DimCode::D2AnisoB | DimCode::D2 => 2,
            DimCode::D3 => 3,
        }
    }
}

impl TryFrom<u32> for DimCode {
    type Error = MetaError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(DimCode::D1),
            0x101 => Ok(DimCode::D2AnisoA),
            0x201 => Ok(DimCode::D2AnisoB),
            2 => Ok(DimCode::D2),
            3 => Ok(DimCode::D3),
            other => Err(MetaError::UnknownDimCode(other)),
        }
    }
}

impl From<DimCode> for u32 {
    fn from(d: DimCode) -> u32 {
        d.code()
    }
}

impl fmt::Display for DimCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DimCode::D1 => "1d",
            DimCode::D2AnisoA => "2d-aniso-a",
            DimCode::D2AnisoB => "2d-aniso-b",
            DimCode::D2 => "2d",
            DimCode::D3 => "3d",
        };
        f.write_str(label)
    }
}

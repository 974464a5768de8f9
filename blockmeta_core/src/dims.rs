use serde::{Deserialize, Serialize};

use crate::block::DimCode;
use crate::error::{MetaError, Result};
use crate::layout::npart;

/// Maximum number of axes a job can describe.
pub const MAX_AXES: usize = 4;

/// Derived geometry of a job: extents, strides, block counts and length.
///
/// Built only through [`Geometry::new`], so every field is consistent with
/// `ndim` and the extents. `nblocks[3]` is bookkeeping; the blocking logic
/// walks at most the first three axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GeometryRepr")]
pub struct Geometry {
    ndim: DimCode,
    block: u32,
    len: u64,
    dims: [u32; MAX_AXES],
    strides: [u64; MAX_AXES],
    nblocks: [u32; MAX_AXES],
}

#[derive(Deserialize)]
struct GeometryRepr {
    ndim: DimCode,
    dims: [i64; MAX_AXES],
}

impl TryFrom<GeometryRepr> for Geometry {
    type Error = MetaError;

    fn try_from(repr: GeometryRepr) -> Result<Self> {
        Self::new(&repr.dims, repr.ndim)
    }
}

impl Geometry {
    /// Compute the geometry for up to four extents. Missing trailing axes are 1.
    pub fn new(extents: &[i64], ndim: DimCode) -> Result<Self> {
        if extents.len() > MAX_AXES {
            return Err(MetaError::InvalidShapeLiteral(format!(
                "{} axes given, at most {} supported",
                extents.len(),
                MAX_AXES
            )));
        }

        let mut dims = [1u32; MAX_AXES];
        for (axis, &extent) in extents.iter().enumerate() {
            if extent < 1 {
                return Err(MetaError::InvalidShape { axis, extent });
            }
            if extent > u32::MAX as i64 {
                return Err(MetaError::ExtentTooLarge { axis, extent });
            }
            dims[axis] = extent as u32;
        }

        let block = ndim.block();

        let mut strides = [0u64; MAX_AXES];
        let mut running = 1u64;
        for axis in 0..MAX_AXES {
            strides[axis] = running;
            running = running
                .checked_mul(dims[axis] as u64)
                .ok_or(MetaError::ShapeOverflow { axis })?;
        }

        let mut nblocks = [0u32; MAX_AXES];
        for axis in 0..MAX_AXES {
            nblocks[axis] = npart(dims[axis] as u64, block as u64) as u32;
        }

        Ok(Self {
            ndim,
            block,
            len: running,
            dims,
            strides,
            nblocks,
        })
    }

    #[inline]
    pub fn ndim(&self) -> DimCode {
        self.ndim
    }

    #[inline]
    pub fn block(&self) -> u32 {
        self.block
    }

    /// Total element count, `d0 * d1 * d2 * d3`.
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn dims(&self) -> [u32; MAX_AXES] {
        self.dims
    }

    pub fn strides(&self) -> [u64; MAX_AXES] {
        self.strides
    }

    pub fn nblocks(&self) -> [u32; MAX_AXES] {
        self.nblocks
    }

    /// Blocks the predictor walks: product of `nb` over the spatial axes.
    pub fn total_blocks(&self) -> u64 {
        self.nblocks[..self.ndim.spatial_axes()]
            .iter()
            .map(|&n| n as u64)
            .product()
    }
}

/// Parse a shape literal such as `512x512x512` or `3600,1800`.
///
/// `x` wins when both delimiters appear. Signs are kept so that a negative
/// extent is reported by [`Geometry::new`] as an invalid shape rather than a
/// parse error.
pub fn parse_extents(literal: &str) -> Result<Vec<i64>> {
    let literal = literal.trim();
    let bad = || MetaError::InvalidShapeLiteral(literal.to_string());

    let delimiter = if literal.contains('x') {
        'x'
    } else if literal.contains(',') {
        ','
    } else {
        // a single extent, which must itself be a plain integer
        return literal.parse::<i64>().map(|v| vec![v]).map_err(|_| bad());
    };

    let extents = literal
        .split(delimiter)
        .map(|part| part.trim().parse::<i64>().map_err(|_| bad()))
        .collect::<Result<Vec<_>>>()?;

    if extents.is_empty() || extents.len() > MAX_AXES {
        return Err(bad());
    }
    Ok(extents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_dimensional_512() {
        let g = Geometry::new(&[512], DimCode::D1).unwrap();
        assert_eq!(g.block(), 256);
        assert_eq!(g.nblocks()[0], 2);
        assert_eq!(g.len(), 512);
        assert_eq!(g.strides()[0], 1);
        assert_eq!(g.dims(), [512, 1, 1, 1]);
    }

    #[test]
    fn two_dimensional_100_by_100() {
        let g = Geometry::new(&[100, 100], DimCode::D2).unwrap();
        assert_eq!(g.block(), 16);
        assert_eq!(g.nblocks()[0], 7);
        assert_eq!(g.nblocks()[1], 7);
        assert_eq!(g.len(), 10_000);
        assert_eq!(g.strides(), [1, 100, 10_000, 10_000]);
        assert_eq!(g.total_blocks(), 49);
    }

    #[test]
    fn anisotropic_layouts_keep_their_block() {
        let a = Geometry::new(&[1000, 10], DimCode::D2AnisoA).unwrap();
        let b = Geometry::new(&[1000, 10], DimCode::D2AnisoB).unwrap();
        assert_eq!(a.block(), 128);
        assert_eq!(a.nblocks()[..2], [8, 1]);
        assert_eq!(b.block(), 64);
        assert_eq!(b.nblocks()[..2], [16, 1]);
    }

    #[test]
    fn four_axes_and_nb3() {
        let g = Geometry::new(&[10, 20, 30, 40], DimCode::D3).unwrap();
        assert_eq!(g.len(), 240_000);
        assert_eq!(g.strides(), [1, 10, 200, 6000]);
        assert_eq!(g.nblocks(), [2, 3, 4, 5]);
        assert_eq!(g.total_blocks(), 24);
    }

    #[test]
    fn non_positive_extent_rejected() {
        assert_eq!(
            Geometry::new(&[-5], DimCode::D1),
            Err(MetaError::InvalidShape { axis: 0, extent: -5 })
        );
        assert_eq!(
            Geometry::new(&[4, 0], DimCode::D2),
            Err(MetaError::InvalidShape { axis: 1, extent: 0 })
        );
    }

    #[test]
    fn extent_above_u32_rejected() {
        let too_big = u32::MAX as i64 + 1;
        let err = Geometry::new(&[4, too_big], DimCode::D2).unwrap_err();
        assert_eq!(err, MetaError::ExtentTooLarge { axis: 1, extent: too_big });
        assert!(!err.to_string().contains(">= 1"));
    }

    #[test]
    fn element_count_overflow_is_an_error() {
        assert_eq!(
            Geometry::new(&[65536, 65536, 65536, 65536], DimCode::D3),
            Err(MetaError::ShapeOverflow { axis: 3 })
        );
        let max = u32::MAX as i64;
        assert_eq!(
            Geometry::new(&[max, max, max], DimCode::D3),
            Err(MetaError::ShapeOverflow { axis: 2 })
        );
    }

    #[test]
    fn largest_extents_are_exact() {
        let max = u32::MAX as i64;
        let g = Geometry::new(&[max, 2], DimCode::D2).unwrap();
        assert_eq!(g.len(), u32::MAX as u64 * 2);
        let m = u32::MAX as u64;
        assert_eq!(g.strides(), [1, m, m * 2, m * 2]);
        assert_eq!(g.nblocks()[0], npart(u32::MAX as u64, 16) as u32);

        // 2^32 * 2^16 * 2^15 stays just below 2^64
        let g = Geometry::new(&[max, 65536, 32768], DimCode::D3).unwrap();
        assert_eq!(g.len(), u32::MAX as u64 * 65536 * 32768);
    }

    #[test]
    fn too_many_axes_rejected() {
        assert!(matches!(
            Geometry::new(&[1, 2, 3, 4, 5], DimCode::D3),
            Err(MetaError::InvalidShapeLiteral(_))
        ));
    }

    #[test]
    fn parse_literals() {
        assert_eq!(parse_extents("512x512x512").unwrap(), vec![512, 512, 512]);
        assert_eq!(parse_extents("3600,1800").unwrap(), vec![3600, 1800]);
        assert_eq!(parse_extents(" 42 ").unwrap(), vec![42]);
        assert_eq!(parse_extents("-5").unwrap(), vec![-5]);
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", "512;512", "12x", "axb", "1x2x3x4x5", "1 2"] {
            assert!(
                matches!(parse_extents(bad), Err(MetaError::InvalidShapeLiteral(_))),
                "{bad:?} should not parse"
            );
        }
    }
}

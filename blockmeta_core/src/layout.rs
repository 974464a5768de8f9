//! Size arithmetic shared by the geometry model and the pipeline stages.

use std::mem::size_of;

/// Byte boundary device buffers are padded to.
pub const DEFAULT_ALIGN_NBYTE: usize = 128;

/// Expected ratio of outliers to elements when sizing sparse storage.
pub const DEFAULT_DENSITY: f64 = 0.05;

/// Number of `subsize` parts needed to cover `size` (ceil division).
#[inline]
pub const fn npart(size: u64, subsize: u64) -> u64 {
    (size + subsize - 1) / subsize
}

/// Side of the smallest square matrix holding `len` elements.
pub fn square_size(len: u64) -> u64 {
    let mut m = (len as f64).sqrt().ceil() as u64;
    // f64 sqrt can be off by one for very large inputs
    while m > 0 && (m - 1) * (m - 1) >= len {
        m -= 1;
    }
    while m * m < len {
        m += 1;
    }
    m
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    None,
    /// Pad to the next perfect square so 1D data can be viewed as 2D.
    SquareMatrix,
}

pub fn aligned_len(len: u64, align: Align) -> u64 {
    match align {
        Align::None => len,
        Align::SquareMatrix => {
            let m = square_size(len);
            m * m
        }
    }
}

/// Bytes for `len` elements of `T`, rounded up to [`DEFAULT_ALIGN_NBYTE`].
pub fn aligned_nbyte<T>(len: usize) -> usize {
    aligned_nbyte_at::<T>(len, DEFAULT_ALIGN_NBYTE)
}

pub fn aligned_nbyte_at<T>(len: usize, align: usize) -> usize {
    let nbyte = size_of::<T>() * len;
    if nbyte == 0 {
        return 0;
    }
    ((nbyte - 1) / align + 1) * align
}

/// Storage for `nnz` outliers in CSR form over the square view of `len`
/// elements. `T` is the value type, `M` the index type.
pub fn csr_nbyte<T, M>(len: u64, nnz: u64) -> u64 {
    let m = square_size(len);
    let idx = size_of::<M>() as u64;
    idx * (m + 1) + idx * nnz + size_of::<T>() as u64 * nnz
}

pub fn nnz_percentage(nnz: u64, len: u64) -> String {
    if len == 0 {
        return "(0.000000%)".to_string();
    }
    format!("({:.6}%)", nnz as f64 / len as f64 * 100.0)
}

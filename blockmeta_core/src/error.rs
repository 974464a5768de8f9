use thiserror::Error;

/// Configuration-time failures of the metadata model.
///
/// Every variant is a local, synchronous validation failure. A setter that
/// returns one of these has left the record exactly as it was.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetaError {
    #[error("invalid shape: extent {extent} on axis {axis} must be >= 1")]
    InvalidShape { axis: usize, extent: i64 },

    #[error("invalid shape: extent {extent} on axis {axis} exceeds the u32 extent limit")]
    ExtentTooLarge { axis: usize, extent: i64 },

    #[error("invalid shape: element count overflows u64 at axis {axis}")]
    ShapeOverflow { axis: usize },

    #[error("unknown dimensionality code {0:#x}")]
    UnknownDimCode(u32),

    #[error("unknown demo dataset '{0}'")]
    UnknownDatasetName(String),

    #[error("invalid error bound {0}: must be positive and finite")]
    InvalidErrorBound(f64),

    #[error("invalid value range {0}: must be positive and finite")]
    InvalidRange(f64),

    #[error("invalid quantization bin count {0}: must be positive and even")]
    InvalidBinCount(i64),

    #[error("invalid shape literal '{0}'")]
    InvalidShapeLiteral(String),

    #[error("unknown {kind} '{value}'")]
    UnknownOption { kind: &'static str, value: String },

    #[error("metadata is incomplete: {0} not configured")]
    Incomplete(&'static str),

    #[error("pipeline report already merged for this job")]
    ReportAlreadyMerged,

    #[error("quant code {code} at index {index} is outside the code space (cap {cap})")]
    CodeOutOfRange { index: usize, code: u16, cap: u32 },

    #[error("code count {got} does not match element count {expected}")]
    LengthMismatch { expected: u64, got: u64 },
}

pub type Result<T> = std::result::Result<T, MetaError>;

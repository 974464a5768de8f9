pub mod block;
pub mod codec;
pub mod config;
pub mod datasets;
pub mod dims;
pub mod error;
pub mod error_bound;
pub mod format;
pub mod layout;
pub mod metadata;
pub mod options;
pub mod quant;
pub mod stage;

pub use block::DimCode;
pub use codec::Codec;
pub use config::{JobConfig, ShapeSource};
pub use dims::{parse_extents, Geometry};
pub use error::MetaError;
pub use error_bound::{value_range, ErrorBound};
pub use metadata::{Metadata, PipelineReport};
pub use options::{Dtype, ErrorMode, Predictor, SpReducer};
pub use quant::QuantConfig;

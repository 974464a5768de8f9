use serde::{Deserialize, Serialize};

use crate::block::DimCode;
use crate::error::{MetaError, Result};
use crate::metadata::Metadata;
use crate::options::{Dtype, ErrorMode, Predictor, SpReducer};
use crate::quant::DEFAULT_BIN_NUM;

/// Where a job's shape comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeSource {
    Extents { extents: Vec<i64>, ndim: u32 },
    Dataset(String),
}

/// Everything needed to produce a complete [`Metadata`] for one job.
///
/// Deserializable from JSON, e.g.
///
/// ```json
/// { "shape": { "extents": { "extents": [3600, 1800], "ndim": 2 } },
///   "eb": 1e-4, "mode": "r2r", "range": 12.5 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    pub shape: ShapeSource,
    pub eb: f64,
    #[serde(default)]
    pub mode: ErrorMode,
    /// Value range of the data; required in `r2r` mode.
    #[serde(default)]
    pub range: Option<f64>,
    #[serde(default = "default_bins")]
    pub bins: i64,
    #[serde(default)]
    pub predictor: Predictor,
    #[serde(default)]
    pub spreducer: SpReducer,
    #[serde(default)]
    pub dtype: Dtype,
}

fn default_bins() -> i64 {
    DEFAULT_BIN_NUM
}

impl JobConfig {
    pub fn with_extents(extents: Vec<i64>, ndim: DimCode, eb: f64) -> Self {
        Self::new(
            ShapeSource::Extents {
                extents,
                ndim: ndim.code(),
            },
            eb,
        )
    }

    pub fn with_dataset(name: impl Into<String>, eb: f64) -> Self {
        Self::new(ShapeSource::Dataset(name.into()), eb)
    }

    fn new(shape: ShapeSource, eb: f64) -> Self {
        Self {
            shape,
            eb,
            mode: ErrorMode::default(),
            range: None,
            bins: DEFAULT_BIN_NUM,
            predictor: Predictor::default(),
            spreducer: SpReducer::default(),
            dtype: Dtype::default(),
        }
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Run every setter and return a record ready for hand-off.
    pub fn build(&self) -> Result<Metadata> {
        let mut meta = Metadata::new();
        match &self.shape {
            ShapeSource::Extents { extents, ndim } => meta.set_dimensions(extents, *ndim)?,
            ShapeSource::Dataset(name) => meta.set_demo_dimensions(name)?,
        }
        match self.mode {
            ErrorMode::Abs => meta.set_error_bound(self.eb)?,
            ErrorMode::R2r => {
                let range = self.range.ok_or(MetaError::InvalidRange(f64::NAN))?;
                meta.set_relative_error_bound(self.eb, range)?
            }
        }
        meta.set_quant_bin_num(self.bins)?;
        meta.ensure_complete()?;
        Ok(meta)
    }
}

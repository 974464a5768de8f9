use serde::{Deserialize, Serialize};

use crate::block::DimCode;
use crate::datasets;
use crate::dims::Geometry;
use crate::error::{MetaError, Result};
use crate::error_bound::ErrorBound;
use crate::quant::QuantConfig;

/// Counters produced by the pipeline after a job has run.
///
/// A stage hands one of these back by value once it has finished; it is
/// installed into the host record with [`Metadata::merge_report`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Elements outside the quantizable range.
    pub nnz: u64,
    pub total_bits: u64,
    pub total_uint: u64,
    pub huff_metadata_size: u64,
}

/// Per-job configuration record shared with the compression pipeline.
///
/// Geometry, error bound and quantization are independent field groups; each
/// setter validates its input first and replaces only its own group, so a
/// failed call leaves the record unchanged. Accessors for a group that has
/// not been configured yet return the zero-state values (extents and `len`
/// read as 1, everything else as 0).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    geometry: Option<Geometry>,
    error_bound: Option<ErrorBound>,
    quant: Option<QuantConfig>,
    report: PipelineReport,
    report_merged: bool,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    // ── setters ────────────────────────────────────────────────────────────

    /// Set the extents (up to four, trailing axes default to 1) and the
    /// dimensionality code, deriving block size, strides, block counts and
    /// length.
    pub fn set_dimensions(&mut self, extents: &[i64], ndim: u32) -> Result<()> {
        let ndim = DimCode::try_from(ndim)?;
        self.geometry = Some(Geometry::new(extents, ndim)?);
        Ok(())
    }

    /// Same as [`set_dimensions`](Self::set_dimensions) with the extents and
    /// layout of a named demo dataset.
    pub fn set_demo_dimensions(&mut self, name: &str) -> Result<()> {
        let demo = datasets::lookup(name)?;
        self.set_dimensions(&demo.extents, demo.ndim.code())
    }

    pub fn set_error_bound(&mut self, eb: f64) -> Result<()> {
        self.error_bound = Some(ErrorBound::new(eb)?);
        Ok(())
    }

    /// Interpret `fraction` relative to the data's value `range`. Replaces any
    /// previously set bound.
    pub fn set_relative_error_bound(&mut self, fraction: f64, range: f64) -> Result<()> {
        self.error_bound = Some(ErrorBound::relative(fraction, range)?);
        Ok(())
    }

    pub fn set_quant_bin_num(&mut self, n: i64) -> Result<()> {
        self.quant = Some(QuantConfig::new(n)?);
        Ok(())
    }

    // ── hand-off and write-back ────────────────────────────────────────────

    /// Fail unless every input group is configured. Callers must pass this
    /// check before handing the record to a pipeline stage.
    pub fn ensure_complete(&self) -> Result<()> {
        if self.geometry.is_none() {
            return Err(MetaError::Incomplete("dimensions"));
        }
        if self.error_bound.is_none() {
            return Err(MetaError::Incomplete("error bound"));
        }
        if self.quant.is_none() {
            return Err(MetaError::Incomplete("quantization bins"));
        }
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.ensure_complete().is_ok()
    }

    /// Install the counters a finished stage produced.
    ///
    /// This is the synchronization point between the pipeline and the host:
    /// the report arrives by value after the stage completed, and it can be
    /// merged once per job.
    pub fn merge_report(&mut self, report: PipelineReport) -> Result<()> {
        if self.report_merged {
            return Err(MetaError::ReportAlreadyMerged);
        }
        self.report = report;
        self.report_merged = true;
        Ok(())
    }

    /// Zero the counters so the record can be reused for another job.
    pub fn reset_report(&mut self) {
        self.report = PipelineReport::default();
        self.report_merged = false;
    }

    pub fn report_merged(&self) -> bool {
        self.report_merged
    }

    pub fn report(&self) -> &PipelineReport {
        &self.report
    }

    // ── field groups ───────────────────────────────────────────────────────

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn error_bound(&self) -> Option<&ErrorBound> {
        self.error_bound.as_ref()
    }

    pub fn quant(&self) -> Option<&QuantConfig> {
        self.quant.as_ref()
    }

    // ── flat accessors ─────────────────────────────────────────────────────

    pub fn ndim(&self) -> Option<DimCode> {
        self.geometry.map(|g| g.ndim())
    }

    pub fn block(&self) -> u32 {
        self.geometry.map_or(0, |g| g.block())
    }

    pub fn len(&self) -> u64 {
        self.geometry.map_or(1, |g| g.len())
    }

    fn dim(&self, axis: usize) -> u32 {
        self.geometry.map_or(1, |g| g.dims()[axis])
    }

    fn stride(&self, axis: usize) -> u64 {
        self.geometry.map_or(0, |g| g.strides()[axis])
    }

    fn nb(&self, axis: usize) -> u32 {
        self.geometry.map_or(0, |g| g.nblocks()[axis])
    }

    pub fn d0(&self) -> u32 {
        self.dim(0)
    }
    pub fn d1(&self) -> u32 {
        self.dim(1)
    }
    pub fn d2(&self) -> u32 {
        self.dim(2)
    }
    pub fn d3(&self) -> u32 {
        self.dim(3)
    }

    pub fn stride0(&self) -> u64 {
        self.stride(0)
    }
    pub fn stride1(&self) -> u64 {
        self.stride(1)
    }
    pub fn stride2(&self) -> u64 {
        self.stride(2)
    }
    pub fn stride3(&self) -> u64 {
        self.stride(3)
    }

    pub fn nb0(&self) -> u32 {
        self.nb(0)
    }
    pub fn nb1(&self) -> u32 {
        self.nb(1)
    }
    pub fn nb2(&self) -> u32 {
        self.nb(2)
    }
    /// Computed like the others but not used for blocking.
    pub fn nb3(&self) -> u32 {
        self.nb(3)
    }

    pub fn cap(&self) -> u32 {
        self.quant.map_or(0, |q| q.cap())
    }

    pub fn radius(&self) -> u32 {
        self.quant.map_or(0, |q| q.radius())
    }

    pub fn eb(&self) -> f64 {
        self.error_bound.map_or(0.0, |e| e.eb())
    }

    pub fn ebx2(&self) -> f64 {
        self.error_bound.map_or(0.0, |e| e.ebx2())
    }

    pub fn eb_r(&self) -> f64 {
        self.error_bound.map_or(0.0, |e| e.eb_r())
    }

    pub fn ebx2_r(&self) -> f64 {
        self.error_bound.map_or(0.0, |e| e.ebx2_r())
    }

    pub fn nnz(&self) -> u64 {
        self.report.nnz
    }

    pub fn total_bits(&self) -> u64 {
        self.report.total_bits
    }

    pub fn total_uint(&self) -> u64 {
        self.report.total_uint
    }

    pub fn huff_metadata_size(&self) -> u64 {
        self.report.huff_metadata_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_record_reads_zero_state() {
        let m = Metadata::new();
        assert_eq!(m.len(), 1);
        assert_eq!((m.d0(), m.d1(), m.d2(), m.d3()), (1, 1, 1, 1));
        assert_eq!(m.block(), 0);
        assert_eq!(m.ndim(), None);
        assert_eq!((m.cap(), m.radius()), (0, 0));
        assert_eq!(m.eb(), 0.0);
        assert_eq!(*m.report(), PipelineReport::default());
        assert!(!m.report_merged());
    }

    #[test]
    fn set_dimensions_populates_geometry() {
        let mut m = Metadata::new();
        m.set_dimensions(&[100, 100], 2).unwrap();
        assert_eq!(m.ndim(), Some(DimCode::D2));
        assert_eq!(m.block(), 16);
        assert_eq!((m.nb0(), m.nb1(), m.nb2(), m.nb3()), (7, 7, 1, 1));
        assert_eq!(m.len(), 10_000);
        assert_eq!((m.stride0(), m.stride1(), m.stride2()), (1, 100, 10_000));
    }

    #[test]
    fn anisotropic_codes() {
        let mut m = Metadata::new();
        m.set_dimensions(&[256, 8], 0x101).unwrap();
        assert_eq!(m.block(), 128);
        m.set_dimensions(&[256, 8], 0x201).unwrap();
        assert_eq!(m.block(), 64);
        assert_eq!(m.nb0(), 4);
    }

    #[test]
    fn failed_setter_leaves_record_untouched() {
        let mut m = Metadata::new();
        m.set_dimensions(&[512], 1).unwrap();
        m.set_error_bound(0.5).unwrap();
        m.set_quant_bin_num(64).unwrap();
        let before = m.clone();

        assert_eq!(
            m.set_dimensions(&[-5], 1),
            Err(MetaError::InvalidShape { axis: 0, extent: -5 })
        );
        assert_eq!(m.set_dimensions(&[8], 7), Err(MetaError::UnknownDimCode(7)));
        assert_eq!(
            m.set_dimensions(&[65536, 65536, 65536, 65536], 3),
            Err(MetaError::ShapeOverflow { axis: 3 })
        );
        assert!(m.set_error_bound(f64::NAN).is_err());
        assert_eq!(
            m.set_relative_error_bound(0.1, 0.0),
            Err(MetaError::InvalidRange(0.0))
        );
        assert_eq!(m.set_quant_bin_num(3), Err(MetaError::InvalidBinCount(3)));
        assert!(m.set_demo_dimensions("missing").is_err());

        assert_eq!(m, before);
    }

    #[test]
    fn demo_dimensions_delegate() {
        let mut by_name = Metadata::new();
        by_name.set_demo_dimensions("hurricane").unwrap();
        let mut direct = Metadata::new();
        direct.set_dimensions(&[500, 500, 100], 3).unwrap();
        assert_eq!(by_name.geometry(), direct.geometry());
        assert_eq!(by_name.len(), 25_000_000);
    }

    #[test]
    fn relative_mode_supersedes_absolute() {
        let mut m = Metadata::new();
        m.set_error_bound(1.0).unwrap();
        m.set_relative_error_bound(1e-3, 40.0).unwrap();
        let mut reference = Metadata::new();
        reference.set_error_bound(1e-3 * 40.0).unwrap();
        assert_eq!(m.error_bound(), reference.error_bound());
        assert_eq!(m.ebx2_r().to_bits(), reference.ebx2_r().to_bits());
    }

    #[test]
    fn completeness() {
        let mut m = Metadata::new();
        assert_eq!(m.ensure_complete(), Err(MetaError::Incomplete("dimensions")));
        m.set_dimensions(&[16], 1).unwrap();
        assert_eq!(m.ensure_complete(), Err(MetaError::Incomplete("error bound")));
        m.set_error_bound(1e-2).unwrap();
        assert_eq!(
            m.ensure_complete(),
            Err(MetaError::Incomplete("quantization bins"))
        );
        m.set_quant_bin_num(1024).unwrap();
        assert!(m.is_complete());
    }

    #[test]
    fn report_merges_once_per_job() {
        let mut m = Metadata::new();
        let report = PipelineReport {
            nnz: 3,
            total_bits: 800,
            total_uint: 25,
            huff_metadata_size: 18,
        };
        m.merge_report(report).unwrap();
        assert_eq!(m.total_bits(), 800);
        assert_eq!(m.nnz(), 3);
        assert_eq!(
            m.merge_report(PipelineReport::default()),
            Err(MetaError::ReportAlreadyMerged)
        );
        assert_eq!(m.total_uint(), 25);

        m.reset_report();
        assert_eq!(m.huff_metadata_size(), 0);
        m.merge_report(PipelineReport::default()).unwrap();
    }

    #[test]
    fn serde_roundtrip_rederives_fields() {
        let mut m = Metadata::new();
        m.set_dimensions(&[64, 64, 64], 3).unwrap();
        m.set_error_bound(0.25).unwrap();
        m.set_quant_bin_num(512).unwrap();
        let json = serde_json::to_string(&m).unwrap();
        let back: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn serde_rejects_invalid_error_bound() {
        let json = r#"{"geometry":null,"error_bound":{"eb":-1.0,"ebx2":-2.0,"eb_r":-1.0,"ebx2_r":-0.5},
            "quant":null,"report":{"nnz":0,"total_bits":0,"total_uint":0,"huff_metadata_size":0},
            "report_merged":false}"#;
        assert!(serde_json::from_str::<Metadata>(json).is_err());
    }
}

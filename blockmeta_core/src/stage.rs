//! Reference entropy stage at the pipeline boundary.
//!
//! Consumes the quant codes a predictor/quantizer produced for a configured
//! job, packs them with a byte [`Codec`], and reports the size counters that
//! get merged back into the host [`Metadata`].
//!
//! # Stream layout
//! ```text
//! [HEADER: 18 bytes: codec_id:u16, code_count:u64, checksum:u64]
//! [PAYLOAD: codec-compressed little-endian u16 codes]
//! ```

use anyhow::Context;
use xxhash_rust::xxh3::xxh3_64;

use crate::codec::Codec;
use crate::error::MetaError;
use crate::format::{StreamHeader, STREAM_HEADER_SIZE, UINT_BITS};
use crate::layout::npart;
use crate::metadata::{Metadata, PipelineReport};

/// Code the quantizer emits for an element it could not predict.
pub const OUTLIER_CODE: u16 = 0;

/// Largest code space a u16 stream can carry.
pub const MAX_CAP: u32 = u16::MAX as u32 + 1;

/// Result of a finished stage: the encoded stream and its counters.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub stream: Vec<u8>,
    pub report: PipelineReport,
}

/// Check `codes` against the job and count outliers.
fn scan_codes(meta: &Metadata, codes: &[u16]) -> Result<u64, MetaError> {
    let expected = meta.len();
    if codes.len() as u64 != expected {
        return Err(MetaError::LengthMismatch {
            expected,
            got: codes.len() as u64,
        });
    }
    let cap = meta.cap();
    let mut nnz = 0u64;
    for (index, &code) in codes.iter().enumerate() {
        if code as u32 >= cap {
            return Err(MetaError::CodeOutOfRange { index, code, cap });
        }
        if code == OUTLIER_CODE {
            nnz += 1;
        }
    }
    Ok(nnz)
}

/// Encode `codes` for a complete job. The record is only read.
pub fn encode_codes(
    meta: &Metadata,
    codes: &[u16],
    codec: &dyn Codec,
) -> anyhow::Result<StageOutput> {
    meta.ensure_complete()?;
    if meta.cap() > MAX_CAP {
        anyhow::bail!(
            "cap {} exceeds the u16 code space of this stage (max {})",
            meta.cap(),
            MAX_CAP
        );
    }
    let nnz = scan_codes(meta, codes)?;

    let raw: Vec<u8> = codes.iter().flat_map(|c| c.to_le_bytes()).collect();
    let payload = codec
        .compress(&raw)
        .with_context(|| format!("{} compress of {} codes", codec.name(), codes.len()))?;

    let header = StreamHeader {
        codec_id: codec.id(),
        code_count: codes.len() as u64,
        checksum: xxh3_64(&payload),
    };

    let mut stream = Vec::with_capacity(STREAM_HEADER_SIZE as usize + payload.len());
    stream.extend_from_slice(&header.to_bytes());
    stream.extend_from_slice(&payload);

    let total_bits = payload.len() as u64 * 8;
    let report = PipelineReport {
        nnz,
        total_bits,
        total_uint: npart(total_bits, UINT_BITS),
        huff_metadata_size: STREAM_HEADER_SIZE,
    };

    Ok(StageOutput { stream, report })
}

/// Decode a stream produced by [`encode_codes`] for the same job.
pub fn decode_codes(meta: &Metadata, stream: &[u8], codec: &dyn Codec) -> anyhow::Result<Vec<u16>> {
    meta.ensure_complete()?;
    let header = StreamHeader::from_bytes(stream)?;

    if header.codec_id != codec.id() {
        anyhow::bail!(
            "codec mismatch: stream uses codec {} but provided codec has id {}",
            header.codec_id,
            codec.id()
        );
    }
    if header.code_count != meta.len() {
        return Err(MetaError::LengthMismatch {
            expected: meta.len(),
            got: header.code_count,
        }
        .into());
    }

    let payload = &stream[STREAM_HEADER_SIZE as usize..];
    let computed = xxh3_64(payload);
    if computed != header.checksum {
        anyhow::bail!(
            "stream checksum mismatch: expected {:016x}, got {:016x}",
            header.checksum,
            computed
        );
    }

    let raw = codec
        .decompress(payload)
        .with_context(|| format!("{} decompress", codec.name()))?;
    if raw.len() as u64 != header.code_count * 2 {
        anyhow::bail!(
            "payload decompressed to {} bytes but header says {} codes",
            raw.len(),
            header.code_count
        );
    }

    Ok(raw
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

/// Encode, then merge the counters into `meta`.
///
/// The encode runs against an immutable borrow and completes before the
/// report is merged; that merge is the only write the stage makes.
pub fn run(meta: &mut Metadata, codes: &[u16], codec: &dyn Codec) -> anyhow::Result<Vec<u8>> {
    let output = encode_codes(meta, codes, codec)?;
    meta.merge_report(output.report)?;
    Ok(output.stream)
}

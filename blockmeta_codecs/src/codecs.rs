//! Byte codecs for packed quant-code payloads.
//!
//! Every payload is a run of little-endian u16 codes, so each codec refuses
//! an odd byte count on the way in and on the way out.

use std::io::{Read, Write};

use blockmeta_core::codec::Codec;
use blockmeta_core::format::{CODEC_DEFLATE, CODEC_LZ4, CODEC_PASSTHROUGH, CODEC_ZSTD};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

/// Bytes per packed quant code.
const CODE_NBYTE: usize = 2;

fn whole_codes(codec: &str, what: &str, bytes: &[u8]) -> anyhow::Result<()> {
    if bytes.len() % CODE_NBYTE != 0 {
        anyhow::bail!(
            "{} {}: {} bytes is not a whole number of u16 codes",
            codec,
            what,
            bytes.len()
        );
    }
    Ok(())
}

/// Stores the packed codes as they are.
///
/// Its `total_bits` is the raw code footprint, `16 * len`, which is the
/// baseline the entropy codecs are measured against.
pub struct PassThroughCodec;

impl Codec for PassThroughCodec {
    fn id(&self) -> u16 {
        CODEC_PASSTHROUGH
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn compress(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        whole_codes(self.name(), "input", raw)?;
        Ok(raw.to_vec())
    }

    fn decompress(&self, compressed: &[u8]) -> anyhow::Result<Vec<u8>> {
        whole_codes(self.name(), "payload", compressed)?;
        Ok(compressed.to_vec())
    }
}

/// Zstandard at the configured level (default 3).
///
/// Codes cluster around the radius, so the high byte is nearly constant and
/// zstd's entropy stage does most of the work.
pub struct ZstdCodec {
    pub level: i32,
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self { level: 3 }
    }
}

impl ZstdCodec {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Codec for ZstdCodec {
    fn id(&self) -> u16 {
        CODEC_ZSTD
    }

    fn name(&self) -> &'static str {
        "zstd"
    }

    fn compress(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        whole_codes(self.name(), "input", raw)?;
        Ok(zstd::bulk::compress(raw, self.level)?)
    }

    fn decompress(&self, compressed: &[u8]) -> anyhow::Result<Vec<u8>> {
        // the frame carries its content size
        let raw = zstd::decode_all(compressed)?;
        whole_codes(self.name(), "output", &raw)?;
        Ok(raw)
    }
}

/// LZ4 block format with the decoded size prepended.
///
/// Fastest to decode but weakest on the skewed code histogram, since it
/// has no entropy stage of its own.
pub struct Lz4Codec;

impl Codec for Lz4Codec {
    fn id(&self) -> u16 {
        CODEC_LZ4
    }

    fn name(&self) -> &'static str {
        "lz4"
    }

    fn compress(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        whole_codes(self.name(), "input", raw)?;
        Ok(lz4_flex::compress_prepend_size(raw))
    }

    fn decompress(&self, compressed: &[u8]) -> anyhow::Result<Vec<u8>> {
        let raw = lz4_flex::decompress_size_prepended(compressed)
            .map_err(|e| anyhow::anyhow!("lz4 payload: {}", e))?;
        whole_codes(self.name(), "output", &raw)?;
        Ok(raw)
    }
}

/// Raw DEFLATE (LZ77 + Huffman), level 0 to 9 (default 6).
pub struct DeflateCodec {
    pub level: u32,
}

impl Default for DeflateCodec {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl DeflateCodec {
    pub fn new(level: u32) -> Self {
        Self {
            level: level.min(9),
        }
    }
}

impl Codec for DeflateCodec {
    fn id(&self) -> u16 {
        CODEC_DEFLATE
    }

    fn name(&self) -> &'static str {
        "deflate"
    }

    fn compress(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        whole_codes(self.name(), "input", raw)?;
        let mut enc = DeflateEncoder::new(
            Vec::with_capacity(raw.len() / 4),
            Compression::new(self.level),
        );
        enc.write_all(raw)?;
        Ok(enc.finish()?)
    }

    fn decompress(&self, compressed: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut raw = Vec::new();
        DeflateDecoder::new(compressed).read_to_end(&mut raw)?;
        whole_codes(self.name(), "output", &raw)?;
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all() -> [Box<dyn Codec>; 4] {
        [
            Box::new(PassThroughCodec),
            Box::new(ZstdCodec::default()),
            Box::new(Lz4Codec),
            Box::new(DeflateCodec::default()),
        ]
    }

    #[test]
    fn odd_input_refused() {
        for codec in all() {
            let err = codec.compress(&[1, 2, 3]).unwrap_err().to_string();
            assert!(err.contains("whole number of u16 codes"), "{}: {err}", codec.name());
        }
    }

    #[test]
    fn odd_decoded_payload_refused() {
        // a valid frame of three bytes cannot hold whole codes
        let lz4 = lz4_flex::compress_prepend_size(&[7, 7, 7]);
        assert!(Lz4Codec.decompress(&lz4).is_err());
        let zst = zstd::bulk::compress(&[7, 7, 7], 3).unwrap();
        assert!(ZstdCodec::default().decompress(&zst).is_err());
        assert!(PassThroughCodec.decompress(&[7, 7, 7]).is_err());
    }

    #[test]
    fn clustered_codes_shrink() {
        let raw: Vec<u8> = (0..8192u32)
            .flat_map(|i| (512 + (i % 5) as u16).to_le_bytes())
            .collect();
        for codec in all() {
            let packed = codec.compress(&raw).unwrap();
            if codec.id() != CODEC_PASSTHROUGH {
                assert!(packed.len() < raw.len() / 2, "{}", codec.name());
            }
            assert_eq!(codec.decompress(&packed).unwrap(), raw);
        }
    }

    #[test]
    fn deflate_level_clamped() {
        assert_eq!(DeflateCodec::new(42).level, 9);
    }
}

/// Fixed size of the encoded-stream header in bytes.
///   codec_id:u16 + code_count:u64 + checksum:u64
///   = 2 + 8 + 8 = 18
pub const STREAM_HEADER_SIZE: u64 = 18;

/// Bits per machine word the pipeline packs its bitstream into.
pub const UINT_BITS: u64 = 32;

// ── Codec IDs ──────────────────────────────────────────────────────────────

pub const CODEC_PASSTHROUGH: u16 = 0;
pub const CODEC_ZSTD: u16 = 1;
pub const CODEC_LZ4: u16 = 2;
pub const CODEC_DEFLATE: u16 = 3;

// ── Header ─────────────────────────────────────────────────────────────────

/// Decoded representation of the 18-byte stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    pub codec_id: u16,
    /// Number of quant codes in the stream (equals the job's `len`).
    pub code_count: u64,
    /// xxhash3-64 of the compressed payload that follows the header.
    pub checksum: u64,
}

impl StreamHeader {
    /// Serialize to exactly `STREAM_HEADER_SIZE` bytes.
    pub fn to_bytes(&self) -> [u8; STREAM_HEADER_SIZE as usize] {
        let mut buf = [0u8; STREAM_HEADER_SIZE as usize];
        buf[0..2].copy_from_slice(&self.codec_id.to_le_bytes());
        buf[2..10].copy_from_slice(&self.code_count.to_le_bytes());
        buf[10..18].copy_from_slice(&self.checksum.to_le_bytes());
        buf
    }

    /// Deserialize from the first `STREAM_HEADER_SIZE` bytes of `buf`.
    pub fn from_bytes(buf: &[u8]) -> anyhow::Result<Self> {
        if (buf.len() as u64) < STREAM_HEADER_SIZE {
            anyhow::bail!(
                "stream too short for header: {} bytes, need {}",
                buf.len(),
                STREAM_HEADER_SIZE
            );
        }
        Ok(Self {
            codec_id: u16::from_le_bytes(buf[0..2].try_into()?),
            code_count: u64::from_le_bytes(buf[2..10].try_into()?),
            checksum: u64::from_le_bytes(buf[10..18].try_into()?),
        })
    }
}

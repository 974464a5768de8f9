mod codecs;

pub use codecs::{DeflateCodec, Lz4Codec, PassThroughCodec, ZstdCodec};

use blockmeta_core::format::{CODEC_DEFLATE, CODEC_LZ4, CODEC_PASSTHROUGH, CODEC_ZSTD};
use blockmeta_core::Codec;
use std::sync::Arc;

/// Resolve a codec from the `codec_id` stored in a stream header.
pub fn codec_by_id(id: u16) -> anyhow::Result<Arc<dyn Codec>> {
    match id {
        CODEC_PASSTHROUGH => Ok(Arc::new(PassThroughCodec)),
        CODEC_ZSTD => Ok(Arc::new(ZstdCodec::default())),
        CODEC_LZ4 => Ok(Arc::new(Lz4Codec)),
        CODEC_DEFLATE => Ok(Arc::new(DeflateCodec::default())),
        _ => anyhow::bail!(
            "unknown codec id {}; supported: 0 (passthrough), 1 (zstd), 2 (lz4), 3 (deflate)",
            id
        ),
    }
}

/// Resolve a codec from a CLI name. `level` applies to zstd and deflate.
pub fn codec_by_name(name: &str, level: Option<i32>) -> anyhow::Result<Arc<dyn Codec>> {
    match name {
        "passthrough" | "pass" | "none" => Ok(Arc::new(PassThroughCodec)),
        "zstd" | "z" => Ok(Arc::new(level.map_or_else(ZstdCodec::default, ZstdCodec::new))),
        "lz4" | "l" => Ok(Arc::new(Lz4Codec)),
        "deflate" | "gzip" | "d" => Ok(Arc::new(
            level.map_or_else(DeflateCodec::default, |l| DeflateCodec::new(l.max(0) as u32)),
        )),
        other => anyhow::bail!(
            "unknown codec '{}'. Valid options: passthrough, zstd, lz4, deflate",
            other
        ),
    }
}

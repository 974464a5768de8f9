/// Byte-level compression used by the reference entropy stage.
///
/// Each `Codec` implementation:
/// - Is identified by a stable numeric `id()` stored in the stream header.
/// - Compresses one payload at a time with no state carried between calls.
pub trait Codec: Send + Sync {
    /// Stable codec ID stored in the stream header.
    fn id(&self) -> u16;

    /// Human-readable codec name for CLI display.
    fn name(&self) -> &'static str;

    fn compress(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>>;

    fn decompress(&self, compressed: &[u8]) -> anyhow::Result<Vec<u8>>;
}

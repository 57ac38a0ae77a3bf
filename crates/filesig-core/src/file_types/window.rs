//! The leading byte window shared by all matchers during one probe.

use std::path::Path;

use crate::fs::ByteSource;

/// Number of leading bytes read once per probe.
///
/// Covers the longest builtin signature that sits near the start of a file
/// (PNG's 8 bytes, WebP's tag at bytes 8..12). Patterns that end beyond
/// this window are read directly from the file at their offset.
pub const PROBE_WINDOW_LEN: usize = 32;

/// Leading bytes of a file together with their upper-case hex text.
///
/// A window is built once per probe and handed to every matcher by
/// reference, then dropped when the probe returns. Nothing outlives the
/// call, so concurrent probes never share window state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeWindow {
    bytes: Vec<u8>,
    hex: String,
}

impl ProbeWindow {
    /// Wrap already-read bytes. Anything past [`PROBE_WINDOW_LEN`] is dropped.
    pub fn new(mut bytes: Vec<u8>) -> Self {
        bytes.truncate(PROBE_WINDOW_LEN);
        let hex = hex::encode_upper(&bytes);
        Self { bytes, hex }
    }

    /// Read the leading window of `path` through `source`.
    pub fn read(source: &dyn ByteSource, path: &Path) -> Self {
        Self::new(source.read_prefix(path, PROBE_WINDOW_LEN))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Upper-case, two digits per byte.
    pub fn hex(&self) -> &str {
        &self.hex
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the hex text starting at byte `offset` begins with `magic_hex`.
    ///
    /// A window too short to hold the pattern never matches.
    pub fn hex_starts_with_at(&self, offset: usize, magic_hex: &str) -> bool {
        offset
            .checked_mul(2)
            .and_then(|start| self.hex.get(start..))
            .is_some_and(|tail| tail.starts_with(magic_hex))
    }
}

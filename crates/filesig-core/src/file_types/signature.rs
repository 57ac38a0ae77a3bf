//! Magic-byte signatures and the descriptor built from them.
//!
//! A [`MagicPattern`] is a byte sequence expected at a fixed offset. Patterns
//! that fit inside the probe window are compared against the window's hex
//! text with a starts-with test. Patterns that end past the window (TAR's
//! `ustar` at byte 257) ignore the window and read exactly their bytes from
//! the file.

use std::path::Path;

use super::descriptor::{FileTypeDescriptor, TypeMetadata};
use super::window::{PROBE_WINDOW_LEN, ProbeWindow};
use crate::diagnostics::{ProbeError, ProbeResult};
use crate::fs::ByteSource;

/// A byte sequence expected at a fixed offset, held as upper-case hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicPattern {
    offset: u64,
    hex: String,
    len: usize,
}

impl MagicPattern {
    /// Parse a hex string such as `"FFD8FF"` or `"50 4b 03 04"`.
    ///
    /// Whitespace is ignored and case is normalized. Empty input, odd
    /// digit counts and non-hex characters are rejected.
    pub fn from_hex(offset: u64, magic: &str) -> ProbeResult<Self> {
        let cleaned: String = magic.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        if cleaned.is_empty() {
            return Err(ProbeError::InvalidMagic {
                magic: magic.to_string(),
                reason: "empty pattern".to_string(),
            });
        }
        let bytes = hex::decode(&cleaned).map_err(|e| ProbeError::InvalidMagic {
            magic: magic.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_bytes(offset, &bytes))
    }

    pub fn from_bytes(offset: u64, bytes: &[u8]) -> Self {
        Self {
            offset,
            hex: hex::encode_upper(bytes),
            len: bytes.len(),
        }
    }

    /// For the builtin table, whose literals are checked by tests.
    pub(crate) fn trusted(offset: u64, magic: &str) -> Self {
        Self {
            offset,
            hex: magic.to_ascii_uppercase(),
            len: magic.len() / 2,
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Pattern length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when the whole pattern lies inside the probe window.
    pub fn in_window(&self) -> bool {
        usize::try_from(self.offset)
            .ok()
            .and_then(|offset| offset.checked_add(self.len))
            .is_some_and(|end| end <= PROBE_WINDOW_LEN)
    }

    fn matches(&self, window: &ProbeWindow, source: &dyn ByteSource, path: &Path) -> bool {
        if self.in_window() {
            // in_window guarantees the offset fits in usize
            let offset = self.offset as usize;
            window.hex_starts_with_at(offset, &self.hex)
        } else {
            let bytes = source.read_at(path, self.offset, self.len);
            bytes.len() == self.len && hex::encode_upper(&bytes) == self.hex
        }
    }
}

/// How a descriptor's patterns combine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MagicRule {
    /// Any one pattern matching is enough (RAR v4 or v5, GIF87a or GIF89a).
    AnyOf(Vec<MagicPattern>),
    /// Every pattern must match (WebP's RIFF container tag plus its `WEBP` tag).
    AllOf(Vec<MagicPattern>),
}

impl MagicRule {
    pub fn patterns(&self) -> &[MagicPattern] {
        match self {
            MagicRule::AnyOf(p) | MagicRule::AllOf(p) => p,
        }
    }

    fn needs_window(&self) -> bool {
        self.patterns().iter().any(MagicPattern::in_window)
    }

    /// Evaluate the rule, reading a fresh window when none is supplied.
    pub fn matches(&self, window: Option<&ProbeWindow>, source: &dyn ByteSource, path: &Path) -> bool {
        let owned;
        let window = match window {
            Some(w) => w,
            None => {
                owned = if self.needs_window() {
                    ProbeWindow::read(source, path)
                } else {
                    ProbeWindow::new(Vec::new())
                };
                &owned
            }
        };

        match self {
            MagicRule::AnyOf(patterns) => patterns.iter().any(|p| p.matches(window, source, path)),
            MagicRule::AllOf(patterns) => {
                !patterns.is_empty() && patterns.iter().all(|p| p.matches(window, source, path))
            }
        }
    }
}

/// A file type recognized purely by magic bytes.
///
/// Every builtin type is a `SignatureType`. Callers can build their own
/// with [`SignatureType::builder`] and register them like any other
/// descriptor.
#[derive(Debug, Clone)]
pub struct SignatureType {
    metadata: TypeMetadata,
    rule: MagicRule,
}

impl SignatureType {
    pub fn new(metadata: TypeMetadata, rule: MagicRule) -> Self {
        Self { metadata, rule }
    }

    /// Start building a caller-defined (non-builtin) signature type.
    ///
    /// # Example
    ///
    /// ```
    /// use filesig_core::{FileTypeDescriptor, SignatureType};
    ///
    /// let pdf = SignatureType::builder("PDF")
    ///     .description("Portable Document Format")
    ///     .extension("pdf")
    ///     .mime_type("application/pdf")
    ///     .magic_hex(0, "25504446")
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(pdf.name(), "PDF");
    /// assert!(!pdf.is_builtin());
    /// ```
    pub fn builder(name: impl Into<String>) -> SignatureTypeBuilder {
        SignatureTypeBuilder::new(name.into())
    }

    pub fn rule(&self) -> &MagicRule {
        &self.rule
    }
}

impl FileTypeDescriptor for SignatureType {
    fn metadata(&self) -> &TypeMetadata {
        &self.metadata
    }

    fn matches(&self, window: Option<&ProbeWindow>, source: &dyn ByteSource, path: &Path) -> bool {
        self.rule.matches(window, source, path)
    }
}

/// Builder for a caller-defined [`SignatureType`].
///
/// Uses the `&mut Self` return pattern; `build()` drains the builder.
#[derive(Debug, Default)]
pub struct SignatureTypeBuilder {
    name: String,
    description: Option<String>,
    extensions: Vec<String>,
    mime_types: Vec<String>,
    magic: Vec<(u64, String)>,
    require_all: bool,
}

impl SignatureTypeBuilder {
    fn new(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Add a filename suffix; the first one becomes the primary extension.
    pub fn extension(&mut self, ext: impl Into<String>) -> &mut Self {
        self.extensions.push(ext.into());
        self
    }

    /// Add a MIME type; the first one becomes the primary MIME type.
    pub fn mime_type(&mut self, mime: impl Into<String>) -> &mut Self {
        self.mime_types.push(mime.into());
        self
    }

    /// Add a hex pattern at a byte offset. Parsed at `build()` time.
    pub fn magic_hex(&mut self, offset: u64, magic: impl Into<String>) -> &mut Self {
        self.magic.push((offset, magic.into()));
        self
    }

    /// Add a raw byte pattern at a byte offset.
    pub fn magic_bytes(&mut self, offset: u64, magic: &[u8]) -> &mut Self {
        self.magic.push((offset, hex::encode_upper(magic)));
        self
    }

    /// Require every pattern to match instead of any one of them.
    pub fn require_all(&mut self, all: bool) -> &mut Self {
        self.require_all = all;
        self
    }

    pub fn build(&mut self) -> ProbeResult<SignatureType> {
        let name = std::mem::take(&mut self.name).trim().to_string();
        if name.is_empty() {
            return Err(ProbeError::BlankName);
        }

        let magic = std::mem::take(&mut self.magic);
        if magic.is_empty() {
            return Err(ProbeError::MissingMagic { name });
        }
        let patterns = magic
            .iter()
            .map(|(offset, hex)| MagicPattern::from_hex(*offset, hex))
            .collect::<ProbeResult<Vec<_>>>()?;

        let mut metadata = TypeMetadata::new(name);
        if let Some(description) = self.description.take() {
            metadata = metadata.with_description(description);
        }
        for ext in std::mem::take(&mut self.extensions) {
            metadata = metadata.with_extension(ext);
        }
        for mime in std::mem::take(&mut self.mime_types) {
            metadata = metadata.with_mime_type(mime);
        }

        let rule = if std::mem::take(&mut self.require_all) {
            MagicRule::AllOf(patterns)
        } else {
            MagicRule::AnyOf(patterns)
        };
        Ok(SignatureType::new(metadata, rule))
    }
}

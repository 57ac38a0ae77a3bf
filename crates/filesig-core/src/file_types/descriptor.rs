//! The [`FileTypeDescriptor`] trait and its static metadata.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::window::ProbeWindow;
use crate::fs::{ByteSource, RealFileSystem};

/// Shared handle to a registered descriptor.
pub type FileTypeRef = Arc<dyn FileTypeDescriptor>;

/// Static facts about a file type.
///
/// The canonical name is the identity of a type: registration deduplicates
/// on it and removal looks it up by it. It never changes after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMetadata {
    name: String,
    description: String,
    builtin: bool,
    extensions: BTreeSet<String>,
    primary_extension: String,
    mime_types: BTreeSet<String>,
    primary_mime_type: String,
}

impl TypeMetadata {
    /// Metadata for a caller-defined type. The description defaults to the name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            description: name.clone(),
            name,
            builtin: false,
            extensions: BTreeSet::new(),
            primary_extension: String::new(),
            mime_types: BTreeSet::new(),
            primary_mime_type: String::new(),
        }
    }

    pub(crate) fn builtin(mut self) -> Self {
        self.builtin = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a filename suffix. The first one added becomes the primary extension.
    pub fn with_extension(mut self, ext: impl Into<String>) -> Self {
        let ext = ext.into();
        if self.primary_extension.is_empty() {
            self.primary_extension = ext.clone();
        }
        self.extensions.insert(ext);
        self
    }

    /// Add a MIME type. The first one added becomes the primary MIME type.
    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        let mime = mime.into();
        if self.primary_mime_type.is_empty() {
            self.primary_mime_type = mime.clone();
        }
        self.mime_types.insert(mime);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    pub fn extensions(&self) -> &BTreeSet<String> {
        &self.extensions
    }

    pub fn primary_extension(&self) -> &str {
        &self.primary_extension
    }

    pub fn mime_types(&self) -> &BTreeSet<String> {
        &self.mime_types
    }

    pub fn primary_mime_type(&self) -> &str {
        &self.primary_mime_type
    }
}

/// A recognizable file type: metadata plus a signature predicate.
///
/// Builtin types and caller-defined types both implement this trait; the
/// registry holds them as [`FileTypeRef`] trait objects so callers can
/// register their own matchers at run time.
///
/// # Object Safety
///
/// This trait is object-safe so that descriptors can be stored as
/// `Arc<dyn FileTypeDescriptor>` in a [`FileTypeRegistry`](crate::FileTypeRegistry).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use filesig_core::{ByteSource, FileTypeDescriptor, ProbeWindow, TypeMetadata};
///
/// #[derive(Debug)]
/// struct Sqlite(TypeMetadata);
///
/// impl FileTypeDescriptor for Sqlite {
///     fn metadata(&self) -> &TypeMetadata {
///         &self.0
///     }
///
///     fn matches(&self, window: Option<&ProbeWindow>, source: &dyn ByteSource, path: &Path) -> bool {
///         let head = match window {
///             Some(w) => w.bytes().to_vec(),
///             None => source.read_prefix(path, 16),
///         };
///         head.starts_with(b"SQLite format 3\0")
///     }
/// }
///
/// let sqlite = Sqlite(TypeMetadata::new("SQLite").with_extension("db"));
/// assert!(!sqlite.is_builtin());
/// assert_eq!(sqlite.primary_extension(), "db");
/// ```
pub trait FileTypeDescriptor: Send + Sync + fmt::Debug {
    fn metadata(&self) -> &TypeMetadata;

    /// Decide whether the file at `path` is of this type.
    ///
    /// During a registry probe `window` holds the file's leading bytes and
    /// should be reused. When `window` is `None` the matcher was called on
    /// its own and must read whatever it needs through `source`. Matchers
    /// whose signature lies past the window read at their offset through
    /// `source` in either case.
    ///
    /// Must be free of side effects and safe to call concurrently.
    fn matches(&self, window: Option<&ProbeWindow>, source: &dyn ByteSource, path: &Path) -> bool;

    /// Match a file on disk without a shared window.
    fn matches_file(&self, path: &Path) -> bool {
        self.matches(None, &RealFileSystem, path)
    }

    fn name(&self) -> &str {
        self.metadata().name()
    }

    /// Human-readable label; the name when nothing richer exists.
    fn description(&self) -> &str {
        self.metadata().description()
    }

    /// Builtin types ship with the engine and can never be unregistered.
    fn is_builtin(&self) -> bool {
        self.metadata().is_builtin()
    }

    fn extensions(&self) -> &BTreeSet<String> {
        self.metadata().extensions()
    }

    fn primary_extension(&self) -> &str {
        self.metadata().primary_extension()
    }

    fn mime_types(&self) -> &BTreeSet<String> {
        self.metadata().mime_types()
    }

    fn primary_mime_type(&self) -> &str {
        self.metadata().primary_mime_type()
    }

    /// Identity comparison by canonical name.
    fn is_same_type(&self, other: &dyn FileTypeDescriptor) -> bool {
        self.name() == other.name()
    }
}

impl fmt::Display for dyn FileTypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

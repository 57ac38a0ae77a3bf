//! File type registry and content prober.

use std::path::Path;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::file_types::{FileTypeDescriptor, FileTypeRef, ProbeWindow, builtin_types, unknown};
use crate::fs::{ByteSource, RealFileSystem, SliceSource};

/// A provider of file type descriptors.
///
/// Implement this trait to supply descriptors from an external source (a
/// plugin, a configuration file). [`ProbeConfig`](crate::ProbeConfig)
/// implements it for its `[[custom_types]]` tables.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use filesig_core::{FileTypeRef, FileTypeRegistry, SignatureType, TypeProvider};
///
/// struct PdfProvider;
///
/// impl TypeProvider for PdfProvider {
///     fn types(&self) -> Vec<FileTypeRef> {
///         let pdf = SignatureType::builder("PDF").magic_hex(0, "25504446").build().unwrap();
///         vec![Arc::new(pdf)]
///     }
/// }
///
/// let registry = FileTypeRegistry::builder().with_provider(&PdfProvider).build();
/// assert_eq!(registry.custom_types().len(), 1);
/// ```
pub trait TypeProvider: Send + Sync {
    /// Human-readable name for this provider.
    ///
    /// Defaults to the unqualified struct name.
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Descriptors supplied by this provider, in registration order.
    fn types(&self) -> Vec<FileTypeRef>;
}

/// Ordered collection of file types plus the probe algorithm.
///
/// The sequence always starts with caller-registered types (most recent
/// first), followed by the builtins in curated order, and ends with the
/// Unknown sentinel. Probing returns the first entry whose predicate
/// accepts the file.
///
/// All methods take `&self`; the sequence sits behind an `RwLock` so
/// probes and registrations may run concurrently from many threads. A
/// probe iterates over a snapshot taken at its start, so it observes either
/// the sequence before or after a concurrent mutation, never a torn one.
/// The probe window is a local of each probe call and is never shared.
#[derive(Debug)]
pub struct FileTypeRegistry {
    types: RwLock<Vec<FileTypeRef>>,
    fs: Arc<dyn ByteSource>,
}

impl FileTypeRegistry {
    /// Create a registry with the builtin types, reading from the real filesystem.
    pub fn new() -> Self {
        Self::with_fs(Arc::new(RealFileSystem))
    }

    /// Create a registry with the builtin types, reading through `fs`.
    pub fn with_fs(fs: Arc<dyn ByteSource>) -> Self {
        let mut types: Vec<FileTypeRef> = builtin_types().to_vec();
        types.push(unknown());
        Self {
            types: RwLock::new(types),
            fs,
        }
    }

    /// Create a [`FileTypeRegistryBuilder`] for ergonomic construction.
    pub fn builder() -> FileTypeRegistryBuilder {
        FileTypeRegistryBuilder::new()
    }

    /// The process-wide registry used by the crate-level free functions.
    pub fn global() -> &'static FileTypeRegistry {
        static GLOBAL: OnceLock<FileTypeRegistry> = OnceLock::new();
        GLOBAL.get_or_init(FileTypeRegistry::new)
    }

    /// The byte source this registry reads through.
    pub fn fs(&self) -> &dyn ByteSource {
        self.fs.as_ref()
    }

    fn read_types(&self) -> RwLockReadGuard<'_, Vec<FileTypeRef>> {
        self.types.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_types(&self) -> RwLockWriteGuard<'_, Vec<FileTypeRef>> {
        self.types.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Identify a file from its content.
    ///
    /// Never fails. A path that does not exist, is not a regular file, or
    /// cannot be opened resolves to the Unknown type, as does any file no
    /// registered matcher accepts.
    pub fn probe_by_content(&self, path: &Path) -> FileTypeRef {
        let fs = self.fs.as_ref();
        if !fs.exists(path) || !fs.is_file(path) || !fs.is_readable(path) {
            tracing::debug!(path = %path.display(), "not a readable regular file");
            return unknown();
        }

        let window = ProbeWindow::read(fs, path);
        let found = self.first_match(&window, fs, path);
        tracing::debug!(
            path = %path.display(),
            file_type = found.name(),
            window_len = window.len(),
            "probed"
        );
        found
    }

    /// Identify an in-memory buffer, as if it were the content of a file.
    pub fn probe_bytes(&self, data: &[u8]) -> FileTypeRef {
        let source = SliceSource::new(data);
        let path = Path::new("<memory>");
        let window = ProbeWindow::read(&source, path);
        self.first_match(&window, &source, path)
    }

    fn first_match(&self, window: &ProbeWindow, source: &dyn ByteSource, path: &Path) -> FileTypeRef {
        // Clone the Arcs and release the lock before running any matcher.
        let snapshot = self.types();
        for ft in snapshot {
            tracing::trace!(file_type = ft.name(), "trying matcher");
            if ft.matches(Some(window), source, path) {
                return ft;
            }
        }
        unknown()
    }

    /// Register a caller-defined type at the front of the sequence.
    ///
    /// Newer registrations take priority over older ones and over every
    /// builtin. Returns `false` without changing anything when the
    /// descriptor claims to be builtin or a type with the same name is
    /// already registered.
    pub fn register_type(&self, descriptor: FileTypeRef) -> bool {
        if descriptor.is_builtin() {
            tracing::debug!(file_type = descriptor.name(), "refusing to register a builtin type");
            return false;
        }

        let mut types = self.write_types();
        if types.iter().any(|ft| ft.is_same_type(descriptor.as_ref())) {
            tracing::debug!(file_type = descriptor.name(), "type already registered");
            return false;
        }
        tracing::info!(file_type = descriptor.name(), "registered custom type");
        types.insert(0, descriptor);
        true
    }

    /// Remove a caller-defined type by name.
    ///
    /// Builtins are permanent: returns `false` for a builtin descriptor or
    /// when no custom type of that name is registered.
    pub fn unregister_type(&self, descriptor: &dyn FileTypeDescriptor) -> bool {
        if descriptor.is_builtin() {
            tracing::debug!(file_type = descriptor.name(), "refusing to unregister a builtin type");
            return false;
        }

        let mut types = self.write_types();
        let before = types.len();
        types.retain(|ft| ft.is_builtin() || !ft.is_same_type(descriptor));
        let removed = types.len() != before;
        if removed {
            tracing::info!(file_type = descriptor.name(), "unregistered custom type");
        }
        removed
    }

    /// All caller-registered types, in probe order.
    pub fn custom_types(&self) -> Vec<FileTypeRef> {
        self.read_types()
            .iter()
            .filter(|ft| !ft.is_builtin())
            .cloned()
            .collect()
    }

    /// All builtin types including the Unknown sentinel, in probe order.
    pub fn builtin_types(&self) -> Vec<FileTypeRef> {
        self.read_types()
            .iter()
            .filter(|ft| ft.is_builtin())
            .cloned()
            .collect()
    }

    /// Snapshot of the full sequence in probe order.
    pub fn types(&self) -> Vec<FileTypeRef> {
        self.read_types().clone()
    }

    /// Look up a registered type by canonical name (case-sensitive).
    pub fn find(&self, name: &str) -> Option<FileTypeRef> {
        self.read_types().iter().find(|ft| ft.name() == name).cloned()
    }

    /// Number of entries, including the Unknown sentinel.
    pub fn len(&self) -> usize {
        self.read_types().len()
    }

    /// Always `false`: the Unknown sentinel is never removed.
    pub fn is_empty(&self) -> bool {
        self.read_types().is_empty()
    }
}

impl Default for FileTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing a [`FileTypeRegistry`] with custom types
/// and a custom byte source.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use filesig_core::{FileTypeRegistry, MockFileSystem, SignatureType};
///
/// let pdf = SignatureType::builder("PDF").magic_hex(0, "25504446").build().unwrap();
/// let registry = FileTypeRegistry::builder()
///     .fs(Arc::new(MockFileSystem::new()))
///     .register(Arc::new(pdf))
///     .build();
///
/// assert_eq!(registry.custom_types()[0].name(), "PDF");
/// ```
pub struct FileTypeRegistryBuilder {
    fs: Option<Arc<dyn ByteSource>>,
    entries: Vec<FileTypeRef>,
}

impl FileTypeRegistryBuilder {
    fn new() -> Self {
        Self {
            fs: None,
            entries: Vec::new(),
        }
    }

    /// Read files through `fs` instead of the real filesystem.
    pub fn fs(&mut self, fs: Arc<dyn ByteSource>) -> &mut Self {
        self.fs = Some(fs);
        self
    }

    /// Add all descriptors from a [`TypeProvider`].
    pub fn with_provider(&mut self, provider: &dyn TypeProvider) -> &mut Self {
        let types = provider.types();
        tracing::debug!(provider = provider.name(), count = types.len(), "adding provider types");
        self.entries.extend(types);
        self
    }

    /// Queue a single descriptor for registration.
    pub fn register(&mut self, descriptor: FileTypeRef) -> &mut Self {
        self.entries.push(descriptor);
        self
    }

    /// Produce a [`FileTypeRegistry`].
    ///
    /// Entries are registered in the order they were added, so the last one
    /// added ends up with the highest priority. Drains the builder's queued
    /// entries; a second `build()` yields a registry with builtins only.
    pub fn build(&mut self) -> FileTypeRegistry {
        let fs = self
            .fs
            .take()
            .unwrap_or_else(|| Arc::new(RealFileSystem) as Arc<dyn ByteSource>);
        let registry = FileTypeRegistry::with_fs(fs);
        for descriptor in std::mem::take(&mut self.entries) {
            registry.register_type(descriptor);
        }
        registry
    }
}

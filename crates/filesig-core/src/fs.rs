//! Byte-range file access for signature matching.
//!
//! Probing never needs more than a short leading window plus, for a few
//! formats, a handful of bytes at a fixed offset. The [`ByteSource`] trait
//! captures exactly that, so the prober can be exercised against an
//! in-memory [`MockFileSystem`] as well as the real disk.
//!
//! ## Usage
//!
//! ```
//! use filesig_core::{ByteSource, MockFileSystem};
//! use std::path::Path;
//!
//! let mut mock = MockFileSystem::new();
//! mock.add_file("photo.bin", vec![0xFF, 0xD8, 0xFF, 0xE0]);
//!
//! assert_eq!(mock.read_prefix(Path::new("photo.bin"), 2), vec![0xFF, 0xD8]);
//! assert!(mock.read_at(Path::new("photo.bin"), 10, 4).is_empty());
//! ```

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Read-only access to file bytes and file metadata.
///
/// Reads are infallible by contract: a short file yields a short result and
/// any I/O failure (missing file, permission denied, device error) yields an
/// empty vector. Signature matchers treat an undersized result as a
/// non-match, so read errors degrade to "Unknown" instead of propagating.
pub trait ByteSource: Send + Sync + std::fmt::Debug {
    /// Read up to `len` bytes starting at `offset`.
    fn read_at(&self, path: &Path, offset: u64, len: usize) -> Vec<u8>;

    /// Read up to `len` bytes from the start of the file.
    fn read_prefix(&self, path: &Path, len: usize) -> Vec<u8> {
        self.read_at(path, 0, len)
    }

    /// Check if a path exists (file or directory).
    fn exists(&self, path: &Path) -> bool;

    /// Check if a path is a regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Check if a path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Check if the file can be opened for reading.
    fn is_readable(&self, path: &Path) -> bool;
}

/// Real filesystem implementation backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSystem;

impl RealFileSystem {
    fn try_read_at(path: &Path, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let mut file = File::open(path)?;
        if offset > 0 {
            file.seek(SeekFrom::Start(offset))?;
        }
        // `take` bounds the read; `len` may be far larger than the file.
        let mut buf = Vec::new();
        file.take(u64::try_from(len).unwrap_or(u64::MAX)).read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl ByteSource for RealFileSystem {
    fn read_at(&self, path: &Path, offset: u64, len: usize) -> Vec<u8> {
        if len == 0 {
            return Vec::new();
        }
        match Self::try_read_at(path, offset, len) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(
                    path = %path.display(),
                    offset,
                    len,
                    error = %e,
                    "read failed, treating as empty"
                );
                Vec::new()
            }
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_readable(&self, path: &Path) -> bool {
        File::open(path).is_ok()
    }
}

/// A single in-memory buffer posing as a file.
///
/// Every path resolves to the same bytes. Used by
/// [`FileTypeRegistry::probe_bytes`](crate::FileTypeRegistry::probe_bytes).
#[derive(Debug, Clone, Copy)]
pub(crate) struct SliceSource<'a> {
    data: &'a [u8],
}

impl<'a> SliceSource<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

fn slice_range(data: &[u8], offset: u64, len: usize) -> Vec<u8> {
    let Ok(start) = usize::try_from(offset) else {
        return Vec::new();
    };
    if start >= data.len() {
        return Vec::new();
    }
    let end = start.saturating_add(len).min(data.len());
    data[start..end].to_vec()
}

impl ByteSource for SliceSource<'_> {
    fn read_at(&self, _path: &Path, offset: u64, len: usize) -> Vec<u8> {
        slice_range(self.data, offset, len)
    }

    fn exists(&self, _path: &Path) -> bool {
        true
    }

    fn is_file(&self, _path: &Path) -> bool {
        true
    }

    fn is_dir(&self, _path: &Path) -> bool {
        false
    }

    fn is_readable(&self, _path: &Path) -> bool {
        true
    }
}

/// In-memory filesystem for tests and embedding.
///
/// Files are byte vectors keyed by normalized path. Directories are tracked
/// separately, and files can be marked unreadable to simulate permission
/// failures.
///
/// # Example
///
/// ```
/// use filesig_core::{ByteSource, MockFileSystem};
/// use std::path::Path;
///
/// let mut mock = MockFileSystem::new();
/// mock.add_file("archive/data.zip", b"PK\x03\x04".to_vec());
/// mock.add_dir("empty");
///
/// assert!(mock.is_file(Path::new("archive/data.zip")));
/// assert!(mock.is_dir(Path::new("archive")));
/// assert!(mock.is_dir(Path::new("empty")));
/// ```
#[derive(Debug, Default)]
pub struct MockFileSystem {
    files: std::collections::HashMap<PathBuf, Vec<u8>>,
    dirs: std::collections::HashSet<PathBuf>,
    unreadable: std::collections::HashSet<PathBuf>,
}

impl MockFileSystem {
    /// Create a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = normalize_path(path.as_ref());
        if let Some(parent) = path.parent() {
            self.add_dir_recursive(parent);
        }
        self.files.insert(path, content.into());
    }

    /// Add an empty directory.
    ///
    /// Parent directories are automatically created.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        self.add_dir_recursive(path.as_ref());
    }

    /// Mark an existing file as unreadable.
    ///
    /// The file still exists and is still a file, but opening it fails.
    pub fn deny_read(&mut self, path: impl AsRef<Path>) {
        self.unreadable.insert(normalize_path(path.as_ref()));
    }

    fn add_dir_recursive(&mut self, path: &Path) {
        let path = normalize_path(path);
        if path.as_os_str().is_empty() {
            return;
        }
        self.dirs.insert(path.clone());
        if let Some(parent) = path.parent() {
            self.add_dir_recursive(parent);
        }
    }
}

impl ByteSource for MockFileSystem {
    fn read_at(&self, path: &Path, offset: u64, len: usize) -> Vec<u8> {
        let normalized = normalize_path(path);
        if self.unreadable.contains(&normalized) {
            return Vec::new();
        }
        match self.files.get(&normalized) {
            Some(data) => slice_range(data, offset, len),
            None => Vec::new(),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        let normalized = normalize_path(path);
        self.files.contains_key(&normalized) || self.dirs.contains(&normalized)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(&normalize_path(path))
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(&normalize_path(path))
    }

    fn is_readable(&self, path: &Path) -> bool {
        let normalized = normalize_path(path);
        self.files.contains_key(&normalized) && !self.unreadable.contains(&normalized)
    }
}

/// Normalize a path for consistent comparison.
///
/// Removes `.` components and resolves `..` lexically.
fn normalize_path(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(s) => result.push(s),
            Component::RootDir => result.push(component.as_os_str()),
            Component::Prefix(p) => result.push(p.as_os_str()),
        }
    }
    result
}

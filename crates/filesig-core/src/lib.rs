//! # filesig-core
//!
//! Content-based file type identification.
//!
//! A file is identified by its leading bytes, never by its name. The
//! [`FileTypeRegistry`] holds an ordered list of matchers: caller-registered
//! types first (newest first), then the builtin signatures, then the
//! [`UNKNOWN`] sentinel. The first matcher that accepts the file wins.
//!
//! Builtins cover common images (JPEG, PNG, BMP, GIF, WebP, TIFF),
//! archives (Zip, 7-Zip, GZip, BZip2, XZ, RAR, TAR) and Windows
//! executables.
//!
//! ```
//! use std::sync::Arc;
//! use filesig_core::{FileTypeRegistry, SignatureType};
//!
//! let registry = FileTypeRegistry::new();
//! assert_eq!(registry.probe_bytes(b"PK\x03\x04").name(), "Zip");
//!
//! let pdf = SignatureType::builder("PDF")
//!     .extension("pdf")
//!     .mime_type("application/pdf")
//!     .magic_hex(0, "25504446")
//!     .build()
//!     .unwrap();
//! registry.register_type(Arc::new(pdf));
//! assert_eq!(registry.probe_bytes(b"%PDF-1.7").name(), "PDF");
//! ```

#[cfg(feature = "filesystem")]
pub mod batch;
pub mod config;
pub mod diagnostics;
pub mod file_types;
pub mod fs;
pub mod registry;

use std::path::Path;

#[cfg(feature = "filesystem")]
pub use batch::{ProbeReport, probe_directory, probe_paths};
pub use config::{CustomTypeConfig, ProbeConfig, ProbeConfigBuilder};
pub use diagnostics::{ConfigWarning, ProbeError, ProbeResult};
pub use file_types::{
    FileTypeDescriptor, FileTypeRef, MagicPattern, MagicRule, PROBE_WINDOW_LEN, ProbeWindow,
    SignatureType, SignatureTypeBuilder, TypeMetadata, UNKNOWN, UnknownType, builtin_types,
    is_unknown, unknown,
};
pub use fs::{ByteSource, MockFileSystem, RealFileSystem};
pub use registry::{FileTypeRegistry, FileTypeRegistryBuilder, TypeProvider};

/// Identify a file with the process-wide registry.
///
/// See [`FileTypeRegistry::probe_by_content`].
pub fn probe_by_content(path: &Path) -> FileTypeRef {
    FileTypeRegistry::global().probe_by_content(path)
}

/// Identify an in-memory buffer with the process-wide registry.
pub fn probe_bytes(data: &[u8]) -> FileTypeRef {
    FileTypeRegistry::global().probe_bytes(data)
}

/// Register a custom type with the process-wide registry.
///
/// Returns `false` if nothing changed (builtin or duplicate name).
pub fn register_type(descriptor: FileTypeRef) -> bool {
    FileTypeRegistry::global().register_type(descriptor)
}

/// Remove a custom type from the process-wide registry.
pub fn unregister_type(descriptor: &dyn FileTypeDescriptor) -> bool {
    FileTypeRegistry::global().unregister_type(descriptor)
}

/// Custom types currently registered with the process-wide registry.
pub fn get_custom_types() -> Vec<FileTypeRef> {
    FileTypeRegistry::global().custom_types()
}

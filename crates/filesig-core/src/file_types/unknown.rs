//! The Unknown sentinel.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use super::descriptor::{FileTypeDescriptor, FileTypeRef, TypeMetadata};
use super::window::ProbeWindow;
use crate::fs::ByteSource;

pub const UNKNOWN: &str = "Unknown";

/// Fallback type that accepts every file.
///
/// Always the last entry of a registry, so reaching it means no other
/// matcher recognized the file. It is builtin and cannot be unregistered.
#[derive(Debug)]
pub struct UnknownType {
    metadata: TypeMetadata,
}

impl UnknownType {
    fn new() -> Self {
        Self {
            metadata: TypeMetadata::new(UNKNOWN).builtin(),
        }
    }
}

impl FileTypeDescriptor for UnknownType {
    fn metadata(&self) -> &TypeMetadata {
        &self.metadata
    }

    fn matches(&self, _window: Option<&ProbeWindow>, _source: &dyn ByteSource, _path: &Path) -> bool {
        true
    }
}

static UNKNOWN_TYPE: OnceLock<FileTypeRef> = OnceLock::new();

/// The shared Unknown descriptor.
pub fn unknown() -> FileTypeRef {
    Arc::clone(UNKNOWN_TYPE.get_or_init(|| Arc::new(UnknownType::new())))
}

/// Returns `true` if `ft` is the Unknown sentinel.
pub fn is_unknown(ft: &dyn FileTypeDescriptor) -> bool {
    ft.is_builtin() && ft.name() == UNKNOWN
}

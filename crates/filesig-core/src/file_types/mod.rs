//! File type descriptors and signature matching.
//!
//! This module provides:
//!
//! - [`FileTypeDescriptor`] -- trait for anything that can recognize a file
//! - [`SignatureType`] -- descriptor driven by magic-byte patterns
//! - [`builtin_types`] -- the shipped signatures in probe order
//! - [`unknown`] -- the always-matching fallback
//! - [`ProbeWindow`] -- leading bytes shared by matchers during a probe
//!
//! ## Extending detection
//!
//! Implement [`FileTypeDescriptor`] (or build a [`SignatureType`]) and pass
//! it to [`FileTypeRegistry::register_type`](crate::FileTypeRegistry::register_type).
//! Registered types are consulted before every builtin.

pub mod builtin;
mod descriptor;
mod signature;
mod unknown;
mod window;

pub use builtin::{builtin, builtin_types};
pub use descriptor::{FileTypeDescriptor, FileTypeRef, TypeMetadata};
pub use signature::{MagicPattern, MagicRule, SignatureType, SignatureTypeBuilder};
pub use unknown::{UNKNOWN, UnknownType, is_unknown, unknown};
pub use window::{PROBE_WINDOW_LEN, ProbeWindow};

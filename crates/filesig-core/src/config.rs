//! Probe configuration loaded from `.filesig.toml`.
//!
//! ```toml
//! exclude = ["target/**", "*.tmp"]
//! follow_hidden = false
//! max_files = 10000
//!
//! [[custom_types]]
//! name = "PDF"
//! description = "Portable Document Format"
//! extensions = ["pdf"]
//! mime_types = ["application/pdf"]
//! magic = ["25504446"]
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{ConfigWarning, ProbeError, ProbeResult};
use crate::file_types::{FileTypeRef, SignatureType, builtin};
use crate::registry::{FileTypeRegistry, TypeProvider};

/// One `[[custom_types]]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomTypeConfig {
    pub name: String,
    pub description: Option<String>,
    pub extensions: Vec<String>,
    pub mime_types: Vec<String>,
    /// Byte offset every `magic` entry is matched at.
    pub offset: u64,
    /// Hex byte sequences; the type matches when any one of them does.
    pub magic: Vec<String>,
}

impl CustomTypeConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build the signature descriptor this table describes.
    pub fn to_descriptor(&self) -> ProbeResult<SignatureType> {
        let mut builder = SignatureType::builder(self.name.trim());
        if let Some(description) = &self.description {
            builder.description(description);
        }
        for ext in &self.extensions {
            builder.extension(ext);
        }
        for mime in &self.mime_types {
            builder.mime_type(mime);
        }
        for magic in &self.magic {
            builder.magic_hex(self.offset, magic);
        }
        builder.build()
    }
}

/// Settings for probing and directory walks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Caller-defined signatures, registered in table order.
    pub custom_types: Vec<CustomTypeConfig>,

    /// Glob patterns skipped during directory probing.
    pub exclude: Vec<String>,

    /// Include dot-files and dot-directories in directory walks.
    pub follow_hidden: bool,

    /// Stop a directory probe after this many files.
    pub max_files: Option<usize>,
}

impl ProbeConfig {
    /// Create a new [`ProbeConfigBuilder`].
    pub fn builder() -> ProbeConfigBuilder {
        ProbeConfigBuilder::new()
    }

    /// Load config from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> ProbeResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ProbeError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ProbeError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load config or use default, returning any load warning.
    ///
    /// A path that cannot be read or parsed yields the default config plus a
    /// message describing the failure, so a typo never silently disables
    /// custom types.
    pub fn load_or_default(path: Option<&PathBuf>) -> (Self, Option<String>) {
        match path {
            Some(p) => match Self::load(p) {
                Ok(config) => (config, None),
                Err(e) => (Self::default(), Some(format!("{e}; using default config"))),
            },
            None => (Self::default(), None),
        }
    }

    /// Validate the configuration and return any warnings.
    ///
    /// Checks that exclude globs compile, that every custom type builds, and
    /// that custom type names are neither duplicated nor taken by a builtin.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        for (i, pattern) in self.exclude.iter().enumerate() {
            if let Err(e) = glob::Pattern::new(&pattern.replace('\\', "/")) {
                warnings.push(ConfigWarning::new(
                    format!("exclude[{i}]"),
                    format!("invalid glob '{pattern}': {e}"),
                ));
            }
        }

        if self.max_files == Some(0) {
            warnings.push(ConfigWarning::new(
                "max_files",
                "must be at least 1 (omit it for no limit)",
            ));
        }

        let mut seen = HashSet::new();
        for (i, custom) in self.custom_types.iter().enumerate() {
            if let Err(e) = custom.to_descriptor() {
                warnings.push(ConfigWarning::new(format!("custom_types[{i}]"), e.to_string()));
                continue;
            }
            let name = custom.name.trim();
            if builtin(name).is_some() || name == crate::file_types::UNKNOWN {
                warnings.push(ConfigWarning::new(
                    format!("custom_types[{i}].name"),
                    format!("'{name}' is a builtin type"),
                ));
            } else if !seen.insert(name) {
                warnings.push(ConfigWarning::new(
                    format!("custom_types[{i}].name"),
                    format!("duplicate custom type '{name}'"),
                ));
            }
        }

        warnings
    }

    /// Compile the exclude globs.
    ///
    /// Backslashes are treated as separators and a trailing `/` means
    /// "everything under this directory" (`target/` becomes `target/**`).
    pub fn exclude_patterns(&self) -> ProbeResult<Vec<glob::Pattern>> {
        self.exclude
            .iter()
            .map(|pattern| {
                let normalized = pattern.replace('\\', "/");
                let glob_str = match normalized.strip_suffix('/') {
                    Some(prefix) => format!("{prefix}/**"),
                    None => normalized,
                };
                glob::Pattern::new(&glob_str).map_err(|source| ProbeError::ExcludePattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect()
    }

    /// Descriptors for every custom type that builds, in table order.
    ///
    /// Tables that fail to build are reported as warnings and skipped.
    pub fn custom_descriptors(&self) -> (Vec<FileTypeRef>, Vec<ConfigWarning>) {
        let mut descriptors = Vec::new();
        let mut warnings = Vec::new();
        for (i, custom) in self.custom_types.iter().enumerate() {
            match custom.to_descriptor() {
                Ok(sig) => descriptors.push(Arc::new(sig) as FileTypeRef),
                Err(e) => {
                    warnings.push(ConfigWarning::new(format!("custom_types[{i}]"), e.to_string()))
                }
            }
        }
        (descriptors, warnings)
    }

    /// Register the custom types with `registry`.
    ///
    /// Tables are registered in order, so the last table is probed first.
    /// Entries that fail to build or that the registry refuses (builtin or
    /// already-registered names) are returned as warnings.
    pub fn apply(&self, registry: &FileTypeRegistry) -> Vec<ConfigWarning> {
        let (descriptors, mut warnings) = self.custom_descriptors();
        let mut applied = 0usize;
        for descriptor in descriptors {
            let name = descriptor.name().to_string();
            if registry.register_type(descriptor) {
                applied += 1;
            } else {
                warnings.push(ConfigWarning::new(
                    "custom_types",
                    format!("'{name}' not registered: name already in use"),
                ));
            }
        }
        tracing::debug!(applied, skipped = warnings.len(), "applied custom types");
        warnings
    }
}

impl TypeProvider for ProbeConfig {
    fn types(&self) -> Vec<FileTypeRef> {
        self.custom_descriptors().0
    }
}

/// Builder for [`ProbeConfig`].
///
/// # Example
///
/// ```
/// use filesig_core::{CustomTypeConfig, ProbeConfig};
///
/// let mut pdf = CustomTypeConfig::new("PDF");
/// pdf.magic.push("25504446".into());
///
/// let config = ProbeConfig::builder()
///     .exclude("target/**")
///     .custom_type(pdf)
///     .max_files(100)
///     .build()
///     .unwrap();
/// assert_eq!(config.custom_types.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ProbeConfigBuilder {
    custom_types: Vec<CustomTypeConfig>,
    exclude: Vec<String>,
    follow_hidden: Option<bool>,
    max_files: Option<usize>,
}

impl ProbeConfigBuilder {
    fn new() -> Self {
        Self::default()
    }

    pub fn custom_type(&mut self, custom: CustomTypeConfig) -> &mut Self {
        self.custom_types.push(custom);
        self
    }

    pub fn exclude(&mut self, pattern: impl Into<String>) -> &mut Self {
        self.exclude.push(pattern.into());
        self
    }

    pub fn follow_hidden(&mut self, follow: bool) -> &mut Self {
        self.follow_hidden = Some(follow);
        self
    }

    pub fn max_files(&mut self, max: usize) -> &mut Self {
        self.max_files = Some(max);
        self
    }

    /// Build the `ProbeConfig` and run validation.
    ///
    /// Any validation warning is promoted to
    /// [`ProbeError::ConfigValidation`].
    pub fn build(&mut self) -> ProbeResult<ProbeConfig> {
        let config = self.build_unchecked();
        let warnings = config.validate();
        if !warnings.is_empty() {
            return Err(ProbeError::ConfigValidation(warnings));
        }
        Ok(config)
    }

    /// Build the `ProbeConfig` without validation.
    pub fn build_unchecked(&mut self) -> ProbeConfig {
        ProbeConfig {
            custom_types: std::mem::take(&mut self.custom_types),
            exclude: std::mem::take(&mut self.exclude),
            follow_hidden: self.follow_hidden.take().unwrap_or(false),
            max_files: self.max_files.take(),
        }
    }
}

//! Probing many files at once.
//!
//! [`probe_directory`] walks a tree with `ignore::WalkBuilder`, prunes
//! excluded directories early, and probes the surviving files on the rayon
//! pool. `.gitignore` and `.ignore` files are not consulted.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;

use crate::config::ProbeConfig;
use crate::diagnostics::{ProbeError, ProbeResult};
use crate::file_types::FileTypeDescriptor;
use crate::registry::FileTypeRegistry;

/// The identification result for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub path: PathBuf,
    pub name: String,
    pub description: String,
    pub builtin: bool,
    pub primary_extension: String,
    pub primary_mime_type: String,
}

impl ProbeReport {
    pub fn new(path: impl Into<PathBuf>, ft: &dyn FileTypeDescriptor) -> Self {
        Self {
            path: path.into(),
            name: ft.name().to_string(),
            description: ft.description().to_string(),
            builtin: ft.is_builtin(),
            primary_extension: ft.primary_extension().to_string(),
            primary_mime_type: ft.primary_mime_type().to_string(),
        }
    }

    /// True when no registered matcher recognized the file.
    pub fn is_unknown(&self) -> bool {
        self.builtin && self.name == crate::file_types::UNKNOWN
    }
}

/// Probe an explicit list of paths in parallel, preserving input order.
pub fn probe_paths(paths: &[PathBuf], registry: &FileTypeRegistry) -> Vec<ProbeReport> {
    paths
        .par_iter()
        .map(|path| ProbeReport::new(path.clone(), registry.probe_by_content(path).as_ref()))
        .collect()
}

/// Probe every regular file under `root`.
///
/// Hidden entries are skipped unless `config.follow_hidden` is set, and
/// `config.exclude` globs are matched against `/`-separated paths relative to
/// `root`. At most `config.max_files` files are probed, taken in walk order.
/// Reports are sorted by path.
pub fn probe_directory(
    root: &Path,
    registry: &FileTypeRegistry,
    config: &ProbeConfig,
) -> ProbeResult<Vec<ProbeReport>> {
    use ignore::WalkBuilder;
    use std::sync::Arc;

    if !root.is_dir() {
        return Err(ProbeError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let exclude_patterns = Arc::new(config.exclude_patterns()?);
    let root_path = root.to_path_buf();

    let walk = WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(!config.follow_hidden)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry({
            let exclude_patterns = Arc::clone(&exclude_patterns);
            let root_path = root_path.clone();
            move |entry| {
                let entry_path = entry.path();
                if entry_path == root_path {
                    return true;
                }
                if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                    let rel_path = normalize_rel_path(entry_path, &root_path);
                    return !should_prune_dir(&rel_path, &exclude_patterns);
                }
                true
            }
        })
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "skipping walk entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .filter(|entry| {
            let rel_path = normalize_rel_path(entry.path(), &root_path);
            !is_excluded_file(&rel_path, &exclude_patterns)
        })
        .map(|entry| entry.into_path());

    let paths: Vec<PathBuf> = match config.max_files {
        Some(limit) => {
            let mut paths: Vec<PathBuf> = walk.take(limit.saturating_add(1)).collect();
            if paths.len() > limit {
                tracing::warn!(limit, root = %root.display(), "file limit reached, stopping walk");
                paths.truncate(limit);
            }
            paths
        }
        None => walk.collect(),
    };

    tracing::debug!(root = %root.display(), files = paths.len(), "probing directory");
    let mut reports = probe_paths(&paths, registry);
    reports.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(reports)
}

fn normalize_rel_path(entry_path: &Path, root: &Path) -> String {
    let rel_path = entry_path.strip_prefix(root).unwrap_or(entry_path);
    let path_str = rel_path.to_string_lossy().replace('\\', "/");
    match path_str.strip_prefix("./") {
        Some(stripped) => stripped.to_string(),
        None => path_str,
    }
}

fn should_prune_dir(rel_dir: &str, exclude_patterns: &[glob::Pattern]) -> bool {
    if rel_dir.is_empty() {
        return false;
    }
    // Recursive patterns also exclude a directory whose contents they match.
    let probe = format!("{}/__filesig_probe__", rel_dir.trim_end_matches('/'));
    exclude_patterns.iter().any(|p| {
        p.matches(rel_dir) || (p.as_str().contains("**") && p.matches(&probe))
    })
}

fn is_excluded_file(rel_path: &str, exclude_patterns: &[glob::Pattern]) -> bool {
    exclude_patterns.iter().any(|p| p.matches(rel_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_types::builtin::{EXE, GZIP, JPEG, PNG, TAR, ZIP};
    use crate::file_types::{SignatureType, UNKNOWN};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, data: &[u8]) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, data).unwrap();
    }

    fn names(reports: &[ProbeReport], root: &Path) -> Vec<(String, String)> {
        reports
            .iter()
            .map(|r| (normalize_rel_path(&r.path, root), r.name.clone()))
            .collect()
    }

    fn sample_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "a.jpg", &[0xFF, 0xD8, 0xFF, 0xE0]);
        write(root, "b.zip", b"PK\x03\x04rest");
        write(root, "empty.dat", b"");
        write(root, "notes.txt", b"just text");
        let mut tar = vec![0u8; 512];
        tar[257..262].copy_from_slice(b"ustar");
        write(root, "nested/c.tar", &tar);
        write(root, "nested/deeper/d.gz", &[0x1F, 0x8B, 0x08, 0x00]);
        write(root, ".hidden/e.png", b"\x89PNG\r\n\x1a\n");
        temp
    }

    #[test]
    fn probes_every_file_sorted() {
        let temp = sample_tree();
        let registry = FileTypeRegistry::new();
        let reports = probe_directory(temp.path(), &registry, &ProbeConfig::default()).unwrap();

        assert_eq!(
            names(&reports, temp.path()),
            vec![
                ("a.jpg".to_string(), JPEG.to_string()),
                ("b.zip".to_string(), ZIP.to_string()),
                ("empty.dat".to_string(), UNKNOWN.to_string()),
                ("nested/c.tar".to_string(), TAR.to_string()),
                ("nested/deeper/d.gz".to_string(), GZIP.to_string()),
                ("notes.txt".to_string(), UNKNOWN.to_string()),
            ]
        );
        assert!(reports[2].is_unknown());
        assert!(!reports[0].is_unknown());
    }

    #[test]
    fn follow_hidden_includes_dot_dirs() {
        let temp = sample_tree();
        let registry = FileTypeRegistry::new();
        let config = ProbeConfig {
            follow_hidden: true,
            ..ProbeConfig::default()
        };
        let reports = probe_directory(temp.path(), &registry, &config).unwrap();
        let found = names(&reports, temp.path());
        assert!(found.contains(&(".hidden/e.png".to_string(), PNG.to_string())));
    }

    #[test]
    fn exclude_prunes_directories_and_files() {
        let temp = sample_tree();
        let registry = FileTypeRegistry::new();
        let config = ProbeConfig {
            exclude: vec!["nested/".to_string(), "*.txt".to_string()],
            ..ProbeConfig::default()
        };
        let reports = probe_directory(temp.path(), &registry, &config).unwrap();
        let paths: Vec<String> = names(&reports, temp.path()).into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["a.jpg", "b.zip", "empty.dat"]);
    }

    #[test]
    fn gitignored_files_are_still_identified() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        write(root, ".gitignore", b"*.zip\nbuild/\n");
        write(root, ".ignore", b"*.gz\n");
        write(root, "a.zip", b"PK\x03\x04");
        write(root, "b.gz", &[0x1F, 0x8B, 0x08, 0x00]);
        write(root, "build/out.exe", b"MZ\x90\x00");

        let registry = FileTypeRegistry::new();
        let reports = probe_directory(root, &registry, &ProbeConfig::default()).unwrap();
        assert_eq!(
            names(&reports, root),
            vec![
                ("a.zip".to_string(), ZIP.to_string()),
                ("b.gz".to_string(), GZIP.to_string()),
                ("build/out.exe".to_string(), EXE.to_string()),
            ]
        );
    }

    #[test]
    fn max_files_bounds_the_walk() {
        let temp = sample_tree();
        let registry = FileTypeRegistry::new();
        let config = ProbeConfig {
            max_files: Some(2),
            ..ProbeConfig::default()
        };
        let reports = probe_directory(temp.path(), &registry, &config).unwrap();
        assert_eq!(reports.len(), 2);
    }

    #[test]
    fn custom_types_apply_to_walk() {
        let temp = sample_tree();
        write(temp.path(), "doc.pdf", b"%PDF-1.4");
        let registry = FileTypeRegistry::new();
        registry.register_type(Arc::new(
            SignatureType::builder("PDF").magic_hex(0, "25504446").build().unwrap(),
        ));
        let reports = probe_directory(temp.path(), &registry, &ProbeConfig::default()).unwrap();
        let pdf = reports.iter().find(|r| r.path.ends_with("doc.pdf")).unwrap();
        assert_eq!(pdf.name, "PDF");
        assert!(!pdf.builtin);
    }

    #[test]
    fn file_root_is_rejected() {
        let temp = sample_tree();
        let registry = FileTypeRegistry::new();
        let err = probe_directory(&temp.path().join("a.jpg"), &registry, &ProbeConfig::default())
            .unwrap_err();
        assert!(matches!(err, ProbeError::NotADirectory { .. }));
    }

    #[test]
    fn bad_exclude_is_an_error() {
        let temp = sample_tree();
        let registry = FileTypeRegistry::new();
        let config = ProbeConfig {
            exclude: vec!["[oops".to_string()],
            ..ProbeConfig::default()
        };
        assert!(matches!(
            probe_directory(temp.path(), &registry, &config),
            Err(ProbeError::ExcludePattern { .. })
        ));
    }

    #[test]
    fn probe_paths_keeps_input_order() {
        let temp = sample_tree();
        let registry = FileTypeRegistry::new();
        let paths = vec![
            temp.path().join("b.zip"),
            temp.path().join("missing.bin"),
            temp.path().join("a.jpg"),
        ];
        let reports = probe_paths(&paths, &registry);
        let found: Vec<&str> = reports.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(found, vec![ZIP, UNKNOWN, JPEG]);
    }

    #[test]
    fn report_serializes() {
        let report = ProbeReport::new("x.zip", crate::file_types::builtin(ZIP).unwrap().as_ref());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["name"], "Zip");
        assert_eq!(json["primary_mime_type"], "application/zip");
        assert_eq!(json["builtin"], true);
    }

    #[test]
    fn prune_rules() {
        let patterns = vec![
            glob::Pattern::new("target/**").unwrap(),
            glob::Pattern::new("*.log").unwrap(),
        ];
        assert!(should_prune_dir("target", &patterns));
        assert!(!should_prune_dir("src", &patterns));
        assert!(!should_prune_dir("", &patterns));
        assert!(is_excluded_file("run.log", &patterns));
        assert!(!is_excluded_file("run.txt", &patterns));
    }
}

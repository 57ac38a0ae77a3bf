//! Builtin file types in their curated probe order.
//!
//! Probing is first-match-wins, so order matters. Images come first, then
//! compressed archives, then executables. TAR sits after every byte-0
//! signature because it is the only builtin that costs an extra read.

use std::sync::{Arc, OnceLock};

use super::descriptor::{FileTypeRef, TypeMetadata};
use super::signature::{MagicPattern, MagicRule, SignatureType};

pub const JPEG: &str = "JPEG";
pub const PNG: &str = "PNG";
pub const BMP: &str = "BMP";
pub const GIF: &str = "GIF";
pub const WEBP: &str = "WebP";
pub const TIFF: &str = "TIFF";
pub const ZIP: &str = "Zip";
pub const SEVEN_ZIP: &str = "7-Zip";
pub const GZIP: &str = "GZip";
pub const BZIP2: &str = "BZip2";
pub const XZ: &str = "XZ";
pub const RAR: &str = "RAR";
pub const TAR: &str = "TAR";
pub const EXE: &str = "EXE";

/// Byte offset of the `ustar` magic inside a POSIX tar header.
pub const TAR_MAGIC_OFFSET: u64 = 257;

struct Entry {
    name: &'static str,
    description: &'static str,
    extensions: &'static [&'static str],
    mime_types: &'static [&'static str],
    /// `(offset, hex)` pairs.
    magic: &'static [(u64, &'static str)],
    all: bool,
}

const TABLE: &[Entry] = &[
    // ----- images -----
    Entry {
        name: JPEG,
        description: "JPEG Image",
        extensions: &["jpg", "jpeg"],
        mime_types: &["image/jpeg"],
        magic: &[(0, "FFD8FF")],
        all: false,
    },
    Entry {
        name: PNG,
        description: "Portable Network Graphics",
        extensions: &["png"],
        mime_types: &["image/png"],
        magic: &[(0, "89504E470D0A1A0A")],
        all: false,
    },
    Entry {
        name: BMP,
        description: "Windows BMP",
        extensions: &["bmp"],
        mime_types: &["image/bmp", "image/x-ms-bmp"],
        magic: &[(0, "424D")],
        all: false,
    },
    Entry {
        name: GIF,
        description: "Graphics Interchange Format",
        extensions: &["gif"],
        mime_types: &["image/gif"],
        // GIF87a, GIF89a
        magic: &[(0, "474946383761"), (0, "474946383961")],
        all: false,
    },
    Entry {
        name: WEBP,
        description: "WebP",
        extensions: &["webp"],
        mime_types: &["image/webp"],
        // "RIFF" container tag, "WEBP" form type at byte 8
        magic: &[(0, "52494646"), (8, "57454250")],
        all: true,
    },
    Entry {
        name: TIFF,
        description: "Tag Image File Format",
        extensions: &["tiff", "tif"],
        mime_types: &["image/tiff"],
        magic: &[(0, "49492A00")],
        all: false,
    },
    // ----- archives -----
    Entry {
        name: ZIP,
        description: "Zip Archive",
        extensions: &["zip"],
        mime_types: &["application/zip", "application/x-zip-compressed"],
        magic: &[(0, "504B")],
        all: false,
    },
    Entry {
        name: SEVEN_ZIP,
        description: "7-Zip Archive",
        extensions: &["7z"],
        mime_types: &["application/x-7z-compressed"],
        magic: &[(0, "377ABCAF271C")],
        all: false,
    },
    Entry {
        name: GZIP,
        description: "GNU Zip Archive",
        extensions: &["gz", "tgz"],
        mime_types: &["application/gzip"],
        magic: &[(0, "1F8B08")],
        all: false,
    },
    Entry {
        name: BZIP2,
        description: "BZip2 Archive",
        extensions: &["bz2"],
        mime_types: &["application/x-bzip2", "application/bz2"],
        magic: &[(0, "425A68")],
        all: false,
    },
    Entry {
        name: XZ,
        description: "XZ Archive",
        extensions: &["xz"],
        mime_types: &["application/x-xz"],
        magic: &[(0, "FD377A585A00")],
        all: false,
    },
    Entry {
        name: RAR,
        description: "RAR Archive",
        extensions: &["rar"],
        mime_types: &["application/x-rar-compressed", "application/vnd.rar"],
        // RAR 4.x, RAR 5.x
        magic: &[(0, "526172211A0700"), (0, "526172211A0701")],
        all: false,
    },
    Entry {
        name: TAR,
        description: "Tape Archive",
        extensions: &["tar"],
        mime_types: &["application/x-tar"],
        magic: &[(TAR_MAGIC_OFFSET, "7573746172")],
        all: false,
    },
    // ----- programs -----
    Entry {
        name: EXE,
        description: "Executable for Windows",
        extensions: &["exe"],
        mime_types: &[
            "application/vnd.microsoft.portable-executable",
            "application/x-msdownload",
            "application/x-msdos-program",
        ],
        magic: &[(0, "4D5A")],
        all: false,
    },
];

impl Entry {
    fn to_descriptor(&self) -> SignatureType {
        let mut metadata = TypeMetadata::new(self.name)
            .with_description(self.description)
            .builtin();
        for ext in self.extensions {
            metadata = metadata.with_extension(*ext);
        }
        for mime in self.mime_types {
            metadata = metadata.with_mime_type(*mime);
        }

        let patterns = self
            .magic
            .iter()
            .map(|&(offset, hex)| MagicPattern::trusted(offset, hex))
            .collect();
        let rule = if self.all {
            MagicRule::AllOf(patterns)
        } else {
            MagicRule::AnyOf(patterns)
        };
        SignatureType::new(metadata, rule)
    }
}

static BUILTINS: OnceLock<Vec<FileTypeRef>> = OnceLock::new();

/// All builtin signature types in probe order, excluding the Unknown sentinel.
pub fn builtin_types() -> &'static [FileTypeRef] {
    BUILTINS.get_or_init(|| {
        TABLE
            .iter()
            .map(|entry| Arc::new(entry.to_descriptor()) as FileTypeRef)
            .collect()
    })
}

/// Look up a builtin by canonical name.
pub fn builtin(name: &str) -> Option<&'static FileTypeRef> {
    builtin_types().iter().find(|ft| ft.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_types::window::ProbeWindow;
    use crate::fs::MockFileSystem;
    use std::collections::HashSet;
    use std::path::Path;

    fn window_match(name: &str, bytes: &[u8]) -> bool {
        let ft = builtin(name).unwrap();
        let window = ProbeWindow::new(bytes.to_vec());
        ft.matches(Some(&window), &MockFileSystem::new(), Path::new("x"))
    }

    #[test]
    fn order_is_curated() {
        let names: Vec<&str> = builtin_types().iter().map(|ft| ft.name()).collect();
        assert_eq!(
            names,
            vec![
                JPEG, PNG, BMP, GIF, WEBP, TIFF, ZIP, SEVEN_ZIP, GZIP, BZIP2, XZ, RAR, TAR, EXE
            ]
        );
    }

    #[test]
    fn names_are_unique() {
        let mut seen = HashSet::new();
        for ft in builtin_types() {
            assert!(seen.insert(ft.name()), "duplicate builtin {}", ft.name());
        }
    }

    #[test]
    fn all_are_builtin_with_metadata() {
        for ft in builtin_types() {
            assert!(ft.is_builtin(), "{} should be builtin", ft.name());
            assert!(!ft.primary_extension().is_empty(), "{} extension", ft.name());
            assert!(!ft.primary_mime_type().is_empty(), "{} mime", ft.name());
            assert!(ft.extensions().contains(ft.primary_extension()));
            assert!(ft.mime_types().contains(ft.primary_mime_type()));
        }
    }

    #[test]
    fn table_literals_are_valid_hex() {
        for entry in TABLE {
            assert!(!entry.magic.is_empty(), "{} has no magic", entry.name);
            for &(offset, hex) in entry.magic {
                let parsed = MagicPattern::from_hex(offset, hex).unwrap();
                assert_eq!(parsed, MagicPattern::trusted(offset, hex), "{}", entry.name);
            }
        }
    }

    #[test]
    fn only_tar_reads_past_the_window() {
        for entry in TABLE {
            let descriptor = entry.to_descriptor();
            let outside = descriptor
                .rule()
                .patterns()
                .iter()
                .any(|p| !p.in_window());
            assert_eq!(outside, entry.name == TAR, "{}", entry.name);
        }
    }

    #[test]
    fn jpeg_signature() {
        assert!(window_match(JPEG, &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46]));
        assert!(!window_match(JPEG, &[0xFF, 0xD8]));
    }

    #[test]
    fn png_signature() {
        assert!(window_match(
            PNG,
            &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00]
        ));
    }

    #[test]
    fn gif_signatures() {
        assert!(window_match(GIF, b"GIF87a\x01\x00"));
        assert!(window_match(GIF, b"GIF89a\x01\x00"));
        assert!(!window_match(GIF, b"GIF90a\x01\x00"));
    }

    #[test]
    fn webp_needs_both_tags() {
        assert!(window_match(WEBP, b"RIFF\x1a\x00\x00\x00WEBPVP8 "));
        assert!(!window_match(WEBP, b"RIFF\x1a\x00\x00\x00AVI LIST"));
        assert!(!window_match(WEBP, b"RIFF"));
    }

    #[test]
    fn rar_versions() {
        assert!(window_match(RAR, b"Rar!\x1a\x07\x00"));
        assert!(window_match(RAR, b"Rar!\x1a\x07\x01\x00"));
        assert!(!window_match(RAR, b"Rar!\x1a\x07"));
    }

    #[test]
    fn tar_ignores_the_window() {
        let mut data = vec![0u8; 512];
        data[257..262].copy_from_slice(b"ustar");
        let mut mock = MockFileSystem::new();
        mock.add_file("a.tar", data);

        let tar = builtin(TAR).unwrap();
        // A window full of unrelated bytes must not matter.
        let window = ProbeWindow::new(vec![0x4D, 0x5A, 0x90, 0x00]);
        assert!(tar.matches(Some(&window), &mock, Path::new("a.tar")));
        assert!(tar.matches(None, &mock, Path::new("a.tar")));
    }

    #[test]
    fn matches_file_reads_its_own_bytes() {
        let temp = tempfile::TempDir::new().unwrap();
        let jpg = temp.path().join("photo");
        std::fs::write(&jpg, [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]).unwrap();
        let mut tar_bytes = vec![0u8; 512];
        tar_bytes[257..262].copy_from_slice(b"ustar");
        let tar = temp.path().join("bundle");
        std::fs::write(&tar, &tar_bytes).unwrap();

        assert!(builtin(JPEG).unwrap().matches_file(&jpg));
        assert!(!builtin(JPEG).unwrap().matches_file(&tar));
        assert!(builtin(TAR).unwrap().matches_file(&tar));
        assert!(!builtin(TAR).unwrap().matches_file(&jpg));
        assert!(!builtin(ZIP).unwrap().matches_file(&temp.path().join("missing")));
    }

    #[test]
    fn unknown_name_lookup() {
        assert!(builtin("Unknown").is_none());
        assert!(builtin("jpeg").is_none());
        assert!(builtin(JPEG).is_some());
    }
}

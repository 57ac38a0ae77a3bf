//! Probing from many threads while others register and unregister types.

use std::path::Path;
use std::sync::Arc;
use std::thread;

use filesig_core::{FileTypeRef, FileTypeRegistry, MockFileSystem, SignatureType, UNKNOWN};

fn mock() -> Arc<MockFileSystem> {
    let mut mock = MockFileSystem::new();
    mock.add_file("a.zip", b"PK\x03\x04".to_vec());
    mock.add_file("a.jpg", vec![0xFF, 0xD8, 0xFF, 0xE0]);
    mock.add_file("custom.bin", vec![0xC0, 0xFF, 0xEE, 0x00]);
    let mut tar = vec![0u8; 512];
    tar[257..262].copy_from_slice(b"ustar");
    mock.add_file("a.tar", tar);
    Arc::new(mock)
}

fn coffee(name: &str) -> FileTypeRef {
    Arc::new(
        SignatureType::builder(name)
            .magic_hex(0, "C0FFEE")
            .build()
            .unwrap(),
    )
}

#[test]
fn parallel_probes_agree() {
    let registry = Arc::new(FileTypeRegistry::with_fs(mock()));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..200 {
                    assert_eq!(registry.probe_by_content(Path::new("a.zip")).name(), "Zip");
                    assert_eq!(registry.probe_by_content(Path::new("a.jpg")).name(), "JPEG");
                    assert_eq!(registry.probe_by_content(Path::new("a.tar")).name(), "TAR");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn probes_see_before_or_after_state_during_mutation() {
    let registry = Arc::new(FileTypeRegistry::with_fs(mock()));

    let writer = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            let custom = coffee("Coffee");
            for _ in 0..200 {
                assert!(registry.register_type(Arc::clone(&custom)));
                assert!(registry.unregister_type(custom.as_ref()));
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..500 {
                    let name = registry.probe_by_content(Path::new("custom.bin")).name().to_string();
                    assert!(name == "Coffee" || name == UNKNOWN, "torn result: {name}");
                    // Builtins are never disturbed by custom churn.
                    assert_eq!(registry.probe_by_content(Path::new("a.zip")).name(), "Zip");
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert!(registry.custom_types().is_empty());
}

#[test]
fn concurrent_registration_of_same_name_admits_one() {
    let registry = Arc::new(FileTypeRegistry::with_fs(mock()));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.register_type(coffee("Coffee")))
        })
        .collect();

    let admitted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|&ok| ok)
        .count();
    assert_eq!(admitted, 1);
    assert_eq!(registry.custom_types().len(), 1);
}

#[test]
fn distinct_registrations_from_many_threads() {
    let registry = Arc::new(FileTypeRegistry::with_fs(mock()));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.register_type(coffee(&format!("Coffee{i}"))))
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert_eq!(registry.custom_types().len(), 8);
    assert_eq!(registry.types().last().unwrap().name(), UNKNOWN);

    // Whichever thread registered last owns the front slot.
    let front = registry.custom_types()[0].name().to_string();
    assert_eq!(
        registry.probe_by_content(Path::new("custom.bin")).name(),
        front
    );
}

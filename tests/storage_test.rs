//! Integration tests for from-storage operations.

mod common;

use pagesmith::protect::{is_encrypted, LopdfProvider};
use pagesmith::{
    CompressOptions, ErrorKind, FsStorage, MemoryStorage, MergeOptions, Pagesmith,
    ProtectionEngine, ProtectionRequest, RenderOptions, SplitOptions, StorageGateway, TargetKind,
};

fn seeded() -> (tempfile::TempDir, FsStorage) {
    let dir = tempfile::tempdir().unwrap();
    let storage = FsStorage::new(dir.path());
    storage
        .write("in/a.pdf", &common::pdf(2, "a", &[]), "application/pdf")
        .unwrap();
    storage
        .write("in/b.pdf", &common::pdf(3, "b", &[]), "application/pdf")
        .unwrap();
    (dir, storage)
}

#[test]
fn test_merge_split_compress_on_disk() {
    let (dir, storage) = seeded();
    let ops = Pagesmith::new().with_storage(storage);

    let merged = ops
        .merge_from_storage(&["in/a.pdf", "in/b.pdf"], "out/all.pdf", &MergeOptions::default())
        .unwrap();
    assert_eq!(merged.page_count, Some(5));
    assert_eq!(merged.size, std::fs::metadata(dir.path().join("out/all.pdf")).unwrap().len() as usize);

    let parts = ops
        .split_from_storage("out/all.pdf", "out/parts", &SplitOptions::every(2))
        .unwrap();
    let names: Vec<&str> = parts.iter().map(|p| p.filename.as_str()).collect();
    assert_eq!(
        names,
        vec!["out/parts/all_part01.pdf", "out/parts/all_part02.pdf", "out/parts/all_part03.pdf"]
    );
    for part in &parts {
        assert!(dir.path().join(&part.filename).exists());
    }

    let compressed = ops
        .compress_from_storage("out/all.pdf", "out/small.pdf", &CompressOptions::default())
        .unwrap();
    assert_eq!(compressed.page_count, Some(5));
    assert!(compressed.compression_ratio.is_some());
}

#[test]
fn test_convert_from_storage_writes_target() {
    let storage = MemoryStorage::new();
    storage
        .insert("notes.txt", b"Name\t\tRole\nAnn\t\tLead\n".to_vec(), "text/plain")
        .unwrap();
    let ops = Pagesmith::new().with_storage(storage);

    let output = ops
        .convert_from_storage("notes.txt", "notes.xlsx", TargetKind::Xlsx, &RenderOptions::default())
        .unwrap();
    assert_eq!(output.filename, "notes.xlsx");
    assert_eq!(output.page_count, Some(1));
    assert!(output.size > 0);
}

#[test]
fn test_encrypt_and_decrypt_from_storage() {
    let (dir, storage) = seeded();
    let engine = ProtectionEngine::with_providers(vec![Box::new(LopdfProvider)]);
    let ops = Pagesmith::new().with_storage(storage).with_protection(engine);

    let locked = ops
        .encrypt_from_storage("in/a.pdf", "locked.pdf", &ProtectionRequest::new("pw"))
        .unwrap();
    assert_eq!(locked.encrypted, Some(true));
    let bytes = std::fs::read(dir.path().join("locked.pdf")).unwrap();
    assert!(is_encrypted(&bytes));

    let err = ops
        .decrypt_from_storage("locked.pdf", "open.pdf", "nope")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PasswordError);
    assert!(!dir.path().join("open.pdf").exists());

    ops.encrypt_from_storage("in/a.pdf", "owner-only.pdf", &ProtectionRequest::new(""))
        .unwrap();
    let open = ops
        .decrypt_from_storage("owner-only.pdf", "open.pdf", "")
        .unwrap();
    assert_eq!(open.encrypted, Some(false));
    let bytes = std::fs::read(dir.path().join("open.pdf")).unwrap();
    assert!(!is_encrypted(&bytes));
}

#[test]
fn test_rotate_missing_input() {
    let (_dir, storage) = seeded();
    let ops = Pagesmith::new().with_storage(storage);
    let err = ops
        .rotate_from_storage("in/missing.pdf", "out.pdf", 90, None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StorageError);
}

//! Property-based tests for path confinement and extraction.
//!
//! These tests use proptest to generate arbitrary entry names and archive
//! contents and check that the confinement and reassembly guarantees hold.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use rarex_core::ExtractOptions;
use rarex_core::extract_archive;
use rarex_core::extract_member;
use rarex_core::native::MemoryArchive;
use rarex_core::native::MemoryBackend;
use rarex_core::native::MemoryEntry;
use rarex_core::types::DestDir;
use rarex_core::types::SafePath;
use rarex_core::types::safe_path::normalize;
use rarex_core::types::safe_path::resolve;
use rarex_core::types::safe_symlink::symlink_target_safe;
use std::path::Path;
use std::path::PathBuf;
use tempfile::TempDir;

fn create_test_dest() -> (TempDir, DestDir) {
    let temp = TempDir::new().expect("failed to create temp dir");
    let dest = DestDir::new(temp.path()).expect("failed to create dest");
    (temp, dest)
}

fn component() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,12}"
}

proptest! {
    /// Any name that climbs above its own depth is rejected.
    #[test]
    fn prop_escaping_names_rejected(
        prefix in prop::collection::vec(component(), 0..4),
        extra in 1usize..4,
        suffix in prop::collection::vec(component(), 0..3),
    ) {
        let ups = vec![".."; prefix.len() + extra];
        let mut parts: Vec<&str> = prefix.iter().map(String::as_str).collect();
        parts.extend(ups);
        parts.extend(suffix.iter().map(String::as_str));
        let name = parts.join("/");

        // Components carry no dot, so the suffix can never name the root again.
        let root = Path::new("/srv/extract.root");
        prop_assert!(resolve(root, Path::new(&name)).is_none(), "{}", name);
    }

    /// Names made of plain components resolve to the join, and resolving the
    /// result again is a no-op.
    #[test]
    fn prop_plain_names_resolve_idempotently(
        parts in prop::collection::vec(component(), 1..6),
    ) {
        let root = Path::new("/srv/out");
        let name = parts.join("/");
        let resolved = resolve(root, Path::new(&name)).unwrap();
        prop_assert_eq!(&resolved, &root.join(&name));
        prop_assert_eq!(resolve(root, &resolved), Some(resolved.clone()));
    }

    /// Whatever the name, an accepted path is a strict descendant of the root.
    #[test]
    fn prop_resolved_paths_confined(name in "[a-z./]{0,24}") {
        let root = Path::new("/srv/out");
        if let Some(resolved) = resolve(root, Path::new(&name)) {
            prop_assert!(resolved.starts_with(root));
            prop_assert_ne!(resolved.as_path(), root);
            prop_assert_eq!(normalize(&resolved), resolved);
        }
    }

    /// A sibling directory sharing the root's name as a prefix is outside.
    #[test]
    fn prop_sibling_prefix_rejected(suffix in component()) {
        let root = Path::new("/srv/out");
        let sibling = format!("../out{suffix}/file");
        prop_assert!(resolve(root, Path::new(&sibling)).is_none());
        prop_assert!(!symlink_target_safe(root, root, &sibling));
    }

    /// Symlink targets that climb past the root are rejected; climbing
    /// exactly to the root is allowed.
    #[test]
    fn prop_symlink_depth(depth in 1usize..6, over in 0usize..3) {
        let root = PathBuf::from("/srv/out");
        let link_dir = (0..depth).fold(root.clone(), |dir, i| dir.join(format!("d{i}")));
        let target = vec![".."; depth + over].join("/");
        prop_assert_eq!(symlink_target_safe(&root, &link_dir, &target), over == 0);
    }

    /// SafePath accepts exactly what the resolver accepts.
    #[test]
    fn prop_safe_path_agrees_with_resolver(name in "[a-z.]{0,6}(/[a-z.]{0,6}){0,3}") {
        let (_temp, dest) = create_test_dest();
        let lexical = resolve(dest.as_path(), Path::new(&name));
        let safe = SafePath::resolve(&dest, &name);
        prop_assert_eq!(lexical.is_some(), safe.is_ok());
        if let (Some(lexical), Ok(safe)) = (lexical, safe) {
            prop_assert_eq!(lexical.as_path(), safe.as_path());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// A file split across any number of volumes is written back whole, with
    /// or without checksum verification.
    #[test]
    fn prop_split_files_reassembled(
        data in prop::collection::vec(any::<u8>(), 0..4096),
        parts in 1usize..6,
        chunk in 1usize..512,
        verify in any::<bool>(),
    ) {
        let backend = MemoryBackend::new().with_archive(
            "vol.rar",
            MemoryArchive::new()
                .entry(MemoryEntry::file("data.bin", data.clone()).split(parts))
                .chunk_size(chunk),
        );
        let (_temp, dest) = create_test_dest();
        let options = ExtractOptions::default().with_verify_data(verify);

        extract_archive(&backend, "vol.rar", dest.as_path(), &options).unwrap();

        let written = std::fs::read(dest.as_path().join("data.bin")).unwrap();
        prop_assert_eq!(written, data);
    }

    /// Reading a split member into memory yields its original bytes.
    #[test]
    fn prop_member_matches_extraction(
        data in prop::collection::vec(any::<u8>(), 0..2048),
        parts in 1usize..4,
    ) {
        let backend = MemoryBackend::new().with_archive(
            "m.rar",
            MemoryArchive::new()
                .file("first.txt", b"first")
                .entry(MemoryEntry::file("target.bin", data.clone()).split(parts)),
        );
        let options = ExtractOptions::default().with_verify_data(true);

        let member = extract_member(&backend, "m.rar", &options, |h| h.filename == "target.bin")
            .unwrap()
            .unwrap();
        prop_assert_eq!(&member.data, &data);
        prop_assert_eq!(member.crc, crc32fast::hash(&data));
    }
}

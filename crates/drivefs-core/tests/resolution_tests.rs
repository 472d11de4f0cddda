mod common;

use common::GraphBuilder;
use drivefs_core::store::StoreOp;
use drivefs_core::{DrivePath, ErrorKind};
use proptest::prelude::*;

#[test]
fn test_abc_resolves_to_single_file() {
    common::init_tracing();
    let drive = GraphBuilder::new().file("/a/b/c", b"content").build();

    let set = drive.fs.find_by_path(&drive.root(), "/a/b/c").unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.first().unwrap().id, drive.id("/a/b/c"));

    let one = drive.fs.find_one(&drive.root(), "/a/b/c").unwrap();
    assert_eq!(one.id, drive.id("/a/b/c"));
}

#[test]
fn test_duplicate_segment_changes_resolution() {
    let drive = GraphBuilder::new()
        .file("/a/b/c", b"first")
        .duplicate_folder("/a/b")
        .build();
    // Give the second `b` its own `c`
    drive.fs.create(&drive.id("/a/b#2"), "c").unwrap();

    let set = drive.fs.find_by_path(&drive.root(), "/a/b/c").unwrap();
    assert_eq!(set.len(), 2);

    let err = drive.fs.mkdir_all(&drive.root(), "/a/b/c/d").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);

    let err = drive.fs.find_one(&drive.root(), "/a/b/c").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

#[test]
fn test_duplicates_only_count_when_the_tail_matches() {
    let drive = GraphBuilder::new()
        .file("/a/b/c", b"only one c")
        .duplicate_folder("/a/b")
        .build();

    assert_eq!(drive.fs.find_by_path(&drive.root(), "/a/b").unwrap().len(), 2);
    assert_eq!(drive.fs.find_by_path(&drive.root(), "/a/b/c").unwrap().len(), 1);
}

#[test]
fn test_single_match_through_duplicate_folders() {
    let drive = GraphBuilder::new()
        .file("/a/b/c", b"only one c")
        .duplicate_folder("/a/b")
        .build();

    let one = drive.fs.find_one(&drive.root(), "/a/b/c").unwrap();
    assert_eq!(one.id, drive.id("/a/b/c"));
    assert_eq!(drive.fs.read_file_at(&drive.root(), "/a/b/c").unwrap(), b"only one c");

    let err = drive.fs.find_one(&drive.root(), "/a/b").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

#[test]
fn test_find_by_path_missing_is_empty_not_error() {
    let drive = GraphBuilder::new().folder("/a").build();
    assert!(drive.fs.find_by_path(&drive.root(), "/a/missing").unwrap().is_empty());
    assert!(drive.fs.find_by_path(&"no-such-root".into(), "/a").unwrap().is_empty());

    let err = drive.fs.find_one(&drive.root(), "/a/missing").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_resolution_does_not_follow_shortcuts() {
    let drive = GraphBuilder::new()
        .file("/target/inside.txt", b"x")
        .shortcut("/link", "/target")
        .build();

    assert!(drive.fs.find_by_path(&drive.root(), "/link/inside.txt").unwrap().is_empty());
    assert_eq!(drive.fs.find_by_path(&drive.root(), "/link").unwrap().len(), 1);
}

#[test]
fn test_trashed_nodes_are_invisible_to_paths() {
    let drive = GraphBuilder::new().folder("/a/b").build();
    drive.fs.remove(&drive.id("/a/b"), true).unwrap();

    assert!(drive.fs.find_by_path(&drive.root(), "/a/b").unwrap().is_empty());
    // Re-creating does not collide with the trashed folder
    let recreated = drive.fs.mkdir_all(&drive.root(), "/a/b").unwrap();
    assert_ne!(recreated.id, drive.id("/a/b"));
}

#[test]
fn test_mkdir_all_is_stable() {
    let drive = GraphBuilder::new().folder("/a").build();
    let first = drive.fs.mkdir_all(&drive.root(), "/a/x/y").unwrap();
    drive.store.reset_calls();
    let second = drive.fs.mkdir_all(&drive.root(), "/a/x/y").unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(drive.store.calls(StoreOp::CreateFile), 0);
}

#[test]
fn test_mkdir_all_missing_root() {
    let drive = GraphBuilder::new().build();
    let err = drive.fs.mkdir_all(&"gone".into(), "/a").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_names_with_quotes_and_backslashes() {
    let drive = GraphBuilder::new()
        .file("/O'Brien/a\\b", b"escaped")
        .folder("/O")
        .build();

    let content = drive.fs.read_file_at(&drive.root(), "/O'Brien/a\\b").unwrap();
    assert_eq!(content, b"escaped");
    assert_eq!(drive.fs.find_by_path(&drive.root(), "/O").unwrap().len(), 1);
}

#[test]
fn test_reverse_resolution() {
    let drive = GraphBuilder::new().file("/a/b/c", b"").build();
    let path = drive.fs.resolve_path(&drive.id("/a/b/c")).unwrap();
    assert_eq!(path.to_string(), "/a/b/c");
    assert!(drive.fs.resolve_path(&drive.root()).unwrap().is_root());
}

#[test]
fn test_reverse_resolution_multi_parent_at_any_depth() {
    for linked in ["/a", "/a/b", "/a/b/c"] {
        let drive = GraphBuilder::new()
            .file("/a/b/c", b"")
            .folder("/other")
            .extra_parent(linked, "/other")
            .build();
        let err = drive.fs.resolve_path(&drive.id("/a/b/c")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MultiParentsNotSupported, "multi parent at {linked}");
    }
}

#[test]
fn test_reverse_resolution_missing_node() {
    let drive = GraphBuilder::new().build();
    let err = drive.fs.resolve_path(&"vanished".into()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_remote_failure_during_resolution() {
    let drive = GraphBuilder::new().folder("/a/b").build();
    drive.store.fail_operation(StoreOp::ListFiles);

    let err = drive.fs.find_by_path(&drive.root(), "/a/b").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RemoteError);
    let err = drive.fs.mkdir_all(&drive.root(), "/a/b").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RemoteError);
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 '\\\\._-]{1,8}".prop_filter("no relative components", |s| s != "." && s != "..")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Without duplicate names, forward and reverse resolution are inverses.
    #[test]
    fn prop_forward_reverse_inverse(names in prop::collection::vec(name_strategy(), 1..6)) {
        let text = format!("/{}", names.join("/"));
        let drive = GraphBuilder::new().build();

        let created = drive.fs.mkdir_all(&drive.root(), &text).unwrap();
        let found = drive.fs.find_one(&drive.root(), &text).unwrap();
        prop_assert_eq!(&found.id, &created.id);

        let reversed = drive.fs.resolve_path(&found.id).unwrap();
        prop_assert_eq!(reversed, DrivePath::parse(&text).unwrap());
    }
}

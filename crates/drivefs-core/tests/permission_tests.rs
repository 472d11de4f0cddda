mod common;

use common::GraphBuilder;
use drivefs_core::store::{PermissionRecord, StoreOp};
use drivefs_core::{AccessEntry, ErrorKind, Grantee, PermissionRequest, Role};
use insta::assert_snapshot;

fn render(entries: &[AccessEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            let flag = if e.discoverable { " (discoverable)" } else { "" };
            format!("{} {}{flag}", e.grantee, e.role)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn stored(kind: &str, value: Option<&str>, role: &str) -> PermissionRecord {
    let mut record = PermissionRecord {
        grantee_type: kind.to_string(),
        role: role.to_string(),
        ..PermissionRecord::default()
    };
    match kind {
        "domain" => record.domain = value.map(str::to_string),
        _ => record.email_address = value.map(str::to_string),
    }
    record
}

#[test]
fn test_grants_accumulate_per_grantee() {
    common::init_tracing();
    let drive = GraphBuilder::new().folder("/shared").build();
    let id = drive.id("/shared");

    drive.fs.perm_set(&id, &PermissionRequest::user("ana@example.com", Role::Reader)).unwrap();
    drive.fs.perm_set(&id, &PermissionRequest::group("eng@example.com", Role::Writer)).unwrap();
    drive.fs.perm_set(&id, &PermissionRequest::domain("example.com", Role::Commenter, true)).unwrap();
    let entries = drive.fs.perm_set(&id, &PermissionRequest::user("ana@example.com", Role::Organizer)).unwrap();

    assert_snapshot!(render(&entries), @r"
    user:ana@example.com organizer
    group:eng@example.com writer
    domain:example.com commenter (discoverable)
    ");
}

#[test]
fn test_repeated_grant_is_a_no_op() {
    let drive = GraphBuilder::new().file("/report.pdf", b"%PDF").build();
    let id = drive.id("/report.pdf");
    let request = PermissionRequest::anyone(Role::Reader, false);

    let first = drive.fs.perm_set(&id, &request).unwrap();
    drive.store.reset_calls();
    let second = drive.fs.perm_set(&id, &request).unwrap();

    assert_eq!(first, second);
    assert_eq!(drive.store.calls(StoreOp::CreatePermission), 0);
    assert_eq!(drive.store.calls(StoreOp::UpdatePermission), 0);
}

#[test]
fn test_duplicate_entries_are_all_updated_and_deleted() {
    let drive = GraphBuilder::new().folder("/shared").build();
    let id = drive.id("/shared");
    drive.store.insert_permission(id.as_str(), stored("user", Some("bo@example.com"), "reader"));
    drive.store.insert_permission(id.as_str(), stored("user", Some("bo@example.com"), "commenter"));
    drive.store.insert_permission(id.as_str(), stored("domain", Some("example.com"), "reader"));

    let entries = drive.fs.perm_set(&id, &PermissionRequest::user("bo@example.com", Role::Writer)).unwrap();
    assert_eq!(entries.iter().filter(|e| e.role == Role::Writer).count(), 2);
    assert_eq!(drive.store.calls(StoreOp::UpdatePermission), 2);

    let remaining = drive.fs.perm_del(&id, &Grantee::user("bo@example.com")).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].grantee, Grantee::domain("example.com"));
    assert_eq!(drive.store.calls(StoreOp::DeletePermission), 2);
}

#[test]
fn test_grantee_matching_is_exact() {
    let drive = GraphBuilder::new().folder("/shared").build();
    let id = drive.id("/shared");
    drive.fs.perm_set(&id, &PermissionRequest::group("team@example.com", Role::Reader)).unwrap();

    // Same address, different grantee type
    let entries = drive.fs.perm_set(&id, &PermissionRequest::user("team@example.com", Role::Reader)).unwrap();
    assert_eq!(entries.len(), 2);
    let remaining = drive.fs.perm_del(&id, &Grantee::user("TEAM@example.com")).unwrap();
    assert_eq!(remaining.len(), 2);
}

#[test]
fn test_listing_spans_pages() {
    let drive = GraphBuilder::new().folder("/shared").build();
    let id = drive.id("/shared");
    for i in 0..250 {
        let email = format!("u{i}@example.com");
        drive.store.insert_permission(id.as_str(), stored("user", Some(&email), "reader"));
    }
    assert_eq!(drive.fs.perm_list(&id).unwrap().len(), 250);
}

#[test]
fn test_unknown_entry_fails_listing() {
    let drive = GraphBuilder::new().folder("/shared").build();
    let id = drive.id("/shared");
    drive.store.insert_permission(id.as_str(), stored("user", Some("a@example.com"), "superuser"));

    let err = drive.fs.perm_list(&id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RemoteError);
    let err = drive.fs.perm_set(&id, &PermissionRequest::anyone(Role::Reader, false)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RemoteError);
}

#[test]
fn test_permissions_on_missing_node() {
    let drive = GraphBuilder::new().build();
    let err = drive.fs.perm_list(&"gone".into()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RemoteError);
}

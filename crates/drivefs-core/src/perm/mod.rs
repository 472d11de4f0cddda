//! Access-control reconciliation.
//!
//! Each call lists the node's current entries, then creates, updates or
//! deletes entries so that the requested grant holds. Nothing is kept
//! between calls and nothing is rolled back: if a later remote call fails,
//! earlier changes of the same call stay applied.

pub mod grantee;
pub mod role;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

pub use grantee::{Grantee, ParseGranteeError};
pub use role::{ParseRoleError, Role};

use crate::accessor::AccessControl;
use crate::error::{DriveError, OpContext};
use crate::node::NodeId;
use crate::store::{PermissionRecord, StoreError};

/// One stored permission on a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEntry {
    pub id: String,
    pub grantee: Grantee,
    pub role: Role,
    /// Whether the node shows up in search for this grantee
    pub discoverable: bool,
}

impl AccessEntry {
    /// Decode a stored record. Unknown grantee types and role labels are
    /// reported as remote errors rather than skipped.
    pub fn from_record(node: &NodeId, record: &PermissionRecord) -> Result<Self, DriveError> {
        let context = || OpContext::new().with_id(node).with_name(&record.id);
        let grantee = Grantee::from_record(record).ok_or_else(|| {
            DriveError::remote(
                "decode permission",
                context(),
                StoreError::malformed(format!("unknown grantee type '{}'", record.grantee_type)),
            )
        })?;
        let role = record.role.parse::<Role>().map_err(|e| {
            DriveError::remote("decode permission", context(), StoreError::malformed(e.to_string()).with_source(e))
        })?;
        Ok(AccessEntry {
            id: record.id.clone(),
            grantee,
            role,
            discoverable: record.allow_file_discovery,
        })
    }
}

/// A grant to apply with [`set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRequest {
    pub grantee: Grantee,
    pub role: Role,
    pub discoverable: bool,
}

impl PermissionRequest {
    pub fn user(email: impl Into<String>, role: Role) -> Self {
        Self {
            grantee: Grantee::user(email),
            role,
            discoverable: false,
        }
    }

    pub fn group(email: impl Into<String>, role: Role) -> Self {
        Self {
            grantee: Grantee::group(email),
            role,
            discoverable: false,
        }
    }

    pub fn domain(domain: impl Into<String>, role: Role, discoverable: bool) -> Self {
        Self {
            grantee: Grantee::domain(domain),
            role,
            discoverable,
        }
    }

    pub fn anyone(role: Role, discoverable: bool) -> Self {
        Self {
            grantee: Grantee::Anyone,
            role,
            discoverable,
        }
    }

    fn to_record(&self) -> PermissionRecord {
        let mut record = PermissionRecord {
            role: self.role.as_str().to_string(),
            allow_file_discovery: self.discoverable,
            ..PermissionRecord::default()
        };
        self.grantee.write_to(&mut record);
        record
    }
}

fn decode_all(node: &NodeId, records: &[PermissionRecord]) -> Result<Vec<AccessEntry>, DriveError> {
    records.iter().map(|r| AccessEntry::from_record(node, r)).collect()
}

/// Current entries of `id`.
pub fn list<A: AccessControl + ?Sized>(acl: &A, id: &NodeId) -> Result<Vec<AccessEntry>, DriveError> {
    decode_all(id, &acl.list_access(id)?)
}

/// Grant `request` on `id`.
///
/// Every existing entry for the same grantee is updated in place; a new
/// entry is created only when none exists. Returns the entries as listed
/// after the change.
#[instrument(level = "debug", skip(acl, request), fields(id = %id, grantee = %request.grantee, role = %request.role))]
pub fn set<A: AccessControl + ?Sized>(
    acl: &A,
    id: &NodeId,
    request: &PermissionRequest,
) -> Result<Vec<AccessEntry>, DriveError> {
    let current = acl.list_access(id)?;

    let mut updated = 0usize;
    for record in current.iter().filter(|r| request.grantee.matches(r)) {
        if record.role == request.role.as_str() && record.allow_file_discovery == request.discoverable {
            trace!(permission = %record.id, "Entry already up to date");
            updated += 1;
            continue;
        }
        let change = PermissionRecord {
            role: request.role.as_str().to_string(),
            allow_file_discovery: request.discoverable,
            ..record.clone()
        };
        acl.update_access(id, &change)?;
        updated += 1;
    }

    if updated == 0 {
        let created = acl.create_access(id, &request.to_record())?;
        debug!(permission = %created.id, "Created permission");
    } else {
        debug!(updated, "Updated existing permissions");
    }

    list(acl, id)
}

/// Remove every entry of `id` granted to `grantee`. Returns the entries
/// as listed after the removal.
#[instrument(level = "debug", skip(acl), fields(id = %id, grantee = %grantee))]
pub fn delete<A: AccessControl + ?Sized>(acl: &A, id: &NodeId, grantee: &Grantee) -> Result<Vec<AccessEntry>, DriveError> {
    let current = acl.list_access(id)?;

    let mut removed = 0usize;
    for record in current.iter().filter(|r| grantee.matches(r)) {
        acl.delete_access(id, &record.id)?;
        removed += 1;
    }
    debug!(removed, "Deleted permissions");

    list(acl, id)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::accessor::NodeAccessor;
    use crate::config::DriveFsConfig;
    use crate::error::ErrorKind;
    use crate::store::memory::ROOT_ID;
    use crate::store::{MemoryStore, StoreOp};

    fn setup() -> (Arc<MemoryStore>, NodeAccessor<Arc<MemoryStore>>, NodeId) {
        let store = Arc::new(MemoryStore::new().with_permission_page_size(1));
        let acl = NodeAccessor::new(Arc::clone(&store), DriveFsConfig::default());
        (store, acl, NodeId::from(ROOT_ID))
    }

    fn raw(kind: &str, email: Option<&str>, role: &str) -> PermissionRecord {
        PermissionRecord {
            grantee_type: kind.to_string(),
            email_address: email.map(str::to_string),
            role: role.to_string(),
            ..PermissionRecord::default()
        }
    }

    #[test]
    fn test_set_creates_then_updates() {
        let (_, acl, id) = setup();
        let entries = set(&acl, &id, &PermissionRequest::user("a@x.io", Role::Reader)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].role, Role::Reader);

        let entries = set(&acl, &id, &PermissionRequest::user("a@x.io", Role::Writer)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].role, Role::Writer);
        assert_eq!(entries[0].grantee, Grantee::user("a@x.io"));
    }

    #[test]
    fn test_set_is_idempotent() {
        let (store, acl, id) = setup();
        let request = PermissionRequest::anyone(Role::Commenter, true);
        let first = set(&acl, &id, &request).unwrap();
        store.reset_calls();
        let second = set(&acl, &id, &request).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.calls(StoreOp::CreatePermission), 0);
        assert_eq!(store.calls(StoreOp::UpdatePermission), 0);
    }

    #[test]
    fn test_set_updates_every_duplicate() {
        let (store, acl, id) = setup();
        store.insert_permission(ROOT_ID, raw("user", Some("a@x.io"), "reader"));
        store.insert_permission(ROOT_ID, raw("user", Some("a@x.io"), "commenter"));
        store.insert_permission(ROOT_ID, raw("user", Some("b@x.io"), "reader"));

        let entries = set(&acl, &id, &PermissionRequest::user("a@x.io", Role::Writer)).unwrap();
        let roles: Vec<_> = entries.iter().map(|e| e.role).collect();
        assert_eq!(roles, vec![Role::Writer, Role::Writer, Role::Reader]);
        assert_eq!(store.calls(StoreOp::CreatePermission), 0);
    }

    #[test]
    fn test_delete_removes_all_matches_and_returns_remaining() {
        let (store, acl, id) = setup();
        store.insert_permission(ROOT_ID, raw("group", Some("t@x.io"), "reader"));
        store.insert_permission(ROOT_ID, raw("group", Some("t@x.io"), "writer"));
        store.insert_permission(ROOT_ID, raw("user", Some("t@x.io"), "reader"));

        let remaining = delete(&acl, &id, &Grantee::group("t@x.io")).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].grantee, Grantee::user("t@x.io"));
    }

    #[test]
    fn test_delete_without_match_changes_nothing() {
        let (store, acl, id) = setup();
        store.insert_permission(ROOT_ID, raw("anyone", None, "reader"));
        let remaining = delete(&acl, &id, &Grantee::domain("x.io")).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(store.calls(StoreOp::DeletePermission), 0);
    }

    #[test]
    fn test_unknown_entries_are_remote_errors() {
        let (store, acl, id) = setup();
        store.insert_permission(ROOT_ID, raw("robot", None, "reader"));
        assert_eq!(list(&acl, &id).unwrap_err().kind(), ErrorKind::RemoteError);

        let (store2, acl2, id2) = setup();
        store2.insert_permission(ROOT_ID, raw("user", Some("a@x.io"), "editor"));
        let err = list(&acl2, &id2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteError);
        assert!(err.to_string().contains("decode permission"));
    }

    #[test]
    fn test_remote_failure_aborts() {
        let (store, acl, id) = setup();
        store.fail_operation(StoreOp::CreatePermission);
        let err = set(&acl, &id, &PermissionRequest::domain("x.io", Role::Reader, false)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteError);
    }

    #[test]
    fn test_request_record_shape() {
        let record = PermissionRequest::domain("x.io", Role::Writer, true).to_record();
        assert_eq!(record.grantee_type, "domain");
        assert_eq!(record.domain.as_deref(), Some("x.io"));
        assert!(record.email_address.is_none());
        assert_eq!(record.role, "writer");
        assert!(record.allow_file_discovery);
    }
}

//! The remote object store seam.
//!
//! [`RemoteStore`] is the raw, flat, ID-keyed capability surface of the
//! backend: paged listing filtered by a query expression, get-by-id,
//! create, metadata update, delete, content transfer and permission CRUD.
//! Nothing here knows about paths; records are passed through in their
//! wire shape and interpreted by [`crate::accessor::NodeAccessor`].
//!
//! Transport, authentication, retries and cancellation are the concern of
//! the implementation behind this trait.

pub mod memory;
pub mod query;

use std::io::Read;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::{MemoryStore, Snapshot, SnapshotError, StoreOp};
pub use query::{escape_literal, Predicate, Query, QueryParseError};

/// How the store classified a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// The addressed object does not exist
    NotFound,
    /// The store refused the request (bad argument, forbidden, unsupported)
    Rejected,
    /// The request did not complete (network, timeout, server error)
    Transport,
    /// The store answered with data the client cannot interpret
    Malformed,
}

#[derive(Error, Debug)]
#[error("{kind:?}: {message}")]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::NotFound, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Rejected, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Transport, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Malformed, message)
    }

    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        self.kind == StoreErrorKind::NotFound
    }
}

/// A file, folder or shortcut as the store returns it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    #[serde(default)]
    pub size: u64,
    /// RFC 3339 timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut_target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
    #[serde(default)]
    pub trashed: bool,
}

/// Request body for creating or copying a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewFile {
    pub name: String,
    /// `None` lets the store pick a regular content type
    pub mime_type: Option<String>,
    pub parents: Vec<String>,
    pub shortcut_target: Option<String>,
}

/// Partial metadata update. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileUpdate {
    pub name: Option<String>,
    pub trashed: Option<bool>,
    pub add_parents: Vec<String>,
    pub remove_parents: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ListRequest<'a> {
    pub query: &'a str,
    pub page_size: usize,
    pub page_token: Option<&'a str>,
    pub fields: &'a str,
}

#[derive(Debug, Clone, Default)]
pub struct FilePage {
    pub files: Vec<FileRecord>,
    pub next_page_token: Option<String>,
}

/// An access-control entry in its wire shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRecord {
    #[serde(default)]
    pub id: String,
    /// Grantee type tag: `user`, `group`, `domain` or `anyone`
    #[serde(rename = "type")]
    pub grantee_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub role: String,
    #[serde(default)]
    pub allow_file_discovery: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PermissionPage {
    pub permissions: Vec<PermissionRecord>,
    pub next_page_token: Option<String>,
}

/// Raw operations of the remote object store.
///
/// Every call is a single blocking request; implementations must be safe
/// to call from several threads at once.
pub trait RemoteStore: Send + Sync {
    fn get_file(&self, id: &str, fields: &str) -> Result<FileRecord, StoreError>;

    /// One page of files matching `request.query`.
    fn list_files(&self, request: &ListRequest<'_>) -> Result<FilePage, StoreError>;

    fn create_file(&self, file: &NewFile, fields: &str) -> Result<FileRecord, StoreError>;

    fn update_file(&self, id: &str, update: &FileUpdate, fields: &str) -> Result<FileRecord, StoreError>;

    /// Permanently delete a file (and, for a folder, what only it contains).
    fn delete_file(&self, id: &str) -> Result<(), StoreError>;

    fn copy_file(&self, id: &str, file: &NewFile, fields: &str) -> Result<FileRecord, StoreError>;

    fn download(&self, id: &str) -> Result<Box<dyn Read + Send>, StoreError>;

    fn upload(&self, id: &str, content: &[u8]) -> Result<FileRecord, StoreError>;

    fn list_permissions(
        &self,
        file_id: &str,
        page_token: Option<&str>,
        fields: &str,
    ) -> Result<PermissionPage, StoreError>;

    fn create_permission(
        &self,
        file_id: &str,
        permission: &PermissionRecord,
        fields: &str,
    ) -> Result<PermissionRecord, StoreError>;

    fn update_permission(
        &self,
        file_id: &str,
        permission: &PermissionRecord,
        fields: &str,
    ) -> Result<PermissionRecord, StoreError>;

    fn delete_permission(&self, file_id: &str, permission_id: &str) -> Result<(), StoreError>;
}

impl<S: RemoteStore + ?Sized> RemoteStore for Arc<S> {
    fn get_file(&self, id: &str, fields: &str) -> Result<FileRecord, StoreError> {
        (**self).get_file(id, fields)
    }

    fn list_files(&self, request: &ListRequest<'_>) -> Result<FilePage, StoreError> {
        (**self).list_files(request)
    }

    fn create_file(&self, file: &NewFile, fields: &str) -> Result<FileRecord, StoreError> {
        (**self).create_file(file, fields)
    }

    fn update_file(&self, id: &str, update: &FileUpdate, fields: &str) -> Result<FileRecord, StoreError> {
        (**self).update_file(id, update, fields)
    }

    fn delete_file(&self, id: &str) -> Result<(), StoreError> {
        (**self).delete_file(id)
    }

    fn copy_file(&self, id: &str, file: &NewFile, fields: &str) -> Result<FileRecord, StoreError> {
        (**self).copy_file(id, file, fields)
    }

    fn download(&self, id: &str) -> Result<Box<dyn Read + Send>, StoreError> {
        (**self).download(id)
    }

    fn upload(&self, id: &str, content: &[u8]) -> Result<FileRecord, StoreError> {
        (**self).upload(id, content)
    }

    fn list_permissions(
        &self,
        file_id: &str,
        page_token: Option<&str>,
        fields: &str,
    ) -> Result<PermissionPage, StoreError> {
        (**self).list_permissions(file_id, page_token, fields)
    }

    fn create_permission(
        &self,
        file_id: &str,
        permission: &PermissionRecord,
        fields: &str,
    ) -> Result<PermissionRecord, StoreError> {
        (**self).create_permission(file_id, permission, fields)
    }

    fn update_permission(
        &self,
        file_id: &str,
        permission: &PermissionRecord,
        fields: &str,
    ) -> Result<PermissionRecord, StoreError> {
        (**self).update_permission(file_id, permission, fields)
    }

    fn delete_permission(&self, file_id: &str, permission_id: &str) -> Result<(), StoreError> {
        (**self).delete_permission(file_id, permission_id)
    }
}

//! In-memory implementation of [`RemoteStore`].
//!
//! `MemoryStore` keeps the same graph model as the real backend: flat IDs,
//! any number of parents per file, duplicate sibling names, a trash flag and
//! paged listings with opaque page tokens. It evaluates exactly the query
//! predicates in [`super::query`]. Tests use it directly; the CLI persists
//! it as a JSON [`Snapshot`].
//!
//! Listing order is insertion order, which keeps walks deterministic.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use super::query::Query;
use super::{
    FilePage, FileRecord, FileUpdate, ListRequest, NewFile, PermissionPage, PermissionRecord,
    RemoteStore, StoreError,
};
use crate::node::TypeTags;

/// ID of the folder created by [`MemoryStore::new`].
pub const ROOT_ID: &str = "root";

const DEFAULT_PAGE_SIZE: usize = 100;
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const GRANTEE_TYPES: [&str; 4] = ["user", "group", "domain", "anyone"];

/// Store operations, used for fault injection and call accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    GetFile,
    ListFiles,
    CreateFile,
    UpdateFile,
    DeleteFile,
    CopyFile,
    Download,
    Upload,
    ListPermissions,
    CreatePermission,
    UpdatePermission,
    DeletePermission,
}

/// One file with its content and permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    #[serde(flatten)]
    pub record: FileRecord,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<PermissionRecord>,
}

/// Serializable image of a [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub files: Vec<StoredFile>,
}

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to access snapshot {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed snapshot {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Default)]
struct Faults {
    failing_ops: HashSet<StoreOp>,
    broken_reads: HashSet<String>,
}

pub struct MemoryStore {
    files: RwLock<Vec<StoredFile>>,
    faults: Mutex<Faults>,
    calls: Mutex<HashMap<StoreOp, usize>>,
    tags: TypeTags,
    permission_page_size: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// A store holding only a parentless root folder with ID [`ROOT_ID`].
    pub fn new() -> Self {
        let store = Self::empty();
        store.insert(FileRecord {
            id: ROOT_ID.to_string(),
            name: "My Drive".to_string(),
            mime_type: store.tags.folder.clone(),
            modified_time: Some(now()),
            ..FileRecord::default()
        });
        store
    }

    /// A store with no files at all.
    pub fn empty() -> Self {
        Self {
            files: RwLock::new(Vec::new()),
            faults: Mutex::new(Faults::default()),
            calls: Mutex::new(HashMap::new()),
            tags: TypeTags::default(),
            permission_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    #[must_use]
    pub fn with_type_tags(mut self, tags: TypeTags) -> Self {
        self.tags = tags;
        self
    }

    #[must_use]
    pub fn with_permission_page_size(mut self, page_size: usize) -> Self {
        self.permission_page_size = page_size.max(1);
        self
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::empty();
        *store.files.write() = snapshot.files;
        store
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            files: self.files.read().clone(),
        }
    }

    pub fn load_json(path: &Path) -> Result<Self, SnapshotError> {
        let text = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: Snapshot = serde_json::from_str(&text).map_err(|source| SnapshotError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), files = snapshot.files.len(), "Loaded snapshot");
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn save_json(&self, path: &Path) -> Result<(), SnapshotError> {
        let text = serde_json::to_string_pretty(&self.snapshot()).map_err(|source| SnapshotError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, text).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Insert a record verbatim, bypassing validation. An empty ID is
    /// replaced by a fresh one. Returns the ID.
    pub fn insert(&self, mut record: FileRecord) -> String {
        if record.id.is_empty() {
            record.id = new_id();
        }
        let id = record.id.clone();
        self.files.write().push(StoredFile {
            record,
            ..StoredFile::default()
        });
        id
    }

    /// Replace a file's content without going through [`RemoteStore::upload`].
    pub fn set_content(&self, id: &str, content: &[u8]) -> bool {
        let mut files = self.files.write();
        let Some(file) = files.iter_mut().find(|f| f.record.id == id) else {
            return false;
        };
        file.content = content.to_vec();
        file.record.size = content.len() as u64;
        true
    }

    /// Add an extra parent edge.
    pub fn add_parent(&self, id: &str, parent_id: &str) -> bool {
        let mut files = self.files.write();
        let Some(file) = files.iter_mut().find(|f| f.record.id == id) else {
            return false;
        };
        file.record.parents.push(parent_id.to_string());
        true
    }

    /// Insert a permission record verbatim (duplicates allowed).
    pub fn insert_permission(&self, file_id: &str, mut permission: PermissionRecord) -> Option<String> {
        let mut files = self.files.write();
        let file = files.iter_mut().find(|f| f.record.id == file_id)?;
        if permission.id.is_empty() {
            permission.id = new_id();
        }
        let id = permission.id.clone();
        file.permissions.push(permission);
        Some(id)
    }

    pub fn record(&self, id: &str) -> Option<FileRecord> {
        self.files.read().iter().find(|f| f.record.id == id).map(|f| f.record.clone())
    }

    pub fn content(&self, id: &str) -> Option<Vec<u8>> {
        self.files.read().iter().find(|f| f.record.id == id).map(|f| f.content.clone())
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }

    /// Make every subsequent call of `op` fail with a transport error.
    pub fn fail_operation(&self, op: StoreOp) {
        self.faults.lock().failing_ops.insert(op);
    }

    /// Make downloads of `id` yield a reader that fails mid-transfer.
    pub fn break_reads_of(&self, id: &str) {
        self.faults.lock().broken_reads.insert(id.to_string());
    }

    pub fn clear_faults(&self) {
        let mut faults = self.faults.lock();
        faults.failing_ops.clear();
        faults.broken_reads.clear();
    }

    /// Number of calls made to `op` since creation or the last reset.
    pub fn calls(&self, op: StoreOp) -> usize {
        self.calls.lock().get(&op).copied().unwrap_or(0)
    }

    pub fn reset_calls(&self) {
        self.calls.lock().clear();
    }

    fn enter(&self, op: StoreOp) -> Result<(), StoreError> {
        *self.calls.lock().entry(op).or_insert(0) += 1;
        if self.faults.lock().failing_ops.contains(&op) {
            return Err(StoreError::transport(format!("injected failure in {op:?}")));
        }
        Ok(())
    }

    fn is_downloadable(&self, record: &FileRecord) -> bool {
        record.mime_type != self.tags.folder && !record.mime_type.starts_with(&self.tags.app_document_prefix)
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn missing(id: &str) -> StoreError {
    StoreError::not_found(format!("file not found: {id}"))
}

fn parse_page_token(token: Option<&str>) -> Result<usize, StoreError> {
    match token {
        None => Ok(0),
        Some(t) => t
            .parse()
            .map_err(|_| StoreError::rejected(format!("invalid page token: {t}"))),
    }
}

fn page<T: Clone>(items: &[T], offset: usize, page_size: usize) -> (Vec<T>, Option<String>) {
    let end = offset.saturating_add(page_size).min(items.len());
    let slice = items.get(offset..end).map(<[T]>::to_vec).unwrap_or_default();
    let next = (end < items.len()).then(|| end.to_string());
    (slice, next)
}

struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionAborted, "download interrupted"))
    }
}

impl RemoteStore for MemoryStore {
    fn get_file(&self, id: &str, _fields: &str) -> Result<FileRecord, StoreError> {
        self.enter(StoreOp::GetFile)?;
        self.record(id).ok_or_else(|| missing(id))
    }

    fn list_files(&self, request: &ListRequest<'_>) -> Result<FilePage, StoreError> {
        self.enter(StoreOp::ListFiles)?;
        let query = Query::parse(request.query)
            .map_err(|e| StoreError::rejected(format!("invalid query '{}'", request.query)).with_source(e))?;
        let offset = parse_page_token(request.page_token)?;
        let page_size = if request.page_size == 0 { DEFAULT_PAGE_SIZE } else { request.page_size };

        let matching: Vec<FileRecord> = self
            .files
            .read()
            .iter()
            .filter(|f| query.matches(&f.record.name, &f.record.parents, f.record.trashed))
            .map(|f| f.record.clone())
            .collect();
        let (files, next_page_token) = page(&matching, offset, page_size);
        trace!(query = %request.query, offset, returned = files.len(), "Listed page");
        Ok(FilePage { files, next_page_token })
    }

    fn create_file(&self, file: &NewFile, _fields: &str) -> Result<FileRecord, StoreError> {
        self.enter(StoreOp::CreateFile)?;
        let mut files = self.files.write();
        for parent in &file.parents {
            if !files.iter().any(|f| &f.record.id == parent) {
                return Err(missing(parent));
            }
        }
        if let Some(target) = &file.shortcut_target
            && !files.iter().any(|f| &f.record.id == target)
        {
            return Err(missing(target));
        }

        let id = new_id();
        let record = FileRecord {
            id: id.clone(),
            name: file.name.clone(),
            mime_type: file.mime_type.clone().unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            size: 0,
            modified_time: Some(now()),
            parents: file.parents.clone(),
            shortcut_target: file.shortcut_target.clone(),
            web_view_link: Some(format!("memory://files/{id}")),
            trashed: false,
        };
        files.push(StoredFile {
            record: record.clone(),
            ..StoredFile::default()
        });
        Ok(record)
    }

    fn update_file(&self, id: &str, update: &FileUpdate, _fields: &str) -> Result<FileRecord, StoreError> {
        self.enter(StoreOp::UpdateFile)?;
        let mut files = self.files.write();
        for parent in &update.add_parents {
            if !files.iter().any(|f| &f.record.id == parent) {
                return Err(missing(parent));
            }
        }
        let file = files.iter_mut().find(|f| f.record.id == id).ok_or_else(|| missing(id))?;
        let record = &mut file.record;
        if let Some(name) = &update.name {
            record.name.clone_from(name);
        }
        if let Some(trashed) = update.trashed {
            record.trashed = trashed;
        }
        record.parents.retain(|p| !update.remove_parents.contains(p));
        for parent in &update.add_parents {
            if !record.parents.contains(parent) {
                record.parents.push(parent.clone());
            }
        }
        record.modified_time = Some(now());
        Ok(record.clone())
    }

    fn delete_file(&self, id: &str) -> Result<(), StoreError> {
        self.enter(StoreOp::DeleteFile)?;
        let mut files = self.files.write();
        if !files.iter().any(|f| f.record.id == id) {
            return Err(missing(id));
        }

        // Detach children from deleted folders; a child left without any
        // parent is deleted in turn.
        let mut pending = vec![id.to_string()];
        while let Some(current) = pending.pop() {
            files.retain(|f| f.record.id != current);
            for file in files.iter_mut() {
                let before = file.record.parents.len();
                file.record.parents.retain(|p| *p != current);
                if before > 0 && file.record.parents.is_empty() {
                    pending.push(file.record.id.clone());
                }
            }
        }
        Ok(())
    }

    fn copy_file(&self, id: &str, file: &NewFile, _fields: &str) -> Result<FileRecord, StoreError> {
        self.enter(StoreOp::CopyFile)?;
        let mut files = self.files.write();
        let source = files.iter().find(|f| f.record.id == id).ok_or_else(|| missing(id))?.clone();
        if source.record.mime_type == self.tags.folder {
            return Err(StoreError::rejected("folders cannot be copied"));
        }
        for parent in &file.parents {
            if !files.iter().any(|f| &f.record.id == parent) {
                return Err(missing(parent));
            }
        }

        let new_id = new_id();
        let record = FileRecord {
            id: new_id.clone(),
            name: if file.name.is_empty() { source.record.name.clone() } else { file.name.clone() },
            parents: if file.parents.is_empty() { source.record.parents.clone() } else { file.parents.clone() },
            modified_time: Some(now()),
            web_view_link: Some(format!("memory://files/{new_id}")),
            trashed: false,
            ..source.record.clone()
        };
        files.push(StoredFile {
            record: record.clone(),
            content: source.content,
            permissions: Vec::new(),
        });
        Ok(record)
    }

    fn download(&self, id: &str) -> Result<Box<dyn Read + Send>, StoreError> {
        self.enter(StoreOp::Download)?;
        let files = self.files.read();
        let file = files.iter().find(|f| f.record.id == id).ok_or_else(|| missing(id))?;
        if !self.is_downloadable(&file.record) {
            return Err(StoreError::rejected(format!("file is not downloadable: {id}")));
        }
        if self.faults.lock().broken_reads.contains(id) {
            return Ok(Box::new(FailingReader));
        }
        Ok(Box::new(Cursor::new(file.content.clone())))
    }

    fn upload(&self, id: &str, content: &[u8]) -> Result<FileRecord, StoreError> {
        self.enter(StoreOp::Upload)?;
        let mut files = self.files.write();
        let file = files.iter_mut().find(|f| f.record.id == id).ok_or_else(|| missing(id))?;
        if !self.is_downloadable(&file.record) {
            return Err(StoreError::rejected(format!("content cannot be uploaded to {id}")));
        }
        file.content = content.to_vec();
        file.record.size = content.len() as u64;
        file.record.modified_time = Some(now());
        Ok(file.record.clone())
    }

    fn list_permissions(
        &self,
        file_id: &str,
        page_token: Option<&str>,
        _fields: &str,
    ) -> Result<PermissionPage, StoreError> {
        self.enter(StoreOp::ListPermissions)?;
        let offset = parse_page_token(page_token)?;
        let files = self.files.read();
        let file = files.iter().find(|f| f.record.id == file_id).ok_or_else(|| missing(file_id))?;
        let (permissions, next_page_token) = page(&file.permissions, offset, self.permission_page_size);
        Ok(PermissionPage {
            permissions,
            next_page_token,
        })
    }

    fn create_permission(
        &self,
        file_id: &str,
        permission: &PermissionRecord,
        _fields: &str,
    ) -> Result<PermissionRecord, StoreError> {
        self.enter(StoreOp::CreatePermission)?;
        if !GRANTEE_TYPES.contains(&permission.grantee_type.as_str()) {
            return Err(StoreError::rejected(format!(
                "unsupported grantee type: {}",
                permission.grantee_type
            )));
        }
        if permission.role.is_empty() {
            return Err(StoreError::rejected("permission role is required"));
        }
        let mut files = self.files.write();
        let file = files.iter_mut().find(|f| f.record.id == file_id).ok_or_else(|| missing(file_id))?;
        let created = PermissionRecord {
            id: new_id(),
            ..permission.clone()
        };
        file.permissions.push(created.clone());
        Ok(created)
    }

    fn update_permission(
        &self,
        file_id: &str,
        permission: &PermissionRecord,
        _fields: &str,
    ) -> Result<PermissionRecord, StoreError> {
        self.enter(StoreOp::UpdatePermission)?;
        let mut files = self.files.write();
        let file = files.iter_mut().find(|f| f.record.id == file_id).ok_or_else(|| missing(file_id))?;
        let existing = file
            .permissions
            .iter_mut()
            .find(|p| p.id == permission.id)
            .ok_or_else(|| StoreError::not_found(format!("permission not found: {}", permission.id)))?;
        existing.role.clone_from(&permission.role);
        existing.allow_file_discovery = permission.allow_file_discovery;
        Ok(existing.clone())
    }

    fn delete_permission(&self, file_id: &str, permission_id: &str) -> Result<(), StoreError> {
        self.enter(StoreOp::DeletePermission)?;
        let mut files = self.files.write();
        let file = files.iter_mut().find(|f| f.record.id == file_id).ok_or_else(|| missing(file_id))?;
        let before = file.permissions.len();
        file.permissions.retain(|p| p.id != permission_id);
        if file.permissions.len() == before {
            return Err(StoreError::not_found(format!("permission not found: {permission_id}")));
        }
        Ok(())
    }
}

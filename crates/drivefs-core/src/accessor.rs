//! The node accessor: the only component that talks to the remote store.
//!
//! [`NodeAccessor`] turns raw [`RemoteStore`] calls into [`NodeRef`]
//! snapshots. It builds the child-listing queries, drains every page before
//! returning, and classifies store failures once: a missing object on a
//! lookup becomes [`DriveError::NotFound`], everything else becomes
//! [`DriveError::Remote`] with the store error kept as its source.
//!
//! The resolvers and the walker do not depend on the accessor directly but
//! on the [`NodeGraph`] trait, which is the graph view of the store: nodes,
//! multi-parent edges and name-filtered child lookups.

use std::io::Read;

use tracing::{debug, instrument, trace};

use crate::config::DriveFsConfig;
use crate::error::{DriveError, OpContext};
use crate::node::{NodeId, NodeRef, TypeTags};
use crate::store::{FileRecord, FileUpdate, ListRequest, NewFile, PermissionRecord, Query, RemoteStore, StoreError};

/// Graph view consumed by the resolvers and the walker.
pub trait NodeGraph {
    /// Fetch a node; [`DriveError::NotFound`] if it does not exist.
    fn node(&self, id: &NodeId) -> Result<NodeRef, DriveError>;

    /// Fetch a node; `Ok(None)` if it does not exist.
    fn find_node(&self, id: &NodeId) -> Result<Option<NodeRef>, DriveError>;

    /// All non-trashed direct children.
    fn children(&self, parent: &NodeId) -> Result<Vec<NodeRef>, DriveError>;

    /// Non-trashed direct children whose name equals `name` exactly.
    fn children_named(&self, parent: &NodeId, name: &str) -> Result<Vec<NodeRef>, DriveError>;

    /// Create a folder. Never fails because of an existing sibling.
    fn create_folder(&self, parent: &NodeId, name: &str) -> Result<NodeRef, DriveError>;
}

/// Raw access-control operations consumed by the permission reconciler.
pub trait AccessControl {
    fn list_access(&self, id: &NodeId) -> Result<Vec<PermissionRecord>, DriveError>;

    fn create_access(&self, id: &NodeId, entry: &PermissionRecord) -> Result<PermissionRecord, DriveError>;

    fn update_access(&self, id: &NodeId, entry: &PermissionRecord) -> Result<PermissionRecord, DriveError>;

    fn delete_access(&self, id: &NodeId, entry_id: &str) -> Result<(), DriveError>;
}

/// What kind of node [`NodeAccessor::create`] makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewNode {
    Folder,
    File,
    Shortcut { target: NodeId },
}

pub struct NodeAccessor<S> {
    store: S,
    config: DriveFsConfig,
}

fn remote(action: &'static str, context: OpContext) -> impl FnOnce(StoreError) -> DriveError {
    move |source| DriveError::remote(action, context, source)
}

impl<S: RemoteStore> NodeAccessor<S> {
    /// A zero page size (possible through deserialization) is raised to 1.
    pub fn new(store: S, mut config: DriveFsConfig) -> Self {
        config.page_size = config.page_size.max(1);
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &DriveFsConfig {
        &self.config
    }

    pub fn type_tags(&self) -> &TypeTags {
        &self.config.type_tags
    }

    fn to_node(&self, record: FileRecord) -> NodeRef {
        NodeRef::from_record(record, &self.config.type_tags)
    }

    #[instrument(level = "trace", skip(self), fields(id = %id))]
    pub fn try_get(&self, id: &NodeId) -> Result<Option<NodeRef>, DriveError> {
        match self.store.get_file(id.as_str(), &self.config.file_fields) {
            Ok(record) => Ok(Some(self.to_node(record))),
            Err(e) if e.is_not_found() => {
                trace!("Node does not exist");
                Ok(None)
            }
            Err(e) => Err(DriveError::remote("get file", OpContext::new().with_id(id), e)),
        }
    }

    pub fn get(&self, id: &NodeId) -> Result<NodeRef, DriveError> {
        self.try_get(id)?
            .ok_or_else(|| DriveError::not_found(OpContext::new().with_id(id)))
    }

    /// Run a raw query expression and drain every page.
    #[instrument(level = "trace", skip(self))]
    pub fn query(&self, expression: &str) -> Result<Vec<NodeRef>, DriveError> {
        let mut nodes = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;
        loop {
            let request = ListRequest {
                query: expression,
                page_size: self.config.page_size,
                page_token: page_token.as_deref(),
                fields: &self.config.list_fields,
            };
            let page = self
                .store
                .list_files(&request)
                .map_err(remote("list files", OpContext::new().with_name(expression)))?;
            pages += 1;
            nodes.extend(page.files.into_iter().map(|r| self.to_node(r)));
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        trace!(pages, results = nodes.len(), "Drained listing");
        Ok(nodes)
    }

    pub fn list_children(&self, parent: &NodeId) -> Result<Vec<NodeRef>, DriveError> {
        self.query(&Query::children_of(parent.as_str()).to_string())
    }

    pub fn list_children_named(&self, parent: &NodeId, name: &str) -> Result<Vec<NodeRef>, DriveError> {
        self.query(&Query::children_named(parent.as_str(), name).to_string())
    }

    /// Whether `parent` has at least one non-trashed child. Fetches a single
    /// one-entry page.
    pub fn has_children(&self, parent: &NodeId) -> Result<bool, DriveError> {
        let expression = Query::children_of(parent.as_str()).to_string();
        let request = ListRequest {
            query: &expression,
            page_size: 1,
            page_token: None,
            fields: &self.config.list_fields,
        };
        let page = self
            .store
            .list_files(&request)
            .map_err(remote("list files", OpContext::new().with_id(parent)))?;
        Ok(!page.files.is_empty())
    }

    /// Create a node under `parent`. Repeating the call creates another
    /// sibling with the same name.
    #[instrument(level = "debug", skip(self), fields(parent = %parent))]
    pub fn create(&self, parent: &NodeId, name: &str, kind: &NewNode) -> Result<NodeRef, DriveError> {
        let (mime_type, shortcut_target) = match kind {
            NewNode::Folder => (Some(self.config.type_tags.folder.clone()), None),
            NewNode::File => (None, None),
            NewNode::Shortcut { target } => (
                Some(self.config.type_tags.shortcut.clone()),
                Some(target.as_str().to_string()),
            ),
        };
        let request = NewFile {
            name: name.to_string(),
            mime_type,
            parents: vec![parent.as_str().to_string()],
            shortcut_target,
        };
        let record = self
            .store
            .create_file(&request, &self.config.file_fields)
            .map_err(remote("create file", OpContext::new().with_parent(parent).with_name(name)))?;
        debug!(id = %record.id, "Created node");
        Ok(self.to_node(record))
    }

    pub fn update_metadata(&self, id: &NodeId, update: &FileUpdate) -> Result<NodeRef, DriveError> {
        let record = self
            .store
            .update_file(id.as_str(), update, &self.config.file_fields)
            .map_err(remote("update file", OpContext::new().with_id(id)))?;
        Ok(self.to_node(record))
    }

    pub fn delete(&self, id: &NodeId) -> Result<(), DriveError> {
        self.store
            .delete_file(id.as_str())
            .map_err(remote("delete file", OpContext::new().with_id(id)))
    }

    pub fn trash(&self, id: &NodeId) -> Result<(), DriveError> {
        let update = FileUpdate {
            trashed: Some(true),
            ..FileUpdate::default()
        };
        self.store
            .update_file(id.as_str(), &update, &self.config.file_fields)
            .map(|_| ())
            .map_err(remote("move file to trash", OpContext::new().with_id(id)))
    }

    pub fn copy(&self, id: &NodeId, parent: &NodeId, name: &str) -> Result<NodeRef, DriveError> {
        let request = NewFile {
            name: name.to_string(),
            parents: vec![parent.as_str().to_string()],
            ..NewFile::default()
        };
        let record = self
            .store
            .copy_file(id.as_str(), &request, &self.config.file_fields)
            .map_err(remote("copy file", OpContext::new().with_id(id).with_parent(parent)))?;
        Ok(self.to_node(record))
    }

    /// Download the full content. A failure after the store accepted the
    /// request is an [`DriveError::Io`].
    pub fn download(&self, id: &NodeId) -> Result<Vec<u8>, DriveError> {
        let mut reader = self
            .store
            .download(id.as_str())
            .map_err(remote("download file", OpContext::new().with_id(id)))?;
        let mut content = Vec::new();
        reader
            .read_to_end(&mut content)
            .map_err(|e| DriveError::io("reading downloaded content", OpContext::new().with_id(id), e))?;
        Ok(content)
    }

    pub fn upload(&self, id: &NodeId, content: &[u8]) -> Result<NodeRef, DriveError> {
        let record = self
            .store
            .upload(id.as_str(), content)
            .map_err(remote("upload file", OpContext::new().with_id(id)))?;
        Ok(self.to_node(record))
    }
}

impl<S: RemoteStore> NodeGraph for NodeAccessor<S> {
    fn node(&self, id: &NodeId) -> Result<NodeRef, DriveError> {
        self.get(id)
    }

    fn find_node(&self, id: &NodeId) -> Result<Option<NodeRef>, DriveError> {
        self.try_get(id)
    }

    fn children(&self, parent: &NodeId) -> Result<Vec<NodeRef>, DriveError> {
        self.list_children(parent)
    }

    fn children_named(&self, parent: &NodeId, name: &str) -> Result<Vec<NodeRef>, DriveError> {
        self.list_children_named(parent, name)
    }

    fn create_folder(&self, parent: &NodeId, name: &str) -> Result<NodeRef, DriveError> {
        self.create(parent, name, &NewNode::Folder)
    }
}

impl<S: RemoteStore> AccessControl for NodeAccessor<S> {
    fn list_access(&self, id: &NodeId) -> Result<Vec<PermissionRecord>, DriveError> {
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .store
                .list_permissions(id.as_str(), page_token.as_deref(), &self.config.permission_list_fields)
                .map_err(remote("list permissions", OpContext::new().with_id(id)))?;
            entries.extend(page.permissions);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(entries)
    }

    fn create_access(&self, id: &NodeId, entry: &PermissionRecord) -> Result<PermissionRecord, DriveError> {
        self.store
            .create_permission(id.as_str(), entry, &self.config.permission_fields)
            .map_err(remote("create permission", OpContext::new().with_id(id)))
    }

    fn update_access(&self, id: &NodeId, entry: &PermissionRecord) -> Result<PermissionRecord, DriveError> {
        self.store
            .update_permission(id.as_str(), entry, &self.config.permission_fields)
            .map_err(remote("update permission", OpContext::new().with_id(id).with_name(&entry.id)))
    }

    fn delete_access(&self, id: &NodeId, entry_id: &str) -> Result<(), DriveError> {
        self.store
            .delete_permission(id.as_str(), entry_id)
            .map_err(remote("delete permission", OpContext::new().with_id(id).with_name(entry_id)))
    }
}

//! The filesystem facade over a [`RemoteStore`].
//!
//! [`DriveFs`] exposes identifier-based operations that map onto single
//! store calls, and path-based operations that run through the resolvers
//! and the walker.
//!
//! # Key Methods
//!
//! - **Lookup**: [`info`](DriveFs::info), [`find_by_path`](DriveFs::find_by_path) (every match),
//!   [`find_one`](DriveFs::find_one) (exactly one match), [`resolve_path`](DriveFs::resolve_path)
//! - **Listing**: [`read_dir`](DriveFs::read_dir), [`open_dir`](DriveFs::open_dir), [`walk`](DriveFs::walk)
//! - **Content**: [`read_file`](DriveFs::read_file), [`read_file_at`](DriveFs::read_file_at),
//!   [`write_file`](DriveFs::write_file), [`open`](DriveFs::open)
//! - **Mutation**: [`mkdir`](DriveFs::mkdir), [`mkdir_all`](DriveFs::mkdir_all), [`create`](DriveFs::create),
//!   [`remove`](DriveFs::remove), [`move_to`](DriveFs::move_to), [`copy_tree`](DriveFs::copy_tree)
//! - **Permissions**: [`perm_list`](DriveFs::perm_list), [`perm_set`](DriveFs::perm_set),
//!   [`perm_del`](DriveFs::perm_del)
//!
//! # Observability
//!
//! Every operation opens a `tracing` span carrying the node IDs or path it
//! works on. Content bytes are never recorded.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, instrument, warn};

use crate::accessor::{NewNode, NodeAccessor};
use crate::config::DriveFsConfig;
use crate::dir::{DriveDir, DriveFile, OpenEntry};
use crate::error::{DriveError, OpContext};
use crate::node::{NodeId, NodeRef};
use crate::path::DrivePath;
use crate::perm::{self, AccessEntry, Grantee, PermissionRequest};
use crate::resolve::{self, ResolvedSet};
use crate::store::{FileUpdate, RemoteStore};
use crate::walk::{self, WalkEntry};

/// Path-addressable view of a remote object store.
///
/// Holds no state besides the store handle and the configuration, so a
/// single instance can serve concurrent callers.
pub struct DriveFs<S> {
    accessor: NodeAccessor<S>,
}

impl<S: RemoteStore> DriveFs<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, DriveFsConfig::default())
    }

    #[instrument(level = "debug", skip(store), fields(root = %config.root_id, page_size = config.page_size))]
    pub fn with_config(store: S, config: DriveFsConfig) -> Self {
        Self {
            accessor: NodeAccessor::new(store, config),
        }
    }

    pub fn config(&self) -> &DriveFsConfig {
        self.accessor.config()
    }

    pub fn store(&self) -> &S {
        self.accessor.store()
    }

    /// Where [`resolve_path`](Self::resolve_path) stops climbing.
    pub fn root_id(&self) -> &NodeId {
        &self.accessor.config().root_id
    }

    pub fn accessor(&self) -> &NodeAccessor<S> {
        &self.accessor
    }

    // ==================== Identifier-based operations ====================

    /// Metadata of `id`; [`DriveError::NotFound`] if it does not exist.
    #[instrument(level = "debug", skip(self), fields(id = %id))]
    pub fn info(&self, id: &NodeId) -> Result<NodeRef, DriveError> {
        self.accessor.get(id)
    }

    /// All non-trashed children of `id`, in listing order.
    #[instrument(level = "debug", skip(self), fields(id = %id))]
    pub fn read_dir(&self, id: &NodeId) -> Result<Vec<NodeRef>, DriveError> {
        let children = self.accessor.list_children(id)?;
        debug!(count = children.len(), "Listed directory");
        Ok(children)
    }

    /// Fetch a folder listing once for chunked consumption.
    #[instrument(level = "debug", skip(self), fields(id = %id))]
    pub fn open_dir(&self, id: &NodeId) -> Result<DriveDir, DriveError> {
        let info = self.accessor.get(id)?;
        let entries = self.accessor.list_children(id)?;
        Ok(DriveDir::new(info, entries))
    }

    /// Create a folder. An existing sibling with the same name is not an
    /// error; a second folder is created next to it.
    #[instrument(level = "info", skip(self), fields(parent = %parent))]
    pub fn mkdir(&self, parent: &NodeId, name: &str) -> Result<NodeRef, DriveError> {
        self.accessor.create(parent, name, &NewNode::Folder)
    }

    /// Create an empty regular file.
    #[instrument(level = "info", skip(self), fields(parent = %parent))]
    pub fn create(&self, parent: &NodeId, name: &str) -> Result<NodeRef, DriveError> {
        self.accessor.create(parent, name, &NewNode::File)
    }

    #[instrument(level = "info", skip(self), fields(parent = %parent, target = %target))]
    pub fn shortcut(&self, parent: &NodeId, name: &str, target: &NodeId) -> Result<NodeRef, DriveError> {
        self.accessor.create(parent, name, &NewNode::Shortcut { target: target.clone() })
    }

    /// Download the full content of a regular file.
    ///
    /// Folders, shortcuts and application documents have no byte content
    /// and fail with [`DriveError::NotReadable`].
    #[instrument(level = "debug", skip(self), fields(id = %id))]
    pub fn read_file(&self, id: &NodeId) -> Result<Vec<u8>, DriveError> {
        let node = self.accessor.get(id)?;
        self.read_node(&node)
    }

    fn read_node(&self, node: &NodeRef) -> Result<Vec<u8>, DriveError> {
        if !node.is_directly_readable() {
            debug!(kind = node.kind.label(), type_tag = %node.type_tag, "Node has no downloadable content");
            return Err(DriveError::NotReadable {
                context: OpContext::new().with_id(&node.id).with_name(node.name.as_str()).into_box(),
            });
        }
        let content = self.accessor.download(&node.id)?;
        debug!(bytes = content.len(), "Downloaded content");
        Ok(content)
    }

    /// Replace the content of `id`.
    #[instrument(level = "info", skip(self, content), fields(id = %id, content_len = content.len()))]
    pub fn write_file(&self, id: &NodeId, content: &[u8]) -> Result<NodeRef, DriveError> {
        self.accessor.upload(id, content)
    }

    /// Delete or trash `id`.
    ///
    /// A non-empty folder fails with [`DriveError::NotRemovable`]. A missing
    /// node is already gone and is not an error.
    #[instrument(level = "info", skip(self), fields(id = %id, trash = trash))]
    pub fn remove(&self, id: &NodeId, trash: bool) -> Result<(), DriveError> {
        let Some(node) = self.accessor.try_get(id)? else {
            debug!("Node does not exist, nothing to remove");
            return Ok(());
        };
        if node.is_container() && self.accessor.has_children(id)? {
            warn!(name = %node.name, "Refusing to remove non-empty folder");
            return Err(DriveError::NotRemovable {
                context: OpContext::new().with_id(id).with_name(node.name).into_box(),
            });
        }
        self.remove_all(id, trash)
    }

    /// Delete or trash `id` together with everything below it.
    #[instrument(level = "info", skip(self), fields(id = %id, trash = trash))]
    pub fn remove_all(&self, id: &NodeId, trash: bool) -> Result<(), DriveError> {
        if trash {
            self.accessor.trash(id)?;
        } else {
            self.accessor.delete(id)?;
        }
        info!("Removed");
        Ok(())
    }

    /// Make `new_parent` the only parent of `id`.
    #[instrument(level = "info", skip(self), fields(id = %id, new_parent = %new_parent))]
    pub fn move_to(&self, id: &NodeId, new_parent: &NodeId) -> Result<NodeRef, DriveError> {
        let node = self.accessor.get(id)?;
        let update = FileUpdate {
            add_parents: vec![new_parent.as_str().to_string()],
            remove_parents: node
                .parents
                .iter()
                .filter(|p| *p != new_parent)
                .map(|p| p.as_str().to_string())
                .collect(),
            ..FileUpdate::default()
        };
        self.accessor.update_metadata(id, &update)
    }

    /// Copy a single non-folder node.
    #[instrument(level = "info", skip(self), fields(id = %id, new_parent = %new_parent))]
    pub fn copy(&self, id: &NodeId, new_parent: &NodeId, new_name: &str) -> Result<NodeRef, DriveError> {
        self.accessor.copy(id, new_parent, new_name)
    }

    /// Copy `id` and, for a folder, everything below it.
    ///
    /// Folders are recreated and every other node is copied, so the copy
    /// has the same shape as the source. The source subtree is listed in
    /// full before anything is created. Returns the top-level copy.
    ///
    /// Fails with [`DriveError::InvalidPath`] if `new_parent` is the source
    /// folder or lies below it.
    #[instrument(level = "info", skip(self), fields(id = %id, new_parent = %new_parent))]
    pub fn copy_tree(&self, id: &NodeId, new_parent: &NodeId, new_name: &str) -> Result<NodeRef, DriveError> {
        let source = self.accessor.get(id)?;
        if !source.is_container() {
            return self.accessor.copy(id, new_parent, new_name);
        }
        if self.is_within(new_parent, id)? {
            warn!(name = %source.name, "Refusing to copy a folder into itself");
            return Err(DriveError::invalid_path(
                source.name.as_str(),
                "cannot copy a folder into itself or one of its descendants",
            ));
        }

        // (node, folder it was listed under) in pre-order
        let mut entries: Vec<(NodeRef, NodeId)> = Vec::new();
        walk::walk_entries(&self.accessor, source, |entry: &WalkEntry<'_>| -> Result<(), DriveError> {
            if let Some(parent) = entry.parent {
                entries.push((entry.node.clone(), parent.clone()));
            }
            Ok(())
        })?;

        let top = self.accessor.create(new_parent, new_name, &NewNode::Folder)?;
        // Source folder ID -> ID of its copy
        let mut copies: HashMap<NodeId, NodeId> = HashMap::new();
        copies.insert(id.clone(), top.id.clone());

        for (node, parent) in &entries {
            let target_parent = copies
                .get(parent)
                .cloned()
                .ok_or_else(|| DriveError::not_found(OpContext::new().with_id(parent)))?;
            if node.is_container() {
                let created = self.accessor.create(&target_parent, &node.name, &NewNode::Folder)?;
                copies.insert(node.id.clone(), created.id);
            } else {
                self.accessor.copy(&node.id, &target_parent, &node.name)?;
            }
        }

        info!(copied = entries.len(), "Copied tree");
        Ok(top)
    }

    /// True if `ancestor` is `id` or is reached by climbing any of the
    /// parent links of `id`.
    fn is_within(&self, id: &NodeId, ancestor: &NodeId) -> Result<bool, DriveError> {
        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut pending = vec![id.clone()];
        while let Some(current) = pending.pop() {
            if &current == ancestor {
                return Ok(true);
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(node) = self.accessor.try_get(&current)? {
                pending.extend(node.parents);
            }
        }
        Ok(false)
    }

    #[instrument(level = "info", skip(self), fields(id = %id))]
    pub fn rename(&self, id: &NodeId, new_name: &str) -> Result<NodeRef, DriveError> {
        let update = FileUpdate {
            name: Some(new_name.to_string()),
            ..FileUpdate::default()
        };
        self.accessor.update_metadata(id, &update)
    }

    /// Run a raw store query expression.
    #[instrument(level = "debug", skip(self))]
    pub fn query(&self, expression: &str) -> Result<Vec<NodeRef>, DriveError> {
        self.accessor.query(expression)
    }

    // ==================== Path-based operations ====================

    /// Every node reachable from `root` by `path`.
    ///
    /// Duplicate names multiply results; absence is an empty set, including
    /// when `root` itself does not exist.
    #[instrument(level = "debug", skip(self), fields(root = %root, path = path.as_ref()))]
    pub fn find_by_path(&self, root: &NodeId, path: impl AsRef<str>) -> Result<ResolvedSet, DriveError> {
        let path = DrivePath::parse(path.as_ref())?;
        resolve::resolve_all(&self.accessor, root, &path)
    }

    /// The single node at `path`.
    ///
    /// Duplicate names along the way are fine as long as exactly one node
    /// matches the whole path. No match is [`DriveError::NotFound`], several
    /// are [`DriveError::AlreadyExists`].
    #[instrument(level = "debug", skip(self), fields(root = %root, path = path.as_ref()))]
    pub fn find_one(&self, root: &NodeId, path: impl AsRef<str>) -> Result<NodeRef, DriveError> {
        let path = DrivePath::parse(path.as_ref())?;
        resolve::resolve_all(&self.accessor, root, &path)?.into_unique(&path)
    }

    /// Create every missing folder along `path` and return the last one.
    #[instrument(level = "info", skip(self), fields(root = %root, path = path.as_ref()))]
    pub fn mkdir_all(&self, root: &NodeId, path: impl AsRef<str>) -> Result<NodeRef, DriveError> {
        let path = DrivePath::parse(path.as_ref())?;
        resolve::make_dirs(&self.accessor, root, &path)
    }

    /// The path of `id` below the configured root.
    #[instrument(level = "debug", skip(self), fields(id = %id))]
    pub fn resolve_path(&self, id: &NodeId) -> Result<DrivePath, DriveError> {
        let config = self.accessor.config();
        resolve::reverse_resolve(&self.accessor, id, &config.root_id, config.max_depth)
    }

    /// Visit `id` and everything below it in pre-order.
    ///
    /// The visitor receives paths relative to `id`. Its first error stops
    /// the walk and is returned.
    #[instrument(level = "debug", skip(self, visit), fields(id = %id))]
    pub fn walk<E, F>(&self, id: &NodeId, visit: F) -> Result<(), E>
    where
        E: From<DriveError>,
        F: FnMut(&DrivePath, &NodeRef) -> Result<(), E>,
    {
        walk::walk(&self.accessor, id, visit)
    }

    /// Every `(relative path, node)` pair below `id` in visiting order.
    pub fn walk_collect(&self, id: &NodeId) -> Result<Vec<(DrivePath, NodeRef)>, DriveError> {
        walk::collect(&self.accessor, id)
    }

    /// Read the content of the single file at `path`.
    #[instrument(level = "debug", skip(self), fields(root = %root, path = path.as_ref()))]
    pub fn read_file_at(&self, root: &NodeId, path: impl AsRef<str>) -> Result<Vec<u8>, DriveError> {
        let node = self.find_one(root, path)?;
        self.read_node(&node)
    }

    /// Open the single node at `path` as a directory cursor or a file reader.
    #[instrument(level = "debug", skip(self), fields(root = %root, path = path.as_ref()))]
    pub fn open(&self, root: &NodeId, path: impl AsRef<str>) -> Result<OpenEntry, DriveError> {
        let node = self.find_one(root, path)?;
        if node.is_container() {
            let entries = self.accessor.list_children(&node.id)?;
            return Ok(OpenEntry::Dir(DriveDir::new(node, entries)));
        }
        let content = self.read_node(&node)?;
        Ok(OpenEntry::File(DriveFile::new(node, content)))
    }

    // ==================== Permissions ====================

    #[instrument(level = "debug", skip(self), fields(id = %id))]
    pub fn perm_list(&self, id: &NodeId) -> Result<Vec<AccessEntry>, DriveError> {
        perm::list(&self.accessor, id)
    }

    /// Grant `request`, updating an existing entry for the same grantee
    /// instead of adding a duplicate. Returns the refreshed entries.
    #[instrument(level = "info", skip(self, request), fields(id = %id, grantee = %request.grantee))]
    pub fn perm_set(&self, id: &NodeId, request: &PermissionRequest) -> Result<Vec<AccessEntry>, DriveError> {
        perm::set(&self.accessor, id, request)
    }

    /// Revoke every entry for `grantee`. Returns the remaining entries.
    #[instrument(level = "info", skip(self), fields(id = %id, grantee = %grantee))]
    pub fn perm_del(&self, id: &NodeId, grantee: &Grantee) -> Result<Vec<AccessEntry>, DriveError> {
        perm::delete(&self.accessor, id, grantee)
    }
}

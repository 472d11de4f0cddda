#![allow(dead_code)] // Each test binary uses a different subset

use std::collections::HashMap;
use std::sync::Arc;

use drivefs_core::node::{FOLDER_TYPE, SHORTCUT_TYPE};
use drivefs_core::store::memory::ROOT_ID;
use drivefs_core::store::{FileRecord, MemoryStore};
use drivefs_core::{DriveFs, DriveFsConfig, NodeId};

pub const DOCUMENT_TYPE: &str = "application/vnd.google-apps.document";

/// Route `tracing` output to the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A builder for graphs with known shape.
///
/// Nodes are addressed by the path they were added under. IDs are
/// sequential (`n1`, `n2`, ...) so failures are easy to read. Duplicates
/// get a `#2`, `#3`... suffix on their key.
pub struct GraphBuilder {
    store: MemoryStore,
    ids: HashMap<String, String>,
    next: usize,
    page_size: usize,
}

impl GraphBuilder {
    pub fn new() -> Self {
        let mut ids = HashMap::new();
        ids.insert("/".to_string(), ROOT_ID.to_string());
        Self {
            store: MemoryStore::new(),
            ids,
            next: 0,
            page_size: 2,
        }
    }

    /// Page size used by the built [`DriveFs`]; small by default so
    /// listings always span several pages.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Add a folder, creating missing ancestors.
    pub fn folder(mut self, path: &str) -> Self {
        self.ensure_folder(path);
        self
    }

    /// Add a regular file with content, creating missing ancestors.
    pub fn file(mut self, path: &str, content: &[u8]) -> Self {
        let id = self.insert(path, "text/plain", None);
        self.store.set_content(&id, content);
        self
    }

    /// Add an application document (no downloadable content).
    pub fn document(mut self, path: &str) -> Self {
        self.insert(path, DOCUMENT_TYPE, None);
        self
    }

    pub fn shortcut(mut self, path: &str, target: &str) -> Self {
        let target_id = self.ids[target].clone();
        self.insert(path, SHORTCUT_TYPE, Some(target_id));
        self
    }

    /// Add another folder with the same name next to an existing one.
    pub fn duplicate_folder(mut self, path: &str) -> Self {
        let mut n = 2;
        while self.ids.contains_key(&format!("{path}#{n}")) {
            n += 1;
        }
        let id = self.create_node(path, FOLDER_TYPE, None);
        self.ids.insert(format!("{path}#{n}"), id);
        self
    }

    /// Link an existing node under a second parent folder.
    pub fn extra_parent(self, path: &str, parent: &str) -> Self {
        self.store.add_parent(&self.ids[path], &self.ids[parent]);
        self
    }

    pub fn build(self) -> TestDrive {
        let store = Arc::new(self.store);
        let fs = DriveFs::with_config(Arc::clone(&store), DriveFsConfig::default().with_page_size(self.page_size));
        TestDrive {
            store,
            fs,
            ids: self.ids,
        }
    }

    fn ensure_folder(&mut self, path: &str) -> String {
        if let Some(id) = self.ids.get(path) {
            return id.clone();
        }
        self.insert(path, FOLDER_TYPE, None)
    }

    fn insert(&mut self, path: &str, mime_type: &str, shortcut_target: Option<String>) -> String {
        let id = self.create_node(path, mime_type, shortcut_target);
        self.ids.insert(path.to_string(), id.clone());
        id
    }

    fn create_node(&mut self, path: &str, mime_type: &str, shortcut_target: Option<String>) -> String {
        let (parent, name) = match path.rsplit_once('/') {
            Some(("", name)) => ("/".to_string(), name),
            Some((parent, name)) => (parent.to_string(), name),
            None => panic!("test paths must be absolute: {path}"),
        };
        let parent_id = self.ensure_folder(&parent);
        self.next += 1;
        self.store.insert(FileRecord {
            id: format!("n{}", self.next),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            parents: vec![parent_id],
            shortcut_target,
            modified_time: Some("2024-01-15T10:30:00Z".to_string()),
            ..FileRecord::default()
        })
    }
}

/// A built graph and a [`DriveFs`] over it.
pub struct TestDrive {
    pub store: Arc<MemoryStore>,
    pub fs: DriveFs<Arc<MemoryStore>>,
    ids: HashMap<String, String>,
}

impl TestDrive {
    pub fn root(&self) -> NodeId {
        NodeId::from(ROOT_ID)
    }

    /// ID of the node added under `key`.
    pub fn id(&self, key: &str) -> NodeId {
        NodeId::from(self.ids[key].as_str())
    }
}

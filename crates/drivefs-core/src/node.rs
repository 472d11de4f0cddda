//! Node identifiers, type discrimination and the per-call node snapshot.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::store::FileRecord;

pub const FOLDER_TYPE: &str = "application/vnd.google-apps.folder";
pub const SHORTCUT_TYPE: &str = "application/vnd.google-apps.shortcut";
pub const APP_DOCUMENT_PREFIX: &str = "application/vnd.google-apps.";

/// Opaque identifier of a remote node.
///
/// Stable across rename and move, not across delete-and-recreate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    #[inline]
    pub fn from_raw(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

/// The reserved type tags that distinguish folders, shortcuts and
/// application documents from regular content types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeTags {
    pub folder: String,
    pub shortcut: String,
    pub app_document_prefix: String,
}

impl Default for TypeTags {
    fn default() -> Self {
        Self {
            folder: FOLDER_TYPE.to_string(),
            shortcut: SHORTCUT_TYPE.to_string(),
            app_document_prefix: APP_DOCUMENT_PREFIX.to_string(),
        }
    }
}

impl TypeTags {
    /// Classify a raw type tag. Folder and shortcut tags are checked
    /// before the application-document prefix they share.
    pub fn classify(&self, type_tag: &str, shortcut_target: Option<&str>) -> NodeKind {
        if type_tag == self.folder {
            NodeKind::Folder
        } else if type_tag == self.shortcut {
            NodeKind::Shortcut {
                target: shortcut_target.map(NodeId::from),
            }
        } else if type_tag.starts_with(&self.app_document_prefix) {
            NodeKind::AppDocument
        } else {
            NodeKind::Regular
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Folder,
    Regular,
    Shortcut { target: Option<NodeId> },
    /// Proprietary document with no downloadable byte content
    AppDocument,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Folder => "folder",
            NodeKind::Regular => "file",
            NodeKind::Shortcut { .. } => "shortcut",
            NodeKind::AppDocument => "document",
        }
    }
}

/// Snapshot of one node, fetched fresh for a single operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    /// Raw type tag as reported by the store
    pub type_tag: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub parents: Vec<NodeId>,
    pub web_view_link: Option<String>,
}

impl NodeRef {
    pub fn from_record(record: FileRecord, tags: &TypeTags) -> Self {
        let kind = tags.classify(&record.mime_type, record.shortcut_target.as_deref());
        let modified = record.modified_time.as_deref().and_then(|t| {
            DateTime::parse_from_rfc3339(t)
                .inspect_err(|e| trace!(id = %record.id, error = %e, "Unparseable modification time"))
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        });
        NodeRef {
            id: NodeId(record.id),
            name: record.name,
            kind,
            type_tag: record.mime_type,
            size: record.size,
            modified,
            parents: record.parents.into_iter().map(NodeId).collect(),
            web_view_link: record.web_view_link,
        }
    }

    /// True for folders: nodes that hold children.
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Folder)
    }

    /// True for nodes that resolvers and the walker descend into.
    /// Shortcuts are not followed.
    #[inline]
    pub fn is_traversable(&self) -> bool {
        self.is_container()
    }

    /// True when the node has byte content that can be downloaded.
    /// Shortcuts carry the reserved tag prefix and are not.
    #[inline]
    pub fn is_directly_readable(&self) -> bool {
        matches!(self.kind, NodeKind::Regular)
    }

    #[inline]
    pub fn is_shortcut(&self) -> bool {
        matches!(self.kind, NodeKind::Shortcut { .. })
    }

    #[inline]
    pub fn is_app_document(&self) -> bool {
        matches!(self.kind, NodeKind::AppDocument)
    }

    pub fn shortcut_target(&self) -> Option<&NodeId> {
        match &self.kind {
            NodeKind::Shortcut { target } => target.as_ref(),
            _ => None,
        }
    }
}

//! Error types for the drivefs core.
//!
//! Every public operation returns [`DriveError`]. Callers branch on the
//! classification exposed by [`DriveError::kind`] rather than on message
//! text; the messages carry an [`OpContext`] for humans and logs.

use std::fmt;
use std::io;

use thiserror::Error;

pub use crate::store::{StoreError, StoreErrorKind};

/// Context for a failed operation, rendered into error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpContext {
    /// The node the operation was addressing
    pub id: Option<String>,
    /// The parent under which a lookup or creation happened
    pub parent_id: Option<String>,
    /// The path being resolved
    pub path: Option<String>,
    /// The segment or entry name involved
    pub name: Option<String>,
}

impl OpContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl AsRef<str>) -> Self {
        self.id = Some(id.as_ref().to_string());
        self
    }

    pub fn with_parent(mut self, parent_id: impl AsRef<str>) -> Self {
        self.parent_id = Some(parent_id.as_ref().to_string());
        self
    }

    pub fn with_path(mut self, path: impl ToString) -> Self {
        self.path = Some(path.to_string());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Convert this context into a Box (for use in error types)
    #[inline]
    pub fn into_box(self) -> Box<Self> {
        Box::new(self)
    }
}

impl fmt::Display for OpContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if let Some(ref path) = self.path {
            parts.push(format!("path '{path}'"));
        }
        if let Some(ref name) = self.name {
            parts.push(format!("name '{name}'"));
        }
        if let Some(ref id) = self.id {
            parts.push(format!("node {id}"));
        }
        if let Some(ref parent) = self.parent_id {
            parts.push(format!("in {parent}"));
        }

        if parts.is_empty() {
            write!(f, "(no context)")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

/// Stable classification of every [`DriveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed path string or unrepresentable name
    InvalidPath,
    /// Referenced path or identifier does not exist
    NotFound,
    /// Duplicates already exist where a unique entry was required
    AlreadyExists,
    /// A node on the reverse walk has more than one parent
    MultiParentsNotSupported,
    /// Content read requested on a node without byte content
    NotReadable,
    /// Non-recursive removal of a non-empty folder
    NotRemovable,
    /// The remote store reported a failure
    RemoteError,
    /// Local transfer of content bytes failed
    IoError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidPath => "invalid path",
            ErrorKind::NotFound => "not found",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::MultiParentsNotSupported => "multi parents not supported",
            ErrorKind::NotReadable => "not readable",
            ErrorKind::NotRemovable => "not removable",
            ErrorKind::RemoteError => "remote error",
            ErrorKind::IoError => "io error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum DriveError {
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Not found: {context}")]
    NotFound { context: Box<OpContext> },

    #[error("{count} entries named '{name}' already exist: {context}")]
    AlreadyExists {
        name: String,
        count: usize,
        context: Box<OpContext>,
    },

    #[error("Node has {count} parents, multiple parents not supported: {context}")]
    MultiParentsNotSupported { count: usize, context: Box<OpContext> },

    #[error("Node has no downloadable content: {context}")]
    NotReadable { context: Box<OpContext> },

    #[error("Folder is not empty: {context}")]
    NotRemovable { context: Box<OpContext> },

    #[error("Remote store failed to {action} for {context}: {source}")]
    Remote {
        action: &'static str,
        context: Box<OpContext>,
        #[source]
        source: StoreError,
    },

    #[error("IO error while {action} for {context}: {source}")]
    Io {
        action: &'static str,
        context: Box<OpContext>,
        #[source]
        source: io::Error,
    },
}

impl DriveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DriveError::InvalidPath { .. } => ErrorKind::InvalidPath,
            DriveError::NotFound { .. } => ErrorKind::NotFound,
            DriveError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            DriveError::MultiParentsNotSupported { .. } => ErrorKind::MultiParentsNotSupported,
            DriveError::NotReadable { .. } => ErrorKind::NotReadable,
            DriveError::NotRemovable { .. } => ErrorKind::NotRemovable,
            DriveError::Remote { .. } => ErrorKind::RemoteError,
            DriveError::Io { .. } => ErrorKind::IoError,
        }
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        DriveError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(context: OpContext) -> Self {
        DriveError::NotFound {
            context: context.into_box(),
        }
    }

    pub fn already_exists(name: impl Into<String>, count: usize, context: OpContext) -> Self {
        DriveError::AlreadyExists {
            name: name.into(),
            count,
            context: context.into_box(),
        }
    }

    pub fn remote(action: &'static str, context: OpContext, source: StoreError) -> Self {
        DriveError::Remote {
            action,
            context: context.into_box(),
            source,
        }
    }

    pub fn io(action: &'static str, context: OpContext, source: io::Error) -> Self {
        DriveError::Io {
            action,
            context: context.into_box(),
            source,
        }
    }
}

//! Filesystem-style access to a flat, ID-keyed remote object store.
//!
//! The store allows duplicate sibling names and nodes with several parents.
//! This crate projects absolute `/`-separated paths onto that graph and
//! reports the cases where the tree view does not hold (ambiguous names,
//! multi-parent nodes) as classified errors.
//!
//! ```
//! use std::sync::Arc;
//!
//! use drivefs_core::store::{MemoryStore, memory::ROOT_ID};
//! use drivefs_core::{DriveFs, ErrorKind, NodeId};
//!
//! let fs = DriveFs::new(Arc::new(MemoryStore::new()));
//! let root = NodeId::from(ROOT_ID);
//!
//! let dir = fs.mkdir_all(&root, "/projects/2024").unwrap();
//! assert_eq!(fs.resolve_path(&dir.id).unwrap().to_string(), "/projects/2024");
//!
//! // A second folder with the same name makes the path ambiguous
//! let projects = fs.find_one(&root, "/projects").unwrap();
//! fs.mkdir(&projects.id, "2024").unwrap();
//! assert_eq!(fs.find_by_path(&root, "/projects/2024").unwrap().len(), 2);
//! let err = fs.mkdir_all(&root, "/projects/2024/q1").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::AlreadyExists);
//! ```

pub mod accessor;
pub mod config;
pub mod dir;
pub mod drivefs;
pub mod error;
pub mod node;
pub mod path;
pub mod perm;
pub mod resolve;
pub mod store;
pub mod walk;

// Re-export commonly used types at crate root
pub use accessor::{AccessControl, NodeAccessor, NodeGraph};
pub use config::DriveFsConfig;
pub use dir::{DriveDir, DriveFile, OpenEntry};
pub use drivefs::DriveFs;
pub use error::{DriveError, ErrorKind, OpContext};
pub use node::{NodeId, NodeKind, NodeRef, TypeTags};
pub use path::DrivePath;
pub use perm::{AccessEntry, Grantee, PermissionRequest, Role};
pub use resolve::{ResolvedSet, Uniqueness};
pub use store::{MemoryStore, RemoteStore, StoreError, StoreErrorKind};

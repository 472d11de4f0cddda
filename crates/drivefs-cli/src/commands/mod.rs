pub mod cat;
pub mod cp;
pub mod find;
pub mod info;
pub mod init;
pub mod ln;
pub mod ls;
pub mod mkdir;
pub mod mv;
pub mod perm;
pub mod resolve;
pub mod rm;
pub mod touch;
pub mod tree;
pub mod write;

use anyhow::{Context, Result, bail};

use drivefs_core::{DrivePath, NodeRef};

use crate::session::{Session, normalize_path};

/// The single node at `path`.
pub fn lookup(session: &Session, path: &str) -> Result<NodeRef> {
    let path = normalize_path(path);
    let node = session
        .fs()
        .find_one(session.root(), &path)
        .with_context(|| format!("Cannot resolve {path}"))?;
    Ok(node)
}

/// The single node at `path`, or `None` when nothing is there. Ambiguous
/// paths are still errors.
pub fn try_lookup(session: &Session, path: &str) -> Result<Option<NodeRef>> {
    let path = normalize_path(path);
    let found = session.fs().find_by_path(session.root(), &path)?;
    if found.is_empty() {
        return Ok(None);
    }
    let parsed = DrivePath::parse(&path)?;
    Ok(Some(found.into_unique(&parsed)?))
}

/// The folder that will hold `path` and the name of its last component.
pub fn parent_and_name(session: &Session, path: &str) -> Result<(NodeRef, String)> {
    let parsed = DrivePath::parse(&normalize_path(path))?;
    let Some((parent, name)) = parsed.split() else {
        bail!("The root folder has no parent");
    };
    let parent_node = lookup(session, &parent.to_string())?;
    if !parent_node.is_container() {
        bail!("Not a folder: {parent}");
    }
    Ok((parent_node, name.to_string()))
}

//! Pre-order traversal of the subtree below a node.
//!
//! The start node is visited first with the path `/`; every other node is
//! visited with its path relative to the start. Folders are listed after
//! they are visited and their children are visited in listing order.
//! Shortcuts, application documents and regular files are visited but never
//! listed.
//!
//! A visitor error stops the walk at once and is returned unchanged. Nodes
//! visited before the failure stay visited.

use tracing::{instrument, trace};

use crate::accessor::NodeGraph;
use crate::error::DriveError;
use crate::node::{NodeId, NodeRef};
use crate::path::DrivePath;

/// One visited node.
#[derive(Debug, Clone, Copy)]
pub struct WalkEntry<'a> {
    /// Path relative to the start of the walk
    pub path: &'a DrivePath,
    pub node: &'a NodeRef,
    /// The folder this node was listed under; `None` for the start node
    pub parent: Option<&'a NodeId>,
}

impl WalkEntry<'_> {
    #[inline]
    pub fn depth(&self) -> usize {
        self.path.depth()
    }
}

/// Walk from an already fetched node, passing a [`WalkEntry`] to `visit`.
#[instrument(level = "debug", skip(graph, start, visit), fields(start = %start.id))]
pub fn walk_entries<G, E, F>(graph: &G, start: NodeRef, mut visit: F) -> Result<usize, E>
where
    G: NodeGraph + ?Sized,
    E: From<DriveError>,
    F: FnMut(&WalkEntry<'_>) -> Result<(), E>,
{
    let mut visited = 0usize;
    let mut stack: Vec<(DrivePath, NodeRef, Option<NodeId>)> = vec![(DrivePath::root(), start, None)];

    while let Some((path, node, parent)) = stack.pop() {
        visit(&WalkEntry {
            path: &path,
            node: &node,
            parent: parent.as_ref(),
        })?;
        visited += 1;

        if !node.is_traversable() {
            continue;
        }
        let children = graph.children(&node.id)?;
        trace!(path = %path, children = children.len(), "Listed folder");
        // Pushed in reverse so the first listed child is visited next
        for child in children.into_iter().rev() {
            let child_path = path.join(child.name.as_str())?;
            stack.push((child_path, child, Some(node.id.clone())));
        }
    }

    trace!(visited, "Walk finished");
    Ok(visited)
}

/// Walk the subtree rooted at `start`, calling `visit` with each node's
/// relative path.
///
/// Fails with [`DriveError::NotFound`] if `start` does not exist.
pub fn walk<G, E, F>(graph: &G, start: &NodeId, mut visit: F) -> Result<(), E>
where
    G: NodeGraph + ?Sized,
    E: From<DriveError>,
    F: FnMut(&DrivePath, &NodeRef) -> Result<(), E>,
{
    let node = graph.node(start)?;
    walk_entries(graph, node, |entry: &WalkEntry<'_>| visit(entry.path, entry.node))?;
    Ok(())
}

/// Collect every `(path, node)` pair of the subtree in visiting order.
pub fn collect<G: NodeGraph + ?Sized>(graph: &G, start: &NodeId) -> Result<Vec<(DrivePath, NodeRef)>, DriveError> {
    let mut entries = Vec::new();
    walk(graph, start, |path: &DrivePath, node: &NodeRef| {
        entries.push((path.clone(), node.clone()));
        Ok::<(), DriveError>(())
    })?;
    Ok(entries)
}

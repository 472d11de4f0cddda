//! Path resolution in both directions.
//!
//! Forward resolution maps a [`DrivePath`] onto the graph starting from a
//! root node. Because sibling names may repeat, a path can match any number
//! of nodes:
//!
//! - [`resolve_all`] expands into every matching child at each level and
//!   returns the full [`ResolvedSet`].
//! - [`resolve_first`] follows a single chain, descending into the first
//!   match or failing on duplicates depending on [`Uniqueness`].
//! - [`make_dirs`] is the `mkdir -p` policy: descend into a unique match,
//!   create when nothing matches, refuse when duplicates already exist.
//!
//! Reverse resolution ([`reverse_resolve`]) climbs single-parent links from
//! a node up to the configured root and rebuilds the path.
//!
//! Only folders are descended into. Shortcuts are not followed.

use tracing::{debug, instrument, trace, warn};

use crate::accessor::NodeGraph;
use crate::error::{DriveError, OpContext};
use crate::node::{NodeId, NodeRef};
use crate::path::DrivePath;

/// What [`resolve_first`] does when a segment matches several siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Uniqueness {
    /// Descend into the first match in listing order
    #[default]
    FirstMatch,
    /// Fail with [`DriveError::AlreadyExists`]
    Required,
}

/// Every node reachable from a root by a path, one per distinct graph path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSet {
    nodes: Vec<NodeRef>,
}

impl ResolvedSet {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeRef> {
        self.nodes.iter()
    }

    pub fn first(&self) -> Option<&NodeRef> {
        self.nodes.first()
    }

    pub fn into_vec(self) -> Vec<NodeRef> {
        self.nodes
    }

    /// The single match; [`DriveError::NotFound`] when empty and
    /// [`DriveError::AlreadyExists`] when ambiguous.
    pub fn into_unique(mut self, path: &DrivePath) -> Result<NodeRef, DriveError> {
        match self.nodes.len() {
            0 => Err(DriveError::not_found(OpContext::new().with_path(path))),
            1 => Ok(self.nodes.remove(0)),
            count => Err(DriveError::already_exists(
                path.file_name().unwrap_or("/"),
                count,
                OpContext::new().with_path(path),
            )),
        }
    }
}

impl IntoIterator for ResolvedSet {
    type Item = NodeRef;
    type IntoIter = std::vec::IntoIter<NodeRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResolvedSet {
    type Item = &'a NodeRef;
    type IntoIter = std::slice::Iter<'a, NodeRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

/// Follow `path` from `root` along one chain of matches.
#[instrument(level = "debug", skip(graph), fields(root = %root, path = %path))]
pub fn resolve_first<G: NodeGraph + ?Sized>(
    graph: &G,
    root: &NodeId,
    path: &DrivePath,
    uniqueness: Uniqueness,
) -> Result<NodeRef, DriveError> {
    let mut current = graph.node(root)?;

    for (depth, segment) in path.components().enumerate() {
        if !current.is_traversable() {
            debug!(id = %current.id, kind = current.kind.label(), "Cannot descend into non-folder");
            return Err(DriveError::not_found(
                OpContext::new().with_path(path).with_name(segment).with_parent(&current.id),
            ));
        }

        let mut matches = graph.children_named(&current.id, segment)?;
        trace!(segment, depth, matches = matches.len(), "Looked up segment");
        if matches.is_empty() {
            return Err(DriveError::not_found(
                OpContext::new().with_path(path).with_name(segment).with_parent(&current.id),
            ));
        }
        if matches.len() > 1 && uniqueness == Uniqueness::Required {
            warn!(segment, count = matches.len(), "Ambiguous path segment");
            return Err(DriveError::already_exists(
                segment,
                matches.len(),
                OpContext::new().with_path(path).with_parent(&current.id),
            ));
        }
        current = matches.swap_remove(0);
    }

    debug!(id = %current.id, "Path resolved");
    Ok(current)
}

/// Every node matching `path` from `root`, by depth-first search.
///
/// A missing root or an unmatched path is an empty set, not an error.
#[instrument(level = "debug", skip(graph), fields(root = %root, path = %path))]
pub fn resolve_all<G: NodeGraph + ?Sized>(
    graph: &G,
    root: &NodeId,
    path: &DrivePath,
) -> Result<ResolvedSet, DriveError> {
    let Some(start) = graph.find_node(root)? else {
        debug!("Root does not exist");
        return Ok(ResolvedSet::default());
    };

    let segments = path.segments();
    let mut found = Vec::new();
    // (node, index of the next segment to match)
    let mut stack = vec![(start, 0usize)];
    while let Some((node, index)) = stack.pop() {
        let Some(segment) = segments.get(index) else {
            found.push(node);
            continue;
        };
        if !node.is_traversable() {
            continue;
        }
        let matches = graph.children_named(&node.id, segment)?;
        trace!(segment = %segment, depth = index, matches = matches.len(), "Expanding segment");
        // Reversed so matches are explored in listing order
        stack.extend(matches.into_iter().rev().map(|child| (child, index + 1)));
    }

    debug!(matches = found.len(), "Path resolved");
    Ok(ResolvedSet { nodes: found })
}

/// Resolve `path` from `root`, creating missing folders along the way.
///
/// Fails with [`DriveError::AlreadyExists`] if a level already holds more
/// than one entry with the segment's name, or a single entry that is not a
/// folder.
#[instrument(level = "debug", skip(graph), fields(root = %root, path = %path))]
pub fn make_dirs<G: NodeGraph + ?Sized>(graph: &G, root: &NodeId, path: &DrivePath) -> Result<NodeRef, DriveError> {
    let mut current = graph.node(root)?;

    for segment in path.components() {
        let mut matches = graph.children_named(&current.id, segment)?;
        current = match matches.len() {
            0 => {
                let created = graph.create_folder(&current.id, segment)?;
                debug!(segment, id = %created.id, "Created folder");
                created
            }
            1 => {
                let existing = matches.swap_remove(0);
                if !existing.is_traversable() {
                    return Err(DriveError::already_exists(
                        segment,
                        1,
                        OpContext::new().with_path(path).with_parent(&current.id).with_id(&existing.id),
                    ));
                }
                trace!(segment, id = %existing.id, "Folder exists");
                existing
            }
            count => {
                warn!(segment, count, "Refusing to create under duplicated name");
                return Err(DriveError::already_exists(
                    segment,
                    count,
                    OpContext::new().with_path(path).with_parent(&current.id),
                ));
            }
        };
    }

    Ok(current)
}

/// Rebuild the path of `id` by following parent links up to `root`.
///
/// Climbing stops at `root` or at a node with no parent, whose own name is
/// not part of the path. Fails with [`DriveError::MultiParentsNotSupported`]
/// at the first node with several parents. With `max_depth` set, a chain
/// longer than that many names fails with [`DriveError::InvalidPath`].
#[instrument(level = "debug", skip(graph), fields(id = %id, root = %root))]
pub fn reverse_resolve<G: NodeGraph + ?Sized>(
    graph: &G,
    id: &NodeId,
    root: &NodeId,
    max_depth: Option<usize>,
) -> Result<DrivePath, DriveError> {
    let mut names = Vec::new();
    let mut current = id.clone();

    while current != *root {
        let node = graph.node(&current)?;
        let parent = match node.parents.as_slice() {
            [] => {
                trace!(id = %node.id, "Reached parentless node");
                break;
            }
            [parent] => parent.clone(),
            parents => {
                warn!(id = %node.id, parents = parents.len(), "Multiple parents on reverse walk");
                return Err(DriveError::MultiParentsNotSupported {
                    count: parents.len(),
                    context: OpContext::new().with_id(&node.id).with_name(node.name).into_box(),
                });
            }
        };

        names.push(node.name);
        if let Some(max) = max_depth
            && names.len() > max
        {
            return Err(DriveError::invalid_path(
                format!("(node {id})"),
                format!("ancestor chain exceeds maximum depth {max}"),
            ));
        }
        current = parent;
    }

    names.reverse();
    let path = DrivePath::from_segments(names)?;
    debug!(path = %path, "Reverse resolved");
    Ok(path)
}

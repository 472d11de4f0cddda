//! Open handles: a chunked directory cursor and an in-memory file reader.

use std::io::{self, Cursor, Read};

use parking_lot::Mutex;
use tracing::trace;

use crate::node::NodeRef;

/// A folder listing fetched once and handed out in chunks.
///
/// The read offset is the only shared mutable state in the crate; it is
/// guarded so that concurrent readers never receive the same entry twice.
#[derive(Debug)]
pub struct DriveDir {
    info: NodeRef,
    entries: Vec<NodeRef>,
    offset: Mutex<usize>,
}

impl DriveDir {
    pub fn new(info: NodeRef, entries: Vec<NodeRef>) -> Self {
        Self {
            info,
            entries,
            offset: Mutex::new(0),
        }
    }

    /// Metadata of the folder itself.
    pub fn info(&self) -> &NodeRef {
        &self.info
    }

    /// Take the next entries.
    ///
    /// `n == 0` returns everything not yet read. Otherwise at most `n`
    /// entries are returned, and an empty vector means the listing is
    /// exhausted.
    pub fn read_entries(&self, n: usize) -> Vec<NodeRef> {
        let mut offset = self.offset.lock();
        let start = (*offset).min(self.entries.len());
        let end = if n == 0 {
            self.entries.len()
        } else {
            start.saturating_add(n).min(self.entries.len())
        };
        *offset = end;
        trace!(id = %self.info.id, start, end, "Read directory entries");
        self.entries[start..end].to_vec()
    }

    /// Number of entries not yet returned.
    pub fn remaining(&self) -> usize {
        self.entries.len().saturating_sub(*self.offset.lock())
    }

    /// Rewind to the first entry.
    pub fn rewind(&self) {
        *self.offset.lock() = 0;
    }
}

/// A downloaded regular file.
#[derive(Debug)]
pub struct DriveFile {
    info: NodeRef,
    content: Cursor<Vec<u8>>,
}

impl DriveFile {
    pub fn new(info: NodeRef, content: Vec<u8>) -> Self {
        Self {
            info,
            content: Cursor::new(content),
        }
    }

    pub fn info(&self) -> &NodeRef {
        &self.info
    }

    pub fn len(&self) -> usize {
        self.content.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.get_ref().is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.content.into_inner()
    }
}

impl Read for DriveFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.content.read(buf)
    }
}

/// What [`crate::DriveFs::open`] found at a path.
#[derive(Debug)]
pub enum OpenEntry {
    Dir(DriveDir),
    File(DriveFile),
}

impl OpenEntry {
    pub fn info(&self) -> &NodeRef {
        match self {
            OpenEntry::Dir(dir) => dir.info(),
            OpenEntry::File(file) => file.info(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::node::{NodeId, NodeKind};

    fn node(name: &str) -> NodeRef {
        NodeRef {
            id: NodeId::from(name),
            name: name.to_string(),
            kind: NodeKind::Regular,
            type_tag: "text/plain".to_string(),
            size: 0,
            modified: None,
            parents: vec![NodeId::from("dir")],
            web_view_link: None,
        }
    }

    fn dir(count: usize) -> DriveDir {
        let mut info = node("dir");
        info.kind = NodeKind::Folder;
        DriveDir::new(info, (0..count).map(|i| node(&format!("e{i}"))).collect())
    }

    #[test]
    fn test_chunked_reads_until_exhausted() {
        let d = dir(5);
        assert_eq!(d.read_entries(2).len(), 2);
        assert_eq!(d.remaining(), 3);
        let second = d.read_entries(2);
        assert_eq!(second[0].name, "e2");
        assert_eq!(d.read_entries(2).len(), 1);
        assert!(d.read_entries(2).is_empty());
        assert_eq!(d.remaining(), 0);
    }

    #[test]
    fn test_zero_drains_rest() {
        let d = dir(4);
        d.read_entries(1);
        let rest = d.read_entries(0);
        assert_eq!(rest.len(), 3);
        assert!(d.read_entries(0).is_empty());

        d.rewind();
        assert_eq!(d.remaining(), 4);
    }

    #[test]
    fn test_concurrent_readers_never_share_entries() {
        let d = Arc::new(dir(200));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let d = Arc::clone(&d);
                thread::spawn(move || {
                    let mut names = Vec::new();
                    loop {
                        let chunk = d.read_entries(3);
                        if chunk.is_empty() {
                            break;
                        }
                        names.extend(chunk.into_iter().map(|n| n.name));
                    }
                    names
                })
            })
            .collect();

        let mut all: Vec<String> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 200);
    }

    #[test]
    fn test_file_reads_content() {
        let mut file = DriveFile::new(node("f"), b"hello".to_vec());
        assert_eq!(file.len(), 5);
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello");
    }
}

//! Absolute, `/`-separated paths projected onto the remote graph.
//!
//! A [`DrivePath`] is an ordered list of name segments rooted at whatever
//! node the caller resolves it against. Parsing is strict: the text must
//! start with `/`, and empty, `.` and `..` segments are rejected rather than
//! collapsed, so `/a//b` and `/a/b/` are errors instead of aliases of
//! `/a/b`. The same segment rules apply when a path is assembled from
//! remote names during reverse resolution or a walk.

use std::fmt;
use std::str::FromStr;

use crate::error::DriveError;

const SEPARATOR: char = '/';

/// A parsed absolute path.
///
/// # Examples
///
/// ```
/// use drivefs_core::path::DrivePath;
///
/// let path = DrivePath::parse("/Documents/report.txt").unwrap();
/// assert_eq!(path.file_name(), Some("report.txt"));
/// assert_eq!(path.parent().unwrap().to_string(), "/Documents");
///
/// assert!(DrivePath::parse("Documents").is_err());
/// assert!(DrivePath::parse("/Documents//report.txt").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrivePath {
    segments: Vec<String>,
}

impl DrivePath {
    /// The root path `/` (no segments).
    #[inline]
    pub fn root() -> Self {
        DrivePath::default()
    }

    /// Parse an absolute path string.
    pub fn parse(text: &str) -> Result<Self, DriveError> {
        if text.is_empty() {
            return Err(DriveError::invalid_path(text, "empty path"));
        }
        let Some(rest) = text.strip_prefix(SEPARATOR) else {
            return Err(DriveError::invalid_path(text, "path must be absolute and start with '/'"));
        };
        if rest.is_empty() {
            return Ok(DrivePath::root());
        }

        let mut segments = Vec::new();
        for segment in rest.split(SEPARATOR) {
            check_segment(segment).map_err(|reason| DriveError::invalid_path(text, reason))?;
            segments.push(segment.to_string());
        }
        Ok(DrivePath { segments })
    }

    /// Build a path from already-split names, validating each one.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, DriveError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut path = DrivePath::root();
        for segment in segments {
            path.push(segment)?;
        }
        Ok(path)
    }

    /// Append one segment in place.
    pub fn push(&mut self, segment: impl Into<String>) -> Result<(), DriveError> {
        let segment = segment.into();
        if let Err(reason) = check_segment(&segment) {
            return Err(DriveError::invalid_path(format!("{self}{}{segment}", self.join_separator()), reason));
        }
        self.segments.push(segment);
        Ok(())
    }

    /// Return a new path with `segment` appended.
    pub fn join(&self, segment: impl Into<String>) -> Result<Self, DriveError> {
        let mut joined = self.clone();
        joined.push(segment)?;
        Ok(joined)
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments (0 for the root).
    #[inline]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Returns `None` for the root path.
    pub fn parent(&self) -> Option<DrivePath> {
        let (_, parent) = self.segments.split_last()?;
        Some(DrivePath {
            segments: parent.to_vec(),
        })
    }

    /// Returns `None` for the root path.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Split into parent path and final name; `None` for the root.
    pub fn split(&self) -> Option<(DrivePath, &str)> {
        let parent = self.parent()?;
        let name = self.file_name()?;
        Some((parent, name))
    }

    fn join_separator(&self) -> &'static str {
        if self.is_root() { "" } else { "/" }
    }
}

fn check_segment(segment: &str) -> Result<(), &'static str> {
    if segment.is_empty() {
        return Err("empty path segment");
    }
    if segment == "." || segment == ".." {
        return Err("relative path components are not allowed");
    }
    if segment.contains(SEPARATOR) {
        return Err("segment contains a path separator");
    }
    Ok(())
}

impl fmt::Display for DrivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for DrivePath {
    type Err = DriveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DrivePath::parse(s)
    }
}

impl TryFrom<&str> for DrivePath {
    type Error = DriveError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        DrivePath::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::error::ErrorKind;

    fn invalid(text: &str) -> bool {
        DrivePath::parse(text).is_err_and(|e| e.kind() == ErrorKind::InvalidPath)
    }

    #[test]
    fn test_parse_root() {
        let root = DrivePath::parse("/").unwrap();
        assert!(root.is_root());
        assert_eq!(root.depth(), 0);
        assert_eq!(root.to_string(), "/");
    }

    #[test]
    fn test_parse_segments() {
        let path = DrivePath::parse("/a/b/c").unwrap();
        let components: Vec<_> = path.components().collect();
        assert_eq!(components, vec!["a", "b", "c"]);
        assert_eq!(path.to_string(), "/a/b/c");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(invalid(""));
        assert!(invalid("a/b"));
        assert!(invalid("/a/./b"));
        assert!(invalid("/a/../b"));
        assert!(invalid("/.."));
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        // Doubled and trailing separators are errors, not collapsed.
        assert!(invalid("//"));
        assert!(invalid("/a//b"));
        assert!(invalid("/a/b/"));
        assert!(invalid("//a"));
    }

    #[test]
    fn test_segments_are_opaque_text() {
        let path = DrivePath::parse("/My Drive/O'Brien/a\\b/Ünïcødé").unwrap();
        assert_eq!(path.depth(), 4);
        assert_eq!(path.file_name(), Some("Ünïcødé"));
        assert_eq!(path.segments()[2], "a\\b");
        // Case-sensitive
        assert_ne!(DrivePath::parse("/A").unwrap(), DrivePath::parse("/a").unwrap());
    }

    #[test]
    fn test_join_validates() {
        let root = DrivePath::root();
        let docs = root.join("docs").unwrap();
        assert_eq!(docs.to_string(), "/docs");
        assert_eq!(docs.join("x").unwrap().to_string(), "/docs/x");

        assert!(docs.join("").is_err());
        assert!(docs.join("..").is_err());
        let err = docs.join("a/b").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPath);
        assert!(err.to_string().contains("/docs/a/b"));
    }

    #[test]
    fn test_from_segments() {
        let path = DrivePath::from_segments(["a", "b"]).unwrap();
        assert_eq!(path, DrivePath::parse("/a/b").unwrap());
        assert!(DrivePath::from_segments(["a", ""]).is_err());
        assert!(DrivePath::from_segments(Vec::<String>::new()).unwrap().is_root());
    }

    #[test]
    fn test_parent_and_split() {
        let path = DrivePath::parse("/a/b/c").unwrap();
        let (parent, name) = path.split().unwrap();
        assert_eq!(parent.to_string(), "/a/b");
        assert_eq!(name, "c");

        let top = DrivePath::parse("/a").unwrap();
        assert!(top.parent().unwrap().is_root());
        assert!(DrivePath::root().split().is_none());
    }

    fn segment_strategy() -> impl Strategy<Value = String> {
        "[^/]{1,12}".prop_filter("no relative components", |s| s != "." && s != "..")
    }

    proptest! {
        #[test]
        fn prop_display_parse_roundtrip(segments in prop::collection::vec(segment_strategy(), 0..8)) {
            let path = DrivePath::from_segments(segments.clone()).unwrap();
            let reparsed = DrivePath::parse(&path.to_string()).unwrap();
            prop_assert_eq!(reparsed.segments(), segments.as_slice());
        }

        #[test]
        fn prop_relative_text_is_rejected(text in "[^/].*") {
            prop_assert!(DrivePath::parse(&text).is_err());
        }
    }
}

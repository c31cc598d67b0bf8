use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Absolute, `/`-separated logical path of a node inside a tree.
///
/// The same `NodePath` names corresponding nodes under two different roots,
/// which is what lets two trees be paired. Paths are normalized on parse:
/// repeated and trailing slashes collapse, and the root is `/`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodePath {
    segments: Vec<String>,
}

impl NodePath {
    /// The root path `/`.
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parse and normalize a path. A missing leading `/` is accepted.
    ///
    /// `.` and `..` segments are rejected rather than resolved.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let mut segments = Vec::new();
        for segment in s.split('/').filter(|seg| !seg.is_empty()) {
            if segment == "." || segment == ".." {
                return Err(TypeError::InvalidPath {
                    path: s.to_string(),
                    reason: format!("relative segment {segment:?}"),
                });
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// Child path with one more segment.
    ///
    /// `name` is taken verbatim; it must not contain `/`.
    pub fn join(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    /// Last segment, or `""` for the root.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// Parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Path segments from the root down.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Number of segments (the root has depth 0).
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if this is `/`.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl Default for NodePath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodePath({self})")
    }
}

impl TryFrom<String> for NodePath {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<NodePath> for String {
    fn from(path: NodePath) -> Self {
        path.to_string()
    }
}

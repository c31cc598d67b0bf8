use std::fmt;
use std::sync::Arc;

use twig_types::{ContentType, Fingerprint, NodePath};

use crate::error::StoreResult;

/// Shared handle to a node.
pub type NodeRef = Arc<dyn Node>;

/// A directory or leaf in a tree.
///
/// Implementations must satisfy these invariants:
/// - `path()` is relative to the tree's root, so the same path names the
///   corresponding node in another tree.
/// - `child()` returns `Ok(None)` when no such child exists, including when
///   `self` is not a directory.
/// - `read()` fails with `StoreError::NotFound` when the data does not exist.
/// - `fingerprint()` never reads content. Providers without precomputed
///   fingerprints keep the default.
pub trait Node: Send + Sync + fmt::Debug {
    /// Last path segment (empty for a root).
    fn name(&self) -> &str;

    /// Logical path from the tree root.
    fn path(&self) -> &NodePath;

    /// Human-readable label used verbatim in diff messages.
    fn display_path(&self) -> String;

    /// Returns `true` if this node is a directory.
    fn is_dir(&self) -> bool;

    /// Direct children in the provider's native order. Empty for leaves.
    fn children(&self) -> StoreResult<Vec<NodeRef>>;

    /// The child with the given name, if it exists.
    fn child(&self, name: &str) -> StoreResult<Option<NodeRef>>;

    /// How this node's content should be interpreted.
    fn content_type(&self) -> ContentType;

    /// Precomputed content fingerprint, when the provider has one.
    fn fingerprint(&self) -> StoreResult<Option<Fingerprint>> {
        Ok(None)
    }

    /// Fetch the full content. May be expensive.
    fn read(&self) -> StoreResult<Vec<u8>>;
}

//! Node providers for twig.
//!
//! The diff engine never touches storage directly. It walks trees through the
//! [`Node`] trait, which any backend can implement: a remote API, an archive,
//! a directory on disk. Reading a leaf may be expensive, so providers that
//! already know a content fingerprint expose it through
//! [`Node::fingerprint`] and let the engine skip the read.
//!
//! # Providers
//!
//! - [`MemoryTree`] -- in-memory tree for tests and embedding
//! - [`LocalNode`] -- a directory on the local filesystem
//!
//! # Enumeration
//!
//! - [`PathPattern`] -- gitignore-style glob rooted at the tree root
//! - [`list_matching`] -- lazily enumerate nodes whose path matches a pattern
//! - [`resolve_path`] -- look up the node at a path, if it exists
//!
//! # Design Rules
//!
//! 1. A missing node is `None`, never an error. Only `read()` reports absence
//!    as [`StoreError::NotFound`], because a node handle may outlive its data.
//! 2. `children()` returns entries in the provider's native order.
//! 3. Fingerprints must be computed with `twig_crypto::ContentHasher::CONTENT`.

pub mod error;
pub mod local;
pub mod memory;
pub mod pattern;
pub mod resolve;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use local::LocalNode;
pub use memory::MemoryTree;
pub use pattern::PathPattern;
pub use resolve::{list_matching, resolve_path, ListMatching};
pub use traits::{Node, NodeRef};

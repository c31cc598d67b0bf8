use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use twig_crypto::ContentHasher;
use twig_types::{ContentType, Fingerprint, NodePath};

use crate::error::{StoreError, StoreResult};
use crate::traits::{Node, NodeRef};

#[derive(Clone, Debug)]
enum Entry {
    Dir,
    File {
        data: Vec<u8>,
        content_type: ContentType,
    },
}

struct Inner {
    label: String,
    fingerprints: bool,
    entries: RwLock<BTreeMap<NodePath, Entry>>,
    reads: AtomicUsize,
}

/// In-memory tree provider.
///
/// Intended for tests and embedding. Entries live behind a `RwLock` keyed by
/// path, so children come back sorted by name. Every `read()` call is
/// counted, which lets callers check how much content a comparison fetched.
///
/// With [`MemoryTree::with_fingerprints`] enabled, leaves expose a
/// precomputed fingerprint the way a remote store with server-side checksums
/// would.
#[derive(Clone)]
pub struct MemoryTree {
    inner: Arc<Inner>,
}

impl MemoryTree {
    /// Create an empty tree containing only the root directory.
    pub fn new() -> Self {
        Self::with_label("")
    }

    /// Create an empty tree whose display paths are prefixed with `label`.
    pub fn with_label(label: impl Into<String>) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(NodePath::root(), Entry::Dir);
        Self {
            inner: Arc::new(Inner {
                label: label.into(),
                fingerprints: false,
                entries: RwLock::new(entries),
                reads: AtomicUsize::new(0),
            }),
        }
    }

    /// Toggle the fingerprint capability on leaves.
    ///
    /// Must be called before any node handle is taken.
    pub fn with_fingerprints(self, enabled: bool) -> Self {
        let inner = match Arc::try_unwrap(self.inner) {
            Ok(mut inner) => {
                inner.fingerprints = enabled;
                inner
            }
            Err(shared) => Inner {
                label: shared.label.clone(),
                fingerprints: enabled,
                entries: RwLock::new(shared.entries.read().expect("lock poisoned").clone()),
                reads: AtomicUsize::new(shared.reads.load(Ordering::Relaxed)),
            },
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Create a directory and any missing parents.
    pub fn insert_dir(&self, path: &str) -> StoreResult<()> {
        let path = NodePath::parse(path)?;
        let mut entries = self.inner.entries.write().expect("lock poisoned");
        ensure_parents(&mut entries, &path)?;
        match entries.get(&path) {
            Some(Entry::File { .. }) => Err(StoreError::NotADirectory(path)),
            Some(Entry::Dir) => Ok(()),
            None => {
                entries.insert(path, Entry::Dir);
                Ok(())
            }
        }
    }

    /// Create or replace a file, guessing its content type from the name.
    pub fn insert_file(&self, path: &str, data: impl Into<Vec<u8>>) -> StoreResult<()> {
        let parsed = NodePath::parse(path)?;
        let content_type = ContentType::from_name(parsed.name());
        self.insert_file_as(path, data, content_type)
    }

    /// Create or replace a file with an explicit content type.
    pub fn insert_file_as(
        &self,
        path: &str,
        data: impl Into<Vec<u8>>,
        content_type: ContentType,
    ) -> StoreResult<()> {
        let path = NodePath::parse(path)?;
        if path.is_root() {
            return Err(StoreError::IsADirectory(path));
        }
        let mut entries = self.inner.entries.write().expect("lock poisoned");
        ensure_parents(&mut entries, &path)?;
        if let Some(Entry::Dir) = entries.get(&path) {
            return Err(StoreError::IsADirectory(path));
        }
        entries.insert(
            path,
            Entry::File {
                data: data.into(),
                content_type,
            },
        );
        Ok(())
    }

    /// Remove a node and everything below it. Returns `true` if it existed.
    ///
    /// Existing handles to removed nodes stay valid; reading them fails with
    /// `NotFound`.
    pub fn remove(&self, path: &str) -> StoreResult<bool> {
        let path = NodePath::parse(path)?;
        if path.is_root() {
            return Err(StoreError::IsADirectory(path));
        }
        let mut entries = self.inner.entries.write().expect("lock poisoned");
        let existed = entries.contains_key(&path);
        entries.retain(|p, _| !is_within(p, &path));
        Ok(existed)
    }

    /// Handle to the root directory.
    pub fn root(&self) -> NodeRef {
        self.node(NodePath::root())
    }

    /// Handle to the node at `path`, if it exists.
    pub fn get(&self, path: &str) -> StoreResult<Option<NodeRef>> {
        let path = NodePath::parse(path)?;
        let exists = self
            .inner
            .entries
            .read()
            .expect("lock poisoned")
            .contains_key(&path);
        Ok(exists.then(|| self.node(path)))
    }

    /// Number of `read()` calls made through any handle of this tree.
    pub fn reads(&self) -> usize {
        self.inner.reads.load(Ordering::Relaxed)
    }

    /// Number of entries, directories included (the root counts).
    pub fn len(&self) -> usize {
        self.inner.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the tree holds nothing but its root.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    fn node(&self, path: NodePath) -> NodeRef {
        Arc::new(MemoryNode {
            inner: Arc::clone(&self.inner),
            path,
        })
    }
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTree")
            .field("label", &self.inner.label)
            .field("entry_count", &self.len())
            .field("fingerprints", &self.inner.fingerprints)
            .finish()
    }
}

fn ensure_parents(entries: &mut BTreeMap<NodePath, Entry>, path: &NodePath) -> StoreResult<()> {
    let mut ancestors = Vec::new();
    let mut current = path.parent();
    while let Some(parent) = current {
        current = parent.parent();
        ancestors.push(parent);
    }
    for ancestor in ancestors.into_iter().rev() {
        match entries.get(&ancestor) {
            Some(Entry::File { .. }) => return Err(StoreError::NotADirectory(ancestor)),
            Some(Entry::Dir) => {}
            None => {
                entries.insert(ancestor, Entry::Dir);
            }
        }
    }
    Ok(())
}

fn is_within(path: &NodePath, ancestor: &NodePath) -> bool {
    path.depth() >= ancestor.depth() && path.segments().zip(ancestor.segments()).all(|(a, b)| a == b)
}

struct MemoryNode {
    inner: Arc<Inner>,
    path: NodePath,
}

impl MemoryNode {
    fn entry(&self) -> Option<Entry> {
        self.inner
            .entries
            .read()
            .expect("lock poisoned")
            .get(&self.path)
            .cloned()
    }

    fn handle(&self, path: NodePath) -> NodeRef {
        Arc::new(MemoryNode {
            inner: Arc::clone(&self.inner),
            path,
        })
    }
}

impl std::fmt::Debug for MemoryNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryNode").field("path", &self.path).finish()
    }
}

impl Node for MemoryNode {
    fn name(&self) -> &str {
        self.path.name()
    }

    fn path(&self) -> &NodePath {
        &self.path
    }

    fn display_path(&self) -> String {
        if self.inner.label.is_empty() {
            self.path.to_string()
        } else {
            format!("{}:{}", self.inner.label, self.path)
        }
    }

    fn is_dir(&self) -> bool {
        matches!(self.entry(), Some(Entry::Dir))
    }

    fn children(&self) -> StoreResult<Vec<NodeRef>> {
        let entries = self.inner.entries.read().expect("lock poisoned");
        match entries.get(&self.path) {
            Some(Entry::Dir) => {}
            _ => return Ok(Vec::new()),
        }
        let depth = self.path.depth() + 1;
        let children = entries
            .range(self.path.clone()..)
            .skip(1)
            .take_while(|(p, _)| is_within(p, &self.path))
            .filter(|(p, _)| p.depth() == depth)
            .map(|(p, _)| self.handle(p.clone()))
            .collect();
        Ok(children)
    }

    fn child(&self, name: &str) -> StoreResult<Option<NodeRef>> {
        if !self.is_dir() {
            return Ok(None);
        }
        let path = self.path.join(name);
        let exists = self
            .inner
            .entries
            .read()
            .expect("lock poisoned")
            .contains_key(&path);
        Ok(exists.then(|| self.handle(path)))
    }

    fn content_type(&self) -> ContentType {
        match self.entry() {
            Some(Entry::File { content_type, .. }) => content_type,
            _ => ContentType::Raw,
        }
    }

    fn fingerprint(&self) -> StoreResult<Option<Fingerprint>> {
        if !self.inner.fingerprints {
            return Ok(None);
        }
        match self.entry() {
            Some(Entry::File { data, .. }) => Ok(Some(ContentHasher::CONTENT.hash(&data))),
            _ => Ok(None),
        }
    }

    fn read(&self) -> StoreResult<Vec<u8>> {
        self.inner.reads.fetch_add(1, Ordering::Relaxed);
        match self.entry() {
            Some(Entry::File { data, .. }) => Ok(data),
            Some(Entry::Dir) => Err(StoreError::IsADirectory(self.path.clone())),
            None => Err(StoreError::NotFound(self.path.clone())),
        }
    }
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;
use twig_types::{ContentType, NodePath};

use crate::error::{StoreError, StoreResult};
use crate::traits::{Node, NodeRef};

/// A file or directory on the local filesystem.
///
/// Children are listed sorted by file name, and entries whose name starts
/// with `.` are skipped. Local files carry no precomputed fingerprint.
#[derive(Debug)]
pub struct LocalNode {
    fs_path: PathBuf,
    path: NodePath,
}

impl LocalNode {
    /// Open a directory as the root of a tree.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<NodeRef> {
        let dir = dir.as_ref();
        let meta = fs::metadata(dir).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(NodePath::root()),
            _ => StoreError::Io(e),
        })?;
        if !meta.is_dir() {
            return Err(StoreError::NotADirectory(NodePath::root()));
        }
        Ok(Arc::new(Self {
            fs_path: dir.to_path_buf(),
            path: NodePath::root(),
        }))
    }

    /// Location of this node on disk.
    pub fn fs_path(&self) -> &Path {
        &self.fs_path
    }

    fn at(&self, name: &str) -> Self {
        Self {
            fs_path: self.fs_path.join(name),
            path: self.path.join(name),
        }
    }
}

impl Node for LocalNode {
    fn name(&self) -> &str {
        self.path.name()
    }

    fn path(&self) -> &NodePath {
        &self.path
    }

    fn display_path(&self) -> String {
        self.fs_path.display().to_string()
    }

    fn is_dir(&self) -> bool {
        self.fs_path.is_dir()
    }

    fn children(&self) -> StoreResult<Vec<NodeRef>> {
        if !self.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.fs_path)? {
            let entry = entry?;
            match entry.file_name().into_string() {
                Ok(name) if name.starts_with('.') => {}
                Ok(name) => names.push(name),
                Err(raw) => warn!(dir = %self.fs_path.display(), name = ?raw, "skipping non UTF-8 entry"),
            }
        }
        names.sort();
        Ok(names
            .into_iter()
            .map(|name| Arc::new(self.at(&name)) as NodeRef)
            .collect())
    }

    fn child(&self, name: &str) -> StoreResult<Option<NodeRef>> {
        if !self.is_dir() || name.starts_with('.') || name.contains('/') {
            return Ok(None);
        }
        let child = self.at(name);
        match fs::symlink_metadata(&child.fs_path) {
            Ok(_) => Ok(Some(Arc::new(child))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn content_type(&self) -> ContentType {
        ContentType::from_name(self.name())
    }

    fn read(&self) -> StoreResult<Vec<u8>> {
        if self.is_dir() {
            return Err(StoreError::IsADirectory(self.path.clone()));
        }
        fs::read(&self.fs_path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(self.path.clone()),
            _ => StoreError::Io(e),
        })
    }
}

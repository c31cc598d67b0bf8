use tracing::debug;
use twig_types::NodePath;

use crate::error::{StoreError, StoreResult};
use crate::pattern::PathPattern;
use crate::traits::NodeRef;

/// Look up the node at `path` under `root`.
///
/// Returns `Ok(None)` as soon as any segment is missing.
pub fn resolve_path(root: &NodeRef, path: &NodePath) -> StoreResult<Option<NodeRef>> {
    let mut current = root.clone();
    for segment in path.segments() {
        match current.child(segment)? {
            Some(child) => current = child,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Lazily enumerate every node under `root` (root included) whose path
/// matches `pattern`, depth-first in native child order.
///
/// Directories are descended only while the pattern could still match
/// below them, so a narrow pattern touches few nodes.
pub fn list_matching(root: &NodeRef, pattern: &PathPattern) -> ListMatching {
    ListMatching {
        pattern: pattern.clone(),
        stack: vec![root.clone()],
        deferred: None,
    }
}

/// Iterator returned by [`list_matching`].
#[derive(Debug)]
pub struct ListMatching {
    pattern: PathPattern,
    stack: Vec<NodeRef>,
    deferred: Option<StoreError>,
}

impl Iterator for ListMatching {
    type Item = StoreResult<NodeRef>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.deferred.take() {
            return Some(Err(err));
        }
        while let Some(node) = self.stack.pop() {
            let is_dir = node.is_dir();
            let matched = self.pattern.matches(node.path(), is_dir);

            if is_dir && self.pattern.could_match_below(node.path()) {
                match node.children() {
                    Ok(children) => self.stack.extend(children.into_iter().rev()),
                    Err(err) if matched => {
                        self.deferred = Some(err);
                    }
                    Err(err) => return Some(Err(err)),
                }
            }

            if matched {
                debug!(path = %node.path(), pattern = %self.pattern, "pattern match");
                return Some(Ok(node));
            }
        }
        None
    }
}

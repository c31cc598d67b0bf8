//! Tree pairing: find the leaf pairs two trees should be compared on.

use std::collections::{HashMap, HashSet};

use tracing::debug;
use twig_store::NodeRef;
use twig_types::NodePath;

use crate::config::Depth;
use crate::error::DiffResult;

/// Two nodes at the same logical path under two roots. Either may be absent.
#[derive(Clone, Debug)]
pub struct LeafPair {
    pub path: NodePath,
    pub old: Option<NodeRef>,
    pub new: Option<NodeRef>,
}

impl LeafPair {
    /// Pair two nodes, taking the path from whichever side exists.
    pub fn new(old: Option<NodeRef>, new: Option<NodeRef>) -> Self {
        let path = old
            .as_ref()
            .or(new.as_ref())
            .map(|node| node.path().clone())
            .unwrap_or_default();
        Self { path, old, new }
    }

    /// Returns `true` if exactly one side exists.
    pub fn is_one_sided(&self) -> bool {
        self.old.is_some() != self.new.is_some()
    }

    /// Returns `true` if only the old side exists.
    pub fn only_in_old(&self) -> bool {
        self.old.is_some() && self.new.is_none()
    }

    /// Returns `true` if only the new side exists.
    pub fn only_in_new(&self) -> bool {
        self.old.is_none() && self.new.is_some()
    }
}

/// Lazily pair the leaves of two trees, depth-first.
///
/// Two directories that both have children are opened: each old child is
/// paired with the new child of the same name, then every new child without
/// an old counterpart is yielded as a one-sided pair without being opened.
/// Anything else (a leaf, a missing side, an empty directory, or an exhausted
/// depth budget) is yielded as a pair as-is.
pub fn pair_leaves(old: Option<NodeRef>, new: Option<NodeRef>, depth: Depth) -> PairLeaves {
    PairLeaves {
        stack: vec![Frame::Visit(LeafPair::new(old, new), depth)],
    }
}

#[derive(Debug)]
enum Frame {
    Visit(LeafPair, Depth),
    Emit(LeafPair),
}

/// Iterator returned by [`pair_leaves`].
///
/// A store error while listing a directory is yielded in place of that
/// directory's pairs; the walk then continues with its siblings.
#[derive(Debug)]
pub struct PairLeaves {
    stack: Vec<Frame>,
}

impl Iterator for PairLeaves {
    type Item = DiffResult<LeafPair>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            let (pair, depth) = match frame {
                Frame::Emit(pair) => return Some(Ok(emit(pair))),
                Frame::Visit(pair, depth) => (pair, depth),
            };

            let (Some(old), Some(new)) = (&pair.old, &pair.new) else {
                return Some(Ok(emit(pair)));
            };
            if depth.is_exhausted() || !old.is_dir() || !new.is_dir() {
                return Some(Ok(emit(pair)));
            }

            let old_children = match old.children() {
                Ok(children) => children,
                Err(err) => return Some(Err(err.into())),
            };
            let new_children = match new.children() {
                Ok(children) => children,
                Err(err) => return Some(Err(err.into())),
            };
            if old_children.is_empty() || new_children.is_empty() {
                return Some(Ok(emit(pair)));
            }

            self.push_children(old_children, new_children, depth.descend());
        }
        None
    }
}

impl PairLeaves {
    fn push_children(&mut self, old_children: Vec<NodeRef>, new_children: Vec<NodeRef>, depth: Depth) {
        let old_names: HashSet<String> = old_children.iter().map(|c| c.name().to_string()).collect();
        let mut new_by_name: HashMap<String, NodeRef> = HashMap::with_capacity(new_children.len());
        let mut new_only = Vec::new();
        for child in new_children {
            if old_names.contains(child.name()) {
                new_by_name.insert(child.name().to_string(), child);
            } else {
                new_only.push(child);
            }
        }

        let mut frames: Vec<Frame> = old_children
            .into_iter()
            .map(|old_child| {
                let new_child = new_by_name.remove(old_child.name());
                Frame::Visit(LeafPair::new(Some(old_child), new_child), depth)
            })
            .collect();
        frames.extend(
            new_only
                .into_iter()
                .map(|new_child| Frame::Emit(LeafPair::new(None, Some(new_child)))),
        );
        self.stack.extend(frames.into_iter().rev());
    }
}

fn emit(pair: LeafPair) -> LeafPair {
    debug!(path = %pair.path, old = pair.old.is_some(), new = pair.new.is_some(), "leaf pair");
    pair
}

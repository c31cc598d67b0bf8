//! Pattern-driven pairing: pair the nodes a glob selects under two roots.

use std::collections::HashSet;

use twig_store::{list_matching, resolve_path, ListMatching, NodeRef, PathPattern};
use twig_types::NodePath;

use crate::config::Depth;
use crate::error::DiffResult;
use crate::walker::{pair_leaves, LeafPair, PairLeaves};

/// Lazily pair everything `pattern` selects under `old_root` and `new_root`.
///
/// Every old-side match is paired with the node at the same path under
/// `new_root` (possibly absent) and walked with [`pair_leaves`]. Afterwards
/// every new-side match whose path was not matched on the old side is
/// yielded as a pair without being walked, so nodes that only the new tree
/// has are still surfaced.
///
/// With an unbounded depth, a match nested under an already matched path is
/// skipped: the walk of its ancestor has covered it.
pub fn pairs_for_pattern(
    pattern: &PathPattern,
    old_root: &NodeRef,
    new_root: &NodeRef,
    depth: Depth,
) -> PatternPairs {
    PatternPairs {
        pattern: pattern.clone(),
        old_root: old_root.clone(),
        new_root: new_root.clone(),
        depth,
        phase: Phase::Old(list_matching(old_root, pattern)),
        walk: None,
        seen: HashSet::new(),
    }
}

#[derive(Debug)]
enum Phase {
    Old(ListMatching),
    New(ListMatching),
    Done,
}

/// Iterator returned by [`pairs_for_pattern`].
#[derive(Debug)]
pub struct PatternPairs {
    pattern: PathPattern,
    old_root: NodeRef,
    new_root: NodeRef,
    depth: Depth,
    phase: Phase,
    walk: Option<PairLeaves>,
    seen: HashSet<NodePath>,
}

impl PatternPairs {
    fn covered(&self, path: &NodePath) -> bool {
        if self.seen.contains(path) {
            return true;
        }
        if self.depth != Depth::Unbounded {
            return false;
        }
        let mut ancestor = path.parent();
        while let Some(dir) = ancestor {
            if self.seen.contains(&dir) {
                return true;
            }
            ancestor = dir.parent();
        }
        false
    }
}

impl Iterator for PatternPairs {
    type Item = DiffResult<LeafPair>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(walk) = &mut self.walk {
                match walk.next() {
                    Some(item) => return Some(item),
                    None => self.walk = None,
                }
            }

            match &mut self.phase {
                Phase::Old(matches) => match matches.next() {
                    Some(Ok(old)) => {
                        let path = old.path().clone();
                        if self.covered(&path) {
                            continue;
                        }
                        let new = match resolve_path(&self.new_root, &path) {
                            Ok(new) => new,
                            Err(err) => return Some(Err(err.into())),
                        };
                        self.seen.insert(path);
                        self.walk = Some(pair_leaves(Some(old), new, self.depth));
                    }
                    Some(Err(err)) => return Some(Err(err.into())),
                    None => self.phase = Phase::New(list_matching(&self.new_root, &self.pattern)),
                },
                Phase::New(matches) => match matches.next() {
                    Some(Ok(new)) => {
                        let path = new.path().clone();
                        if self.covered(&path) {
                            continue;
                        }
                        let old = match resolve_path(&self.old_root, &path) {
                            Ok(old) => old,
                            Err(err) => return Some(Err(err.into())),
                        };
                        return Some(Ok(LeafPair { path, old, new: Some(new) }));
                    }
                    Some(Err(err)) => return Some(Err(err.into())),
                    None => self.phase = Phase::Done,
                },
                Phase::Done => return None,
            }
        }
    }
}

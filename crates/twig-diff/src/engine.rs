use serde::Serialize;
use tracing::debug;
use twig_store::{NodeRef, PathPattern};

use crate::config::DiffConfig;
use crate::error::DiffResult;
use crate::leaf::{diff_leaf_with, LeafDiff};
use crate::pattern::{pairs_for_pattern, PatternPairs};
use crate::walker::{pair_leaves, LeafPair, PairLeaves};

/// How a changed leaf changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    /// Exists only on the new side.
    Added,
    /// Exists only on the old side.
    Deleted,
    /// Exists on both sides with different content.
    Modified,
}

impl ChangeStatus {
    /// One-letter code, as in `--name-status` output.
    pub fn code(&self) -> char {
        match self {
            Self::Added => 'A',
            Self::Deleted => 'D',
            Self::Modified => 'M',
        }
    }
}

/// A pair together with its diff outcome.
#[derive(Clone, Debug)]
pub struct LeafReport {
    pub pair: LeafPair,
    pub outcome: LeafDiff,
}

impl LeafReport {
    /// `None` when the leaf is unchanged.
    pub fn status(&self) -> Option<ChangeStatus> {
        let LeafDiff::Changed { old, new, .. } = &self.outcome else {
            return None;
        };
        let old_exists = old.is_some() || self.pair.old.as_ref().is_some_and(|n| n.is_dir());
        let new_exists = new.is_some() || self.pair.new.as_ref().is_some_and(|n| n.is_dir());
        Some(match (old_exists, new_exists) {
            (false, true) => ChangeStatus::Added,
            (true, false) => ChangeStatus::Deleted,
            _ => ChangeStatus::Modified,
        })
    }
}

/// Pairs leaves across two trees and diffs each pair.
///
/// Everything is lazy: nothing is listed or read until the returned
/// iterators are advanced, and dropping an iterator early skips the rest.
#[derive(Clone, Debug, Default)]
pub struct DiffEngine {
    config: DiffConfig,
}

impl DiffEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: DiffConfig) -> Self {
        Self { config }
    }

    /// The configuration this engine runs with.
    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Pair the leaves of two whole trees.
    pub fn pairs(&self, old_root: &NodeRef, new_root: &NodeRef) -> PairLeaves {
        pair_leaves(Some(old_root.clone()), Some(new_root.clone()), self.config.max_depth)
    }

    /// Pair the nodes a pattern selects under two roots.
    pub fn pairs_for_pattern(&self, pattern: &PathPattern, old_root: &NodeRef, new_root: &NodeRef) -> PatternPairs {
        pairs_for_pattern(pattern, old_root, new_root, self.config.max_depth)
    }

    /// Diff a single pair.
    pub fn diff(&self, pair: &LeafPair) -> DiffResult<LeafDiff> {
        diff_leaf_with(pair.old.as_ref(), pair.new.as_ref(), &self.config)
    }

    /// Diff every pair an iterator yields.
    pub fn diff_pairs<I>(&self, pairs: I) -> Reports<'_, I>
    where
        I: Iterator<Item = DiffResult<LeafPair>>,
    {
        Reports {
            engine: self,
            pairs,
            stopped: false,
        }
    }

    /// Diff two whole trees.
    pub fn diff_trees(&self, old_root: &NodeRef, new_root: &NodeRef) -> Reports<'_, PairLeaves> {
        self.diff_pairs(self.pairs(old_root, new_root))
    }

    /// Diff what a pattern selects under two roots.
    pub fn diff_pattern(
        &self,
        pattern: &PathPattern,
        old_root: &NodeRef,
        new_root: &NodeRef,
    ) -> Reports<'_, PatternPairs> {
        self.diff_pairs(self.pairs_for_pattern(pattern, old_root, new_root))
    }
}

/// Iterator of diff reports returned by [`DiffEngine::diff_pairs`].
///
/// Errors are yielded per pair. Unless `fail_fast` is set, the iterator
/// carries on with the next pair after an error.
pub struct Reports<'a, I> {
    engine: &'a DiffEngine,
    pairs: I,
    stopped: bool,
}

impl<I> Iterator for Reports<'_, I>
where
    I: Iterator<Item = DiffResult<LeafPair>>,
{
    type Item = DiffResult<LeafReport>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stopped {
            return None;
        }
        for item in self.pairs.by_ref() {
            let result = item.and_then(|pair| {
                let outcome = self.engine.diff(&pair)?;
                Ok(LeafReport { pair, outcome })
            });
            match result {
                Ok(report) if !report.outcome.is_changed() && !self.engine.config.report_unchanged => {
                    debug!(path = %report.pair.path, "unchanged");
                }
                Ok(report) => return Some(Ok(report)),
                Err(err) => {
                    self.stopped = self.engine.config.fail_fast;
                    return Some(Err(err));
                }
            }
        }
        None
    }
}

//! Diff engine for twig.
//!
//! Compares two trees leaf by leaf and reports which leaves differ and how.
//! Fetching a leaf may be expensive, so equality is proven as cheaply as
//! possible: precomputed fingerprints first, then raw bytes, and only then a
//! structural comparison of parsed values.
//!
//! # Key Types
//!
//! - [`DiffEngine`] / [`LeafReport`] -- lazy pair-and-diff over two roots
//! - [`pair_leaves`] / [`LeafPair`] -- depth-limited tree pairing
//! - [`pairs_for_pattern`] -- pairing driven by a glob
//! - [`diff_leaf`] / [`LeafDiff`] -- one pair's outcome
//! - [`diff_structured`] / [`StructuralChange`] -- path-aware value diff
//! - [`render_text_diff`] / [`LineDiff`] -- line diff for showing raw changes
//! - [`DiffConfig`] / [`Depth`] -- run configuration

pub mod config;
pub mod engine;
pub mod error;
mod fingerprint;
pub mod leaf;
pub mod pattern;
pub mod structural;
pub mod text_diff;
pub mod walker;

pub use config::{Depth, DiffConfig};
pub use engine::{ChangeStatus, DiffEngine, LeafReport, Reports};
pub use error::{DiffError, DiffResult};
pub use leaf::{diff_leaf, diff_leaf_with, LeafDiff};
pub use pattern::{pairs_for_pattern, PatternPairs};
pub use structural::{diff_structured, ChangeKind, Sides, StructuralChange};
pub use text_diff::{render_text_diff, DiffHunk, DiffLine, LineDiff};
pub use walker::{pair_leaves, LeafPair, PairLeaves};

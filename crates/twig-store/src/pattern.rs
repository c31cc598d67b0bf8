//! Glob patterns over logical node paths.
//!
//! Patterns use gitignore glob syntax and are always anchored at the tree
//! root: `*` stays within one segment, `**` crosses segments. Matching is
//! delegated to the `ignore` crate's override matcher.

use std::fmt;

use ignore::overrides::{Override, OverrideBuilder};
use twig_types::NodePath;

use crate::error::{StoreError, StoreResult};

const GLOB_META: &[char] = &['*', '?', '[', '{', '\\'];

/// A compiled, root-anchored glob.
#[derive(Clone)]
pub struct PathPattern {
    glob: String,
    matcher: Override,
    literal_prefix: Vec<String>,
    max_depth: Option<usize>,
}

impl PathPattern {
    /// Compile a glob such as `/roles/*.json` or `**/metadata.json`.
    ///
    /// A missing leading `/` is added. `/` alone matches only the root.
    pub fn new(glob: &str) -> StoreResult<Self> {
        let trimmed = glob.trim();
        if trimmed.is_empty() {
            return Err(StoreError::InvalidPattern {
                pattern: glob.to_string(),
                reason: "empty pattern".into(),
            });
        }
        let segments: Vec<String> = trimmed
            .split('/')
            .filter(|seg| !seg.is_empty())
            .map(str::to_string)
            .collect();
        let rooted = format!("/{}", segments.join("/"));

        let mut builder = OverrideBuilder::new("/");
        if !segments.is_empty() {
            builder
                .add(&rooted)
                .map_err(|e| StoreError::InvalidPattern {
                    pattern: glob.to_string(),
                    reason: e.to_string(),
                })?;
        }
        let matcher = builder.build().map_err(|e| StoreError::InvalidPattern {
            pattern: glob.to_string(),
            reason: e.to_string(),
        })?;

        let max_depth = if segments.iter().any(|seg| seg.contains("**")) {
            None
        } else {
            Some(segments.len())
        };
        let literal_prefix = segments
            .iter()
            .take_while(|seg| !seg.contains(GLOB_META))
            .cloned()
            .collect();

        Ok(Self {
            glob: rooted,
            matcher,
            literal_prefix,
            max_depth,
        })
    }

    /// The normalized, rooted glob text.
    pub fn as_str(&self) -> &str {
        &self.glob
    }

    /// Returns `true` if the node at `path` matches.
    pub fn matches(&self, path: &NodePath, is_dir: bool) -> bool {
        if path.is_root() || self.max_depth == Some(0) {
            return path.is_root() && self.max_depth == Some(0);
        }
        self.matcher
            .matched(path.to_string(), is_dir)
            .is_whitelist()
    }

    /// Returns `false` when no descendant of `dir` can match, so the walk
    /// below it can be skipped.
    pub fn could_match_below(&self, dir: &NodePath) -> bool {
        if let Some(max) = self.max_depth {
            if dir.depth() >= max {
                return false;
            }
        }
        dir.segments()
            .zip(&self.literal_prefix)
            .all(|(seg, literal)| seg == literal)
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathPattern({})", self.glob)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.glob)
    }
}

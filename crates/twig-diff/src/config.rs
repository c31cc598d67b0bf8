use serde::{Deserialize, Serialize};

/// How far below a pair of directories the walker may descend.
///
/// `Limited(0)` is meaningful on its own: the pair is diffed as a single
/// leaf and never opened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<usize>", into = "Option<usize>")]
pub enum Depth {
    /// No limit.
    #[default]
    Unbounded,
    /// At most this many more directory levels.
    Limited(usize),
}

impl Depth {
    /// The budget left for a child pair.
    pub fn descend(self) -> Self {
        match self {
            Self::Unbounded => Self::Unbounded,
            Self::Limited(n) => Self::Limited(n.saturating_sub(1)),
        }
    }

    /// Returns `true` if no further descent is allowed.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Limited(0))
    }
}

impl From<Option<usize>> for Depth {
    fn from(limit: Option<usize>) -> Self {
        limit.map_or(Self::Unbounded, Self::Limited)
    }
}

impl From<Depth> for Option<usize> {
    fn from(depth: Depth) -> Self {
        match depth {
            Depth::Unbounded => None,
            Depth::Limited(n) => Some(n),
        }
    }
}

/// Configuration for a diff run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Directory recursion limit.
    pub max_depth: Depth,
    /// Parse structured content and compare it value by value. When `false`
    /// any byte inequality is a change.
    pub structural: bool,
    /// Yield reports for unchanged leaves too.
    pub report_unchanged: bool,
    /// Stop after the first error instead of moving on to the next pair.
    pub fail_fast: bool,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            max_depth: Depth::Unbounded,
            structural: true,
            report_unchanged: false,
            fail_fast: false,
        }
    }
}

impl DiffConfig {
    /// Compare only the given pair, never opening directories.
    pub fn shallow() -> Self {
        Self {
            max_depth: Depth::Limited(0),
            ..Default::default()
        }
    }
}

//! Configuration types for flow combinators

use crate::value::Key;

/// How a combinator that merges several sequences assigns keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPolicy {
    /// Keep each element's key from the sequence it came from (duplicates are possible).
    #[default]
    Original,
    /// Number the output sequentially from 0.
    Sequential,
}

/// Loop configuration: element ceiling and pass ceiling, whichever fires first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopConfig {
    /// Maximum number of elements to yield; `None` = unbounded.
    pub limit: Option<usize>,
    /// Number of passes over the upstream; `None` = forever, `Some(0)` = never iterate.
    pub times: Option<usize>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            limit: None,
            times: Some(1),
        }
    }
}

impl LoopConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Negative counts loop forever.
    pub fn times(mut self, times: i64) -> Self {
        self.times = usize::try_from(times).ok();
        self
    }

    pub fn forever(mut self) -> Self {
        self.times = None;
        self
    }
}

/// When a zip stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZipMode {
    /// Keep going while any source has data; exhausted sources contribute `Null`.
    #[default]
    Any,
    /// Stop as soon as one source is exhausted.
    All,
}

/// Zip configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ZipConfig {
    pub mode: ZipMode,
    /// Record field names, positional to the sources. When absent the sources' own keys
    /// in the input collection name the fields.
    pub fields: Option<Vec<Key>>,
}

impl ZipConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: ZipMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn fields<K: Into<Key>>(mut self, fields: impl IntoIterator<Item = K>) -> Self {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

/// Unfold configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnfoldConfig {
    pub keys: KeyPolicy,
}

impl UnfoldConfig {
    pub fn sequential() -> Self {
        Self {
            keys: KeyPolicy::Sequential,
        }
    }
}

/// Order in which a depth-first walk exposes nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecursionMode {
    /// Only nodes without children.
    LeavesOnly,
    /// Each node before its children.
    #[default]
    SelfFirst,
    /// Each node after its children.
    ChildFirst,
}

/// Recursive descent configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecursionConfig {
    pub mode: RecursionMode,
    /// Nodes at this depth are treated as leaves; `None` = unbounded.
    pub max_depth: Option<usize>,
}

impl RecursionConfig {
    pub fn new(mode: RecursionMode) -> Self {
        Self {
            mode,
            max_depth: None,
        }
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

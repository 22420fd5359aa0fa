//! Pull cursors and the combinators built on them
//!
//! Every stage of a flow is a `Cursor`. Combinators take their upstream by value, so a
//! chain is a single owned value that is rewound and pulled from the outermost end.

pub mod core;
pub mod constructors;
pub mod source;
pub mod advanced;
pub mod recursive;
pub mod specialized;
pub mod utility;

// Re-export core types
pub use self::core::{BoxCursor, Cursor, CursorExt, ExpandFn, Filter, FilterMap, Flip, Map, Reindex, While};

// Re-export constructors
pub use constructors::{
    empty, from_values, once, range, Chain, Empty, EntriesCursor, GenerateStep, Generator, Range,
    RangeNum, SingleValue, EMPTY,
};

pub use source::{Source, SourceFactory};

// Re-export advanced combinators
pub use advanced::{HeadAndTail, MultiZip, Unfold};

pub use recursive::{RecursiveDescend, RecursiveUnfold};

// Re-export specialized combinators
pub use specialized::{Cache, Loop, LoopTest, NoRewind, Reduce, Shared, Slice};

pub use utility::{count, drain_entries, drain_packed, drain_pairs, drain_values, walk};

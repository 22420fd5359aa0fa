//! The fluent pipeline façade and its sorting support

pub mod builder;
pub mod sort;

pub use builder::Flow;
pub use sort::{compare_regular, natural_cmp, SortCompare, SortFlags, SortKind};

pub mod error;
pub mod value;
pub mod entries;

pub mod flow_configuration;
pub mod cursor;
pub mod flow;

// Re-export the everyday surface at the crate root
pub use cursor::{BoxCursor, Cursor, CursorExt, Generator, Source};
pub use entries::Entries;
pub use error::{FlowError, FlowResult};
pub use flow::{Flow, SortFlags, SortKind};
pub use flow_configuration::{
    KeyPolicy,
    LoopConfig,
    RecursionConfig,
    RecursionMode,
    UnfoldConfig,
    ZipConfig,
    ZipMode,
};
pub use value::{Key, Value};

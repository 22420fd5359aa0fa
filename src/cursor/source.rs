//! Normalization of every accepted input shape into a cursor.

use crate::entries::Entries;
use crate::error::{FlowError, FlowResult};
use crate::value::{Key, Value};

use super::constructors::{Empty, EntriesCursor, Generator, SingleValue};
use super::core::{BoxCursor, Cursor};

/// Deferred source construction, invoked once at normalization time.
pub type SourceFactory = Box<dyn FnOnce() -> FlowResult<Source>>;

/// Every shape a flow accepts as input, recognized once when the source is built.
pub enum Source {
    /// The empty sequence. Returned from an expansion callback it suppresses the element.
    Empty,
    /// A non-iterable value yielded once under `key`.
    Single { key: Key, value: Value },
    /// An ordered mapping (lists arrive here keyed `0..n`).
    Entries(Entries),
    /// Raw pairs; duplicate keys are kept.
    Pairs(Vec<(Key, Value)>),
    /// Anything already speaking the cursor protocol, passed through unchanged.
    Cursor(BoxCursor),
    /// A producer function.
    Generator(Generator),
    /// A cursor factory; its result is normalized in turn.
    Factory(SourceFactory),
}

impl Source {
    pub fn single(value: impl Into<Value>) -> Self {
        Source::Single {
            key: Key::Int(0),
            value: value.into(),
        }
    }

    pub fn single_keyed(value: impl Into<Value>, key: impl Into<Key>) -> Self {
        Source::Single {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn cursor(cursor: impl Cursor + 'static) -> Self {
        Source::Cursor(Box::new(cursor))
    }

    pub fn factory<F>(f: F) -> Self
    where
        F: FnOnce() -> FlowResult<Source> + 'static,
    {
        Source::Factory(Box::new(f))
    }

    /// Like `From<Value>` but rejects scalars.
    pub fn iterable(value: Value) -> FlowResult<Self> {
        if value.is_iterable() {
            Ok(Source::from(value))
        } else {
            Err(FlowError::invalid_argument(format!(
                "expected an iterable, got a value of type {}",
                value.type_name()
            )))
        }
    }

    /// Everything except `Single` is a sequence in its own right.
    pub fn is_iterable(&self) -> bool {
        !matches!(self, Source::Single { .. })
    }

    /// Normalize into a cursor. A factory is invoked right away.
    pub fn into_cursor(self) -> FlowResult<BoxCursor> {
        match self {
            Source::Factory(factory) => factory()?.into_cursor(),
            other => Ok(other.into_lazy_cursor()),
        }
    }

    /// Normalize into a cursor without running anything yet. A factory is invoked on the
    /// first pull and its errors surface there.
    pub fn into_lazy_cursor(self) -> BoxCursor {
        match self {
            Source::Empty => Box::new(Empty),
            Source::Single { key, value } => Box::new(SingleValue::new(value, key)),
            Source::Entries(entries) => Box::new(EntriesCursor::from(entries)),
            Source::Pairs(pairs) => Box::new(EntriesCursor::new(pairs)),
            Source::Cursor(cursor) => cursor,
            Source::Generator(generator) => Box::new(generator),
            Source::Factory(factory) => Box::new(Deferred {
                factory: Some(factory),
                cursor: Box::new(Empty),
            }),
        }
    }
}

/// Cursor over a factory that has not been invoked yet.
struct Deferred {
    factory: Option<SourceFactory>,
    cursor: BoxCursor,
}

impl Deferred {
    fn resolve(&mut self) -> FlowResult<&mut BoxCursor> {
        if let Some(factory) = self.factory.take() {
            self.cursor = factory()?.into_cursor()?;
            self.cursor.reset()?;
        }
        Ok(&mut self.cursor)
    }
}

impl Cursor for Deferred {
    fn valid(&mut self) -> FlowResult<bool> {
        self.resolve()?.valid()
    }

    fn current(&mut self) -> FlowResult<Value> {
        self.resolve()?.current()
    }

    fn key(&mut self) -> FlowResult<Key> {
        self.resolve()?.key()
    }

    fn advance(&mut self) -> FlowResult<()> {
        self.resolve()?.advance()
    }

    fn reset(&mut self) -> FlowResult<()> {
        if self.factory.is_some() {
            self.resolve()?;
            return Ok(());
        }
        self.cursor.reset()
    }
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Empty => f.write_str("Source::Empty"),
            Source::Single { key, value } => write!(f, "Source::Single({key} => {value})"),
            Source::Entries(entries) => write!(f, "Source::Entries(len {})", entries.len()),
            Source::Pairs(pairs) => write!(f, "Source::Pairs(len {})", pairs.len()),
            Source::Cursor(_) => f.write_str("Source::Cursor"),
            Source::Generator(_) => f.write_str("Source::Generator"),
            Source::Factory(_) => f.write_str("Source::Factory"),
        }
    }
}

impl From<Value> for Source {
    fn from(value: Value) -> Self {
        match value {
            Value::List(items) => Source::Entries(Entries::from_values(items)),
            Value::Map(entries) => Source::Entries(entries),
            scalar => Source::single(scalar),
        }
    }
}

impl From<Entries> for Source {
    fn from(entries: Entries) -> Self {
        Source::Entries(entries)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Source {
    fn from(items: Vec<T>) -> Self {
        Source::Entries(Entries::from_values(items))
    }
}

impl From<BoxCursor> for Source {
    fn from(cursor: BoxCursor) -> Self {
        Source::Cursor(cursor)
    }
}

impl From<Generator> for Source {
    fn from(generator: Generator) -> Self {
        Source::Generator(generator)
    }
}

impl From<Empty> for Source {
    fn from(_: Empty) -> Self {
        Source::Empty
    }
}

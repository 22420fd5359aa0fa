//! Advanced cursor combinators: unfold/expand, head-and-tail, multi-zip
use crate::entries::Entries;
use crate::error::{FlowError, FlowResult};
use crate::flow_configuration::{KeyPolicy, UnfoldConfig, ZipConfig, ZipMode};
use crate::value::{Key, Value};

use super::core::{BoxCursor, Cursor};
use super::source::Source;

// ================================
// Unfold
// ================================

enum Position {
    Idle,
    /// Walking the sub-cursor an element expanded into.
    Inner(BoxCursor),
    /// The element did not expand and is yielded as it is.
    Passthrough { value: Value, key: Key },
}

/// Replaces every upstream element with the source the expander returns and iterates it
/// in place. A `Source::Single` passes through under the outer key; an empty source
/// contributes nothing.
pub struct Unfold<C, F> {
    outer: C,
    f: F,
    keys: KeyPolicy,
    position: Position,
    index: i64,
}

impl<C, F> Unfold<C, F>
where
    C: Cursor,
    F: FnMut(Value, &Key) -> FlowResult<Source>,
{
    pub fn new(outer: C, f: F, config: UnfoldConfig) -> Self {
        Self {
            outer,
            f,
            keys: config.keys,
            position: Position::Idle,
            index: 0,
        }
    }

    /// Expand outer elements until one yields something.
    fn settle(&mut self) -> FlowResult<()> {
        loop {
            if !self.outer.valid()? {
                self.position = Position::Idle;
                return Ok(());
            }
            let key = self.outer.key()?;
            let value = self.outer.current()?;
            match (self.f)(value, &key)? {
                Source::Single { value, .. } => {
                    self.position = Position::Passthrough { value, key };
                    return Ok(());
                }
                source => {
                    let mut inner = source.into_cursor()?;
                    inner.reset()?;
                    if inner.valid()? {
                        self.position = Position::Inner(inner);
                        return Ok(());
                    }
                }
            }
            self.outer.advance()?;
        }
    }
}

impl<C, F> Cursor for Unfold<C, F>
where
    C: Cursor,
    F: FnMut(Value, &Key) -> FlowResult<Source>,
{
    fn valid(&mut self) -> FlowResult<bool> {
        Ok(!matches!(self.position, Position::Idle))
    }

    fn current(&mut self) -> FlowResult<Value> {
        match &mut self.position {
            Position::Inner(inner) => inner.current(),
            Position::Passthrough { value, .. } => Ok(value.clone()),
            Position::Idle => Ok(Value::Null),
        }
    }

    fn key(&mut self) -> FlowResult<Key> {
        if self.keys == KeyPolicy::Sequential {
            return Ok(Key::Int(self.index));
        }
        match &mut self.position {
            Position::Inner(inner) => inner.key(),
            Position::Passthrough { key, .. } => Ok(key.clone()),
            Position::Idle => Ok(Key::default()),
        }
    }

    fn advance(&mut self) -> FlowResult<()> {
        match &mut self.position {
            Position::Idle => return Ok(()),
            Position::Inner(inner) => {
                inner.advance()?;
                if !inner.valid()? {
                    self.outer.advance()?;
                    self.settle()?;
                }
            }
            Position::Passthrough { .. } => {
                self.outer.advance()?;
                self.settle()?;
            }
        }
        self.index += 1;
        Ok(())
    }

    fn reset(&mut self) -> FlowResult<()> {
        self.index = 0;
        self.outer.reset()?;
        self.settle()
    }
}

/// Expander used by `concat`: every element must itself be a sequence.
pub(crate) fn expand_strict(value: Value, _key: &Key) -> FlowResult<Source> {
    if value.is_iterable() {
        Ok(Source::from(value))
    } else {
        Err(FlowError::precondition(
            "concat",
            format!("element of type {} is not iterable", value.type_name()),
        ))
    }
}

// ================================
// HeadAndTail
// ================================

/// Yields a single head element, then every element of the tail.
pub struct HeadAndTail<C> {
    head: Value,
    head_key: Key,
    tail: C,
    keys: KeyPolicy,
    idx: i64,
}

impl<C: Cursor> HeadAndTail<C> {
    pub fn new(head: Value, head_key: Key, tail: C, keys: KeyPolicy) -> Self {
        Self {
            head,
            head_key,
            tail,
            keys,
            idx: 0,
        }
    }
}

impl<C: Cursor> Cursor for HeadAndTail<C> {
    fn valid(&mut self) -> FlowResult<bool> {
        if self.idx == 0 {
            Ok(true)
        } else {
            self.tail.valid()
        }
    }

    fn current(&mut self) -> FlowResult<Value> {
        if self.idx == 0 {
            Ok(self.head.clone())
        } else {
            self.tail.current()
        }
    }

    fn key(&mut self) -> FlowResult<Key> {
        match (self.idx, self.keys) {
            (_, KeyPolicy::Sequential) => Ok(Key::Int(self.idx)),
            (0, KeyPolicy::Original) => Ok(self.head_key.clone()),
            (_, KeyPolicy::Original) => self.tail.key(),
        }
    }

    fn advance(&mut self) -> FlowResult<()> {
        if self.idx > 0 {
            if !self.tail.valid()? {
                return Ok(());
            }
            self.tail.advance()?;
        }
        self.idx += 1;
        Ok(())
    }

    fn reset(&mut self) -> FlowResult<()> {
        self.idx = 0;
        self.tail.reset()
    }
}

// ================================
// MultiZip
// ================================

/// Steps several cursors in lockstep, yielding one map record per step keyed by field name.
///
/// In `ZipMode::Any` the zip runs until every source is exhausted and exhausted sources
/// contribute `Null`; in `ZipMode::All` it stops with the shortest source.
pub struct MultiZip {
    sources: Vec<(Key, BoxCursor)>,
    mode: ZipMode,
    step: i64,
    record: Option<Value>,
}

impl MultiZip {
    pub fn new(sources: Vec<(Key, BoxCursor)>, mode: ZipMode) -> Self {
        Self {
            sources,
            mode,
            step: 0,
            record: None,
        }
    }

    /// Pair every input with its field name: positional `config.fields` when given,
    /// otherwise the input's own key. Every input must be a sequence.
    pub fn from_inputs(inputs: Vec<(Key, Source)>, config: &ZipConfig) -> FlowResult<Self> {
        if let Some(fields) = &config.fields {
            if fields.len() < inputs.len() {
                return Err(FlowError::invalid_argument(format!(
                    "zip: {} field names given for {} sources",
                    fields.len(),
                    inputs.len()
                )));
            }
        }
        let mut sources = Vec::with_capacity(inputs.len());
        for (i, (key, source)) in inputs.into_iter().enumerate() {
            if !source.is_iterable() {
                return Err(FlowError::invalid_argument(format!(
                    "zip: input {} is not iterable",
                    key
                )));
            }
            let field = match &config.fields {
                Some(fields) => fields[i].clone(),
                None => key,
            };
            sources.push((field, source.into_cursor()?));
        }
        Ok(Self::new(sources, config.mode))
    }

    pub fn width(&self) -> usize {
        self.sources.len()
    }
}

impl Cursor for MultiZip {
    fn valid(&mut self) -> FlowResult<bool> {
        if self.sources.is_empty() {
            return Ok(false);
        }
        for (_, cursor) in self.sources.iter_mut() {
            let valid = cursor.valid()?;
            match self.mode {
                ZipMode::Any if valid => return Ok(true),
                ZipMode::All if !valid => return Ok(false),
                _ => {}
            }
        }
        Ok(self.mode == ZipMode::All)
    }

    fn current(&mut self) -> FlowResult<Value> {
        if let Some(record) = &self.record {
            return Ok(record.clone());
        }
        let mut record = Entries::with_capacity(self.sources.len());
        for (field, cursor) in self.sources.iter_mut() {
            let value = if cursor.valid()? {
                cursor.current()?
            } else {
                Value::Null
            };
            record.insert(field.clone(), value);
        }
        let record = Value::Map(record);
        self.record = Some(record.clone());
        Ok(record)
    }

    fn key(&mut self) -> FlowResult<Key> {
        Ok(Key::Int(self.step))
    }

    fn advance(&mut self) -> FlowResult<()> {
        for (_, cursor) in self.sources.iter_mut() {
            if cursor.valid()? {
                cursor.advance()?;
            }
        }
        self.record = None;
        self.step += 1;
        Ok(())
    }

    fn reset(&mut self) -> FlowResult<()> {
        for (_, cursor) in self.sources.iter_mut() {
            cursor.reset()?;
        }
        self.record = None;
        self.step = 0;
        Ok(())
    }
}

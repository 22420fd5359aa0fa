//! Cursor constructors: empty, single value, entries, generator functions, ranges, chains
use crate::entries::Entries;
use crate::error::{FlowError, FlowResult};
use crate::value::{Key, Value};

use super::core::{BoxCursor, Cursor};

// ================================
// Basic Constructors
// ================================

/// Stateless empty sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct Empty;

/// Shared empty cursor; zero-sized, so copying it is free.
pub const EMPTY: Empty = Empty;

pub fn empty() -> Empty {
    EMPTY
}

impl Cursor for Empty {
    fn valid(&mut self) -> FlowResult<bool> {
        Ok(false)
    }

    fn current(&mut self) -> FlowResult<Value> {
        Ok(Value::Null)
    }

    fn key(&mut self) -> FlowResult<Key> {
        Ok(Key::default())
    }

    fn advance(&mut self) -> FlowResult<()> {
        Ok(())
    }

    fn reset(&mut self) -> FlowResult<()> {
        Ok(())
    }
}

/// One value under a caller-assigned key.
#[derive(Debug, Clone)]
pub struct SingleValue {
    key: Key,
    value: Value,
    read: bool,
}

impl SingleValue {
    pub fn new(value: Value, key: Key) -> Self {
        Self {
            key,
            value,
            read: false,
        }
    }
}

pub fn once(value: impl Into<Value>) -> SingleValue {
    SingleValue::new(value.into(), Key::Int(0))
}

impl Cursor for SingleValue {
    fn valid(&mut self) -> FlowResult<bool> {
        Ok(!self.read)
    }

    fn current(&mut self) -> FlowResult<Value> {
        Ok(if self.read {
            Value::Null
        } else {
            self.value.clone()
        })
    }

    fn key(&mut self) -> FlowResult<Key> {
        Ok(self.key.clone())
    }

    fn advance(&mut self) -> FlowResult<()> {
        self.read = true;
        Ok(())
    }

    fn reset(&mut self) -> FlowResult<()> {
        self.read = false;
        Ok(())
    }
}

/// Index cursor over owned key/value pairs. Duplicate keys are kept as they are.
#[derive(Debug, Clone, Default)]
pub struct EntriesCursor {
    items: Vec<(Key, Value)>,
    pos: usize,
}

impl EntriesCursor {
    pub fn new(items: Vec<(Key, Value)>) -> Self {
        Self { items, pos: 0 }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<Entries> for EntriesCursor {
    fn from(entries: Entries) -> Self {
        EntriesCursor::new(entries.into_pairs())
    }
}

pub fn from_values<I, V>(values: I) -> EntriesCursor
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    EntriesCursor::new(
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (Key::from(i), v.into()))
            .collect(),
    )
}

impl Cursor for EntriesCursor {
    fn valid(&mut self) -> FlowResult<bool> {
        Ok(self.pos < self.items.len())
    }

    fn current(&mut self) -> FlowResult<Value> {
        Ok(self
            .items
            .get(self.pos)
            .map(|(_, v)| v.clone())
            .unwrap_or_default())
    }

    fn key(&mut self) -> FlowResult<Key> {
        Ok(self
            .items
            .get(self.pos)
            .map(|(k, _)| k.clone())
            .unwrap_or_default())
    }

    fn advance(&mut self) -> FlowResult<()> {
        if self.pos < self.items.len() {
            self.pos += 1;
        }
        Ok(())
    }

    fn reset(&mut self) -> FlowResult<()> {
        self.pos = 0;
        Ok(())
    }
}

// ================================
// Function-based Constructors
// ================================

/// A producer driven once per step. Returning `None` ends the sequence.
pub trait GenerateStep {
    /// `key` holds the auto-incremented counter and may be overwritten.
    fn generate(&mut self, key: &mut Key) -> FlowResult<Option<Value>>;

    /// Called on `reset()`. Stateless producers simply continue.
    fn rewind(&mut self) {}
}

struct FnStep<F>(F);

impl<F> GenerateStep for FnStep<F>
where
    F: FnMut(&mut Key) -> FlowResult<Option<Value>>,
{
    fn generate(&mut self, key: &mut Key) -> FlowResult<Option<Value>> {
        (self.0)(key)
    }
}

struct StatefulStep<S, F> {
    initial: S,
    state: S,
    f: F,
}

impl<S, F> GenerateStep for StatefulStep<S, F>
where
    S: Clone,
    F: FnMut(&mut S, &mut Key) -> FlowResult<Option<Value>>,
{
    fn generate(&mut self, key: &mut Key) -> FlowResult<Option<Value>> {
        (self.f)(&mut self.state, key)
    }

    fn rewind(&mut self) {
        self.state = self.initial.clone();
    }
}

/// Pull cursor over a producer function.
pub struct Generator {
    step: Box<dyn GenerateStep>,
    counter: i64,
    key: Key,
    current: Option<Value>,
    started: bool,
}

impl Generator {
    pub fn new(step: impl GenerateStep + 'static) -> Self {
        Self {
            step: Box::new(step),
            counter: 0,
            key: Key::Int(0),
            current: None,
            started: false,
        }
    }

    /// Zero-argument producer; keys count up from 0.
    pub fn from_fn<F>(mut f: F) -> Self
    where
        F: FnMut() -> Option<Value> + 'static,
    {
        Self::new(FnStep(move |_: &mut Key| Ok::<_, FlowError>(f())))
    }

    /// Producer that may rewrite the current key.
    pub fn from_fn_keyed<F>(f: F) -> Self
    where
        F: FnMut(&mut Key) -> FlowResult<Option<Value>> + 'static,
    {
        Self::new(FnStep(f))
    }

    /// Producer carrying an auxiliary state; `reset()` restores `initial`, so the
    /// sequence is rewindable.
    pub fn with_state<S, F>(initial: S, f: F) -> Self
    where
        S: Clone + 'static,
        F: FnMut(&mut S, &mut Key) -> FlowResult<Option<Value>> + 'static,
    {
        Self::new(StatefulStep {
            state: initial.clone(),
            initial,
            f,
        })
    }

    fn pull(&mut self) -> FlowResult<()> {
        self.key = Key::Int(self.counter);
        self.current = self.step.generate(&mut self.key)?;
        Ok(())
    }
}

impl Cursor for Generator {
    fn valid(&mut self) -> FlowResult<bool> {
        if !self.started {
            self.reset()?;
        }
        Ok(self.current.is_some())
    }

    fn current(&mut self) -> FlowResult<Value> {
        Ok(self.current.clone().unwrap_or_default())
    }

    fn key(&mut self) -> FlowResult<Key> {
        Ok(self.key.clone())
    }

    fn advance(&mut self) -> FlowResult<()> {
        if self.current.is_none() {
            return Ok(());
        }
        self.counter += 1;
        self.pull()
    }

    fn reset(&mut self) -> FlowResult<()> {
        self.started = true;
        self.step.rewind();
        self.counter = 0;
        self.pull()
    }
}

// ================================
// Range
// ================================

/// Numeric types a `Range` can step through.
pub trait RangeNum: Copy + PartialOrd + Into<Value> {
    fn zero() -> Self;
    /// `None` ends the range.
    fn step_by(self, step: Self) -> Option<Self>;
}

impl RangeNum for i64 {
    fn zero() -> Self {
        0
    }

    fn step_by(self, step: Self) -> Option<Self> {
        self.checked_add(step)
    }
}

impl RangeNum for f64 {
    fn zero() -> Self {
        0.0
    }

    fn step_by(self, step: Self) -> Option<Self> {
        Some(self + step)
    }
}

/// Inclusive arithmetic sequence. A negative step counts down; a zero step repeats `from`
/// forever when `from >= to` and is empty otherwise.
#[derive(Debug, Clone)]
pub struct Range<N> {
    from: N,
    to: N,
    step: N,
    current: Option<N>,
    key: i64,
}

impl<N: RangeNum> Range<N> {
    pub fn new(from: N, to: N, step: N) -> Self {
        Self {
            from,
            to,
            step,
            current: Some(from),
            key: 0,
        }
    }
}

pub fn range<N: RangeNum>(from: N, to: N, step: N) -> Range<N> {
    Range::new(from, to, step)
}

impl<N: RangeNum> Cursor for Range<N> {
    fn valid(&mut self) -> FlowResult<bool> {
        Ok(match self.current {
            Some(cur) if self.step > N::zero() => cur <= self.to,
            Some(cur) => cur >= self.to,
            None => false,
        })
    }

    fn current(&mut self) -> FlowResult<Value> {
        Ok(self.current.map(Into::into).unwrap_or_default())
    }

    fn key(&mut self) -> FlowResult<Key> {
        Ok(Key::Int(self.key))
    }

    fn advance(&mut self) -> FlowResult<()> {
        if let Some(cur) = self.current {
            self.current = cur.step_by(self.step);
            self.key += 1;
        }
        Ok(())
    }

    fn reset(&mut self) -> FlowResult<()> {
        self.current = Some(self.from);
        self.key = 0;
        Ok(())
    }
}

// ================================
// Chain
// ================================

/// Iterates several cursors one after the other, keeping their keys.
#[derive(Default)]
pub struct Chain {
    cursors: Vec<BoxCursor>,
    pos: usize,
}

impl Chain {
    pub fn new(cursors: Vec<BoxCursor>) -> Self {
        Self { cursors, pos: 0 }
    }

    pub fn push(&mut self, cursor: BoxCursor) {
        self.cursors.push(cursor);
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    /// Move past exhausted members, rewinding each newly entered one.
    fn settle(&mut self) -> FlowResult<()> {
        while self.pos < self.cursors.len() && !self.cursors[self.pos].valid()? {
            self.pos += 1;
            if let Some(next) = self.cursors.get_mut(self.pos) {
                next.reset()?;
            }
        }
        Ok(())
    }
}

impl Cursor for Chain {
    fn valid(&mut self) -> FlowResult<bool> {
        match self.cursors.get_mut(self.pos) {
            Some(cursor) => cursor.valid(),
            None => Ok(false),
        }
    }

    fn current(&mut self) -> FlowResult<Value> {
        match self.cursors.get_mut(self.pos) {
            Some(cursor) => cursor.current(),
            None => Ok(Value::Null),
        }
    }

    fn key(&mut self) -> FlowResult<Key> {
        match self.cursors.get_mut(self.pos) {
            Some(cursor) => cursor.key(),
            None => Ok(Key::default()),
        }
    }

    fn advance(&mut self) -> FlowResult<()> {
        if let Some(cursor) = self.cursors.get_mut(self.pos) {
            cursor.advance()?;
            self.settle()?;
        }
        Ok(())
    }

    fn reset(&mut self) -> FlowResult<()> {
        self.pos = 0;
        if let Some(first) = self.cursors.first_mut() {
            first.reset()?;
        }
        self.settle()
    }
}

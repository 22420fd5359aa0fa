//! Core cursor protocol, the combinator extension trait and the per-element transforms
//! (map, filter, filter-map, reindex, flip, while).

use crate::error::FlowResult;
use crate::flow_configuration::{KeyPolicy, LoopConfig, UnfoldConfig};
use crate::value::{Key, Value};

use super::advanced::{HeadAndTail, Unfold};
use super::source::Source;
use super::specialized::{Cache, Loop, NoRewind, Reduce, Slice};

/// Pull-iteration protocol every element source implements.
///
/// `current()` and `key()` are only meaningful while `valid()` is true and after at least
/// one `reset()`. On an exhausted cursor they return `Value::Null` / an unspecified key and
/// `advance()` is a no-op; none of the methods panic.
pub trait Cursor {
    fn valid(&mut self) -> FlowResult<bool>;
    fn current(&mut self) -> FlowResult<Value>;
    fn key(&mut self) -> FlowResult<Key>;
    fn advance(&mut self) -> FlowResult<()>;
    /// Rewind to the first element.
    fn reset(&mut self) -> FlowResult<()>;
}

/// Heap-allocated cursor, the unit of composition inside a `Flow`.
pub type BoxCursor = Box<dyn Cursor>;

impl<C: Cursor + ?Sized> Cursor for Box<C> {
    fn valid(&mut self) -> FlowResult<bool> {
        (**self).valid()
    }

    fn current(&mut self) -> FlowResult<Value> {
        (**self).current()
    }

    fn key(&mut self) -> FlowResult<Key> {
        (**self).key()
    }

    fn advance(&mut self) -> FlowResult<()> {
        (**self).advance()
    }

    fn reset(&mut self) -> FlowResult<()> {
        (**self).reset()
    }
}

impl<C: Cursor + ?Sized> Cursor for &mut C {
    fn valid(&mut self) -> FlowResult<bool> {
        (**self).valid()
    }

    fn current(&mut self) -> FlowResult<Value> {
        (**self).current()
    }

    fn key(&mut self) -> FlowResult<Key> {
        (**self).key()
    }

    fn advance(&mut self) -> FlowResult<()> {
        (**self).advance()
    }

    fn reset(&mut self) -> FlowResult<()> {
        (**self).reset()
    }
}

/// Extension trait providing cursor combinators. Each takes ownership of `self`.
pub trait CursorExt: Cursor + Sized {
    fn boxed(self) -> BoxCursor
    where
        Self: 'static,
    {
        Box::new(self)
    }

    /// `f` returns the new value and, optionally, a replacement key.
    fn map<F>(self, f: F) -> Map<Self, F>
    where
        F: FnMut(Value, &Key) -> FlowResult<(Value, Option<Key>)>,
    {
        Map {
            cursor: self,
            f,
            current: None,
        }
    }

    fn filter<F>(self, f: F) -> Filter<Self, F>
    where
        F: FnMut(&Value, &Key) -> FlowResult<bool>,
    {
        Filter {
            cursor: self,
            f,
            accepted: false,
        }
    }

    /// `None` from `f` drops the element.
    fn filter_map<F>(self, f: F) -> FilterMap<Self, F>
    where
        F: FnMut(Value, &Key) -> FlowResult<Option<(Value, Option<Key>)>>,
    {
        FilterMap {
            cursor: self,
            f,
            current: None,
        }
    }

    fn reindex(self, start: i64, step: i64) -> Reindex<Self> {
        Reindex {
            cursor: self,
            start,
            step,
            index: start,
        }
    }

    fn flip(self, flip_values: bool, flip_keys: bool) -> Flip<Self> {
        Flip {
            cursor: self,
            flip_values,
            flip_keys,
        }
    }

    fn take_while<F>(self, f: F) -> While<Self, F>
    where
        F: FnMut(&Value, &Key) -> FlowResult<bool>,
    {
        While {
            cursor: self,
            f,
            checked: None,
            stopped: false,
        }
    }

    fn cache(self) -> Cache<Self> {
        Cache::new(self)
    }

    fn looped(self, config: LoopConfig) -> Loop<Self> {
        Loop::new(self, config)
    }

    fn reduce<F>(self, f: F, seed: Value) -> Reduce<Self, F>
    where
        F: FnMut(Value, Value, &Key) -> FlowResult<Value>,
    {
        Reduce::new(self, f, seed)
    }

    fn slice(self, offset: usize, count: Option<usize>) -> Slice<Self> {
        Slice::new(self, offset, count)
    }

    fn no_rewind(self) -> NoRewind<Self> {
        NoRewind::new(self)
    }

    /// Flatten iterable elements (lists, maps) in place.
    fn unfold(self, config: UnfoldConfig) -> Unfold<Self, ExpandFn> {
        Unfold::new(self, expand_value as ExpandFn, config)
    }

    /// Replace each element by the source `f` returns and flatten the result.
    fn expand<F>(self, f: F, config: UnfoldConfig) -> Unfold<Self, F>
    where
        F: FnMut(Value, &Key) -> FlowResult<Source>,
    {
        Unfold::new(self, f, config)
    }

    /// Yield `head` under `head_key` before the elements of `self`.
    fn prepended(self, head: Value, head_key: Key, keys: KeyPolicy) -> HeadAndTail<Self> {
        HeadAndTail::new(head, head_key, self, keys)
    }
}

impl<C: Cursor + Sized> CursorExt for C {}

/// Expansion used by plain unfolding: iterable values expand, scalars pass through.
pub type ExpandFn = fn(Value, &Key) -> FlowResult<Source>;

fn expand_value(value: Value, _key: &Key) -> FlowResult<Source> {
    Ok(Source::from(value))
}

// ================================
// Map
// ================================

pub struct Map<C, F> {
    cursor: C,
    f: F,
    current: Option<(Value, Key)>,
}

impl<C, F> Map<C, F>
where
    C: Cursor,
    F: FnMut(Value, &Key) -> FlowResult<(Value, Option<Key>)>,
{
    /// Computes the mapped pair once per position.
    fn fill(&mut self) -> FlowResult<bool> {
        if self.current.is_some() {
            return Ok(true);
        }
        if !self.cursor.valid()? {
            return Ok(false);
        }
        let key = self.cursor.key()?;
        let value = self.cursor.current()?;
        let (value, new_key) = (self.f)(value, &key)?;
        self.current = Some((value, new_key.unwrap_or(key)));
        Ok(true)
    }
}

impl<C, F> Cursor for Map<C, F>
where
    C: Cursor,
    F: FnMut(Value, &Key) -> FlowResult<(Value, Option<Key>)>,
{
    fn valid(&mut self) -> FlowResult<bool> {
        self.fill()
    }

    fn current(&mut self) -> FlowResult<Value> {
        self.fill()?;
        Ok(self.current.as_ref().map(|(v, _)| v.clone()).unwrap_or_default())
    }

    fn key(&mut self) -> FlowResult<Key> {
        self.fill()?;
        Ok(self.current.as_ref().map(|(_, k)| k.clone()).unwrap_or_default())
    }

    fn advance(&mut self) -> FlowResult<()> {
        self.current = None;
        self.cursor.advance()
    }

    fn reset(&mut self) -> FlowResult<()> {
        self.current = None;
        self.cursor.reset()
    }
}

// ================================
// Filter
// ================================

pub struct Filter<C, F> {
    cursor: C,
    f: F,
    accepted: bool,
}

impl<C, F> Cursor for Filter<C, F>
where
    C: Cursor,
    F: FnMut(&Value, &Key) -> FlowResult<bool>,
{
    fn valid(&mut self) -> FlowResult<bool> {
        if self.accepted {
            return Ok(true);
        }
        while self.cursor.valid()? {
            let value = self.cursor.current()?;
            let key = self.cursor.key()?;
            if (self.f)(&value, &key)? {
                self.accepted = true;
                return Ok(true);
            }
            self.cursor.advance()?;
        }
        Ok(false)
    }

    fn current(&mut self) -> FlowResult<Value> {
        if self.valid()? {
            self.cursor.current()
        } else {
            Ok(Value::Null)
        }
    }

    fn key(&mut self) -> FlowResult<Key> {
        if self.valid()? {
            self.cursor.key()
        } else {
            Ok(Key::default())
        }
    }

    fn advance(&mut self) -> FlowResult<()> {
        self.accepted = false;
        self.cursor.advance()
    }

    fn reset(&mut self) -> FlowResult<()> {
        self.accepted = false;
        self.cursor.reset()
    }
}

// ================================
// FilterMap
// ================================

pub struct FilterMap<C, F> {
    cursor: C,
    f: F,
    current: Option<(Value, Key)>,
}

impl<C, F> Cursor for FilterMap<C, F>
where
    C: Cursor,
    F: FnMut(Value, &Key) -> FlowResult<Option<(Value, Option<Key>)>>,
{
    fn valid(&mut self) -> FlowResult<bool> {
        if self.current.is_some() {
            return Ok(true);
        }
        while self.cursor.valid()? {
            let key = self.cursor.key()?;
            let value = self.cursor.current()?;
            if let Some((value, new_key)) = (self.f)(value, &key)? {
                self.current = Some((value, new_key.unwrap_or(key)));
                return Ok(true);
            }
            self.cursor.advance()?;
        }
        Ok(false)
    }

    fn current(&mut self) -> FlowResult<Value> {
        self.valid()?;
        Ok(self.current.as_ref().map(|(v, _)| v.clone()).unwrap_or_default())
    }

    fn key(&mut self) -> FlowResult<Key> {
        self.valid()?;
        Ok(self.current.as_ref().map(|(_, k)| k.clone()).unwrap_or_default())
    }

    fn advance(&mut self) -> FlowResult<()> {
        self.current = None;
        self.cursor.advance()
    }

    fn reset(&mut self) -> FlowResult<()> {
        self.current = None;
        self.cursor.reset()
    }
}

// ================================
// Reindex
// ================================

pub struct Reindex<C> {
    cursor: C,
    start: i64,
    step: i64,
    index: i64,
}

impl<C: Cursor> Cursor for Reindex<C> {
    fn valid(&mut self) -> FlowResult<bool> {
        self.cursor.valid()
    }

    fn current(&mut self) -> FlowResult<Value> {
        self.cursor.current()
    }

    fn key(&mut self) -> FlowResult<Key> {
        Ok(Key::Int(self.index))
    }

    fn advance(&mut self) -> FlowResult<()> {
        self.cursor.advance()?;
        self.index = self.index.wrapping_add(self.step);
        Ok(())
    }

    fn reset(&mut self) -> FlowResult<()> {
        self.cursor.reset()?;
        self.index = self.start;
        Ok(())
    }
}

// ================================
// Flip
// ================================

pub struct Flip<C> {
    cursor: C,
    flip_values: bool,
    flip_keys: bool,
}

impl<C: Cursor> Cursor for Flip<C> {
    fn valid(&mut self) -> FlowResult<bool> {
        self.cursor.valid()
    }

    fn current(&mut self) -> FlowResult<Value> {
        if self.flip_values {
            Ok(Value::from(self.cursor.key()?))
        } else {
            self.cursor.current()
        }
    }

    fn key(&mut self) -> FlowResult<Key> {
        if self.flip_keys {
            let value = self.cursor.current()?;
            Key::from_value(&value, "flip")
        } else {
            self.cursor.key()
        }
    }

    fn advance(&mut self) -> FlowResult<()> {
        self.cursor.advance()
    }

    fn reset(&mut self) -> FlowResult<()> {
        self.cursor.reset()
    }
}

// ================================
// While
// ================================

/// Iterates until the upstream ends or the predicate rejects an element. The predicate is
/// consulted once per position, and not at all after a rejection until `reset()`.
pub struct While<C, F> {
    cursor: C,
    f: F,
    checked: Option<bool>,
    stopped: bool,
}

impl<C, F> Cursor for While<C, F>
where
    C: Cursor,
    F: FnMut(&Value, &Key) -> FlowResult<bool>,
{
    fn valid(&mut self) -> FlowResult<bool> {
        if self.stopped {
            return Ok(false);
        }
        if let Some(ok) = self.checked {
            return Ok(ok);
        }
        if !self.cursor.valid()? {
            return Ok(false);
        }
        let value = self.cursor.current()?;
        let key = self.cursor.key()?;
        let ok = (self.f)(&value, &key)?;
        self.checked = Some(ok);
        self.stopped = !ok;
        Ok(ok)
    }

    fn current(&mut self) -> FlowResult<Value> {
        if self.valid()? {
            self.cursor.current()
        } else {
            Ok(Value::Null)
        }
    }

    fn key(&mut self) -> FlowResult<Key> {
        if self.valid()? {
            self.cursor.key()
        } else {
            Ok(Key::default())
        }
    }

    fn advance(&mut self) -> FlowResult<()> {
        if self.stopped {
            return Ok(());
        }
        self.checked = None;
        self.cursor.advance()
    }

    fn reset(&mut self) -> FlowResult<()> {
        self.checked = None;
        self.stopped = false;
        self.cursor.reset()
    }
}

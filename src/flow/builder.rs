//! The `Flow` façade: a fluent builder over a live cursor or materialized entries
use std::cmp::Ordering;

use crate::cursor::advanced::{expand_strict, HeadAndTail, MultiZip};
use crate::cursor::constructors::{Chain, Empty, EntriesCursor, Generator, Range};
use crate::cursor::core::{BoxCursor, Cursor, CursorExt};
use crate::cursor::recursive::{RecursiveDescend, RecursiveUnfold};
use crate::cursor::source::Source;
use crate::cursor::specialized::{Loop, Shared};
use crate::cursor::utility::{count, drain_entries, drain_packed, walk};
use crate::entries::Entries;
use crate::error::{FlowError, FlowResult};
use crate::flow_configuration::{KeyPolicy, LoopConfig, RecursionConfig, UnfoldConfig, ZipConfig};
use crate::value::{Key, Value};

use super::sort::{sort_entries, sort_entries_by, SortFlags, SortKind};

/// A lazy pipeline over `(Key, Value)` pairs.
///
/// Chain operations take the flow by value and wrap its cursor in a new stage; nothing runs
/// until a terminal operation pulls. Materializing operations (`pack`, `sort`, `reverse`,
/// ...) drain the pipeline into entries, which later stages iterate again.
///
/// ```
/// use pullflow::{Flow, Value};
///
/// let doubled = Flow::from(vec![1, 2, 3])
///     .map(|v, _| Value::from(v.as_i64().unwrap_or(0) * 2))
///     .to_vec()?;
/// assert_eq!(doubled, vec![Value::Int(2), Value::Int(4), Value::Int(6)]);
/// # Ok::<(), pullflow::FlowError>(())
/// ```
pub struct Flow {
    cursor: BoxCursor,
    /// Materialized data; takes precedence over `cursor` until the next stage is added.
    data: Option<Entries>,
    fetching: bool,
}

// ================================
// Sources
// ================================

impl Flow {
    pub fn new(cursor: BoxCursor) -> Self {
        Self {
            cursor,
            data: None,
            fetching: false,
        }
    }

    /// Flow over any accepted source shape. Scalars yield once under key 0.
    #[allow(clippy::should_implement_trait)]
    pub fn from(source: impl Into<Source>) -> Self {
        Self::new(source.into().into_lazy_cursor())
    }

    /// Flow over a producer function; `None` ends it.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnMut() -> Option<Value> + 'static,
    {
        Self::new(Box::new(Generator::from_fn(f)))
    }

    /// Flow over a JSON document: arrays and objects yield their members, scalars yield once.
    pub fn from_json(json: &str) -> FlowResult<Self> {
        let parsed: serde_json::Value = serde_json::from_str(json)?;
        Ok(Self::from(Value::from(parsed)))
    }

    /// Inclusive integer range.
    pub fn range(from: i64, to: i64, step: i64) -> Self {
        Self::new(Box::new(Range::new(from, to, step)))
    }

    /// Inclusive floating point range.
    pub fn range_f64(from: f64, to: f64, step: f64) -> Self {
        Self::new(Box::new(Range::new(from, to, step)))
    }

    /// Zip several sequences into one map record per step. Fields are named positionally
    /// by `config.fields`, or `0..n` without it.
    pub fn combine<S, I>(inputs: I, config: ZipConfig) -> FlowResult<Self>
    where
        S: Into<Source>,
        I: IntoIterator<Item = S>,
    {
        Self::combine_keyed(
            inputs
                .into_iter()
                .enumerate()
                .map(|(i, source)| (Key::from(i), source)),
            config,
        )
    }

    /// Like `combine`, with each input's key naming its field unless `config.fields` is set.
    pub fn combine_keyed<K, S, I>(inputs: I, config: ZipConfig) -> FlowResult<Self>
    where
        K: Into<Key>,
        S: Into<Source>,
        I: IntoIterator<Item = (K, S)>,
    {
        let inputs = inputs
            .into_iter()
            .map(|(key, source)| (key.into(), source.into()))
            .collect();
        let zip = MultiZip::from_inputs(inputs, &config)?;
        Ok(Self::new(Box::new(zip)))
    }

    /// Concatenation of several sequences, keys kept.
    pub fn sequence<S, I>(list: I) -> FlowResult<Self>
    where
        S: Into<Source>,
        I: IntoIterator<Item = S>,
    {
        Ok(Self::new(Box::new(Chain::new(iterable_cursors(list)?))))
    }

    /// The empty flow.
    pub fn void() -> Self {
        Self::new(Box::new(Empty))
    }
}

fn iterable_cursors<S, I>(list: I) -> FlowResult<Vec<BoxCursor>>
where
    S: Into<Source>,
    I: IntoIterator<Item = S>,
{
    list.into_iter()
        .map(|item| {
            let source = item.into();
            if source.is_iterable() {
                Ok(source.into_lazy_cursor())
            } else {
                Err(FlowError::invalid_argument(format!(
                    "expected a sequence, got {:?}",
                    source
                )))
            }
        })
        .collect()
}

// ================================
// Chain operations
// ================================

impl Flow {
    /// The active cursor, built over the materialized data if there is any.
    fn cursor_mut(&mut self) -> &mut BoxCursor {
        if let Some(data) = self.data.take() {
            self.cursor = Box::new(EntriesCursor::from(data));
        }
        &mut self.cursor
    }

    fn into_cursor(mut self) -> BoxCursor {
        self.cursor_mut();
        self.cursor
    }

    /// Wrap the active cursor in a new stage.
    fn then<C, F>(self, stage: F) -> Self
    where
        C: Cursor + 'static,
        F: FnOnce(BoxCursor) -> C,
    {
        Self::new(Box::new(stage(self.into_cursor())))
    }

    /// Generic hook for stages defined outside this crate.
    pub fn apply<F>(self, f: F) -> Self
    where
        F: FnOnce(BoxCursor) -> BoxCursor,
    {
        Self::new(f(self.into_cursor()))
    }

    pub fn map<F>(self, mut f: F) -> Self
    where
        F: FnMut(Value, &Key) -> Value + 'static,
    {
        self.then(|c| c.map(move |v, k| Ok((f(v, k), None))))
    }

    /// `f` may also return a replacement key.
    pub fn map_with_key<F>(self, mut f: F) -> Self
    where
        F: FnMut(Value, &Key) -> (Value, Option<Key>) + 'static,
    {
        self.then(|c| c.map(move |v, k| Ok(f(v, k))))
    }

    /// `f` also receives a mutable context carried across calls.
    pub fn map_with_context<T, F>(self, mut context: T, mut f: F) -> Self
    where
        T: 'static,
        F: FnMut(Value, &Key, &mut T) -> (Value, Option<Key>) + 'static,
    {
        self.then(|c| c.map(move |v, k| Ok(f(v, k, &mut context))))
    }

    pub fn try_map<F>(self, mut f: F) -> Self
    where
        F: FnMut(Value, &Key) -> FlowResult<Value> + 'static,
    {
        self.then(|c| c.map(move |v, k| Ok((f(v, k)?, None))))
    }

    /// Map and drop in one step: `None` drops the element.
    pub fn map_and_filter<F>(self, mut f: F) -> Self
    where
        F: FnMut(Value, &Key) -> Option<Value> + 'static,
    {
        self.then(|c| c.filter_map(move |v, k| Ok(f(v, k).map(|v| (v, None)))))
    }

    pub fn where_<F>(self, mut f: F) -> Self
    where
        F: FnMut(&Value, &Key) -> bool + 'static,
    {
        self.then(|c| c.filter(move |v, k| Ok(f(v, k))))
    }

    pub fn try_where<F>(self, f: F) -> Self
    where
        F: FnMut(&Value, &Key) -> FlowResult<bool> + 'static,
    {
        self.then(|c| c.filter(f))
    }

    /// Stop at the first element `f` rejects.
    pub fn while_<F>(self, mut f: F) -> Self
    where
        F: FnMut(&Value, &Key) -> bool + 'static,
    {
        self.then(|c| c.take_while(move |v, k| Ok(f(v, k))))
    }

    pub fn reindex(self, start: i64, step: i64) -> Self {
        self.then(|c| c.reindex(start, step))
    }

    /// Swap keys and values.
    pub fn flip(self) -> Self {
        self.then(|c| c.flip(true, true))
    }

    /// The keys, as values under a fresh index.
    pub fn keys(self) -> Self {
        self.then(|c| c.flip(true, false).reindex(0, 1))
    }

    pub fn cache(self) -> Self {
        self.then(|c| c.cache())
    }

    /// Expand iterable elements in place, keeping the keys of their members.
    pub fn unfold(self) -> Self {
        self.unfold_with(UnfoldConfig::default())
    }

    pub fn unfold_with(self, config: UnfoldConfig) -> Self {
        self.then(|c| c.unfold(config))
    }

    /// Replace each element by the source `f` returns and expand it in place. With
    /// `keep_originals` the element itself comes first.
    pub fn expand<F>(self, mut f: F, keep_originals: bool) -> Self
    where
        F: FnMut(Value, &Key) -> Source + 'static,
    {
        if keep_originals {
            return self.intercalate(f);
        }
        self.then(|c| c.expand(move |v, k| Ok(f(v, k)), UnfoldConfig::default()))
    }

    /// Yield each element followed by the sequence `f` returns for it. A non-sequence
    /// result replaces the element instead.
    pub fn intercalate<F>(self, mut f: F) -> Self
    where
        F: FnMut(Value, &Key) -> Source + 'static,
    {
        self.then(|c| {
            c.expand(
                move |v, k| {
                    let source = f(v.clone(), k);
                    if !source.is_iterable() {
                        return Ok(source);
                    }
                    let tail = source.into_cursor()?;
                    Ok(Source::cursor(HeadAndTail::new(v, k.clone(), tail, KeyPolicy::Original)))
                },
                UnfoldConfig::default(),
            )
        })
    }

    /// Depth-first walk. `f(value, key, depth)` returns a node's children, or `None`.
    pub fn recursive<F>(self, f: F, config: RecursionConfig) -> Self
    where
        F: FnMut(Value, &Key, usize) -> Option<Source> + 'static,
    {
        let mut f = f;
        self.then(|c| {
            RecursiveDescend::new(
                c,
                move |v: Value, k: &Key, d: usize| Ok::<_, FlowError>(f(v, k, d)),
                config,
            )
        })
    }

    /// Recursively replace nodes by the source `f(value, key, depth)` returns.
    pub fn recursive_unfold<F>(self, mut f: F, keep_originals: bool) -> Self
    where
        F: FnMut(Value, &Key, usize) -> Source + 'static,
    {
        self.then(|c| {
            RecursiveUnfold::new(
                c,
                move |v: Value, k: &Key, d: usize| Ok::<_, FlowError>(f(v, k, d)),
                keep_originals,
            )
        })
    }

    /// Fold every element into one value, yielded under key 0.
    pub fn reduce<F>(self, mut f: F, seed: impl Into<Value>) -> Self
    where
        F: FnMut(Value, Value, &Key) -> Value + 'static,
    {
        let seed = seed.into();
        self.then(|c| c.reduce(move |acc, v, k| Ok(f(acc, v, k)), seed))
    }

    /// Iterate `times` passes; negative repeats forever.
    pub fn repeat(self, times: i64) -> Self {
        self.loop_with(LoopConfig::new().times(times))
    }

    /// Start another pass each time the flow ends and `f` agrees. `f` is called after the
    /// end was reached, so it gets `Value::Null` and no key.
    pub fn repeat_while<F>(self, mut f: F) -> Self
    where
        F: FnMut(&Value, Option<&Key>) -> bool + 'static,
    {
        self.then(|c| Loop::new(c, LoopConfig::default()).with_test(move |v, k| Ok(f(v, k))))
    }

    pub fn loop_with(self, config: LoopConfig) -> Self {
        self.then(|c| c.looped(config))
    }

    /// At most `n` elements.
    pub fn only(self, n: usize) -> Self {
        self.loop_with(LoopConfig::new().limit(n))
    }

    pub fn slice(self, offset: usize, count: Option<usize>) -> Self {
        self.then(|c| c.slice(offset, count))
    }

    pub fn skip(self, n: usize) -> Self {
        self.slice(n, None)
    }

    pub fn prepend_value(self, value: impl Into<Value>, key: impl Into<Key>) -> Self {
        let value = value.into();
        let key = key.into();
        self.then(|c| c.prepended(value, key, KeyPolicy::Original))
    }

    /// Follow this flow with each of the given sequences.
    pub fn append<S, I>(self, list: I) -> FlowResult<Self>
    where
        S: Into<Source>,
        I: IntoIterator<Item = S>,
    {
        let mut cursors = vec![self.into_cursor()];
        cursors.extend(iterable_cursors(list)?);
        Ok(Self::new(Box::new(Chain::new(cursors))))
    }

    /// Precede this flow with each of the given sequences.
    pub fn prepend<S, I>(self, list: I) -> FlowResult<Self>
    where
        S: Into<Source>,
        I: IntoIterator<Item = S>,
    {
        let mut cursors = iterable_cursors(list)?;
        cursors.push(self.into_cursor());
        Ok(Self::new(Box::new(Chain::new(cursors))))
    }

    /// Concatenate the elements, each of which must be a sequence.
    pub fn concat(self) -> Self {
        self.then(|c| c.expand(expand_strict, UnfoldConfig::default()))
    }

    pub fn no_rewind(self) -> Self {
        self.then(|c| c.no_rewind())
    }

    /// A cloneable handle; every clone pulls from the same position.
    pub fn shared(self) -> Shared {
        Shared::new(self.into_cursor())
    }
}

// ================================
// Materializing operations
// ================================

impl Flow {
    fn materialized(data: Entries) -> Self {
        Self {
            cursor: Box::new(Empty),
            data: Some(data),
            fetching: false,
        }
    }

    /// Materialize with fresh keys `0..n`.
    pub fn pack(mut self) -> FlowResult<Self> {
        let data = match self.data.take() {
            Some(data) => data.packed(),
            None => drain_packed(&mut self.cursor)?,
        };
        Ok(Self::materialized(data))
    }

    /// Reverse the order. Integer keys are renumbered from 0 unless `preserve_keys` is set;
    /// string keys are always kept.
    pub fn reverse(mut self, preserve_keys: bool) -> FlowResult<Self> {
        let data = self.take_all()?;
        let mut reversed = Entries::with_capacity(data.len());
        for (key, value) in data.into_pairs().into_iter().rev() {
            match key {
                Key::Int(_) if !preserve_keys => reversed.push(value),
                key => {
                    reversed.insert(key, value);
                }
            }
        }
        Ok(Self::materialized(reversed))
    }

    /// Drop the last `n` elements.
    pub fn drop_last(self, n: usize) -> FlowResult<Self> {
        let mut packed = self.pack()?;
        let mut data = packed.data.take().unwrap_or_default();
        data.truncate(data.len().saturating_sub(n));
        Ok(Self::materialized(data))
    }

    /// Replace the packed data with whatever `f` makes of it.
    pub fn swap<F>(self, f: F) -> FlowResult<Self>
    where
        F: FnOnce(Entries) -> Entries,
    {
        let mut packed = self.pack()?;
        let data = packed.data.take().unwrap_or_default();
        Ok(Self::materialized(f(data)))
    }

    /// Sort with a built-in comparator. Parse kind names with `str::parse::<SortKind>()`.
    pub fn sort(mut self, kind: SortKind, flags: SortFlags) -> FlowResult<Self> {
        if kind.is_custom() {
            return Err(FlowError::invalid_argument(format!(
                "sort type {} needs a comparator, use sort_by",
                kind
            )));
        }
        let data = self.take_all()?;
        Ok(Self::materialized(sort_entries(data, kind, flags)?))
    }

    /// Sort with a caller comparator; `kind` must be `Usort`, `Uasort` or `Uksort`.
    pub fn sort_by<F>(mut self, kind: SortKind, compare: F) -> FlowResult<Self>
    where
        F: FnMut(&Value, &Value) -> Ordering,
    {
        if !kind.is_custom() {
            return Err(FlowError::invalid_argument(format!(
                "sort type {} does not take a comparator",
                kind
            )));
        }
        let data = self.take_all()?;
        Ok(Self::materialized(sort_entries_by(data, kind, compare)?))
    }

    fn take_all(&mut self) -> FlowResult<Entries> {
        match self.data.take() {
            Some(data) => Ok(data),
            None => drain_entries(&mut self.cursor),
        }
    }
}

// ================================
// Terminal operations
// ================================

impl Flow {
    /// Materialize, keeping keys, and return the data. Later calls reuse it.
    pub fn all(&mut self) -> FlowResult<&Entries> {
        let data = self.take_all()?;
        Ok(self.data.insert(data))
    }

    pub fn collect(mut self) -> FlowResult<Entries> {
        self.take_all()
    }

    /// Every value in order, duplicate keys included.
    pub fn to_vec(mut self) -> FlowResult<Vec<Value>> {
        match self.data.take() {
            Some(data) => Ok(data.into_values()),
            None => crate::cursor::utility::drain_values(&mut self.cursor),
        }
    }

    /// Every pair in order, duplicate keys included.
    pub fn to_pairs(mut self) -> FlowResult<Vec<(Key, Value)>> {
        crate::cursor::utility::drain_pairs(self.cursor_mut())
    }

    fn step(&mut self) -> FlowResult<Option<(Key, Value)>> {
        let first = !self.fetching;
        self.fetching = true;
        let cursor = self.cursor_mut();
        if first {
            cursor.reset()?;
        }
        if !cursor.valid()? {
            return Ok(None);
        }
        let key = cursor.key()?;
        let value = cursor.current()?;
        cursor.advance()?;
        Ok(Some((key, value)))
    }

    /// The next value, or `None` once the flow is exhausted. The first call rewinds.
    pub fn fetch(&mut self) -> FlowResult<Option<Value>> {
        Ok(self.step()?.map(|(_, value)| value))
    }

    /// The next key, or `None` once the flow is exhausted. Shares its position with `fetch`.
    pub fn fetch_key(&mut self) -> FlowResult<Option<Key>> {
        Ok(self.step()?.map(|(key, _)| key))
    }

    /// Visit every element; `f` returns `false` to stop early.
    pub fn each<F>(&mut self, mut f: F) -> FlowResult<()>
    where
        F: FnMut(&Value, &Key) -> bool,
    {
        walk(self.cursor_mut(), |key, value| Ok(f(&value, &key)))
    }

    pub fn count(&mut self) -> FlowResult<usize> {
        match &self.data {
            Some(data) => Ok(data.len()),
            None => count(&mut self.cursor),
        }
    }
}

impl Default for Flow {
    fn default() -> Self {
        Self::void()
    }
}

impl std::fmt::Debug for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flow")
            .field("materialized", &self.data.as_ref().map(Entries::len))
            .field("fetching", &self.fetching)
            .finish()
    }
}

impl Cursor for Flow {
    fn valid(&mut self) -> FlowResult<bool> {
        self.cursor_mut().valid()
    }

    fn current(&mut self) -> FlowResult<Value> {
        self.cursor_mut().current()
    }

    fn key(&mut self) -> FlowResult<Key> {
        self.cursor_mut().key()
    }

    fn advance(&mut self) -> FlowResult<()> {
        self.cursor_mut().advance()
    }

    fn reset(&mut self) -> FlowResult<()> {
        self.cursor_mut().reset()
    }
}

impl From<Flow> for Source {
    fn from(flow: Flow) -> Self {
        Source::Cursor(Box::new(flow))
    }
}

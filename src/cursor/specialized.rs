//! Specialized cursor combinators: cache, loop, reduce, slice, no-rewind, shared handles
use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{FlowError, FlowResult};
use crate::flow_configuration::LoopConfig;
use crate::value::{Key, Value};

use super::constructors::EntriesCursor;
use super::core::{BoxCursor, Cursor};

// ================================
// Cache
// ================================

enum CacheState {
    /// Not reset yet; pulls go straight to the upstream.
    Fresh,
    Recording {
        pairs: Vec<(Key, Value)>,
        /// Whether the pair at the upstream position has been recorded.
        recorded: bool,
        complete: bool,
    },
    Replaying(EntriesCursor),
}

/// Records the first full pass over its upstream and replays it on every later pass, so
/// upstream side effects happen once. A pass abandoned halfway is discarded on `reset()`.
pub struct Cache<C> {
    cursor: C,
    state: CacheState,
}

impl<C: Cursor> Cache<C> {
    pub fn new(cursor: C) -> Self {
        Self {
            cursor,
            state: CacheState::Fresh,
        }
    }

    pub fn is_replaying(&self) -> bool {
        matches!(self.state, CacheState::Replaying(_))
    }

    fn is_recording(&self) -> bool {
        matches!(self.state, CacheState::Recording { .. })
    }

    /// Record the upstream pair at the current position, once.
    fn record(&mut self) -> FlowResult<Option<(Key, Value)>> {
        let CacheState::Recording {
            pairs, recorded, ..
        } = &mut self.state
        else {
            return Ok(None);
        };
        if !*recorded {
            if !self.cursor.valid()? {
                return Ok(None);
            }
            let key = self.cursor.key()?;
            let value = self.cursor.current()?;
            pairs.push((key, value));
            *recorded = true;
        }
        Ok(pairs.last().cloned())
    }
}

impl<C: Cursor> Cursor for Cache<C> {
    fn valid(&mut self) -> FlowResult<bool> {
        match &mut self.state {
            CacheState::Fresh => self.cursor.valid(),
            CacheState::Recording {
                recorded, complete, ..
            } => {
                if *recorded {
                    return Ok(true);
                }
                let valid = self.cursor.valid()?;
                if !valid {
                    *complete = true;
                }
                Ok(valid)
            }
            CacheState::Replaying(replay) => replay.valid(),
        }
    }

    fn current(&mut self) -> FlowResult<Value> {
        if self.is_recording() {
            return Ok(self.record()?.map(|(_, value)| value).unwrap_or_default());
        }
        match &mut self.state {
            CacheState::Replaying(replay) => replay.current(),
            _ => self.cursor.current(),
        }
    }

    fn key(&mut self) -> FlowResult<Key> {
        if self.is_recording() {
            return Ok(self.record()?.map(|(key, _)| key).unwrap_or_default());
        }
        match &mut self.state {
            CacheState::Replaying(replay) => replay.key(),
            _ => self.cursor.key(),
        }
    }

    fn advance(&mut self) -> FlowResult<()> {
        if self.is_recording() {
            // Positions skipped without a pull still belong in the buffer.
            self.record()?;
            self.cursor.advance()?;
            if let CacheState::Recording { recorded, .. } = &mut self.state {
                *recorded = false;
            }
            return Ok(());
        }
        match &mut self.state {
            CacheState::Replaying(replay) => replay.advance(),
            _ => self.cursor.advance(),
        }
    }

    fn reset(&mut self) -> FlowResult<()> {
        match std::mem::replace(&mut self.state, CacheState::Fresh) {
            CacheState::Recording {
                pairs,
                complete: true,
                ..
            } => {
                log::debug!("cache: replaying {} recorded elements", pairs.len());
                self.state = CacheState::Replaying(EntriesCursor::new(pairs));
                Ok(())
            }
            CacheState::Replaying(mut replay) => {
                replay.reset()?;
                self.state = CacheState::Replaying(replay);
                Ok(())
            }
            CacheState::Fresh | CacheState::Recording { .. } => {
                self.cursor.reset()?;
                self.state = CacheState::Recording {
                    pairs: Vec::new(),
                    recorded: false,
                    complete: false,
                };
                Ok(())
            }
        }
    }
}

// ================================
// Loop
// ================================

/// Decides whether a loop restarts once its upstream is exhausted.
pub type LoopTest = Box<dyn FnMut(&Value, Option<&Key>) -> FlowResult<bool>>;

/// Rewinds the upstream each time it is exhausted, bounded by an element limit and a pass
/// count, or driven entirely by a test callback.
///
/// The test is consulted after exhaustion, so it only ever sees `Value::Null` and no key.
pub struct Loop<C> {
    cursor: C,
    config: LoopConfig,
    limit: Option<usize>,
    times: Option<usize>,
    test: Option<LoopTest>,
    done: bool,
}

impl<C: Cursor> Loop<C> {
    pub fn new(cursor: C, config: LoopConfig) -> Self {
        Self {
            cursor,
            limit: config.limit,
            times: config.times,
            config,
            test: None,
            done: false,
        }
    }

    /// Replace the pass count with a test callback.
    pub fn with_test<F>(mut self, test: F) -> Self
    where
        F: FnMut(&Value, Option<&Key>) -> FlowResult<bool> + 'static,
    {
        self.test = Some(Box::new(test));
        self
    }

    fn restart_allowed(&mut self) -> FlowResult<bool> {
        match &mut self.test {
            Some(test) => test(&Value::Null, None),
            None => {
                self.times = self.times.map(|t| t.saturating_sub(1));
                Ok(self.times != Some(0))
            }
        }
    }
}

impl<C: Cursor> Cursor for Loop<C> {
    fn valid(&mut self) -> FlowResult<bool> {
        if self.done || self.limit == Some(0) {
            return Ok(false);
        }
        if self.test.is_none() && self.times == Some(0) {
            return Ok(false);
        }
        if self.cursor.valid()? {
            return Ok(true);
        }
        if !self.restart_allowed()? {
            self.done = true;
            return Ok(false);
        }
        log::debug!("loop: restarting upstream");
        self.cursor.reset()?;
        if !self.cursor.valid()? {
            log::warn!("loop: upstream is empty after a restart, stopping");
            self.done = true;
            return Ok(false);
        }
        Ok(true)
    }

    fn current(&mut self) -> FlowResult<Value> {
        if self.done {
            return Ok(Value::Null);
        }
        self.cursor.current()
    }

    fn key(&mut self) -> FlowResult<Key> {
        if self.done {
            return Ok(Key::default());
        }
        self.cursor.key()
    }

    fn advance(&mut self) -> FlowResult<()> {
        if self.done {
            return Ok(());
        }
        self.limit = self.limit.map(|l| l.saturating_sub(1));
        self.cursor.advance()
    }

    fn reset(&mut self) -> FlowResult<()> {
        self.limit = self.config.limit;
        self.times = self.config.times;
        self.done = false;
        self.cursor.reset()
    }
}

// ================================
// Reduce
// ================================

/// Folds the whole upstream on `reset()` and yields the result once, under key 0.
pub struct Reduce<C, F> {
    cursor: C,
    f: F,
    seed: Value,
    result: Option<Value>,
}

impl<C, F> Reduce<C, F>
where
    C: Cursor,
    F: FnMut(Value, Value, &Key) -> FlowResult<Value>,
{
    pub fn new(cursor: C, f: F, seed: Value) -> Self {
        Self {
            cursor,
            f,
            seed,
            result: None,
        }
    }
}

impl<C, F> Cursor for Reduce<C, F>
where
    C: Cursor,
    F: FnMut(Value, Value, &Key) -> FlowResult<Value>,
{
    fn valid(&mut self) -> FlowResult<bool> {
        Ok(self.result.is_some())
    }

    fn current(&mut self) -> FlowResult<Value> {
        Ok(self.result.clone().unwrap_or_default())
    }

    fn key(&mut self) -> FlowResult<Key> {
        Ok(Key::Int(0))
    }

    fn advance(&mut self) -> FlowResult<()> {
        self.result = None;
        Ok(())
    }

    fn reset(&mut self) -> FlowResult<()> {
        self.result = None;
        self.cursor.reset()?;
        let mut acc = self.seed.clone();
        let mut folded = 0usize;
        while self.cursor.valid()? {
            let key = self.cursor.key()?;
            let value = self.cursor.current()?;
            acc = (self.f)(acc, value, &key)?;
            self.cursor.advance()?;
            folded += 1;
        }
        log::trace!("reduce: folded {} elements", folded);
        self.result = Some(acc);
        Ok(())
    }
}

// ================================
// Slice
// ================================

/// Skips `offset` elements on every `reset()`, then yields at most `count`.
pub struct Slice<C> {
    cursor: C,
    offset: usize,
    count: Option<usize>,
    taken: usize,
}

impl<C: Cursor> Slice<C> {
    pub fn new(cursor: C, offset: usize, count: Option<usize>) -> Self {
        Self {
            cursor,
            offset,
            count,
            taken: 0,
        }
    }
}

impl<C: Cursor> Cursor for Slice<C> {
    fn valid(&mut self) -> FlowResult<bool> {
        if self.count.is_some_and(|count| self.taken >= count) {
            return Ok(false);
        }
        self.cursor.valid()
    }

    fn current(&mut self) -> FlowResult<Value> {
        self.cursor.current()
    }

    fn key(&mut self) -> FlowResult<Key> {
        self.cursor.key()
    }

    fn advance(&mut self) -> FlowResult<()> {
        self.taken += 1;
        self.cursor.advance()
    }

    fn reset(&mut self) -> FlowResult<()> {
        self.taken = 0;
        self.cursor.reset()?;
        for _ in 0..self.offset {
            if !self.cursor.valid()? {
                break;
            }
            self.cursor.advance()?;
        }
        Ok(())
    }
}

// ================================
// NoRewind
// ================================

/// Lets the first `reset()` through and ignores every later one, so a second pass resumes
/// where the previous one stopped.
pub struct NoRewind<C> {
    cursor: C,
    started: bool,
}

impl<C: Cursor> NoRewind<C> {
    pub fn new(cursor: C) -> Self {
        Self {
            cursor,
            started: false,
        }
    }
}

impl<C: Cursor> Cursor for NoRewind<C> {
    fn valid(&mut self) -> FlowResult<bool> {
        self.cursor.valid()
    }

    fn current(&mut self) -> FlowResult<Value> {
        self.cursor.current()
    }

    fn key(&mut self) -> FlowResult<Key> {
        self.cursor.key()
    }

    fn advance(&mut self) -> FlowResult<()> {
        self.cursor.advance()
    }

    fn reset(&mut self) -> FlowResult<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        self.cursor.reset()
    }
}

// ================================
// Shared
// ================================

/// A cloneable handle onto one non-rewindable cursor. Every clone pulls from the same
/// position, so consumers split the elements between them.
#[derive(Clone)]
pub struct Shared {
    inner: Rc<RefCell<NoRewind<BoxCursor>>>,
}

impl Shared {
    pub fn new(cursor: BoxCursor) -> Self {
        Self {
            inner: Rc::new(RefCell::new(NoRewind::new(cursor))),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut NoRewind<BoxCursor>) -> FlowResult<T>) -> FlowResult<T> {
        let mut cursor = self.inner.try_borrow_mut().map_err(|_| {
            FlowError::precondition("shared", "cursor pulled again while a pull is in progress")
        })?;
        f(&mut cursor)
    }
}

impl Cursor for Shared {
    fn valid(&mut self) -> FlowResult<bool> {
        self.with(|c| c.valid())
    }

    fn current(&mut self) -> FlowResult<Value> {
        self.with(|c| c.current())
    }

    fn key(&mut self) -> FlowResult<Key> {
        self.with(|c| c.key())
    }

    fn advance(&mut self) -> FlowResult<()> {
        self.with(|c| c.advance())
    }

    fn reset(&mut self) -> FlowResult<()> {
        self.with(|c| c.reset())
    }
}

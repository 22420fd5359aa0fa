//! Depth-first tree walks driven by a child-lookup callback.
//!
//! Both walkers keep an explicit stack of cursors, one per level, with the input cursor at
//! the bottom. Depth is the stack index, so the top level is depth 0.

use crate::error::FlowResult;
use crate::flow_configuration::{RecursionConfig, RecursionMode};
use crate::value::{Key, Value};

use super::core::{BoxCursor, Cursor};
use super::source::Source;

// ================================
// RecursiveDescend
// ================================

struct Frame {
    cursor: BoxCursor,
    /// The node whose children this frame walks; exposed after them in child-first mode.
    owner: Option<(Key, Value)>,
}

struct Visit {
    key: Key,
    value: Value,
    depth: usize,
    /// The node was taken from a finished frame, its own level has already moved on.
    from_owner: bool,
}

/// Depth-first walk. The callback receives `(value, key, depth)` and returns the node's
/// children, or `None` for a leaf. Children are looked up only when the walk reaches them.
pub struct RecursiveDescend<F> {
    stack: Vec<Frame>,
    f: F,
    config: RecursionConfig,
    visit: Option<Visit>,
}

impl<F> RecursiveDescend<F>
where
    F: FnMut(Value, &Key, usize) -> FlowResult<Option<Source>>,
{
    pub fn new(cursor: BoxCursor, f: F, config: RecursionConfig) -> Self {
        Self {
            stack: vec![Frame {
                cursor,
                owner: None,
            }],
            f,
            config,
            visit: None,
        }
    }

    /// Nesting depth of the current node.
    pub fn depth(&self) -> usize {
        self.visit.as_ref().map_or(0, |v| v.depth)
    }

    fn children(&mut self, value: Value, key: &Key, depth: usize) -> FlowResult<Option<BoxCursor>> {
        if self.config.max_depth.is_some_and(|max| depth >= max) {
            return Ok(None);
        }
        match (self.f)(value, key, depth)? {
            Some(source) => {
                log::trace!("recursive: descending below {} at depth {}", key, depth);
                let mut cursor = source.into_cursor()?;
                cursor.reset()?;
                Ok(Some(cursor))
            }
            None => Ok(None),
        }
    }

    fn top(&mut self) -> Option<&mut BoxCursor> {
        self.stack.last_mut().map(|frame| &mut frame.cursor)
    }

    /// Move to the next node the configured mode exposes, starting at the current
    /// position of the deepest level.
    fn settle(&mut self) -> FlowResult<()> {
        loop {
            let depth = self.stack.len().saturating_sub(1);
            let Some(top) = self.top() else {
                self.visit = None;
                return Ok(());
            };
            if !top.valid()? {
                if self.stack.len() <= 1 {
                    self.visit = None;
                    return Ok(());
                }
                let finished = self.stack.pop();
                if let Some((key, value)) = finished.and_then(|frame| frame.owner) {
                    self.visit = Some(Visit {
                        key,
                        value,
                        depth: depth - 1,
                        from_owner: true,
                    });
                    return Ok(());
                }
                continue;
            }
            let key = top.key()?;
            let value = top.current()?;
            if self.config.mode == RecursionMode::SelfFirst {
                self.visit = Some(Visit {
                    key,
                    value,
                    depth,
                    from_owner: false,
                });
                return Ok(());
            }
            match self.children(value.clone(), &key, depth)? {
                None => {
                    self.visit = Some(Visit {
                        key,
                        value,
                        depth,
                        from_owner: false,
                    });
                    return Ok(());
                }
                Some(children) => {
                    if let Some(top) = self.top() {
                        top.advance()?;
                    }
                    let owner = (self.config.mode == RecursionMode::ChildFirst).then_some((key, value));
                    self.stack.push(Frame {
                        cursor: children,
                        owner,
                    });
                }
            }
        }
    }
}

impl<F> Cursor for RecursiveDescend<F>
where
    F: FnMut(Value, &Key, usize) -> FlowResult<Option<Source>>,
{
    fn valid(&mut self) -> FlowResult<bool> {
        Ok(self.visit.is_some())
    }

    fn current(&mut self) -> FlowResult<Value> {
        Ok(self.visit.as_ref().map(|v| v.value.clone()).unwrap_or_default())
    }

    fn key(&mut self) -> FlowResult<Key> {
        Ok(self.visit.as_ref().map(|v| v.key.clone()).unwrap_or_default())
    }

    fn advance(&mut self) -> FlowResult<()> {
        let Some(visit) = self.visit.take() else {
            return Ok(());
        };
        if !visit.from_owner {
            if let Some(top) = self.top() {
                top.advance()?;
            }
        }
        if self.config.mode == RecursionMode::SelfFirst {
            if let Some(children) = self.children(visit.value, &visit.key, visit.depth)? {
                self.stack.push(Frame {
                    cursor: children,
                    owner: None,
                });
            }
        }
        self.settle()
    }

    fn reset(&mut self) -> FlowResult<()> {
        self.stack.truncate(1);
        self.visit = None;
        if let Some(top) = self.top() {
            top.reset()?;
        }
        self.settle()
    }
}

// ================================
// RecursiveUnfold
// ================================

/// Recursively replaces each node by what the callback returns for `(value, key, depth)`:
/// a `Source::Single` replaces the node's value, `Source::Empty` drops the node, and any
/// other source is walked in place, its elements going through the callback again one
/// level deeper. With `keep_originals` an expanded node is yielded before its expansion.
/// Keys are the ones each element had in its own sequence.
pub struct RecursiveUnfold<F> {
    stack: Vec<BoxCursor>,
    f: F,
    keep_originals: bool,
    current: Option<(Key, Value)>,
    /// The current node was expanded and its level already advanced.
    expanded: bool,
}

impl<F> RecursiveUnfold<F>
where
    F: FnMut(Value, &Key, usize) -> FlowResult<Source>,
{
    pub fn new(cursor: BoxCursor, f: F, keep_originals: bool) -> Self {
        Self {
            stack: vec![cursor],
            f,
            keep_originals,
            current: None,
            expanded: false,
        }
    }

    fn settle(&mut self) -> FlowResult<()> {
        loop {
            let depth = self.stack.len().saturating_sub(1);
            let Some(top) = self.stack.last_mut() else {
                self.current = None;
                return Ok(());
            };
            if !top.valid()? {
                if self.stack.len() <= 1 {
                    self.current = None;
                    return Ok(());
                }
                self.stack.pop();
                continue;
            }
            let key = top.key()?;
            let value = top.current()?;
            match (self.f)(value.clone(), &key, depth)? {
                Source::Single { value, .. } => {
                    self.current = Some((key, value));
                    return Ok(());
                }
                Source::Empty => {
                    if let Some(top) = self.stack.last_mut() {
                        top.advance()?;
                    }
                }
                source => {
                    let mut children = source.into_cursor()?;
                    children.reset()?;
                    if let Some(top) = self.stack.last_mut() {
                        top.advance()?;
                    }
                    log::trace!("recursive unfold: expanding {} at depth {}", key, depth);
                    self.stack.push(children);
                    if self.keep_originals {
                        self.current = Some((key, value));
                        self.expanded = true;
                        return Ok(());
                    }
                }
            }
        }
    }
}

impl<F> Cursor for RecursiveUnfold<F>
where
    F: FnMut(Value, &Key, usize) -> FlowResult<Source>,
{
    fn valid(&mut self) -> FlowResult<bool> {
        Ok(self.current.is_some())
    }

    fn current(&mut self) -> FlowResult<Value> {
        Ok(self.current.as_ref().map(|(_, v)| v.clone()).unwrap_or_default())
    }

    fn key(&mut self) -> FlowResult<Key> {
        Ok(self.current.as_ref().map(|(k, _)| k.clone()).unwrap_or_default())
    }

    fn advance(&mut self) -> FlowResult<()> {
        if self.current.take().is_none() {
            return Ok(());
        }
        if self.expanded {
            self.expanded = false;
        } else if let Some(top) = self.stack.last_mut() {
            top.advance()?;
        }
        self.settle()
    }

    fn reset(&mut self) -> FlowResult<()> {
        self.stack.truncate(1);
        self.current = None;
        self.expanded = false;
        if let Some(root) = self.stack.last_mut() {
            root.reset()?;
        }
        self.settle()
    }
}

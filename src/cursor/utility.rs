//! Draining helpers: materialize a cursor into entries, values, pairs or a count
use crate::entries::Entries;
use crate::error::FlowResult;
use crate::value::{Key, Value};

use super::core::Cursor;

/// Rewind and walk the whole cursor, handing every pair to `f`. `f` returns `false` to stop.
pub fn walk<C, F>(cursor: &mut C, mut f: F) -> FlowResult<()>
where
    C: Cursor + ?Sized,
    F: FnMut(Key, Value) -> FlowResult<bool>,
{
    cursor.reset()?;
    while cursor.valid()? {
        let key = cursor.key()?;
        let value = cursor.current()?;
        if !f(key, value)? {
            break;
        }
        cursor.advance()?;
    }
    Ok(())
}

/// Materialize into an ordered mapping; a repeated key keeps its first position and its
/// last value.
pub fn drain_entries<C: Cursor + ?Sized>(cursor: &mut C) -> FlowResult<Entries> {
    let mut entries = Entries::new();
    walk(cursor, |key, value| {
        entries.insert(key, value);
        Ok(true)
    })?;
    log::debug!("materialized {} entries", entries.len());
    Ok(entries)
}

/// Materialize with fresh keys `0..n`, so no element is lost to a duplicate key.
pub fn drain_packed<C: Cursor + ?Sized>(cursor: &mut C) -> FlowResult<Entries> {
    let mut entries = Entries::new();
    walk(cursor, |_, value| {
        entries.push(value);
        Ok(true)
    })?;
    log::debug!("materialized {} packed entries", entries.len());
    Ok(entries)
}

pub fn drain_values<C: Cursor + ?Sized>(cursor: &mut C) -> FlowResult<Vec<Value>> {
    let mut values = Vec::new();
    walk(cursor, |_, value| {
        values.push(value);
        Ok(true)
    })?;
    Ok(values)
}

/// Every pair in iteration order, duplicate keys included.
pub fn drain_pairs<C: Cursor + ?Sized>(cursor: &mut C) -> FlowResult<Vec<(Key, Value)>> {
    let mut pairs = Vec::new();
    walk(cursor, |key, value| {
        pairs.push((key, value));
        Ok(true)
    })?;
    Ok(pairs)
}

/// Number of elements; keys and values are never pulled.
pub fn count<C: Cursor + ?Sized>(cursor: &mut C) -> FlowResult<usize> {
    cursor.reset()?;
    let mut n = 0;
    while cursor.valid()? {
        n += 1;
        cursor.advance()?;
    }
    Ok(n)
}

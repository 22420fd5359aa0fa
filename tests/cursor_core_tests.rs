use pullflow::cursor::{drain_pairs, drain_values, from_values, Cursor, CursorExt, EntriesCursor};
use pullflow::{Entries, FlowError, FlowResult, Key, Value};
use std::cell::Cell;
use std::rc::Rc;

// Test cursor that counts how often its values are pulled
struct CountingCursor {
    values: Vec<i64>,
    index: usize,
    pulls: Rc<Cell<usize>>,
}

impl CountingCursor {
    fn new(values: Vec<i64>, pulls: Rc<Cell<usize>>) -> Self {
        Self {
            values,
            index: 0,
            pulls,
        }
    }
}

impl Cursor for CountingCursor {
    fn valid(&mut self) -> FlowResult<bool> {
        Ok(self.index < self.values.len())
    }

    fn current(&mut self) -> FlowResult<Value> {
        self.pulls.set(self.pulls.get() + 1);
        Ok(self
            .values
            .get(self.index)
            .map(|v| Value::Int(*v))
            .unwrap_or_default())
    }

    fn key(&mut self) -> FlowResult<Key> {
        Ok(Key::from(self.index))
    }

    fn advance(&mut self) -> FlowResult<()> {
        if self.index < self.values.len() {
            self.index += 1;
        }
        Ok(())
    }

    fn reset(&mut self) -> FlowResult<()> {
        self.index = 0;
        Ok(())
    }
}

fn ints(values: Vec<Value>) -> Vec<i64> {
    values.iter().filter_map(Value::as_i64).collect()
}

#[test]
fn test_custom_cursor_drains() {
    let pulls = Rc::new(Cell::new(0));
    let mut cursor = CountingCursor::new(vec![1, 2, 3], pulls.clone());
    assert_eq!(ints(drain_values(&mut cursor).unwrap()), vec![1, 2, 3]);
    assert_eq!(pulls.get(), 3);
}

#[test]
fn test_map_transforms_values() {
    let mut cursor = from_values(vec![1, 2, 3]).map(|v, _| {
        Ok((Value::Int(v.as_i64().unwrap_or(0) * 10), None))
    });
    assert_eq!(ints(drain_values(&mut cursor).unwrap()), vec![10, 20, 30]);
}

#[test]
fn test_map_calls_callback_once_per_position() {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let mut cursor = from_values(vec![1, 2, 3]).map(move |v, _| {
        counter.set(counter.get() + 1);
        Ok((v, None))
    });

    cursor.reset().unwrap();
    while cursor.valid().unwrap() {
        cursor.current().unwrap();
        cursor.current().unwrap();
        cursor.key().unwrap();
        cursor.valid().unwrap();
        cursor.advance().unwrap();
    }
    assert_eq!(calls.get(), 3);
}

#[test]
fn test_map_can_replace_keys() {
    let mut cursor = from_values(vec!["a", "b"]).map(|v, k| {
        let key = Key::from(format!("key-{}", k));
        Ok((v, Some(key)))
    });
    let pairs = drain_pairs(&mut cursor).unwrap();
    assert_eq!(
        pairs,
        vec![
            (Key::from("key-0"), Value::from("a")),
            (Key::from("key-1"), Value::from("b")),
        ]
    );
}

#[test]
fn test_filter_keeps_original_keys() {
    let mut cursor =
        from_values(vec![1, 2, 3, 4]).filter(|v, _| Ok(v.as_i64().unwrap_or(0) % 2 == 0));
    let pairs = drain_pairs(&mut cursor).unwrap();
    assert_eq!(
        pairs,
        vec![(Key::Int(1), Value::Int(2)), (Key::Int(3), Value::Int(4))]
    );
}

#[test]
fn test_filter_rejecting_everything_is_empty() {
    let mut cursor = from_values(vec![1, 2, 3]).filter(|_, _| Ok(false));
    assert!(drain_values(&mut cursor).unwrap().is_empty());
}

#[test]
fn test_filter_map_drops_none() {
    let mut cursor = from_values(vec![1, 2, 3, 4]).filter_map(|v, _| {
        let n = v.as_i64().unwrap_or(0);
        Ok((n > 2).then(|| (Value::Int(n * 100), None)))
    });
    let pairs = drain_pairs(&mut cursor).unwrap();
    assert_eq!(
        pairs,
        vec![(Key::Int(2), Value::Int(300)), (Key::Int(3), Value::Int(400))]
    );
}

#[test]
fn test_reindex_with_start_and_step() {
    let mut cursor = from_values(vec!["a", "b", "c"]).reindex(10, 5);
    let keys: Vec<Key> = drain_pairs(&mut cursor)
        .unwrap()
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(keys, vec![Key::Int(10), Key::Int(15), Key::Int(20)]);
}

#[test]
fn test_flip_swaps_keys_and_values() {
    let entries: Entries = vec![("a", 1), ("b", 2)].into_iter().collect();
    let mut cursor = EntriesCursor::from(entries).flip(true, true);
    let pairs = drain_pairs(&mut cursor).unwrap();
    assert_eq!(
        pairs,
        vec![(Key::Int(1), Value::from("a")), (Key::Int(2), Value::from("b"))]
    );
}

#[test]
fn test_flip_values_only() {
    let entries: Entries = vec![("a", 1)].into_iter().collect();
    let mut cursor = EntriesCursor::from(entries).flip(true, false);
    let pairs = drain_pairs(&mut cursor).unwrap();
    assert_eq!(pairs, vec![(Key::from("a"), Value::from("a"))]);
}

#[test]
fn test_flip_rejects_lists_as_keys() {
    let mut cursor = from_values(vec![Value::from(vec![1, 2])]).flip(true, true);
    let err = drain_pairs(&mut cursor).unwrap_err();
    assert!(matches!(err, FlowError::Precondition { operation: "flip", .. }));
}

#[test]
fn test_take_while_stops_at_first_rejection() {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let mut cursor = from_values(vec![1, 2, 3, 1]).take_while(move |v, _| {
        counter.set(counter.get() + 1);
        Ok(v.as_i64().unwrap_or(0) < 3)
    });
    assert_eq!(ints(drain_values(&mut cursor).unwrap()), vec![1, 2]);
    assert_eq!(calls.get(), 3);

    // A rejection holds until the next reset
    assert!(!cursor.valid().unwrap());
    assert_eq!(calls.get(), 3);
    assert_eq!(ints(drain_values(&mut cursor).unwrap()), vec![1, 2]);
}

#[test]
fn test_boxed_cursor_composes() {
    let boxed = from_values(vec![1, 2]).boxed();
    let mut cursor = boxed.map(|v, _| Ok((Value::Int(v.as_i64().unwrap_or(0) + 1), None)));
    assert_eq!(ints(drain_values(&mut cursor).unwrap()), vec![2, 3]);
}

#[test]
fn test_cursor_through_mutable_reference() {
    let mut inner = from_values(vec![5, 6]);
    {
        let mut borrowed = (&mut inner).reindex(1, 1);
        assert_eq!(drain_pairs(&mut borrowed).unwrap()[0].0, Key::Int(1));
    }
    assert_eq!(ints(drain_values(&mut inner).unwrap()), vec![5, 6]);
}

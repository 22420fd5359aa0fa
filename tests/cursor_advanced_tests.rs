use pullflow::cursor::{
    drain_pairs, drain_values, from_values, Cursor, CursorExt, EntriesCursor, MultiZip, Source,
};
use pullflow::{Entries, FlowError, Key, KeyPolicy, UnfoldConfig, Value, ZipConfig, ZipMode};
use std::cell::Cell;
use std::rc::Rc;

fn ints(values: Vec<Value>) -> Vec<i64> {
    values.iter().filter_map(Value::as_i64).collect()
}

fn keys(pairs: &[(Key, Value)]) -> Vec<Key> {
    pairs.iter().map(|(k, _)| k.clone()).collect()
}

fn nested() -> Vec<Value> {
    vec![Value::Int(1), Value::from(vec![2, 3]), Value::Int(4)]
}

#[test]
fn test_unfold_keeps_inner_keys() {
    let mut cursor = from_values(nested()).unfold(UnfoldConfig::default());
    let pairs = drain_pairs(&mut cursor).unwrap();
    assert_eq!(
        keys(&pairs),
        vec![Key::Int(0), Key::Int(0), Key::Int(1), Key::Int(2)]
    );
    assert_eq!(
        ints(pairs.into_iter().map(|(_, v)| v).collect()),
        vec![1, 2, 3, 4]
    );
}

#[test]
fn test_unfold_sequential_keys() {
    let mut cursor = from_values(nested()).unfold(UnfoldConfig::sequential());
    let pairs = drain_pairs(&mut cursor).unwrap();
    assert_eq!(
        keys(&pairs),
        vec![Key::Int(0), Key::Int(1), Key::Int(2), Key::Int(3)]
    );
}

#[test]
fn test_unfold_skips_empty_groups() {
    let empty: Vec<i64> = Vec::new();
    let mut cursor = from_values(vec![
        Value::from(empty.clone()),
        Value::Int(1),
        Value::from(empty.clone()),
        Value::from(vec![2]),
        Value::from(empty),
    ])
    .unfold(UnfoldConfig::default());
    assert_eq!(ints(drain_values(&mut cursor).unwrap()), vec![1, 2]);
}

#[test]
fn test_unfold_expands_maps_with_their_keys() {
    let inner: Entries = vec![("x", 1), ("y", 2)].into_iter().collect();
    let mut cursor = from_values(vec![Value::Map(inner)]).unfold(UnfoldConfig::default());
    let pairs = drain_pairs(&mut cursor).unwrap();
    assert_eq!(keys(&pairs), vec![Key::from("x"), Key::from("y")]);
}

#[test]
fn test_unfold_is_one_level_deep() {
    let mut cursor = from_values(vec![Value::from(vec![Value::from(vec![1])])])
        .unfold(UnfoldConfig::default());
    assert_eq!(
        drain_values(&mut cursor).unwrap(),
        vec![Value::from(vec![1])]
    );
}

#[test]
fn test_expand_with_callback() {
    let mut cursor = from_values(vec![1, 2, 3]).expand(
        |v, _| {
            let n = v.as_i64().unwrap_or(0);
            Ok(match n {
                2 => Source::from(vec![20, 21]),
                3 => Source::Empty,
                _ => Source::single(n * 100),
            })
        },
        UnfoldConfig::sequential(),
    );
    let pairs = drain_pairs(&mut cursor).unwrap();
    assert_eq!(
        pairs,
        vec![
            (Key::Int(0), Value::Int(100)),
            (Key::Int(1), Value::Int(20)),
            (Key::Int(2), Value::Int(21)),
        ]
    );
}

#[test]
fn test_head_and_tail_original_keys() {
    let mut cursor = from_values(vec![1, 2]).prepended(
        Value::Int(0),
        Key::from("head"),
        KeyPolicy::Original,
    );
    let pairs = drain_pairs(&mut cursor).unwrap();
    assert_eq!(
        keys(&pairs),
        vec![Key::from("head"), Key::Int(0), Key::Int(1)]
    );
    assert_eq!(
        ints(pairs.into_iter().map(|(_, v)| v).collect()),
        vec![0, 1, 2]
    );
}

#[test]
fn test_head_and_tail_sequential_keys() {
    let entries: Entries = vec![("a", 1), ("b", 2)].into_iter().collect();
    let mut cursor = EntriesCursor::from(entries).prepended(
        Value::Int(0),
        Key::from("head"),
        KeyPolicy::Sequential,
    );
    let pairs = drain_pairs(&mut cursor).unwrap();
    assert_eq!(keys(&pairs), vec![Key::Int(0), Key::Int(1), Key::Int(2)]);
}

#[test]
fn test_head_and_tail_over_empty_tail() {
    let empty: Vec<i64> = Vec::new();
    let mut cursor = from_values(empty).prepended(Value::Int(9), Key::Int(0), KeyPolicy::Original);
    assert_eq!(ints(drain_values(&mut cursor).unwrap()), vec![9]);
}

fn zip_inputs() -> Vec<(Key, Source)> {
    vec![
        (Key::Int(0), Source::from(vec!["a", "b"])),
        (Key::Int(1), Source::from(vec!["x", "y", "z"])),
    ]
}

#[test]
fn test_zip_lenient_pads_with_null() {
    let config = ZipConfig::new().fields(["l", "r"]);
    let mut zip = MultiZip::from_inputs(zip_inputs(), &config).unwrap();
    assert_eq!(zip.width(), 2);
    let records = drain_pairs(&mut zip).unwrap();
    assert_eq!(records.len(), 3);

    let Value::Map(last) = &records[2].1 else {
        panic!("expected a map record");
    };
    assert_eq!(records[2].0, Key::Int(2));
    assert_eq!(last.get(&Key::from("l")), Some(&Value::Null));
    assert_eq!(last.get(&Key::from("r")), Some(&Value::from("z")));
}

#[test]
fn test_zip_strict_stops_at_shortest() {
    let config = ZipConfig::new().mode(ZipMode::All);
    let mut zip = MultiZip::from_inputs(zip_inputs(), &config).unwrap();
    let records = drain_values(&mut zip).unwrap();
    assert_eq!(records.len(), 2);

    let Value::Map(first) = &records[0] else {
        panic!("expected a map record");
    };
    // Without field names the input keys name the fields
    assert_eq!(first.get(&Key::Int(0)), Some(&Value::from("a")));
    assert_eq!(first.get(&Key::Int(1)), Some(&Value::from("x")));
}

#[test]
fn test_zip_without_sources_is_empty() {
    let mut zip = MultiZip::new(Vec::new(), ZipMode::Any);
    assert!(drain_values(&mut zip).unwrap().is_empty());
}

#[test]
fn test_zip_rejects_short_field_list() {
    let config = ZipConfig::new().fields(["only"]);
    let err = MultiZip::from_inputs(zip_inputs(), &config).err().unwrap();
    assert!(matches!(err, FlowError::InvalidArgument(_)));
}

#[test]
fn test_zip_rejects_scalar_input() {
    let inputs = vec![(Key::Int(0), Source::single(1))];
    let err = MultiZip::from_inputs(inputs, &ZipConfig::default()).err().unwrap();
    assert!(matches!(err, FlowError::InvalidArgument(_)));
}

#[test]
fn test_source_from_value_shapes() {
    assert!(matches!(Source::from(Value::Int(3)), Source::Single { .. }));
    assert!(matches!(Source::from(Value::from(vec![1])), Source::Entries(_)));
    assert!(Source::iterable(Value::from(vec![1])).is_ok());
    assert!(matches!(
        Source::iterable(Value::from("text")),
        Err(FlowError::InvalidArgument(_))
    ));
}

#[test]
fn test_source_pairs_keep_duplicates() {
    let source = Source::Pairs(vec![
        (Key::Int(1), Value::from("a")),
        (Key::Int(1), Value::from("b")),
    ]);
    let mut cursor = source.into_cursor().unwrap();
    assert_eq!(drain_values(&mut cursor).unwrap().len(), 2);
}

#[test]
fn test_source_factory_runs_once_on_normalization() {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let source = Source::factory(move || {
        counter.set(counter.get() + 1);
        Ok(Source::from(vec![1, 2]))
    });
    let mut cursor = source.into_cursor().unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(ints(drain_values(&mut cursor).unwrap()), vec![1, 2]);
    assert_eq!(ints(drain_values(&mut cursor).unwrap()), vec![1, 2]);
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_lazy_source_factory_waits_for_first_pull() {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let source = Source::factory(move || {
        counter.set(counter.get() + 1);
        Ok(Source::from(vec![7]))
    });
    let mut cursor = source.into_lazy_cursor();
    assert_eq!(calls.get(), 0);
    assert_eq!(ints(drain_values(&mut cursor).unwrap()), vec![7]);
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_source_passes_cursors_through() {
    let source = Source::cursor(from_values(vec![4, 5]));
    let mut cursor = source.into_cursor().unwrap();
    cursor.reset().unwrap();
    assert_eq!(cursor.current().unwrap(), Value::Int(4));
}

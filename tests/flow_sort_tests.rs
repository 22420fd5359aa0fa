use pullflow::flow::{natural_cmp, SortCompare};
use pullflow::{Entries, Flow, FlowError, Key, SortFlags, SortKind, Value};
use std::cmp::Ordering;

fn scores() -> Entries {
    vec![("carol", 3), ("alice", 1), ("bob", 2)].into_iter().collect()
}

fn keys(entries: &Entries) -> Vec<String> {
    entries.keys().map(|k| k.to_string()).collect()
}

#[test]
fn test_sort_discards_keys() {
    let sorted = Flow::from(scores())
        .sort(SortKind::Sort, SortFlags::default())
        .unwrap()
        .to_pairs()
        .unwrap();
    assert_eq!(
        sorted,
        vec![
            (Key::Int(0), Value::Int(1)),
            (Key::Int(1), Value::Int(2)),
            (Key::Int(2), Value::Int(3)),
        ]
    );
}

#[test]
fn test_rsort_descends() {
    let values = Flow::from(vec![2, 3, 1])
        .sort(SortKind::Rsort, SortFlags::regular())
        .unwrap()
        .to_vec()
        .unwrap();
    assert_eq!(values, vec![Value::Int(3), Value::Int(2), Value::Int(1)]);
}

#[test]
fn test_asort_and_arsort_keep_keys() {
    let asc = Flow::from(scores())
        .sort(SortKind::Asort, SortFlags::regular())
        .unwrap()
        .collect()
        .unwrap();
    assert_eq!(keys(&asc), vec!["alice", "bob", "carol"]);

    let desc = Flow::from(scores())
        .sort(SortKind::Arsort, SortFlags::regular())
        .unwrap()
        .collect()
        .unwrap();
    assert_eq!(keys(&desc), vec!["carol", "bob", "alice"]);
}

#[test]
fn test_ksort_and_krsort() {
    let by_key = Flow::from(scores())
        .sort(SortKind::Ksort, SortFlags::string())
        .unwrap()
        .collect()
        .unwrap();
    assert_eq!(keys(&by_key), vec!["alice", "bob", "carol"]);

    let reversed = Flow::from(scores())
        .sort(SortKind::Krsort, SortFlags::string())
        .unwrap()
        .collect()
        .unwrap();
    assert_eq!(keys(&reversed), vec!["carol", "bob", "alice"]);
}

#[test]
fn test_numeric_and_string_flags() {
    let numeric = Flow::from(vec!["10", "9", "100"])
        .sort(SortKind::Sort, SortFlags::numeric())
        .unwrap()
        .to_vec()
        .unwrap();
    assert_eq!(
        numeric,
        vec![Value::from("9"), Value::from("10"), Value::from("100")]
    );

    let textual = Flow::from(vec![10, 9, 100])
        .sort(SortKind::Sort, SortFlags::string())
        .unwrap()
        .to_vec()
        .unwrap();
    assert_eq!(textual, vec![Value::Int(10), Value::Int(100), Value::Int(9)]);
}

#[test]
fn test_natsort_keeps_keys() {
    let files = Flow::from(vec!["img12", "img10", "img2"])
        .sort(SortKind::Natsort, SortFlags::default())
        .unwrap()
        .to_pairs()
        .unwrap();
    assert_eq!(
        files,
        vec![
            (Key::Int(2), Value::from("img2")),
            (Key::Int(1), Value::from("img10")),
            (Key::Int(0), Value::from("img12")),
        ]
    );
}

#[test]
fn test_natcasesort_folds_case() {
    let values = Flow::from(vec!["b", "A", "c"])
        .sort(SortKind::Natcasesort, SortFlags::default())
        .unwrap()
        .to_vec()
        .unwrap();
    assert_eq!(
        values,
        vec![Value::from("A"), Value::from("b"), Value::from("c")]
    );
}

#[test]
fn test_fold_case_flag() {
    let flags = SortFlags::string().fold_case();
    assert_eq!(flags.compare, SortCompare::String);
    assert_eq!(flags.compare(&Value::from("B"), &Value::from("a")), Ordering::Greater);
    assert_eq!(natural_cmp("x9", "x10"), Ordering::Less);
}

#[test]
fn test_shuffle_keeps_elements() {
    let mut values = Flow::range(1, 20, 1)
        .sort(SortKind::Shuffle, SortFlags::default())
        .unwrap()
        .to_vec()
        .unwrap()
        .iter()
        .filter_map(Value::as_i64)
        .collect::<Vec<_>>();
    values.sort_unstable();
    assert_eq!(values, (1..=20).collect::<Vec<_>>());
}

#[test]
fn test_custom_comparators() {
    let by_length = Flow::from(vec!["ccc", "a", "bb"])
        .sort_by(SortKind::Usort, |a, b| {
            a.to_text().len().cmp(&b.to_text().len())
        })
        .unwrap()
        .to_vec()
        .unwrap();
    assert_eq!(
        by_length,
        vec![Value::from("a"), Value::from("bb"), Value::from("ccc")]
    );

    let kept = Flow::from(scores())
        .sort_by(SortKind::Uasort, |a, b| b.as_i64().cmp(&a.as_i64()))
        .unwrap()
        .collect()
        .unwrap();
    assert_eq!(keys(&kept), vec!["carol", "bob", "alice"]);

    let by_key = Flow::from(scores())
        .sort_by(SortKind::Uksort, |a, b| a.to_text().cmp(&b.to_text()))
        .unwrap()
        .collect()
        .unwrap();
    assert_eq!(keys(&by_key), vec!["alice", "bob", "carol"]);
}

#[test]
fn test_sort_kind_names() {
    assert_eq!("natcasesort".parse::<SortKind>().unwrap(), SortKind::Natcasesort);
    assert_eq!(SortKind::Uksort.to_string(), "uksort");
    let err = "bogus".parse::<SortKind>().unwrap_err();
    assert_eq!(err, FlowError::InvalidArgument("Bad sort type: bogus".to_string()));
}

#[test]
fn test_bad_sort_name_leaves_data_alone() {
    let mut flow = Flow::from(vec![3, 1, 2]).pack().unwrap();
    match "sideways".parse::<SortKind>() {
        Ok(kind) => flow = flow.sort(kind, SortFlags::default()).unwrap(),
        Err(err) => assert!(matches!(err, FlowError::InvalidArgument(_))),
    }
    assert_eq!(flow.all().unwrap(), &Entries::from_values(vec![3, 1, 2]));
}

#[test]
fn test_comparator_kind_mismatch() {
    let needs_comparator = Flow::from(vec![1]).sort(SortKind::Usort, SortFlags::default());
    assert!(matches!(needs_comparator, Err(FlowError::InvalidArgument(_))));

    let takes_none = Flow::from(vec![1]).sort_by(SortKind::Asort, |a, b| a.to_text().cmp(&b.to_text()));
    assert!(matches!(takes_none, Err(FlowError::InvalidArgument(_))));
}

#[test]
fn test_sort_then_continue_lazily() {
    let values = Flow::from(vec![3, 1, 2])
        .sort(SortKind::Sort, SortFlags::default())
        .unwrap()
        .map(|v, k| Value::from(format!("{}:{}", k, v)))
        .to_vec()
        .unwrap();
    assert_eq!(
        values,
        vec![Value::from("0:1"), Value::from("1:2"), Value::from("2:3")]
    );
}

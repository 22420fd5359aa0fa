use pullflow::cursor::{drain_values, Cursor, Generator, Source};
use pullflow::{Flow, FlowError, Key, Value};
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn test_flip_rejects_collection_values() {
    let result = Flow::from(vec![Value::Int(1), Value::from(vec![2])]).flip().to_vec();
    match result {
        Err(FlowError::Precondition { operation, .. }) => assert_eq!(operation, "flip"),
        other => panic!("expected a precondition error, got {:?}", other),
    }
}

#[test]
fn test_keys_never_coerce_values() {
    let keys = Flow::from(vec![Value::from(vec![1]), Value::from(vec![2])])
        .keys()
        .to_vec()
        .unwrap();
    assert_eq!(keys, vec![Value::Int(0), Value::Int(1)]);
}

#[test]
fn test_concat_rejects_scalar_elements() {
    let result = Flow::from(vec![Value::from(vec![1]), Value::Int(2)])
        .concat()
        .to_vec();
    assert!(matches!(
        result,
        Err(FlowError::Precondition {
            operation: "concat",
            ..
        })
    ));
}

#[test]
fn test_error_surfaces_only_when_reached() {
    let mut flow = Flow::from(vec![Value::from(vec![1]), Value::Int(2)]).concat();
    flow.reset().unwrap();
    assert_eq!(flow.current().unwrap(), Value::Int(1));
    assert!(flow.advance().is_err());
}

#[test]
fn test_try_map_propagates_callback_errors() {
    let result = Flow::from(vec![1, 2, 3])
        .try_map(|v, _| match v.as_i64() {
            Some(2) => Err(FlowError::callback("two is not allowed")),
            _ => Ok(v),
        })
        .to_vec();
    assert_eq!(result, Err(FlowError::Callback("two is not allowed".to_string())));
}

#[test]
fn test_try_where_propagates_errors() {
    let result = Flow::from(vec![1])
        .try_where(|_, _| Err(FlowError::Custom("predicate failed".to_string())))
        .count();
    assert!(matches!(result, Err(FlowError::Custom(_))));
}

#[test]
fn test_generator_error_stops_pull() {
    let mut cursor = Generator::from_fn_keyed(|key: &mut Key| {
        if *key == Key::Int(2) {
            Err(FlowError::callback("producer failed"))
        } else {
            Ok(Some(Value::from(key.clone())))
        }
    });
    assert!(matches!(
        drain_values(&mut cursor),
        Err(FlowError::Callback(_))
    ));
}

#[test]
fn test_factory_error_raised_at_first_pull() {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let flow = Flow::from(Source::factory(move || {
        counter.set(counter.get() + 1);
        Err(FlowError::invalid_argument("factory refused"))
    }));
    assert_eq!(calls.get(), 0);
    assert!(matches!(flow.to_vec(), Err(FlowError::InvalidArgument(_))));
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_factory_error_raised_eagerly_by_into_cursor() {
    let source = Source::factory(|| Err(FlowError::invalid_argument("eager")));
    assert!(source.into_cursor().is_err());
}

#[test]
fn test_error_messages() {
    assert_eq!(
        FlowError::precondition("flip", "bad key").to_string(),
        "flip: bad key"
    );
    assert_eq!(
        FlowError::invalid_argument("x").to_string(),
        "Invalid argument: x"
    );
    let json_err = serde_json::from_str::<serde_json::Value>("[").unwrap_err();
    assert!(matches!(FlowError::from(json_err), FlowError::Json(_)));
}

//! Failures surface with their step, operation and cause.


use std::error::Error as _;

use rowchain::{json, start, Compose, Engine, ExecError, Node, OpError, Operation, Value};
use test_data_gen::{ints, users};

fn step_error(err: &ExecError) -> (usize, Operation, &OpError) {
    match err {
        ExecError::Step {
            index,
            operation,
            source,
        } => (*index, *operation, source),
        other => panic!("expected a step error, got {other}"),
    }
}

#[test]
fn initializer_failure_is_step_zero() {
    let err = start(|| Err("source offline".into())).run().unwrap_err();
    let (index, op, source) = step_error(&err);
    assert_eq!(index, 0);
    assert_eq!(op, Operation::Initialize);
    assert_eq!(source.to_string(), "initializer failed: source offline");
}

#[test]
fn batch_failure_names_the_slice() {
    let err = start(|| Ok(ints(9)))
        .map_batch_sized(
            |slice| {
                if slice[0] == json!(7) {
                    Err("bad slice".into())
                } else {
                    Ok(slice)
                }
            },
            3,
        )
        .run()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "step 1 (map_batch) failed: batch handler failed: slice 3 of 3: bad slice"
    );
}

#[test]
fn error_sources_chain_down_to_the_user_error() {
    let err = start(|| Ok(json!([1])))
        .filter(|_| Err("undecidable".into()))
        .run()
        .unwrap_err();
    let op = err.source().expect("step error has a source");
    assert_eq!(op.to_string(), "filter predicate failed: undecidable");
    let user = op.source().expect("operator error has a source");
    assert_eq!(user.to_string(), "undecidable");
}

#[test]
fn bare_prepared_node_is_a_dispatch_error() {
    let err = start(|| Ok(json!([{"id": 1}])))
        .then(Node::prepare(Ok))
        .run()
        .unwrap_err();
    let (index, op, source) = step_error(&err);
    assert_eq!((index, op), (1, Operation::Prepare));
    assert!(matches!(source, OpError::Dispatch(_)));
}

#[test]
fn missing_join_key_is_a_join_error() {
    let cfg = rowchain::JoinConfig::on_fields("uid", "user_id")
        .one_to_many(false)
        .left_property("m")
        .build()
        .unwrap();
    let err = start(|| Ok(users(2)))
        .left_join(|_| Ok(json!([{"user_id": 1}])), cfg)
        .run()
        .unwrap_err();
    let (_, op, source) = step_error(&err);
    assert_eq!(op, Operation::LeftJoin);
    assert!(matches!(source, OpError::Join { .. }));
    assert!(source.to_string().contains("left key of row 0"));
    let cause = std::error::Error::source(source).map(ToString::to_string);
    assert!(cause.is_some_and(|c| c.contains("missing key field 'uid'")));
    assert!(!source.to_string().contains("missing key field"));
}

#[test]
fn merge_mode_rejects_non_record_rows() {
    let cfg = rowchain::JoinConfig::builder()
        .left_key(rowchain::key::with(|v: &Value| Ok(v.clone())))
        .right_key(rowchain::key::field("k"))
        .one_to_many(false)
        .build()
        .unwrap();
    let err = start(|| Ok(json!([1])))
        .left_join(|_| Ok(json!([{"k": 1}])), cfg)
        .run()
        .unwrap_err();
    assert!(err.to_string().contains("cannot be merged"));
}

#[test]
fn failed_runs_leave_the_engine_usable() {
    let engine = Engine::default();
    let bad = start(|| Ok(json!([1]))).map_one(|_| Err("nope".into()));
    let good = start(|| Ok(json!([1]))).map_one(Ok);
    assert!(engine.run(&bad).is_err());
    assert_eq!(engine.run(&good).unwrap().value, json!([1]));
}

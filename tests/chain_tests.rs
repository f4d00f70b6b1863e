//! Chain composition and execution, end to end.


use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rowchain::{json, start, ChainConfig, Compose, Engine, Node, Operation, Steps, Value};
use test_data_gen::{ints, len};

#[test]
fn identity_batches_reconstruct_the_sequence() {
    let input = ints(23);
    for n in [1, 2, 5, 22, 23, 24, 100] {
        let source = input.clone();
        let out = start(move || Ok(source.clone()))
            .map_batch_sized(Ok, n)
            .run()
            .unwrap();
        assert_eq!(out, input, "batch size {n}");
    }
}

#[test]
fn doubling_in_batches_of_three() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let out = start(|| Ok(ints(10)))
        .map_batch_sized(
            move |slice| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Array(
                    slice
                        .as_array()
                        .into_iter()
                        .flatten()
                        .map(|v| json!(v.as_i64().unwrap_or(0) * 2))
                        .collect(),
                ))
            },
            3,
        )
        .run()
        .unwrap();
    assert_eq!(out, json!([2, 4, 6, 8, 10, 12, 14, 16, 18, 20]));
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[test]
fn filter_is_idempotent() {
    let keep = |v: &Value| Ok(v.as_i64().is_some_and(|i| i % 3 != 0));
    let once = start(|| Ok(ints(20))).filter(keep).run().unwrap();
    let twice = start(|| Ok(ints(20))).filter(keep).filter(keep).run().unwrap();
    assert_eq!(once, twice);
    assert_eq!(len(&once), 14);
}

#[test]
fn merge_with_absent_input() {
    let out = start(|| Ok(Value::Null)).merge(|| Ok(json!(5))).run().unwrap();
    assert_eq!(out, json!([5]));
}

#[test]
fn merge_appends_after_previous_output() {
    let out = start(|| Ok(json!([1, 2])))
        .merge(|| Ok(json!([3])))
        .merge(|| Ok(json!("four")))
        .run()
        .unwrap();
    assert_eq!(out, json!([1, 2, 3, "four"]));
}

#[test]
fn map_one_on_a_single_record() {
    let out = start(|| Ok(json!({"a": 1})))
        .map_one(|v| Ok(json!(v["a"].as_i64().unwrap_or(0) + 1)))
        .run()
        .unwrap();
    assert_eq!(out, json!([2]));
}

#[test]
fn initializer_result_is_returned_verbatim() {
    let out = start(|| Ok(json!({"not": "a sequence"}))).run().unwrap();
    assert_eq!(out, json!({"not": "a sequence"}));
}

#[test]
fn steps_are_reusable_across_chains() {
    let normalise = Steps::new()
        .filter(|v| Ok(!v.is_null()))
        .map_one(|v| Ok(json!(v.as_i64().unwrap_or(0).abs())));

    let a = start(|| Ok(json!([-1, null, 2])))
        .extend(normalise.clone())
        .run()
        .unwrap();
    let b = start(|| Ok(json!([null, -7])))
        .extend(normalise)
        .map_batch(|v| Ok(json!(v.as_array().map_or(0, Vec::len))))
        .run()
        .unwrap();
    assert_eq!(a, json!([1, 2]));
    assert_eq!(b, json!(1));
}

#[test]
fn chains_can_be_run_repeatedly() {
    let produced = Arc::new(Mutex::new(0));
    let seen = Arc::clone(&produced);
    let chain = start(move || {
        let mut n = seen.lock().unwrap();
        *n += 1;
        Ok(json!([*n]))
    })
    .map_one(Ok);

    let engine = Engine::default();
    assert_eq!(engine.run(&chain).unwrap().value, json!([1]));
    assert_eq!(engine.run(&chain).unwrap().value, json!([2]));
    assert!(chain.nodes().iter().all(|n| !n.has_pending_input()));
}

#[test]
fn engine_default_batch_size_only_applies_to_undeclared_handlers() {
    let sizes = Arc::new(Mutex::new(Vec::new()));
    let declared = Arc::clone(&sizes);
    let undeclared = Arc::clone(&sizes);
    let chain = start(|| Ok(ints(6)))
        .map_batch(move |v| {
            undeclared.lock().unwrap().push(("default", len(&v)));
            Ok(v)
        })
        .map_batch_sized(
            move |v| {
                declared.lock().unwrap().push(("declared", len(&v)));
                Ok(v)
            },
            4,
        );
    let engine = Engine::new(ChainConfig::default().with_default_batch_size(5));
    let out = engine.run(&chain).unwrap();
    assert_eq!(out.value, ints(6));
    assert_eq!(
        *sizes.lock().unwrap(),
        vec![("default", 5), ("default", 1), ("declared", 4), ("declared", 2)]
    );
}

#[test]
fn manifest_describes_the_run() {
    let chain = start(|| Ok(ints(4)))
        .filter(|v| Ok(v.as_i64().is_some_and(|i| i > 1)))
        .map_batch(|v| Ok(json!(len(&v))));
    let out = Engine::default().run(&chain).unwrap();

    let ops: Vec<Operation> = out.manifest.steps.iter().map(|s| s.operation).collect();
    assert_eq!(
        ops,
        vec![Operation::Initialize, Operation::Filter, Operation::MapBatch]
    );
    assert_eq!(out.manifest.steps[1].input_rows, Some(4));
    assert_eq!(out.manifest.steps[1].output_rows, Some(3));
    assert_eq!(out.manifest.steps[2].output_rows, None);
    assert_eq!(out.value, json!(3));
    assert_eq!(out.manifest.plan_hash, chain.fingerprint().unwrap());

    let json = serde_json::to_value(&out.manifest).unwrap();
    assert_eq!(json["steps"][1]["operation"], json!("filter"));
}

#[test]
fn custom_nodes_can_be_appended() {
    let out = start(|| Ok(json!([1, 2])))
        .then(Node::merge(|| Ok(json!([3]))))
        .run()
        .unwrap();
    assert_eq!(out, json!([1, 2, 3]));
}

//! Counter and calculator application exercising the store end to end.
//!
//! Run with `RUST_LOG=debug` to see the logger middleware at work.

use serde_json::{json, Value};
use sluice::{
    apply_middleware, bind_action_creators, combine_reducers, create_store, logger, Action,
    ActionCreator, LeafReducer,
};
use std::sync::Arc;

fn counter() -> LeafReducer {
    LeafReducer::new(|state, action| {
        let count = state.and_then(Value::as_i64).unwrap_or(0);
        match action.action_type().as_str() {
            Some("INCREASE_COUNTER") => json!(count + 1),
            Some("DECREASE_COUNTER") => json!(count - 1),
            Some("RESET_COUNTER") => json!(0),
            _ => json!(count),
        }
    })
    .associate(["INCREASE_COUNTER", "DECREASE_COUNTER", "RESET_COUNTER"])
}

fn calculator() -> LeafReducer {
    LeafReducer::new(|state, action| {
        let total = state.and_then(Value::as_i64).unwrap_or(0);
        let payload = action.payload().and_then(Value::as_i64).unwrap_or(0);
        match action.action_type().as_str() {
            Some("PLUS_CALCULATOR") => json!(total + payload),
            Some("MINUS_CALCULATOR") => json!(total - payload),
            Some("RESET_CALCULATOR") => json!(0),
            _ => json!(total),
        }
    })
    .associate(["PLUS_CALCULATOR", "MINUS_CALCULATOR", "RESET_CALCULATOR"])
}

fn history() -> LeafReducer {
    LeafReducer::new(|state, action| {
        let mut entries = state.and_then(Value::as_array).cloned().unwrap_or_default();
        if action.action_type() == &"RECORD" {
            entries.push(action.payload().cloned().unwrap_or(Value::Null));
        }
        Value::Array(entries)
    })
    .associate("RECORD")
}

fn main() -> sluice::Result<()> {
    env_logger::init();

    println!("=== Counter Application ===\n");

    println!("1. Creating the store with logging middleware");
    let counter = counter();
    let store = create_store(
        combine_reducers([("counter", counter.clone()), ("calculator", calculator())]),
        Some(json!({ "counter": 5, "calculator": 0 })),
        Some(apply_middleware(vec![logger()])),
    )?;

    let _state_log = store.subscribe(|state| {
        println!("   [State] {state}");
    });

    let _counter_log = store
        .get_reducer_stream(&counter)
        .map(|stream| stream.subscribe(|count| println!("   [Counter] {count}")));

    println!("\n2. Routed dispatches");
    store.dispatch(Action::new("INCREASE_COUNTER"))?;
    store.dispatch(Action::new("PLUS_CALCULATOR").with("payload", 10))?;
    store.dispatch(Action::new("MINUS_CALCULATOR").with("payload", 5))?;

    println!("\n3. Unrouted dispatch reaches every reducer once");
    store.dispatch(Action::new("PING"))?;

    println!("\n4. Bound action creators");
    let plus: ActionCreator =
        Arc::new(|payload: Value| Action::new("PLUS_CALCULATOR").with("payload", payload));
    let reset: ActionCreator = Arc::new(|_: Value| Action::new("RESET_CALCULATOR"));
    let calculator_actions =
        bind_action_creators([("plus", plus), ("reset", reset)], store.dispatcher());
    calculator_actions["plus"](json!(32))?;
    calculator_actions["reset"](Value::Null)?;

    println!("\n5. Adding a reducer at runtime");
    store.add_reducer(combine_reducers([("history", history())]))?;
    store.dispatch(Action::new("RECORD").with("payload", "first"))?;
    store.dispatch(Action::new("RECORD").with("payload", "second"))?;

    println!("\n6. Dispatching raw JSON");
    store.dispatch_json(json!({ "type": "DECREASE_COUNTER" }))?;
    if let Err(err) = store.dispatch_json(json!({ "payload": 1 })) {
        println!("   rejected: {err}");
    }

    println!("\n=== Final State ===");
    println!("{:#}", store.get_state());

    Ok(())
}

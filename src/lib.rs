//! # Sluice
//!
//! A Redux-like state container where actions are routed straight to the
//! reducers that declared them.
//!
//! ## Reducers
//!
//! - `LeafReducer` - A pure `(state, action) -> state` function plus the
//!   action types it handles, attached with `associate_actions`
//! - `combine_reducers` - Named reducers, leaves or nested combinations,
//!   lifted into one snapshot stream with routing tables
//!
//! ## Store
//!
//! - `create_store` - Runs a combined reducer, caches the latest snapshot
//! - `Store::dispatch` - A routed action reaches only its reducer; any other
//!   action is broadcast to all of them
//! - `Store::add_reducer` / `Store::replace_reducer` - Extend or swap the
//!   reducer graph at runtime
//! - `apply_middleware` - Enhancer threading dispatch through middleware
//!
//! ## Streams (Low-level primitives)
//!
//! - `Subject<T>` - Multicast injection point
//! - `Stream<T>` - Cell holding its latest value, replayed on subscribe
//! - `runtime::batch` - Settles a group of pushes before combined streams emit

pub mod action;
pub mod compose;
pub mod error;
pub mod reducer;
pub mod runtime;
pub mod store;
pub mod stream;

// Re-export main types for convenience
pub use action::{Action, ActionType};
pub use compose::{compose, Composable};
pub use error::{Result, StoreError};
pub use reducer::{
    associate_actions, associated_actions, combine_reducers, has_associated_actions, ActionTable,
    Combination, CombinedReducer, DuplicateActionPolicy, IntoActionTypes, LeafReducer, Reducer,
    ReducerId, ReducerTable, State,
};
pub use store::{
    apply_middleware, bind_action_creator, bind_action_creators, create_store, logger,
    ActionCreator, BoundActionCreator, Dispatch, Enhancer, Middleware, MiddlewareApi, Store,
    StoreCreator,
};
pub use stream::{Stream, Subject, Subscription};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn it_works() {
        // Basic smoke test
        let counter = LeafReducer::new(|state, _| state.cloned().unwrap_or(json!(0))).associate("NOOP");
        let store = create_store(combine_reducers([("counter", counter)]), None, None).unwrap();
        assert_eq!(store.get_state(), json!({ "counter": 0 }));
    }
}

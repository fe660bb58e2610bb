//! Reducers and their composition into stream graphs.
//!
//! A reducer is either a leaf, a pure `(state, action) -> state` function
//! that declares the action types it handles, or a combination of named
//! reducers. Building a combination lifts every leaf into its own stream
//! and returns the routing tables the store dispatches through.

mod associate;
mod combine;
mod reducer;

pub use associate::{associate_actions, associated_actions, has_associated_actions, IntoActionTypes};
pub use combine::{combine_reducers, ActionTable, Combination, DuplicateActionPolicy, ReducerTable};
pub use reducer::{CombinedReducer, LeafReducer, ReduceFn, Reducer, ReducerId};

/// Snapshot type flowing through every reducer stream.
pub type State = serde_json::Value;

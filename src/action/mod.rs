//! Actions and the type identifiers reducers subscribe to.

mod action;

pub use action::{Action, ActionType};

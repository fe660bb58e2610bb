use super::store::Dispatch;
use crate::action::Action;
use crate::error::Result;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Builds an action from a payload.
pub type ActionCreator = Arc<dyn Fn(Value) -> Action + Send + Sync>;

/// An action creator that dispatches what it builds.
pub type BoundActionCreator = Arc<dyn Fn(Value) -> Result<Action> + Send + Sync>;

/// Wrap one action creator so that calling it dispatches the action.
pub fn bind_action_creator(creator: ActionCreator, dispatch: Dispatch) -> BoundActionCreator {
    Arc::new(move |payload| dispatch(creator(payload)))
}

/// Wrap named action creators, keeping their names and order.
///
/// # Examples
///
/// ```
/// use sluice::{bind_action_creators, combine_reducers, create_store, Action, ActionCreator, LeafReducer};
/// use serde_json::{json, Value};
/// use std::sync::Arc;
///
/// let calculator = LeafReducer::new(|state, action| {
///     let total = state.and_then(Value::as_i64).unwrap_or(0);
///     match action.action_type().as_str() {
///         Some("CALCULATOR_PLUS") => json!(total + action.payload().and_then(Value::as_i64).unwrap_or(0)),
///         _ => json!(total),
///     }
/// })
/// .associate("CALCULATOR_PLUS");
/// let store = create_store(combine_reducers([("calculator", calculator)]), None, None).unwrap();
///
/// let plus: ActionCreator = Arc::new(|payload: Value| Action::new("CALCULATOR_PLUS").with("payload", payload));
/// let bound = bind_action_creators([("plus", plus)], store.dispatcher());
///
/// bound["plus"](json!(50)).unwrap();
/// assert_eq!(store.get_state(), json!({ "calculator": 50 }));
/// ```
pub fn bind_action_creators<I, K>(creators: I, dispatch: Dispatch) -> IndexMap<String, BoundActionCreator>
where
    I: IntoIterator<Item = (K, ActionCreator)>,
    K: Into<String>,
{
    creators
        .into_iter()
        .map(|(name, creator)| (name.into(), bind_action_creator(creator, Arc::clone(&dispatch))))
        .collect()
}

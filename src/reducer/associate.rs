use super::reducer::LeafReducer;
use crate::action::ActionType;
use crate::error::{Result, StoreError};
use serde_json::Value;

/// One action type or a sequence of them.
pub trait IntoActionTypes {
    fn into_action_types(self) -> Vec<ActionType>;
}

macro_rules! single_action_type {
    ($($ty:ty),*) => {
        $(
            impl IntoActionTypes for $ty {
                fn into_action_types(self) -> Vec<ActionType> {
                    vec![ActionType::from(self)]
                }
            }
        )*
    };
}

single_action_type!(&str, String, i64, bool, ActionType);

impl IntoActionTypes for Value {
    fn into_action_types(self) -> Vec<ActionType> {
        match self {
            Value::Array(items) => items.into_iter().map(ActionType::from).collect(),
            other => vec![ActionType::from(other)],
        }
    }
}

impl<T: Into<ActionType>> IntoActionTypes for Vec<T> {
    fn into_action_types(self) -> Vec<ActionType> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<ActionType>, const N: usize> IntoActionTypes for [T; N] {
    fn into_action_types(self) -> Vec<ActionType> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<ActionType> + Clone> IntoActionTypes for &[T] {
    fn into_action_types(self) -> Vec<ActionType> {
        self.iter().cloned().map(Into::into).collect()
    }
}

impl LeafReducer {
    /// Declare the action types this reducer handles.
    ///
    /// Replaces any earlier association. Repeated types are kept once, in
    /// first-seen order. The reducer keeps its identity.
    pub fn associate(mut self, actions: impl IntoActionTypes) -> Self {
        let mut associated: Vec<ActionType> = Vec::new();
        for action_type in actions.into_action_types() {
            if !associated.contains(&action_type) {
                associated.push(action_type);
            }
        }
        self.associated = associated;
        self
    }
}

/// Attach action types to a reducer and hand the same reducer back.
///
/// # Examples
///
/// ```
/// use sluice::{associate_actions, associated_actions, LeafReducer};
/// use serde_json::json;
///
/// let counter = associate_actions(
///     LeafReducer::new(|state, _| state.cloned().unwrap_or(json!(0))),
///     ["COUNTER_INCREASE", "COUNTER_RESET"],
/// );
/// let types = associated_actions(&counter).unwrap();
/// assert_eq!(types.len(), 2);
/// ```
pub fn associate_actions(reducer: LeafReducer, actions: impl IntoActionTypes) -> LeafReducer {
    reducer.associate(actions)
}

/// True when the reducer declares at least one action type.
pub fn has_associated_actions(reducer: &LeafReducer) -> bool {
    !reducer.associated.is_empty()
}

/// The action types a reducer declared, in declaration order.
///
/// Fails with [`StoreError::NotAssociated`] when there are none.
pub fn associated_actions(reducer: &LeafReducer) -> Result<&[ActionType]> {
    if reducer.associated.is_empty() {
        return Err(StoreError::NotAssociated);
    }
    Ok(&reducer.associated)
}

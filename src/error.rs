//! Error type shared by every fallible store operation.

use crate::action::ActionType;
use thiserror::Error;

/// Errors raised while building reducer graphs or dispatching actions.
///
/// Every failure is synchronous and reported to the caller that caused it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// A leaf reducer was used where a combined reducer is required.
    #[error("Expected the reducer to be a combined reducer. Wrap leaf reducers with `combine_reducers` first.")]
    NotCombined,

    /// A leaf reducer inside a combination carries no associated actions.
    #[error("Reducer for key \"{key}\" has no associated actions and is not a combined reducer.")]
    UnassociatedReducer { key: String },

    /// Two reducers in one graph claim the same action type.
    #[error("Action type {action_type} is already routed to another reducer.")]
    DuplicateActionType { action_type: ActionType },

    /// Associated actions were requested from a reducer without any.
    #[error("Reducer has no associated actions.")]
    NotAssociated,

    #[error("Actions must be plain objects. Use custom middleware for async actions.")]
    NotPlainObject,

    #[error("Actions may not have an undefined \"type\" property. Have you misspelled a constant?")]
    UndefinedActionType,

    #[error("Preloaded state must be an object.")]
    InvalidPreloadedState,

    #[error("Dispatching while constructing your middleware is not allowed. Other middleware would not be applied to this dispatch.")]
    DispatchDuringConstruction,

    /// The store that owned a middleware chain has been dropped.
    #[error("The store behind this dispatch function no longer exists.")]
    DispatchUnavailable,
}

pub type Result<T> = std::result::Result<T, StoreError>;

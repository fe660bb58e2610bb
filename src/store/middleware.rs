//! Middleware: wrappers around dispatch.
//!
//! ```text
//! dispatch(action) -> middleware 1 -> ... -> middleware n -> store dispatch
//! ```
//!
//! Each middleware is called once, when the store is built, with a
//! [`MiddlewareApi`]. It returns a function that takes the next dispatch in
//! the chain and returns its own.

use super::store::{Dispatch, Enhancer, Store, StoreCreator};
use crate::action::Action;
use crate::compose::{compose, Composable};
use crate::error::{Result, StoreError};
use crate::reducer::{Reducer, State};
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

/// Middleware factory. Failing here fails store construction.
pub type Middleware = Arc<dyn Fn(&MiddlewareApi) -> Result<Composable<Dispatch>> + Send + Sync>;

/// What middleware can reach of the store being built.
#[derive(Clone)]
pub struct MiddlewareApi {
    store: Store,
    dispatch: Weak<RwLock<Dispatch>>,
}

impl MiddlewareApi {
    pub fn get_state(&self) -> State {
        self.store.get_state()
    }

    /// Dispatch through the whole chain, from the outermost middleware.
    ///
    /// Fails with [`StoreError::DispatchDuringConstruction`] until every
    /// middleware has been set up.
    pub fn dispatch(&self, action: Action) -> Result<Action> {
        let cell = self.dispatch.upgrade().ok_or(StoreError::DispatchUnavailable)?;
        let dispatch = cell.read().clone();
        dispatch(action)
    }
}

/// Build an enhancer that runs every dispatch through `middlewares`.
///
/// The first middleware is the outermost one.
///
/// # Examples
///
/// ```
/// use sluice::{apply_middleware, combine_reducers, create_store, logger, Action, LeafReducer};
/// use serde_json::json;
///
/// let flag = LeafReducer::new(|state, action| match action.action_type().as_str() {
///     Some("FLAG_SET") => json!(true),
///     _ => state.cloned().unwrap_or(json!(false)),
/// })
/// .associate("FLAG_SET");
///
/// let store = create_store(
///     combine_reducers([("flag", flag)]),
///     None,
///     Some(apply_middleware(vec![logger()])),
/// )
/// .unwrap();
///
/// store.dispatch(Action::new("FLAG_SET")).unwrap();
/// assert_eq!(store.get_state(), json!({ "flag": true }));
/// ```
pub fn apply_middleware(middlewares: Vec<Middleware>) -> Enhancer {
    let middlewares = Arc::new(middlewares);

    Arc::new(move |create: StoreCreator| -> StoreCreator {
        let middlewares = Arc::clone(&middlewares);

        Arc::new(move |reducer: Reducer, preloaded: Option<State>| -> Result<Store> {
            let store = create(reducer, preloaded)?;

            let unwired: Dispatch = Arc::new(|_| Err(StoreError::DispatchDuringConstruction));
            let cell = Arc::new(RwLock::new(unwired));

            let api = MiddlewareApi {
                store: store.clone(),
                dispatch: Arc::downgrade(&cell),
            };

            let chain = middlewares
                .iter()
                .map(|middleware| middleware(&api))
                .collect::<Result<Vec<_>>>()?;

            *cell.write() = compose(chain)(store.dispatcher());

            let dispatch: Dispatch = Arc::new(move |action| {
                let dispatch = cell.read().clone();
                dispatch(action)
            });

            log::debug!("wired {} middleware", middlewares.len());
            Ok(store.with_dispatch(dispatch))
        })
    })
}

/// Middleware that logs every action at `debug` and the resulting state at
/// `trace`.
pub fn logger() -> Middleware {
    Arc::new(|api: &MiddlewareApi| {
        let api = api.clone();

        let wrap: Composable<Dispatch> = Box::new(move |next: Dispatch| -> Dispatch {
            let api = api.clone();

            Arc::new(move |action: Action| {
                log::debug!("action: {}", action.action_type());
                let result = next(action);
                match &result {
                    Ok(_) => log::trace!("state: {}", api.get_state()),
                    Err(err) => log::debug!("dispatch failed: {err}"),
                }
                result
            })
        });

        Ok(wrap)
    })
}

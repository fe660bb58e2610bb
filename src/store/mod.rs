//! Stores, enhancers and middleware.
//!
//! A store runs a combined reducer graph, caches the latest snapshot and
//! exposes dispatch. Enhancers wrap construction; [`apply_middleware`] is
//! the enhancer that threads dispatch through a middleware chain.

mod bind;
mod middleware;
mod store;

pub use bind::{bind_action_creator, bind_action_creators, ActionCreator, BoundActionCreator};
pub use middleware::{apply_middleware, logger, Middleware, MiddlewareApi};
pub use store::{create_store, Dispatch, Enhancer, Store, StoreCreator};

//! Runtime support for the stream graph.
//!
//! This module hands out ids for graph nodes and owns the per-thread
//! propagation context that lets a batch of pushes settle before combined
//! streams emit.

mod context;

pub use context::{batch, is_batching, next_id};
pub(crate) use context::schedule;

//! Synchronous push streams.
//!
//! This module provides the cell graph the reducers are lifted into:
//! - Subjects: multicast injection points without memory
//! - Streams: cells holding their latest value, replayed on subscribe
//! - Subscriptions: RAII handles that detach an observer

mod stream;
mod subject;
mod subscription;

pub use stream::Stream;
pub use subject::Subject;
pub use subscription::Subscription;

use super::stream::Stream;
use super::subscription::{Detach, Observers, Subscription};
use crate::runtime;
use std::sync::Arc;

struct SubjectInner<T> {
    id: usize,
    observers: Observers<T>,
}

impl<T: Send + Sync + 'static> Detach for SubjectInner<T> {
    fn detach(&self, observer_id: usize) {
        self.observers.remove(observer_id);
    }
}

/// A multicast injection point.
///
/// Values pushed with [`next`](Subject::next) reach every current observer.
/// Nothing is remembered, so late subscribers only see later values.
pub struct Subject<T> {
    inner: Arc<SubjectInner<T>>,
}

impl<T: Send + Sync + 'static> Subject<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SubjectInner {
                id: runtime::next_id(),
                observers: Observers::new(),
            }),
        }
    }

    /// Get the subject's unique ID.
    pub fn id(&self) -> usize {
        self.inner.id
    }

    /// Push a value to every observer.
    pub fn next(&self, value: &T) {
        self.inner.observers.notify(value);
    }

    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let observer_id = self.inner.observers.add(Arc::new(observer));
        let source = Arc::downgrade(&self.inner);
        Subscription::new(observer_id, source)
    }

    /// Fold every pushed value into a stream that starts at `seed`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sluice::Subject;
    ///
    /// let deltas = Subject::<i64>::new();
    /// let total = deltas.scan(10, |total, delta| total + delta);
    ///
    /// deltas.next(&5);
    /// deltas.next(&-3);
    /// assert_eq!(total.get(), Some(12));
    /// ```
    pub fn scan<S, F>(&self, seed: S, fold: F) -> Stream<S>
    where
        S: Clone + Send + Sync + 'static,
        F: Fn(&S, &T) -> S + Send + Sync + 'static,
    {
        let output = Stream::with_height(Some(seed), 1);
        let target = output.clone();

        let guard = self.subscribe(move |item| {
            let Some(next) = target.with(|current| current.map(|state| fold(state, item))) else {
                return;
            };
            target.emit(next);
        });

        output.attach(guard);
        output
    }

    /// Number of observers currently attached.
    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }
}

impl<T: Send + Sync + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subject").field("id", &self.inner.id).finish()
    }
}

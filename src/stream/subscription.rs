use crate::runtime;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

pub(crate) type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Anything observers can be detached from.
pub(crate) trait Detach: Send + Sync {
    fn detach(&self, observer_id: usize);
}

/// Observer list shared by subjects and streams.
pub(crate) struct Observers<T> {
    list: RwLock<Vec<(usize, Observer<T>)>>,
}

impl<T> Observers<T> {
    pub(crate) fn new() -> Self {
        Self {
            list: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn add(&self, observer: Observer<T>) -> usize {
        let id = runtime::next_id();
        self.list.write().push((id, observer));
        id
    }

    pub(crate) fn remove(&self, observer_id: usize) {
        self.list.write().retain(|(id, _)| *id != observer_id);
    }

    pub(crate) fn len(&self) -> usize {
        self.list.read().len()
    }

    /// Call every observer registered at the time of the call.
    ///
    /// The list lock is released first so observers may subscribe or
    /// unsubscribe while being notified.
    pub(crate) fn notify(&self, value: &T) {
        let observers: Vec<Observer<T>> = self
            .list
            .read()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in observers {
            observer(value);
        }
    }
}

/// RAII handle for an observer attached to a [`Subject`](super::Subject) or
/// [`Stream`](super::Stream).
///
/// The observer is detached when the handle is dropped or
/// [`unsubscribe`](Subscription::unsubscribe) is called.
#[must_use = "dropping a Subscription detaches its observer"]
pub struct Subscription {
    observer_id: usize,
    source: Weak<dyn Detach>,
}

impl Subscription {
    pub(crate) fn new(observer_id: usize, source: Weak<dyn Detach>) -> Self {
        Self {
            observer_id,
            source,
        }
    }

    /// Detach the observer now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(source) = self.source.upgrade() {
            source.detach(self.observer_id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("observer_id", &self.observer_id)
            .field("active", &(self.source.strong_count() > 0))
            .finish()
    }
}

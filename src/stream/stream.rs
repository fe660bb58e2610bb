use super::subscription::{Detach, Observers, Subscription};
use crate::runtime;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

struct StreamInner<T> {
    id: usize,
    height: usize,
    value: RwLock<Option<T>>,
    observers: Observers<T>,
    // Keeps the edges from upstream nodes alive for as long as this node is.
    upstream: Mutex<Vec<Subscription>>,
}

impl<T: Send + Sync + 'static> Detach for StreamInner<T> {
    fn detach(&self, observer_id: usize) {
        self.observers.remove(observer_id);
    }
}

/// A hot stream cell that remembers its latest value.
///
/// Subscribing replays the latest value synchronously before any later
/// emission, so a new subscriber always starts from the current state.
pub struct Stream<T> {
    inner: Arc<StreamInner<T>>,
}

impl<T: Clone + Send + Sync + 'static> Stream<T> {
    /// Create a source cell holding `initial`.
    pub fn new(initial: T) -> Self {
        Self::with_height(Some(initial), 0)
    }

    pub(crate) fn with_height(initial: Option<T>, height: usize) -> Self {
        Self {
            inner: Arc::new(StreamInner {
                id: runtime::next_id(),
                height,
                value: RwLock::new(initial),
                observers: Observers::new(),
                upstream: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Get the stream's unique ID.
    pub fn id(&self) -> usize {
        self.inner.id
    }

    /// Distance from the sources of the graph.
    pub fn height(&self) -> usize {
        self.inner.height
    }

    /// Get a clone of the latest value, if any was emitted yet.
    pub fn get(&self) -> Option<T> {
        self.inner.value.read().clone()
    }

    /// Read the latest value with a function without cloning.
    pub fn with<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        let value = self.inner.value.read();
        f(value.as_ref())
    }

    /// Push a new value into the cell and notify observers.
    pub fn set(&self, value: T) {
        self.emit(value);
    }

    pub(crate) fn emit(&self, value: T) {
        *self.inner.value.write() = Some(value.clone());
        self.inner.observers.notify(&value);
    }

    pub(crate) fn attach(&self, guard: Subscription) {
        self.inner.upstream.lock().push(guard);
    }

    /// Subscribe to the stream.
    ///
    /// The observer is called immediately with the latest value, then with
    /// every later emission until the returned handle is dropped.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let observer = Arc::new(observer);
        let observer_id = self.inner.observers.add(observer.clone());
        let source = Arc::downgrade(&self.inner);
        let subscription = Subscription::new(observer_id, source);

        if let Some(current) = self.get() {
            observer(&current);
        }

        subscription
    }

    /// Create a derived stream by applying a function to every value.
    pub fn map<U, F>(&self, f: F) -> Stream<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let output = Stream::with_height(None, self.height() + 1);
        let target = output.clone();

        let guard = self.subscribe(move |value| target.emit(f(value)));

        output.attach(guard);
        output
    }

    /// Combine the latest values of several streams.
    ///
    /// The result emits once every input has a value, and again whenever any
    /// input emits. Inside a [`batch`](crate::runtime::batch) the emissions of
    /// one batch are coalesced into a single one. Combining no streams at all
    /// yields `project(&[])` once.
    ///
    /// # Examples
    ///
    /// ```
    /// use sluice::Stream;
    ///
    /// let width = Stream::new(3);
    /// let height = Stream::new(4);
    /// let area = Stream::combine_latest(&[width.clone(), height], |sides| sides[0] * sides[1]);
    /// assert_eq!(area.get(), Some(12));
    ///
    /// width.set(5);
    /// assert_eq!(area.get(), Some(20));
    /// ```
    pub fn combine_latest<U, F>(streams: &[Stream<T>], project: F) -> Stream<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(&[T]) -> U + Send + Sync + 'static,
    {
        let height = streams.iter().map(Stream::height).max().unwrap_or(0) + 1;
        let output = Stream::with_height(None, height);

        let combiner = Arc::new(Combiner {
            slots: Mutex::new(vec![None; streams.len()]),
            project: Box::new(project),
            output: output.clone(),
            wired: std::sync::atomic::AtomicBool::new(false),
        });

        for (index, stream) in streams.iter().enumerate() {
            let combiner = Arc::clone(&combiner);
            let guard = stream.subscribe(move |value| combiner.receive(index, value));
            output.attach(guard);
        }

        combiner
            .wired
            .store(true, std::sync::atomic::Ordering::SeqCst);
        if let Some(initial) = combiner.current() {
            output.emit(initial);
        }

        output
    }

    /// Number of observers currently attached.
    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("id", &self.inner.id)
            .field("height", &self.inner.height)
            .finish()
    }
}

/// Latest-value combination behind [`Stream::combine_latest`].
struct Combiner<T, U> {
    slots: Mutex<Vec<Option<T>>>,
    project: Box<dyn Fn(&[T]) -> U + Send + Sync>,
    output: Stream<U>,
    // Replays during construction only fill the slots.
    wired: std::sync::atomic::AtomicBool,
}

impl<T, U> Combiner<T, U>
where
    T: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    fn receive(self: &Arc<Self>, index: usize, value: &T) {
        self.slots.lock()[index] = Some(value.clone());

        if !self.wired.load(std::sync::atomic::Ordering::SeqCst) {
            return;
        }

        if runtime::is_batching() {
            let combiner = Arc::clone(self);
            runtime::schedule(self.output.height(), self.output.id(), move || {
                combiner.flush()
            });
        } else {
            self.flush();
        }
    }

    fn current(&self) -> Option<U> {
        let values: Option<Vec<T>> = self.slots.lock().iter().cloned().collect();
        values.map(|values| (self.project)(&values))
    }

    fn flush(&self) {
        if let Some(combined) = self.current() {
            log::trace!("stream {} emits combined value", self.output.id());
            self.output.emit(combined);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::batch;
    use crate::stream::Subject;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn subscribe_replays_latest_value() {
        let stream = Stream::new(1);
        stream.set(2);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = stream.subscribe(move |v| sink.lock().push(*v));

        stream.set(3);
        assert_eq!(*seen.lock(), vec![2, 3]);
    }

    #[test]
    fn map_follows_source() {
        let source = Stream::new(2);
        let doubled = source.map(|v| v * 2);
        assert_eq!(doubled.get(), Some(4));
        assert_eq!(doubled.height(), 1);

        source.set(5);
        assert_eq!(doubled.get(), Some(10));
    }

    #[test]
    fn combine_waits_for_every_input() {
        let subject = Subject::<i32>::new();
        let pending = subject.scan(0, |_, v| *v).map(|v| *v);
        let ready = Stream::new(1);

        // `pending` has a value through scan's seed, so use a bare cell
        // without one to check the wait.
        let empty: Stream<i32> = Stream::with_height(None, 0);
        let combined = Stream::combine_latest(&[ready.clone(), empty.clone()], |v| v.to_vec());
        assert_eq!(combined.get(), None);

        empty.set(7);
        assert_eq!(combined.get(), Some(vec![1, 7]));

        let with_scan = Stream::combine_latest(&[pending, ready], |v| v.to_vec());
        subject.next(&4);
        assert_eq!(with_scan.get(), Some(vec![4, 1]));
    }

    #[test]
    fn combine_of_nothing_emits_once() {
        let combined = Stream::<i32>::combine_latest(&[], |values| values.len());
        assert_eq!(combined.get(), Some(0));
    }

    #[test]
    fn batch_coalesces_nested_combinations() {
        let a = Subject::<i32>::new();
        let b = Subject::<i32>::new();
        let c = Subject::<i32>::new();

        let inner = Stream::combine_latest(
            &[a.scan(0, |s, v| s + v), b.scan(0, |s, v| s + v)],
            |v| v.iter().sum::<i32>(),
        );
        let outer = Stream::combine_latest(&[c.scan(0, |s, v| s + v), inner], |v| v.to_vec());
        assert!(outer.height() > 2);

        let emissions = Arc::new(AtomicUsize::new(0));
        let counter = emissions.clone();
        let _sub = outer.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(emissions.load(Ordering::SeqCst), 1);

        // Push the outer input first so a naive flush would emit early.
        batch(|| {
            c.next(&1);
            a.next(&2);
            b.next(&3);
        });

        assert_eq!(emissions.load(Ordering::SeqCst), 2);
        assert_eq!(outer.get(), Some(vec![1, 5]));
    }

    #[test]
    fn derived_nodes_stop_after_unsubscribe() {
        let source = Stream::new(0);
        let sub = source.subscribe(|_| {});
        assert_eq!(source.observer_count(), 1);
        drop(sub);
        assert_eq!(source.observer_count(), 0);
    }
}

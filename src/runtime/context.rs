use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

type Job = Box<dyn FnOnce()>;

/// Propagation state for the current thread.
struct PropagationContext {
    depth: usize,
    // Deferred emissions keyed by (height, node id) so that upstream nodes
    // always flush before the nodes that combine them.
    pending: BTreeMap<(usize, usize), Job>,
}

impl PropagationContext {
    fn new() -> Self {
        Self {
            depth: 0,
            pending: BTreeMap::new(),
        }
    }
}

thread_local! {
    static CONTEXT: RefCell<PropagationContext> = RefCell::new(PropagationContext::new());
}

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// Generate the next unique ID for a graph node, observer or reducer.
pub fn next_id() -> usize {
    NEXT_ID.fetch_add(1, Ordering::SeqCst)
}

/// Returns true while the current thread is inside [`batch`].
pub fn is_batching() -> bool {
    CONTEXT.with(|ctx| ctx.borrow().depth > 0)
}

/// Run `f` as one propagation batch.
///
/// Combined streams touched inside the batch emit once, after `f` returns,
/// in topological order. Nested batches join the outermost one.
///
/// # Examples
///
/// ```
/// use sluice::runtime::batch;
/// use sluice::{Stream, Subject};
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
///
/// let left = Subject::<i64>::new();
/// let right = Subject::<i64>::new();
/// let a = left.scan(0, |sum, n| sum + n);
/// let b = right.scan(0, |sum, n| sum + n);
/// let total = Stream::combine_latest(&[a, b], |values| values.iter().sum::<i64>());
///
/// let emissions = Arc::new(AtomicUsize::new(0));
/// let counter = emissions.clone();
/// let _sub = total.subscribe(move |_| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// batch(|| {
///     left.next(&1);
///     right.next(&2);
/// });
///
/// // One replay on subscribe, one emission for the whole batch.
/// assert_eq!(emissions.load(Ordering::SeqCst), 2);
/// assert_eq!(total.get(), Some(3));
/// ```
pub fn batch<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    CONTEXT.with(|ctx| ctx.borrow_mut().depth += 1);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let result = f();
        flush();
        result
    }));

    CONTEXT.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        ctx.depth -= 1;
        if ctx.depth == 0 {
            // Only non-empty after a panic.
            ctx.pending.clear();
        }
    });

    match result {
        Ok(r) => r,
        Err(e) => std::panic::resume_unwind(e),
    }
}

/// Queue a deferred emission for the node `(height, id)`.
///
/// Returns false when the node is already queued.
pub(crate) fn schedule<F>(height: usize, id: usize, job: F) -> bool
where
    F: FnOnce() + 'static,
{
    CONTEXT.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        if ctx.pending.contains_key(&(height, id)) {
            return false;
        }
        ctx.pending.insert((height, id), Box::new(job));
        true
    })
}

/// Drain the queue. Only the outermost batch flushes; jobs run while the
/// batch is still open so that anything they trigger is queued too.
fn flush() {
    loop {
        let job = CONTEXT.with(|ctx| {
            let mut ctx = ctx.borrow_mut();
            if ctx.depth > 1 {
                return None;
            }
            ctx.pending.pop_first()
        });

        match job {
            Some(((height, id), job)) => {
                log::trace!("flushing node {id} at height {height}");
                job();
            }
            None => break,
        }
    }
}

use crate::action::Action;
use crate::error::{Result, StoreError};
use crate::reducer::{ActionTable, CombinedReducer, Combination, Reducer, ReducerId, ReducerTable, State};
use crate::runtime;
use crate::stream::{Stream, Subject, Subscription};
use parking_lot::{ReentrantMutex, RwLock};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

/// A dispatch function: takes an action, returns it once handled.
pub type Dispatch = Arc<dyn Fn(Action) -> Result<Action> + Send + Sync>;

/// Constructor with the shape of [`create_store`] minus the enhancer.
pub type StoreCreator = Arc<dyn Fn(Reducer, Option<State>) -> Result<Store> + Send + Sync>;

/// Higher-order wrapper around store construction.
pub type Enhancer = Arc<dyn Fn(StoreCreator) -> StoreCreator + Send + Sync>;

/// The reducer graph a store currently runs on.
struct Graph {
    stream: Stream<State>,
    actions: ActionTable,
    reducers: ReducerTable,
    // The store's own update callback. Exactly one at a time.
    subscription: Option<Subscription>,
}

struct StoreCore {
    state: Arc<RwLock<State>>,
    graph: RwLock<Graph>,
    // Serializes dispatches and graph changes; reentrant so middleware and
    // subscribers may dispatch from inside a dispatch.
    gate: ReentrantMutex<()>,
}

/// A state container driven by a reducer graph.
///
/// Cloning a store is cheap; clones share state and graph.
///
/// # Examples
///
/// ```
/// use sluice::{combine_reducers, create_store, Action, LeafReducer};
/// use serde_json::{json, Value};
///
/// let calculator = LeafReducer::new(|state, action| {
///     let total = state.and_then(Value::as_i64).unwrap_or(0);
///     let payload = action.payload().and_then(Value::as_i64).unwrap_or(0);
///     match action.action_type().as_str() {
///         Some("CALCULATOR_PLUS") => json!(total + payload),
///         _ => json!(total),
///     }
/// })
/// .associate("CALCULATOR_PLUS");
///
/// let store = create_store(combine_reducers([("calculator", calculator)]), None, None).unwrap();
/// store.dispatch(Action::new("CALCULATOR_PLUS").with("payload", 50)).unwrap();
/// assert_eq!(store.get_state(), json!({ "calculator": 50 }));
/// ```
#[derive(Clone)]
pub struct Store {
    core: Arc<StoreCore>,
    dispatch: Dispatch,
}

/// Create a store from a combined reducer.
///
/// With an enhancer, construction is handed over entirely:
/// `enhancer(create_store)(reducer, preloaded)`.
pub fn create_store(
    reducer: impl Into<Reducer>,
    preloaded: Option<State>,
    enhancer: Option<Enhancer>,
) -> Result<Store> {
    let reducer = reducer.into();

    if let Some(enhancer) = enhancer {
        let base: StoreCreator =
            Arc::new(|reducer: Reducer, preloaded: Option<State>| create_store(reducer, preloaded, None));
        return enhancer(base)(reducer, preloaded);
    }

    let Reducer::Combined(root) = reducer else {
        return Err(StoreError::NotCombined);
    };

    Store::new(&root, preloaded)
}

fn into_object(preloaded: Option<State>) -> Result<State> {
    match preloaded {
        None => Ok(Value::Object(Map::new())),
        Some(state @ Value::Object(_)) => Ok(state),
        Some(_) => Err(StoreError::InvalidPreloadedState),
    }
}

fn into_combined(reducer: Reducer) -> Result<CombinedReducer> {
    match reducer {
        Reducer::Combined(combined) => Ok(combined),
        Reducer::Leaf(_) => Err(StoreError::NotCombined),
    }
}

/// Subscribe the cache to `stream`.
///
/// The cached object takes the snapshot's keys in reducer order, followed by
/// preloaded keys no reducer covers.
fn attach_cache(stream: &Stream<State>, state: &Arc<RwLock<State>>) -> Subscription {
    let state = Arc::clone(state);
    stream.subscribe(move |snapshot| {
        let mut current = state.write();
        match (&mut *current, snapshot) {
            (Value::Object(current), Value::Object(snapshot)) => {
                let previous = std::mem::take(current);
                let mut merged = snapshot.clone();
                for (key, value) in previous {
                    merged.entry(key).or_insert(value);
                }
                *current = merged;
            }
            (current, snapshot) => *current = snapshot.clone(),
        }
    })
}

/// Object-wise merge of snapshots. Later values win; a key keeps the
/// position it first appeared at.
fn merge_snapshots(states: &[State]) -> State {
    let mut merged = Map::new();
    for state in states {
        if let Value::Object(object) = state {
            for (key, value) in object {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    Value::Object(merged)
}

impl StoreCore {
    fn dispatch(&self, action: Action) -> Result<Action> {
        let _gate = self.gate.lock();

        let targets: Vec<Subject<Action>> = {
            let graph = self.graph.read();
            match graph.actions.get(action.action_type()) {
                Some(injector) => {
                    log::debug!("dispatch {} to its reducer", action.action_type());
                    vec![injector.clone()]
                }
                None => {
                    let mut seen = HashSet::new();
                    let injectors: Vec<Subject<Action>> = graph
                        .actions
                        .values()
                        .filter(|injector| seen.insert(injector.id()))
                        .cloned()
                        .collect();
                    log::debug!(
                        "dispatch unrouted {} to all {} reducers",
                        action.action_type(),
                        injectors.len()
                    );
                    injectors
                }
            }
        };

        runtime::batch(|| {
            for injector in &targets {
                injector.next(&action);
            }
        });

        Ok(action)
    }
}

impl Store {
    fn new(root: &CombinedReducer, preloaded: Option<State>) -> Result<Self> {
        let initial = into_object(preloaded)?;
        let Combination {
            stream,
            actions,
            reducers,
        } = root.build(Some(&initial))?;

        let state = Arc::new(RwLock::new(initial));
        let subscription = attach_cache(&stream, &state);

        let core = Arc::new(StoreCore {
            state,
            graph: RwLock::new(Graph {
                stream,
                actions,
                reducers,
                subscription: Some(subscription),
            }),
            gate: ReentrantMutex::new(()),
        });

        let target = Arc::clone(&core);
        let dispatch: Dispatch = Arc::new(move |action| target.dispatch(action));

        log::debug!("created store for combination {:?}", root.id());
        Ok(Self { core, dispatch })
    }

    /// Get a clone of the current state.
    pub fn get_state(&self) -> State {
        self.core.state.read().clone()
    }

    /// Read state with a function without cloning.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&State) -> R,
    {
        let state = self.core.state.read();
        f(&state)
    }

    /// Dispatch an action.
    ///
    /// A routed type reaches only its reducer. Any other type is broadcast
    /// to every reducer once. Subscribers see one new snapshot either way.
    pub fn dispatch(&self, action: Action) -> Result<Action> {
        (self.dispatch)(action)
    }

    /// Validate a JSON action, then dispatch it.
    ///
    /// Fails with [`StoreError::NotPlainObject`] for non-objects and with
    /// [`StoreError::UndefinedActionType`] when `type` is missing.
    pub fn dispatch_json(&self, action: Value) -> Result<Action> {
        let action = Action::try_from(action)?;
        self.dispatch(action)
    }

    /// The store's dispatch function, including any middleware.
    pub fn dispatcher(&self) -> Dispatch {
        Arc::clone(&self.dispatch)
    }

    /// A store sharing this one's state and graph but dispatching through
    /// `dispatch`. Used by enhancers.
    pub fn with_dispatch(&self, dispatch: Dispatch) -> Store {
        Store {
            core: Arc::clone(&self.core),
            dispatch,
        }
    }

    /// Subscribe to state changes.
    ///
    /// The listener is called right away with the current snapshot, then
    /// once per dispatch.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&State) + Send + Sync + 'static,
    {
        // Replay and live emissions must not interleave with a dispatch
        // running on another thread.
        let _gate = self.core.gate.lock();
        let stream = self.core.graph.read().stream.clone();
        stream.subscribe(listener)
    }

    /// Stream of a single reducer's state, if the reducer is part of the
    /// current graph.
    ///
    /// Any reducer identity may be passed; combined reducers and reducers
    /// outside the graph yield `None`.
    pub fn get_reducer_stream(&self, reducer: impl Into<ReducerId>) -> Option<Stream<State>> {
        self.core.graph.read().reducers.get(&reducer.into()).cloned()
    }

    /// Extend the graph with another combination.
    ///
    /// The new reducers start from the current state where it has their
    /// keys. Existing keys keep their values.
    pub fn add_reducer(&self, next: impl Into<Reducer>) -> Result<()> {
        let next = into_combined(next.into())?;
        let _gate = self.core.gate.lock();

        let current = self.get_state();
        let Combination {
            stream: next_stream,
            actions: next_actions,
            reducers: next_reducers,
        } = next.build(Some(&current))?;

        let mut graph = self.core.graph.write();

        let mut actions = graph.actions.clone();
        for (action_type, injector) in next_actions {
            next.duplicate_policy().route(&mut actions, action_type, injector)?;
        }

        let stream = Stream::combine_latest(&[graph.stream.clone(), next_stream], merge_snapshots);

        graph.subscription.take();
        graph.subscription = Some(attach_cache(&stream, &self.core.state));
        graph.stream = stream;
        graph.actions = actions;
        graph.reducers.extend(next_reducers);

        log::debug!("added combination {:?} to store", next.id());
        Ok(())
    }

    /// Swap the whole graph for `next`, starting over from `preloaded`
    /// (empty when `None`). Nothing of the previous state survives.
    pub fn replace_reducer(&self, next: impl Into<Reducer>, preloaded: Option<State>) -> Result<()> {
        let next = into_combined(next.into())?;
        let initial = into_object(preloaded)?;
        let _gate = self.core.gate.lock();

        let Combination {
            stream,
            actions,
            reducers,
        } = next.build(Some(&initial))?;

        let mut graph = self.core.graph.write();

        graph.subscription.take();
        *self.core.state.write() = initial;
        graph.subscription = Some(attach_cache(&stream, &self.core.state));
        graph.stream = stream;
        graph.actions = actions;
        graph.reducers = reducers;

        log::debug!("replaced store graph with combination {:?}", next.id());
        Ok(())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let graph = self.core.graph.read();
        f.debug_struct("Store")
            .field("state", &*self.core.state.read())
            .field("routed_action_types", &graph.actions.len())
            .field("reducers", &graph.reducers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::{combine_reducers, LeafReducer};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> LeafReducer {
        LeafReducer::new(|state, action| {
            let count = state.and_then(Value::as_i64).unwrap_or(0);
            match action.action_type().as_str() {
                Some("COUNTER_INCREASE") => json!(count + 1),
                _ => json!(count),
            }
        })
        .associate("COUNTER_INCREASE")
    }

    #[test]
    fn store_get_state() {
        let store = create_store(combine_reducers([("counter", counter())]), None, None).unwrap();
        assert_eq!(store.get_state(), json!({ "counter": 0 }));
        assert_eq!(store.read(|state| state["counter"].as_i64()), Some(0));
    }

    #[test]
    fn store_rejects_leaf_reducers() {
        assert_eq!(create_store(counter(), None, None).err(), Some(StoreError::NotCombined));
    }

    #[test]
    fn store_rejects_non_object_preload() {
        let root = combine_reducers([("counter", counter())]);
        assert_eq!(
            create_store(root, Some(json!(3)), None).err(),
            Some(StoreError::InvalidPreloadedState)
        );
    }

    #[test]
    fn store_subscribe_counts_dispatches() {
        let store = create_store(combine_reducers([("counter", counter())]), None, None).unwrap();

        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();
        let _sub = store.subscribe(move |_state| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        // Replay on subscribe.
        assert_eq!(call_count.load(Ordering::SeqCst), 1);

        store.dispatch(Action::new("COUNTER_INCREASE")).unwrap();
        assert_eq!(call_count.load(Ordering::SeqCst), 2);

        store.dispatch(Action::new("UNKNOWN")).unwrap();
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn store_keeps_one_internal_subscription() {
        let store = create_store(combine_reducers([("counter", counter())]), None, None).unwrap();
        let first = store.core.graph.read().stream.clone();
        assert_eq!(first.observer_count(), 1);

        store
            .replace_reducer(combine_reducers([("other", counter())]), None)
            .unwrap();
        assert_eq!(first.observer_count(), 0);
        assert_eq!(store.core.graph.read().stream.observer_count(), 1);
    }

    #[test]
    fn late_subscribers_never_see_stale_replays() {
        let store = create_store(combine_reducers([("counter", counter())]), None, None).unwrap();

        let writer = {
            let store = store.clone();
            std::thread::spawn(move || {
                for _ in 0..200 {
                    store.dispatch(Action::new("COUNTER_INCREASE")).unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
                        let sink = seen.clone();
                        let sub = store.subscribe(move |state| {
                            sink.lock().push(state["counter"].as_i64().unwrap_or(-1));
                        });
                        std::thread::yield_now();
                        drop(sub);

                        let seen = seen.lock();
                        assert!(seen.windows(2).all(|pair| pair[0] < pair[1]), "{seen:?}");
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(store.get_state(), json!({ "counter": 200 }));
    }

    #[test]
    fn reducers_may_dispatch_from_subscribers() {
        let store = create_store(combine_reducers([("counter", counter())]), None, None).unwrap();
        let inner = store.clone();
        let _sub = store.subscribe(move |state| {
            if state["counter"] == json!(1) {
                inner.dispatch(Action::new("COUNTER_INCREASE")).unwrap();
            }
        });

        store.dispatch(Action::new("COUNTER_INCREASE")).unwrap();
        assert_eq!(store.get_state(), json!({ "counter": 2 }));
    }
}

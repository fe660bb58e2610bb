use super::combine::DuplicateActionPolicy;
use super::State;
use crate::action::{Action, ActionType};
use crate::runtime;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

pub type ReduceFn = Arc<dyn Fn(Option<&State>, &Action) -> State + Send + Sync>;

/// Identity of a reducer, stable across clones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReducerId(usize);

impl ReducerId {
    fn next() -> Self {
        Self(runtime::next_id())
    }
}

impl From<&LeafReducer> for ReducerId {
    fn from(reducer: &LeafReducer) -> Self {
        reducer.id
    }
}

impl From<&CombinedReducer> for ReducerId {
    fn from(reducer: &CombinedReducer) -> Self {
        reducer.id
    }
}

impl From<&Reducer> for ReducerId {
    fn from(reducer: &Reducer) -> Self {
        reducer.id()
    }
}

/// A pure state transition function plus the action types routed to it.
#[derive(Clone)]
pub struct LeafReducer {
    pub(super) id: ReducerId,
    reduce: ReduceFn,
    pub(super) associated: Vec<ActionType>,
}

impl LeafReducer {
    /// Wrap a reducer function.
    ///
    /// The function receives `None` once, together with [`Action::init`],
    /// and must return its default state.
    pub fn new<F>(reduce: F) -> Self
    where
        F: Fn(Option<&State>, &Action) -> State + Send + Sync + 'static,
    {
        Self {
            id: ReducerId::next(),
            reduce: Arc::new(reduce),
            associated: Vec::new(),
        }
    }

    pub fn id(&self) -> ReducerId {
        self.id
    }

    pub fn reduce(&self, state: Option<&State>, action: &Action) -> State {
        (self.reduce)(state, action)
    }

    /// The state the reducer starts from when nothing is preloaded.
    pub fn default_state(&self) -> State {
        self.reduce(None, &Action::init())
    }
}

impl fmt::Debug for LeafReducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafReducer")
            .field("id", &self.id)
            .field("associated", &self.associated)
            .finish()
    }
}

/// Named reducers combined into one snapshot, produced by
/// [`combine_reducers`](super::combine_reducers).
#[derive(Clone)]
pub struct CombinedReducer {
    pub(super) id: ReducerId,
    pub(super) entries: Arc<IndexMap<String, Reducer>>,
    pub(super) on_duplicate: DuplicateActionPolicy,
}

impl CombinedReducer {
    pub(super) fn new(entries: IndexMap<String, Reducer>) -> Self {
        Self {
            id: ReducerId::next(),
            entries: Arc::new(entries),
            on_duplicate: DuplicateActionPolicy::default(),
        }
    }

    pub fn id(&self) -> ReducerId {
        self.id
    }

    /// Keys in the order their states appear in the snapshot.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Choose what happens when two reducers in this combination claim the
    /// same action type.
    pub fn on_duplicate(mut self, policy: DuplicateActionPolicy) -> Self {
        self.on_duplicate = policy;
        self
    }

    pub fn duplicate_policy(&self) -> DuplicateActionPolicy {
        self.on_duplicate
    }
}

impl fmt::Debug for CombinedReducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedReducer")
            .field("id", &self.id)
            .field("entries", &self.entries)
            .field("on_duplicate", &self.on_duplicate)
            .finish()
    }
}

/// Either kind of reducer.
#[derive(Clone, Debug)]
pub enum Reducer {
    Leaf(LeafReducer),
    Combined(CombinedReducer),
}

impl Reducer {
    pub fn id(&self) -> ReducerId {
        match self {
            Reducer::Leaf(leaf) => leaf.id(),
            Reducer::Combined(combined) => combined.id(),
        }
    }

    pub fn is_combined(&self) -> bool {
        matches!(self, Reducer::Combined(_))
    }
}

impl PartialEq for Reducer {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl From<LeafReducer> for Reducer {
    fn from(leaf: LeafReducer) -> Self {
        Reducer::Leaf(leaf)
    }
}

impl From<CombinedReducer> for Reducer {
    fn from(combined: CombinedReducer) -> Self {
        Reducer::Combined(combined)
    }
}

impl From<&LeafReducer> for Reducer {
    fn from(leaf: &LeafReducer) -> Self {
        Reducer::Leaf(leaf.clone())
    }
}

impl From<&CombinedReducer> for Reducer {
    fn from(combined: &CombinedReducer) -> Self {
        Reducer::Combined(combined.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_state_comes_from_init() {
        let reducer = LeafReducer::new(|state, action| match state {
            None if action.is_init() => json!("default"),
            None => json!("wrong"),
            Some(state) => state.clone(),
        });

        assert_eq!(reducer.default_state(), json!("default"));
    }

    #[test]
    fn identity_survives_clones() {
        let leaf = LeafReducer::new(|_, _| json!(0));
        let a: Reducer = leaf.clone().into();
        let b: Reducer = (&leaf).into();
        let other: Reducer = LeafReducer::new(|_, _| json!(0)).into();

        assert_eq!(a, b);
        assert_ne!(a, other);
        assert!(!a.is_combined());
    }
}

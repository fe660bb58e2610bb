use super::associate::associated_actions;
use super::reducer::{CombinedReducer, Reducer, ReducerId};
use super::State;
use crate::action::{Action, ActionType};
use crate::error::{Result, StoreError};
use crate::stream::{Stream, Subject};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Action type to the injector of the one reducer that handles it.
pub type ActionTable = IndexMap<ActionType, Subject<Action>>;

/// Reducer identity to the stream of that reducer's state.
pub type ReducerTable = IndexMap<ReducerId, Stream<State>>;

/// What to do when a second reducer claims an already routed action type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateActionPolicy {
    /// The later reducer takes the route over. A warning is logged.
    #[default]
    Overwrite,
    /// Building fails with [`StoreError::DuplicateActionType`].
    Reject,
}

impl DuplicateActionPolicy {
    /// Insert `action_type -> injector` into `table` under this policy.
    pub(crate) fn route(
        self,
        table: &mut ActionTable,
        action_type: ActionType,
        injector: Subject<Action>,
    ) -> Result<()> {
        if let Some(existing) = table.get(&action_type) {
            if existing.id() != injector.id() {
                match self {
                    DuplicateActionPolicy::Reject => {
                        return Err(StoreError::DuplicateActionType { action_type });
                    }
                    DuplicateActionPolicy::Overwrite => {
                        log::warn!(
                            "action type {action_type} is claimed by more than one reducer; \
                             only the last one will receive it"
                        );
                    }
                }
            }
        }

        table.insert(action_type, injector);
        Ok(())
    }
}

/// Output of building a [`CombinedReducer`].
pub struct Combination {
    /// Snapshot stream, one key per entry of the combination.
    pub stream: Stream<State>,
    pub actions: ActionTable,
    pub reducers: ReducerTable,
}

impl Combination {
    pub fn into_parts(self) -> (Stream<State>, ActionTable, ReducerTable) {
        (self.stream, self.actions, self.reducers)
    }
}

/// Combine named reducers into one.
///
/// Entries keep their insertion order in every snapshot. Values may be leaf
/// reducers with associated actions or other combinations.
///
/// # Examples
///
/// ```
/// use sluice::{combine_reducers, Action, ActionType, LeafReducer};
/// use serde_json::json;
///
/// let counter = LeafReducer::new(|state, action| {
///     let count = state.and_then(|s| s.as_i64()).unwrap_or(0);
///     match action.action_type().as_str() {
///         Some("COUNTER_INCREASE") => json!(count + 1),
///         _ => json!(count),
///     }
/// })
/// .associate("COUNTER_INCREASE");
///
/// let root = combine_reducers([("counter", counter)]);
/// let combination = root.build(None).unwrap();
/// assert_eq!(combination.stream.get(), Some(json!({ "counter": 0 })));
///
/// let injector = &combination.actions[&ActionType::from("COUNTER_INCREASE")];
/// injector.next(&Action::new("COUNTER_INCREASE"));
/// assert_eq!(combination.stream.get(), Some(json!({ "counter": 1 })));
/// ```
pub fn combine_reducers<I, K, R>(entries: I) -> CombinedReducer
where
    I: IntoIterator<Item = (K, R)>,
    K: Into<String>,
    R: Into<Reducer>,
{
    let entries: IndexMap<String, Reducer> = entries
        .into_iter()
        .map(|(key, reducer)| (key.into(), reducer.into()))
        .collect();

    CombinedReducer::new(entries)
}

impl CombinedReducer {
    /// Lift every reducer into a stream and collect the routing tables.
    ///
    /// `preloaded` is read per key: a present, non-null value replaces a
    /// leaf's default state and is handed down to nested combinations.
    pub fn build(&self, preloaded: Option<&State>) -> Result<Combination> {
        let mut actions = ActionTable::new();
        let mut reducers = ReducerTable::new();
        let mut keys = Vec::with_capacity(self.entries.len());
        let mut streams = Vec::with_capacity(self.entries.len());

        for (key, reducer) in self.entries.iter() {
            let preload = preloaded
                .and_then(|state| state.get(key))
                .filter(|value| !value.is_null());

            let stream = match reducer {
                Reducer::Leaf(leaf) => {
                    let associated = associated_actions(leaf)
                        .map_err(|_| StoreError::UnassociatedReducer { key: key.clone() })?;

                    let injector = Subject::<Action>::new();
                    let initial = match preload {
                        Some(value) => value.clone(),
                        None => leaf.default_state(),
                    };

                    let reduce = leaf.clone();
                    let stream = injector
                        .scan(initial, move |state, action| reduce.reduce(Some(state), action));

                    for action_type in associated {
                        self.on_duplicate
                            .route(&mut actions, action_type.clone(), injector.clone())?;
                    }
                    reducers.insert(leaf.id(), stream.clone());
                    stream
                }
                Reducer::Combined(nested) => {
                    let Combination {
                        stream,
                        actions: nested_actions,
                        reducers: nested_reducers,
                    } = nested.build(preload)?;

                    for (action_type, injector) in nested_actions {
                        self.on_duplicate.route(&mut actions, action_type, injector)?;
                    }
                    reducers.extend(nested_reducers);
                    stream
                }
            };

            keys.push(key.clone());
            streams.push(stream);
        }

        log::debug!(
            "built combination {:?}: {} keys, {} routed action types",
            self.id,
            keys.len(),
            actions.len()
        );

        let stream = Stream::combine_latest(&streams, move |states| {
            let snapshot: Map<String, Value> = keys.iter().cloned().zip(states.iter().cloned()).collect();
            Value::Object(snapshot)
        });

        Ok(Combination {
            stream,
            actions,
            reducers,
        })
    }
}

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier an action is routed by.
///
/// Any JSON value is a valid type, falsy ones included: `false`, `0`,
/// `null` and `""` are four distinct types. Only a missing `type` is
/// rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionType(Value);

impl ActionType {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }
}

impl Hash for ActionType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_value(&self.0, state);
    }
}

/// Hash a JSON value consistently with `Value`'s equality: object keys are
/// visited in sorted order and `-0.0` hashes like `0.0`.
fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => 0_u8.hash(state),
        Value::Bool(flag) => {
            1_u8.hash(state);
            flag.hash(state);
        }
        Value::Number(number) => {
            2_u8.hash(state);
            match number.as_f64().filter(|_| number.is_f64()) {
                Some(float) if float == 0.0 => 0.0_f64.to_bits().hash(state),
                Some(float) => float.to_bits().hash(state),
                None => number.to_string().hash(state),
            }
        }
        Value::String(text) => {
            3_u8.hash(state);
            text.hash(state);
        }
        Value::Array(items) => {
            4_u8.hash(state);
            items.len().hash(state);
            for item in items {
                hash_value(item, state);
            }
        }
        Value::Object(object) => {
            5_u8.hash(state);
            object.len().hash(state);
            let mut entries: Vec<(&String, &Value)> = object.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            for (key, item) in entries {
                key.hash(state);
                hash_value(item, state);
            }
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Value> for ActionType {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<&str> for ActionType {
    fn from(value: &str) -> Self {
        Self(Value::from(value))
    }
}

impl From<String> for ActionType {
    fn from(value: String) -> Self {
        Self(Value::from(value))
    }
}

impl From<i64> for ActionType {
    fn from(value: i64) -> Self {
        Self(Value::from(value))
    }
}

impl From<bool> for ActionType {
    fn from(value: bool) -> Self {
        Self(Value::from(value))
    }
}

impl PartialEq<&str> for ActionType {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_str() == Some(*other)
    }
}

/// A plain JSON object with a mandatory `type`.
///
/// # Examples
///
/// ```
/// use sluice::Action;
/// use serde_json::json;
///
/// let action = Action::new("CALCULATOR_PLUS").with("payload", 10);
/// assert_eq!(action.action_type(), &"CALCULATOR_PLUS");
/// assert_eq!(action.payload(), Some(&json!(10)));
///
/// let parsed = Action::try_from(json!({ "type": "CALCULATOR_PLUS", "payload": 10 })).unwrap();
/// assert_eq!(parsed, action);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Action {
    action_type: ActionType,
    fields: Map<String, Value>,
}

impl Action {
    /// Type of the action every leaf reducer receives once, with no state,
    /// to produce its default.
    pub const INIT: &'static str = "@@sluice/INIT";

    pub fn new(action_type: impl Into<ActionType>) -> Self {
        Self {
            action_type: action_type.into(),
            fields: Map::new(),
        }
    }

    /// The bootstrap action used to ask reducers for their default state.
    pub fn init() -> Self {
        Self::new(Self::INIT)
    }

    /// Add a field, replacing any previous one with the same name.
    ///
    /// Setting `type` is ignored; the type is fixed at construction.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != "type" {
            self.fields.insert(key, value.into());
        }
        self
    }

    pub fn action_type(&self) -> &ActionType {
        &self.action_type
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Shorthand for the conventional `payload` field.
    pub fn payload(&self) -> Option<&Value> {
        self.get("payload")
    }

    pub fn is_init(&self) -> bool {
        self.action_type == Self::INIT
    }
}

impl TryFrom<Value> for Action {
    type Error = StoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut fields) = value else {
            return Err(StoreError::NotPlainObject);
        };

        let action_type = fields
            .remove("type")
            .ok_or(StoreError::UndefinedActionType)?;

        Ok(Self {
            action_type: ActionType(action_type),
            fields,
        })
    }
}

impl From<Action> for Value {
    fn from(action: Action) -> Self {
        let mut object = action.fields;
        object.insert("type".to_string(), action.action_type.0);
        Value::Object(object)
    }
}

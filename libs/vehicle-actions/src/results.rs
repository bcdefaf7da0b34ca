//! Per-element action results

use std::collections::BTreeMap;

use errors::{ErrorCode, ValResult};
use serde::Serialize;
use vehicle_bus::Value;

use crate::elements::GLOBAL_ELEMENT;
use crate::temperature::Temperature;

/// Value presented to callers after category-level transforms
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ActionValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    IntArray(Vec<i32>),
    Temperature(Temperature),
}

impl From<Value> for ActionValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(v) => Self::Bool(v),
            Value::Int(v) => Self::Int(v),
            Value::Float(v) => Self::Float(v),
            Value::IntArray(v) => Self::IntArray(v),
        }
    }
}

impl From<Temperature> for ActionValue {
    fn from(value: Temperature) -> Self {
        Self::Temperature(value)
    }
}

impl std::fmt::Display for ActionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::IntArray(v) => write!(f, "{:?}", v),
            Self::Temperature(t) => write!(f, "{}", t),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetResult<T> {
    pub action: String,
    pub values: BTreeMap<String, ValResult<T>>,
}

impl<T> GetResult<T> {
    pub fn new(action: impl Into<String>, values: BTreeMap<String, ValResult<T>>) -> Self {
        Self {
            action: action.into(),
            values,
        }
    }

    pub fn map<U>(self, mut transform: impl FnMut(&str, T) -> U) -> GetResult<U> {
        let values = self
            .values
            .into_iter()
            .map(|(element, outcome)| {
                let outcome = outcome.map(|v| transform(&element, v));
                (element, outcome)
            })
            .collect();
        GetResult {
            action: self.action,
            values,
        }
    }

    /// Collapse onto the single global element
    pub fn into_global(mut self) -> GlobalGetResult<T> {
        let value = self
            .values
            .remove(GLOBAL_ELEMENT)
            .unwrap_or(Err(ErrorCode::BadValImpl));
        GlobalGetResult {
            action: self.action,
            value,
        }
    }
}

/// Only failed elements are listed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SetResult {
    pub action: String,
    pub errors: BTreeMap<String, ErrorCode>,
}

impl SetResult {
    pub fn new(action: impl Into<String>, errors: BTreeMap<String, ErrorCode>) -> Self {
        Self {
            action: action.into(),
            errors,
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_global(mut self) -> GlobalSetResult {
        GlobalSetResult {
            action: self.action,
            error: self.errors.remove(GLOBAL_ELEMENT),
        }
    }
}

/// Output value (or error) per element after applying an offset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OffsetResult<T> {
    pub action: String,
    pub outputs: BTreeMap<String, ValResult<T>>,
}

impl<T> OffsetResult<T> {
    pub fn new(action: impl Into<String>, outputs: BTreeMap<String, ValResult<T>>) -> Self {
        Self {
            action: action.into(),
            outputs,
        }
    }

    pub fn map<U>(self, mut transform: impl FnMut(T) -> U) -> OffsetResult<U> {
        OffsetResult {
            action: self.action,
            outputs: self
                .outputs
                .into_iter()
                .map(|(element, outcome)| (element, outcome.map(&mut transform)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalGetResult<T> {
    pub action: String,
    pub value: ValResult<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalSetResult {
    pub action: String,
    pub error: Option<ErrorCode>,
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_global_collapse() {
        let mut values = BTreeMap::new();
        values.insert(GLOBAL_ELEMENT.to_string(), Ok(1));
        let result = GetResult::new("A", values).map(|_, v| v == 1).into_global();
        assert_eq!(result.value, Ok(true));

        let result = SetResult::new("B", BTreeMap::new()).into_global();
        assert_eq!(result.error, None);
    }

    #[test]
    fn test_serialization() {
        let mut errors = BTreeMap::new();
        errors.insert("SEAT_ROW_1_LEFT".to_string(), ErrorCode::ValueAlreadySet);
        let json = serde_json::to_value(SetResult::new("SET", errors)).unwrap();
        assert_eq!(json["errors"]["SEAT_ROW_1_LEFT"], "VALUE_ALREADY_SET");

        let value = serde_json::to_value(ActionValue::from(Value::Int(3))).unwrap();
        assert_eq!(value, serde_json::json!(3));
    }
}

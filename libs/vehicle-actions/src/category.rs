//! Action categories
//!
//! A category is a named table of actions. Callers address actions by name
//! through typed executors; [`ActionCategory::operations`] lists the table so
//! a dispatcher can enumerate it without knowing the concrete actions.
//!
//! Every executor comes in two flavours: `*_blocking` runs on the caller's
//! thread, the async one runs the same work on the blocking thread pool since
//! confirmed writes park the thread until the bus answers.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use errors::{ErrorCode, ValResult};
use serde::Serialize;
use tokio::task;
use tracing::{debug, error, warn};
use vehicle_bus::{Value, ValueType};

use crate::action::{Action, GetAction, SetAction};
use crate::offset::{OffsetAction, OffsetRequest};
use crate::results::{ActionValue, GetResult, OffsetResult, SetResult};
use crate::temperature::{Temperature, TemperatureUnit};
use crate::value_range::ValueRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Get,
    Set,
    Offset,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Offset => "offset",
        };
        f.write_str(name)
    }
}

/// One row of a category's operation table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationDescriptor {
    pub name: String,
    pub kind: ActionKind,
    pub value_type: ValueType,
    /// Takes and returns [`Temperature`] values
    pub temperature: bool,
}

pub enum ActionHandle {
    Get(GetAction),
    Set(SetAction),
    Offset(OffsetAction),
}

impl ActionHandle {
    pub fn action(&self) -> &Action {
        match self {
            Self::Get(a) => a.action(),
            Self::Set(a) => a.action(),
            Self::Offset(a) => a.action(),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Get(_) => ActionKind::Get,
            Self::Set(_) => ActionKind::Set,
            Self::Offset(_) => ActionKind::Offset,
        }
    }

    pub fn descriptor(&self) -> OperationDescriptor {
        let action = self.action();
        OperationDescriptor {
            name: action.name().to_string(),
            kind: self.kind(),
            value_type: action.value_type(),
            temperature: action.is_temperature(),
        }
    }

    fn wrong_kind(&self, expected: ActionKind) -> ErrorCode {
        error!(
            action = %self.action().name(),
            expected = %expected,
            actual = %self.kind(),
            "Action invoked with the wrong operation"
        );
        ErrorCode::BadValImpl
    }

    fn as_get(&self) -> ValResult<&GetAction> {
        match self {
            Self::Get(a) => Ok(a),
            _ => Err(self.wrong_kind(ActionKind::Get)),
        }
    }

    fn as_set(&self) -> ValResult<&SetAction> {
        match self {
            Self::Set(a) => Ok(a),
            _ => Err(self.wrong_kind(ActionKind::Set)),
        }
    }

    fn as_offset(&self) -> ValResult<&OffsetAction> {
        match self {
            Self::Offset(a) => Ok(a),
            _ => Err(self.wrong_kind(ActionKind::Offset)),
        }
    }

    pub fn get(&self, elements: &BTreeSet<String>) -> ValResult<GetResult<Value>> {
        self.as_get()?.get(elements)
    }

    pub fn get_temperature(
        &self,
        elements: &BTreeSet<String>,
        unit: Option<TemperatureUnit>,
    ) -> ValResult<GetResult<Temperature>> {
        self.as_get()?.get_temperature(elements, unit)
    }

    /// Set after dropping elements that cannot hold `value`
    pub fn set(&self, elements: &BTreeSet<String>, value: &Value) -> ValResult<SetResult> {
        let set = self.as_set()?;
        let action = set.action();
        action.check_elements(elements)?;

        let mut errors = BTreeMap::new();
        let mut to_update = BTreeSet::new();
        for element in elements {
            match action.does_element_support_value(element, value) {
                Ok(true) => {
                    to_update.insert(element.clone());
                },
                Ok(false) => {
                    warn!(action = %action.name(), element = %element, value = %value, "Value not supported");
                    errors.insert(element.clone(), ErrorCode::ValueNotSupported);
                },
                Err(code) => {
                    warn!(action = %action.name(), element = %element, code = %code, "Support check failed");
                    errors.insert(element.clone(), code);
                },
            }
        }

        if !to_update.is_empty() {
            errors.extend(set.set(&to_update, value)?.errors);
        }
        Ok(SetResult::new(action.name(), errors))
    }

    pub fn set_temperature(
        &self,
        elements: &BTreeSet<String>,
        temperature: Temperature,
        round_to_nearest: bool,
    ) -> ValResult<SetResult> {
        self.as_set()?
            .set_temperature(elements, temperature, round_to_nearest)
    }

    pub fn apply_offset(&self, request: &OffsetRequest) -> ValResult<OffsetResult<ActionValue>> {
        self.as_offset()?.apply_offset(request)
    }
}

/// Named table of actions
pub struct ActionCategory {
    name: String,
    actions: BTreeMap<String, Arc<ActionHandle>>,
}

impl ActionCategory {
    /// Empty tables and duplicate action names are rejected
    pub fn new(name: impl Into<String>, handles: Vec<ActionHandle>) -> ValResult<Self> {
        let name = name.into();
        let mut actions = BTreeMap::new();
        for handle in handles {
            let action_name = handle.action().name().to_string();
            if actions.insert(action_name.clone(), Arc::new(handle)).is_some() {
                error!(category = %name, action = %action_name, "Duplicate action");
                return Err(ErrorCode::BadValImpl);
            }
        }
        if actions.is_empty() {
            return Err(ErrorCode::BadValImpl);
        }
        debug!(category = %name, actions = actions.len(), "Built action category");
        Ok(Self { name, actions })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operations(&self) -> Vec<OperationDescriptor> {
        self.actions.values().map(|h| h.descriptor()).collect()
    }

    pub fn contains(&self, action: &str) -> bool {
        self.actions.contains_key(action)
    }

    pub fn handle(&self, action: &str) -> ValResult<&Arc<ActionHandle>> {
        self.actions.get(action).ok_or_else(|| {
            warn!(category = %self.name, action, "Unknown action");
            ErrorCode::InvalidApiArgument
        })
    }

    pub fn is_action_supported(&self, action: &str) -> ValResult<bool> {
        self.handle(action)?.action().is_supported()
    }

    pub fn supported_elements(&self, action: &str) -> ValResult<BTreeSet<String>> {
        self.handle(action)?.action().supported_elements()
    }

    pub fn element_ranges(&self, action: &str) -> ValResult<BTreeMap<String, ValueRange>> {
        self.handle(action)?.action().element_ranges()
    }

    // ========================================================================
    // Blocking executors
    // ========================================================================

    pub fn get_blocking(&self, action: &str, elements: &BTreeSet<String>) -> ValResult<GetResult<Value>> {
        self.handle(action)?.get(elements)
    }

    pub fn get_temperature_blocking(
        &self,
        action: &str,
        elements: &BTreeSet<String>,
        unit: Option<TemperatureUnit>,
    ) -> ValResult<GetResult<Temperature>> {
        self.handle(action)?.get_temperature(elements, unit)
    }

    pub fn set_blocking(
        &self,
        action: &str,
        elements: &BTreeSet<String>,
        value: &Value,
    ) -> ValResult<SetResult> {
        self.handle(action)?.set(elements, value)
    }

    pub fn set_temperature_blocking(
        &self,
        action: &str,
        elements: &BTreeSet<String>,
        temperature: Temperature,
        round_to_nearest: bool,
    ) -> ValResult<SetResult> {
        self.handle(action)?
            .set_temperature(elements, temperature, round_to_nearest)
    }

    pub fn offset_blocking(
        &self,
        action: &str,
        request: &OffsetRequest,
    ) -> ValResult<OffsetResult<ActionValue>> {
        self.handle(action)?.apply_offset(request)
    }

    // ========================================================================
    // Async executors
    // ========================================================================

    async fn run<T, F>(&self, action: &str, work: F) -> ValResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&ActionHandle) -> ValResult<T> + Send + 'static,
    {
        let handle = Arc::clone(self.handle(action)?);
        task::spawn_blocking(move || work(&handle))
            .await
            .map_err(|e| {
                error!(category = %self.name, action, "Action task failed: {}", e);
                ErrorCode::PlatformInternalError
            })?
    }

    pub async fn get(&self, action: &str, elements: BTreeSet<String>) -> ValResult<GetResult<Value>> {
        self.run(action, move |h| h.get(&elements)).await
    }

    pub async fn get_temperature(
        &self,
        action: &str,
        elements: BTreeSet<String>,
        unit: Option<TemperatureUnit>,
    ) -> ValResult<GetResult<Temperature>> {
        self.run(action, move |h| h.get_temperature(&elements, unit))
            .await
    }

    pub async fn set(&self, action: &str, elements: BTreeSet<String>, value: Value) -> ValResult<SetResult> {
        self.run(action, move |h| h.set(&elements, &value)).await
    }

    pub async fn set_temperature(
        &self,
        action: &str,
        elements: BTreeSet<String>,
        temperature: Temperature,
        round_to_nearest: bool,
    ) -> ValResult<SetResult> {
        self.run(action, move |h| {
            h.set_temperature(&elements, temperature, round_to_nearest)
        })
        .await
    }

    pub async fn apply_offset(
        &self,
        action: &str,
        request: OffsetRequest,
    ) -> ValResult<OffsetResult<ActionValue>> {
        self.run(action, move |h| h.apply_offset(&request)).await
    }
}

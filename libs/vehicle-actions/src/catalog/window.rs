//! Window actions
//!
//! `WINDOW_POS` is signed: positive values open the window, negative values
//! tilt it into the vent position.

use std::collections::BTreeSet;

use errors::{ErrorCode, ValResult};
use tracing::warn;
use vehicle_bus::ids::{self, window};
use vehicle_bus::{SignalId, Value, ValueType};

use crate::action::{ActionContext, ActionDef, GetAction, SetAction};
use crate::category::{ActionCategory, ActionHandle};
use crate::elements::ElementMap;
use crate::generators::RangeGenerator;
use crate::params::ActionParams;
use crate::permission::{PERMISSION_CONTROL_CAR_CLIMATE, PERMISSION_CONTROL_CAR_WINDOWS};
use crate::results::{GetResult, SetResult};

pub const CATEGORY: &str = "windows";

pub const WINDOW_FRONT_WINDSHIELD: &str = "WINDOW_FRONT_WINDSHIELD";
pub const WINDOW_REAR_WINDSHIELD: &str = "WINDOW_REAR_WINDSHIELD";
pub const WINDOW_ROW_1_LEFT: &str = "WINDOW_ROW_1_LEFT";
pub const WINDOW_ROW_1_RIGHT: &str = "WINDOW_ROW_1_RIGHT";
pub const WINDOW_ROW_2_LEFT: &str = "WINDOW_ROW_2_LEFT";
pub const WINDOW_ROW_2_RIGHT: &str = "WINDOW_ROW_2_RIGHT";
pub const WINDOW_ROW_3_LEFT: &str = "WINDOW_ROW_3_LEFT";
pub const WINDOW_ROW_3_RIGHT: &str = "WINDOW_ROW_3_RIGHT";
pub const WINDOW_ROOF_TOP_1: &str = "WINDOW_ROOF_TOP_1";
pub const WINDOW_ROOF_TOP_2: &str = "WINDOW_ROOF_TOP_2";

pub const WINDOW_ACTION_IS_OPEN: &str = "WINDOW_ACTION_IS_OPEN";
pub const WINDOW_ACTION_CLOSE: &str = "WINDOW_ACTION_CLOSE";
pub const WINDOW_ACTION_GET_OPEN_POSITION: &str = "WINDOW_ACTION_GET_OPEN_POSITION";
pub const WINDOW_ACTION_SET_OPEN_POSITION: &str = "WINDOW_ACTION_SET_OPEN_POSITION";
pub const WINDOW_ACTION_GET_VENT_POSITION: &str = "WINDOW_ACTION_GET_VENT_POSITION";
pub const WINDOW_ACTION_SET_VENT_POSITION: &str = "WINDOW_ACTION_SET_VENT_POSITION";
pub const WINDOW_ACTION_IS_CHILD_LOCKED: &str = "WINDOW_ACTION_IS_CHILD_LOCKED";
pub const WINDOW_ACTION_ENABLE_CHILD_LOCK: &str = "WINDOW_ACTION_ENABLE_CHILD_LOCK";
pub const WINDOW_ACTION_DISABLE_CHILD_LOCK: &str = "WINDOW_ACTION_DISABLE_CHILD_LOCK";
pub const WINDOW_ACTION_IS_HVAC_DEFROSTER_ENABLED: &str = "WINDOW_ACTION_IS_HVAC_DEFROSTER_ENABLED";
pub const WINDOW_ACTION_ENABLE_HVAC_DEFROSTER: &str = "WINDOW_ACTION_ENABLE_HVAC_DEFROSTER";
pub const WINDOW_ACTION_DISABLE_HVAC_DEFROSTER: &str = "WINDOW_ACTION_DISABLE_HVAC_DEFROSTER";
pub const WINDOW_ACTION_IS_ELECTRIC_DEFROSTER_ENABLED: &str =
    "WINDOW_ACTION_IS_ELECTRIC_DEFROSTER_ENABLED";
pub const WINDOW_ACTION_ENABLE_ELECTRIC_DEFROSTER: &str = "WINDOW_ACTION_ENABLE_ELECTRIC_DEFROSTER";
pub const WINDOW_ACTION_DISABLE_ELECTRIC_DEFROSTER: &str =
    "WINDOW_ACTION_DISABLE_ELECTRIC_DEFROSTER";

pub fn window_elements() -> ValResult<ElementMap> {
    ElementMap::new([
        (WINDOW_FRONT_WINDSHIELD, window::FRONT_WINDSHIELD),
        (WINDOW_REAR_WINDSHIELD, window::REAR_WINDSHIELD),
        (WINDOW_ROW_1_LEFT, window::ROW_1_LEFT),
        (WINDOW_ROW_1_RIGHT, window::ROW_1_RIGHT),
        (WINDOW_ROW_2_LEFT, window::ROW_2_LEFT),
        (WINDOW_ROW_2_RIGHT, window::ROW_2_RIGHT),
        (WINDOW_ROW_3_LEFT, window::ROW_3_LEFT),
        (WINDOW_ROW_3_RIGHT, window::ROW_3_RIGHT),
        (WINDOW_ROOF_TOP_1, window::ROOF_TOP_1),
        (WINDOW_ROOF_TOP_2, window::ROOF_TOP_2),
    ])
}

pub fn build_category(ctx: &ActionContext) -> ValResult<ActionCategory> {
    let windows = window_elements()?;
    let def = |name: &str, signal: SignalId, value_type: ValueType, permission: &str| {
        ActionDef::new(name, signal, value_type, permission, windows.clone())
    };
    let position = |name: &str| def(name, ids::WINDOW_POS, ValueType::Int32, PERMISSION_CONTROL_CAR_WINDOWS);
    // Fully closed is 0 and must be reachable
    let closed = || ActionParams::new().min_max().require([Value::Int(0)]);

    let mut handles = vec![
        ActionHandle::Get(GetAction::new(
            ctx.clone(),
            position(WINDOW_ACTION_IS_OPEN).with_params(closed()),
        )?),
        ActionHandle::Set(SetAction::new(
            ctx.clone(),
            position(WINDOW_ACTION_CLOSE).with_params(closed()),
        )?),
    ];

    for (get, set, range) in [
        (
            WINDOW_ACTION_GET_OPEN_POSITION,
            WINDOW_ACTION_SET_OPEN_POSITION,
            RangeGenerator::ZeroOrGreater,
        ),
        (
            WINDOW_ACTION_GET_VENT_POSITION,
            WINDOW_ACTION_SET_VENT_POSITION,
            RangeGenerator::ZeroOrLess,
        ),
    ] {
        handles.push(ActionHandle::Get(GetAction::new(
            ctx.clone(),
            position(get).with_params(closed().range(range.clone())),
        )?));
        handles.push(ActionHandle::Set(SetAction::new(
            ctx.clone(),
            position(set).with_params(closed().range(range)),
        )?));
    }

    for (signal, permission, get, enable, disable) in [
        (
            ids::WINDOW_LOCK,
            PERMISSION_CONTROL_CAR_WINDOWS,
            WINDOW_ACTION_IS_CHILD_LOCKED,
            WINDOW_ACTION_ENABLE_CHILD_LOCK,
            WINDOW_ACTION_DISABLE_CHILD_LOCK,
        ),
        (
            ids::HVAC_DEFROSTER,
            PERMISSION_CONTROL_CAR_CLIMATE,
            WINDOW_ACTION_IS_HVAC_DEFROSTER_ENABLED,
            WINDOW_ACTION_ENABLE_HVAC_DEFROSTER,
            WINDOW_ACTION_DISABLE_HVAC_DEFROSTER,
        ),
        (
            ids::HVAC_ELECTRIC_DEFROSTER_ON,
            PERMISSION_CONTROL_CAR_CLIMATE,
            WINDOW_ACTION_IS_ELECTRIC_DEFROSTER_ENABLED,
            WINDOW_ACTION_ENABLE_ELECTRIC_DEFROSTER,
            WINDOW_ACTION_DISABLE_ELECTRIC_DEFROSTER,
        ),
    ] {
        handles.push(ActionHandle::Get(GetAction::new(
            ctx.clone(),
            def(get, signal, ValueType::Boolean, permission),
        )?));
        for name in [enable, disable] {
            handles.push(ActionHandle::Set(SetAction::new(
                ctx.clone(),
                def(name, signal, ValueType::Boolean, permission),
            )?));
        }
    }

    ActionCategory::new(CATEGORY, handles)
}

/// Typed window operations
pub struct WindowActions {
    category: ActionCategory,
}

impl WindowActions {
    pub fn new(ctx: &ActionContext) -> ValResult<Self> {
        Ok(Self {
            category: build_category(ctx)?,
        })
    }

    pub fn category(&self) -> &ActionCategory {
        &self.category
    }

    async fn get_bool(&self, action: &str, windows: BTreeSet<String>) -> ValResult<GetResult<bool>> {
        let result = self.category.get(action, windows).await?;
        Ok(result.map(|_, v| v.as_bool().unwrap_or_default()))
    }

    async fn get_int(&self, action: &str, windows: BTreeSet<String>) -> ValResult<GetResult<i32>> {
        let result = self.category.get(action, windows).await?;
        Ok(result.map(|_, v| v.as_i32().unwrap_or_default()))
    }

    /// Open or vented both count as open
    pub async fn is_open(&self, windows: BTreeSet<String>) -> ValResult<GetResult<bool>> {
        let result = self.get_int(WINDOW_ACTION_IS_OPEN, windows).await?;
        Ok(result.map(|_, position| position != 0))
    }

    pub async fn close(&self, windows: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(WINDOW_ACTION_CLOSE, windows, Value::Int(0))
            .await
    }

    /// A vented window reports an open position of 0
    pub async fn get_open_position(&self, windows: BTreeSet<String>) -> ValResult<GetResult<i32>> {
        let result = self.get_int(WINDOW_ACTION_GET_OPEN_POSITION, windows).await?;
        Ok(result.map(|_, position| position.max(0)))
    }

    pub async fn set_open_position(&self, windows: BTreeSet<String>, position: i32) -> ValResult<SetResult> {
        if position < 0 {
            warn!(position, "Window open position is negative");
            return Err(ErrorCode::InvalidApiArgument);
        }
        self.category
            .set(WINDOW_ACTION_SET_OPEN_POSITION, windows, Value::Int(position))
            .await
    }

    /// Vent positions are reported as non-negative magnitudes
    pub async fn get_vent_position(&self, windows: BTreeSet<String>) -> ValResult<GetResult<i32>> {
        let result = self.get_int(WINDOW_ACTION_GET_VENT_POSITION, windows).await?;
        Ok(result.map(|_, position| position.saturating_neg().max(0)))
    }

    pub async fn set_vent_position(&self, windows: BTreeSet<String>, position: i32) -> ValResult<SetResult> {
        if position < 0 {
            warn!(position, "Window vent position is negative");
            return Err(ErrorCode::InvalidApiArgument);
        }
        self.category
            .set(WINDOW_ACTION_SET_VENT_POSITION, windows, Value::Int(-position))
            .await
    }

    pub async fn is_child_locked(&self, windows: BTreeSet<String>) -> ValResult<GetResult<bool>> {
        self.get_bool(WINDOW_ACTION_IS_CHILD_LOCKED, windows).await
    }

    pub async fn enable_child_lock(&self, windows: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(WINDOW_ACTION_ENABLE_CHILD_LOCK, windows, Value::Bool(true))
            .await
    }

    pub async fn disable_child_lock(&self, windows: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(WINDOW_ACTION_DISABLE_CHILD_LOCK, windows, Value::Bool(false))
            .await
    }

    pub async fn is_hvac_defroster_enabled(&self, windows: BTreeSet<String>) -> ValResult<GetResult<bool>> {
        self.get_bool(WINDOW_ACTION_IS_HVAC_DEFROSTER_ENABLED, windows).await
    }

    pub async fn enable_hvac_defroster(&self, windows: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(WINDOW_ACTION_ENABLE_HVAC_DEFROSTER, windows, Value::Bool(true))
            .await
    }

    pub async fn disable_hvac_defroster(&self, windows: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(WINDOW_ACTION_DISABLE_HVAC_DEFROSTER, windows, Value::Bool(false))
            .await
    }

    pub async fn is_electric_defroster_enabled(
        &self,
        windows: BTreeSet<String>,
    ) -> ValResult<GetResult<bool>> {
        self.get_bool(WINDOW_ACTION_IS_ELECTRIC_DEFROSTER_ENABLED, windows)
            .await
    }

    pub async fn enable_electric_defroster(&self, windows: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(WINDOW_ACTION_ENABLE_ELECTRIC_DEFROSTER, windows, Value::Bool(true))
            .await
    }

    pub async fn disable_electric_defroster(&self, windows: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(WINDOW_ACTION_DISABLE_ELECTRIC_DEFROSTER, windows, Value::Bool(false))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_window_elements_are_unique() {
        let windows = window_elements().unwrap();
        assert_eq!(windows.len(), 10);
        assert_eq!(windows.zone(WINDOW_ROOF_TOP_2), Some(window::ROOF_TOP_2));
        assert_eq!(windows.element(window::ROW_1_LEFT), Some(WINDOW_ROW_1_LEFT));
    }
}

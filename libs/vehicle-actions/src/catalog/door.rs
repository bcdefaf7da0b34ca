//! Door actions

use std::collections::BTreeSet;

use errors::ValResult;
use vehicle_bus::ids::{self, door};
use vehicle_bus::{SignalId, Value, ValueType};

use crate::action::{ActionContext, ActionDef, GetAction, SetAction};
use crate::category::{ActionCategory, ActionHandle};
use crate::elements::ElementMap;
use crate::params::ActionParams;
use crate::permission::PERMISSION_CONTROL_CAR_DOORS;
use crate::results::{GetResult, SetResult};

pub const CATEGORY: &str = "doors";

pub const DOOR_HOOD: &str = "DOOR_HOOD";
pub const DOOR_REAR: &str = "DOOR_REAR";
pub const DOOR_ROW_1_LEFT: &str = "DOOR_ROW_1_LEFT";
pub const DOOR_ROW_1_RIGHT: &str = "DOOR_ROW_1_RIGHT";
pub const DOOR_ROW_2_LEFT: &str = "DOOR_ROW_2_LEFT";
pub const DOOR_ROW_2_RIGHT: &str = "DOOR_ROW_2_RIGHT";
pub const DOOR_ROW_3_LEFT: &str = "DOOR_ROW_3_LEFT";
pub const DOOR_ROW_3_RIGHT: &str = "DOOR_ROW_3_RIGHT";

pub const DOOR_ACTION_IS_OPEN: &str = "DOOR_ACTION_IS_OPEN";
pub const DOOR_ACTION_CLOSE: &str = "DOOR_ACTION_CLOSE";
pub const DOOR_ACTION_GET_OPEN_POSITION: &str = "DOOR_ACTION_GET_OPEN_POSITION";
pub const DOOR_ACTION_SET_OPEN_POSITION: &str = "DOOR_ACTION_SET_OPEN_POSITION";
pub const DOOR_ACTION_IS_LOCKED: &str = "DOOR_ACTION_IS_LOCKED";
pub const DOOR_ACTION_LOCK: &str = "DOOR_ACTION_LOCK";
pub const DOOR_ACTION_UNLOCK: &str = "DOOR_ACTION_UNLOCK";

pub fn door_elements() -> ValResult<ElementMap> {
    ElementMap::new([
        (DOOR_HOOD, door::HOOD),
        (DOOR_REAR, door::REAR),
        (DOOR_ROW_1_LEFT, door::ROW_1_LEFT),
        (DOOR_ROW_1_RIGHT, door::ROW_1_RIGHT),
        (DOOR_ROW_2_LEFT, door::ROW_2_LEFT),
        (DOOR_ROW_2_RIGHT, door::ROW_2_RIGHT),
        (DOOR_ROW_3_LEFT, door::ROW_3_LEFT),
        (DOOR_ROW_3_RIGHT, door::ROW_3_RIGHT),
    ])
}

pub fn build_category(ctx: &ActionContext) -> ValResult<ActionCategory> {
    let doors = door_elements()?;
    let def = |name: &str, signal: SignalId, value_type: ValueType| {
        ActionDef::new(name, signal, value_type, PERMISSION_CONTROL_CAR_DOORS, doors.clone())
    };
    // Position 0 is closed and must be reachable
    let position = || ActionParams::new().min_max().require([Value::Int(0)]);

    let handles = vec![
        ActionHandle::Get(GetAction::new(
            ctx.clone(),
            def(DOOR_ACTION_IS_OPEN, ids::DOOR_POS, ValueType::Int32).with_params(position()),
        )?),
        ActionHandle::Set(SetAction::new(
            ctx.clone(),
            def(DOOR_ACTION_CLOSE, ids::DOOR_POS, ValueType::Int32).with_params(position()),
        )?),
        ActionHandle::Get(GetAction::new(
            ctx.clone(),
            def(DOOR_ACTION_GET_OPEN_POSITION, ids::DOOR_POS, ValueType::Int32).with_params(position()),
        )?),
        ActionHandle::Set(SetAction::new(
            ctx.clone(),
            def(DOOR_ACTION_SET_OPEN_POSITION, ids::DOOR_POS, ValueType::Int32).with_params(position()),
        )?),
        ActionHandle::Get(GetAction::new(
            ctx.clone(),
            def(DOOR_ACTION_IS_LOCKED, ids::DOOR_LOCK, ValueType::Boolean),
        )?),
        ActionHandle::Set(SetAction::new(
            ctx.clone(),
            def(DOOR_ACTION_LOCK, ids::DOOR_LOCK, ValueType::Boolean),
        )?),
        ActionHandle::Set(SetAction::new(
            ctx.clone(),
            def(DOOR_ACTION_UNLOCK, ids::DOOR_LOCK, ValueType::Boolean),
        )?),
    ];
    ActionCategory::new(CATEGORY, handles)
}

/// Typed door operations
pub struct DoorActions {
    category: ActionCategory,
}

impl DoorActions {
    pub fn new(ctx: &ActionContext) -> ValResult<Self> {
        Ok(Self {
            category: build_category(ctx)?,
        })
    }

    pub fn category(&self) -> &ActionCategory {
        &self.category
    }

    /// Any non-zero position counts as open
    pub async fn is_open(&self, doors: BTreeSet<String>) -> ValResult<GetResult<bool>> {
        let result = self.category.get(DOOR_ACTION_IS_OPEN, doors).await?;
        Ok(result.map(|_, v| v.as_i32().is_some_and(|position| position != 0)))
    }

    pub async fn close(&self, doors: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(DOOR_ACTION_CLOSE, doors, Value::Int(0))
            .await
    }

    pub async fn get_open_position(&self, doors: BTreeSet<String>) -> ValResult<GetResult<i32>> {
        let result = self.category.get(DOOR_ACTION_GET_OPEN_POSITION, doors).await?;
        Ok(result.map(|_, v| v.as_i32().unwrap_or_default()))
    }

    pub async fn set_open_position(&self, doors: BTreeSet<String>, position: i32) -> ValResult<SetResult> {
        self.category
            .set(DOOR_ACTION_SET_OPEN_POSITION, doors, Value::Int(position))
            .await
    }

    pub async fn is_locked(&self, doors: BTreeSet<String>) -> ValResult<GetResult<bool>> {
        let result = self.category.get(DOOR_ACTION_IS_LOCKED, doors).await?;
        Ok(result.map(|_, v| v.as_bool().unwrap_or_default()))
    }

    pub async fn lock(&self, doors: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(DOOR_ACTION_LOCK, doors, Value::Bool(true))
            .await
    }

    pub async fn unlock(&self, doors: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(DOOR_ACTION_UNLOCK, doors, Value::Bool(false))
            .await
    }
}

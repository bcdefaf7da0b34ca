//! Steering wheel climate actions
//!
//! Heating and cooling share the global `HVAC_STEERING_WHEEL_HEAT` signal;
//! negative levels cool.

use std::collections::BTreeSet;

use errors::{ErrorCode, ValResult};
use tracing::warn;
use vehicle_bus::ids;
use vehicle_bus::{Value, ValueType};

use crate::action::{ActionContext, ActionDef, GetAction, SetAction};
use crate::category::{ActionCategory, ActionHandle};
use crate::elements::{ElementMap, GLOBAL_ELEMENT};
use crate::generators::RangeGenerator;
use crate::params::ActionParams;
use crate::permission::PERMISSION_CONTROL_CAR_CLIMATE;
use crate::results::{GlobalGetResult, GlobalSetResult};

pub const CATEGORY: &str = "steering_wheel";

pub const STEERING_WHEEL_ACTION_GET_HEATING_LEVEL: &str = "STEERING_WHEEL_ACTION_GET_HEATING_LEVEL";
pub const STEERING_WHEEL_ACTION_SET_HEATING_LEVEL: &str = "STEERING_WHEEL_ACTION_SET_HEATING_LEVEL";
pub const STEERING_WHEEL_ACTION_GET_COOLING_LEVEL: &str = "STEERING_WHEEL_ACTION_GET_COOLING_LEVEL";
pub const STEERING_WHEEL_ACTION_SET_COOLING_LEVEL: &str = "STEERING_WHEEL_ACTION_SET_COOLING_LEVEL";

pub fn build_category(ctx: &ActionContext) -> ValResult<ActionCategory> {
    let level = |name: &str, range: RangeGenerator| {
        ActionDef::new(
            name,
            ids::HVAC_STEERING_WHEEL_HEAT,
            ValueType::Int32,
            PERMISSION_CONTROL_CAR_CLIMATE,
            ElementMap::global(),
        )
        .with_params(ActionParams::new().min_max().require([Value::Int(0)]).range(range))
    };

    let handles = vec![
        ActionHandle::Get(GetAction::new(
            ctx.clone(),
            level(STEERING_WHEEL_ACTION_GET_HEATING_LEVEL, RangeGenerator::ZeroOrGreater),
        )?),
        ActionHandle::Set(SetAction::new(
            ctx.clone(),
            level(STEERING_WHEEL_ACTION_SET_HEATING_LEVEL, RangeGenerator::ZeroOrGreater),
        )?),
        ActionHandle::Get(GetAction::new(
            ctx.clone(),
            level(STEERING_WHEEL_ACTION_GET_COOLING_LEVEL, RangeGenerator::ZeroOrLess),
        )?),
        ActionHandle::Set(SetAction::new(
            ctx.clone(),
            level(STEERING_WHEEL_ACTION_SET_COOLING_LEVEL, RangeGenerator::ZeroOrLess),
        )?),
    ];
    ActionCategory::new(CATEGORY, handles)
}

fn global() -> BTreeSet<String> {
    BTreeSet::from([GLOBAL_ELEMENT.to_string()])
}

/// Typed steering wheel operations
pub struct SteeringWheelActions {
    category: ActionCategory,
}

impl SteeringWheelActions {
    pub fn new(ctx: &ActionContext) -> ValResult<Self> {
        Ok(Self {
            category: build_category(ctx)?,
        })
    }

    pub fn category(&self) -> &ActionCategory {
        &self.category
    }

    /// A cooling wheel reports a heating level of 0
    pub async fn get_heating_level(&self) -> ValResult<GlobalGetResult<i32>> {
        let result = self
            .category
            .get(STEERING_WHEEL_ACTION_GET_HEATING_LEVEL, global())
            .await?;
        Ok(result
            .map(|_, v| v.as_i32().unwrap_or_default().max(0))
            .into_global())
    }

    pub async fn set_heating_level(&self, level: i32) -> ValResult<GlobalSetResult> {
        if level < 0 {
            warn!(level, "Steering wheel heating level is negative");
            return Err(ErrorCode::InvalidApiArgument);
        }
        let result = self
            .category
            .set(STEERING_WHEEL_ACTION_SET_HEATING_LEVEL, global(), Value::Int(level))
            .await?;
        Ok(result.into_global())
    }

    /// Cooling levels are reported as non-negative magnitudes
    pub async fn get_cooling_level(&self) -> ValResult<GlobalGetResult<i32>> {
        let result = self
            .category
            .get(STEERING_WHEEL_ACTION_GET_COOLING_LEVEL, global())
            .await?;
        Ok(result
            .map(|_, v| v.as_i32().unwrap_or_default().saturating_neg().max(0))
            .into_global())
    }

    pub async fn set_cooling_level(&self, level: i32) -> ValResult<GlobalSetResult> {
        if level < 0 {
            warn!(level, "Steering wheel cooling level is negative");
            return Err(ErrorCode::InvalidApiArgument);
        }
        let result = self
            .category
            .set(STEERING_WHEEL_ACTION_SET_COOLING_LEVEL, global(), Value::Int(-level))
            .await?;
        Ok(result.into_global())
    }
}

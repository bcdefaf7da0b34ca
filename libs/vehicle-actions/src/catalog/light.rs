//! Exterior light actions
//!
//! Headlights are global signals addressed through the `GLOBAL` element.

use std::collections::BTreeSet;

use errors::ValResult;
use vehicle_bus::ids::{self, light_state};
use vehicle_bus::{SignalId, Value, ValueType};

use crate::action::{ActionContext, ActionDef, GetAction, SetAction};
use crate::category::{ActionCategory, ActionHandle};
use crate::elements::{ElementMap, GLOBAL_ELEMENT};
use crate::generators::RangeGenerator;
use crate::params::ActionParams;
use crate::permission::{PERMISSION_CAR_EXTERIOR_LIGHTS, PERMISSION_CONTROL_CAR_EXTERIOR_LIGHTS};
use crate::results::{GlobalGetResult, GlobalSetResult};
use crate::value_range::ValueRange;

pub const CATEGORY: &str = "external_lights";

pub const EXTERNAL_LIGHT_ACTION_ARE_HEADLIGHTS_ENABLED: &str =
    "EXTERNAL_LIGHT_ACTION_ARE_HEADLIGHTS_ENABLED";
pub const EXTERNAL_LIGHT_ACTION_ENABLE_HEADLIGHTS: &str = "EXTERNAL_LIGHT_ACTION_ENABLE_HEADLIGHTS";
pub const EXTERNAL_LIGHT_ACTION_DISABLE_HEADLIGHTS: &str = "EXTERNAL_LIGHT_ACTION_DISABLE_HEADLIGHTS";

fn switch_def(name: &str, position: i32) -> ValResult<ActionDef> {
    Ok(def(
        name,
        ids::HEADLIGHTS_SWITCH,
        PERMISSION_CONTROL_CAR_EXTERIOR_LIGHTS,
    )
    .with_params(
        ActionParams::new().range(RangeGenerator::Fixed(ValueRange::ints(vec![position])?)),
    ))
}

fn def(name: &str, signal: SignalId, permission: &str) -> ActionDef {
    ActionDef::new(name, signal, ValueType::Int32, permission, ElementMap::global())
}

pub fn build_category(ctx: &ActionContext) -> ValResult<ActionCategory> {
    let handles = vec![
        ActionHandle::Get(GetAction::new(
            ctx.clone(),
            def(
                EXTERNAL_LIGHT_ACTION_ARE_HEADLIGHTS_ENABLED,
                ids::HEADLIGHTS_STATE,
                PERMISSION_CAR_EXTERIOR_LIGHTS,
            ),
        )?),
        ActionHandle::Set(SetAction::new(
            ctx.clone(),
            switch_def(EXTERNAL_LIGHT_ACTION_ENABLE_HEADLIGHTS, light_state::ON)?,
        )?),
        ActionHandle::Set(SetAction::new(
            ctx.clone(),
            switch_def(EXTERNAL_LIGHT_ACTION_DISABLE_HEADLIGHTS, light_state::OFF)?,
        )?),
    ];
    ActionCategory::new(CATEGORY, handles)
}

fn global() -> BTreeSet<String> {
    BTreeSet::from([GLOBAL_ELEMENT.to_string()])
}

/// Typed exterior light operations
pub struct ExternalLightActions {
    category: ActionCategory,
}

impl ExternalLightActions {
    pub fn new(ctx: &ActionContext) -> ValResult<Self> {
        Ok(Self {
            category: build_category(ctx)?,
        })
    }

    pub fn category(&self) -> &ActionCategory {
        &self.category
    }

    /// Only the plain "on" state counts; daytime running and automatic do not
    pub async fn are_headlights_enabled(&self) -> ValResult<GlobalGetResult<bool>> {
        let result = self
            .category
            .get(EXTERNAL_LIGHT_ACTION_ARE_HEADLIGHTS_ENABLED, global())
            .await?;
        Ok(result
            .map(|_, v| v.as_i32() == Some(light_state::ON))
            .into_global())
    }

    pub async fn enable_headlights(&self) -> ValResult<GlobalSetResult> {
        let result = self
            .category
            .set(
                EXTERNAL_LIGHT_ACTION_ENABLE_HEADLIGHTS,
                global(),
                Value::Int(light_state::ON),
            )
            .await?;
        Ok(result.into_global())
    }

    pub async fn disable_headlights(&self) -> ValResult<GlobalSetResult> {
        let result = self
            .category
            .set(
                EXTERNAL_LIGHT_ACTION_DISABLE_HEADLIGHTS,
                global(),
                Value::Int(light_state::OFF),
            )
            .await?;
        Ok(result.into_global())
    }
}

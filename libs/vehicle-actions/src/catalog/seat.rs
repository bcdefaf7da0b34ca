//! Seat and HVAC actions

use std::collections::BTreeSet;

use errors::{ErrorCode, ValResult};
use serde::{Deserialize, Serialize};
use tracing::warn;
use vehicle_bus::ids::{self, fan_direction, seat};
use vehicle_bus::{SignalId, Value, ValueType};

use crate::action::{ActionContext, ActionDef, GetAction, SetAction};
use crate::category::{ActionCategory, ActionHandle};
use crate::elements::ElementMap;
use crate::generators::RangeGenerator;
use crate::offset::{OffsetAction, OffsetRequest};
use crate::params::ActionParams;
use crate::permission::PERMISSION_CONTROL_CAR_CLIMATE;
use crate::results::{ActionValue, GetResult, OffsetResult, SetResult};
use crate::temperature::{Temperature, TemperatureUnit};

pub const CATEGORY: &str = "seats";

// ============================================================================
// Elements
// ============================================================================

pub const SEAT_ROW_1_LEFT: &str = "SEAT_ROW_1_LEFT";
pub const SEAT_ROW_1_CENTER: &str = "SEAT_ROW_1_CENTER";
pub const SEAT_ROW_1_RIGHT: &str = "SEAT_ROW_1_RIGHT";
pub const SEAT_ROW_2_LEFT: &str = "SEAT_ROW_2_LEFT";
pub const SEAT_ROW_2_CENTER: &str = "SEAT_ROW_2_CENTER";
pub const SEAT_ROW_2_RIGHT: &str = "SEAT_ROW_2_RIGHT";
pub const SEAT_ROW_3_LEFT: &str = "SEAT_ROW_3_LEFT";
pub const SEAT_ROW_3_CENTER: &str = "SEAT_ROW_3_CENTER";
pub const SEAT_ROW_3_RIGHT: &str = "SEAT_ROW_3_RIGHT";

pub fn seat_elements() -> ValResult<ElementMap> {
    ElementMap::new([
        (SEAT_ROW_1_LEFT, seat::ROW_1_LEFT),
        (SEAT_ROW_1_CENTER, seat::ROW_1_CENTER),
        (SEAT_ROW_1_RIGHT, seat::ROW_1_RIGHT),
        (SEAT_ROW_2_LEFT, seat::ROW_2_LEFT),
        (SEAT_ROW_2_CENTER, seat::ROW_2_CENTER),
        (SEAT_ROW_2_RIGHT, seat::ROW_2_RIGHT),
        (SEAT_ROW_3_LEFT, seat::ROW_3_LEFT),
        (SEAT_ROW_3_CENTER, seat::ROW_3_CENTER),
        (SEAT_ROW_3_RIGHT, seat::ROW_3_RIGHT),
    ])
}

// ============================================================================
// Action names
// ============================================================================

pub const SEAT_ACTION_IS_HVAC_POWER_ENABLED: &str = "SEAT_ACTION_IS_HVAC_POWER_ENABLED";
pub const SEAT_ACTION_ENABLE_HVAC_POWER: &str = "SEAT_ACTION_ENABLE_HVAC_POWER";
pub const SEAT_ACTION_DISABLE_HVAC_POWER: &str = "SEAT_ACTION_DISABLE_HVAC_POWER";
pub const SEAT_ACTION_IS_AC_ENABLED: &str = "SEAT_ACTION_IS_AC_ENABLED";
pub const SEAT_ACTION_ENABLE_AC: &str = "SEAT_ACTION_ENABLE_AC";
pub const SEAT_ACTION_DISABLE_AC: &str = "SEAT_ACTION_DISABLE_AC";
pub const SEAT_ACTION_IS_HVAC_RECIRCULATION_ENABLED: &str =
    "SEAT_ACTION_IS_HVAC_RECIRCULATION_ENABLED";
pub const SEAT_ACTION_ENABLE_HVAC_RECIRCULATION: &str = "SEAT_ACTION_ENABLE_HVAC_RECIRCULATION";
pub const SEAT_ACTION_DISABLE_HVAC_RECIRCULATION: &str = "SEAT_ACTION_DISABLE_HVAC_RECIRCULATION";
pub const SEAT_ACTION_IS_HVAC_AUTO_MODE_ENABLED: &str = "SEAT_ACTION_IS_HVAC_AUTO_MODE_ENABLED";
pub const SEAT_ACTION_ENABLE_HVAC_AUTO_MODE: &str = "SEAT_ACTION_ENABLE_HVAC_AUTO_MODE";
pub const SEAT_ACTION_DISABLE_HVAC_AUTO_MODE: &str = "SEAT_ACTION_DISABLE_HVAC_AUTO_MODE";
pub const SEAT_ACTION_IS_MAX_AC_ENABLED: &str = "SEAT_ACTION_IS_MAX_AC_ENABLED";
pub const SEAT_ACTION_ENABLE_MAX_AC: &str = "SEAT_ACTION_ENABLE_MAX_AC";
pub const SEAT_ACTION_DISABLE_MAX_AC: &str = "SEAT_ACTION_DISABLE_MAX_AC";
pub const SEAT_ACTION_IS_MAX_HEAT_ENABLED: &str = "SEAT_ACTION_IS_MAX_HEAT_ENABLED";
pub const SEAT_ACTION_ENABLE_MAX_HEAT: &str = "SEAT_ACTION_ENABLE_MAX_HEAT";
pub const SEAT_ACTION_DISABLE_MAX_HEAT: &str = "SEAT_ACTION_DISABLE_MAX_HEAT";
pub const SEAT_ACTION_IS_HVAC_AUTO_RECIRCULATION_ENABLED: &str =
    "SEAT_ACTION_IS_HVAC_AUTO_RECIRCULATION_ENABLED";
pub const SEAT_ACTION_ENABLE_HVAC_AUTO_RECIRCULATION: &str =
    "SEAT_ACTION_ENABLE_HVAC_AUTO_RECIRCULATION";
pub const SEAT_ACTION_DISABLE_HVAC_AUTO_RECIRCULATION: &str =
    "SEAT_ACTION_DISABLE_HVAC_AUTO_RECIRCULATION";
pub const SEAT_ACTION_GET_HVAC_FAN_SPEED: &str = "SEAT_ACTION_GET_HVAC_FAN_SPEED";
pub const SEAT_ACTION_SET_HVAC_FAN_SPEED: &str = "SEAT_ACTION_SET_HVAC_FAN_SPEED";
pub const SEAT_ACTION_INCREMENT_HVAC_FAN_SPEED: &str = "SEAT_ACTION_INCREMENT_HVAC_FAN_SPEED";
pub const SEAT_ACTION_DECREMENT_HVAC_FAN_SPEED: &str = "SEAT_ACTION_DECREMENT_HVAC_FAN_SPEED";
pub const SEAT_ACTION_GET_HVAC_FAN_DIRECTION: &str = "SEAT_ACTION_GET_HVAC_FAN_DIRECTION";
pub const SEAT_ACTION_SET_HVAC_FAN_DIRECTION: &str = "SEAT_ACTION_SET_HVAC_FAN_DIRECTION";
pub const SEAT_ACTION_GET_SEAT_HEATING_LEVEL: &str = "SEAT_ACTION_GET_SEAT_HEATING_LEVEL";
pub const SEAT_ACTION_SET_SEAT_HEATING_LEVEL: &str = "SEAT_ACTION_SET_SEAT_HEATING_LEVEL";
pub const SEAT_ACTION_GET_SEAT_COOLING_LEVEL: &str = "SEAT_ACTION_GET_SEAT_COOLING_LEVEL";
pub const SEAT_ACTION_SET_SEAT_COOLING_LEVEL: &str = "SEAT_ACTION_SET_SEAT_COOLING_LEVEL";
pub const SEAT_ACTION_GET_HVAC_TARGET_TEMPERATURE: &str = "SEAT_ACTION_GET_HVAC_TARGET_TEMPERATURE";
pub const SEAT_ACTION_SET_HVAC_TARGET_TEMPERATURE: &str = "SEAT_ACTION_SET_HVAC_TARGET_TEMPERATURE";
pub const SEAT_ACTION_INCREMENT_HVAC_TARGET_TEMPERATURE: &str =
    "SEAT_ACTION_INCREMENT_HVAC_TARGET_TEMPERATURE";
pub const SEAT_ACTION_DECREMENT_HVAC_TARGET_TEMPERATURE: &str =
    "SEAT_ACTION_DECREMENT_HVAC_TARGET_TEMPERATURE";

/// Fan airflow target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanDirection {
    Unknown,
    Face,
    Floor,
    Defrost,
    FaceAndFloor,
    FaceAndDefrost,
    DefrostAndFloor,
    All,
}

impl FanDirection {
    pub fn from_bits(bits: i32) -> Self {
        match bits {
            fan_direction::FACE => Self::Face,
            fan_direction::FLOOR => Self::Floor,
            fan_direction::DEFROST => Self::Defrost,
            fan_direction::FACE_AND_FLOOR => Self::FaceAndFloor,
            fan_direction::FACE_AND_DEFROST => Self::FaceAndDefrost,
            fan_direction::DEFROST_AND_FLOOR => Self::DefrostAndFloor,
            fan_direction::ALL => Self::All,
            _ => Self::Unknown,
        }
    }

    /// `None` for [`FanDirection::Unknown`], which cannot be written
    pub fn bits(self) -> Option<i32> {
        match self {
            Self::Unknown => None,
            Self::Face => Some(fan_direction::FACE),
            Self::Floor => Some(fan_direction::FLOOR),
            Self::Defrost => Some(fan_direction::DEFROST),
            Self::FaceAndFloor => Some(fan_direction::FACE_AND_FLOOR),
            Self::FaceAndDefrost => Some(fan_direction::FACE_AND_DEFROST),
            Self::DefrostAndFloor => Some(fan_direction::DEFROST_AND_FLOOR),
            Self::All => Some(fan_direction::ALL),
        }
    }
}

fn def(name: &str, signal: SignalId, value_type: ValueType, elements: &ElementMap) -> ActionDef {
    ActionDef::new(name, signal, value_type, PERMISSION_CONTROL_CAR_CLIMATE, elements.clone())
}

/// On/off toggle: one get and an enable/disable pair
fn toggle(
    ctx: &ActionContext,
    elements: &ElementMap,
    signal: SignalId,
    names: [&str; 3],
    power_dependent: bool,
) -> ValResult<Vec<ActionHandle>> {
    let [get, enable, disable] = names;
    let (get_params, set_params) = if power_dependent {
        (
            ActionParams::new().power_dependent(false),
            ActionParams::new().power_dependent(true),
        )
    } else {
        (ActionParams::new(), ActionParams::new())
    };
    Ok(vec![
        ActionHandle::Get(GetAction::new(
            ctx.clone(),
            def(get, signal, ValueType::Boolean, elements).with_params(get_params),
        )?),
        ActionHandle::Set(SetAction::new(
            ctx.clone(),
            def(enable, signal, ValueType::Boolean, elements).with_params(set_params.clone()),
        )?),
        ActionHandle::Set(SetAction::new(
            ctx.clone(),
            def(disable, signal, ValueType::Boolean, elements).with_params(set_params),
        )?),
    ])
}

fn signed_level_params(range: RangeGenerator) -> ActionParams {
    ActionParams::new()
        .min_max()
        .require([Value::Int(0)])
        .range(range)
}

fn temperature_params() -> ActionParams {
    ActionParams::new()
        .min_max()
        .range(RangeGenerator::DualUnitTemperature)
}

pub fn build_category(ctx: &ActionContext) -> ValResult<ActionCategory> {
    let seats = seat_elements()?;
    let mut handles = Vec::new();

    // HVAC power itself is never power dependent
    handles.extend(toggle(
        ctx,
        &seats,
        ids::HVAC_POWER_ON,
        [
            SEAT_ACTION_IS_HVAC_POWER_ENABLED,
            SEAT_ACTION_ENABLE_HVAC_POWER,
            SEAT_ACTION_DISABLE_HVAC_POWER,
        ],
        false,
    )?);
    for (signal, names) in [
        (
            ids::HVAC_AC_ON,
            [SEAT_ACTION_IS_AC_ENABLED, SEAT_ACTION_ENABLE_AC, SEAT_ACTION_DISABLE_AC],
        ),
        (
            ids::HVAC_RECIRC_ON,
            [
                SEAT_ACTION_IS_HVAC_RECIRCULATION_ENABLED,
                SEAT_ACTION_ENABLE_HVAC_RECIRCULATION,
                SEAT_ACTION_DISABLE_HVAC_RECIRCULATION,
            ],
        ),
        (
            ids::HVAC_AUTO_ON,
            [
                SEAT_ACTION_IS_HVAC_AUTO_MODE_ENABLED,
                SEAT_ACTION_ENABLE_HVAC_AUTO_MODE,
                SEAT_ACTION_DISABLE_HVAC_AUTO_MODE,
            ],
        ),
        (
            ids::HVAC_MAX_AC_ON,
            [
                SEAT_ACTION_IS_MAX_AC_ENABLED,
                SEAT_ACTION_ENABLE_MAX_AC,
                SEAT_ACTION_DISABLE_MAX_AC,
            ],
        ),
        (
            ids::HVAC_MAX_DEFROST_ON,
            [
                SEAT_ACTION_IS_MAX_HEAT_ENABLED,
                SEAT_ACTION_ENABLE_MAX_HEAT,
                SEAT_ACTION_DISABLE_MAX_HEAT,
            ],
        ),
        (
            ids::HVAC_AUTO_RECIRC_ON,
            [
                SEAT_ACTION_IS_HVAC_AUTO_RECIRCULATION_ENABLED,
                SEAT_ACTION_ENABLE_HVAC_AUTO_RECIRCULATION,
                SEAT_ACTION_DISABLE_HVAC_AUTO_RECIRCULATION,
            ],
        ),
    ] {
        handles.extend(toggle(ctx, &seats, signal, names, true)?);
    }

    // Fan speed
    let fan = |name: &str| def(name, ids::HVAC_FAN_SPEED, ValueType::Int32, &seats);
    handles.push(ActionHandle::Get(GetAction::new(
        ctx.clone(),
        fan(SEAT_ACTION_GET_HVAC_FAN_SPEED).with_params(ActionParams::new().min_max().power_dependent(false)),
    )?));
    handles.push(ActionHandle::Set(SetAction::new(
        ctx.clone(),
        fan(SEAT_ACTION_SET_HVAC_FAN_SPEED).with_params(ActionParams::new().min_max().power_dependent(true)),
    )?));
    for name in [SEAT_ACTION_INCREMENT_HVAC_FAN_SPEED, SEAT_ACTION_DECREMENT_HVAC_FAN_SPEED] {
        handles.push(ActionHandle::Offset(OffsetAction::new(
            ctx.clone(),
            fan(name).with_params(ActionParams::new().min_max().power_dependent(true)),
        )?));
    }

    // Fan direction
    let direction = |name: &str| def(name, ids::HVAC_FAN_DIRECTION, ValueType::Int32, &seats);
    handles.push(ActionHandle::Get(GetAction::new(
        ctx.clone(),
        direction(SEAT_ACTION_GET_HVAC_FAN_DIRECTION).with_params(ActionParams::new().power_dependent(false)),
    )?));
    handles.push(ActionHandle::Set(SetAction::new(
        ctx.clone(),
        direction(SEAT_ACTION_SET_HVAC_FAN_DIRECTION).with_params(
            ActionParams::new()
                .power_dependent(true)
                .range(RangeGenerator::FromSignal(ids::HVAC_FAN_DIRECTION_AVAILABLE)),
        ),
    )?));

    // Seat heating and cooling share one signed signal
    let level = |name: &str| def(name, ids::HVAC_SEAT_TEMPERATURE, ValueType::Int32, &seats);
    for (get, set, range) in [
        (
            SEAT_ACTION_GET_SEAT_HEATING_LEVEL,
            SEAT_ACTION_SET_SEAT_HEATING_LEVEL,
            RangeGenerator::ZeroOrGreater,
        ),
        (
            SEAT_ACTION_GET_SEAT_COOLING_LEVEL,
            SEAT_ACTION_SET_SEAT_COOLING_LEVEL,
            RangeGenerator::ZeroOrLess,
        ),
    ] {
        handles.push(ActionHandle::Get(GetAction::new(
            ctx.clone(),
            level(get).with_params(signed_level_params(range.clone()).power_dependent(false)),
        )?));
        handles.push(ActionHandle::Set(SetAction::new(
            ctx.clone(),
            level(set).with_params(signed_level_params(range).power_dependent(true)),
        )?));
    }

    // Target temperature
    let temperature = |name: &str| def(name, ids::HVAC_TEMPERATURE_SET, ValueType::Float, &seats);
    handles.push(ActionHandle::Get(GetAction::new(
        ctx.clone(),
        temperature(SEAT_ACTION_GET_HVAC_TARGET_TEMPERATURE)
            .with_params(temperature_params().power_dependent(false)),
    )?));
    handles.push(ActionHandle::Set(SetAction::new(
        ctx.clone(),
        temperature(SEAT_ACTION_SET_HVAC_TARGET_TEMPERATURE)
            .with_params(temperature_params().power_dependent(true)),
    )?));
    for name in [
        SEAT_ACTION_INCREMENT_HVAC_TARGET_TEMPERATURE,
        SEAT_ACTION_DECREMENT_HVAC_TARGET_TEMPERATURE,
    ] {
        handles.push(ActionHandle::Offset(OffsetAction::new(
            ctx.clone(),
            temperature(name).with_params(temperature_params().power_dependent(true)),
        )?));
    }

    ActionCategory::new(CATEGORY, handles)
}

/// Typed seat and HVAC operations
pub struct SeatActions {
    category: ActionCategory,
}

impl SeatActions {
    pub fn new(ctx: &ActionContext) -> ValResult<Self> {
        Ok(Self {
            category: build_category(ctx)?,
        })
    }

    pub fn category(&self) -> &ActionCategory {
        &self.category
    }

    async fn get_bool(&self, action: &str, seats: BTreeSet<String>) -> ValResult<GetResult<bool>> {
        let result = self.category.get(action, seats).await?;
        Ok(result.map(|_, v| v.as_bool().unwrap_or_default()))
    }

    async fn get_int(&self, action: &str, seats: BTreeSet<String>) -> ValResult<GetResult<i32>> {
        let result = self.category.get(action, seats).await?;
        Ok(result.map(|_, v| v.as_i32().unwrap_or_default()))
    }

    pub async fn is_hvac_power_enabled(&self, seats: BTreeSet<String>) -> ValResult<GetResult<bool>> {
        self.get_bool(SEAT_ACTION_IS_HVAC_POWER_ENABLED, seats).await
    }

    pub async fn enable_hvac_power(&self, seats: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(SEAT_ACTION_ENABLE_HVAC_POWER, seats, Value::Bool(true))
            .await
    }

    pub async fn disable_hvac_power(&self, seats: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(SEAT_ACTION_DISABLE_HVAC_POWER, seats, Value::Bool(false))
            .await
    }

    pub async fn is_ac_enabled(&self, seats: BTreeSet<String>) -> ValResult<GetResult<bool>> {
        self.get_bool(SEAT_ACTION_IS_AC_ENABLED, seats).await
    }

    pub async fn enable_ac(&self, seats: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(SEAT_ACTION_ENABLE_AC, seats, Value::Bool(true))
            .await
    }

    pub async fn disable_ac(&self, seats: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(SEAT_ACTION_DISABLE_AC, seats, Value::Bool(false))
            .await
    }

    pub async fn is_hvac_recirculation_enabled(
        &self,
        seats: BTreeSet<String>,
    ) -> ValResult<GetResult<bool>> {
        self.get_bool(SEAT_ACTION_IS_HVAC_RECIRCULATION_ENABLED, seats)
            .await
    }

    pub async fn enable_hvac_recirculation(&self, seats: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(SEAT_ACTION_ENABLE_HVAC_RECIRCULATION, seats, Value::Bool(true))
            .await
    }

    pub async fn disable_hvac_recirculation(&self, seats: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(SEAT_ACTION_DISABLE_HVAC_RECIRCULATION, seats, Value::Bool(false))
            .await
    }

    pub async fn is_hvac_auto_mode_enabled(&self, seats: BTreeSet<String>) -> ValResult<GetResult<bool>> {
        self.get_bool(SEAT_ACTION_IS_HVAC_AUTO_MODE_ENABLED, seats)
            .await
    }

    pub async fn enable_hvac_auto_mode(&self, seats: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(SEAT_ACTION_ENABLE_HVAC_AUTO_MODE, seats, Value::Bool(true))
            .await
    }

    pub async fn disable_hvac_auto_mode(&self, seats: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(SEAT_ACTION_DISABLE_HVAC_AUTO_MODE, seats, Value::Bool(false))
            .await
    }

    pub async fn is_max_ac_enabled(&self, seats: BTreeSet<String>) -> ValResult<GetResult<bool>> {
        self.get_bool(SEAT_ACTION_IS_MAX_AC_ENABLED, seats).await
    }

    pub async fn enable_max_ac(&self, seats: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(SEAT_ACTION_ENABLE_MAX_AC, seats, Value::Bool(true))
            .await
    }

    pub async fn disable_max_ac(&self, seats: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(SEAT_ACTION_DISABLE_MAX_AC, seats, Value::Bool(false))
            .await
    }

    pub async fn is_max_heat_enabled(&self, seats: BTreeSet<String>) -> ValResult<GetResult<bool>> {
        self.get_bool(SEAT_ACTION_IS_MAX_HEAT_ENABLED, seats).await
    }

    pub async fn enable_max_heat(&self, seats: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(SEAT_ACTION_ENABLE_MAX_HEAT, seats, Value::Bool(true))
            .await
    }

    pub async fn disable_max_heat(&self, seats: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(SEAT_ACTION_DISABLE_MAX_HEAT, seats, Value::Bool(false))
            .await
    }

    pub async fn is_hvac_auto_recirculation_enabled(
        &self,
        seats: BTreeSet<String>,
    ) -> ValResult<GetResult<bool>> {
        self.get_bool(SEAT_ACTION_IS_HVAC_AUTO_RECIRCULATION_ENABLED, seats)
            .await
    }

    pub async fn enable_hvac_auto_recirculation(&self, seats: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(SEAT_ACTION_ENABLE_HVAC_AUTO_RECIRCULATION, seats, Value::Bool(true))
            .await
    }

    pub async fn disable_hvac_auto_recirculation(&self, seats: BTreeSet<String>) -> ValResult<SetResult> {
        self.category
            .set(SEAT_ACTION_DISABLE_HVAC_AUTO_RECIRCULATION, seats, Value::Bool(false))
            .await
    }

    // ========================================================================
    // Fan
    // ========================================================================

    pub async fn get_hvac_fan_speed(&self, seats: BTreeSet<String>) -> ValResult<GetResult<i32>> {
        self.get_int(SEAT_ACTION_GET_HVAC_FAN_SPEED, seats).await
    }

    pub async fn set_hvac_fan_speed(&self, seats: BTreeSet<String>, speed: i32) -> ValResult<SetResult> {
        self.category
            .set(SEAT_ACTION_SET_HVAC_FAN_SPEED, seats, Value::Int(speed))
            .await
    }

    /// Raise the fan speed by a positive `amount`
    pub async fn increment_hvac_fan_speed(
        &self,
        seats: BTreeSet<String>,
        amount: i32,
    ) -> ValResult<OffsetResult<ActionValue>> {
        if amount <= 0 {
            warn!(amount, "Fan speed increment must be positive");
            return Err(ErrorCode::InvalidApiArgument);
        }
        let request = OffsetRequest::Int {
            elements: seats,
            offset: amount,
        };
        self.category
            .apply_offset(SEAT_ACTION_INCREMENT_HVAC_FAN_SPEED, request)
            .await
    }

    /// Lower the fan speed by a positive `amount`
    pub async fn decrement_hvac_fan_speed(
        &self,
        seats: BTreeSet<String>,
        amount: i32,
    ) -> ValResult<OffsetResult<ActionValue>> {
        if amount <= 0 {
            warn!(amount, "Fan speed decrement must be positive");
            return Err(ErrorCode::InvalidApiArgument);
        }
        let request = OffsetRequest::Int {
            elements: seats,
            offset: -amount,
        };
        self.category
            .apply_offset(SEAT_ACTION_DECREMENT_HVAC_FAN_SPEED, request)
            .await
    }

    pub async fn get_hvac_fan_direction(
        &self,
        seats: BTreeSet<String>,
    ) -> ValResult<GetResult<FanDirection>> {
        let result = self.get_int(SEAT_ACTION_GET_HVAC_FAN_DIRECTION, seats).await?;
        Ok(result.map(|_, bits| FanDirection::from_bits(bits)))
    }

    pub async fn set_hvac_fan_direction(
        &self,
        seats: BTreeSet<String>,
        direction: FanDirection,
    ) -> ValResult<SetResult> {
        let bits = direction.bits().ok_or(ErrorCode::InvalidApiArgument)?;
        self.category
            .set(SEAT_ACTION_SET_HVAC_FAN_DIRECTION, seats, Value::Int(bits))
            .await
    }

    // ========================================================================
    // Seat heating and cooling
    // ========================================================================

    pub async fn get_seat_heating_level(&self, seats: BTreeSet<String>) -> ValResult<GetResult<i32>> {
        let result = self.get_int(SEAT_ACTION_GET_SEAT_HEATING_LEVEL, seats).await?;
        Ok(result.map(|_, level| level.max(0)))
    }

    pub async fn set_seat_heating_level(&self, seats: BTreeSet<String>, level: i32) -> ValResult<SetResult> {
        if level < 0 {
            warn!(level, "Seat heating level is negative");
            return Err(ErrorCode::InvalidApiArgument);
        }
        self.category
            .set(SEAT_ACTION_SET_SEAT_HEATING_LEVEL, seats, Value::Int(level))
            .await
    }

    /// Cooling levels are reported as non-negative magnitudes
    pub async fn get_seat_cooling_level(&self, seats: BTreeSet<String>) -> ValResult<GetResult<i32>> {
        let result = self.get_int(SEAT_ACTION_GET_SEAT_COOLING_LEVEL, seats).await?;
        Ok(result.map(|_, level| level.saturating_neg().max(0)))
    }

    pub async fn set_seat_cooling_level(&self, seats: BTreeSet<String>, level: i32) -> ValResult<SetResult> {
        if level < 0 {
            warn!(level, "Seat cooling level is negative");
            return Err(ErrorCode::InvalidApiArgument);
        }
        self.category
            .set(SEAT_ACTION_SET_SEAT_COOLING_LEVEL, seats, Value::Int(-level))
            .await
    }

    // ========================================================================
    // Target temperature
    // ========================================================================

    /// Target temperature in `unit`, or in the vehicle's display unit
    pub async fn get_hvac_target_temperature(
        &self,
        seats: BTreeSet<String>,
        unit: Option<TemperatureUnit>,
    ) -> ValResult<GetResult<Temperature>> {
        self.category
            .get_temperature(SEAT_ACTION_GET_HVAC_TARGET_TEMPERATURE, seats, unit)
            .await
    }

    pub async fn set_hvac_target_temperature(
        &self,
        seats: BTreeSet<String>,
        temperature: Temperature,
        round_to_nearest: bool,
    ) -> ValResult<SetResult> {
        self.category
            .set_temperature(
                SEAT_ACTION_SET_HVAC_TARGET_TEMPERATURE,
                seats,
                temperature,
                round_to_nearest,
            )
            .await
    }

    pub async fn increment_hvac_target_temperature(
        &self,
        seats: BTreeSet<String>,
        offset: Temperature,
        round_to_nearest: bool,
    ) -> ValResult<OffsetResult<ActionValue>> {
        let request = OffsetRequest::Temperature {
            elements: seats,
            offset,
            round_to_nearest,
        };
        self.category
            .apply_offset(SEAT_ACTION_INCREMENT_HVAC_TARGET_TEMPERATURE, request)
            .await
    }

    pub async fn decrement_hvac_target_temperature(
        &self,
        seats: BTreeSet<String>,
        offset: Temperature,
        round_to_nearest: bool,
    ) -> ValResult<OffsetResult<ActionValue>> {
        let request = OffsetRequest::Temperature {
            elements: seats,
            offset,
            round_to_nearest,
        }
        .negated();
        self.category
            .apply_offset(SEAT_ACTION_DECREMENT_HVAC_TARGET_TEMPERATURE, request)
            .await
    }
}

//! Vehicle profiles
//!
//! A profile describes the signals a simulated vehicle exposes, their areas
//! and initial values. Profiles are plain YAML/TOML/JSON files and are turned
//! into a populated [`MemoryBus`].

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ProfileError;
use crate::ids;
use crate::memory_impl::MemoryBus;
use crate::time::TimeProvider;
use crate::types::{
    Access, AreaConfig, AreaId, AreaType, SignalConfig, SignalId, Value, ValueType,
    GLOBAL_AREA_ID,
};

/// Identifier written as a number, a `0x` hex string or a well-known name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdRef {
    Int(i64),
    Text(String),
}

impl IdRef {
    fn as_int(&self) -> Result<i32, ProfileError> {
        match self {
            Self::Int(v) => i32::try_from(*v).map_err(|_| ProfileError::InvalidId(v.to_string())),
            Self::Text(text) => parse_numeric(text),
        }
    }

    /// Resolve to a signal id
    pub fn signal_id(&self) -> Result<SignalId, ProfileError> {
        if let Self::Text(name) = self {
            if let Some(id) = ids::signal_by_name(name) {
                return Ok(id);
            }
        }
        self.as_int()
    }

    /// Resolve to an area id
    pub fn area_id(&self) -> Result<AreaId, ProfileError> {
        match self {
            Self::Text(name) if name.eq_ignore_ascii_case("GLOBAL") => Ok(GLOBAL_AREA_ID),
            _ => self.as_int(),
        }
    }
}

fn parse_numeric(text: &str) -> Result<i32, ProfileError> {
    let trimmed = text.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16).map(|v| v as i32),
        None => trimmed.parse::<i32>(),
    };
    parsed.map_err(|_| ProfileError::InvalidId(text.to_string()))
}

/// Value as written in a profile, coerced by the signal's value type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    List(Vec<i64>),
}

impl ProfileValue {
    fn coerce(&self, signal: SignalId, value_type: ValueType) -> Result<Value, ProfileError> {
        let to_i32 = |v: i64| {
            i32::try_from(v)
                .map_err(|_| ProfileError::invalid_signal(signal, format!("{} out of range", v)))
        };
        match (value_type, self) {
            (ValueType::Boolean, Self::Bool(v)) => Ok(Value::Bool(*v)),
            (ValueType::Int32, Self::Int(v)) => Ok(Value::Int(to_i32(*v)?)),
            (ValueType::Float, Self::Int(v)) => Ok(Value::Float(*v as f32)),
            (ValueType::Float, Self::Float(v)) => Ok(Value::Float(*v as f32)),
            (ValueType::Int32Vec, Self::List(items)) => Ok(Value::IntArray(
                items.iter().map(|v| to_i32(*v)).collect::<Result<_, _>>()?,
            )),
            (expected, other) => Err(ProfileError::invalid_signal(
                signal,
                format!("value {:?} is not {:?}", other, expected),
            )),
        }
    }
}

/// One area of a profiled signal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaProfile {
    pub area_id: IdRef,
    /// Defaults to the signal's access
    #[serde(default)]
    pub access: Option<Access>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    /// Initial value
    #[serde(default)]
    pub value: Option<ProfileValue>,
}

/// One profiled signal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalProfile {
    pub id: IdRef,
    pub value_type: ValueType,
    #[serde(default)]
    pub area_type: AreaType,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub config_array: Vec<IdRef>,
    pub areas: Vec<AreaProfile>,
}

impl SignalProfile {
    /// Raw config plus initial values
    pub fn build(&self) -> Result<(SignalConfig, Vec<(AreaId, Value)>), ProfileError> {
        let id = self.id.signal_id()?;
        let config_array = self
            .config_array
            .iter()
            .map(IdRef::signal_id)
            .collect::<Result<Vec<_>, _>>()?;

        let mut area_configs = Vec::with_capacity(self.areas.len());
        let mut initial = Vec::new();
        for area in &self.areas {
            let area_id = area.area_id.area_id()?;
            let mut config = AreaConfig::new(area_id, area.access.unwrap_or(self.access));
            config.min = area
                .min
                .map(|v| bound(id, self.value_type, v))
                .transpose()?;
            config.max = area
                .max
                .map(|v| bound(id, self.value_type, v))
                .transpose()?;
            area_configs.push(config);

            if let Some(value) = &area.value {
                initial.push((area_id, value.coerce(id, self.value_type)?));
            }
        }

        Ok((
            SignalConfig {
                id,
                value_type: self.value_type,
                area_type: self.area_type,
                access: self.access,
                config_array,
                area_configs,
            },
            initial,
        ))
    }
}

fn bound(signal: SignalId, value_type: ValueType, v: f64) -> Result<Value, ProfileError> {
    match value_type {
        ValueType::Int32 => Ok(Value::Int(v.round() as i32)),
        ValueType::Float => Ok(Value::Float(v as f32)),
        other => Err(ProfileError::invalid_signal(
            signal,
            format!("min/max not allowed for {:?}", other),
        )),
    }
}

/// A simulated vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleProfile {
    #[serde(default)]
    pub name: String,
    pub signals: Vec<SignalProfile>,
}

impl VehicleProfile {
    /// Load from a `.yaml`, `.toml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let profile: Self = common::load_config_file_only(path.as_ref())?;
        info!(
            "Loaded vehicle profile '{}' ({} signals)",
            profile.name,
            profile.signals.len()
        );
        Ok(profile)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ProfileError> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

impl MemoryBus {
    /// Build a bus populated from `profile`, stamped by `clock`
    pub fn from_profile(
        profile: &VehicleProfile,
        clock: Arc<dyn TimeProvider>,
    ) -> Result<Self, ProfileError> {
        let bus = MemoryBus::new(clock);
        for signal in &profile.signals {
            let (config, initial) = signal.build()?;
            let id = config.id;
            debug!(
                "Profile signal {} ({:#x})",
                ids::signal_name(id).unwrap_or("custom"),
                id
            );
            bus.add_signal(config);
            for (area, value) in initial {
                bus.seed_value(id, area, value);
            }
        }
        Ok(bus)
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::time::TickingTimeProvider;
    use crate::traits::SignalBus;

    const PROFILE: &str = r#"
name: test-cabin
signals:
  - id: HVAC_POWER_ON
    value_type: boolean
    area_type: seat
    config_array: [HVAC_FAN_SPEED, "0x15400501"]
    areas:
      - area_id: 0x5
        value: true
  - id: "0x15400500"
    value_type: int32
    area_type: seat
    areas:
      - area_id: 1
        min: 1
        max: 7
        value: 3
  - id: HVAC_TEMPERATURE_DISPLAY_UNITS
    value_type: int32
    access: read
    areas:
      - area_id: GLOBAL
        value: 0x30
"#;

    #[test]
    fn test_parse_and_build_bus() {
        let profile = VehicleProfile::from_yaml_str(PROFILE).unwrap();
        assert_eq!(profile.name, "test-cabin");

        let bus =
            MemoryBus::from_profile(&profile, Arc::new(TickingTimeProvider::default())).unwrap();
        let configs = bus
            .signal_configs(&[ids::HVAC_POWER_ON, ids::HVAC_FAN_SPEED])
            .unwrap();
        assert_eq!(configs.len(), 2);
        assert_eq!(
            configs[0].config_array,
            vec![ids::HVAC_FAN_SPEED, ids::HVAC_FAN_DIRECTION]
        );
        assert_eq!(configs[1].area_configs[0].max, Some(Value::Int(7)));

        assert_eq!(bus.current_value(ids::HVAC_FAN_SPEED, 1), Some(Value::Int(3)));
        assert_eq!(
            bus.current_value(ids::HVAC_TEMPERATURE_DISPLAY_UNITS, 0),
            Some(Value::Int(ids::VEHICLE_UNIT_CELSIUS))
        );
    }

    #[test]
    fn test_value_type_mismatch() {
        let yaml = r#"
signals:
  - id: HVAC_AC_ON
    value_type: boolean
    areas:
      - area_id: 1
        value: 4
"#;
        let profile = VehicleProfile::from_yaml_str(yaml).unwrap();
        let err = MemoryBus::from_profile(&profile, Arc::new(TickingTimeProvider::default()))
            .err()
            .unwrap();
        assert!(matches!(err, ProfileError::InvalidSignal { .. }));
    }

    #[test]
    fn test_invalid_id() {
        assert!(matches!(
            IdRef::Text("NOT_A_SIGNAL".to_string()).signal_id(),
            Err(ProfileError::InvalidId(_))
        ));
        assert_eq!(IdRef::Text("0x10".to_string()).area_id().unwrap(), 0x10);
    }
}

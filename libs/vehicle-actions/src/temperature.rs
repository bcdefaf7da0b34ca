//! Dual-unit temperature tables
//!
//! A temperature signal's supported values hold two ascending halves: the
//! Celsius entries first, then the Fahrenheit entries, index-aligned so that
//! `table[i]` and `table[i + n/2]` are the same setting. The bus is always
//! written with the Celsius entry.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use errors::{ErrorCode, ValResult};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use vehicle_bus::ids::{self, VEHICLE_UNIT_CELSIUS, VEHICLE_UNIT_FAHRENHEIT};
use vehicle_bus::{float_eq, GLOBAL_AREA_ID};

use crate::facade::SignalBusFacade;
use crate::value_range::{ValueRange, MAX_RANGE_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
        }
    }

    pub fn from_vehicle_unit(code: i32) -> Option<Self> {
        match code {
            VEHICLE_UNIT_CELSIUS => Some(Self::Celsius),
            VEHICLE_UNIT_FAHRENHEIT => Some(Self::Fahrenheit),
            _ => None,
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" | "celsius" => Ok(Self::Celsius),
            "f" | "fahrenheit" => Ok(Self::Fahrenheit),
            other => Err(format!("Unknown temperature unit '{}'", other)),
        }
    }
}

/// A temperature value or delta with its unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub value: f32,
    pub unit: TemperatureUnit,
}

impl Temperature {
    pub fn celsius(value: f32) -> Self {
        Self {
            value,
            unit: TemperatureUnit::Celsius,
        }
    }

    pub fn fahrenheit(value: f32) -> Self {
        Self {
            value,
            unit: TemperatureUnit::Fahrenheit,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.value.is_finite()
    }

    /// Convert an absolute temperature
    pub fn to_unit(self, unit: TemperatureUnit) -> Self {
        let value = match (self.unit, unit) {
            (TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit) => self.value * 1.8 + 32.0,
            (TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius) => (self.value - 32.0) / 1.8,
            _ => self.value,
        };
        Self { value, unit }
    }

    /// Convert a temperature difference
    pub fn delta_in(self, unit: TemperatureUnit) -> f32 {
        match (self.unit, unit) {
            (TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit) => self.value * 9.0 / 5.0,
            (TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius) => self.value * 5.0 / 9.0,
            _ => self.value,
        }
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°{}", self.value, self.unit.symbol())
    }
}

/// Build the dual-unit table for one zone
///
/// A six-entry `config_array` gives `[minC, maxC, stepC, minF, maxF, stepF]`
/// in tenths of a degree. Otherwise the table is inferred from `min`/`max`
/// at 0.5°C per 1°F.
pub fn dual_unit_range(min: f32, max: f32, config_array: &[i32]) -> ValResult<ValueRange> {
    let (min_c, max_c, step_c, min_f, max_f, step_f) = match config_array {
        [min_c, max_c, step_c, min_f, max_f, step_f] => (
            i64::from(*min_c),
            i64::from(*max_c),
            i64::from(*step_c),
            i64::from(*min_f),
            i64::from(*max_f),
            i64::from(*step_f),
        ),
        _ => {
            if !min.is_finite() || !max.is_finite() {
                error!(min, max, "Temperature bounds are not finite");
                return Err(ErrorCode::BadPlatformImpl);
            }
            let min_c = (f64::from(min) * 10.0).round() as i64;
            let max_c = (f64::from(max) * 10.0).round() as i64;
            if min_c % 5 != 0 || max_c % 5 != 0 {
                error!(min, max, "Temperature bounds are not multiples of 0.5");
                return Err(ErrorCode::BadPlatformImpl);
            }
            let steps = (max_c - min_c) / 5;
            let min_f = (f64::from(min) * 1.8 + 32.0).floor() as i64 * 10;
            (min_c, max_c, 5, min_f, min_f + steps * 10, 10)
        },
    };

    if step_c <= 0
        || step_f <= 0
        || max_c < min_c
        || (max_c - min_c) % step_c != 0
        || (max_f - min_f) % step_f != 0
        || (max_c - min_c) / step_c != (max_f - min_f) / step_f
    {
        error!(?config_array, "Invalid dual-unit temperature table");
        return Err(ErrorCode::BadPlatformImpl);
    }

    let steps = (max_c - min_c) / step_c + 1;
    if steps * 2 > MAX_RANGE_LEN as i64 {
        error!(?config_array, steps, "Dual-unit temperature table is too long");
        return Err(ErrorCode::BadPlatformImpl);
    }

    let celsius = (0..steps).map(|i| min_c + i * step_c);
    let fahrenheit = (0..steps).map(|i| min_f + i * step_f);
    ValueRange::floats(celsius.chain(fahrenheit).map(|t| t as f32 / 10.0).collect())
}

/// Index view over a dual-unit table
#[derive(Debug, Clone, Copy)]
pub struct TemperatureTable<'a> {
    values: &'a [f32],
}

impl<'a> TemperatureTable<'a> {
    /// Tables must have an even, non-zero length
    pub fn new(values: &'a [f32]) -> ValResult<Self> {
        if values.is_empty() || values.len() % 2 != 0 {
            return Err(ErrorCode::BadValImpl);
        }
        Ok(Self { values })
    }

    pub fn from_range(range: &'a ValueRange) -> ValResult<Self> {
        Self::new(range.as_floats().ok_or(ErrorCode::BadValImpl)?)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    /// First index of `unit`'s half
    pub fn start(&self, unit: TemperatureUnit) -> usize {
        match unit {
            TemperatureUnit::Celsius => 0,
            TemperatureUnit::Fahrenheit => self.values.len() / 2,
        }
    }

    /// Last index of `unit`'s half
    pub fn end(&self, unit: TemperatureUnit) -> usize {
        match unit {
            TemperatureUnit::Celsius => self.values.len() / 2 - 1,
            TemperatureUnit::Fahrenheit => self.values.len() - 1,
        }
    }

    /// Nearest entry within `unit`'s half; ties keep the lower index
    pub fn closest_index(&self, value: f32, unit: TemperatureUnit) -> usize {
        let start = self.start(unit);
        let mut best = start;
        let mut best_distance = f32::INFINITY;
        for index in start..=self.end(unit) {
            let distance = (self.values[index] - value).abs();
            if distance < best_distance && !float_eq(distance, best_distance) {
                best = index;
                best_distance = distance;
            }
        }
        best
    }

    /// Index of `temperature` in its unit's half
    ///
    /// With `round` the nearest entry wins. Without it the value must match
    /// an entry; a miss is classified against that half's bounds.
    pub fn processed_index(&self, temperature: Temperature, round: bool) -> ValResult<usize> {
        if round {
            return Ok(self.closest_index(temperature.value, temperature.unit));
        }

        let (start, end) = (self.start(temperature.unit), self.end(temperature.unit));
        if let Some(offset) = self.values[start..=end]
            .iter()
            .position(|v| float_eq(*v, temperature.value))
        {
            return Ok(start + offset);
        }

        if temperature.value < self.values[start] {
            Err(ErrorCode::ValueBelowMinimum)
        } else if temperature.value > self.values[end] {
            Err(ErrorCode::ValueAboveMaximum)
        } else {
            Err(ErrorCode::ValueNotSupported)
        }
    }

    /// Celsius value to write for an index in either half
    pub fn set_value(&self, index: usize) -> f32 {
        let celsius_index = if index >= self.start(TemperatureUnit::Fahrenheit) {
            index - self.start(TemperatureUnit::Fahrenheit)
        } else {
            index
        };
        self.values[celsius_index]
    }

    /// Express a Celsius bus reading in `unit`
    pub fn display(&self, celsius: f32, unit: TemperatureUnit) -> Temperature {
        match unit {
            TemperatureUnit::Celsius => Temperature::celsius(celsius),
            TemperatureUnit::Fahrenheit => {
                let index = self.closest_index(celsius, TemperatureUnit::Celsius)
                    + self.start(TemperatureUnit::Fahrenheit);
                Temperature::fahrenheit(self.values[index])
            },
        }
    }
}

/// Unit the vehicle currently displays temperatures in
pub fn display_units(facade: &SignalBusFacade) -> ValResult<TemperatureUnit> {
    let zones = BTreeSet::from([GLOBAL_AREA_ID]);
    let mut values = facade.get_values(ids::HVAC_TEMPERATURE_DISPLAY_UNITS, &zones)?;
    let reading = values
        .remove(&GLOBAL_AREA_ID)
        .ok_or(ErrorCode::BadPlatformImpl)?
        .map_err(|code| {
            warn!(code = %code, "Display units unreadable");
            code
        })?;

    let code = reading.value.as_i32().ok_or(ErrorCode::BadPlatformImpl)?;
    TemperatureUnit::from_vehicle_unit(code).ok_or_else(|| {
        warn!(code, "Unsupported temperature display unit");
        ErrorCode::BadPlatformImpl
    })
}

//! Offset actions
//!
//! An offset reads the current value per element, derives a new value, and
//! writes elements sharing the same target in one confirmed batch.

use std::collections::{BTreeMap, BTreeSet};

use errors::{ErrorCode, ValResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vehicle_bus::{Value, ValueType};

use crate::action::{Action, ActionContext, ActionDef};
use crate::hvac_power::with_power;
use crate::results::{ActionValue, OffsetResult};
use crate::temperature::{display_units, Temperature, TemperatureTable, TemperatureUnit};
use crate::value_range::ValueRange;

fn default_round() -> bool {
    true
}

/// Signed delta applied to a set of elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OffsetRequest {
    Int {
        elements: BTreeSet<String>,
        offset: i32,
    },
    Float {
        elements: BTreeSet<String>,
        offset: f32,
    },
    Temperature {
        elements: BTreeSet<String>,
        offset: Temperature,
        /// Snap to the nearest table entry instead of requiring an exact one
        #[serde(default = "default_round")]
        round_to_nearest: bool,
    },
}

impl OffsetRequest {
    pub fn elements(&self) -> &BTreeSet<String> {
        match self {
            Self::Int { elements, .. }
            | Self::Float { elements, .. }
            | Self::Temperature { elements, .. } => elements,
        }
    }

    /// Float and temperature deltas must be finite
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Int { .. } => true,
            Self::Float { offset, .. } => offset.is_finite(),
            Self::Temperature { offset, .. } => offset.is_finite(),
        }
    }

    /// Same request with the delta negated
    pub fn negated(&self) -> Self {
        match self.clone() {
            Self::Int { elements, offset } => Self::Int {
                elements,
                offset: offset.saturating_neg(),
            },
            Self::Float { elements, offset } => Self::Float {
                elements,
                offset: -offset,
            },
            Self::Temperature {
                elements,
                offset,
                round_to_nearest,
            } => Self::Temperature {
                elements,
                offset: Temperature {
                    value: -offset.value,
                    unit: offset.unit,
                },
                round_to_nearest,
            },
        }
    }
}

/// New bus value and the value reported to the caller
type Target = (Value, ActionValue);

pub struct OffsetAction {
    core: Action,
}

impl OffsetAction {
    pub fn new(ctx: ActionContext, def: ActionDef) -> ValResult<Self> {
        Ok(Self {
            core: Action::new(ctx, def, true)?,
        })
    }

    pub fn action(&self) -> &Action {
        &self.core
    }

    pub fn apply_offset(&self, request: &OffsetRequest) -> ValResult<OffsetResult<ActionValue>> {
        let elements = request.elements();
        self.core.check_elements(elements)?;
        self.validate_request(request)?;

        let outputs = match self.core.power() {
            Some(power) => with_power(power, elements, |e| self.apply(e, request))?,
            None => self.apply(elements, request)?,
        };
        Ok(OffsetResult::new(self.core.name(), outputs))
    }

    fn validate_request(&self, request: &OffsetRequest) -> ValResult<()> {
        if !request.is_finite() {
            warn!(action = %self.core.name(), "Offset is not finite");
            return Err(ErrorCode::InvalidApiArgument);
        }
        let valid = match request {
            OffsetRequest::Temperature { .. } => self.core.is_temperature(),
            _ if self.core.is_temperature() => false,
            OffsetRequest::Int { .. } => self.core.value_type() == ValueType::Int32,
            OffsetRequest::Float { .. } => self.core.value_type() == ValueType::Float,
        };
        if valid {
            Ok(())
        } else {
            Err(ErrorCode::BadValImpl)
        }
    }

    fn apply(
        &self,
        elements: &BTreeSet<String>,
        request: &OffsetRequest,
    ) -> ValResult<BTreeMap<String, ValResult<ActionValue>>> {
        let current = self.core.read(elements)?;
        let ranges = self.core.element_ranges()?;
        let display = match request {
            OffsetRequest::Temperature { .. } => Some(display_units(self.core.facade())),
            _ => None,
        };

        let mut outputs = BTreeMap::new();
        let mut groups: Vec<(Target, BTreeSet<String>)> = Vec::new();
        for (element, current) in current {
            let target = current.and_then(|current| {
                let range = ranges.get(&element).ok_or(ErrorCode::BadValImpl)?;
                let target = calculate(&current, range, request, display)?;
                Ok((current, target))
            });
            match target {
                Err(code) => {
                    outputs.insert(element, Err(code));
                },
                Ok((current, (set, output))) if set.matches(&current) => {
                    outputs.insert(element, Ok(output));
                },
                Ok((_, target)) => match groups.iter_mut().find(|(t, _)| same_target(t, &target)) {
                    Some((_, group)) => {
                        group.insert(element);
                    },
                    None => groups.push((target, BTreeSet::from([element]))),
                },
            }
        }

        for ((set, output), group) in groups {
            debug!(action = %self.core.name(), value = %set, elements = group.len(), "Writing offset group");
            let errors = self.core.write(&group, &set)?;
            for element in group {
                let outcome = match errors.get(&element) {
                    Some(code) => Err(*code),
                    None => Ok(output.clone()),
                };
                outputs.insert(element, outcome);
            }
        }
        Ok(outputs)
    }
}

fn same_target(a: &Target, b: &Target) -> bool {
    a.0.matches(&b.0) && a.1 == b.1
}

fn calculate(
    current: &Value,
    range: &ValueRange,
    request: &OffsetRequest,
    display: Option<ValResult<TemperatureUnit>>,
) -> ValResult<Target> {
    match (request, current) {
        (OffsetRequest::Int { offset, .. }, Value::Int(current)) => {
            let set = match current.checked_add(*offset) {
                Some(set) => Value::Int(set),
                None if *offset > 0 => return Err(ErrorCode::ValueAboveMaximum),
                None => return Err(ErrorCode::ValueBelowMinimum),
            };
            range.check(&set)?;
            Ok((set.clone(), set.into()))
        },
        (OffsetRequest::Float { offset, .. }, Value::Float(current)) => {
            let set = Value::Float(current + offset);
            range.check(&set)?;
            Ok((set.clone(), set.into()))
        },
        (
            OffsetRequest::Temperature {
                offset,
                round_to_nearest,
                ..
            },
            Value::Float(current),
        ) => {
            let unit = display.ok_or(ErrorCode::BadValImpl)??;
            let table = TemperatureTable::from_range(range)?;
            let candidate = match unit {
                TemperatureUnit::Fahrenheit => {
                    let index = table.closest_index(*current, TemperatureUnit::Celsius)
                        + table.start(TemperatureUnit::Fahrenheit);
                    let current_f = table.value(index).ok_or(ErrorCode::BadValImpl)?;
                    Temperature::fahrenheit(current_f + offset.delta_in(unit))
                },
                TemperatureUnit::Celsius => Temperature::celsius(current + offset.delta_in(unit)),
            };

            let index = table.processed_index(candidate, *round_to_nearest)?;
            let shown = table.value(index).ok_or(ErrorCode::BadValImpl)?;
            Ok((
                Value::Float(table.set_value(index)),
                ActionValue::Temperature(Temperature { value: shown, unit }),
            ))
        },
        _ => Err(ErrorCode::BadValImpl),
    }
}

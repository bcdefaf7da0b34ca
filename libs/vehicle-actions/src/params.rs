//! Optional action parameters

use vehicle_bus::Value;

use crate::generators::RangeGenerator;

/// Relationship between an action and the HVAC power signal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PowerMode {
    #[default]
    Independent,
    /// Only usable while HVAC power is on for the zone
    Dependent {
        /// Turn power on first instead of failing with `HvacPowerIsDisabled`
        enable_if_needed: bool,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ActionParams {
    pub min_max: bool,
    pub required_values: Vec<Value>,
    pub range: Option<RangeGenerator>,
    pub power: PowerMode,
}

impl ActionParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zone bounds define the range; defaults to the contiguous span
    pub fn min_max(mut self) -> Self {
        self.min_max = true;
        self
    }

    pub fn require(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.required_values.extend(values);
        self
    }

    pub fn range(mut self, generator: RangeGenerator) -> Self {
        self.range = Some(generator);
        self
    }

    pub fn power_dependent(mut self, enable_if_needed: bool) -> Self {
        self.power = PowerMode::Dependent { enable_if_needed };
        self
    }

    /// Generator actually used for min-max actions
    pub fn min_max_generator(&self) -> Option<RangeGenerator> {
        if !self.min_max {
            return None;
        }
        Some(self.range.clone().unwrap_or(RangeGenerator::MinMaxDefault))
    }

    pub fn has_custom_range(&self) -> bool {
        self.range.as_ref().is_some_and(RangeGenerator::is_custom)
    }
}

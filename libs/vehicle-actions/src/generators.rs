//! Value range strategies
//!
//! Min-max strategies derive a zone's range from its configured bounds.
//! Per-zone strategies compute it from the zone directly.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use errors::{ErrorCode, ValResult};
use tracing::warn;
use vehicle_bus::{AreaId, SignalId, Value};

use crate::facade::SignalBusFacade;
use crate::temperature::dual_unit_range;
use crate::value_range::ValueRange;

/// Caller-supplied per-zone range
pub type CustomRange = Arc<dyn Fn(&SignalBusFacade, AreaId) -> ValResult<ValueRange> + Send + Sync>;

#[derive(Clone)]
pub enum RangeGenerator {
    /// Every value between the zone bounds, step 1
    MinMaxDefault,
    /// `0..=max`; zones whose bounds exclude zero from below are skipped
    ZeroOrGreater,
    /// `min..=0`; zones whose bounds exclude zero from above are skipped
    ZeroOrLess,
    /// Celsius then Fahrenheit table
    DualUnitTemperature,
    /// Same range for every zone
    Fixed(ValueRange),
    /// Integer-array signal listing the zone's values
    FromSignal(SignalId),
    Custom(CustomRange),
}

impl RangeGenerator {
    /// Strategies that consume the zone's min/max bounds
    pub fn is_min_max(&self) -> bool {
        matches!(
            self,
            Self::MinMaxDefault | Self::ZeroOrGreater | Self::ZeroOrLess | Self::DualUnitTemperature
        )
    }

    /// Anything other than the default span
    pub fn is_custom(&self) -> bool {
        !matches!(self, Self::MinMaxDefault)
    }

    /// Range from a zone's bounds
    ///
    /// `AreaNotSupported` tells the caller to skip the zone.
    pub fn min_max_range(&self, min: &Value, max: &Value, config_array: &[i32]) -> ValResult<ValueRange> {
        match (self, min, max) {
            (Self::MinMaxDefault, Value::Int(min), Value::Int(max)) => ValueRange::int_span(*min, *max),
            (Self::MinMaxDefault, Value::Float(min), Value::Float(max)) => {
                ValueRange::float_span(*min, *max)
            },
            (Self::ZeroOrGreater, Value::Int(min), Value::Int(max)) => {
                if *max <= 0 || *min > 0 {
                    warn!(min, max, "Bounds do not cover a non-negative range");
                    return Err(ErrorCode::AreaNotSupported);
                }
                ValueRange::int_span(0, *max)
            },
            (Self::ZeroOrLess, Value::Int(min), Value::Int(max)) => {
                if *max < 0 || *min >= 0 {
                    warn!(min, max, "Bounds do not cover a non-positive range");
                    return Err(ErrorCode::AreaNotSupported);
                }
                ValueRange::int_span(*min, 0)
            },
            (Self::DualUnitTemperature, Value::Float(min), Value::Float(max)) => {
                dual_unit_range(*min, *max, config_array)
            },
            _ => Err(ErrorCode::BadValImpl),
        }
    }

    /// Range computed from the zone itself
    pub fn zone_range(&self, facade: &SignalBusFacade, zone: AreaId) -> ValResult<ValueRange> {
        match self {
            Self::Fixed(range) => Ok(range.clone()),
            Self::FromSignal(signal) => {
                let mut values = facade.get_values(*signal, &BTreeSet::from([zone]))?;
                let reading = values.remove(&zone).ok_or(ErrorCode::BadPlatformImpl)??;
                match reading.value {
                    Value::IntArray(values) => ValueRange::ints(values),
                    _ => Err(ErrorCode::BadPlatformImpl),
                }
            },
            Self::Custom(generate) => generate(facade, zone),
            _ => Err(ErrorCode::BadValImpl),
        }
    }
}

impl fmt::Debug for RangeGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinMaxDefault => f.write_str("MinMaxDefault"),
            Self::ZeroOrGreater => f.write_str("ZeroOrGreater"),
            Self::ZeroOrLess => f.write_str("ZeroOrLess"),
            Self::DualUnitTemperature => f.write_str("DualUnitTemperature"),
            Self::Fixed(range) => f.debug_tuple("Fixed").field(range).finish(),
            Self::FromSignal(signal) => f.debug_tuple("FromSignal").field(signal).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_splits() {
        let range = RangeGenerator::ZeroOrGreater
            .min_max_range(&Value::Int(-3), &Value::Int(3), &[])
            .unwrap();
        assert_eq!(range, ValueRange::ints(vec![0, 1, 2, 3]).unwrap());

        let range = RangeGenerator::ZeroOrLess
            .min_max_range(&Value::Int(-3), &Value::Int(3), &[])
            .unwrap();
        assert_eq!(range, ValueRange::ints(vec![-3, -2, -1, 0]).unwrap());

        assert_eq!(
            RangeGenerator::ZeroOrGreater.min_max_range(&Value::Int(-3), &Value::Int(0), &[]),
            Err(ErrorCode::AreaNotSupported)
        );
        assert_eq!(
            RangeGenerator::ZeroOrLess.min_max_range(&Value::Int(1), &Value::Int(3), &[]),
            Err(ErrorCode::AreaNotSupported)
        );
    }

    #[test]
    fn test_default_span_and_type_mismatch() {
        let range = RangeGenerator::MinMaxDefault
            .min_max_range(&Value::Int(1), &Value::Int(7), &[])
            .unwrap();
        assert_eq!(range.len(), 7);
        assert_eq!(
            RangeGenerator::MinMaxDefault.min_max_range(&Value::Int(1), &Value::Float(7.0), &[]),
            Err(ErrorCode::BadValImpl)
        );
    }

    #[test]
    fn test_classification() {
        assert!(RangeGenerator::DualUnitTemperature.is_min_max());
        assert!(RangeGenerator::DualUnitTemperature.is_custom());
        assert!(!RangeGenerator::MinMaxDefault.is_custom());
        let fixed = RangeGenerator::Fixed(ValueRange::ints(vec![1]).unwrap());
        assert!(!fixed.is_min_max());
        assert_eq!(format!("{:?}", fixed), "Fixed(ValueRange(Int([1])))");
    }
}

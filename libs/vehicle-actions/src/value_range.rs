//! Ordered set of legal values for one signal zone

use errors::{ErrorCode, ValResult};
use serde::Serialize;
use tracing::warn;
use vehicle_bus::{float_eq, Value, ValueType};

/// Longest range a zone may declare
pub const MAX_RANGE_LEN: usize = 10_000;

/// Non-empty, ordered list of supported values
///
/// `min`/`max` are the first and last entries, which need not be the numeric
/// extremes (dual-unit temperature tables hold two ascending halves). Only the
/// constructors build one, so a range is never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValueRange(Values);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
enum Values {
    Int(Vec<i32>),
    Float(Vec<f32>),
}

impl ValueRange {
    pub fn ints(values: Vec<i32>) -> ValResult<Self> {
        if values.is_empty() {
            return Err(ErrorCode::BadValImpl);
        }
        Ok(Self(Values::Int(values)))
    }

    /// Every entry must be finite
    pub fn floats(values: Vec<f32>) -> ValResult<Self> {
        if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
            return Err(ErrorCode::BadValImpl);
        }
        Ok(Self(Values::Float(values)))
    }

    /// Contiguous `min..=max`, step 1
    ///
    /// Spans longer than [`MAX_RANGE_LEN`] are `BadPlatformImpl`.
    pub fn int_span(min: i32, max: i32) -> ValResult<Self> {
        if min >= max {
            return Err(ErrorCode::BadValImpl);
        }
        let len = i64::from(max) - i64::from(min) + 1;
        if len > MAX_RANGE_LEN as i64 {
            warn!(min, max, "Integer span is too long");
            return Err(ErrorCode::BadPlatformImpl);
        }
        Ok(Self(Values::Int((min..=max).collect())))
    }

    /// `min, min + 1.0, ...` up to `max`
    ///
    /// Non-finite bounds, spans longer than [`MAX_RANGE_LEN`] and magnitudes
    /// where a step of 1.0 no longer changes the value are `BadPlatformImpl`.
    pub fn float_span(min: f32, max: f32) -> ValResult<Self> {
        if !min.is_finite() || !max.is_finite() {
            warn!(min, max, "Float span has non-finite bounds");
            return Err(ErrorCode::BadPlatformImpl);
        }
        if min >= max {
            return Err(ErrorCode::BadValImpl);
        }
        if f64::from(max) - f64::from(min) >= MAX_RANGE_LEN as f64 {
            warn!(min, max, "Float span is too long");
            return Err(ErrorCode::BadPlatformImpl);
        }

        let mut values = Vec::new();
        let mut current = min;
        while current <= max {
            values.push(current);
            let next = current + 1.0;
            if next <= current {
                warn!(min, max, "Float span does not advance");
                return Err(ErrorCode::BadPlatformImpl);
            }
            current = next;
        }
        Ok(Self(Values::Float(values)))
    }

    pub fn value_type(&self) -> ValueType {
        match &self.0 {
            Values::Int(_) => ValueType::Int32,
            Values::Float(_) => ValueType::Float,
        }
    }

    pub fn len(&self) -> usize {
        match &self.0 {
            Values::Int(v) => v.len(),
            Values::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        match &self.0 {
            Values::Int(v) => v.get(index).map(|x| Value::Int(*x)),
            Values::Float(v) => v.get(index).map(|x| Value::Float(*x)),
        }
    }

    /// First entry
    pub fn min(&self) -> Value {
        self.get(0).unwrap_or_else(|| self.zero())
    }

    /// Last entry
    pub fn max(&self) -> Value {
        self.get(self.len().saturating_sub(1))
            .unwrap_or_else(|| self.zero())
    }

    fn zero(&self) -> Value {
        match &self.0 {
            Values::Int(_) => Value::Int(0),
            Values::Float(_) => Value::Float(0.0),
        }
    }

    /// Membership; floats compare within tolerance, other types never match
    pub fn contains(&self, value: &Value) -> bool {
        match (&self.0, value) {
            (Values::Int(values), Value::Int(v)) => values.contains(v),
            (Values::Float(values), Value::Float(v)) => values.iter().any(|s| float_eq(*s, *v)),
            _ => false,
        }
    }

    /// Membership check classifying misses against the first and last entries
    pub fn check(&self, value: &Value) -> ValResult<()> {
        if self.contains(value) {
            return Ok(());
        }
        let (Some(x), Some(first), Some(last)) = (
            as_f64(value),
            as_f64(&self.min()),
            as_f64(&self.max()),
        ) else {
            return Err(ErrorCode::ValueNotSupported);
        };
        if x < first {
            Err(ErrorCode::ValueBelowMinimum)
        } else if x > last {
            Err(ErrorCode::ValueAboveMaximum)
        } else {
            Err(ErrorCode::ValueNotSupported)
        }
    }

    pub fn as_floats(&self) -> Option<&[f32]> {
        match &self.0 {
            Values::Float(v) => Some(v),
            Values::Int(_) => None,
        }
    }

    pub fn as_ints(&self) -> Option<&[i32]> {
        match &self.0 {
            Values::Int(v) => Some(v),
            Values::Float(_) => None,
        }
    }

    pub fn values(&self) -> Vec<Value> {
        match &self.0 {
            Values::Int(v) => v.iter().map(|x| Value::Int(*x)).collect(),
            Values::Float(v) => v.iter().map(|x| Value::Float(*x)).collect(),
        }
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int(v) => Some(f64::from(*v)),
        Value::Float(v) => Some(f64::from(*v)),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_classification() {
        let range = ValueRange::ints(vec![0, 1, 2, 3, 4, 5]).unwrap();
        assert_eq!(range.check(&Value::Int(5)), Ok(()));
        assert_eq!(range.check(&Value::Int(6)), Err(ErrorCode::ValueAboveMaximum));
        assert_eq!(range.check(&Value::Int(-1)), Err(ErrorCode::ValueBelowMinimum));

        let sparse = ValueRange::ints(vec![0, 2, 4]).unwrap();
        assert_eq!(sparse.check(&Value::Int(3)), Err(ErrorCode::ValueNotSupported));
    }

    #[test]
    fn test_float_membership_uses_tolerance() {
        let range = ValueRange::floats(vec![1.0, 1.5, 2.0]).unwrap();
        assert!(range.contains(&Value::Float(1.500_000_1)));
        assert!(!range.contains(&Value::Float(3.0)));
        assert!(!range.contains(&Value::Int(1)));
    }

    #[test]
    fn test_spans() {
        let range = ValueRange::int_span(0, 5).unwrap();
        assert_eq!(range.len(), 6);
        assert_eq!(range.min(), Value::Int(0));
        assert_eq!(range.max(), Value::Int(5));
        assert!(!range.contains(&Value::Int(6)));

        let range = ValueRange::float_span(16.0, 18.5).unwrap();
        assert_eq!(range.values(), vec![Value::Float(16.0), Value::Float(17.0), Value::Float(18.0)]);

        assert_eq!(ValueRange::int_span(3, 3), Err(ErrorCode::BadValImpl));
        assert_eq!(ValueRange::ints(vec![]), Err(ErrorCode::BadValImpl));
        assert_eq!(ValueRange::floats(vec![]), Err(ErrorCode::BadValImpl));
        assert_eq!(ValueRange::floats(vec![1.0, f32::NAN]), Err(ErrorCode::BadValImpl));
    }

    #[test]
    fn test_degenerate_spans_are_rejected() {
        // f32 + 1.0 no longer moves past 2^24
        assert_eq!(
            ValueRange::float_span(16_777_216.0, 16_777_220.0),
            Err(ErrorCode::BadPlatformImpl)
        );
        assert_eq!(
            ValueRange::float_span(f32::NEG_INFINITY, 0.0),
            Err(ErrorCode::BadPlatformImpl)
        );
        assert_eq!(
            ValueRange::float_span(0.0, f32::NAN),
            Err(ErrorCode::BadPlatformImpl)
        );
        assert_eq!(
            ValueRange::float_span(-1.0e9, 1.0e9),
            Err(ErrorCode::BadPlatformImpl)
        );
        assert_eq!(
            ValueRange::int_span(i32::MIN, i32::MAX),
            Err(ErrorCode::BadPlatformImpl)
        );
        assert_eq!(ValueRange::int_span(0, MAX_RANGE_LEN as i32 - 1).map(|r| r.len()), Ok(MAX_RANGE_LEN));
        assert_eq!(
            ValueRange::int_span(0, MAX_RANGE_LEN as i32),
            Err(ErrorCode::BadPlatformImpl)
        );
    }

    #[test]
    fn test_serialized_shape() {
        let range = ValueRange::ints(vec![0, 1]).unwrap();
        assert_eq!(
            serde_json::to_value(&range).unwrap(),
            serde_json::json!({ "type": "int", "values": [0, 1] })
        );
    }

    #[test]
    fn test_first_and_last_are_min_max() {
        let range = ValueRange::floats(vec![16.0, 16.5, 61.0, 62.0]).unwrap();
        assert_eq!(range.min(), Value::Float(16.0));
        assert_eq!(range.max(), Value::Float(62.0));
        assert_eq!(range.as_floats().map(<[f32]>::len), Some(4));
    }
}

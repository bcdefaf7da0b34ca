//! Raw signal model as exposed by the vehicle bus

use serde::{Deserialize, Serialize};

/// Signal identifier
pub type SignalId = i32;

/// Area (zone) identifier, a bitmask understood by the bus
pub type AreaId = i32;

/// Area id used by global signals
pub const GLOBAL_AREA_ID: AreaId = 0;

/// Tolerance for float comparisons
pub const FLOAT_TOLERANCE: f32 = 1e-5;

/// Compare two floats with [`FLOAT_TOLERANCE`]
#[inline]
pub fn float_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < FLOAT_TOLERANCE
}

/// Value type of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Boolean,
    Int32,
    Float,
    Int32Vec,
}

impl ValueType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int32 | Self::Float)
    }
}

/// Signal value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Float(f32),
    IntArray(Vec<i32>),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Boolean,
            Self::Int(_) => ValueType::Int32,
            Self::Float(_) => ValueType::Float,
            Self::IntArray(_) => ValueType::Int32Vec,
        }
    }

    /// Type-aware equality: floats within tolerance, arrays element-wise
    pub fn matches(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => float_eq(*a, *b),
            (Self::IntArray(a), Self::IntArray(b)) => a == b,
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int_array(&self) -> Option<&[i32]> {
        match self {
            Self::IntArray(v) => Some(v),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::IntArray(v) => write!(f, "{:?}", v),
        }
    }
}

/// Access mode of a signal or area
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    None,
    Read,
    Write,
    #[default]
    ReadWrite,
}

impl Access {
    pub fn is_readable(&self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    pub fn is_writable(&self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

/// Physical area family of a signal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaType {
    #[default]
    Global,
    Window,
    Seat,
    Door,
    Mirror,
    Wheel,
    Vendor,
}

/// Per-area configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaConfig {
    pub area_id: AreaId,
    pub access: Access,
    pub min: Option<Value>,
    pub max: Option<Value>,
}

impl AreaConfig {
    pub fn new(area_id: AreaId, access: Access) -> Self {
        Self {
            area_id,
            access,
            min: None,
            max: None,
        }
    }

    pub fn with_range(mut self, min: Value, max: Value) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }
}

/// Raw signal configuration as reported by the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    pub id: SignalId,
    pub value_type: ValueType,
    pub area_type: AreaType,
    pub access: Access,
    pub config_array: Vec<i32>,
    pub area_configs: Vec<AreaConfig>,
}

impl SignalConfig {
    pub fn area_ids(&self) -> impl Iterator<Item = AreaId> + '_ {
        self.area_configs.iter().map(|c| c.area_id)
    }

    pub fn area_config(&self, area_id: AreaId) -> Option<&AreaConfig> {
        self.area_configs.iter().find(|c| c.area_id == area_id)
    }
}

/// Status carried by a reading or a change event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadingStatus {
    Available,
    Unavailable,
    Error,
    /// Any status code this crate does not know
    Unknown(i32),
}

impl ReadingStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Available,
            1 => Self::Unavailable,
            2 => Self::Error,
            other => Self::Unknown(other),
        }
    }
}

/// A timestamped value of one signal in one area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalReading {
    pub signal: SignalId,
    pub area: AreaId,
    pub status: ReadingStatus,
    /// Nanoseconds on the bus clock
    pub timestamp_nanos: i64,
    pub value: Option<Value>,
}

impl SignalReading {
    pub fn available(signal: SignalId, area: AreaId, value: Value, timestamp_nanos: i64) -> Self {
        Self {
            signal,
            area,
            status: ReadingStatus::Available,
            timestamp_nanos,
            value: Some(value),
        }
    }
}

/// Error codes delivered through [`crate::SignalListener::on_error`]
pub mod set_error {
    pub const TRY_AGAIN: i32 = 1;
    pub const INVALID_ARG: i32 = 2;
    pub const NOT_AVAILABLE: i32 = 3;
    pub const ACCESS_DENIED: i32 = 4;
    pub const UNKNOWN: i32 = 5;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_matching() {
        assert!(Value::Float(20.5).matches(&Value::Float(20.500_002)));
        assert!(!Value::Float(20.5).matches(&Value::Float(20.6)));
        assert!(!Value::Int(1).matches(&Value::Float(1.0)));
        assert!(Value::IntArray(vec![1, 2]).matches(&Value::IntArray(vec![1, 2])));
        assert!(!Value::IntArray(vec![1, 2]).matches(&Value::IntArray(vec![2, 1])));
    }

    #[test]
    fn test_access_flags() {
        assert!(Access::ReadWrite.is_readable() && Access::ReadWrite.is_writable());
        assert!(!Access::Read.is_writable());
        assert!(!Access::None.is_readable());
    }

    #[test]
    fn test_status_from_code() {
        assert_eq!(ReadingStatus::from_code(0), ReadingStatus::Available);
        assert_eq!(ReadingStatus::from_code(9), ReadingStatus::Unknown(9));
    }
}

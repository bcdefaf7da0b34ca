//! Command-line value parsing

use std::collections::BTreeSet;

use anyhow::{anyhow, bail, Context, Result};
use vehicle_actions::OffsetRequest;
use vehicle_bus::{Value, ValueType};

/// Parse `text` as a value of the action's signal type
pub fn parse_value(text: &str, value_type: ValueType) -> Result<Value> {
    let text = text.trim();
    match value_type {
        ValueType::Boolean => match text.to_ascii_lowercase().as_str() {
            "true" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "off" | "0" => Ok(Value::Bool(false)),
            other => bail!("'{}' is not a boolean (true/false/on/off)", other),
        },
        ValueType::Int32 => Ok(Value::Int(parse_int(text)?)),
        ValueType::Float => text
            .parse::<f32>()
            .map(Value::Float)
            .with_context(|| format!("'{}' is not a number", text)),
        ValueType::Int32Vec => text
            .split(',')
            .filter(|item| !item.trim().is_empty())
            .map(|item| parse_int(item.trim()))
            .collect::<Result<Vec<_>>>()
            .map(Value::IntArray),
    }
}

fn parse_int(text: &str) -> Result<i32> {
    match text.strip_prefix("0x") {
        Some(hex) => i32::from_str_radix(hex, 16),
        None => text.parse::<i32>(),
    }
    .map_err(|_| anyhow!("'{}' is not an integer", text))
}

/// Offset request for a numeric action
pub fn offset_request(
    delta: &str,
    value_type: ValueType,
    elements: BTreeSet<String>,
) -> Result<OffsetRequest> {
    match parse_value(delta, value_type)? {
        Value::Int(offset) => Ok(OffsetRequest::Int { elements, offset }),
        Value::Float(offset) => Ok(OffsetRequest::Float { elements, offset }),
        _ => bail!("{:?} actions cannot be offset", value_type),
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_by_type() {
        assert_eq!(parse_value("on", ValueType::Boolean).unwrap(), Value::Bool(true));
        assert_eq!(parse_value("-3", ValueType::Int32).unwrap(), Value::Int(-3));
        assert_eq!(parse_value("0x10", ValueType::Int32).unwrap(), Value::Int(16));
        assert_eq!(parse_value("21.5", ValueType::Float).unwrap(), Value::Float(21.5));
        assert_eq!(
            parse_value("1, 2,4", ValueType::Int32Vec).unwrap(),
            Value::IntArray(vec![1, 2, 4])
        );
        assert!(parse_value("maybe", ValueType::Boolean).is_err());
        assert!(parse_value("2.5", ValueType::Int32).is_err());
    }

    #[test]
    fn test_offset_requests() {
        let seats = BTreeSet::from(["SEAT_ROW_1_LEFT".to_string()]);
        assert_eq!(
            offset_request("-2", ValueType::Int32, seats.clone()).unwrap(),
            OffsetRequest::Int {
                elements: seats.clone(),
                offset: -2
            }
        );
        assert!(offset_request("true", ValueType::Boolean, seats).is_err());
    }
}

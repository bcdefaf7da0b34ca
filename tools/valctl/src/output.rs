//! Terminal and JSON rendering of action results

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use anyhow::Result;
use colored::Colorize;
use errors::{ErrorCode, ValResult};
use serde::Serialize;
use serde_json::json;
use vehicle_actions::{ActionValue, GetResult, OffsetResult, OperationDescriptor, SetResult, ValueRange};

/// Longest range listed value by value
const MAX_LISTED_VALUES: usize = 12;

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn outcome_json<T: Serialize>(outcome: &ValResult<T>) -> serde_json::Value {
    match outcome {
        Ok(value) => json!({ "value": value }),
        Err(code) => json!({ "error": code }),
    }
}

fn print_error_line(element: &str, code: ErrorCode) {
    println!("  {:<20} {} {}", element, "ERROR".red(), code.as_str().red());
}

pub fn print_operations(operations: &[(String, OperationDescriptor)], json: bool) -> Result<()> {
    if json {
        let rows: Vec<_> = operations
            .iter()
            .map(|(category, op)| json!({ "category": category, "operation": op }))
            .collect();
        return print_json(&rows);
    }

    let mut current = "";
    for (category, op) in operations {
        if category != current {
            println!("{}", category.bright_cyan());
            current = category.as_str();
        }
        let temperature = if op.temperature { " (temperature)" } else { "" };
        println!(
            "  {:<52} {:<7} {:?}{}",
            op.name,
            op.kind.to_string().bright_yellow(),
            op.value_type,
            temperature
        );
    }
    println!("\n{} {} operations", "*".bright_blue(), operations.len());
    Ok(())
}

pub fn print_supported(action: &str, elements: Option<&BTreeSet<String>>, json: bool) -> Result<()> {
    if json {
        return print_json(&json!({
            "action": action,
            "supported": elements.is_some(),
            "elements": elements,
        }));
    }

    match elements {
        Some(elements) => {
            println!("{} {}", action.bright_yellow(), "supported".green());
            for element in elements {
                println!("  {}", element);
            }
        },
        None => println!("{} {}", action.bright_yellow(), "not supported".yellow()),
    }
    Ok(())
}

fn describe_range(range: &ValueRange) -> String {
    let values = range.values();
    if values.len() <= MAX_LISTED_VALUES {
        let listed: Vec<String> = values.iter().map(ToString::to_string).collect();
        format!("[{}]", listed.join(", "))
    } else {
        format!("{} .. {} ({} values)", range.min(), range.max(), range.len())
    }
}

pub fn print_ranges(action: &str, ranges: &BTreeMap<String, ValueRange>, json: bool) -> Result<()> {
    if json {
        return print_json(&json!({ "action": action, "ranges": ranges }));
    }

    println!("{}", action.bright_yellow());
    if ranges.is_empty() {
        println!("  no value ranges");
    }
    for (element, range) in ranges {
        println!("  {:<20} {}", element, describe_range(range));
    }
    Ok(())
}

pub fn print_get<T: Display + Serialize>(result: &GetResult<T>, json: bool) -> Result<()> {
    if json {
        let values: BTreeMap<_, _> = result
            .values
            .iter()
            .map(|(element, outcome)| (element, outcome_json(outcome)))
            .collect();
        return print_json(&json!({ "action": result.action, "values": values }));
    }

    println!("{}", result.action.bright_yellow());
    for (element, outcome) in &result.values {
        match outcome {
            Ok(value) => println!("  {:<20} {}", element, value.to_string().green()),
            Err(code) => print_error_line(element, *code),
        }
    }
    Ok(())
}

/// `requested` lists every element; the result only names the failed ones
pub fn print_set(result: &SetResult, requested: &BTreeSet<String>, json: bool) -> Result<()> {
    if json {
        return print_json(&json!({
            "action": result.action,
            "succeeded": requested.iter().filter(|e| !result.errors.contains_key(*e)).collect::<Vec<_>>(),
            "errors": result.errors,
        }));
    }

    println!("{}", result.action.bright_yellow());
    for element in requested {
        match result.errors.get(element) {
            Some(code) => print_error_line(element, *code),
            None => println!("  {:<20} {}", element, "OK".green()),
        }
    }
    Ok(())
}

pub fn print_offset(result: &OffsetResult<ActionValue>, json: bool) -> Result<()> {
    if json {
        let outputs: BTreeMap<_, _> = result
            .outputs
            .iter()
            .map(|(element, outcome)| (element, outcome_json(outcome)))
            .collect();
        return print_json(&json!({ "action": result.action, "outputs": outputs }));
    }

    println!("{}", result.action.bright_yellow());
    for (element, outcome) in &result.outputs {
        match outcome {
            Ok(value) => println!("  {:<20} {} {}", element, "->".bright_blue(), value.to_string().green()),
            Err(code) => print_error_line(element, *code),
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_short_ranges_are_listed() {
        let range = ValueRange::ints(vec![1, 2, 4]).unwrap();
        assert_eq!(describe_range(&range), "[1, 2, 4]");

        let range = ValueRange::int_span(0, 100).unwrap();
        assert_eq!(describe_range(&range), "0 .. 100 (101 values)");
    }

    #[test]
    fn test_outcome_json_uses_error_names() {
        let failed: ValResult<i32> = Err(ErrorCode::ValueAlreadySet);
        assert_eq!(outcome_json(&failed), json!({ "error": "VALUE_ALREADY_SET" }));
        assert_eq!(outcome_json(&Ok(3)), json!({ "value": 3 }));
    }
}

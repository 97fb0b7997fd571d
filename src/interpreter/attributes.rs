// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use chrono::{Datelike, NaiveTime, TimeDelta, Timelike};

use crate::error::{EvaluationError, Result, SymbolResolutionError};
use crate::number::Number;
use crate::typing::DataType;
use crate::value::Value;

use super::Interpreter;

fn missing(name: &str) -> Result<Value> {
    Err(SymbolResolutionError::new(name).into())
}

// Whole seconds of `t`, rounded towards negative infinity.
fn floor_seconds(t: &TimeDelta) -> i64 {
    match t.subsec_nanos() {
        n if n < 0 => t.num_seconds() - 1,
        _ => t.num_seconds(),
    }
}

impl<'a, T: ?Sized> Interpreter<'a, T> {
    /// Attribute lookup. Mapping keys shadow the built-in attributes.
    pub(super) fn get_attribute(&self, object: &Value, name: &str) -> Result<Value> {
        match object {
            Value::Object(fields) => {
                if let Some(v) = fields.get(&Value::from(name)) {
                    return Ok(v.clone());
                }
                match name {
                    "length" => Ok(Value::from(fields.len())),
                    "is_empty" => Ok(Value::Bool(fields.is_empty())),
                    "keys" => Ok(Value::from(fields.keys().cloned().collect::<Vec<_>>())),
                    "values" => Ok(Value::from(fields.values().cloned().collect::<Vec<_>>())),
                    _ => missing(name),
                }
            }
            Value::String(s) => match name {
                "length" => Ok(Value::from(s.chars().count())),
                "is_empty" => Ok(Value::Bool(s.is_empty())),
                "as_lower" => Ok(Value::from(s.to_lowercase())),
                "as_upper" => Ok(Value::from(s.to_uppercase())),
                "to_float" => match s.parse::<Number>() {
                    Ok(n) => Ok(Value::from(n)),
                    Err(_) => Err(EvaluationError::NotNumeric {
                        value: s.to_string(),
                    }
                    .into()),
                },
                _ => missing(name),
            },
            Value::Array(items) => match name {
                "length" => Ok(Value::from(items.len())),
                "is_empty" => Ok(Value::Bool(items.is_empty())),
                "first" => Ok(items.first().cloned().unwrap_or(Value::Null)),
                "last" => Ok(items.last().cloned().unwrap_or(Value::Null)),
                _ => missing(name),
            },
            Value::Set(items) => match name {
                "length" => Ok(Value::from(items.len())),
                "is_empty" => Ok(Value::Bool(items.is_empty())),
                _ => missing(name),
            },
            Value::DateTime(d) => match name {
                "year" => Ok(Value::from(d.year())),
                "month" => Ok(Value::from(u64::from(d.month()))),
                "day" => Ok(Value::from(u64::from(d.day()))),
                "hour" => Ok(Value::from(u64::from(d.hour()))),
                "minute" => Ok(Value::from(u64::from(d.minute()))),
                "second" => Ok(Value::from(u64::from(d.second()))),
                "weekday" => Ok(Value::from(u64::from(d.weekday().num_days_from_monday()))),
                "date" => d
                    .date_naive()
                    .and_time(NaiveTime::MIN)
                    .and_local_timezone(*d.offset())
                    .single()
                    .map(Value::from)
                    .ok_or_else(|| {
                        EvaluationError::General {
                            message: format!("no midnight for {d}"),
                        }
                        .into()
                    }),
                _ => missing(name),
            },
            Value::TimeDelta(t) => match name {
                // Whole days are floored so that `seconds` stays within a day.
                "days" => Ok(Value::from(floor_seconds(t).div_euclid(86_400))),
                "seconds" => Ok(Value::from(floor_seconds(t).rem_euclid(86_400))),
                "total_seconds" => {
                    let nanos = f64::from(t.subsec_nanos()) / 1e9;
                    Ok(Value::from(t.num_seconds() as f64 + nanos))
                }
                _ => missing(name),
            },
            Value::Number(n) => match name {
                "ceiling" => Ok(Value::from(n.ceil())),
                "floor" => Ok(Value::from(n.floor())),
                "to_str" => Ok(Value::from(n.to_string())),
                _ => missing(name),
            },
            Value::Null | Value::Bool(_) | Value::Undefined => {
                Err(EvaluationError::UnsupportedAccess {
                    kind: DataType::from_value(object),
                    access: "attribute",
                }
                .into())
            }
        }
    }
}

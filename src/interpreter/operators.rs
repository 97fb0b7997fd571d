// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::cmp::Ordering;

use crate::ast::{ArithOp, BoolOp};
use crate::error::EvaluationError;
use crate::number::Number;
use crate::typing::DataType;
use crate::value::Value;

type EvalResult<T> = Result<T, EvaluationError>;

fn type_error(op: &'static str, lhs: &Value, rhs: &Value) -> EvaluationError {
    EvaluationError::operands(op, DataType::from_value(lhs), DataType::from_value(rhs))
}

fn out_of_range(op: &'static str) -> EvaluationError {
    EvaluationError::General {
        message: format!("result of '{op}' is out of range"),
    }
}

fn to_number(s: &str) -> EvalResult<Number> {
    s.parse::<Number>()
        .map_err(|_| EvaluationError::NotNumeric {
            value: s.to_string(),
        })
}

pub(super) fn arith(op: &ArithOp, lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    let symbol = op.symbol();
    let value = match (op, lhs, rhs) {
        (_, Value::Number(a), Value::Number(b)) => Value::from(match op {
            ArithOp::Add => a.add(b),
            ArithOp::Sub => a.sub(b),
            ArithOp::Mul => a.mul(b),
            ArithOp::Div => a.divide(b)?,
            ArithOp::Mod => a.modulo(b)?,
            ArithOp::Pow => a.pow(b)?,
        }),
        (ArithOp::Add, Value::String(a), Value::String(b)) => Value::from(format!("{a}{b}")),
        (ArithOp::Add, Value::DateTime(d), Value::TimeDelta(t))
        | (ArithOp::Add, Value::TimeDelta(t), Value::DateTime(d)) => Value::from(
            d.checked_add_signed(*t)
                .ok_or_else(|| out_of_range(symbol))?,
        ),
        (ArithOp::Add, Value::TimeDelta(a), Value::TimeDelta(b)) => {
            Value::from(a.checked_add(b).ok_or_else(|| out_of_range(symbol))?)
        }
        (ArithOp::Sub, Value::DateTime(a), Value::DateTime(b)) => {
            Value::from(a.signed_duration_since(*b))
        }
        (ArithOp::Sub, Value::DateTime(d), Value::TimeDelta(t)) => Value::from(
            d.checked_sub_signed(*t)
                .ok_or_else(|| out_of_range(symbol))?,
        ),
        (ArithOp::Sub, Value::TimeDelta(a), Value::TimeDelta(b)) => {
            Value::from(a.checked_sub(b).ok_or_else(|| out_of_range(symbol))?)
        }
        _ => return Err(type_error(symbol, lhs, rhs)),
    };
    Ok(value)
}

pub(super) fn negate(operand: &Value) -> EvalResult<Value> {
    match operand {
        Value::Number(n) => Ok(Value::from(n.neg())),
        Value::TimeDelta(t) => Ok(Value::from(-*t)),
        _ => Err(EvaluationError::OperandType {
            op: "-",
            operand: DataType::from_value(operand),
        }),
    }
}

/// Equality with numeric strings coerced when compared against numbers.
/// A string that is not numeric is simply unequal.
pub fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            s.parse::<Number>().is_ok_and(|parsed| parsed == *n)
        }
        _ => lhs == rhs,
    }
}

fn ordering(op: &'static str, lhs: &Value, rhs: &Value) -> EvalResult<Ordering> {
    Ok(match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.cmp(b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
        (Value::TimeDelta(a), Value::TimeDelta(b)) => a.cmp(b),
        (Value::Number(a), Value::String(s)) => a.cmp(&to_number(s)?),
        (Value::String(s), Value::Number(b)) => to_number(s)?.cmp(b),
        _ => return Err(type_error(op, lhs, rhs)),
    })
}

pub(super) fn compare(op: &BoolOp, lhs: &Value, rhs: &Value) -> EvalResult<bool> {
    Ok(match op {
        BoolOp::Eq => values_equal(lhs, rhs),
        BoolOp::Ne => !values_equal(lhs, rhs),
        BoolOp::Lt => ordering(op.symbol(), lhs, rhs)? == Ordering::Less,
        BoolOp::Le => ordering(op.symbol(), lhs, rhs)? != Ordering::Greater,
        BoolOp::Gt => ordering(op.symbol(), lhs, rhs)? == Ordering::Greater,
        BoolOp::Ge => ordering(op.symbol(), lhs, rhs)? != Ordering::Less,
    })
}

/// Whether `container` holds `member`. Strings hold their substrings and
/// mappings hold their keys.
pub(super) fn contains(op: &'static str, container: &Value, member: &Value) -> EvalResult<bool> {
    match container {
        Value::Array(items) => Ok(items.iter().any(|item| values_equal(item, member))),
        Value::Set(items) => {
            Ok(items.contains(member) || items.iter().any(|item| values_equal(item, member)))
        }
        Value::Object(fields) => Ok(fields.contains_key(member)
            || fields.keys().any(|key| values_equal(key, member))),
        Value::String(s) => match member {
            Value::String(m) => Ok(s.contains(&**m)),
            _ => Err(type_error(op, member, container)),
        },
        _ => Err(type_error(op, member, container)),
    }
}

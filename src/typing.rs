// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt;

use crate::ast::{ArithOp, BoolOp, UnaryOp};
use crate::value::Value;

/// Closed classification of rule values. `Undefined` stands for a kind that
/// is only known once the rule is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataType {
    Undefined,
    Null,
    Boolean,
    Float,
    String,
    DateTime,
    TimeDelta,
    Array,
    Set,
    Mapping,
}

use DataType::*;

impl DataType {
    pub fn from_value(value: &Value) -> DataType {
        match value {
            Value::Undefined => Undefined,
            Value::Null => Null,
            Value::Bool(_) => Boolean,
            Value::Number(_) => Float,
            Value::String(_) => String,
            Value::DateTime(_) => DateTime,
            Value::TimeDelta(_) => TimeDelta,
            Value::Array(_) => Array,
            Value::Set(_) => Set,
            Value::Object(_) => Mapping,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Undefined => "UNDEFINED",
            Null => "NULL",
            Boolean => "BOOLEAN",
            Float => "FLOAT",
            String => "STRING",
            DateTime => "DATETIME",
            TimeDelta => "TIMEDELTA",
            Array => "ARRAY",
            Set => "SET",
            Mapping => "MAPPING",
        }
    }

    pub fn is_defined(&self) -> bool {
        *self != Undefined
    }

    /// Two kinds are compatible when they are equal or either is undefined.
    pub fn is_compatible(&self, other: DataType) -> bool {
        *self == Undefined || other == Undefined || *self == other
    }

    /// Whether values of this kind can hold members for `in` and `contains`.
    pub fn is_container(&self) -> bool {
        matches!(self, Undefined | String | Array | Set | Mapping)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Rows of (left, right, result) for each arithmetic operator.
const ADD: &[(DataType, DataType, DataType)] = &[
    (Float, Float, Float),
    (String, String, String),
    (DateTime, TimeDelta, DateTime),
    (TimeDelta, DateTime, DateTime),
    (TimeDelta, TimeDelta, TimeDelta),
];

const SUB: &[(DataType, DataType, DataType)] = &[
    (Float, Float, Float),
    (DateTime, DateTime, TimeDelta),
    (DateTime, TimeDelta, DateTime),
    (TimeDelta, TimeDelta, TimeDelta),
];

const NUMERIC: &[(DataType, DataType, DataType)] = &[(Float, Float, Float)];

const ORDERED: &[(DataType, DataType, DataType)] = &[
    (Float, Float, Boolean),
    (String, String, Boolean),
    (Boolean, Boolean, Boolean),
    (DateTime, DateTime, Boolean),
    (TimeDelta, TimeDelta, Boolean),
    (Float, String, Boolean),
    (String, Float, Boolean),
];

const REGEX: &[(DataType, DataType, DataType)] = &[(String, String, Boolean)];

// Picks the rows an operand pair may hit. An undefined operand matches any
// row; the result is exact only when every candidate row agrees on it.
fn lookup(rows: &[(DataType, DataType, DataType)], left: DataType, right: DataType) -> Option<DataType> {
    let mut result = None;
    for (l, r, out) in rows {
        if l.is_compatible(left) && r.is_compatible(right) {
            result = match result {
                None => Some(*out),
                Some(prev) if prev == *out => Some(prev),
                Some(_) => Some(Undefined),
            };
        }
    }
    result
}

/// Static result of an arithmetic operator, or `None` when no operand kinds
/// can satisfy it.
pub fn arithmetic_type(op: &ArithOp, left: DataType, right: DataType) -> Option<DataType> {
    let rows = match op {
        ArithOp::Add => ADD,
        ArithOp::Sub => SUB,
        ArithOp::Mul | ArithOp::Div | ArithOp::Mod | ArithOp::Pow => NUMERIC,
    };
    lookup(rows, left, right)
}

pub fn comparison_type(op: &BoolOp, left: DataType, right: DataType) -> Option<DataType> {
    match op {
        BoolOp::Eq | BoolOp::Ne => Some(Boolean),
        BoolOp::Lt | BoolOp::Le | BoolOp::Gt | BoolOp::Ge => lookup(ORDERED, left, right),
    }
}

pub fn regex_type(left: DataType, right: DataType) -> Option<DataType> {
    lookup(REGEX, left, right)
}

pub fn membership_type(member: DataType, container: DataType) -> Option<DataType> {
    match container {
        String if !member.is_compatible(String) => None,
        _ if container.is_container() => Some(Boolean),
        _ => None,
    }
}

pub fn unary_type(op: &UnaryOp, operand: DataType) -> Option<DataType> {
    match (op, operand) {
        (UnaryOp::Not, _) => Some(Boolean),
        (UnaryOp::Neg, Undefined | Float | TimeDelta) => Some(operand),
        (UnaryOp::Neg, _) => None,
    }
}

/// Static type of a built-in attribute, `None` when `base` has no such
/// attribute. Mapping keys are only known at evaluation time.
pub fn attribute_type(base: DataType, name: &str) -> Option<DataType> {
    let ty = match (base, name) {
        (Undefined | Mapping, _) => Undefined,
        (String | Array | Set, "length") => Float,
        (String | Array | Set, "is_empty") => Boolean,
        (String, "as_lower" | "as_upper") => String,
        (String, "to_float") => Float,
        (Array, "first" | "last") => Undefined,
        (DateTime, "year" | "month" | "day" | "hour" | "minute" | "second" | "weekday") => Float,
        (DateTime, "date") => DateTime,
        (TimeDelta, "days" | "seconds" | "total_seconds") => Float,
        (Float, "ceiling" | "floor") => Float,
        (Float, "to_str") => String,
        _ => return None,
    };
    Some(ty)
}

/// Static type of `base[index]`, `None` when the access can never succeed.
pub fn item_type(base: DataType, index: DataType) -> Option<DataType> {
    match base {
        Undefined | Mapping => Some(Undefined),
        Array if index.is_compatible(Float) => Some(Undefined),
        String if index.is_compatible(Float) => Some(String),
        _ => None,
    }
}

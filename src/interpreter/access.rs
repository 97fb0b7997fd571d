// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error::{Error, EvaluationError, Result, SymbolResolutionError};
use crate::typing::DataType;
use crate::value::Value;

use super::Interpreter;

// Name reported when a key or index is missing.
fn key_name(key: &Value) -> String {
    match key {
        Value::String(s) => s.to_string(),
        _ => key.to_string(),
    }
}

// Position `index` refers to in a sequence of `len` elements. Negative
// indexes count from the end.
fn position(index: &Value, len: usize) -> Result<Option<usize>> {
    let Value::Number(n) = index else {
        return Err(EvaluationError::InvalidIndex {
            found: DataType::from_value(index).to_string(),
        }
        .into());
    };
    let Some(i) = n.as_i64() else {
        return Err(EvaluationError::InvalidIndex {
            found: n.to_string(),
        }
        .into());
    };
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let i = if i < 0 { len + i } else { i };
    Ok(if (0..len).contains(&i) {
        usize::try_from(i).ok()
    } else {
        None
    })
}

impl<'a, T: ?Sized> Interpreter<'a, T> {
    pub(super) fn get_item(&self, object: &Value, index: &Value) -> Result<Value> {
        let missing = || -> Error { SymbolResolutionError::new(key_name(index)).into() };
        match object {
            Value::Array(items) => match position(index, items.len())? {
                Some(i) => Ok(items[i].clone()),
                None => Err(missing()),
            },
            Value::String(s) => {
                let count = s.chars().count();
                match position(index, count)?.and_then(|i| s.chars().nth(i)) {
                    Some(ch) => Ok(Value::from(ch.to_string())),
                    None => Err(missing()),
                }
            }
            Value::Object(fields) => match fields.get(index) {
                Some(v) => Ok(v.clone()),
                None => Err(missing()),
            },
            _ => Err(EvaluationError::UnsupportedAccess {
                kind: DataType::from_value(object),
                access: "item",
            }
            .into()),
        }
    }
}

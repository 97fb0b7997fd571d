// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error::EvaluationError;
use crate::number::Number;
use crate::time::format_timedelta;
use crate::typing::DataType;
use crate::Rc;

use core::fmt;
use std::collections::{BTreeMap, BTreeSet};
use std::ops;

use anyhow::{bail, Result};
use chrono::{DateTime, FixedOffset, TimeDelta};
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

// Mapping keys can be any value, so serde_json::Value is not enough.
// Variants are declared in the order used when values of different kinds
// are sorted inside sets and mapping keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(Rc<str>),
    DateTime(DateTime<FixedOffset>),
    TimeDelta(TimeDelta),
    Array(Rc<Vec<Value>>),
    Set(Rc<BTreeSet<Value>>),
    Object(Rc<BTreeMap<Value, Value>>),

    // Indicate that a value is undefined
    Undefined,
}

// Datetimes and time deltas become ISO 8601 strings and sets become arrays.
// JSON only allows string keys, so other mapping keys are written as their
// JSON text.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => b.serialize(serializer),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::DateTime(d) => serializer.collect_str(&d.to_rfc3339()),
            Value::TimeDelta(t) => serializer.collect_str(&format_timedelta(t)),
            Value::Array(items) => serializer.collect_seq(items.iter()),
            Value::Set(members) => serializer.collect_seq(members.iter()),
            Value::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries.iter() {
                    if let Value::String(name) = key {
                        map.serialize_entry(name.as_ref(), value)?;
                    } else {
                        let text = serde_json::to_string(key).map_err(ser::Error::custom)?;
                        map.serialize_entry(&text, value)?;
                    }
                }
                map.end()
            }
            Value::Undefined => serializer.serialize_str("<undefined>"),
        }
    }
}

// Builds a Value from any self-describing format (JSON, YAML).
struct ValueBuilder;

impl<'de> Visitor<'de> for ValueBuilder {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any JSON or YAML value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, inner: D) -> Result<Value, D::Error> {
        inner.deserialize_any(ValueBuilder)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<Value, E> {
        Ok(b.into())
    }

    fn visit_u64<E: de::Error>(self, n: u64) -> Result<Value, E> {
        Ok(n.into())
    }

    fn visit_i64<E: de::Error>(self, n: i64) -> Result<Value, E> {
        Ok(n.into())
    }

    fn visit_f64<E: de::Error>(self, n: f64) -> Result<Value, E> {
        Ok(n.into())
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
        Ok(s.into())
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<Value, E> {
        Ok(s.into())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut items: A) -> Result<Value, A::Error> {
        let mut out = vec![];
        while let Some(item) = items.next_element()? {
            out.push(item);
        }
        Ok(out.into())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut entries: A) -> Result<Value, A::Error> {
        let mut out = BTreeMap::new();
        while let Some((key, value)) = entries.next_entry()? {
            out.insert(key, value);
        }
        Ok(out.into())
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueBuilder)
    }
}

/// Values print as compact JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl Value {
    pub fn new_object() -> Value {
        Value::from(BTreeMap::new())
    }

    pub fn new_set() -> Value {
        Value::from(BTreeSet::new())
    }

    pub fn new_array() -> Value {
        Value::from(vec![])
    }

    pub fn from_json_str(json: &str) -> Result<Value> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_str(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(yaml: &str) -> Result<Value> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Convert any serializable host value. Shapes that have no Value
    /// counterpart, such as maps with non-string keys, are rejected.
    pub fn from_serializable<T: Serialize + ?Sized>(
        thing: &T,
    ) -> core::result::Result<Value, EvaluationError> {
        serde_json::to_value(thing)
            .and_then(serde_json::from_value)
            .map_err(|e| EvaluationError::UnsupportedValue {
                reason: e.to_string(),
            })
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! number_conversions {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(n: $ty) -> Self {
                Value::Number(n.into())
            }
        })*
    };
}

number_conversions!(i32, i64, u64, usize, f64, Number);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(d: DateTime<FixedOffset>) -> Self {
        Value::DateTime(d)
    }
}

impl From<TimeDelta> for Value {
    fn from(t: TimeDelta) -> Self {
        Value::TimeDelta(t)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items.into())
    }
}

impl From<BTreeSet<Value>> for Value {
    fn from(members: BTreeSet<Value>) -> Self {
        Value::Set(members.into())
    }
}

impl From<BTreeMap<Value, Value>> for Value {
    fn from(entries: BTreeMap<Value, Value>) -> Self {
        Value::Object(entries.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// Typed borrows of a variant. Containers also get a mutable accessor that
// clones shared storage on write.
macro_rules! accessors {
    ($($get:ident $(/ $get_mut:ident)?: $variant:ident => $ty:ty, $kind:expr;)*) => {
        $(
            pub fn $get(&self) -> Result<&$ty> {
                match self {
                    Value::$variant(inner) => Ok(inner),
                    _ => self.expected($kind),
                }
            }

            $(
                pub fn $get_mut(&mut self) -> Result<&mut $ty> {
                    match self {
                        Value::$variant(inner) => Ok(Rc::make_mut(inner)),
                        _ => self.expected($kind),
                    }
                }
            )?
        )*
    };
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Truthiness used when a rule result is turned into a match decision.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Null | Value::Undefined => false,
            Value::Number(n) => !n.is_zero(),
            Value::String(s) => !s.is_empty(),
            Value::TimeDelta(t) => !t.is_zero(),
            Value::DateTime(_) => true,
            Value::Array(a) => !a.is_empty(),
            Value::Set(s) => !s.is_empty(),
            Value::Object(o) => !o.is_empty(),
        }
    }

    fn expected<T>(&self, kind: DataType) -> Result<T> {
        bail!("expected {kind}, found {}", DataType::from_value(self))
    }

    accessors! {
        as_bool: Bool => bool, DataType::Boolean;
        as_string: String => Rc<str>, DataType::String;
        as_number: Number => Number, DataType::Float;
        as_array / as_array_mut: Array => Vec<Value>, DataType::Array;
        as_set / as_set_mut: Set => BTreeSet<Value>, DataType::Set;
        as_object / as_object_mut: Object => BTreeMap<Value, Value>, DataType::Mapping;
    }

    /// Insert `value` at `key`, turning an undefined value into an object.
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Result<()> {
        if self.is_undefined() {
            *self = Value::new_object();
        }
        match self {
            Value::Object(map) => {
                Rc::make_mut(map).insert(key.into(), value.into());
                Ok(())
            }
            _ => bail!("cannot insert into {self}"),
        }
    }
}

impl Value {
    // Member lookup shared by the `Index` impls. Absent members are undefined.
    fn member(&self, key: &Value) -> Option<&Value> {
        match (self, key) {
            (Value::Object(entries), _) => entries.get(key),
            (Value::Set(members), _) => members.get(key),
            (Value::Array(items), Value::Number(n)) => {
                usize::try_from(n.as_i64()?).ok().and_then(|i| items.get(i))
            }
            _ => None,
        }
    }
}

impl ops::Index<&Value> for Value {
    type Output = Value;

    fn index(&self, key: &Value) -> &Value {
        self.member(key).unwrap_or(&Value::Undefined)
    }
}

impl ops::Index<&str> for Value {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.member(&Value::from(key)).unwrap_or(&Value::Undefined)
    }
}

impl ops::Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        match self {
            Value::Array(items) => items.get(index).unwrap_or(&Value::Undefined),
            _ => &Value::Undefined,
        }
    }
}

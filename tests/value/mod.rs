// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use rule_engine::*;

fn eval(rule: &str) -> Result<Value> {
    Ok(Rule::new(rule)?.evaluate(&Value::new_object())?)
}

#[test]
fn json_round_trip_of_plain_data() -> Result<()> {
    let json = r#"{"a":[1,2.5,"x",null,true],"b":{"c":{}}}"#;
    let value = Value::from_json_str(json)?;
    assert_eq!(value["a"][1], Value::from(2.5));
    assert_eq!(value["b"]["c"], Value::new_object());
    assert_eq!(value.to_string(), json);
    Ok(())
}

#[test]
fn datetimes_serialize_as_rfc3339() -> Result<()> {
    let value = eval("d'2024-02-29T13:45:00+01:00'")?;
    assert_eq!(value.to_string(), r#""2024-02-29T13:45:00+01:00""#);

    let value = eval("d'2024-02-29'")?;
    assert_eq!(value.to_string(), r#""2024-02-29T00:00:00+00:00""#);
    Ok(())
}

#[test]
fn timedeltas_serialize_as_durations() -> Result<()> {
    for (rule, expected) in [
        ("t'P1DT2H'", "P1DT2H"),
        ("t'PT90M'", "PT1H30M"),
        ("t'P1W'", "P7D"),
        ("t'PT0S'", "PT0S"),
        ("t'PT1.25S'", "PT1.25S"),
        ("-t'PT5M'", "-PT5M"),
    ] {
        assert_eq!(eval(rule)?.to_string(), format!("\"{expected}\""), "{rule}");
    }
    Ok(())
}

#[test]
fn numbers_keep_their_kind() -> Result<()> {
    assert_eq!(eval("6 / 3")?.to_string(), "2");
    assert_eq!(eval("7 / 2")?.to_string(), "3.5");
    assert_eq!(eval("1.5 * 2")?.to_string(), "3.0");
    assert_eq!(eval("2 ** 62")?.to_string(), "4611686018427387904");
    Ok(())
}

#[test]
fn sets_serialize_as_sorted_arrays() -> Result<()> {
    assert_eq!(eval("{3, 1, 2, 1}")?.to_string(), "[1,2,3]");
    Ok(())
}

#[test]
fn non_string_keys_are_rendered_as_json() -> Result<()> {
    let value = eval("{1: 'one', 'two': 2}")?;
    assert_eq!(value.to_string(), r#"{"1":"one","two":2}"#);
    assert_eq!(value[&Value::from(1)], Value::from("one"));
    Ok(())
}

#[test]
fn from_serializable_converts_host_values() -> Result<()> {
    #[derive(serde::Serialize)]
    struct Account {
        owner: String,
        balance: i64,
        frozen: bool,
        limits: BTreeMap<String, f64>,
        aliases: BTreeSet<String>,
        closed_at: Option<String>,
    }

    let account = Account {
        owner: "ada".to_string(),
        balance: -20,
        frozen: false,
        limits: [("daily".to_string(), 500.0)].into_iter().collect(),
        aliases: ["a".to_string(), "b".to_string()].into_iter().collect(),
        closed_at: None,
    };
    let value = Value::from_serializable(&account)?;
    assert_eq!(value["owner"], Value::from("ada"));
    assert_eq!(value["balance"], Value::from(-20));
    assert_eq!(value["limits"]["daily"], Value::from(500));
    assert_eq!(value["aliases"][1], Value::from("b"));
    assert!(value["closed_at"].is_null());
    assert!(value["missing"].is_undefined());

    let rule = Rule::new("balance < 0 and not frozen and limits.daily >= 500")?;
    assert!(rule.matches(&value)?);
    Ok(())
}

#[test]
fn from_serializable_rejects_unrepresentable_shapes() {
    let mut by_pair = BTreeMap::new();
    by_pair.insert((1, 2), "x");
    let err = Value::from_serializable(&by_pair).unwrap_err();
    assert!(matches!(err, EvaluationError::UnsupportedValue { .. }));
}

#[test]
fn builder_helpers() -> Result<()> {
    let mut value = Value::Undefined;
    value.insert("name", "ada")?;
    value.insert("tags", vec![Value::from("x")])?;
    value.insert(1, Some(2))?;
    value.insert("nothing", None::<i64>)?;
    assert_eq!(value["name"], Value::from("ada"));
    assert_eq!(value[&Value::from(1)], Value::from(2));
    assert!(value["nothing"].is_null());
    assert!(Value::from(1).insert("k", 1).is_err());

    value.as_object_mut()?.remove(&Value::from("nothing"));
    assert_eq!(value.as_object()?.len(), 3);
    Ok(())
}

#[test]
fn truthiness() {
    for falsy in [
        Value::Null,
        Value::Undefined,
        Value::from(0),
        Value::from(0.0),
        Value::from(""),
        Value::new_array(),
        Value::new_set(),
        Value::new_object(),
    ] {
        assert!(!falsy.is_truthy(), "{falsy}");
    }
    for truthy in [Value::from(-1), Value::from("0"), Value::from(vec![Value::Null])] {
        assert!(truthy.is_truthy(), "{truthy}");
    }
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Result};
use rule_engine::*;
use serde::Deserialize;
use test_generator::test_resources;

use crate::parser::typed_context;

fn object() -> Value {
    Value::new_object()
}

fn undefined() -> Value {
    Value::Undefined
}

#[derive(Deserialize, Debug)]
struct Case {
    note: String,
    rule: String,
    #[serde(default = "object")]
    subject: Value,
    types: Option<BTreeMap<String, String>>,
    #[serde(default)]
    regex_flags: Vec<String>,
    #[serde(default = "undefined")]
    want_result: Value,
    want_match: Option<bool>,
    error: Option<String>,
    error_kind: Option<String>,
    skip: Option<bool>,
}

#[derive(Deserialize, Debug)]
struct Test {
    cases: Vec<Case>,
}

fn regex_flags(names: &[String]) -> Result<RegexFlags> {
    names.iter().try_fold(RegexFlags::empty(), |flags, name| {
        RegexFlags::from_name(name)
            .map(|f| flags | f)
            .ok_or_else(|| anyhow!("unknown regex flag {name}"))
    })
}

fn run_case(case: &Case) -> Result<(Value, bool)> {
    let context = typed_context(&case.types)?.with_regex_flags(regex_flags(&case.regex_flags)?);
    let rule = Rule::with_context(&case.rule, context).map_err(Error::from)?;
    let result = rule.evaluate(&case.subject)?;
    let matched = rule.matches(&case.subject)?;
    Ok((result, matched))
}

fn check_error(case: &Case, actual: &anyhow::Error, expected: &str) -> Result<()> {
    let message = actual.to_string();
    if !message.contains(expected) {
        bail!("Error message\n`{message}\n`\ndoes not contain `{expected}`");
    }
    if let Some(kind) = &case.error_kind {
        let Some(error) = actual.downcast_ref::<Error>() else {
            bail!("{}: not a rule error: {actual}", case.note);
        };
        let ok = match kind.as_str() {
            "syntax" => error.is_syntax(),
            "symbol" => error.is_symbol_resolution(),
            "evaluation" => error.is_evaluation(),
            _ => bail!("unknown error kind {kind}"),
        };
        if !ok {
            bail!("{}: expected {kind} error, got {error:?}", case.note);
        }
    }
    Ok(())
}

fn yaml_test_impl(file: &str) -> Result<()> {
    println!("\nrunning {file}");

    let yaml = std::fs::read_to_string(file)?;
    let test: Test = serde_yaml::from_str(&yaml)?;

    for case in &test.cases {
        print!("case {} ", &case.note);
        if case.skip == Some(true) {
            println!("skipped");
            continue;
        }

        match (run_case(case), &case.error) {
            (Ok((result, matched)), None) => {
                if !case.want_result.is_undefined() && result != case.want_result {
                    bail!(
                        "{}: result {result} does not match {}",
                        case.note,
                        case.want_result
                    );
                }
                if let Some(want) = case.want_match {
                    if matched != want {
                        bail!("{}: matched {matched}, expected {want}", case.note);
                    }
                }
                if matched != result.is_truthy() {
                    bail!("{}: match disagrees with result {result}", case.note);
                }
            }
            (Ok((result, _)), Some(expected)) => {
                bail!("{}: expected error `{expected}`, got {result}", case.note)
            }
            (Err(actual), Some(expected)) => check_error(case, &actual, expected)?,
            (Err(actual), None) => return Err(actual),
        }

        println!("passed");
    }
    println!("{} cases passed.", test.cases.len());
    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{}", e);
        }
    }
}

#[test_resources("tests/rules/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}

#[derive(serde::Serialize)]
struct Order {
    id: u32,
    amount: f64,
    currency: &'static str,
    tags: Vec<&'static str>,
}

fn orders() -> Vec<Order> {
    vec![
        Order {
            id: 1,
            amount: 250.0,
            currency: "USD",
            tags: vec!["priority"],
        },
        Order {
            id: 2,
            amount: 40.0,
            currency: "USD",
            tags: vec![],
        },
        Order {
            id: 3,
            amount: 990.5,
            currency: "EUR",
            tags: vec!["priority", "gift"],
        },
        Order {
            id: 4,
            amount: 120.0,
            currency: "USD",
            tags: vec!["gift"],
        },
    ]
}

#[test]
fn filter_serialized_host_objects() -> Result<()> {
    let subjects = orders()
        .iter()
        .map(Value::from_serializable)
        .collect::<core::result::Result<Vec<_>, _>>()?;
    let rule = Rule::new("amount > 100 and currency == 'USD'")?;
    let ids = rule
        .filter(&subjects)
        .map(|order| -> Result<Value> { Ok(order?["id"].clone()) })
        .collect::<Result<Vec<Value>>>()?;
    assert_eq!(ids, [Value::from(1), Value::from(4)]);

    let rule = Rule::new("'gift' in tags")?;
    let ids = rule
        .filter(subjects.iter())
        .map(|order| -> Result<Value> { Ok(order?["id"].clone()) })
        .collect::<Result<Vec<Value>>>()?;
    assert_eq!(ids, [Value::from(3), Value::from(4)]);
    Ok(())
}

#[test]
fn custom_resolver_over_host_type() -> Result<()> {
    let context = Context::with_resolver(|order: &Order, name: &str| match name {
        "id" => Ok(Value::from(u64::from(order.id))),
        "amount" => Ok(Value::from(order.amount)),
        "currency" => Ok(Value::from(order.currency)),
        "tags" => Ok(Value::from(
            order.tags.iter().map(|t| Value::from(*t)).collect::<Vec<_>>(),
        )),
        _ => Err(SymbolResolutionError::new(name).into()),
    });
    let rule = Rule::with_context("tags.length > 0 and currency != 'EUR'", context)?;
    let matched: Vec<u32> = rule
        .filter(orders())
        .map(|order| order.map(|o| o.id))
        .collect::<rule_engine::Result<_>>()?;
    assert_eq!(matched, [1, 4]);

    let err = Rule::with_context(
        "discount > 0",
        Context::with_resolver(|_: &Order, name: &str| {
            Err(SymbolResolutionError::new(name).into())
        }),
    )?
    .matches(&orders()[0])
    .unwrap_err();
    assert!(matches!(err, Error::SymbolResolution(ref e) if e.name == "discount"));
    Ok(())
}

#[test]
fn rules_compiled_against_a_sample_reject_bad_types() -> Result<()> {
    let sample = Value::from_serializable(&orders()[0])?;
    let context = Context::new().with_type_resolver(type_resolver_from_value(&sample));
    assert!(Rule::with_context("amount * 1.1 > 100", context.clone()).is_ok());

    let err = Rule::with_context("currency - 1", context).unwrap_err();
    assert_eq!(err.position(), Some((1, 10)));
    assert!(err
        .to_string()
        .contains("unsupported operand types for '-': STRING and FLOAT"));
    Ok(())
}

#[test]
fn context_records_symbols_of_compiled_rule() -> Result<()> {
    let rule = Rule::new("customer.tier == 'gold' or total[0] > limit")?;
    let symbols: Vec<&str> = rule.symbols().iter().map(String::as_str).collect();
    assert_eq!(symbols, ["customer", "limit", "total"]);
    Ok(())
}

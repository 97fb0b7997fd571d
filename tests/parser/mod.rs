// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Result};
use rule_engine::*;
use serde::Deserialize;
use test_generator::test_resources;

pub fn data_type(name: &str) -> Result<DataType> {
    Ok(match name {
        "UNDEFINED" => DataType::Undefined,
        "NULL" => DataType::Null,
        "BOOLEAN" => DataType::Boolean,
        "FLOAT" => DataType::Float,
        "STRING" => DataType::String,
        "DATETIME" => DataType::DateTime,
        "TIMEDELTA" => DataType::TimeDelta,
        "ARRAY" => DataType::Array,
        "SET" => DataType::Set,
        "MAPPING" => DataType::Mapping,
        _ => bail!("unknown data type {name}"),
    })
}

/// Context whose type resolver reports the given static types.
pub fn typed_context(types: &Option<BTreeMap<String, String>>) -> Result<Context> {
    let Some(types) = types else {
        return Ok(Context::new());
    };
    let types = types
        .iter()
        .map(|(name, ty)| Ok((name.clone(), data_type(ty)?)))
        .collect::<Result<BTreeMap<String, DataType>>>()?;
    Ok(Context::new().with_type_resolver(move |name: &str| {
        types.get(name).copied().unwrap_or(DataType::Undefined)
    }))
}

#[derive(Deserialize, Debug)]
struct Case {
    note: String,
    rule: String,
    types: Option<BTreeMap<String, String>>,
    symbols: Option<Vec<String>>,
    data_type: Option<String>,
    error: Option<String>,
    position: Option<(u32, u32)>,
}

#[derive(Deserialize, Debug)]
struct Test {
    cases: Vec<Case>,
}

fn yaml_test_impl(file: &str) -> Result<()> {
    println!("\nrunning {file}");

    let yaml = std::fs::read_to_string(file)?;
    let test: Test = serde_yaml::from_str(&yaml)?;

    for case in &test.cases {
        print!("case {} ", &case.note);
        let context = typed_context(&case.types)?;

        match (Rule::with_context(&case.rule, context), &case.error) {
            (Ok(rule), None) => {
                if !Rule::is_valid(&case.rule) {
                    bail!("{}: compiled but reported invalid", case.note);
                }
                if let Some(symbols) = &case.symbols {
                    let actual: Vec<&String> = rule.symbols().iter().collect();
                    let expected: Vec<&String> = symbols.iter().collect();
                    if actual != expected {
                        bail!("{}: symbols {actual:?} != {expected:?}", case.note);
                    }
                }
                if let Some(ty) = &case.data_type {
                    let expected = data_type(ty)?;
                    if rule.data_type() != expected {
                        bail!("{}: type {} != {expected}", case.note, rule.data_type());
                    }
                }
            }
            (Ok(rule), Some(expected)) => {
                bail!("{}: expected error `{expected}`, compiled {rule:?}", case.note)
            }
            (Err(actual), Some(expected)) => {
                let message = actual.to_string();
                if !message.contains(expected.as_str()) {
                    bail!("Error message\n`{message}\n`\ndoes not contain `{expected}`");
                }
                if let Some(position) = case.position {
                    let found = actual
                        .position()
                        .ok_or_else(|| anyhow!("{}: error has no position", case.note))?;
                    if found != position {
                        bail!("{}: error at {found:?}, expected {position:?}", case.note);
                    }
                }
            }
            (Err(actual), None) => return Err(actual.into()),
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

#[test_resources("tests/parser/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}

#[test]
fn validity_is_grammar_only() {
    assert!(Rule::is_valid("a < b"));
    assert!(Rule::is_valid("missing.attribute[1] =~ other"));
    for text in ["(a", "a)", "((a == 1)", "a == (1))", "a <> b", "a === b", "a ! b"] {
        assert!(!Rule::is_valid(text), "{text}");
    }
    let nested = format!("{}1{}", "(".repeat(1000), ")".repeat(1000));
    assert!(!Rule::is_valid(&nested));
    assert!(Rule::new(&nested)
        .unwrap_err()
        .to_string()
        .contains("nests too deeply"));
}

#[test]
fn failed_compilation_leaves_no_symbols() {
    let mut context = Context::new();
    assert!(unstable::parse("a == 1 and b ==", &mut context).is_err());
    assert!(context.symbols().is_empty());
}

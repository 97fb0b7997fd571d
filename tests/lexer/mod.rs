// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::{bail, Result};
use rule_engine::unstable::*;
use serde::Deserialize;
use test_generator::test_resources;

fn get_tokens(source: &Source) -> Result<Vec<Token>> {
    let mut tokens = vec![];
    let mut lex = Lexer::new(source);
    loop {
        let tok = lex.next_token()?;
        if tok.0 == TokenKind::Eof {
            break;
        }
        tokens.push(tok);
    }
    Ok(tokens)
}

// The caret printed under a token must point at the token's text.
fn check_loc(tok: &Token) -> Result<()> {
    let msg = tok.1.source.message(tok.1.line, tok.1.col, "", "");
    let lines: Vec<&str> = msg.split('\n').collect();
    let source_line = lines[3].trim_start_matches(|c: char| c.is_ascii_digit() || c == ' ');
    let caret_line = lines[4].trim_start_matches(' ');
    let (Some(source_line), Some(caret_line)) = (
        source_line.strip_prefix("| "),
        caret_line.strip_prefix("| "),
    ) else {
        bail!("unexpected message layout {msg}");
    };
    let Some(col) = caret_line.find('^') else {
        bail!("could not find caret for {tok:?} {msg}");
    };
    let at = source_line.get(col..).unwrap_or_default();
    if !at.starts_with(tok.1.text()) {
        bail!("location mismatch for {tok:?} {msg}");
    }
    Ok(())
}

#[derive(Deserialize, Debug)]
struct Case {
    note: String,
    text: String,
    tokens: Option<Vec<String>>,
    kinds: Option<Vec<String>>,
    error: Option<String>,
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
        let source = Source::from_contents("case".to_string(), case.text.clone())?;

        match (get_tokens(&source), &case.error) {
            (Ok(tokens), None) => {
                if let Some(expected) = &case.tokens {
                    let texts: Vec<&str> = tokens.iter().map(|t| t.1.text()).collect();
                    assert_eq!(&texts, expected, "{}", case.note);
                }
                if let Some(expected) = &case.kinds {
                    let kinds: Vec<String> = tokens.iter().map(|t| format!("{:?}", t.0)).collect();
                    assert_eq!(&kinds, expected, "{}", case.note);
                }
                for tok in &tokens {
                    check_loc(tok)?;
                }
            }
            (Ok(tokens), Some(expected)) => {
                bail!("expected error `{expected}`, lexed {tokens:?}")
            }
            (Err(actual), Some(expected)) => {
                let actual = actual.to_string();
                if !actual.contains(expected.as_str()) {
                    bail!("Error message\n`{actual}\n`\ndoes not contain `{expected}`");
                }
            }
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

#[test_resources("tests/lexer/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}

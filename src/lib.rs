// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod ast;
mod context;
mod error;
mod interpreter;
mod lexer;
mod number;
mod parser;
mod rule;
mod time;
mod typing;
mod value;

#[cfg(feature = "arc")]
pub(crate) use std::sync::Arc as Rc;
#[cfg(not(feature = "arc"))]
pub(crate) use std::rc::Rc;

pub use context::{
    resolve_attribute, resolve_item, type_resolver_from_value, Attributes, Context, RegexFlags,
    Resolver, TypeResolver,
};
pub use error::{Error, EvaluationError, Result, RuleSyntaxError, SymbolResolutionError};
pub use number::Number;
pub use rule::{Filter, Rule};
pub use typing::DataType;
pub use value::Value;

/// Items in `unstable` are likely to change.
pub mod unstable {
    pub use crate::ast::*;
    pub use crate::interpreter::{values_equal, Interpreter};
    pub use crate::lexer::*;
    pub use crate::parser::*;
}

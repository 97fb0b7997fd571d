// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Tree-walking evaluation of compiled rules.
//!
//! Expressions are evaluated against a subject through the resolver of the
//! [`Context`] they were compiled with. Evaluation never mutates the context.

mod access;
mod attributes;
mod eval;
mod operators;


use crate::ast::Expr;
use crate::context::Context;
use crate::error::Result;
use crate::value::Value;

pub use operators::values_equal;

pub struct Interpreter<'a, T: ?Sized> {
    context: &'a Context<T>,
    thing: &'a T,
}

impl<'a, T: ?Sized> Interpreter<'a, T> {
    pub fn new(context: &'a Context<T>, thing: &'a T) -> Self {
        Self { context, thing }
    }

    /// Evaluate `expr` and return its value.
    pub fn evaluate(&self, expr: &Expr) -> Result<Value> {
        self.eval_expr(expr)
    }

    /// Evaluate `expr` and reduce the result to its truthiness.
    pub fn evaluate_bool(&self, expr: &Expr) -> Result<bool> {
        Ok(self.eval_expr(expr)?.is_truthy())
    }
}

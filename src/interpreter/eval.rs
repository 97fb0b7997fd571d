// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::{BTreeMap, BTreeSet};

use crate::ast::{Expr, LogicOp, MatchOp, MembershipOp, Ref, UnaryOp};
use crate::error::{EvaluationError, Result};
use crate::typing::DataType;
use crate::value::Value;

use super::operators;
use super::Interpreter;

impl<'a, T: ?Sized> Interpreter<'a, T> {
    pub(super) fn eval_expr(&self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal { value, .. } => Ok(value.clone()),
            Expr::Array { items, .. } => Ok(Value::from(self.eval_items(items)?)),
            Expr::Set { items, .. } => {
                let set: BTreeSet<Value> = self.eval_items(items)?.into_iter().collect();
                Ok(Value::from(set))
            }
            Expr::Mapping { fields, .. } => {
                let mut map = BTreeMap::new();
                for (key, value) in fields {
                    map.insert(self.eval_expr(key)?, self.eval_expr(value)?);
                }
                Ok(Value::from(map))
            }
            Expr::Symbol { name, .. } => self.eval_symbol(name),
            Expr::Attribute { object, name, .. } => {
                let object = self.eval_expr(object)?;
                self.get_attribute(&object, name)
            }
            Expr::Item { object, index, .. } => {
                let object = self.eval_expr(object)?;
                let index = self.eval_expr(index)?;
                self.get_item(&object, &index)
            }
            Expr::Unary { op, operand, .. } => {
                let operand = self.eval_expr(operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
                    UnaryOp::Neg => Ok(operators::negate(&operand)?),
                }
            }
            Expr::Arith { op, lhs, rhs, .. } => {
                let (lhs, rhs) = (self.eval_expr(lhs)?, self.eval_expr(rhs)?);
                Ok(operators::arith(op, &lhs, &rhs)?)
            }
            Expr::Compare { op, lhs, rhs, .. } => {
                let (lhs, rhs) = (self.eval_expr(lhs)?, self.eval_expr(rhs)?);
                Ok(Value::Bool(operators::compare(op, &lhs, &rhs)?))
            }
            Expr::Membership { op, lhs, rhs, .. } => {
                let (lhs, rhs) = (self.eval_expr(lhs)?, self.eval_expr(rhs)?);
                let found = match op {
                    MembershipOp::In | MembershipOp::NotIn => {
                        operators::contains(op.symbol(), &rhs, &lhs)?
                    }
                    MembershipOp::Contains => operators::contains(op.symbol(), &lhs, &rhs)?,
                };
                Ok(Value::Bool(found != (*op == MembershipOp::NotIn)))
            }
            Expr::RegexMatch {
                op, lhs, rhs, regex, ..
            } => self.eval_regex_match(op, lhs, rhs, regex.as_ref()),
            Expr::Logical { op, lhs, rhs, .. } => self.eval_logical(op, lhs, rhs),
        }
    }

    fn eval_items(&self, items: &[Ref<Expr>]) -> Result<Vec<Value>> {
        items.iter().map(|item| self.eval_expr(item)).collect()
    }

    fn eval_symbol(&self, name: &str) -> Result<Value> {
        log::trace!("resolving symbol '{name}'");
        self.context.resolve(self.thing, name)
    }

    fn eval_logical(&self, op: &LogicOp, lhs: &Expr, rhs: &Expr) -> Result<Value> {
        let left = self.eval_expr(lhs)?.is_truthy();
        match (op, left) {
            (LogicOp::And, false) | (LogicOp::Or, true) => {
                log::trace!("short-circuit {op:?} at {:?}", lhs.span());
                Ok(Value::Bool(left))
            }
            _ => Ok(Value::Bool(self.eval_expr(rhs)?.is_truthy())),
        }
    }

    fn eval_regex_match(
        &self,
        op: &MatchOp,
        lhs: &Expr,
        rhs: &Expr,
        compiled: Option<&regex::Regex>,
    ) -> Result<Value> {
        let (subject, pattern) = (self.eval_expr(lhs)?, self.eval_expr(rhs)?);
        let (Value::String(subject), Value::String(pattern)) = (&subject, &pattern) else {
            return Err(EvaluationError::operands(
                op.symbol(),
                DataType::from_value(&subject),
                DataType::from_value(&pattern),
            )
            .into());
        };

        let found = match compiled {
            Some(regex) => regex.is_match(subject),
            None => self
                .context
                .regex_flags()
                .compile(pattern, op.is_anchored())
                .map_err(|e| EvaluationError::InvalidRegex {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                })?
                .is_match(subject),
        };
        Ok(Value::Bool(found != op.is_negated()))
    }
}

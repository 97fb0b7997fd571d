// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Expr, Ref};
use crate::error::RuleSyntaxError;
use crate::lexer::{unescape, TokenKind};
use crate::number::Number;
use crate::time::{parse_datetime, parse_timedelta};
use crate::typing;
use crate::value::Value;

use super::{Parser, RESERVED_WORDS};

impl<'source, 'ctx, T: ?Sized> Parser<'source, 'ctx, T> {
    /// Attribute and item access chained onto a primary expression.
    pub(super) fn parse_postfix_expr(&mut self) -> Result<Ref<Expr>, RuleSyntaxError> {
        let mut expr = self.parse_primary_expr()?;
        loop {
            if self.is_symbol(".") {
                self.advance()?;
                if self.current.0 != TokenKind::Ident {
                    return Err(self.current.1.error(&format!(
                        "expecting attribute name, found {}",
                        self.describe_current()
                    )));
                }
                let name_span = self.current_span();
                let name = name_span.text();
                let base = expr.data_type();
                let data_type = typing::attribute_type(base, name).ok_or_else(|| {
                    name_span.error(&format!("{base} has no attribute '{name}'"))
                })?;
                self.advance()?;
                expr = Ref::new(Expr::Attribute {
                    span: expr.span().to(&name_span),
                    name: name.into(),
                    object: expr,
                    data_type,
                });
            } else if self.is_symbol("[") {
                let open = self.current_span();
                self.advance()?;
                let index = self.parse_or_expr()?;
                let close = self.expect_symbol("]")?;
                let (base, index_type) = (expr.data_type(), index.data_type());
                let data_type = typing::item_type(base, index_type).ok_or_else(|| {
                    open.error(&format!("{base} cannot be indexed by {index_type}"))
                })?;
                expr = Ref::new(Expr::Item {
                    span: expr.span().to(&close),
                    object: expr,
                    index,
                    data_type,
                });
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_primary_expr(&mut self) -> Result<Ref<Expr>, RuleSyntaxError> {
        let span = self.current_span();
        let value = match self.current.0 {
            TokenKind::Number => match span.text().parse::<Number>() {
                Ok(n) => Value::from(n),
                Err(_) => return Err(span.error("invalid number")),
            },
            TokenKind::String => Value::from(unescape(&span)?),
            TokenKind::DateTime => {
                Value::from(parse_datetime(&unescape(&span)?).map_err(|e| span.error(&e))?)
            }
            TokenKind::TimeDelta => {
                Value::from(parse_timedelta(&unescape(&span)?).map_err(|e| span.error(&e))?)
            }
            TokenKind::Ident => match span.text() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "null" => Value::Null,
                name if RESERVED_WORDS.contains(&name) => {
                    return Err(span.error(&format!("unexpected keyword '{name}'")));
                }
                _ => return self.parse_symbol(),
            },
            TokenKind::Symbol => match span.text() {
                "(" => {
                    self.advance()?;
                    let expr = self.parse_or_expr()?;
                    self.expect_symbol(")")?;
                    return Ok(expr);
                }
                "[" => return self.parse_array(),
                "{" => return self.parse_braces(),
                _ => return Err(self.unexpected()),
            },
            TokenKind::Eof => return Err(self.unexpected()),
        };
        self.advance()?;
        Ok(Ref::new(Expr::Literal { span, value }))
    }

    fn parse_symbol(&mut self) -> Result<Ref<Expr>, RuleSyntaxError> {
        let span = self.current_span();
        let name = span.text();
        let data_type = self.context.resolve_type(name);
        if !self.symbols.contains(name) {
            self.symbols.insert(name.to_string());
        }
        self.advance()?;
        Ok(Ref::new(Expr::Symbol {
            name: name.into(),
            data_type,
            span,
        }))
    }

    // Comma separated expressions up to `close`. A trailing comma is allowed.
    fn parse_items(&mut self, close: &str) -> Result<Vec<Ref<Expr>>, RuleSyntaxError> {
        let mut items = vec![];
        while !self.is_symbol(close) {
            items.push(self.parse_or_expr()?);
            if !self.is_symbol(",") {
                break;
            }
            self.advance()?;
        }
        Ok(items)
    }

    fn parse_array(&mut self) -> Result<Ref<Expr>, RuleSyntaxError> {
        let open = self.expect_symbol("[")?;
        let items = self.parse_items("]")?;
        let close = self.expect_symbol("]")?;
        Ok(Ref::new(Expr::Array {
            span: open.to(&close),
            items,
        }))
    }

    // `{}` is an empty mapping, `{a, b}` a set and `{k: v}` a mapping.
    fn parse_braces(&mut self) -> Result<Ref<Expr>, RuleSyntaxError> {
        let open = self.expect_symbol("{")?;
        if self.is_symbol("}") {
            let close = self.expect_symbol("}")?;
            return Ok(Ref::new(Expr::Mapping {
                span: open.to(&close),
                fields: vec![],
            }));
        }

        let first = self.parse_or_expr()?;
        if !self.is_symbol(":") {
            let mut items = vec![first];
            if self.is_symbol(",") {
                self.advance()?;
                items.extend(self.parse_items("}")?);
            }
            let close = self.expect_symbol("}")?;
            return Ok(Ref::new(Expr::Set {
                span: open.to(&close),
                items,
            }));
        }

        let mut fields = vec![];
        let mut key = first;
        loop {
            self.expect_symbol(":")?;
            let value = self.parse_or_expr()?;
            fields.push((key, value));
            if !self.is_symbol(",") {
                break;
            }
            self.advance()?;
            if self.is_symbol("}") {
                break;
            }
            key = self.parse_or_expr()?;
        }
        let close = self.expect_symbol("}")?;
        Ok(Ref::new(Expr::Mapping {
            span: open.to(&close),
            fields,
        }))
    }
}


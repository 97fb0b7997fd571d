// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{ArithOp, BoolOp, Expr, LogicOp, MatchOp, MembershipOp, Ref, UnaryOp};
use crate::error::RuleSyntaxError;
use crate::lexer::{Span, TokenKind};
use crate::typing::{self, DataType};
use crate::value::Value;

use super::Parser;

enum ComparisonOp {
    Compare(BoolOp),
    Membership(MembershipOp),
    Regex(MatchOp),
}

fn operand_error(span: &Span, op: &str, left: DataType, right: DataType) -> RuleSyntaxError {
    span.error(&format!(
        "unsupported operand types for '{op}': {left} and {right}"
    ))
}

impl<'source, 'ctx, T: ?Sized> Parser<'source, 'ctx, T> {
    pub(super) fn parse_or_expr(&mut self) -> Result<Ref<Expr>, RuleSyntaxError> {
        self.nested(Self::parse_or_chain)
    }

    fn parse_or_chain(&mut self) -> Result<Ref<Expr>, RuleSyntaxError> {
        let mut lhs = self.parse_and_expr()?;
        while self.is_keyword("or") {
            self.advance()?;
            let rhs = self.parse_and_expr()?;
            lhs = Ref::new(Expr::Logical {
                span: lhs.span().to(rhs.span()),
                op: LogicOp::Or,
                lhs,
                rhs,
            });
        }
        Ok(lhs)
    }

    fn parse_and_expr(&mut self) -> Result<Ref<Expr>, RuleSyntaxError> {
        let mut lhs = self.parse_not_expr()?;
        while self.is_keyword("and") {
            self.advance()?;
            let rhs = self.parse_not_expr()?;
            lhs = Ref::new(Expr::Logical {
                span: lhs.span().to(rhs.span()),
                op: LogicOp::And,
                lhs,
                rhs,
            });
        }
        Ok(lhs)
    }

    fn parse_not_expr(&mut self) -> Result<Ref<Expr>, RuleSyntaxError> {
        if !self.is_keyword("not") {
            return self.parse_comparison_expr();
        }
        let span = self.current_span();
        self.advance()?;
        let operand = self.nested(Self::parse_not_expr)?;
        Ok(Ref::new(Expr::Unary {
            span: span.to(operand.span()),
            op: UnaryOp::Not,
            operand,
            data_type: DataType::Boolean,
        }))
    }

    fn comparison_op(&mut self) -> Result<Option<ComparisonOp>, RuleSyntaxError> {
        let op = match self.current.0 {
            TokenKind::Symbol => match self.current_text() {
                "==" => ComparisonOp::Compare(BoolOp::Eq),
                "!=" => ComparisonOp::Compare(BoolOp::Ne),
                "<" => ComparisonOp::Compare(BoolOp::Lt),
                "<=" => ComparisonOp::Compare(BoolOp::Le),
                ">" => ComparisonOp::Compare(BoolOp::Gt),
                ">=" => ComparisonOp::Compare(BoolOp::Ge),
                "=~" => ComparisonOp::Regex(MatchOp::Match),
                "=~~" => ComparisonOp::Regex(MatchOp::Search),
                "!~" => ComparisonOp::Regex(MatchOp::NotMatch),
                "!~~" => ComparisonOp::Regex(MatchOp::NotSearch),
                _ => return Ok(None),
            },
            TokenKind::Ident if self.is_keyword("in") => ComparisonOp::Membership(MembershipOp::In),
            TokenKind::Ident if self.is_keyword("contains") => {
                ComparisonOp::Membership(MembershipOp::Contains)
            }
            TokenKind::Ident if self.is_keyword("not") && self.next_is_keyword("in")? => {
                // consume 'not' here, 'in' below
                self.advance()?;
                ComparisonOp::Membership(MembershipOp::NotIn)
            }
            _ => return Ok(None),
        };
        Ok(Some(op))
    }

    fn parse_comparison_expr(&mut self) -> Result<Ref<Expr>, RuleSyntaxError> {
        let mut lhs = self.parse_additive_expr()?;
        loop {
            let op_span = self.current_span();
            let Some(op) = self.comparison_op()? else {
                break;
            };
            self.advance()?;
            let rhs = self.parse_additive_expr()?;
            let span = lhs.span().to(rhs.span());
            let (left, right) = (lhs.data_type(), rhs.data_type());

            lhs = match op {
                ComparisonOp::Compare(op) => {
                    if typing::comparison_type(&op, left, right).is_none() {
                        return Err(operand_error(&op_span, op.symbol(), left, right));
                    }
                    Ref::new(Expr::Compare { span, op, lhs, rhs })
                }
                ComparisonOp::Membership(op) => {
                    let (member, container) = match op {
                        MembershipOp::Contains => (right, left),
                        MembershipOp::In | MembershipOp::NotIn => (left, right),
                    };
                    if typing::membership_type(member, container).is_none() {
                        return Err(operand_error(&op_span, op.symbol(), left, right));
                    }
                    Ref::new(Expr::Membership { span, op, lhs, rhs })
                }
                ComparisonOp::Regex(op) => {
                    if typing::regex_type(left, right).is_none() {
                        return Err(operand_error(&op_span, op.symbol(), left, right));
                    }
                    let regex = match rhs.as_ref() {
                        Expr::Literal {
                            value: Value::String(pattern),
                            span: pattern_span,
                        } => Some(
                            self.context
                                .regex_flags()
                                .compile(pattern, op.is_anchored())
                                .map_err(|e| {
                                    pattern_span
                                        .error(&format!("invalid regular expression: {e}"))
                                })?,
                        ),
                        _ => None,
                    };
                    Ref::new(Expr::RegexMatch {
                        span,
                        op,
                        lhs,
                        rhs,
                        regex,
                    })
                }
            };
        }
        Ok(lhs)
    }

    fn make_arith(
        &self,
        op: ArithOp,
        op_span: &Span,
        lhs: Ref<Expr>,
        rhs: Ref<Expr>,
    ) -> Result<Ref<Expr>, RuleSyntaxError> {
        let (left, right) = (lhs.data_type(), rhs.data_type());
        let data_type = typing::arithmetic_type(&op, left, right)
            .ok_or_else(|| operand_error(op_span, op.symbol(), left, right))?;
        Ok(Ref::new(Expr::Arith {
            span: lhs.span().to(rhs.span()),
            op,
            lhs,
            rhs,
            data_type,
        }))
    }

    fn parse_additive_expr(&mut self) -> Result<Ref<Expr>, RuleSyntaxError> {
        let mut lhs = self.parse_multiplicative_expr()?;
        loop {
            let op = if self.is_symbol("+") {
                ArithOp::Add
            } else if self.is_symbol("-") {
                ArithOp::Sub
            } else {
                break;
            };
            let op_span = self.current_span();
            self.advance()?;
            let rhs = self.parse_multiplicative_expr()?;
            lhs = self.make_arith(op, &op_span, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Ref<Expr>, RuleSyntaxError> {
        let mut lhs = self.parse_unary_expr()?;
        loop {
            let op = match self.current_text() {
                "*" if self.current.0 == TokenKind::Symbol => ArithOp::Mul,
                "/" if self.current.0 == TokenKind::Symbol => ArithOp::Div,
                "%" if self.current.0 == TokenKind::Symbol => ArithOp::Mod,
                _ => break,
            };
            let op_span = self.current_span();
            self.advance()?;
            let rhs = self.parse_unary_expr()?;
            lhs = self.make_arith(op, &op_span, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_unary_expr(&mut self) -> Result<Ref<Expr>, RuleSyntaxError> {
        if !self.is_symbol("-") {
            return self.parse_power_expr();
        }
        let op_span = self.current_span();
        self.advance()?;
        let operand = self.nested(Self::parse_unary_expr)?;
        let span = op_span.to(operand.span());

        // Fold negative number literals.
        if let Expr::Literal {
            value: Value::Number(n),
            ..
        } = operand.as_ref()
        {
            return Ok(Ref::new(Expr::Literal {
                span,
                value: Value::Number(n.neg()),
            }));
        }

        let data_type = typing::unary_type(&UnaryOp::Neg, operand.data_type()).ok_or_else(|| {
            op_span.error(&format!(
                "unsupported operand type for '-': {}",
                operand.data_type()
            ))
        })?;
        Ok(Ref::new(Expr::Unary {
            span,
            op: UnaryOp::Neg,
            operand,
            data_type,
        }))
    }

    fn parse_power_expr(&mut self) -> Result<Ref<Expr>, RuleSyntaxError> {
        let base = self.parse_postfix_expr()?;
        if !self.is_symbol("**") {
            return Ok(base);
        }
        let op_span = self.current_span();
        self.advance()?;
        // Right associative, and the exponent may carry its own sign.
        let exponent = self.nested(Self::parse_unary_expr)?;
        self.make_arith(ArithOp::Pow, &op_span, base, exponent)
    }
}

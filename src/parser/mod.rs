// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod expressions;
mod primary;


use std::collections::BTreeSet;

use crate::ast::{Expr, Ref};
use crate::context::Context;
use crate::error::RuleSyntaxError;
use crate::lexer::{Lexer, Source, Span, Token, TokenKind};

/// Words that cannot be used as symbol names.
pub const RESERVED_WORDS: [&str; 8] = [
    "and", "contains", "false", "in", "not", "null", "or", "true",
];

/// Compile rule text. Symbols referenced by the rule are recorded into
/// `context` once the whole text has been parsed successfully.
pub fn parse<T: ?Sized>(text: &str, context: &mut Context<T>) -> Result<Ref<Expr>, RuleSyntaxError> {
    if text.trim().is_empty() {
        return Err(RuleSyntaxError::new("empty rule"));
    }
    let source = Source::from_contents("<rule>".to_string(), text.to_string())?;
    let (expr, symbols) = Parser::parse(&source, context)?;
    for name in &symbols {
        context.record_symbol(name);
    }
    Ok(expr)
}

/// Check grammar only. Every symbol is treated as having an undefined type.
pub fn parse_syntax(text: &str) -> Result<Ref<Expr>, RuleSyntaxError> {
    let mut context = Context::new();
    parse(text, &mut context)
}

/// Deepest nesting of groups, collections, `not`, unary minus and powers a
/// rule may use.
pub const MAX_NESTING: u32 = 64;

pub struct Parser<'source, 'ctx, T: ?Sized> {
    pub(super) lexer: Lexer<'source>,
    pub(super) current: Token,
    pub(super) context: &'ctx Context<T>,
    pub(super) symbols: BTreeSet<String>,
    depth: u32,
}

impl<'source, 'ctx, T: ?Sized> Parser<'source, 'ctx, T> {
    pub fn parse(
        source: &'source Source,
        context: &'ctx Context<T>,
    ) -> Result<(Ref<Expr>, BTreeSet<String>), RuleSyntaxError> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        let mut parser = Self {
            lexer,
            current,
            context,
            symbols: BTreeSet::new(),
            depth: 0,
        };

        let expr = parser.parse_or_expr()?;
        if parser.current.0 != TokenKind::Eof {
            return Err(parser.unexpected());
        }
        Ok((expr, parser.symbols))
    }

    /// Run `parse` one nesting level deeper. The level is not restored on
    /// error since parsing stops at the first error.
    pub(super) fn nested<R>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<R, RuleSyntaxError>,
    ) -> Result<R, RuleSyntaxError> {
        if self.depth >= MAX_NESTING {
            return Err(self.current.1.error(&format!(
                "rule nests too deeply, at most {MAX_NESTING} levels are allowed"
            )));
        }
        self.depth += 1;
        let parsed = parse(self)?;
        self.depth -= 1;
        Ok(parsed)
    }

    pub(super) fn current_text(&self) -> &str {
        self.current.1.text()
    }

    pub(super) fn current_span(&self) -> Span {
        self.current.1.clone()
    }

    pub(super) fn advance(&mut self) -> Result<(), RuleSyntaxError> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    pub(super) fn is_symbol(&self, symbol: &str) -> bool {
        self.current.0 == TokenKind::Symbol && self.current_text() == symbol
    }

    pub(super) fn is_keyword(&self, keyword: &str) -> bool {
        self.current.0 == TokenKind::Ident && self.current_text() == keyword
    }

    /// Whether the token after the current one is the given keyword.
    pub(super) fn next_is_keyword(&self, keyword: &str) -> Result<bool, RuleSyntaxError> {
        let mut lookahead = self.lexer.clone();
        let Token(kind, span) = lookahead.next_token()?;
        Ok(kind == TokenKind::Ident && span.text() == keyword)
    }

    pub(super) fn expect_symbol(&mut self, symbol: &str) -> Result<Span, RuleSyntaxError> {
        if !self.is_symbol(symbol) {
            return Err(self.current.1.error(&format!(
                "expecting '{symbol}', found {}",
                self.describe_current()
            )));
        }
        let span = self.current_span();
        self.advance()?;
        Ok(span)
    }

    pub(super) fn describe_current(&self) -> String {
        match self.current.0 {
            TokenKind::Eof => "end of rule".to_string(),
            _ => format!("'{}'", self.current_text()),
        }
    }

    pub(super) fn unexpected(&self) -> RuleSyntaxError {
        self.current
            .1
            .error(&format!("unexpected {}", self.describe_current()))
    }
}

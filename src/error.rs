// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt;

use crate::lexer::Span;
use crate::typing::DataType;

// Where a syntax error occurred. The caret display is rendered up front so
// the error owns no reference to the rule text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Location {
    line: u32,
    col: u32,
    offset: u32,
    display: String,
}

/// Grammar or static type violation detected while compiling rule text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSyntaxError {
    message: String,
    location: Option<Location>,
}

impl RuleSyntaxError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    pub fn at(span: &Span, message: impl Into<String>) -> Self {
        let message = message.into();
        let location = Location {
            line: span.line,
            col: span.col,
            offset: span.start,
            display: span.message("error", &message),
        };
        Self {
            message,
            location: Some(location),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Line and column (both 1-based) of the offending text.
    pub fn position(&self) -> Option<(u32, u32)> {
        self.location.as_ref().map(|l| (l.line, l.col))
    }

    /// Byte offset of the offending text within the rule.
    pub fn offset(&self) -> Option<usize> {
        self.location.as_ref().map(|l| l.offset as usize)
    }
}

impl fmt::Display for RuleSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => f.write_str(&location.display),
            None => f.write_str(&self.message),
        }
    }
}

impl core::error::Error for RuleSyntaxError {}

/// A symbol, attribute or key is not present on the subject.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("symbol '{name}' could not be resolved")]
pub struct SymbolResolutionError {
    pub name: String,
}

impl SymbolResolutionError {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("unsupported operand types for '{op}': {left} and {right}")]
    OperandTypes {
        op: &'static str,
        left: DataType,
        right: DataType,
    },

    #[error("unsupported operand type for '{op}': {operand}")]
    OperandType { op: &'static str, operand: DataType },

    #[error("{kind} does not support {access} access")]
    UnsupportedAccess {
        kind: DataType,
        access: &'static str,
    },

    #[error("index must be an integer, found {found}")]
    InvalidIndex { found: String },

    #[error("could not convert '{value}' to a number")]
    NotNumeric { value: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid regular expression '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("unsupported value: {reason}")]
    UnsupportedValue { reason: String },

    #[error("{message}")]
    General { message: String },
}

impl EvaluationError {
    pub(crate) fn operands(op: &'static str, left: DataType, right: DataType) -> Self {
        EvaluationError::OperandTypes { op, left, right }
    }
}

/// Any failure surfaced by compiling or evaluating a rule.
#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] RuleSyntaxError),

    #[error(transparent)]
    SymbolResolution(#[from] SymbolResolutionError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

impl Error {
    pub fn is_syntax(&self) -> bool {
        matches!(self, Error::Syntax(_))
    }

    pub fn is_symbol_resolution(&self) -> bool {
        matches!(self, Error::SymbolResolution(_))
    }

    pub fn is_evaluation(&self) -> bool {
        matches!(self, Error::Evaluation(_))
    }
}

pub type Result<T> = ::core::result::Result<T, Error>;

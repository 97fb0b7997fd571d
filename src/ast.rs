// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::lexer::*;
use crate::typing::DataType;
use crate::value::Value;
use crate::*;

use core::{cmp, fmt, ops::Deref};

use regex::Regex;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl ArithOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Mod => "%",
            ArithOp::Pow => "**",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BoolOp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    Ne,
}

impl BoolOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BoolOp::Lt => "<",
            BoolOp::Le => "<=",
            BoolOp::Eq => "==",
            BoolOp::Ge => ">=",
            BoolOp::Gt => ">",
            BoolOp::Ne => "!=",
        }
    }
}

/// Regular expression operators. `Match` is anchored at the start of the
/// subject while `Search` finds the pattern anywhere.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MatchOp {
    Match,
    Search,
    NotMatch,
    NotSearch,
}

impl MatchOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            MatchOp::Match => "=~",
            MatchOp::Search => "=~~",
            MatchOp::NotMatch => "!~",
            MatchOp::NotSearch => "!~~",
        }
    }

    pub fn is_anchored(&self) -> bool {
        matches!(self, MatchOp::Match | MatchOp::NotMatch)
    }

    pub fn is_negated(&self) -> bool {
        matches!(self, MatchOp::NotMatch | MatchOp::NotSearch)
    }
}

/// `a in b` and `a not in b` test `a` against container `b`;
/// `a contains b` tests `b` against container `a`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MembershipOp {
    In,
    NotIn,
    Contains,
}

impl MembershipOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            MembershipOp::In => "in",
            MembershipOp::NotIn => "not in",
            MembershipOp::Contains => "contains",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LogicOp {
    And,
    Or,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Not => "not",
            UnaryOp::Neg => "-",
        }
    }
}

pub struct NodeRef<T> {
    r: Rc<T>,
}

impl<T> Clone for NodeRef<T> {
    fn clone(&self) -> Self {
        Self { r: self.r.clone() }
    }
}

impl<T: fmt::Debug> fmt::Debug for NodeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.r.as_ref().fmt(f)
    }
}

impl<T> cmp::PartialEq for NodeRef<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::as_ptr(&self.r).eq(&Rc::as_ptr(&other.r))
    }
}

impl<T> cmp::Eq for NodeRef<T> {}

impl<T> Deref for NodeRef<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.r
    }
}

impl<T> AsRef<T> for NodeRef<T> {
    fn as_ref(&self) -> &T {
        self.deref()
    }
}

impl<T> NodeRef<T> {
    pub fn new(t: T) -> Self {
        Self { r: Rc::new(t) }
    }
}

pub type Ref<T> = NodeRef<T>;

#[derive(Debug)]
pub enum Expr {
    // Constants, including folded negative numbers.
    Literal {
        span: Span,
        value: Value,
    },

    // Collection literals
    Array {
        span: Span,
        items: Vec<Ref<Expr>>,
    },

    Set {
        span: Span,
        items: Vec<Ref<Expr>>,
    },

    Mapping {
        span: Span,
        fields: Vec<(Ref<Expr>, Ref<Expr>)>,
    },

    Symbol {
        span: Span,
        name: Rc<str>,
        data_type: DataType,
    },

    // a.b
    Attribute {
        span: Span,
        object: Ref<Expr>,
        name: Rc<str>,
        data_type: DataType,
    },

    // a[b]
    Item {
        span: Span,
        object: Ref<Expr>,
        index: Ref<Expr>,
        data_type: DataType,
    },

    Unary {
        span: Span,
        op: UnaryOp,
        operand: Ref<Expr>,
        data_type: DataType,
    },

    Arith {
        span: Span,
        op: ArithOp,
        lhs: Ref<Expr>,
        rhs: Ref<Expr>,
        data_type: DataType,
    },

    Compare {
        span: Span,
        op: BoolOp,
        lhs: Ref<Expr>,
        rhs: Ref<Expr>,
    },

    Membership {
        span: Span,
        op: MembershipOp,
        lhs: Ref<Expr>,
        rhs: Ref<Expr>,
    },

    // Literal patterns are compiled when the rule is parsed.
    RegexMatch {
        span: Span,
        op: MatchOp,
        lhs: Ref<Expr>,
        rhs: Ref<Expr>,
        regex: Option<Regex>,
    },

    Logical {
        span: Span,
        op: LogicOp,
        lhs: Ref<Expr>,
        rhs: Ref<Expr>,
    },
}

impl Expr {
    pub fn span(&self) -> &Span {
        use Expr::*;
        match self {
            Literal { span, .. }
            | Array { span, .. }
            | Set { span, .. }
            | Mapping { span, .. }
            | Symbol { span, .. }
            | Attribute { span, .. }
            | Item { span, .. }
            | Unary { span, .. }
            | Arith { span, .. }
            | Compare { span, .. }
            | Membership { span, .. }
            | RegexMatch { span, .. }
            | Logical { span, .. } => span,
        }
    }

    /// The kind this expression evaluates to, as far as it is known before
    /// evaluation.
    pub fn data_type(&self) -> DataType {
        use Expr::*;
        match self {
            Literal { value, .. } => DataType::from_value(value),
            Array { .. } => DataType::Array,
            Set { .. } => DataType::Set,
            Mapping { .. } => DataType::Mapping,
            Symbol { data_type, .. }
            | Attribute { data_type, .. }
            | Item { data_type, .. }
            | Unary { data_type, .. }
            | Arith { data_type, .. } => *data_type,
            Compare { .. } | Membership { .. } | RegexMatch { .. } | Logical { .. } => {
                DataType::Boolean
            }
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Expr::Literal { .. })
    }
}

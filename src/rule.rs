// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::borrow::Borrow;
use core::fmt;
use std::collections::BTreeSet;

use crate::ast::{Expr, Ref};
use crate::context::Context;
use crate::error::{Result, RuleSyntaxError};
use crate::interpreter::Interpreter;
use crate::parser::{parse, parse_syntax};
use crate::typing::DataType;
use crate::value::Value;

/// A compiled rule. The text is parsed once when the rule is created and the
/// rule can then be matched against any number of subjects.
///
/// ```
/// use rule_engine::{Rule, Value};
///
/// let rule = Rule::new("amount >= 100 and currency == 'USD'")?;
/// let order = Value::from_json_str(r#"{"amount": 150, "currency": "USD"}"#)?;
/// assert!(rule.matches(&order)?);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct Rule<T: ?Sized = Value> {
    text: String,
    context: Context<T>,
    statement: Ref<Expr>,
}

impl Rule<Value> {
    /// Compile `text` with a default [`Context`], resolving symbols as keys of
    /// a mapping subject.
    pub fn new(text: &str) -> core::result::Result<Self, RuleSyntaxError> {
        Self::with_context(text, Context::new())
    }

    /// Whether `text` is grammatically valid. Symbol types are not checked.
    pub fn is_valid(text: &str) -> bool {
        parse_syntax(text).is_ok()
    }
}

impl<T: ?Sized> Rule<T> {
    pub fn with_context(
        text: &str,
        mut context: Context<T>,
    ) -> core::result::Result<Self, RuleSyntaxError> {
        let statement = parse(text, &mut context)?;
        log::debug!(
            "compiled rule {text:?} referencing {:?}",
            context.symbols()
        );
        Ok(Self {
            text: text.to_string(),
            context,
            statement,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn context(&self) -> &Context<T> {
        &self.context
    }

    /// Names of the symbols the rule refers to.
    pub fn symbols(&self) -> &BTreeSet<String> {
        self.context.symbols()
    }

    /// Static type of the rule's result.
    pub fn data_type(&self) -> DataType {
        self.statement.data_type()
    }

    /// Evaluate the rule against `thing` and return the raw result.
    pub fn evaluate(&self, thing: &T) -> Result<Value> {
        Interpreter::new(&self.context, thing).evaluate(&self.statement)
    }

    /// Evaluate the rule against `thing` and reduce the result to a boolean.
    pub fn matches(&self, thing: &T) -> Result<bool> {
        Interpreter::new(&self.context, thing).evaluate_bool(&self.statement)
    }

    /// Lazily keep the items of `things` the rule matches, in order. An
    /// item whose evaluation fails is reported in its place.
    pub fn filter<I>(&self, things: I) -> Filter<'_, T, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: Borrow<T>,
    {
        Filter {
            rule: self,
            iter: things.into_iter(),
        }
    }
}

impl<T: ?Sized> Clone for Rule<T> {
    fn clone(&self) -> Self {
        Self {
            text: self.text.clone(),
            context: self.context.clone(),
            statement: self.statement.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Rule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Rule text={:?}>", self.text)
    }
}

impl<T: ?Sized> fmt::Display for Rule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Iterator returned by [`Rule::filter`].
pub struct Filter<'r, T: ?Sized, I> {
    rule: &'r Rule<T>,
    iter: I,
}

impl<T: ?Sized, I> Iterator for Filter<'_, T, I>
where
    I: Iterator,
    I::Item: Borrow<T>,
{
    type Item = Result<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        for thing in self.iter.by_ref() {
            match self.rule.matches(thing.borrow()) {
                Ok(true) => return Some(Ok(thing)),
                Ok(false) => (),
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error::{Result, SymbolResolutionError};
use crate::typing::DataType;
use crate::value::Value;
use crate::Rc;

use core::fmt;
use std::collections::{BTreeMap, BTreeSet};

use regex::{Regex, RegexBuilder};

/// Looks up `name` on a subject.
pub type Resolver<T> = Rc<dyn Fn(&T, &str) -> Result<Value> + Send + Sync>;

/// Static kind of a symbol, consulted while a rule is parsed.
pub type TypeResolver = Rc<dyn Fn(&str) -> DataType + Send + Sync>;

bitflags::bitflags! {
    /// Options applied to every regular expression a rule compiles.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RegexFlags: u32 {
        const IGNORE_CASE          = 1 << 0;
        const MULTI_LINE           = 1 << 1;
        const DOT_MATCHES_NEW_LINE = 1 << 2;
        const IGNORE_WHITESPACE    = 1 << 3;
    }
}

impl RegexFlags {
    /// Compile `pattern`. Anchored patterns only match at the start of the
    /// subject.
    pub fn compile(self, pattern: &str, anchored: bool) -> core::result::Result<Regex, regex::Error> {
        let verbose = self.contains(RegexFlags::IGNORE_WHITESPACE);
        let pattern = match (anchored, verbose) {
            (false, _) => pattern.to_string(),
            (true, false) => format!(r"\A(?:{pattern})"),
            // A trailing `#` comment would swallow the closing parenthesis.
            (true, true) => format!("\\A(?:{pattern}\n)"),
        };
        RegexBuilder::new(&pattern)
            .case_insensitive(self.contains(RegexFlags::IGNORE_CASE))
            .multi_line(self.contains(RegexFlags::MULTI_LINE))
            .dot_matches_new_line(self.contains(RegexFlags::DOT_MATCHES_NEW_LINE))
            .ignore_whitespace(verbose)
            .build()
    }
}

/// Host objects exposing named fields to attribute-style resolution.
pub trait Attributes {
    fn attribute(&self, name: &str) -> Option<Value>;
}

impl Attributes for Value {
    fn attribute(&self, name: &str) -> Option<Value> {
        match self {
            Value::Object(fields) => fields.get(&Value::from(name)).cloned(),
            _ => None,
        }
    }
}

/// Attribute-style resolution through [`Attributes`].
pub fn resolve_attribute<T: Attributes + ?Sized>(thing: &T, name: &str) -> Result<Value> {
    thing
        .attribute(name)
        .ok_or_else(|| SymbolResolutionError::new(name).into())
}

/// Item-style resolution: `name` is a key of a mapping subject.
pub fn resolve_item(thing: &Value, name: &str) -> Result<Value> {
    match thing {
        Value::Object(fields) => match fields.get(&Value::from(name)) {
            Some(v) => Ok(v.clone()),
            None => Err(SymbolResolutionError::new(name).into()),
        },
        _ => Err(SymbolResolutionError::new(name).into()),
    }
}

/// Build a type resolver from a sample subject, classifying each of its
/// entries. Names the sample lacks resolve to `DataType::Undefined`.
pub fn type_resolver_from_value(sample: &Value) -> impl Fn(&str) -> DataType + Send + Sync + 'static {
    let mut types = BTreeMap::new();
    if let Value::Object(fields) = sample {
        for (k, v) in fields.iter() {
            if let Value::String(name) = k {
                types.insert(name.to_string(), DataType::from_value(v));
            }
        }
    }
    move |name: &str| types.get(name).copied().unwrap_or(DataType::Undefined)
}

/// Resolution strategy and options a rule is compiled and evaluated with.
/// Symbols referenced by the rule are recorded while it is parsed.
pub struct Context<T: ?Sized = Value> {
    resolver: Resolver<T>,
    type_resolver: Option<TypeResolver>,
    regex_flags: RegexFlags,
    symbols: BTreeSet<String>,
}

impl Context<Value> {
    /// Context resolving symbols as keys of a `Value` mapping.
    pub fn new() -> Self {
        Self::with_resolver(resolve_item)
    }
}

impl Default for Context<Value> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Attributes + ?Sized + 'static> Context<T> {
    pub fn attribute_style() -> Self {
        Self::with_resolver(resolve_attribute::<T>)
    }
}

impl<T: ?Sized> Context<T> {
    pub fn with_resolver<F>(resolver: F) -> Self
    where
        F: Fn(&T, &str) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            resolver: Rc::new(resolver),
            type_resolver: None,
            regex_flags: RegexFlags::empty(),
            symbols: BTreeSet::new(),
        }
    }

    pub fn with_regex_flags(mut self, flags: RegexFlags) -> Self {
        self.regex_flags = flags;
        self
    }

    pub fn with_type_resolver<F>(mut self, type_resolver: F) -> Self
    where
        F: Fn(&str) -> DataType + Send + Sync + 'static,
    {
        self.type_resolver = Some(Rc::new(type_resolver));
        self
    }

    pub fn regex_flags(&self) -> RegexFlags {
        self.regex_flags
    }

    /// Names of the symbols referenced by the rule compiled with this context.
    pub fn symbols(&self) -> &BTreeSet<String> {
        &self.symbols
    }

    pub fn resolve(&self, thing: &T, name: &str) -> Result<Value> {
        (self.resolver)(thing, name)
    }

    pub fn resolve_type(&self, name: &str) -> DataType {
        match &self.type_resolver {
            Some(resolve) => resolve(name),
            None => DataType::Undefined,
        }
    }

    pub(crate) fn record_symbol(&mut self, name: &str) {
        if !self.symbols.contains(name) {
            self.symbols.insert(name.to_string());
        }
    }
}

impl<T: ?Sized> Clone for Context<T> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            type_resolver: self.type_resolver.clone(),
            regex_flags: self.regex_flags,
            symbols: self.symbols.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Context<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("regex_flags", &self.regex_flags)
            .field("typed", &self.type_resolver.is_some())
            .field("symbols", &self.symbols)
            .finish()
    }
}

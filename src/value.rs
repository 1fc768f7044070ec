use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Unset attribute values are stored as [`Value::Null`]; sharing one const
/// lets accessors return a reference when nothing is stored.
pub(crate) const NULL: Value = Value::Null;

/// The canonical symbolic form of a string value.
///
/// Symbol attributes store their values in this form regardless of how they
/// were supplied; comparing a freshly supplied text value against a stored
/// one therefore happens after normalisation, never before.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// An attribute value.
///
/// `List` and `Map` are the raw shapes callers hand in; `SymbolList` and
/// `SymbolMap` are the canonical shapes the symbol-array and symbol-hash
/// write paths produce. The variant tag is part of the serialized form so a
/// store can round-trip values without guessing whether a string was text or
/// a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Symbol(Symbol),
    List(Vec<Value>),
    SymbolList(Vec<Symbol>),
    Map(BTreeMap<String, Value>),
    SymbolMap(BTreeMap<Symbol, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `true` only for an explicit `Bool(true)`.
    pub fn is_truthy(&self) -> bool {
        matches!(self, Value::Bool(true))
    }

    pub fn symbol(value: impl Into<String>) -> Self {
        Value::Symbol(Symbol::new(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Symbol> for Value {
    fn from(value: Symbol) -> Self {
        Value::Symbol(value)
    }
}

impl From<Vec<Symbol>> for Value {
    fn from(value: Vec<Symbol>) -> Self {
        Value::SymbolList(value)
    }
}

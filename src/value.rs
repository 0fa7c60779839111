// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{Error, Result};
use std::fmt;

/// Data types a column can hold
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DataType {
    /// 32-bit signed integer
    Int,

    /// Single-byte encoded string, up to 65535 bytes
    Text,

    /// Boolean, persisted as one `0`/`1` byte
    Boolean,
}

impl DataType {
    /// The catalog spelling of the type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int => "INT",
            Self::Text => "TEXT",
            Self::Boolean => "BOOLEAN",
        }
    }
}

impl TryFrom<&str> for DataType {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "INT" => Ok(Self::Int),
            "TEXT" => Ok(Self::Text),
            "BOOLEAN" => Ok(Self::Boolean),
            other => Err(Error::UnacceptableDataType(format!(
                "unacceptable data type '{other}'"
            ))),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tagged scalar value.
///
/// Equality requires matching tags and matching contents.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    /// INT value
    Int(i32),

    /// TEXT value
    Text(String),

    /// BOOLEAN value
    Boolean(bool),
}

impl Value {
    /// The tag of this value.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Int(_) => DataType::Int,
            Self::Text(_) => DataType::Text,
            Self::Boolean(_) => DataType::Boolean,
        }
    }

    /// The inner string, if this is a TEXT value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The inner integer, if this is an INT value.
    #[must_use]
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The inner boolean, if this is a BOOLEAN value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl fmt::Display for Value {
    /// Renders INT as decimal, TEXT quoted, BOOLEAN as `true`/`false`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "\"{s}\""),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// A non-empty SQL identifier.
///
/// The acceptance predicate is enforced at construction: keywords pass,
/// anything with a leading digit is rejected, and the remaining characters
/// must come from `[A-Za-z0-9$_]`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    /// Validates `name` and wraps it.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if Self::is_acceptable(&name) {
            Ok(Self(name))
        } else {
            Err(Error::UnacceptableIdentifier(format!(
                "unacceptable identifier '{name}'"
            )))
        }
    }

    /// The acceptance predicate behind [`Identifier::new`].
    #[must_use]
    pub fn is_acceptable(name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        if crate::sql::parse::is_keyword(name) {
            return true;
        }
        if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return false;
        }
        name.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '$' || c == '_')
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wraps a known-good identifier, typically a schema constant.
pub(crate) fn ident(name: &str) -> Identifier {
    Identifier::new(name).expect("cannot fail")
}

/// An ordered mapping from column name to value.
///
/// Iteration order is insertion order; equality is order-insensitive.
#[derive(Clone, Debug, Default)]
pub struct Row(Vec<(Identifier, Value)>);

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Builder-style [`Row::set`].
    #[must_use]
    pub fn with(mut self, name: Identifier, value: Value) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a column, replacing any previous value under the same name.
    pub fn set(&mut self, name: Identifier, value: Value) {
        if let Some(slot) = self.0.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.0.push((name, value));
        }
    }

    /// The value stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, v)| v)
    }

    /// Whether a column named `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Column names, in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &Identifier> {
        self.0.iter().map(|(n, _)| n)
    }

    /// (name, value) pairs, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &Value)> {
        self.0.iter().map(|(n, v)| (n, v))
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .all(|(n, v)| other.get(n.as_str()) == Some(v))
    }
}

impl Eq for Row {}

impl FromIterator<(Identifier, Value)> for Row {
    fn from_iter<T: IntoIterator<Item = (Identifier, Value)>>(iter: T) -> Self {
        let mut row = Self::new();
        for (name, value) in iter {
            row.set(name, value);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn identifier_acceptance() {
        assert!(Identifier::new("egg").is_ok());
        assert!(Identifier::new("_tables").is_ok());
        assert!(Identifier::new("col$2").is_ok());
        assert!(Identifier::new("TABLE").is_ok()); // keywords pass

        assert!(Identifier::new("").is_err());
        assert!(Identifier::new("123").is_err());
        assert!(Identifier::new("1abc").is_err());
        assert!(Identifier::new("a-b").is_err());
        assert!(Identifier::new("a b").is_err());
    }

    #[test]
    fn value_equality_needs_matching_tags() {
        assert_eq!(Value::Int(1), Value::Int(1));
        assert_ne!(Value::Int(1), Value::Int(2));
        assert_ne!(Value::Int(1), Value::Text("1".into()));
        assert_ne!(Value::Boolean(true), Value::Int(1));
    }

    #[test]
    fn row_equality_ignores_order() {
        let a = Row::new()
            .with(ident("x"), Value::Int(1))
            .with(ident("y"), Value::from("hi"));
        let b = Row::new()
            .with(ident("y"), Value::from("hi"))
            .with(ident("x"), Value::Int(1));
        assert_eq!(a, b);

        let c = Row::new().with(ident("x"), Value::Int(1));
        assert_ne!(a, c);
    }

    #[test]
    fn row_set_replaces() {
        let mut row = Row::new();
        row.set(ident("x"), Value::Int(1));
        row.set(ident("x"), Value::Int(2));
        assert_eq!(row.len(), 1);
        assert_eq!(row.get("x"), Some(&Value::Int(2)));
    }
}

//! Tagged scalar values.
//!
//! A [`Value`] is one of four kinds (character, text, integer, real). A
//! [`ValueBox`] holds an optionally-set value and hands it back only under
//! the kind it was stored with: asking for any other kind is a
//! [`RapiError::Type`], never a coercion.
//!
//! Boxes back both named aligner parameters ([`Param`]) and per-alignment
//! annotation tags ([`Tag`]).

use std::fmt;

use crate::error::{RapiError, Result};

/// Maximum number of visible characters in a tag key.
pub const MAX_TAG_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Char,
    Text,
    Int,
    Real,
}

impl ValueKind {
    pub const fn name(self) -> &'static str {
        match self {
            ValueKind::Char => "char",
            ValueKind::Text => "text",
            ValueKind::Int => "int",
            ValueKind::Real => "real",
        }
    }

    /// SAM optional-field type character.
    pub const fn sam_type(self) -> char {
        match self {
            ValueKind::Char => 'A',
            ValueKind::Text => 'Z',
            ValueKind::Int => 'i',
            ValueKind::Real => 'f',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Char(char),
    Text(String),
    Int(i64),
    Real(f64),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Char(_) => ValueKind::Char,
            Value::Text(_) => ValueKind::Text,
            Value::Int(_) => ValueKind::Int,
            Value::Real(_) => ValueKind::Real,
        }
    }
}

impl fmt::Display for Value {
    /// Reals use six fixed decimals, like C's `%f`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Char(c) => write!(f, "{c}"),
            Value::Text(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r:.6}"),
        }
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Value::Real(r)
    }
}

/// A value slot that is either unset or holds exactly one [`Value`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueBox {
    value: Option<Value>,
}

impl ValueBox {
    pub fn new(value: Value) -> Self {
        Self { value: Some(value) }
    }

    pub fn kind(&self) -> Option<ValueKind> {
        self.value.as_ref().map(Value::kind)
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Store `value`, replacing (and dropping) whatever was held before.
    pub fn set(&mut self, value: Value) {
        self.value = Some(value);
    }

    pub fn set_char(&mut self, c: char) {
        self.set(Value::Char(c));
    }

    pub fn set_text(&mut self, s: impl Into<String>) {
        self.set(Value::Text(s.into()));
    }

    pub fn set_int(&mut self, i: i64) {
        self.set(Value::Int(i));
    }

    pub fn set_real(&mut self, r: f64) {
        self.set(Value::Real(r));
    }

    /// Drop any held value; the box becomes unset.
    pub fn clear(&mut self) {
        self.value = None;
    }

    fn mismatch(&self, expected: ValueKind) -> RapiError {
        RapiError::Type {
            expected: expected.name(),
            found: self.kind().map_or("unset", ValueKind::name),
        }
    }

    pub fn get_char(&self) -> Result<char> {
        match &self.value {
            Some(Value::Char(c)) => Ok(*c),
            _ => Err(self.mismatch(ValueKind::Char)),
        }
    }

    pub fn get_text(&self) -> Result<&str> {
        match &self.value {
            Some(Value::Text(s)) => Ok(s),
            _ => Err(self.mismatch(ValueKind::Text)),
        }
    }

    /// Mutable access to held text, for callers that build the string in place.
    pub fn text_mut(&mut self) -> Result<&mut String> {
        let err = self.mismatch(ValueKind::Text);
        match &mut self.value {
            Some(Value::Text(s)) => Ok(s),
            _ => Err(err),
        }
    }

    pub fn get_int(&self) -> Result<i64> {
        match &self.value {
            Some(Value::Int(i)) => Ok(*i),
            _ => Err(self.mismatch(ValueKind::Int)),
        }
    }

    pub fn get_real(&self) -> Result<f64> {
        match &self.value {
            Some(Value::Real(r)) => Ok(*r),
            _ => Err(self.mismatch(ValueKind::Real)),
        }
    }
}

/// A named configuration parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub value: ValueBox,
}

impl Param {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: ValueBox::new(value.into()),
        }
    }
}

/// First parameter called `name`; duplicates are allowed, the earliest wins.
pub fn find_param<'a>(params: &'a [Param], name: &str) -> Option<&'a Param> {
    params.iter().find(|p| p.name == name)
}

/// Tag key of 1 to [`MAX_TAG_LEN`] visible ASCII characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagKey(String);

impl TagKey {
    /// Overlong keys are rejected rather than truncated.
    pub fn new(key: &str) -> Result<Self> {
        if key.is_empty() {
            return Err(RapiError::param("tag key must not be empty"));
        }
        if key.len() > MAX_TAG_LEN {
            return Err(RapiError::param(format!(
                "tag key {key:?} is longer than {MAX_TAG_LEN} characters"
            )));
        }
        if !key.bytes().all(|b| b.is_ascii_graphic() && b != b':') {
            return Err(RapiError::param(format!(
                "tag key {key:?} must be visible ASCII without ':'"
            )));
        }
        Ok(Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-alignment annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    key: TagKey,
    value: ValueBox,
}

impl Tag {
    pub fn new(key: &str, value: impl Into<Value>) -> Result<Self> {
        Ok(Self {
            key: TagKey::new(key)?,
            value: ValueBox::new(value.into()),
        })
    }

    pub fn key(&self) -> &TagKey {
        &self.key
    }

    pub fn value(&self) -> &ValueBox {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut ValueBox {
        &mut self.value
    }

    /// Append `KEY:TYPE:VALUE` to `out`. An unset value is a type error and
    /// leaves `out` unchanged.
    pub fn format_into(&self, out: &mut String) -> Result<()> {
        use std::fmt::Write;

        let value = self.value.value().ok_or(RapiError::Type {
            expected: "any",
            found: "unset",
        })?;
        // Writing into a String cannot fail
        let _ = write!(out, "{}:{}:{}", self.key, value.kind().sam_type(), value);
        Ok(())
    }
}

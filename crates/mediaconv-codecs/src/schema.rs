//! Option schemas and schema-directed coercion.
//!
//! Callers hand the compiler loosely typed JSON. A [`Schema`] lists the keys a
//! descriptor understands and the type each should have; [`Schema::coerce`]
//! turns the raw mapping into [`SafeOptions`], silently dropping unknown keys
//! and values that cannot be converted to the declared type.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

/// Untyped options as supplied by the caller.
pub type RawOptions = serde_json::Map<String, Value>;

/// Declared type of a schema entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Str,
    Int,
    Float,
    Bool,
}

/// A coerced option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Str(s) => f.write_str(s),
            OptionValue::Int(n) => write!(f, "{n}"),
            // Debug keeps the fractional part ("2.0" rather than "2")
            OptionValue::Float(x) => write!(f, "{x:?}"),
            OptionValue::Bool(b) => f.write_str(if *b { "1" } else { "0" }),
        }
    }
}

/// Ordered list of known option keys and their types.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<(String, OptionKind)>,
}

impl Schema {
    pub fn new(fields: &[(&str, OptionKind)]) -> Self {
        Self::default().extend(fields)
    }

    /// Add fields, replacing the type of any key already present.
    pub fn extend(mut self, fields: &[(&str, OptionKind)]) -> Self {
        for (name, kind) in fields {
            match self.fields.iter_mut().find(|(n, _)| n == name) {
                Some(entry) => entry.1 = *kind,
                None => self.fields.push((name.to_string(), *kind)),
            }
        }
        self
    }

    pub fn kind_of(&self, key: &str) -> Option<OptionKind> {
        self.fields
            .iter()
            .find(|(n, _)| n == key)
            .map(|(_, kind)| *kind)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Keep only schema keys whose values coerce to the declared type.
    pub fn coerce(&self, raw: &RawOptions) -> SafeOptions {
        let mut safe = SafeOptions::default();
        for (key, kind) in &self.fields {
            if let Some(value) = raw.get(key).and_then(|v| coerce_value(v, *kind)) {
                safe.insert(key.clone(), value);
            }
        }
        safe
    }
}

fn coerce_value(value: &Value, kind: OptionKind) -> Option<OptionValue> {
    match kind {
        OptionKind::Str => match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
        .map(OptionValue::Str),
        OptionKind::Int => match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|x| x.is_finite() && x.abs() < i64::MAX as f64)
                    .map(|x| x.trunc() as i64)
            }),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
        .map(OptionValue::Int),
        OptionKind::Float => match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
        .filter(|x| x.is_finite())
        .map(OptionValue::Float),
        OptionKind::Bool => match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|x| x != 0.0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" | "" => Some(false),
                _ => None,
            },
            _ => None,
        }
        .map(OptionValue::Bool),
    }
}

/// Options that passed schema coercion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SafeOptions {
    values: BTreeMap<String, OptionValue>,
}

impl SafeOptions {
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: OptionValue) {
        self.values.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<OptionValue> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        match self.values.get(key)? {
            OptionValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        match self.values.get(key)? {
            OptionValue::Float(x) => Some(*x),
            OptionValue::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        match self.values.get(key)? {
            OptionValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.values.get(key)? {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Drop an integer option that falls outside `range`. Never clamps.
    pub fn keep_int_within(&mut self, key: &str, range: RangeInclusive<i64>) {
        if self.int(key).is_some_and(|n| !range.contains(&n)) {
            self.values.remove(key);
        }
    }

    /// Drop a float option that falls outside `range`. Never clamps.
    pub fn keep_float_within(&mut self, key: &str, range: RangeInclusive<f64>) {
        if self.float(key).is_some_and(|x| !range.contains(&x)) {
            self.values.remove(key);
        }
    }

    /// Render a present option as a flag pair.
    pub fn flag(&self, key: &str, flag: &str) -> Option<[String; 2]> {
        self.get(key).map(|v| [flag.to_string(), v.to_string()])
    }
}

//! Declarative request-body rules.
//!
//! Each entity declares a list of [`FieldRule`]s. Rules run in order, a field
//! stops at its first failing check, and every failing field contributes one
//! message to the 400 response.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::database::is_object_id;
use crate::error::ApiError;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Whether absent fields count as failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Create/replace: required fields must be present.
    Full,
    /// Partial update: only keys present in the body are checked, null included.
    Partial,
}

#[derive(Debug, Clone, Copy)]
enum Presence {
    Optional,
    /// Present and not null.
    Required(&'static str),
    /// Present and not falsy (`null`, `false`, `0`, `""`).
    Truthy(&'static str),
}

#[derive(Clone, Copy)]
enum Check {
    String,
    MinLength(usize),
    Int { min: Option<i64>, max: Option<i64> },
    Float { min: f64, max: f64 },
    OneOf(&'static [&'static str]),
    Email,
    ObjectId,
    Array { min_items: usize },
    Custom(fn(&Value) -> bool),
}

impl Check {
    fn passes(&self, value: &Value) -> bool {
        match *self {
            Check::String => value.is_string(),
            Check::MinLength(n) => value.as_str().map_or(false, |s| s.chars().count() >= n),
            Check::Int { min, max } => as_integer(value).map_or(false, |v| {
                min.map_or(true, |m| v >= m) && max.map_or(true, |m| v <= m)
            }),
            Check::Float { min, max } => value.as_f64().map_or(false, |v| v >= min && v <= max),
            Check::OneOf(allowed) => value.as_str().map_or(false, |s| allowed.contains(&s)),
            Check::Email => value.as_str().map_or(false, |s| EMAIL_RE.is_match(s)),
            Check::ObjectId => value.as_str().map_or(false, is_object_id),
            Check::Array { min_items } => value.as_array().map_or(false, |a| a.len() >= min_items),
            Check::Custom(f) => f(value),
        }
    }
}

/// Validation chain for one body field.
#[derive(Clone)]
pub struct FieldRule {
    field: &'static str,
    presence: Presence,
    checks: Vec<(Check, &'static str)>,
}

/// Start a rule for `name`. Fields are optional until marked otherwise.
pub fn field(name: &'static str) -> FieldRule {
    FieldRule {
        field: name,
        presence: Presence::Optional,
        checks: Vec::new(),
    }
}

impl FieldRule {
    pub fn required(mut self, message: &'static str) -> Self {
        self.presence = Presence::Required(message);
        self
    }

    pub fn truthy(mut self, message: &'static str) -> Self {
        self.presence = Presence::Truthy(message);
        self
    }

    pub fn is_string(self, message: &'static str) -> Self {
        self.check(Check::String, message)
    }

    pub fn min_length(self, n: usize, message: &'static str) -> Self {
        self.check(Check::MinLength(n), message)
    }

    pub fn is_int(self, min: Option<i64>, max: Option<i64>, message: &'static str) -> Self {
        self.check(Check::Int { min, max }, message)
    }

    pub fn is_float(self, min: f64, max: f64, message: &'static str) -> Self {
        self.check(Check::Float { min, max }, message)
    }

    pub fn is_in(self, allowed: &'static [&'static str], message: &'static str) -> Self {
        self.check(Check::OneOf(allowed), message)
    }

    pub fn is_email(self, message: &'static str) -> Self {
        self.check(Check::Email, message)
    }

    pub fn is_object_id(self, message: &'static str) -> Self {
        self.check(Check::ObjectId, message)
    }

    pub fn is_array(self, min_items: usize, message: &'static str) -> Self {
        self.check(Check::Array { min_items }, message)
    }

    pub fn custom(self, f: fn(&Value) -> bool, message: &'static str) -> Self {
        self.check(Check::Custom(f), message)
    }

    fn check(mut self, check: Check, message: &'static str) -> Self {
        self.checks.push((check, message));
        self
    }

    fn evaluate(&self, body: &Value, mode: Mode) -> Option<&'static str> {
        // Partial mode skips absent keys only; a key sent as null still counts.
        let value = match (body.get(self.field), mode) {
            (None, Mode::Partial) => return None,
            (None, Mode::Full) | (Some(Value::Null), _) => {
                return match self.presence {
                    Presence::Required(msg) | Presence::Truthy(msg) => Some(msg),
                    Presence::Optional => None,
                };
            }
            (Some(value), _) => value,
        };

        if let Presence::Truthy(msg) = self.presence {
            if is_falsy(value) {
                return Some(msg);
            }
        }

        self.checks
            .iter()
            .find(|(check, _)| !check.passes(value))
            .map(|(_, msg)| *msg)
    }
}

/// Run `rules` against `body`, collecting one message per failing field.
pub fn check(body: &Value, rules: &[FieldRule], mode: Mode) -> Result<(), ApiError> {
    if !body.is_object() {
        return Err(ApiError::invalid_json("Request body must be a JSON object"));
    }

    let errors: Vec<String> = rules
        .iter()
        .filter_map(|rule| rule.evaluate(body, mode))
        .map(str::to_string)
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_error("Validation failed", errors))
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    if let Some(v) = value.as_i64() {
        return Some(v);
    }
    value
        .as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| f as i64)
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// True when a number has at most two decimal places.
pub fn at_most_two_decimals(value: &Value) -> bool {
    value.as_f64().map_or(false, |v| {
        let scaled = v * 100.0;
        (scaled - scaled.round()).abs() < 1e-6
    })
}

/// True when every element of an array is a string.
pub fn all_strings(value: &Value) -> bool {
    value
        .as_array()
        .map_or(false, |items| items.iter().all(Value::is_string))
}

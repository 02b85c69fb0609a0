//! Parsing primitives
//!
//! Each primitive takes a loosely-typed JSON scalar and returns a strict
//! domain value, or fails with its own error kind. Primitives are pure and
//! independent of any model.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{display_raw, ModelResult, ParseError};

/// Email pattern shared by `parse_email` and `parse_username`.
pub const MAIL_PATTERN: &str = r"^[A-Za-z0-9_.]+@([a-zA-Z_.]+)+\.[a-zA-Z]{2,9}$";

/// Bare username pattern: a letter or underscore followed by one or more
/// letters, digits, dots or underscores.
pub const USERNAME_PATTERN: &str = r"^[_a-zA-Z][a-zA-Z._0-9]+$";

const NON_NEG_INT_PATTERN: &str = r"^\s*([0-9]+)\s*$";

static MAIL_RE: OnceLock<Regex> = OnceLock::new();
static USERNAME_RE: OnceLock<Regex> = OnceLock::new();
static NON_NEG_INT_RE: OnceLock<Regex> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    // Patterns are compile-time constants covered by the tests below.
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern compiles"))
}

fn mail_re() -> &'static Regex {
    compiled(&MAIL_RE, MAIL_PATTERN)
}

fn username_re() -> &'static Regex {
    compiled(&USERNAME_RE, USERNAME_PATTERN)
}

fn non_neg_int_re() -> &'static Regex {
    compiled(&NON_NEG_INT_RE, NON_NEG_INT_PATTERN)
}

/// Parses an unsigned integer from a number or a digit string.
///
/// Surrounding whitespace is allowed in the string form. Negative numbers,
/// fractional numbers and non-numeric strings fail.
pub fn parse_non_neg_int(value: &Value) -> ModelResult<u64> {
    match value {
        Value::Number(n) => {
            if let Some(int) = n.as_u64() {
                return Ok(int);
            }
            // Integral floats such as `3.0` still print as digits.
            match n.as_f64() {
                Some(f) if f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64 => Ok(f as u64),
                _ => Err(ParseError::non_neg_int(value)),
            }
        }
        Value::String(s) => non_neg_int_re()
            .captures(s)
            .and_then(|caps| caps.get(1))
            .and_then(|digits| digits.as_str().parse::<u64>().ok())
            .ok_or_else(|| ParseError::non_neg_int(value)),
        _ => Err(ParseError::non_neg_int(value)),
    }
}

/// Parses a boolean from `true`/`false`, `1`/`0`, or their string forms.
pub fn parse_boolean(value: &Value) -> ModelResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 1.0 => Ok(true),
            Some(f) if f == 0.0 => Ok(false),
            _ => Err(ParseError::boolean(value)),
        },
        Value::String(s) => match s.as_str() {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            _ => Err(ParseError::boolean(value)),
        },
        _ => Err(ParseError::boolean(value)),
    }
}

/// Accepts a string that is either an email address or a bare username.
pub fn parse_username(value: &Value) -> ModelResult<String> {
    match value {
        Value::String(s) if mail_re().is_match(s) || username_re().is_match(s) => Ok(s.clone()),
        _ => Err(ParseError::username(value)),
    }
}

/// Accepts a string matching the email pattern.
pub fn parse_email(value: &Value) -> ModelResult<String> {
    match value {
        Value::String(s) if mail_re().is_match(s) => Ok(s.clone()),
        _ => Err(ParseError::email(value)),
    }
}

/// Accepts one of the fixed user roles.
pub fn parse_user_role(value: &Value) -> ModelResult<UserRole> {
    match value {
        Value::String(s) => s.parse(),
        _ => Err(ParseError::role(value)),
    }
}

/// Coerces any value to its string representation. Never fails.
pub fn parse_string(value: &Value) -> String {
    display_raw(value)
}

/// Passthrough for list-typed fields; the owning entity validates content.
pub fn parse_array(value: &Value) -> Value {
    value.clone()
}

/// Course roles, most privileged first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "instructor")]
    Instructor,
    #[serde(rename = "TA")]
    Ta,
    #[serde(rename = "student")]
    Student,
}

impl UserRole {
    /// Every role, in declaration order
    pub const ALL: [UserRole; 4] = [
        UserRole::Admin,
        UserRole::Instructor,
        UserRole::Ta,
        UserRole::Student,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Instructor => "instructor",
            UserRole::Ta => "TA",
            UserRole::Student => "student",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ParseError::role(&Value::String(s.to_owned())))
    }
}

//! Client-side parameter binding.
//!
//! Parameters are rendered as SQL literals and substituted into the statement
//! text before it is sent; the server only ever sees a fully interpolated
//! statement.
//!
//! Two placeholder styles are supported:
//! - positional: each `%s` takes the next parameter, `%%` is a literal `%`
//! - named: `:name` is replaced by the parameter called `name`

use crate::error::{Error, Result};

/// A parameter value to be rendered as a SQL literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// SQL NULL
    Null,
    /// BOOLEAN literal
    Bool(bool),
    /// Integer literal
    Int(i64),
    /// Floating-point literal
    Float(f64),
    /// String literal
    Text(String),
    /// Binary literal
    Bytes(Vec<u8>),
}

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Param::Bool(v)
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Param::Int(v.into())
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Int(v)
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Float(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Text(v.to_string())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Text(v)
    }
}

impl From<&[u8]> for Param {
    fn from(v: &[u8]) -> Self {
        Param::Bytes(v.to_vec())
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        v.map_or(Param::Null, Into::into)
    }
}

/// Renders a parameter value as SQL literal text.
pub trait LiteralQuoter {
    /// Quote a single value.
    fn quote_literal(&self, value: &Param) -> Result<String>;
}

/// Standard SQL literal quoting.
///
/// Strings are wrapped in single quotes with embedded quotes doubled; binary
/// values become hex literals (`X'..'`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultQuoter;

impl LiteralQuoter for DefaultQuoter {
    fn quote_literal(&self, value: &Param) -> Result<String> {
        Ok(match value {
            Param::Null => "NULL".to_string(),
            Param::Bool(true) => "TRUE".to_string(),
            Param::Bool(false) => "FALSE".to_string(),
            Param::Int(v) => v.to_string(),
            Param::Float(v) if v.is_nan() => "'NaN'::FLOAT".to_string(),
            Param::Float(v) if v.is_infinite() => {
                if v.is_sign_positive() {
                    "'Infinity'::FLOAT".to_string()
                } else {
                    "'-Infinity'::FLOAT".to_string()
                }
            }
            Param::Float(v) => format!("{:?}", v),
            Param::Text(s) => {
                if s.contains('\0') {
                    return Err(Error::InvalidUsage(
                        "string parameter contains a NUL character".into(),
                    ));
                }
                format!("'{}'", s.replace('\'', "''"))
            }
            Param::Bytes(bytes) => {
                let mut out = String::with_capacity(bytes.len() * 2 + 3);
                out.push_str("X'");
                for b in bytes {
                    out.push_str(&format!("{:02X}", b));
                }
                out.push('\'');
                out
            }
        })
    }
}

/// Parameters for one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// Values for `%s` placeholders, in order
    Positional(Vec<Param>),
    /// Values for `:name` placeholders
    Named(Vec<(String, Param)>),
}

impl Params {
    /// Check if there are no parameter values.
    pub fn is_empty(&self) -> bool {
        match self {
            Params::Positional(values) => values.is_empty(),
            Params::Named(values) => values.is_empty(),
        }
    }
}

/// Substitute quoted parameters into `sql`.
pub fn bind_parameters(sql: &str, params: &Params, quoter: &dyn LiteralQuoter) -> Result<String> {
    match params {
        Params::Positional(values) => bind_positional(sql, values, quoter),
        Params::Named(values) => bind_named(sql, values, quoter),
    }
}

fn bind_positional(sql: &str, values: &[Param], quoter: &dyn LiteralQuoter) -> Result<String> {
    let mut out = String::with_capacity(sql.len());
    let mut values = values.iter();
    let mut chars = sql.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('s') => {
                let value = values.next().ok_or_else(|| {
                    Error::InvalidUsage("not enough parameters for the statement".into())
                })?;
                out.push_str(&quoter.quote_literal(value)?);
            }
            other => {
                return Err(Error::InvalidUsage(format!(
                    "unsupported placeholder '%{}'",
                    other.map(String::from).unwrap_or_default()
                )));
            }
        }
    }

    if values.next().is_some() {
        return Err(Error::InvalidUsage(
            "not all parameters were used by the statement".into(),
        ));
    }
    Ok(out)
}

fn bind_named(sql: &str, values: &[(String, Param)], quoter: &dyn LiteralQuoter) -> Result<String> {
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;

    while let Some(pos) = rest.find(':') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        // `::type` casts are never placeholders
        if let Some(cast) = after.strip_prefix(':') {
            out.push_str("::");
            let len = cast.find(|c: char| !is_ident(c)).unwrap_or(cast.len());
            out.push_str(&cast[..len]);
            rest = &cast[len..];
            continue;
        }

        let len = after.find(|c: char| !is_ident(c)).unwrap_or(after.len());
        let name = &after[..len];
        match values.iter().find(|(key, _)| key == name) {
            Some((_, value)) if !name.is_empty() => out.push_str(&quoter.quote_literal(value)?),
            _ => {
                out.push(':');
                out.push_str(name);
            }
        }
        rest = &after[len..];
    }

    out.push_str(rest);
    Ok(out)
}

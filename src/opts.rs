//! Cursor options.

use std::str::FromStr;

use url::Url;

use crate::error::Error;

/// Shape of the rows returned by fetch operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorType {
    /// Positional sequence of values
    #[default]
    Array,
    /// Mapping from column name to value, in column order
    Dict,
}

impl FromStr for CursorType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "list" | "array" => Ok(CursorType::Array),
            "dict" => Ok(CursorType::Dict),
            _ => Err(Error::InvalidUsage(format!(
                "Invalid cursor_type: expected one of ['list', 'array', 'dict'], got {}",
                s
            ))),
        }
    }
}

/// How text values with invalid UTF-8 are handled during conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnicodeError {
    /// Fail the fetch with a decode error
    #[default]
    Strict,
    /// Substitute U+FFFD for each invalid sequence
    Replace,
    /// Drop invalid sequences
    Ignore,
}

impl FromStr for UnicodeError {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(UnicodeError::Strict),
            "replace" => Ok(UnicodeError::Replace),
            "ignore" => Ok(UnicodeError::Ignore),
            _ => Err(Error::InvalidUsage(format!(
                "Invalid unicode_error: expected one of ['strict', 'replace', 'ignore'], got {}",
                s
            ))),
        }
    }
}

/// Options applied to every cursor created from a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Row shape produced by fetch operations.
    ///
    /// Default: `CursorType::Array`
    pub cursor_type: CursorType,

    /// Policy for invalid UTF-8 in text columns.
    ///
    /// Default: `UnicodeError::Strict`
    pub unicode_error: UnicodeError,

    /// Number of rows `fetchmany` returns when no size is given.
    ///
    /// Default: `1`
    pub array_size: usize,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            cursor_type: CursorType::Array,
            unicode_error: UnicodeError::Strict,
            array_size: 1,
        }
    }
}

impl TryFrom<&Url> for Opts {
    type Error = Error;

    /// Read cursor options from the query string of a connection URL.
    ///
    /// Format: `vertica://[user[:password]@]host[:port][/database][?param1=value1&..]`
    ///
    /// Supported query parameters:
    /// - `cursor_type`: list, array, dict
    /// - `unicode_error`: strict, replace, ignore
    /// - `arraysize`: default `fetchmany` size (positive integer)
    ///
    /// Other parameters belong to the connection and are ignored here.
    fn try_from(url: &Url) -> Result<Self, Self::Error> {
        if url.scheme() != "vertica" {
            return Err(Error::InvalidUsage(format!(
                "Invalid scheme: expected 'vertica://', got '{}://'",
                url.scheme()
            )));
        }

        let mut opts = Opts::default();

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "cursor_type" => opts.cursor_type = value.parse()?,
                "unicode_error" => opts.unicode_error = value.parse()?,
                "arraysize" => {
                    opts.array_size = match value.parse::<usize>() {
                        Ok(size) if size > 0 => size,
                        _ => {
                            return Err(Error::InvalidUsage(format!(
                                "Invalid arraysize: {}",
                                value
                            )));
                        }
                    };
                }
                _ => {
                    tracing::trace!("ignoring connection parameter {}", key);
                }
            }
        }

        Ok(opts)
    }
}

impl TryFrom<&str> for Opts {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let url = Url::parse(s).map_err(|e| Error::InvalidUsage(format!("Invalid URL: {}", e)))?;
        Self::try_from(&url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = Opts::try_from("vertica://dbadmin@localhost:5433/db").unwrap();
        assert_eq!(opts, Opts::default());
    }

    #[test]
    fn test_query_params() {
        let opts = Opts::try_from(
            "vertica://localhost/db?cursor_type=dict&unicode_error=replace&arraysize=50&tlsmode=disable",
        )
        .unwrap();
        assert_eq!(opts.cursor_type, CursorType::Dict);
        assert_eq!(opts.unicode_error, UnicodeError::Replace);
        assert_eq!(opts.array_size, 50);
    }

    #[test]
    fn test_rejects_unknown_cursor_type() {
        assert!(Opts::try_from("vertica://localhost?cursor_type=tuple").is_err());
        assert!(Opts::try_from("vertica://localhost?unicode_error=loud").is_err());
        assert!(Opts::try_from("vertica://localhost?arraysize=0").is_err());
        assert!(Opts::try_from("postgres://localhost").is_err());
    }
}

//! Error types for zero-vertica.

use thiserror::Error;

/// Result type for zero-vertica operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error/notice fields sent by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorFields {
    /// Severity: ERROR, FATAL, PANIC, WARNING, NOTICE, DEBUG, INFO, LOG
    pub severity: Option<String>,
    /// SQLSTATE error code (5 characters)
    pub code: Option<String>,
    /// Primary error message
    pub message: Option<String>,
    /// Detailed error explanation
    pub detail: Option<String>,
    /// Suggestion for fixing the error
    pub hint: Option<String>,
    /// Cursor position in query string (1-based)
    pub position: Option<u32>,
    /// Context/stack trace
    pub where_: Option<String>,
    /// Source file name
    pub file: Option<String>,
    /// Source line number
    pub line: Option<u32>,
    /// Source routine name
    pub routine: Option<String>,
    /// Vertica-specific numeric error code
    pub error_code: Option<u32>,
}

impl std::fmt::Display for ErrorFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(severity) = &self.severity {
            write!(f, "{}: ", severity)?;
        }
        if let Some(message) = &self.message {
            write!(f, "{}", message)?;
        }
        if let Some(code) = &self.code {
            write!(f, " (SQLSTATE {})", code)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, "\nDETAIL: {}", detail)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\nHINT: {}", hint)?;
        }
        Ok(())
    }
}

/// Error type for zero-vertica.
#[derive(Debug, Error)]
pub enum Error {
    /// Operation attempted on a closed cursor or connection
    #[error("Cursor is closed")]
    Closed,

    /// Server rejected the submitted statement
    #[error("Query error: {fields}\nSQL: {sql}")]
    Query {
        /// Diagnostic fields from the ErrorResponse
        fields: ErrorFields,
        /// Statement text as it was sent to the server
        sql: String,
    },

    /// Protocol error (malformed message, unexpected response, etc.)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Column value could not be converted
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid usage (e.g., bad option value, parameter count mismatch)
    #[error("Invalid usage: {0}")]
    InvalidUsage(String),

    /// Unsupported feature
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    /// Build a query error from server fields and the statement text.
    pub fn query(fields: ErrorFields, sql: &str) -> Self {
        Error::Query {
            fields,
            sql: sql.to_string(),
        }
    }

    /// Returns true if the error indicates the connection is broken and cannot be reused.
    pub fn is_connection_broken(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Query { fields, .. } => {
                // FATAL and PANIC errors terminate the session
                matches!(fields.severity.as_deref(), Some("FATAL") | Some("PANIC"))
            }
            _ => false,
        }
    }

    /// Get the SQLSTATE code if this is a server error.
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Error::Query { fields, .. } => fields.code.as_deref(),
            _ => None,
        }
    }

    /// Get the statement text if this is a server error.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Query { sql, .. } => Some(sql),
            _ => None,
        }
    }
}

impl<Src: std::fmt::Debug, Dst: std::fmt::Debug + ?Sized>
    From<zerocopy::error::CastError<Src, Dst>> for Error
{
    fn from(err: zerocopy::error::CastError<Src, Dst>) -> Self {
        Error::Protocol(format!("zerocopy cast error: {err:?}"))
    }
}

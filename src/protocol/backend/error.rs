//! Error and notice response messages.

use crate::error::{ErrorFields, Result};
use crate::protocol::codec::{read_cstr, read_u8};

/// Error field type codes.
pub mod field_type {
    /// Severity
    pub const SEVERITY: u8 = b'S';
    /// SQLSTATE code
    pub const CODE: u8 = b'C';
    /// Message
    pub const MESSAGE: u8 = b'M';
    /// Detail
    pub const DETAIL: u8 = b'D';
    /// Hint
    pub const HINT: u8 = b'H';
    /// Position in query
    pub const POSITION: u8 = b'P';
    /// Where (context)
    pub const WHERE: u8 = b'W';
    /// File name
    pub const FILE: u8 = b'F';
    /// Line number
    pub const LINE: u8 = b'L';
    /// Routine name
    pub const ROUTINE: u8 = b'R';
    /// Vertica error code
    pub const ERROR_CODE: u8 = b'V';
}

/// Parse error/notice fields from payload.
fn parse_fields(payload: &[u8]) -> Result<ErrorFields> {
    let mut fields = ErrorFields::default();
    let mut data = payload;

    loop {
        let (field, rest) = read_u8(data)?;
        if field == 0 {
            break;
        }

        let (value, rest) = read_cstr(rest)?;
        data = rest;

        match field {
            field_type::SEVERITY => fields.severity = Some(value.to_string()),
            field_type::CODE => fields.code = Some(value.to_string()),
            field_type::MESSAGE => fields.message = Some(value.to_string()),
            field_type::DETAIL => fields.detail = Some(value.to_string()),
            field_type::HINT => fields.hint = Some(value.to_string()),
            field_type::POSITION => fields.position = value.parse().ok(),
            field_type::WHERE => fields.where_ = Some(value.to_string()),
            field_type::FILE => fields.file = Some(value.to_string()),
            field_type::LINE => fields.line = value.parse().ok(),
            field_type::ROUTINE => fields.routine = Some(value.to_string()),
            field_type::ERROR_CODE => fields.error_code = value.parse().ok(),
            _ => {
                tracing::debug!("Unknown error field type: {}", field as char);
            }
        }
    }

    Ok(fields)
}

/// ErrorResponse message - the server rejected the current statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse(pub ErrorFields);

impl ErrorResponse {
    /// Parse an ErrorResponse message from payload bytes.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        Ok(Self(parse_fields(payload)?))
    }
}

/// NoticeResponse message - non-fatal warning/info from server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeResponse(pub ErrorFields);

impl NoticeResponse {
    /// Parse a NoticeResponse message from payload bytes.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        Ok(Self(parse_fields(payload)?))
    }
}

//! Backend (server → client) messages.

pub mod copy;
pub mod error;
pub mod query;
pub mod status;

pub use copy::CopyInResponse;
pub use error::{ErrorResponse, NoticeResponse};
pub use query::{CommandComplete, DataRow, FieldDescription, RowDescription};
pub use status::{NotificationResponse, ParameterStatus, ReadyForQuery};

use crate::error::Result;

/// Backend message type bytes.
pub mod msg_type {
    /// ParameterStatus
    pub const PARAMETER_STATUS: u8 = b'S';
    /// ReadyForQuery
    pub const READY_FOR_QUERY: u8 = b'Z';
    /// RowDescription
    pub const ROW_DESCRIPTION: u8 = b'T';
    /// DataRow
    pub const DATA_ROW: u8 = b'D';
    /// CommandComplete
    pub const COMMAND_COMPLETE: u8 = b'C';
    /// EmptyQueryResponse
    pub const EMPTY_QUERY_RESPONSE: u8 = b'I';
    /// ErrorResponse
    pub const ERROR_RESPONSE: u8 = b'E';
    /// NoticeResponse
    pub const NOTICE_RESPONSE: u8 = b'N';
    /// NotificationResponse
    pub const NOTIFICATION_RESPONSE: u8 = b'A';
    /// CopyInResponse
    pub const COPY_IN_RESPONSE: u8 = b'G';
}

/// A message received from the server.
///
/// Every message kind the statement layer interprets has its own variant;
/// anything else is carried as [`BackendMessage::Other`] and left to the
/// channel's generic processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendMessage {
    /// The current statement failed
    ErrorResponse(ErrorResponse),
    /// Column layout of the result set that follows
    RowDescription(RowDescription),
    /// One row of the current result set
    DataRow(DataRow),
    /// End of one statement's results
    CommandComplete(CommandComplete),
    /// End of the batch; carries transaction status
    ReadyForQuery(ReadyForQuery),
    /// Server is waiting for COPY data
    CopyInResponse(CopyInResponse),
    /// The submitted query string was empty
    EmptyQueryResponse,
    /// Non-fatal notice
    NoticeResponse(NoticeResponse),
    /// Run-time parameter changed
    ParameterStatus(ParameterStatus),
    /// Asynchronous notification
    NotificationResponse(NotificationResponse),
    /// Any message kind not listed above
    Other {
        /// Message type byte
        type_byte: u8,
        /// Raw payload
        payload: Vec<u8>,
    },
}

impl BackendMessage {
    /// Parse a message from its type byte and payload.
    pub fn parse(type_byte: u8, payload: &[u8]) -> Result<Self> {
        Ok(match type_byte {
            msg_type::ERROR_RESPONSE => Self::ErrorResponse(ErrorResponse::parse(payload)?),
            msg_type::ROW_DESCRIPTION => Self::RowDescription(RowDescription::parse(payload)?),
            msg_type::DATA_ROW => Self::DataRow(DataRow::parse(payload)?),
            msg_type::COMMAND_COMPLETE => Self::CommandComplete(CommandComplete::parse(payload)?),
            msg_type::READY_FOR_QUERY => Self::ReadyForQuery(ReadyForQuery::parse(payload)?),
            msg_type::COPY_IN_RESPONSE => Self::CopyInResponse(CopyInResponse::parse(payload)?),
            msg_type::EMPTY_QUERY_RESPONSE => Self::EmptyQueryResponse,
            msg_type::NOTICE_RESPONSE => Self::NoticeResponse(NoticeResponse::parse(payload)?),
            msg_type::PARAMETER_STATUS => Self::ParameterStatus(ParameterStatus::parse(payload)?),
            msg_type::NOTIFICATION_RESPONSE => {
                Self::NotificationResponse(NotificationResponse::parse(payload)?)
            }
            _ => Self::Other {
                type_byte,
                payload: payload.to_vec(),
            },
        })
    }

    /// Check if this message can arrive at any point, independent of the statement.
    pub fn is_async(&self) -> bool {
        matches!(
            self,
            Self::NoticeResponse(_) | Self::ParameterStatus(_) | Self::NotificationResponse(_)
        )
    }

    /// Human-readable message kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ErrorResponse(_) => "ErrorResponse",
            Self::RowDescription(_) => "RowDescription",
            Self::DataRow(_) => "DataRow",
            Self::CommandComplete(_) => "CommandComplete",
            Self::ReadyForQuery(_) => "ReadyForQuery",
            Self::CopyInResponse(_) => "CopyInResponse",
            Self::EmptyQueryResponse => "EmptyQueryResponse",
            Self::NoticeResponse(_) => "NoticeResponse",
            Self::ParameterStatus(_) => "ParameterStatus",
            Self::NotificationResponse(_) => "NotificationResponse",
            Self::Other { .. } => "Unknown",
        }
    }
}

impl std::fmt::Display for BackendMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Other { type_byte, .. } => write!(f, "Unknown('{}')", *type_byte as char),
            Self::CommandComplete(complete) => write!(f, "CommandComplete({})", complete.tag),
            _ => f.write_str(self.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::TransactionStatus;

    #[test]
    fn test_parse_dispatch() {
        let msg = BackendMessage::parse(msg_type::READY_FOR_QUERY, b"I").unwrap();
        assert_eq!(
            msg,
            BackendMessage::ReadyForQuery(ReadyForQuery {
                transaction_status: TransactionStatus::Idle
            })
        );

        let msg = BackendMessage::parse(msg_type::COMMAND_COMPLETE, b"INSERT 0 1\0").unwrap();
        assert_eq!(msg.to_string(), "CommandComplete(INSERT 0 1)");

        let msg = BackendMessage::parse(b'K', &[0, 0, 0, 1, 0, 0, 0, 2]).unwrap();
        assert_eq!(msg.kind(), "Unknown");
        assert_eq!(msg.to_string(), "Unknown('K')");
    }

    #[test]
    fn test_is_async() {
        let notice = BackendMessage::parse(msg_type::NOTICE_RESPONSE, b"Mhi\0\0").unwrap();
        assert!(notice.is_async());
        assert!(!BackendMessage::EmptyQueryResponse.is_async());
    }
}

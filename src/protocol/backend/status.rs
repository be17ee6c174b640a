//! Session status messages that can arrive between statement replies.

use crate::error::{Error, Result};
use crate::protocol::codec::{read_cstr, read_u8, read_u32};
use crate::protocol::types::TransactionStatus;

/// ReadyForQuery message - the server is idle and ready for a new batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyForQuery {
    /// Transaction status reported with the reply
    pub transaction_status: TransactionStatus,
}

impl ReadyForQuery {
    /// Parse a ReadyForQuery message from payload bytes.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let (status, _) = read_u8(payload)?;
        let transaction_status = TransactionStatus::from_byte(status).ok_or_else(|| {
            Error::Protocol(format!(
                "ReadyForQuery: unknown transaction status '{}'",
                status as char
            ))
        })?;
        Ok(Self { transaction_status })
    }
}

/// ParameterStatus message - server parameter name and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterStatus {
    /// Parameter name
    pub name: String,
    /// Parameter value
    pub value: String,
}

impl ParameterStatus {
    /// Parse a ParameterStatus message from payload bytes.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let (name, rest) = read_cstr(payload)?;
        let (value, _) = read_cstr(rest)?;
        Ok(Self {
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}

/// NotificationResponse message - asynchronous notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationResponse {
    /// PID of the notifying backend
    pub pid: u32,
    /// Channel name
    pub channel: String,
    /// Notification payload
    pub payload: String,
}

impl NotificationResponse {
    /// Parse a NotificationResponse message from payload bytes.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let (pid, rest) = read_u32(payload)?;
        let (channel, rest) = read_cstr(rest)?;
        let (payload_str, _) = read_cstr(rest)?;
        Ok(Self {
            pid,
            channel: channel.to_string(),
            payload: payload_str.to_string(),
        })
    }
}

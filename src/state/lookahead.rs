//! The single-message lookahead slot.

use crate::error::ErrorFields;
use crate::protocol::backend::{BackendMessage, CommandComplete, DataRow};
use crate::protocol::types::TransactionStatus;

/// The next message read from the channel but not yet consumed by the caller.
///
/// The cursor never reads more than one message ahead of what the caller has
/// consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Lookahead {
    /// Nothing has been read yet
    #[default]
    Empty,
    /// A row waiting to be fetched
    Row(DataRow),
    /// The current statement has no more rows
    CommandComplete(CommandComplete),
    /// The batch is complete
    ReadyForQuery(TransactionStatus),
    /// The server aborted the statement; ReadyForQuery is still to come.
    ///
    /// Holds the server diagnostic until it has been reported to the caller.
    Failed(Option<ErrorFields>),
    /// A message that is neither a row nor a terminal marker
    Pending(BackendMessage),
}

impl Lookahead {
    /// Classify a message pulled while iterating rows.
    pub fn from_message(msg: BackendMessage) -> Self {
        match msg {
            BackendMessage::DataRow(row) => Lookahead::Row(row),
            BackendMessage::CommandComplete(complete) => Lookahead::CommandComplete(complete),
            BackendMessage::ReadyForQuery(ready) => {
                Lookahead::ReadyForQuery(ready.transaction_status)
            }
            BackendMessage::ErrorResponse(error) => Lookahead::Failed(Some(error.0)),
            other => Lookahead::Pending(other),
        }
    }

    /// Check if nothing has been read.
    pub fn is_empty(&self) -> bool {
        matches!(self, Lookahead::Empty)
    }

    /// Check if the slot holds a row.
    pub fn is_row(&self) -> bool {
        matches!(self, Lookahead::Row(_))
    }

    /// Check if the slot holds the end-of-batch marker.
    pub fn is_ready_for_query(&self) -> bool {
        matches!(self, Lookahead::ReadyForQuery(_))
    }

    /// Check if the slot holds the end-of-statement marker.
    pub fn is_command_complete(&self) -> bool {
        matches!(self, Lookahead::CommandComplete(_))
    }

    /// Short name of the slot contents, used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Lookahead::Empty => "Empty".to_string(),
            Lookahead::Row(_) => "DataRow".to_string(),
            Lookahead::CommandComplete(complete) => format!("CommandComplete({})", complete.tag),
            Lookahead::ReadyForQuery(_) => "ReadyForQuery".to_string(),
            Lookahead::Failed(_) => "ErrorResponse".to_string(),
            Lookahead::Pending(msg) => msg.to_string(),
        }
    }
}

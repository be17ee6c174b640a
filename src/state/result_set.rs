//! Result-set boundary classification.

use crate::error::{Error, Result};
use crate::protocol::backend::{BackendMessage, FieldDescription};
use crate::protocol::types::TransactionStatus;

use super::lookahead::Lookahead;

/// Where the cursor stands relative to the result sets of the current batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSetState {
    /// Nothing has been submitted
    NoStatement,
    /// Rows of the current result set may remain
    WithinSet,
    /// The current statement completed; another may follow
    AtSetBoundary,
    /// The server has finished the batch
    BatchComplete,
}

impl ResultSetState {
    /// Classify the lookahead slot.
    pub fn of(lookahead: &Lookahead) -> Self {
        match lookahead {
            Lookahead::Empty => ResultSetState::NoStatement,
            Lookahead::CommandComplete(_) => ResultSetState::AtSetBoundary,
            Lookahead::ReadyForQuery(_) => ResultSetState::BatchComplete,
            Lookahead::Row(_) | Lookahead::Failed(_) | Lookahead::Pending(_) => {
                ResultSetState::WithinSet
            }
        }
    }
}

/// What follows a CommandComplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AfterBoundary {
    /// Another result set with its column layout
    NextSet(Vec<FieldDescription>),
    /// The batch is complete
    BatchComplete(TransactionStatus),
}

/// Classify the first non-async message after a CommandComplete.
pub fn classify_after_boundary(msg: BackendMessage) -> Result<AfterBoundary> {
    match msg {
        BackendMessage::RowDescription(desc) => Ok(AfterBoundary::NextSet(desc.into_fields())),
        BackendMessage::ReadyForQuery(ready) => {
            Ok(AfterBoundary::BatchComplete(ready.transaction_status))
        }
        other => Err(Error::Protocol(format!(
            "Unexpected nextset() state after CommandComplete: {}",
            other
        ))),
    }
}

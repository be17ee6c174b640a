//! Statement submission state machine.
//!
//! Drives the response to a Query message up to the first message that
//! belongs to the caller: a row, the end of a statement, or the end of the
//! batch. Everything before that point is consumed here.

use crate::error::{Error, Result};
use crate::protocol::backend::{BackendMessage, FieldDescription};
use crate::protocol::frontend::FrontendMessage;

use super::action::Action;

/// Reason sent with CopyFail when a bulk load is started through `execute`.
pub const COPY_VIA_EXECUTE: &str = "COPY FROM STDIN must be issued through copy()";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    WaitingResponse,
    Finished,
}

/// State machine for one `execute` call.
pub struct StatementStateMachine<'q> {
    state: State,
    sql: &'q str,
    description: Option<Vec<FieldDescription>>,
}

impl<'q> StatementStateMachine<'q> {
    /// Create a state machine for the given statement text.
    pub fn new(sql: &'q str) -> Self {
        Self {
            state: State::Initial,
            sql,
            description: None,
        }
    }

    /// Start the statement. The returned message must be written first.
    pub fn start(&mut self) -> FrontendMessage<'q> {
        self.state = State::WaitingResponse;
        FrontendMessage::Query(self.sql)
    }

    /// Take the column layout seen before the yielded message, if any.
    pub fn take_description(&mut self) -> Option<Vec<FieldDescription>> {
        self.description.take()
    }

    /// Process a message from the server.
    pub fn step(&mut self, msg: BackendMessage) -> Result<Action> {
        if self.state != State::WaitingResponse {
            return Err(Error::Protocol(format!(
                "Statement state machine received {} in state {:?}",
                msg.kind(),
                self.state
            )));
        }

        match msg {
            BackendMessage::ErrorResponse(error) => {
                self.state = State::Finished;
                Err(Error::query(error.0, self.sql))
            }
            BackendMessage::RowDescription(desc) => {
                self.description = Some(desc.into_fields());
                Ok(Action::ReadMessage)
            }
            msg @ (BackendMessage::DataRow(_)
            | BackendMessage::CommandComplete(_)
            | BackendMessage::ReadyForQuery(_)) => {
                self.state = State::Finished;
                Ok(Action::Yield(msg))
            }
            BackendMessage::CopyInResponse(_) => {
                Ok(Action::Write(FrontendMessage::CopyFail(COPY_VIA_EXECUTE)))
            }
            other => Ok(Action::Delegate(other)),
        }
    }
}

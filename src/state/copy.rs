//! COPY FROM STDIN state machine.

use crate::error::{Error, Result};
use crate::protocol::backend::BackendMessage;
use crate::protocol::frontend::FrontendMessage;

use super::action::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    WaitingCopyIn,
    WaitingComplete,
    Finished,
}

/// State machine for one bulk load.
///
/// The payload itself is pushed by the caller when [`Action::PushCopyData`]
/// is returned; this machine only tracks the server side of the exchange.
pub struct CopyStateMachine<'q> {
    state: State,
    sql: &'q str,
    rows_loaded: Option<u64>,
}

impl<'q> CopyStateMachine<'q> {
    /// Create a state machine for the given COPY statement.
    pub fn new(sql: &'q str) -> Self {
        Self {
            state: State::Initial,
            sql,
            rows_loaded: None,
        }
    }

    /// Start the load. The returned message must be written first.
    pub fn start(&mut self) -> FrontendMessage<'q> {
        self.state = State::WaitingCopyIn;
        FrontendMessage::Query(self.sql)
    }

    /// Row count from the COPY command tag, once seen.
    pub fn rows_loaded(&self) -> Option<u64> {
        self.rows_loaded
    }

    /// Process a message from the server.
    pub fn step(&mut self, msg: BackendMessage) -> Result<Action> {
        if matches!(self.state, State::Initial | State::Finished) {
            return Err(Error::Protocol(format!(
                "COPY state machine received {} in state {:?}",
                msg.kind(),
                self.state
            )));
        }

        match msg {
            BackendMessage::ErrorResponse(error) => {
                self.state = State::Finished;
                Err(Error::query(error.0, self.sql))
            }
            BackendMessage::CopyInResponse(_) => {
                if self.state != State::WaitingCopyIn {
                    return Err(Error::Protocol(
                        "Received a second CopyInResponse for one COPY statement".into(),
                    ));
                }
                self.state = State::WaitingComplete;
                Ok(Action::PushCopyData)
            }
            BackendMessage::CommandComplete(complete) => {
                self.rows_loaded = complete.rows_affected();
                Ok(Action::ReadMessage)
            }
            msg @ BackendMessage::ReadyForQuery(_) => {
                self.state = State::Finished;
                Ok(Action::Yield(msg))
            }
            other => Ok(Action::Delegate(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorFields;
    use crate::protocol::backend::{CommandComplete, CopyInResponse, ErrorResponse, ReadyForQuery};
    use crate::protocol::types::{FormatCode, TransactionStatus};

    fn copy_in() -> BackendMessage {
        BackendMessage::CopyInResponse(CopyInResponse {
            format: FormatCode::Text,
            column_formats: vec![FormatCode::Text],
        })
    }

    fn ready() -> BackendMessage {
        BackendMessage::ReadyForQuery(ReadyForQuery {
            transaction_status: TransactionStatus::Idle,
        })
    }

    #[test]
    fn test_successful_load() {
        let mut sm = CopyStateMachine::new("COPY t FROM STDIN");
        assert_eq!(sm.start(), FrontendMessage::Query("COPY t FROM STDIN"));

        assert!(matches!(sm.step(copy_in()).unwrap(), Action::PushCopyData));

        let complete = BackendMessage::CommandComplete(CommandComplete {
            tag: "COPY 3".into(),
        });
        assert!(matches!(sm.step(complete).unwrap(), Action::ReadMessage));
        assert_eq!(sm.rows_loaded(), Some(3));

        assert!(matches!(sm.step(ready()).unwrap(), Action::Yield(_)));
    }

    #[test]
    fn test_rejected_load() {
        let mut sm = CopyStateMachine::new("COPY missing FROM STDIN");
        sm.start();
        let fields = ErrorFields {
            message: Some("relation does not exist".into()),
            ..Default::default()
        };
        let err = sm
            .step(BackendMessage::ErrorResponse(ErrorResponse(fields)))
            .unwrap_err();
        assert_eq!(err.sql(), Some("COPY missing FROM STDIN"));
    }

    #[test]
    fn test_second_copy_in_is_a_protocol_error() {
        let mut sm = CopyStateMachine::new("COPY t FROM STDIN");
        sm.start();
        sm.step(copy_in()).unwrap();
        assert!(matches!(sm.step(copy_in()), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_async_messages_are_delegated() {
        let mut sm = CopyStateMachine::new("COPY t FROM STDIN");
        sm.start();
        let other = BackendMessage::Other {
            type_byte: b'K',
            payload: vec![],
        };
        assert!(matches!(sm.step(other).unwrap(), Action::Delegate(_)));
    }
}

//! Sans-I/O state machines for statement execution.
//!
//! These state machines handle the protocol logic without performing any I/O.
//! They produce `Action` values that tell the caller what to do next.

pub mod action;
pub mod copy;
pub mod lookahead;
pub mod result_set;
pub mod statement;

pub use action::Action;
pub use copy::CopyStateMachine;
pub use lookahead::Lookahead;
pub use result_set::{AfterBoundary, ResultSetState, classify_after_boundary};
pub use statement::StatementStateMachine;

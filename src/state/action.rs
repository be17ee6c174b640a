//! Action types for state machine I/O requests.

use crate::protocol::backend::BackendMessage;
use crate::protocol::frontend::FrontendMessage;

/// Action requested by a state machine.
///
/// The caller should perform the requested I/O and then call the
/// appropriate method to continue the state machine.
#[derive(Debug)]
pub enum Action {
    /// Read the next message from the channel and call `step()` again.
    ReadMessage,

    /// Hand the message to the channel's generic processor, then read the
    /// next message and call `step()` again.
    Delegate(BackendMessage),

    /// Write the message to the channel, then read the next message and
    /// call `step()` again.
    Write(FrontendMessage<'static>),

    /// Push the COPY payload followed by CopyDone, then read the next
    /// message and call `step()` again.
    PushCopyData,

    /// Stop reading. The message is the new lookahead and control returns
    /// to the caller.
    Yield(BackendMessage),
}

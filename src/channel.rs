//! The connection seam the cursor runs on.

use crate::cursor::Cursor;
use crate::error::Result;
use crate::opts::Opts;
use crate::protocol::backend::BackendMessage;
use crate::protocol::frontend::FrontendMessage;
use crate::protocol::types::TransactionStatus;

/// A message channel to the server with an established session.
///
/// The channel owns framing and socket I/O. Cursors borrow it mutably, so
/// only one statement can be in flight on a channel at a time.
pub trait Channel {
    /// Send one message and flush it.
    fn write(&mut self, msg: FrontendMessage<'_>) -> Result<()>;

    /// Block until the next message arrives.
    fn read_message(&mut self) -> Result<BackendMessage>;

    /// Handle a message the statement layer does not interpret itself
    /// (notices, parameter changes, notifications, ...).
    fn process_message(&mut self, msg: BackendMessage) -> Result<()>;

    /// Check if the channel has been closed.
    fn closed(&self) -> bool;

    /// Transaction status from the most recent ReadyForQuery.
    fn transaction_status(&self) -> TransactionStatus;

    /// Record the transaction status carried by a ReadyForQuery.
    fn set_transaction_status(&mut self, status: TransactionStatus);

    /// Cursor options used by [`Channel::cursor`].
    fn cursor_opts(&self) -> Opts {
        Opts::default()
    }

    /// Open a cursor on this channel.
    fn cursor(&mut self) -> Cursor<'_, Self>
    where
        Self: Sized,
    {
        let opts = self.cursor_opts();
        Cursor::new(self, opts)
    }
}

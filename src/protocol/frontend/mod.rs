//! Frontend (client → server) messages.
//!
//! The statement layer only ever sends a handful of messages: the Query that
//! submits a batch, the CopyData/CopyDone/CopyFail trio of the COPY data
//! phase, and Terminate when the session ends.

use crate::protocol::codec::MessageBuilder;

/// Frontend message type bytes.
pub mod msg_type {
    /// Query (simple query protocol)
    pub const QUERY: u8 = b'Q';
    /// CopyData
    pub const COPY_DATA: u8 = b'd';
    /// CopyDone
    pub const COPY_DONE: u8 = b'c';
    /// CopyFail
    pub const COPY_FAIL: u8 = b'f';
    /// Terminate
    pub const TERMINATE: u8 = b'X';
}

/// A message sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontendMessage<'a> {
    /// Submit a statement batch; may hold several `;`-separated statements
    Query(&'a str),
    /// One chunk of COPY payload
    CopyData(&'a [u8]),
    /// End of COPY payload
    CopyDone,
    /// Abort the COPY data phase with a reason
    CopyFail(&'a str),
    /// Close the session
    Terminate,
}

impl FrontendMessage<'_> {
    /// Message type byte.
    pub fn type_byte(&self) -> u8 {
        match self {
            FrontendMessage::Query(_) => msg_type::QUERY,
            FrontendMessage::CopyData(_) => msg_type::COPY_DATA,
            FrontendMessage::CopyDone => msg_type::COPY_DONE,
            FrontendMessage::CopyFail(_) => msg_type::COPY_FAIL,
            FrontendMessage::Terminate => msg_type::TERMINATE,
        }
    }

    /// Append the framed message to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        let mut msg = MessageBuilder::new(buf, self.type_byte());
        match *self {
            FrontendMessage::Query(sql) => msg.write_cstr(sql),
            FrontendMessage::CopyData(data) => msg.write_bytes(data),
            FrontendMessage::CopyFail(reason) => msg.write_cstr(reason),
            FrontendMessage::CopyDone | FrontendMessage::Terminate => {}
        }
        msg.finish();
    }
}

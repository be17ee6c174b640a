//! Synchronous Vertica connection.

use std::io::{Read, Write};

use crate::channel::Channel;
use crate::error::{Error, ErrorFields, Result};
use crate::opts::Opts;
use crate::protocol::backend::BackendMessage;
use crate::protocol::frontend::FrontendMessage;
use crate::protocol::types::TransactionStatus;

use super::stream::Stream;

/// Number of notices kept before the oldest are discarded.
pub const MAX_NOTICES: usize = 1024;

/// Read one framed message from the stream into `buffer`; returns its type byte.
fn read_message_into<S: Read>(stream: &mut S, buffer: &mut Vec<u8>) -> Result<u8> {
    // Read type byte
    let mut type_byte = [0u8; 1];
    stream.read_exact(&mut type_byte)?;

    // Read length (4 bytes, big-endian)
    let mut length_bytes = [0u8; 4];
    stream.read_exact(&mut length_bytes)?;
    let length = u32::from_be_bytes(length_bytes);

    if length < 4 {
        return Err(Error::Protocol(format!(
            "Invalid message length: {}",
            length
        )));
    }

    // Read payload
    let payload_len = (length - 4) as usize;
    buffer.clear();
    buffer.resize(payload_len, 0);
    stream.read_exact(buffer)?;

    Ok(type_byte[0])
}

/// Synchronous Vertica connection.
///
/// Wraps a stream whose startup and authentication exchange has already
/// completed, and serves as the [`Channel`] for cursors.
pub struct Conn<S: Read + Write = Stream> {
    stream: S,
    read_buffer: Vec<u8>,
    write_buffer: Vec<u8>,
    opts: Opts,
    server_params: Vec<(String, String)>,
    notices: Vec<ErrorFields>,
    transaction_status: TransactionStatus,
    closed: bool,
    is_broken: bool,
}

impl<S: Read + Write> Conn<S> {
    /// Wrap an established session.
    pub fn new_with_stream(stream: S, opts: Opts) -> Self {
        Self {
            stream,
            read_buffer: Vec::with_capacity(8192),
            write_buffer: Vec::with_capacity(8192),
            opts,
            server_params: Vec::new(),
            notices: Vec::new(),
            transaction_status: TransactionStatus::Idle,
            closed: false,
            is_broken: false,
        }
    }

    /// Cursor options this connection hands to new cursors.
    pub fn opts(&self) -> &Opts {
        &self.opts
    }

    /// Get server parameters reported since the connection was wrapped.
    pub fn server_params(&self) -> &[(String, String)] {
        &self.server_params
    }

    /// Get a single server parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.server_params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Notices received so far.
    ///
    /// At most [`MAX_NOTICES`] are kept; drain them with [`Conn::take_notices`].
    pub fn notices(&self) -> &[ErrorFields] {
        &self.notices
    }

    /// Take and clear the received notices.
    pub fn take_notices(&mut self) -> Vec<ErrorFields> {
        std::mem::take(&mut self.notices)
    }

    /// Returns true if currently in a transaction.
    pub fn in_transaction(&self) -> bool {
        self.transaction_status.in_transaction()
    }

    /// Check if the connection is broken.
    ///
    /// Set after an I/O failure, a framing error, or a FATAL/PANIC server
    /// error. A broken connection reports itself closed.
    pub fn is_broken(&self) -> bool {
        self.is_broken
    }

    /// Close the session.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        if self.is_broken {
            return Ok(());
        }
        self.write_buffer.clear();
        FrontendMessage::Terminate.encode(&mut self.write_buffer);
        self.stream.write_all(&self.write_buffer)?;
        self.stream.flush()?;
        Ok(())
    }

    fn read_message_inner(&mut self) -> Result<BackendMessage> {
        let type_byte = read_message_into(&mut self.stream, &mut self.read_buffer)?;
        BackendMessage::parse(type_byte, &self.read_buffer)
    }
}

impl<S: Read + Write> Channel for Conn<S> {
    fn write(&mut self, msg: FrontendMessage<'_>) -> Result<()> {
        if self.closed() {
            return Err(Error::Closed);
        }
        self.write_buffer.clear();
        msg.encode(&mut self.write_buffer);

        let result = self
            .stream
            .write_all(&self.write_buffer)
            .and_then(|()| self.stream.flush());
        if let Err(e) = result {
            self.is_broken = true;
            return Err(e.into());
        }
        Ok(())
    }

    fn read_message(&mut self) -> Result<BackendMessage> {
        if self.closed() {
            return Err(Error::Closed);
        }
        match self.read_message_inner() {
            Ok(msg) => {
                if let BackendMessage::ErrorResponse(error) = &msg {
                    if matches!(error.0.severity.as_deref(), Some("FATAL") | Some("PANIC")) {
                        tracing::warn!("server terminated the session: {}", error.0);
                        self.is_broken = true;
                    }
                }
                Ok(msg)
            }
            Err(e) => {
                // The stream position is unknown after a failed read
                self.is_broken = true;
                Err(e)
            }
        }
    }

    fn process_message(&mut self, msg: BackendMessage) -> Result<()> {
        match msg {
            BackendMessage::ParameterStatus(param) => {
                tracing::debug!("parameter status: {} = {}", param.name, param.value);
                match self.server_params.iter_mut().find(|(key, _)| *key == param.name) {
                    Some((_, value)) => *value = param.value,
                    None => self.server_params.push((param.name, param.value)),
                }
            }
            BackendMessage::NoticeResponse(notice) => {
                tracing::info!("server notice: {}", notice.0);
                if self.notices.len() >= MAX_NOTICES {
                    self.notices.remove(0);
                }
                self.notices.push(notice.0);
            }
            BackendMessage::NotificationResponse(notification) => {
                tracing::info!(
                    "notification from pid {} on {}: {}",
                    notification.pid,
                    notification.channel,
                    notification.payload
                );
            }
            BackendMessage::ReadyForQuery(ready) => {
                self.transaction_status = ready.transaction_status;
            }
            BackendMessage::ErrorResponse(error) => {
                return Err(Error::Protocol(format!(
                    "Unhandled ErrorResponse: {}",
                    error.0
                )));
            }
            other => {
                tracing::debug!("ignoring {} message", other);
            }
        }
        Ok(())
    }

    fn closed(&self) -> bool {
        self.closed || self.is_broken
    }

    fn transaction_status(&self) -> TransactionStatus {
        self.transaction_status
    }

    fn set_transaction_status(&mut self, status: TransactionStatus) {
        self.transaction_status = status;
    }

    fn cursor_opts(&self) -> Opts {
        self.opts.clone()
    }
}

impl<S: Read + Write> Drop for Conn<S> {
    fn drop(&mut self) {
        if self.closed || self.is_broken {
            return;
        }
        // Try to send Terminate message, ignore errors
        self.write_buffer.clear();
        FrontendMessage::Terminate.encode(&mut self.write_buffer);
        let _ = self.stream.write_all(&self.write_buffer);
        let _ = self.stream.flush();
    }
}

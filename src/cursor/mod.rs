//! Statement execution over a [`Channel`].
//!
//! A [`Cursor`] submits one statement batch at a time and reads the server's
//! replies through a single-message lookahead slot: the cursor never reads
//! further ahead than the next row, end-of-statement, or end-of-batch marker.

mod copy;
mod rows;

pub use copy::{CopySource, DEFAULT_COPY_BUFFER_SIZE};
pub use rows::Rows;

use std::io;

use crate::channel::Channel;
use crate::column::Column;
use crate::error::{Error, ErrorFields, Result};
use crate::opts::{CursorType, Opts};
use crate::params::{DefaultQuoter, LiteralQuoter, Params, bind_parameters};
use crate::protocol::backend::{BackendMessage, FieldDescription};
use crate::protocol::frontend::FrontendMessage;
use crate::row::{Row, format_row};
use crate::state::{
    Action, AfterBoundary, CopyStateMachine, Lookahead, ResultSetState, StatementStateMachine,
    classify_after_boundary,
};

use self::copy::CopyTransfer;

/// A statement cursor bound to one channel.
pub struct Cursor<'c, C: Channel> {
    conn: &'c mut C,
    opts: Opts,
    quoter: Box<dyn LiteralQuoter>,
    closed: bool,
    description: Option<Vec<Column>>,
    rowcount: i64,
    lookahead: Lookahead,
    sql: String,
}

impl<'c, C: Channel> Cursor<'c, C> {
    /// Create a cursor on `conn`.
    pub fn new(conn: &'c mut C, opts: Opts) -> Self {
        Self {
            conn,
            opts,
            quoter: Box::new(DefaultQuoter),
            closed: false,
            description: None,
            rowcount: -1,
            lookahead: Lookahead::Empty,
            sql: String::new(),
        }
    }

    /// Replace the literal quoter used by [`Cursor::execute_params`].
    pub fn with_quoter(mut self, quoter: impl LiteralQuoter + 'static) -> Self {
        self.quoter = Box::new(quoter);
        self
    }

    /// Columns of the current result set, or `None` if it has none.
    pub fn description(&self) -> Option<&[Column]> {
        self.description.as_deref()
    }

    /// Rows fetched so far, or -1 if no row has been fetched since the last `execute`.
    pub fn rowcount(&self) -> i64 {
        self.rowcount
    }

    /// Default number of rows returned by `fetchmany`.
    pub fn arraysize(&self) -> usize {
        self.opts.array_size
    }

    /// Set the default `fetchmany` size. Zero is ignored.
    pub fn set_arraysize(&mut self, size: usize) {
        if size > 0 {
            self.opts.array_size = size;
        }
    }

    /// Row shape produced by fetch operations.
    pub fn cursor_type(&self) -> CursorType {
        self.opts.cursor_type
    }

    /// Change the row shape for subsequent fetches.
    pub fn set_cursor_type(&mut self, cursor_type: CursorType) {
        self.opts.cursor_type = cursor_type;
    }

    /// Where the cursor stands relative to the current batch's result sets.
    pub fn result_set_state(&self) -> ResultSetState {
        ResultSetState::of(&self.lookahead)
    }

    /// Check if this cursor or its channel has been closed.
    pub fn closed(&self) -> bool {
        self.closed || self.conn.closed()
    }

    /// Close the cursor. Every later operation fails with [`Error::Closed`].
    pub fn close(&mut self) {
        self.closed = true;
    }

    fn check_open(&self) -> Result<()> {
        if self.closed() {
            return Err(Error::Closed);
        }
        Ok(())
    }

    /// Submit a statement batch.
    ///
    /// Returns once the first row, the end of the first statement, or the end
    /// of the batch has been reached.
    pub fn execute(&mut self, sql: &str) -> Result<()> {
        self.check_open()?;
        check_statement_text(sql)?;
        self.flush_to_query_ready()?;
        self.run_statement(sql.to_string())
    }

    /// Submit a statement batch after substituting `params` client-side.
    pub fn execute_params(&mut self, sql: &str, params: &Params) -> Result<()> {
        self.check_open()?;
        let sql = if params.is_empty() {
            sql.to_string()
        } else {
            bind_parameters(sql, params, self.quoter.as_ref())?
        };
        check_statement_text(&sql)?;
        self.flush_to_query_ready()?;
        self.run_statement(sql)
    }

    fn run_statement(&mut self, sql: String) -> Result<()> {
        self.rowcount = -1;
        self.description = None;
        tracing::debug!("execute: {}", sql);

        let result = self.drive_statement(&sql);
        self.sql = sql;
        result
    }

    fn drive_statement(&mut self, sql: &str) -> Result<()> {
        let mut state_machine = StatementStateMachine::new(sql);
        self.conn.write(state_machine.start())?;

        loop {
            let msg = self.conn.read_message()?;
            tracing::trace!("execute: received {}", msg);

            let action = match state_machine.step(msg) {
                Ok(action) => action,
                Err(e) => {
                    self.lookahead = Lookahead::Failed(None);
                    return Err(e);
                }
            };

            match action {
                Action::ReadMessage => {}
                Action::Delegate(msg) => self.conn.process_message(msg)?,
                Action::Write(msg) => self.conn.write(msg)?,
                Action::PushCopyData => {
                    return Err(Error::Protocol(
                        "statement execution cannot push COPY data".into(),
                    ));
                }
                Action::Yield(msg) => {
                    if let Some(fields) = state_machine.take_description() {
                        self.install_description(fields);
                    }
                    self.set_lookahead(Lookahead::from_message(msg));
                    return Ok(());
                }
            }
        }
    }

    fn install_description(&mut self, fields: Vec<FieldDescription>) {
        let policy = self.opts.unicode_error;
        self.description = Some(
            fields
                .into_iter()
                .map(|field| Column::new(field, policy))
                .collect(),
        );
    }

    fn set_lookahead(&mut self, slot: Lookahead) {
        if let Lookahead::ReadyForQuery(status) = slot {
            self.conn.set_transaction_status(status);
        }
        self.lookahead = slot;
    }

    /// Read the next message, handing asynchronous ones to the channel.
    fn read_next(&mut self) -> Result<BackendMessage> {
        loop {
            let msg = self.conn.read_message()?;
            if !msg.is_async() {
                tracing::trace!("cursor: received {}", msg);
                return Ok(msg);
            }
            self.conn.process_message(msg)?;
        }
    }

    /// Pull exactly one message into the lookahead slot.
    fn pull(&mut self) -> Result<()> {
        let msg = self.read_next()?;
        self.set_lookahead(Lookahead::from_message(msg));
        Ok(())
    }

    /// Fetch the next row of the current result set.
    ///
    /// Returns `None` at the end of the result set. An error reported by the
    /// server after some rows were sent is returned once, after which the
    /// result set is exhausted.
    pub fn fetchone(&mut self) -> Result<Option<Row>> {
        self.check_open()?;

        match std::mem::take(&mut self.lookahead) {
            Lookahead::Row(data) => {
                let row = match &self.description {
                    Some(columns) => format_row(self.opts.cursor_type, columns, &data),
                    None => Err(Error::Protocol(
                        "DataRow received without a RowDescription".into(),
                    )),
                };
                self.rowcount = if self.rowcount < 0 { 1 } else { self.rowcount + 1 };
                self.pull()?;
                row.map(Some)
            }
            Lookahead::Failed(Some(fields)) => {
                self.lookahead = Lookahead::Failed(None);
                Err(Error::query(fields, &self.sql))
            }
            Lookahead::Pending(msg) => {
                self.conn.process_message(msg)?;
                self.pull()?;
                Ok(None)
            }
            slot @ (Lookahead::Empty
            | Lookahead::CommandComplete(_)
            | Lookahead::ReadyForQuery(_)
            | Lookahead::Failed(None)) => {
                self.lookahead = slot;
                Ok(None)
            }
        }
    }

    /// Fetch up to `size` rows; `None` or zero uses [`Cursor::arraysize`].
    pub fn fetchmany(&mut self, size: Option<usize>) -> Result<Vec<Row>> {
        let size = match size {
            Some(n) if n > 0 => n,
            _ => self.opts.array_size,
        };
        let mut rows = Vec::new();
        while rows.len() < size {
            match self.fetchone()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    /// Fetch every remaining row of the current result set.
    pub fn fetchall(&mut self) -> Result<Vec<Row>> {
        self.iterate().collect()
    }

    /// Iterate lazily over the remaining rows of the current result set.
    pub fn iterate(&mut self) -> Rows<'_, 'c, C> {
        Rows::new(self)
    }

    /// Advance to the next result set of the batch.
    ///
    /// Unread rows of the current set are discarded. Returns `true` if another
    /// result set follows and `false` once the batch is complete.
    pub fn nextset(&mut self) -> Result<bool> {
        self.check_open()?;
        self.flush_to_command_complete()?;

        match ResultSetState::of(&self.lookahead) {
            ResultSetState::NoStatement | ResultSetState::BatchComplete => Ok(false),
            ResultSetState::AtSetBoundary => {
                let msg = self.read_next()?;
                match classify_after_boundary(msg)? {
                    AfterBoundary::NextSet(fields) => {
                        self.install_description(fields);
                        self.pull()?;
                        Ok(true)
                    }
                    AfterBoundary::BatchComplete(status) => {
                        self.set_lookahead(Lookahead::ReadyForQuery(status));
                        Ok(false)
                    }
                }
            }
            ResultSetState::WithinSet => Err(Error::Protocol(format!(
                "Unexpected nextset() state: {}",
                self.lookahead.describe()
            ))),
        }
    }

    /// Drain the current batch up to its ReadyForQuery.
    ///
    /// No-op if nothing has been submitted or the batch is already complete.
    pub fn flush_to_query_ready(&mut self) -> Result<()> {
        if self.lookahead.is_empty() || self.lookahead.is_ready_for_query() {
            return Ok(());
        }

        loop {
            if let BackendMessage::ReadyForQuery(ready) = self.read_next()? {
                self.set_lookahead(Lookahead::ReadyForQuery(ready.transaction_status));
                return Ok(());
            }
        }
    }

    /// Drain the current statement up to its CommandComplete.
    ///
    /// Unread rows are discarded. If the statement was aborted by the server
    /// and the error has not been reported yet, the batch is drained to
    /// ReadyForQuery and the error is returned.
    pub fn flush_to_command_complete(&mut self) -> Result<()> {
        if self.lookahead.is_empty()
            || self.lookahead.is_ready_for_query()
            || self.lookahead.is_command_complete()
        {
            return Ok(());
        }

        if let Lookahead::Failed(pending) = &mut self.lookahead {
            if let Some(fields) = pending.take() {
                return self.abort_statement(fields);
            }
        }

        loop {
            match self.read_next()? {
                BackendMessage::CommandComplete(complete) => {
                    self.lookahead = Lookahead::CommandComplete(complete);
                    return Ok(());
                }
                BackendMessage::ReadyForQuery(ready) => {
                    self.set_lookahead(Lookahead::ReadyForQuery(ready.transaction_status));
                    return Ok(());
                }
                BackendMessage::ErrorResponse(error) => return self.abort_statement(error.0),
                _ => {}
            }
        }
    }

    /// Report a server error for the current batch after draining it.
    fn abort_statement(&mut self, fields: ErrorFields) -> Result<()> {
        self.lookahead = Lookahead::Failed(None);
        self.flush_to_query_ready()?;
        Err(Error::query(fields, &self.sql))
    }

    /// Run a `COPY ... FROM STDIN` statement and push `source` to the server.
    ///
    /// Returns the number of rows loaded when the server reports one.
    pub fn copy<'a>(&mut self, sql: &str, source: impl Into<CopySource<'a>>) -> Result<Option<u64>> {
        self.check_open()?;
        check_statement_text(sql)?;
        let mut transfer = CopyTransfer::new(source.into())?;
        self.flush_to_query_ready()?;

        tracing::debug!("copy: {}", sql);
        let result = self.drive_copy(sql, &mut transfer);
        self.sql = sql.to_string();
        result
    }

    fn drive_copy(&mut self, sql: &str, transfer: &mut CopyTransfer<'_>) -> Result<Option<u64>> {
        let mut state_machine = CopyStateMachine::new(sql);
        self.conn.write(state_machine.start())?;
        let mut source_error = None;

        loop {
            let msg = self.conn.read_message()?;
            tracing::trace!("copy: received {}", msg);

            let action = match state_machine.step(msg) {
                Ok(action) => action,
                Err(e) => {
                    self.lookahead = Lookahead::Failed(None);
                    if let Some(io_error) = source_error {
                        // The server's reply to CopyFail is expected; report the source failure.
                        tracing::debug!("copy: server aborted after CopyFail: {}", e);
                        self.flush_to_query_ready()?;
                        return Err(Error::Io(io_error));
                    }
                    return Err(e);
                }
            };

            match action {
                Action::ReadMessage => {}
                Action::Delegate(msg) => self.conn.process_message(msg)?,
                Action::Write(msg) => self.conn.write(msg)?,
                Action::PushCopyData => {
                    tracing::debug!("copy: server ready for data");
                    source_error = push_copy_data(&mut *self.conn, transfer)?;
                }
                Action::Yield(msg) => {
                    self.set_lookahead(Lookahead::from_message(msg));
                    break;
                }
            }
        }

        if let Some(io_error) = source_error {
            return Err(Error::Io(io_error));
        }
        Ok(state_machine.rows_loaded())
    }

    /// Stored procedures are not supported by the protocol.
    pub fn callproc(&mut self, procname: &str, _params: &Params) -> Result<()> {
        Err(Error::Unsupported(format!(
            "callproc({}) is not supported",
            procname
        )))
    }

    /// Accepted for API compatibility; has no effect.
    pub fn setinputsizes(&mut self, _sizes: &[usize]) {}

    /// Accepted for API compatibility; has no effect.
    pub fn setoutputsize(&mut self, _size: usize, _column: Option<usize>) {}
}

/// Reject statement text the server would truncate at an embedded NUL.
fn check_statement_text(sql: &str) -> Result<()> {
    if memchr::memchr(0, sql.as_bytes()).is_some() {
        return Err(Error::InvalidUsage(
            "statement text contains a NUL character".into(),
        ));
    }
    Ok(())
}

/// Send every chunk of `transfer` followed by CopyDone.
///
/// A failing source aborts the data phase with CopyFail; its error is
/// returned so the caller can report it once the server has replied.
fn push_copy_data<C: Channel>(
    conn: &mut C,
    transfer: &mut CopyTransfer<'_>,
) -> Result<Option<io::Error>> {
    let mut chunks = 0_usize;
    loop {
        match transfer.next_chunk() {
            Ok(Some(chunk)) => {
                conn.write(FrontendMessage::CopyData(chunk))?;
                chunks += 1;
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("copy: source failed after {} chunks: {}", chunks, e);
                let reason = format!("COPY source read failed: {}", e);
                conn.write(FrontendMessage::CopyFail(&reason))?;
                return Ok(Some(e));
            }
        }
    }
    conn.write(FrontendMessage::CopyDone)?;
    tracing::debug!("copy: sent {} chunks", chunks);
    Ok(None)
}

impl<C: Channel> Drop for Cursor<'_, C> {
    fn drop(&mut self) {
        // Leave the channel at a batch boundary for the next cursor
        if self.closed() {
            return;
        }
        if let Err(e) = self.flush_to_query_ready() {
            tracing::warn!("cursor: failed to drain pending results: {}", e);
        }
    }
}

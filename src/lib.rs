//! Statement execution for Vertica-protocol analytic databases.
//!
//! # Features
//!
//! - **Sans-I/O state machines**: Protocol logic is separated from I/O
//! - **Lookahead cursor**: Rows are read one message at a time, never ahead of the caller
//! - **Multiple result sets**: Walk every statement of a batch with `nextset`
//! - **COPY FROM STDIN**: Push an in-memory payload or a chunked stream
//!
//! # Example
//!
//! ```no_run
//! use std::net::TcpStream;
//!
//! use zero_vertica::sync::{Conn, Stream};
//! use zero_vertica::{Channel, Opts};
//!
//! fn main() -> zero_vertica::Result<()> {
//!     // The session must already be authenticated.
//!     let tcp = TcpStream::connect("localhost:5433")?;
//!     let opts = Opts::try_from("vertica://localhost/db?cursor_type=dict")?;
//!     let mut conn = Conn::new_with_stream(Stream::tcp(tcp), opts);
//!
//!     let mut cursor = conn.cursor();
//!     cursor.execute("SELECT 1 AS num")?;
//!     for row in cursor.iterate() {
//!         println!("{:?}", row?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod column;
pub mod cursor;
pub mod error;
pub mod opts;
pub mod params;
pub mod protocol;
pub mod row;
pub mod state;
pub mod sync;
pub mod value;

pub use channel::Channel;
pub use column::Column;
pub use cursor::{CopySource, Cursor, DEFAULT_COPY_BUFFER_SIZE, Rows};
pub use error::{Error, ErrorFields, Result};
pub use opts::{CursorType, Opts, UnicodeError};
pub use params::{DefaultQuoter, LiteralQuoter, Param, Params};
pub use protocol::types::{FormatCode, Oid, TransactionStatus};
pub use row::Row;
pub use value::Value;

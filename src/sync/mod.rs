//! Synchronous Vertica client.

mod conn;
mod stream;

pub use conn::{Conn, MAX_NOTICES};
pub use stream::Stream;

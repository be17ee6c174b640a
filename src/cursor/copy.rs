//! COPY payload sources.

use std::io::{self, Read};

use crate::error::{Error, Result};

/// Default chunk size for streamed COPY sources.
pub const DEFAULT_COPY_BUFFER_SIZE: usize = 65536;

/// Data pushed to the server during a COPY FROM STDIN.
pub enum CopySource<'a> {
    /// A payload already in memory, sent as a single CopyData message
    Payload(&'a [u8]),
    /// A source read and sent in chunks of at most `buffer_size` bytes
    Stream {
        /// Byte source
        reader: &'a mut dyn Read,
        /// Maximum CopyData payload size
        buffer_size: usize,
    },
}

impl<'a> CopySource<'a> {
    /// Stream from `reader` with the default chunk size.
    pub fn stream(reader: &'a mut dyn Read) -> Self {
        CopySource::Stream {
            reader,
            buffer_size: DEFAULT_COPY_BUFFER_SIZE,
        }
    }

    /// Set the chunk size of a streamed source. Has no effect on a payload.
    pub fn with_buffer_size(self, size: usize) -> Self {
        match self {
            CopySource::Stream { reader, .. } => CopySource::Stream {
                reader,
                buffer_size: size,
            },
            payload @ CopySource::Payload(_) => payload,
        }
    }
}

impl<'a> From<&'a [u8]> for CopySource<'a> {
    fn from(data: &'a [u8]) -> Self {
        CopySource::Payload(data)
    }
}

impl<'a> From<&'a str> for CopySource<'a> {
    fn from(data: &'a str) -> Self {
        CopySource::Payload(data.as_bytes())
    }
}

impl std::fmt::Debug for CopySource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CopySource::Payload(data) => f.debug_tuple("Payload").field(&data.len()).finish(),
            CopySource::Stream { buffer_size, .. } => f
                .debug_struct("Stream")
                .field("buffer_size", buffer_size)
                .finish_non_exhaustive(),
        }
    }
}

/// An in-progress bulk load: yields the CopyData chunks for one source.
pub(crate) struct CopyTransfer<'a> {
    source: CopySource<'a>,
    buffer: Vec<u8>,
    finished: bool,
}

impl<'a> CopyTransfer<'a> {
    pub(crate) fn new(source: CopySource<'a>) -> Result<Self> {
        let buffer = match &source {
            CopySource::Payload(_) => Vec::new(),
            CopySource::Stream { buffer_size: 0, .. } => {
                return Err(Error::InvalidUsage(
                    "COPY buffer size must be greater than zero".into(),
                ));
            }
            CopySource::Stream { buffer_size, .. } => vec![0; *buffer_size],
        };
        Ok(Self {
            source,
            buffer,
            finished: false,
        })
    }

    /// Next chunk to send, or `None` once the source is exhausted.
    ///
    /// Every chunk but the last of a stream is exactly `buffer_size` bytes.
    pub(crate) fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        if self.finished {
            return Ok(None);
        }
        match &mut self.source {
            CopySource::Payload(data) => {
                self.finished = true;
                Ok(Some(*data))
            }
            CopySource::Stream { reader, .. } => {
                let filled = fill(&mut **reader, &mut self.buffer)?;
                if filled < self.buffer.len() {
                    self.finished = true;
                }
                if filled == 0 {
                    return Ok(None);
                }
                Ok(self.buffer.get(..filled))
            }
        }
    }
}

fn fill(reader: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while let Some(rest) = buf.get_mut(filled..) {
        if rest.is_empty() {
            break;
        }
        match reader.read(rest) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

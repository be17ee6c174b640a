//! COPY FROM STDIN over a framed byte stream.

mod common;

use std::io;

use common::*;
use zero_vertica::{Channel, CopySource, Error, Opts};

#[test]
fn test_copy_payload_frames() {
    let (mut conn, sent) = mock_conn(
        vec![
            copy_in_response(2),
            command_complete("COPY 2"),
            ready_for_query(b'I'),
        ],
        Opts::default(),
    );

    {
        let mut cursor = conn.cursor();
        let loaded = cursor
            .copy("COPY t FROM STDIN DELIMITER '|'", "1|a\n2|b\n")
            .unwrap();
        assert_eq!(loaded, Some(2));
    }

    let frames = sent_frames(&sent.borrow());
    let kinds: Vec<u8> = frames.iter().map(|(kind, _)| *kind).collect();
    assert_eq!(kinds, vec![b'Q', b'd', b'c']);
    assert_eq!(frames[1].1, b"1|a\n2|b\n");
}

#[test]
fn test_copy_stream_chunk_count() {
    let data: Vec<u8> = (0..100_u8).collect();

    for (buffer_size, expected_chunks) in [(1, 100), (7, 15), (50, 2), (100, 1), (4096, 1)] {
        let (mut conn, sent) = mock_conn(
            vec![
                copy_in_response(1),
                command_complete("COPY 100"),
                ready_for_query(b'I'),
            ],
            Opts::default(),
        );

        {
            let mut reader = &data[..];
            let mut cursor = conn.cursor();
            let source = CopySource::stream(&mut reader).with_buffer_size(buffer_size);
            cursor.copy("COPY t FROM STDIN", source).unwrap();
        }

        let frames = sent_frames(&sent.borrow());
        let chunks: Vec<&[u8]> = frames
            .iter()
            .filter(|(kind, _)| *kind == b'd')
            .map(|(_, payload)| payload.as_slice())
            .collect();
        assert_eq!(chunks.len(), expected_chunks, "buffer size {}", buffer_size);
        assert_eq!(chunks.concat(), data);
        assert_eq!(frames.last().map(|(kind, _)| *kind), Some(b'c'));
    }
}

#[test]
fn test_copy_rejected_by_server() {
    let (mut conn, sent) = mock_conn(
        vec![
            error_response("ERROR", "42V01", "Table \"missing\" does not exist"),
            ready_for_query(b'I'),
        ],
        Opts::default(),
    );

    {
        let mut cursor = conn.cursor();
        let err = cursor.copy("COPY missing FROM STDIN", "x\n").unwrap_err();
        assert_eq!(err.sql(), Some("COPY missing FROM STDIN"));
    }

    let frames = sent_frames(&sent.borrow());
    assert_eq!(frames.len(), 1);
    assert!(!conn.is_broken());
}

#[test]
fn test_copy_source_error_aborts_load() {
    struct FailAfter {
        remaining: usize,
    }

    impl io::Read for FailAfter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.remaining == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "producer went away"));
            }
            let n = self.remaining.min(buf.len());
            buf[..n].fill(b'z');
            self.remaining -= n;
            Ok(n)
        }
    }

    let (mut conn, sent) = mock_conn(
        vec![
            copy_in_response(1),
            error_response("ERROR", "08000", "COPY: aborted by client"),
            ready_for_query(b'I'),
        ],
        Opts::default(),
    );

    {
        let mut reader = FailAfter { remaining: 6 };
        let mut cursor = conn.cursor();
        let source = CopySource::stream(&mut reader).with_buffer_size(4);
        let err = cursor.copy("COPY t FROM STDIN", source).unwrap_err();
        match err {
            Error::Io(e) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("expected an I/O error, got {:?}", other),
        }
    }

    let frames = sent_frames(&sent.borrow());
    let kinds: Vec<u8> = frames.iter().map(|(kind, _)| *kind).collect();
    // One full chunk, then the partial read is lost to the failure
    assert_eq!(kinds, vec![b'Q', b'd', b'f']);
    assert!(!conn.is_broken());
}

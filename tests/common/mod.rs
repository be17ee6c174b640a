//! In-memory server stream for driving `sync::Conn` without a live server.
#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::rc::Rc;

use zero_vertica::Opts;
use zero_vertica::sync::Conn;

/// A stream that replays canned server bytes and records client bytes.
pub struct MockStream {
    input: io::Cursor<Vec<u8>>,
    output: Rc<RefCell<Vec<u8>>>,
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Connection over canned server messages, plus a handle on what the client sent.
pub fn mock_conn(server: Vec<Vec<u8>>, opts: Opts) -> (Conn<MockStream>, Rc<RefCell<Vec<u8>>>) {
    let output = Rc::new(RefCell::new(Vec::new()));
    let stream = MockStream {
        input: io::Cursor::new(server.concat()),
        output: Rc::clone(&output),
    };
    (Conn::new_with_stream(stream, opts), output)
}

/// Split client bytes into (type byte, payload) frames.
pub fn sent_frames(bytes: &[u8]) -> Vec<(u8, Vec<u8>)> {
    let mut frames = Vec::new();
    let mut rest = bytes;
    while !rest.is_empty() {
        let len = u32::from_be_bytes([rest[1], rest[2], rest[3], rest[4]]) as usize;
        frames.push((rest[0], rest[5..1 + len].to_vec()));
        rest = &rest[1 + len..];
    }
    frames
}

fn frame(type_byte: u8, payload: &[u8]) -> Vec<u8> {
    let mut buf = vec![type_byte];
    buf.extend_from_slice(&(payload.len() as u32 + 4).to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

fn cstr(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}

pub fn row_description(columns: &[(&str, u32)]) -> Vec<u8> {
    let mut payload = (columns.len() as u16).to_be_bytes().to_vec();
    for (name, type_oid) in columns {
        cstr(&mut payload, name);
        payload.extend_from_slice(&0_u32.to_be_bytes());
        payload.extend_from_slice(&0_i16.to_be_bytes());
        payload.extend_from_slice(&type_oid.to_be_bytes());
        payload.extend_from_slice(&(-1_i16).to_be_bytes());
        payload.extend_from_slice(&(-1_i32).to_be_bytes());
        payload.extend_from_slice(&0_u16.to_be_bytes());
    }
    frame(b'T', &payload)
}

pub fn data_row(values: &[Option<&str>]) -> Vec<u8> {
    let mut payload = (values.len() as u16).to_be_bytes().to_vec();
    for value in values {
        match value {
            Some(v) => {
                payload.extend_from_slice(&(v.len() as i32).to_be_bytes());
                payload.extend_from_slice(v.as_bytes());
            }
            None => payload.extend_from_slice(&(-1_i32).to_be_bytes()),
        }
    }
    frame(b'D', &payload)
}

pub fn command_complete(tag: &str) -> Vec<u8> {
    let mut payload = Vec::new();
    cstr(&mut payload, tag);
    frame(b'C', &payload)
}

pub fn ready_for_query(status: u8) -> Vec<u8> {
    frame(b'Z', &[status])
}

fn fields_message(type_byte: u8, severity: &str, code: &str, message: &str) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.push(b'S');
    cstr(&mut payload, severity);
    payload.push(b'C');
    cstr(&mut payload, code);
    payload.push(b'M');
    cstr(&mut payload, message);
    payload.push(0);
    frame(type_byte, &payload)
}

pub fn error_response(severity: &str, code: &str, message: &str) -> Vec<u8> {
    fields_message(b'E', severity, code, message)
}

pub fn notice_response(message: &str) -> Vec<u8> {
    fields_message(b'N', "NOTICE", "00000", message)
}

pub fn parameter_status(name: &str, value: &str) -> Vec<u8> {
    let mut payload = Vec::new();
    cstr(&mut payload, name);
    cstr(&mut payload, value);
    frame(b'S', &payload)
}

pub fn copy_in_response(columns: u16) -> Vec<u8> {
    let mut payload = vec![0];
    payload.extend_from_slice(&columns.to_be_bytes());
    for _ in 0..columns {
        payload.extend_from_slice(&0_u16.to_be_bytes());
    }
    frame(b'G', &payload)
}

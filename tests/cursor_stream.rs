//! Cursor behavior over a framed byte stream.

mod common;

use common::*;
use zero_vertica::protocol::types::oid;
use zero_vertica::{Channel, CursorType, Error, Opts, Row, TransactionStatus, Value};

#[test]
fn test_select_over_stream() {
    let (mut conn, sent) = mock_conn(
        vec![
            row_description(&[("a", oid::INTEGER), ("b", oid::VARCHAR)]),
            data_row(&[Some("1"), Some("x")]),
            data_row(&[Some("2"), None]),
            command_complete("SELECT 2"),
            ready_for_query(b'I'),
        ],
        Opts::default(),
    );

    {
        let mut cursor = conn.cursor();
        cursor.execute("SELECT a,b FROM t").unwrap();
        let rows: Vec<Vec<Value>> = cursor
            .fetchall()
            .unwrap()
            .into_iter()
            .map(Row::into_values)
            .collect();
        assert_eq!(
            rows,
            vec![
                vec![Value::Int(1), Value::Text("x".into())],
                vec![Value::Int(2), Value::Null],
            ]
        );
        assert_eq!(cursor.rowcount(), 2);
    }

    assert_eq!(conn.transaction_status(), TransactionStatus::Idle);
    let frames = sent_frames(&sent.borrow());
    assert_eq!(frames, vec![(b'Q', b"SELECT a,b FROM t\0".to_vec())]);
}

#[test]
fn test_result_sets_and_async_messages() {
    let (mut conn, _sent) = mock_conn(
        vec![
            parameter_status("timezone", "UTC"),
            row_description(&[("n", oid::INTEGER)]),
            data_row(&[Some("1")]),
            command_complete("SELECT 1"),
            notice_response("table u is empty"),
            row_description(&[("s", oid::VARCHAR)]),
            command_complete("SELECT 0"),
            ready_for_query(b'T'),
        ],
        Opts::default(),
    );

    {
        let mut cursor = conn.cursor();
        cursor.execute("SELECT n FROM t; SELECT s FROM u").unwrap();
        assert_eq!(cursor.fetchall().unwrap().len(), 1);

        assert!(cursor.nextset().unwrap());
        assert_eq!(cursor.description().unwrap()[0].name(), "s");
        assert!(cursor.fetchone().unwrap().is_none());

        assert!(!cursor.nextset().unwrap());
    }

    assert_eq!(conn.parameter("timezone"), Some("UTC"));
    let notices = conn.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message.as_deref(), Some("table u is empty"));
    assert!(conn.notices().is_empty());
    assert!(conn.in_transaction());
}

#[test]
fn test_nextset_surfaces_error_in_skipped_rows() {
    let (mut conn, sent) = mock_conn(
        vec![
            row_description(&[("q", oid::INTEGER)]),
            data_row(&[Some("1")]),
            data_row(&[Some("2")]),
            error_response("ERROR", "22012", "Division by zero"),
            ready_for_query(b'I'),
            command_complete("SELECT 0"),
            ready_for_query(b'I'),
        ],
        Opts::default(),
    );

    {
        let mut cursor = conn.cursor();
        cursor.execute("SELECT 1/a FROM t; SELECT 2").unwrap();

        let err = cursor.nextset().unwrap_err();
        assert_eq!(err.sqlstate(), Some("22012"));
        assert_eq!(err.sql(), Some("SELECT 1/a FROM t; SELECT 2"));
        assert!(!cursor.nextset().unwrap());

        cursor.execute("SELECT 3 WHERE false").unwrap();
    }

    assert!(!conn.is_broken());
    assert_eq!(sent_frames(&sent.borrow()).len(), 2);
}

#[test]
fn test_query_error_then_reuse() {
    let (mut conn, sent) = mock_conn(
        vec![
            error_response("ERROR", "42V01", "Relation \"nope\" does not exist"),
            ready_for_query(b'I'),
            command_complete("CREATE TABLE"),
            ready_for_query(b'I'),
        ],
        Opts::default(),
    );

    {
        let mut cursor = conn.cursor();
        let err = cursor.execute("SELECT * FROM nope").unwrap_err();
        assert_eq!(err.sqlstate(), Some("42V01"));
        assert_eq!(err.sql(), Some("SELECT * FROM nope"));
        assert_eq!(cursor.rowcount(), -1);

        cursor.execute("CREATE TABLE t (a INT)").unwrap();
        assert!(cursor.fetchone().unwrap().is_none());
        assert!(cursor.description().is_none());
    }

    assert!(!conn.is_broken());
    let frames = sent_frames(&sent.borrow());
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1], (b'Q', b"CREATE TABLE t (a INT)\0".to_vec()));
}

#[test]
fn test_dict_rows_from_url_options() {
    let opts = Opts::try_from("vertica://localhost/db?cursor_type=dict&arraysize=2").unwrap();
    let (mut conn, _sent) = mock_conn(
        vec![
            row_description(&[("id", oid::INTEGER), ("name", oid::VARCHAR)]),
            data_row(&[Some("1"), Some("ann")]),
            data_row(&[Some("2"), Some("bo")]),
            data_row(&[Some("3"), Some("cy")]),
            command_complete("SELECT 3"),
            ready_for_query(b'I'),
        ],
        opts,
    );

    let mut cursor = conn.cursor();
    assert_eq!(cursor.cursor_type(), CursorType::Dict);
    cursor.execute("SELECT id, name FROM people").unwrap();

    let batch = cursor.fetchmany(None).unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[1].get_by_name("name"), Some(&Value::Text("bo".into())));

    let rest = cursor.fetchmany(None).unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].get_by_name("id"), Some(&Value::Int(3)));
}

#[test]
fn test_truncated_stream_breaks_connection() {
    let (mut conn, _sent) = mock_conn(
        vec![row_description(&[("a", oid::INTEGER)])],
        Opts::default(),
    );

    {
        let mut cursor = conn.cursor();
        let err = cursor.execute("SELECT a FROM t").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(cursor.closed());
        assert!(matches!(cursor.execute("SELECT 1"), Err(Error::Closed)));
    }
    assert!(conn.is_broken());
}

#[test]
fn test_fatal_error_breaks_connection() {
    let (mut conn, _sent) = mock_conn(
        vec![error_response("FATAL", "57V03", "Node is shutting down")],
        Opts::default(),
    );

    {
        let mut cursor = conn.cursor();
        let err = cursor.execute("SELECT 1").unwrap_err();
        assert!(err.is_connection_broken());
    }
    assert!(conn.is_broken());
    assert!(conn.closed());
}

#[test]
fn test_close_sends_terminate() {
    let (conn, sent) = mock_conn(vec![], Opts::default());
    conn.close().unwrap();
    assert_eq!(sent_frames(&sent.borrow()), vec![(b'X', vec![])]);

    let (conn, sent) = mock_conn(vec![], Opts::default());
    drop(conn);
    assert_eq!(sent_frames(&sent.borrow()), vec![(b'X', vec![])]);
}

//! Column descriptors and per-column value conversion.

#[cfg(feature = "with-chrono")]
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{Error, Result};
use crate::opts::UnicodeError;
use crate::protocol::backend::FieldDescription;
use crate::protocol::types::{FormatCode, Oid, oid};
use crate::value::Value;

/// Description of one column of the current result set.
///
/// Built from a RowDescription field; converts raw text-format field values
/// into [`Value`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    type_oid: Oid,
    type_size: i16,
    type_modifier: i32,
    format: FormatCode,
    unicode_error: UnicodeError,
}

impl Column {
    /// Create a column from a field description.
    pub fn new(field: FieldDescription, unicode_error: UnicodeError) -> Self {
        Self {
            name: field.name,
            type_oid: field.type_oid,
            type_size: field.type_size,
            type_modifier: field.type_modifier,
            format: field.format,
            unicode_error,
        }
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wire type OID.
    pub fn type_oid(&self) -> Oid {
        self.type_oid
    }

    /// Internal size in bytes (negative for variable-length types).
    pub fn internal_size(&self) -> i16 {
        self.type_size
    }

    /// Precision of a NUMERIC column.
    pub fn precision(&self) -> Option<u32> {
        self.numeric_modifier().map(|m| (m >> 16) & 0xFFFF)
    }

    /// Scale of a NUMERIC column.
    pub fn scale(&self) -> Option<u32> {
        self.numeric_modifier().map(|m| m & 0xFFFF)
    }

    fn numeric_modifier(&self) -> Option<u32> {
        if self.type_oid != oid::NUMERIC || self.type_modifier < 4 {
            return None;
        }
        Some((self.type_modifier - 4) as u32)
    }

    /// Convert a raw field value. `None` is SQL NULL.
    pub fn convert(&self, raw: Option<&[u8]>) -> Result<Value> {
        let Some(bytes) = raw else {
            return Ok(Value::Null);
        };

        if self.format == FormatCode::Binary {
            return Ok(Value::Bytes(bytes.to_vec()));
        }

        match self.type_oid {
            oid::BOOL => parse_bool(bytes),
            oid::INTEGER => self.parse_with(bytes, "integer", |s| s.parse().map(Value::Int).ok()),
            oid::FLOAT => self.parse_with(bytes, "float", |s| s.parse().map(Value::Float).ok()),
            oid::NUMERIC => Ok(Value::Numeric(self.decode_text(bytes)?)),
            oid::VARBINARY | oid::BINARY | oid::LONG_VARBINARY => {
                unescape_binary(bytes).map(Value::Bytes)
            }
            #[cfg(feature = "with-chrono")]
            oid::DATE => self.parse_with(bytes, "date", |s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Value::Date).ok()
            }),
            #[cfg(feature = "with-chrono")]
            oid::TIME => self.parse_with(bytes, "time", |s| {
                NaiveTime::parse_from_str(s, "%H:%M:%S%.f").map(Value::Time).ok()
            }),
            #[cfg(feature = "with-chrono")]
            oid::TIMESTAMP => self.parse_with(bytes, "timestamp", |s| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                    .map(Value::Timestamp)
                    .ok()
            }),
            #[cfg(feature = "with-chrono")]
            oid::TIMESTAMPTZ => self.parse_with(bytes, "timestamptz", |s| {
                DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z")
                    .map(Value::TimestampTz)
                    .ok()
            }),
            _ => Ok(Value::Text(self.decode_text(bytes)?)),
        }
    }

    fn parse_with(
        &self,
        bytes: &[u8],
        type_name: &str,
        parse: impl FnOnce(&str) -> Option<Value>,
    ) -> Result<Value> {
        let s = simdutf8::compat::from_utf8(bytes)
            .map_err(|e| Error::Decode(format!("invalid UTF-8 in {} column: {}", type_name, e)))?;
        parse(s).ok_or_else(|| {
            Error::Decode(format!(
                "invalid {} value {:?} in column {}",
                type_name, s, self.name
            ))
        })
    }

    /// Decode text honoring the column's unicode error policy.
    fn decode_text(&self, bytes: &[u8]) -> Result<String> {
        match self.unicode_error {
            UnicodeError::Strict => simdutf8::compat::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| {
                    Error::Decode(format!("invalid UTF-8 in column {}: {}", self.name, e))
                }),
            UnicodeError::Replace => Ok(String::from_utf8_lossy(bytes).into_owned()),
            UnicodeError::Ignore => Ok(bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()),
        }
    }
}

fn parse_bool(bytes: &[u8]) -> Result<Value> {
    match bytes {
        b"t" | b"true" | b"TRUE" | b"T" | b"1" => Ok(Value::Bool(true)),
        b"f" | b"false" | b"FALSE" | b"F" | b"0" => Ok(Value::Bool(false)),
        _ => Err(Error::Decode(format!(
            "invalid boolean: {:?}",
            String::from_utf8_lossy(bytes)
        ))),
    }
}

/// Undo the text-format escaping of binary values: `\\` and `\ooo` octal.
fn unescape_binary(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut rest = bytes;

    while let Some((&b, tail)) = rest.split_first() {
        if b != b'\\' {
            out.push(b);
            rest = tail;
            continue;
        }
        match tail {
            [b'\\', after @ ..] => {
                out.push(b'\\');
                rest = after;
            }
            [d0 @ b'0'..=b'3', d1 @ b'0'..=b'7', d2 @ b'0'..=b'7', after @ ..] => {
                out.push(((d0 - b'0') << 6) | ((d1 - b'0') << 3) | (d2 - b'0'));
                rest = after;
            }
            _ => {
                return Err(Error::Decode(format!(
                    "invalid escape in binary value: {:?}",
                    String::from_utf8_lossy(bytes)
                )));
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(type_oid: Oid, unicode_error: UnicodeError) -> Column {
        Column::new(FieldDescription::new("c", type_oid), unicode_error)
    }

    #[test]
    fn test_null() {
        let col = column(oid::INTEGER, UnicodeError::Strict);
        assert_eq!(col.convert(None).unwrap(), Value::Null);
    }

    #[test]
    fn test_scalars() {
        let strict = UnicodeError::Strict;
        assert_eq!(column(oid::BOOL, strict).convert(Some(b"t")).unwrap(), Value::Bool(true));
        assert_eq!(column(oid::INTEGER, strict).convert(Some(b"-42")).unwrap(), Value::Int(-42));
        assert_eq!(column(oid::FLOAT, strict).convert(Some(b"2.5")).unwrap(), Value::Float(2.5));
        assert_eq!(
            column(oid::NUMERIC, strict).convert(Some(b"123.4500")).unwrap(),
            Value::Numeric("123.4500".into())
        );
        assert_eq!(
            column(oid::VARCHAR, strict).convert(Some(b"abc")).unwrap(),
            Value::Text("abc".into())
        );
    }

    #[test]
    fn test_invalid_integer() {
        let col = column(oid::INTEGER, UnicodeError::Strict);
        assert!(matches!(col.convert(Some(b"4x")), Err(Error::Decode(_))));
    }

    #[test]
    fn test_unicode_policies() {
        let raw: &[u8] = b"a\xffb";
        assert!(column(oid::VARCHAR, UnicodeError::Strict).convert(Some(raw)).is_err());
        assert_eq!(
            column(oid::VARCHAR, UnicodeError::Replace).convert(Some(raw)).unwrap(),
            Value::Text("a\u{fffd}b".into())
        );
        assert_eq!(
            column(oid::VARCHAR, UnicodeError::Ignore).convert(Some(raw)).unwrap(),
            Value::Text("ab".into())
        );
    }

    #[test]
    fn test_binary_unescape() {
        let col = column(oid::VARBINARY, UnicodeError::Strict);
        assert_eq!(
            col.convert(Some(br"a\\b\001\377")).unwrap(),
            Value::Bytes(vec![b'a', b'\\', b'b', 1, 255])
        );
        assert!(col.convert(Some(br"\9")).is_err());
    }

    #[test]
    fn test_numeric_precision_scale() {
        let mut field = FieldDescription::new("n", oid::NUMERIC);
        field.type_modifier = ((10 << 16) | 2) + 4;
        let col = Column::new(field, UnicodeError::Strict);
        assert_eq!(col.internal_size(), -1);
        assert_eq!(col.precision(), Some(10));
        assert_eq!(col.scale(), Some(2));
        assert_eq!(column(oid::INTEGER, UnicodeError::Strict).precision(), None);
    }

    #[cfg(feature = "with-chrono")]
    #[test]
    fn test_dates() {
        use chrono::{Datelike, Timelike};

        let strict = UnicodeError::Strict;
        let Value::Date(date) = column(oid::DATE, strict).convert(Some(b"2024-01-15")).unwrap()
        else {
            panic!("expected date");
        };
        assert_eq!((date.year(), date.month(), date.day()), (2024, 1, 15));

        let Value::Timestamp(ts) = column(oid::TIMESTAMP, strict)
            .convert(Some(b"2024-01-15 10:30:45.5"))
            .unwrap()
        else {
            panic!("expected timestamp");
        };
        assert_eq!(ts.hour(), 10);
        assert_eq!(ts.nanosecond(), 500_000_000);

        let Value::TimestampTz(tz) = column(oid::TIMESTAMPTZ, strict)
            .convert(Some(b"2024-01-15 10:30:45+05:30"))
            .unwrap()
        else {
            panic!("expected timestamptz");
        };
        assert_eq!(tz.offset().local_minus_utc(), 5 * 3600 + 30 * 60);
    }
}

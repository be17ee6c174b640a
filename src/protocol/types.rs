//! Common wire protocol types.

/// Type object identifier carried in RowDescription.
pub type Oid = u32;

/// Type OIDs reported by the server in RowDescription.
pub mod oid {
    use super::Oid;

    pub const BOOL: Oid = 5;
    pub const INTEGER: Oid = 6;
    pub const FLOAT: Oid = 7;
    pub const CHAR: Oid = 8;
    pub const VARCHAR: Oid = 9;
    pub const DATE: Oid = 10;
    pub const TIME: Oid = 11;
    pub const TIMESTAMP: Oid = 12;
    pub const TIMESTAMPTZ: Oid = 13;
    pub const INTERVAL: Oid = 14;
    pub const TIMETZ: Oid = 15;
    pub const NUMERIC: Oid = 16;
    pub const VARBINARY: Oid = 17;
    pub const UUID: Oid = 20;
    pub const LONG_VARCHAR: Oid = 115;
    pub const LONG_VARBINARY: Oid = 116;
    pub const BINARY: Oid = 117;
}

/// Data format code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u16)]
pub enum FormatCode {
    /// Text format (human-readable)
    #[default]
    Text = 0,
    /// Binary format (type-specific packed representation)
    Binary = 1,
}

impl FormatCode {
    /// Create a FormatCode from a raw u16 value.
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => FormatCode::Binary,
            _ => FormatCode::Text, // Default to text for unknown values
        }
    }
}

/// Transaction status indicator from ReadyForQuery message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TransactionStatus {
    /// Idle (not in transaction block)
    #[default]
    Idle = b'I',
    /// In transaction block
    InTransaction = b'T',
    /// In failed transaction block (queries will be rejected until rollback)
    Failed = b'E',
}

impl TransactionStatus {
    /// Create a TransactionStatus from a raw byte value.
    pub fn from_byte(value: u8) -> Option<Self> {
        match value {
            b'I' => Some(TransactionStatus::Idle),
            b'T' => Some(TransactionStatus::InTransaction),
            b'E' => Some(TransactionStatus::Failed),
            _ => None,
        }
    }

    /// Returns true if currently in a transaction (either active or failed).
    pub fn in_transaction(self) -> bool {
        matches!(self, TransactionStatus::InTransaction | TransactionStatus::Failed)
    }
}

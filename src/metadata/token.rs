//! Metadata tokens identifying the definitions of a [`crate::metadata::program::Program`].
//!
//! Every definition owned by the program arena (assemblies, types, methods, fields and
//! interface implementation records) is addressed by a [`Token`]. The encoding follows
//! ECMA-335: the high byte names the table, the low 24 bits the 1-based row. Annotations,
//! registries and instruction operands only ever hold tokens, never the definitions
//! themselves.

use std::fmt;
use std::hash::{Hash, Hasher};

use strum::{Display, EnumIter};

/// Metadata table a [`Token`] points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[repr(u8)]
pub enum TableId {
    /// `TypeDef` table
    TypeDef = 0x02,
    /// `Field` table
    Field = 0x04,
    /// `MethodDef` table
    MethodDef = 0x06,
    /// `InterfaceImpl` table
    InterfaceImpl = 0x09,
    /// `Assembly` table
    Assembly = 0x20,
}

impl TableId {
    /// Maps a raw table byte back to a [`TableId`].
    #[must_use]
    pub fn from_byte(value: u8) -> Option<Self> {
        match value {
            0x02 => Some(TableId::TypeDef),
            0x04 => Some(TableId::Field),
            0x06 => Some(TableId::MethodDef),
            0x09 => Some(TableId::InterfaceImpl),
            0x20 => Some(TableId::Assembly),
            _ => None,
        }
    }
}

/// A metadata token representing a reference to a metadata table entry.
///
/// Tokens in .NET metadata consist of a 32-bit value where:
/// - The high byte (bits 24-31) indicates the table type
/// - The low 24 bits (bits 0-23) indicate the row index within that table
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Token(pub u32);

impl Token {
    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Creates a token from a table and a 1-based row
    #[must_use]
    pub fn from_parts(table: TableId, row: u32) -> Self {
        Token(((table as u32) << 24) | (row & 0x00FF_FFFF))
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table type from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the table of the token, if it is one the program model knows about
    #[must_use]
    pub fn table_id(&self) -> Option<TableId> {
        TableId::from_byte(self.table())
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the token points into the given table
    #[must_use]
    pub fn is_table(&self, table: TableId) -> bool {
        self.table() == table as u8
    }

    /// Zero-based arena index of the row
    pub(crate) fn index(&self) -> usize {
        (self.row() as usize).saturating_sub(1)
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

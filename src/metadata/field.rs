//! Field definitions of the program model.

use crate::metadata::{signatures::TypeSig, token::Token};

#[allow(non_snake_case)]
/// All possible flags for `FieldAttributes`
pub mod FieldAttributes {
    /// These 3 bits contain one of the following values:
    pub const FIELD_ACCESS_MASK: u32 = 0x0007;
    /// Member not referenceable
    pub const COMPILER_CONTROLLED: u32 = 0x0000;
    /// Accessible only by the parent type
    pub const PRIVATE: u32 = 0x0001;
    /// Accessible by sub-types only in this Assembly
    pub const FAM_AND_ASSEM: u32 = 0x0002;
    /// Accessibly by anyone in the Assembly
    pub const ASSEMBLY: u32 = 0x0003;
    /// Accessible only by type and sub-types
    pub const FAMILY: u32 = 0x0004;
    /// Accessibly by sub-types anywhere, plus anyone in assembly
    pub const FAM_OR_ASSEM: u32 = 0x0005;
    /// Accessibly by anyone who has visibility to this scope field contract attributes
    pub const PUBLIC: u32 = 0x0006;
    /// Defined on type, else per instance
    pub const STATIC: u32 = 0x0010;
    /// Field can only be initialized, not written to after init
    pub const INIT_ONLY: u32 = 0x0020;
    /// Value is compile time constant
    pub const LITERAL: u32 = 0x0040;
}

/// A field definition
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// `Field` token, null until added to a program
    pub token: Token,
    /// Token of the declaring type, null until added to a program
    pub declaring_type: Token,
    /// Field name
    pub name: String,
    /// Raw `FieldAttributes`
    pub flags: u32,
    /// Field type
    pub field_type: TypeSig,
}

impl FieldDef {
    /// Creates a detached field
    pub fn new(name: &str, flags: u32, field_type: TypeSig) -> Self {
        FieldDef {
            token: Token::new(0),
            declaring_type: Token::new(0),
            name: name.to_string(),
            flags,
            field_type,
        }
    }

    /// Returns true for static fields
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags & FieldAttributes::STATIC != 0
    }
}

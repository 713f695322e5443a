//! CIL instruction representation for editable method bodies.
//!
//! Instructions are kept in decoded form: an [`OpCode`] plus a resolved [`Operand`].
//! Branch targets are instruction indices within the owning body rather than byte
//! offsets, so bodies can be rewritten without re-encoding. The linker only needs the
//! subset of ECMA-335 opcodes that appears in bridge registration code, synthesized
//! stubs and regenerated dispatchers, plus the common reference-carrying ones its
//! reachability walk must follow.

use std::fmt;

use strum::{Display, EnumIter, IntoStaticStr};

use crate::metadata::signatures::{FieldRef, MethodRef, TypeSig};

/// CIL opcodes understood by the linker.
///
/// The `Display` form is the ECMA-335 mnemonic.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum OpCode {
    #[strum(serialize = "nop")]
    Nop,
    #[strum(serialize = "ldarg.0")]
    Ldarg0,
    #[strum(serialize = "ldarg.1")]
    Ldarg1,
    #[strum(serialize = "ldarg.2")]
    Ldarg2,
    #[strum(serialize = "ldarg.3")]
    Ldarg3,
    #[strum(serialize = "ldloc.0")]
    Ldloc0,
    #[strum(serialize = "stloc.0")]
    Stloc0,
    #[strum(serialize = "ldloca.s")]
    LdlocaS,
    #[strum(serialize = "ldnull")]
    Ldnull,
    #[strum(serialize = "ldc.i4.m1")]
    LdcI4M1,
    #[strum(serialize = "ldc.i4.0")]
    LdcI40,
    #[strum(serialize = "ldc.i4.1")]
    LdcI41,
    #[strum(serialize = "ldc.i4.2")]
    LdcI42,
    #[strum(serialize = "ldc.i4.3")]
    LdcI43,
    #[strum(serialize = "ldc.i4.4")]
    LdcI44,
    #[strum(serialize = "ldc.i4.5")]
    LdcI45,
    #[strum(serialize = "ldc.i4.6")]
    LdcI46,
    #[strum(serialize = "ldc.i4.7")]
    LdcI47,
    #[strum(serialize = "ldc.i4.8")]
    LdcI48,
    #[strum(serialize = "ldc.i4.s")]
    LdcI4S,
    #[strum(serialize = "ldc.i4")]
    LdcI4,
    #[strum(serialize = "dup")]
    Dup,
    #[strum(serialize = "pop")]
    Pop,
    #[strum(serialize = "call")]
    Call,
    #[strum(serialize = "callvirt")]
    Callvirt,
    #[strum(serialize = "ret")]
    Ret,
    #[strum(serialize = "br")]
    Br,
    #[strum(serialize = "brfalse")]
    Brfalse,
    #[strum(serialize = "brtrue")]
    Brtrue,
    #[strum(serialize = "switch")]
    Switch,
    #[strum(serialize = "ldstr")]
    Ldstr,
    #[strum(serialize = "newobj")]
    Newobj,
    #[strum(serialize = "newarr")]
    Newarr,
    #[strum(serialize = "castclass")]
    Castclass,
    #[strum(serialize = "isinst")]
    Isinst,
    #[strum(serialize = "box")]
    Box,
    #[strum(serialize = "throw")]
    Throw,
    #[strum(serialize = "ldfld")]
    Ldfld,
    #[strum(serialize = "stfld")]
    Stfld,
    #[strum(serialize = "ldsfld")]
    Ldsfld,
    #[strum(serialize = "stsfld")]
    Stsfld,
    #[strum(serialize = "stelem.ref")]
    StelemRef,
    #[strum(serialize = "stelem")]
    StelemAny,
    #[strum(serialize = "ldtoken")]
    Ldtoken,
    #[strum(serialize = "ldftn")]
    Ldftn,
}

impl OpCode {
    /// Returns true for opcodes that transfer control to an operand target
    #[must_use]
    pub fn is_branch(&self) -> bool {
        matches!(
            self,
            OpCode::Br | OpCode::Brfalse | OpCode::Brtrue | OpCode::Switch
        )
    }
}

/// Instruction operand, already resolved to the model's reference types.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No operand present
    None,
    /// Signed 8-bit immediate (`ldc.i4.s`)
    Int8(i8),
    /// Signed 32-bit immediate (`ldc.i4`)
    Int32(i32),
    /// String literal (`ldstr`)
    String(String),
    /// Type reference (`newarr`, `ldtoken`, `castclass`, ...)
    Type(TypeSig),
    /// Method reference (`call`, `newobj`, `ldftn`, ...)
    Method(MethodRef),
    /// Field reference (`ldfld`, `stsfld`, ...)
    Field(FieldRef),
    /// Local variable index
    Local(u16),
    /// Branch target as instruction index
    Target(usize),
    /// Switch table of instruction indices
    Switch(Vec<usize>),
}

/// A single decoded CIL instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// The opcode
    pub opcode: OpCode,
    /// The operand data for this instruction
    pub operand: Operand,
}

impl Instruction {
    /// Creates an instruction with an operand
    pub fn new(opcode: OpCode, operand: Operand) -> Self {
        Instruction { opcode, operand }
    }

    /// Creates an instruction without an operand
    pub fn simple(opcode: OpCode) -> Self {
        Instruction {
            opcode,
            operand: Operand::None,
        }
    }

    /// Creates the shortest `ldc.i4` form loading `value`.
    ///
    /// Array sizes and array offsets in generated code use this encoding, so the
    /// registration-array parser accepts every form produced here.
    pub fn ldc_i4(value: i32) -> Self {
        match value {
            -1 => Instruction::simple(OpCode::LdcI4M1),
            0 => Instruction::simple(OpCode::LdcI40),
            1 => Instruction::simple(OpCode::LdcI41),
            2 => Instruction::simple(OpCode::LdcI42),
            3 => Instruction::simple(OpCode::LdcI43),
            4 => Instruction::simple(OpCode::LdcI44),
            5 => Instruction::simple(OpCode::LdcI45),
            6 => Instruction::simple(OpCode::LdcI46),
            7 => Instruction::simple(OpCode::LdcI47),
            8 => Instruction::simple(OpCode::LdcI48),
            // Guarded by the range check
            #[allow(clippy::cast_possible_truncation)]
            v if (-128..=127).contains(&v) => {
                Instruction::new(OpCode::LdcI4S, Operand::Int8(v as i8))
            }
            v => Instruction::new(OpCode::LdcI4, Operand::Int32(v)),
        }
    }

    /// The constant pushed by any `ldc.i4` form
    #[must_use]
    pub fn as_ldc_i4(&self) -> Option<i32> {
        match (self.opcode, &self.operand) {
            (OpCode::LdcI4M1, _) => Some(-1),
            (OpCode::LdcI40, _) => Some(0),
            (OpCode::LdcI41, _) => Some(1),
            (OpCode::LdcI42, _) => Some(2),
            (OpCode::LdcI43, _) => Some(3),
            (OpCode::LdcI44, _) => Some(4),
            (OpCode::LdcI45, _) => Some(5),
            (OpCode::LdcI46, _) => Some(6),
            (OpCode::LdcI47, _) => Some(7),
            (OpCode::LdcI48, _) => Some(8),
            (OpCode::LdcI4S, Operand::Int8(v)) => Some(i32::from(*v)),
            (OpCode::LdcI4, Operand::Int32(v)) => Some(*v),
            _ => None,
        }
    }

    /// Method operand, if any
    #[must_use]
    pub fn method_ref(&self) -> Option<&MethodRef> {
        match &self.operand {
            Operand::Method(method) => Some(method),
            _ => None,
        }
    }

    /// Field operand, if any
    #[must_use]
    pub fn field_ref(&self) -> Option<&FieldRef> {
        match &self.operand {
            Operand::Field(field) => Some(field),
            _ => None,
        }
    }

    /// Type operand, if any
    #[must_use]
    pub fn type_ref(&self) -> Option<&TypeSig> {
        match &self.operand {
            Operand::Type(sig) => Some(sig),
            _ => None,
        }
    }

    /// Branch targets of this instruction (empty for non-branches)
    #[must_use]
    pub fn targets(&self) -> Vec<usize> {
        match &self.operand {
            Operand::Target(target) => vec![*target],
            Operand::Switch(targets) => targets.clone(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        match &self.operand {
            Operand::None => Ok(()),
            Operand::Int8(v) => write!(f, " {v}"),
            Operand::Int32(v) => write!(f, " {v}"),
            Operand::String(s) => write!(f, " \"{s}\""),
            Operand::Type(sig) => write!(f, " {sig}"),
            Operand::Method(method) => write!(f, " {method}"),
            Operand::Field(field) => write!(f, " {field}"),
            Operand::Local(index) => write!(f, " V_{index}"),
            Operand::Target(target) => write!(f, " IL_{target:04}"),
            Operand::Switch(targets) => {
                let labels: Vec<String> = targets.iter().map(|t| format!("IL_{t:04}")).collect();
                write!(f, " ({})", labels.join(", "))
            }
        }
    }
}

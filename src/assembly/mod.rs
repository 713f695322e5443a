//! CIL instruction model.
//!
//! Method bodies in the program model are flat sequences of [`Instruction`]s. This module
//! provides the opcode set the linker generates and recognizes, together with the
//! resolved operand representation.
//!
//! # Key Types
//! - [`OpCode`] - Supported CIL opcodes, displayed as their mnemonic
//! - [`Operand`] - Resolved operand (immediates, strings, references, branch targets)
//! - [`Instruction`] - Opcode plus operand
//!
//! # Examples
//!
//! ```rust
//! use cilshrink::assembly::{Instruction, OpCode};
//!
//! let size = Instruction::ldc_i4(3);
//! assert_eq!(size.opcode, OpCode::LdcI43);
//! assert_eq!(size.as_ldc_i4(), Some(3));
//! ```

mod instruction;

pub use instruction::{Instruction, OpCode, Operand};

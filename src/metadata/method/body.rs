//! Editable CIL method bodies.
//!
//! A [`MethodBody`] is a flat instruction list plus the types of its local variables.
//! Branch operands address instructions by index, so removing a range of instructions
//! has to re-target every branch that points behind (or into) the removed range; see
//! [`MethodBody::remove_range`].
//!
//! # Examples
//!
//! ```rust
//! use cilshrink::assembly::{Instruction, OpCode, Operand};
//! use cilshrink::metadata::method::MethodBody;
//!
//! let mut body = MethodBody::from_instructions(vec![
//!     Instruction::new(OpCode::Br, Operand::Target(3)),
//!     Instruction::simple(OpCode::Nop),
//!     Instruction::simple(OpCode::Nop),
//!     Instruction::simple(OpCode::Ret),
//! ]);
//! body.remove_range(1, 2);
//! assert_eq!(body.instructions[0].operand, Operand::Target(1));
//! ```

use crate::{
    assembly::{Instruction, Operand},
    metadata::signatures::TypeSig,
};

/// The body of a non-abstract method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodBody {
    /// Instructions in execution layout order
    pub instructions: Vec<Instruction>,
    /// Types of the local variables, indexed by local slot
    pub variables: Vec<TypeSig>,
    /// Flag, indicating to zero-initialize all local variables
    pub init_locals: bool,
}

impl MethodBody {
    /// Creates an empty body
    pub fn new() -> Self {
        MethodBody::default()
    }

    /// Creates a body from an instruction list, without locals
    pub fn from_instructions(instructions: Vec<Instruction>) -> Self {
        MethodBody {
            instructions,
            variables: Vec::new(),
            init_locals: false,
        }
    }

    /// Number of instructions
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the body has no instructions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Appends an instruction and returns its index
    pub fn push(&mut self, instruction: Instruction) -> usize {
        self.instructions.push(instruction);
        self.instructions.len() - 1
    }

    /// Drops every instruction and local variable
    pub fn clear(&mut self) {
        self.instructions.clear();
        self.variables.clear();
    }

    /// Removes `count` instructions starting at `start`.
    ///
    /// Branch targets after the removed range move down by `count`; targets inside the
    /// range now point at the instruction that followed it.
    ///
    /// # Arguments
    /// * `start` - Index of the first instruction to remove
    /// * `count` - Number of instructions to remove, clamped to the body length
    pub fn remove_range(&mut self, start: usize, count: usize) {
        if start >= self.instructions.len() || count == 0 {
            return;
        }
        let end = (start + count).min(self.instructions.len());
        let removed = end - start;
        self.instructions.drain(start..end);

        let retarget = |target: usize| -> usize {
            if target >= end {
                target - removed
            } else if target >= start {
                start
            } else {
                target
            }
        };

        for instruction in &mut self.instructions {
            match &mut instruction.operand {
                Operand::Target(target) => *target = retarget(*target),
                Operand::Switch(targets) => {
                    for target in targets.iter_mut() {
                        *target = retarget(*target);
                    }
                }
                _ => {}
            }
        }
    }

    /// Every type signature the body refers to, through locals and operands
    ///
    /// Member operands contribute their declaring type only; their signature types are
    /// reached when the member itself is processed.
    #[must_use]
    pub fn referenced_types(&self) -> Vec<&TypeSig> {
        let mut types: Vec<&TypeSig> = self.variables.iter().collect();
        for instruction in &self.instructions {
            match &instruction.operand {
                Operand::Type(sig) => types.push(sig),
                Operand::Method(method) => types.push(&method.declaring_type),
                Operand::Field(field) => types.push(&field.declaring_type),
                _ => {}
            }
        }
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::OpCode;

    fn nops(count: usize) -> Vec<Instruction> {
        (0..count).map(|_| Instruction::simple(OpCode::Nop)).collect()
    }

    #[test]
    fn test_remove_range_retargets_branches() {
        let mut instructions = nops(8);
        instructions[0] = Instruction::new(OpCode::Switch, Operand::Switch(vec![1, 3, 6]));
        instructions[7] = Instruction::new(OpCode::Br, Operand::Target(6));
        let mut body = MethodBody::from_instructions(instructions);

        body.remove_range(2, 3);

        assert_eq!(body.len(), 5);
        assert_eq!(body.instructions[0].operand, Operand::Switch(vec![1, 2, 3]));
        assert_eq!(body.instructions[4].operand, Operand::Target(3));
    }

    #[test]
    fn test_remove_range_clamps() {
        let mut body = MethodBody::from_instructions(nops(3));
        body.remove_range(1, 10);
        assert_eq!(body.len(), 1);

        body.remove_range(5, 1);
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn test_referenced_types() {
        let string = TypeSig::named("mscorlib", "System", "String");
        let mut body = MethodBody::from_instructions(vec![Instruction::new(
            OpCode::Newarr,
            Operand::Type(string.clone()),
        )]);
        body.variables
            .push(TypeSig::named("mscorlib", "System", "Int32"));

        let types = body.referenced_types();
        assert_eq!(types.len(), 2);
        assert!(types.contains(&&string));
    }
}

pub mod fixtures;

pub use fixtures::LinkFixture;

use crate::{
    assembly::{Instruction, OpCode, Operand},
    metadata::{
        method::MethodBody,
        signatures::{MethodRef, TypeSig},
    },
};

const INTEROP: &str = "Java.Interop";

// Helper function to create a `System.Void` signature
pub fn void() -> TypeSig {
    TypeSig::named("mscorlib", "System", "Void")
}

// Helper function to create a `System.String` signature
pub fn string() -> TypeSig {
    TypeSig::named("mscorlib", "System", "String")
}

// Helper function to create a body that returns after `instructions`
pub fn body_of(mut instructions: Vec<Instruction>) -> MethodBody {
    if instructions.last().map(|i| i.opcode) != Some(OpCode::Ret) {
        instructions.push(Instruction::simple(OpCode::Ret));
    }
    MethodBody::from_instructions(instructions)
}

fn native_registration() -> TypeSig {
    TypeSig::named(INTEROP, "Java.Interop", "JniNativeMethodRegistration")
}

// Helper function to create one registration array slot storing `thunk` at `offset`
pub fn registration_slot(thunk: &str, offset: i32) -> Vec<Instruction> {
    let delegate = TypeSig::named("mscorlib", "System", "Delegate");
    let delegate_ctor = MethodRef::new(TypeSig::named("App", "App", "_JniMarshal_PP_V"), ".ctor", void())
        .with_param(TypeSig::named("mscorlib", "System", "Object"))
        .with_param(TypeSig::named("mscorlib", "System", "IntPtr"));
    let registration_ctor = MethodRef::new(native_registration(), ".ctor", void())
        .with_param(string())
        .with_param(string())
        .with_param(delegate);
    let thunk_ref = MethodRef::new(
        TypeSig::named("App", "App", "__<$>_jni_marshal_methods"),
        thunk,
        void(),
    )
    .static_method();

    vec![
        Instruction::simple(OpCode::Dup),
        Instruction::ldc_i4(offset),
        Instruction::new(OpCode::Ldstr, Operand::String(thunk.trim_start_matches("n_").to_string())),
        Instruction::new(OpCode::Ldstr, Operand::String("()V".to_string())),
        Instruction::simple(OpCode::Ldnull),
        Instruction::new(OpCode::Ldftn, Operand::Method(thunk_ref)),
        Instruction::new(OpCode::Newobj, Operand::Method(delegate_ctor)),
        Instruction::new(OpCode::Newobj, Operand::Method(registration_ctor)),
        Instruction::new(OpCode::StelemAny, Operand::Type(native_registration())),
    ]
}

// Helper function to create a registration method body with one slot per thunk
pub fn registration_body(thunks: &[&str]) -> MethodBody {
    let size = i32::try_from(thunks.len()).unwrap();
    let mut instructions = vec![
        Instruction::ldc_i4(size),
        Instruction::new(OpCode::Newarr, Operand::Type(native_registration())),
    ];
    for (offset, thunk) in thunks.iter().enumerate() {
        instructions.extend(registration_slot(thunk, i32::try_from(offset).unwrap()));
    }
    instructions.push(Instruction::simple(OpCode::Ret));
    MethodBody::from_instructions(instructions)
}

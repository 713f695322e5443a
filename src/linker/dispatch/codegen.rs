//! Generation of the registration lookup table and dispatcher.
//!
//! Two methods of the magic registration map are rebuilt from scratch:
//!
//! - `Prefill` fills `typesMap` with one `type name -> index` entry per marshal type
//! - `CallRegisterMethodByIndex(args, index)` switches on the index, loads the marshal
//!   type's token, looks up its registration method by name, binds it to an
//!   `Action<JniNativeMethodRegistrationArguments>` and invokes it with `args`. It
//!   returns `true` when a case matched.

use crate::{
    assembly::{Instruction, OpCode, Operand},
    linker::config::LinkerConfig,
    metadata::{
        method::MethodBody,
        program::Program,
        signatures::{FieldRef, MethodRef, TypeSig},
        token::Token,
    },
    Error, Result,
};

/// Runtime references used by the generated code
#[derive(Debug, Clone)]
pub struct RuntimeRefs {
    /// `Dictionary<String,Int32>::.ctor(Int32)`
    pub dictionary_ctor: MethodRef,
    /// `Dictionary<String,Int32>::set_Item(!0,!1)`
    pub dictionary_set_item: MethodRef,
    /// `Nullable<Int32>`
    pub nullable_int: TypeSig,
    /// `Nullable<Int32>::GetValueOrDefault()`
    pub get_value_or_default: MethodRef,
    /// `Type::GetTypeFromHandle(RuntimeTypeHandle)`
    pub get_type_from_handle: MethodRef,
    /// `Type::GetMethod(String)`
    pub get_method: MethodRef,
    /// `MethodInfo::CreateDelegate(Type)`
    pub create_delegate: MethodRef,
    /// `Action<JniNativeMethodRegistrationArguments>`
    pub action: TypeSig,
    /// `Action<JniNativeMethodRegistrationArguments>::Invoke(!0)`
    pub action_invoke: MethodRef,
    /// Definitions that must stay alive for the generated code
    pub dependencies: Vec<Token>,
}

fn missing(member: &str, assembly: &str) -> Error {
    Error::MissingDependency {
        member: member.to_string(),
        assembly: assembly.to_string(),
    }
}

fn find_type(program: &Program, assembly: &str, fullname: &str) -> Result<Token> {
    program
        .find_type(assembly, fullname)
        .ok_or_else(|| missing(fullname, assembly))
}

/// First method of `type_token` named `name` whose parameter types render as `params`
fn find_method(program: &Program, type_token: Token, name: &str, params: &[&str]) -> Result<Token> {
    for method_token in program.methods_named(type_token, name)? {
        let method = program.method(method_token)?;
        if method.params.len() == params.len()
            && method
                .param_types()
                .zip(params)
                .all(|(actual, expected)| actual.fullname() == *expected)
        {
            return Ok(method_token);
        }
    }

    let declaring = program.type_def(type_token)?;
    Err(missing(
        &format!("{}::{}({})", declaring.fullname(), name, params.join(",")),
        program.assembly_name_of(type_token)?,
    ))
}

/// Locates everything the generated code refers to.
///
/// # Errors
///
/// Returns [`Error::MissingDependency`] naming the first member that is not found.
pub fn runtime_refs(program: &Program, config: &LinkerConfig) -> Result<RuntimeRefs> {
    let corlib = config.corlib.as_str();
    let string = TypeSig::named(corlib, "System", "String");
    let int32 = TypeSig::named(corlib, "System", "Int32");
    find_type(program, corlib, "System.String")?;
    find_type(program, corlib, "System.Int32")?;

    let dictionary = find_type(program, corlib, "System.Collections.Generic.Dictionary`2")?;
    let dictionary_of = program
        .type_sig(dictionary)?
        .instantiate(vec![string.clone(), int32.clone()]);
    let dictionary_ctor = program
        .method_ref(find_method(program, dictionary, ".ctor", &["System.Int32"])?)?
        .on_type(dictionary_of.clone());
    let dictionary_set_item = program
        .method_ref(find_method(program, dictionary, "set_Item", &["!0", "!1"])?)?
        .on_type(dictionary_of);

    let nullable = find_type(program, corlib, "System.Nullable`1")?;
    let nullable_int = program.type_sig(nullable)?.instantiate(vec![int32]);
    let get_value_or_default = program
        .method_ref(find_method(program, nullable, "GetValueOrDefault", &[])?)?
        .on_type(nullable_int.clone());

    let system_type = find_type(program, corlib, "System.Type")?;
    let get_type_from_handle = program.method_ref(find_method(
        program,
        system_type,
        "GetTypeFromHandle",
        &["System.RuntimeTypeHandle"],
    )?)?;
    let get_method = program.method_ref(find_method(program, system_type, "GetMethod", &["System.String"])?)?;

    let method_info = find_type(program, corlib, "System.Reflection.MethodInfo")?;
    let create_delegate =
        program.method_ref(find_method(program, method_info, "CreateDelegate", &["System.Type"])?)?;

    let action_type = find_type(program, corlib, "System.Action`1")?;
    let args_type = find_type(
        program,
        &config.interop_assembly,
        "Java.Interop.JniNativeMethodRegistrationArguments",
    )?;
    let action = program
        .type_sig(action_type)?
        .instantiate(vec![program.type_sig(args_type)?]);
    let action_invoke = program
        .method_ref(find_method(program, action_type, "Invoke", &["!0"])?)?
        .on_type(action.clone());

    Ok(RuntimeRefs {
        dictionary_ctor,
        dictionary_set_item,
        nullable_int,
        get_value_or_default,
        get_type_from_handle,
        get_method,
        create_delegate,
        action,
        action_invoke,
        dependencies: vec![action_type, args_type],
    })
}

/// Key under which a marshal type is looked up at runtime.
///
/// The marshal-methods suffix is dropped and nested type separators use `+`, matching
/// reflection names of the declaring type.
#[must_use]
pub fn lookup_key(marshal_type_fullname: &str, marshal_methods_type: &str) -> String {
    marshal_type_fullname
        .replace(&format!("/{marshal_methods_type}"), "")
        .replace('/', "+")
}

/// Body of `Prefill`: `typesMap = new Dictionary<string,int>(n)` and one `set_Item`
/// per key, indices following `keys` order
#[must_use]
pub fn prefill_body(refs: &RuntimeRefs, types_map: &FieldRef, keys: &[String]) -> Vec<Instruction> {
    let mut instructions = Vec::with_capacity(4 + keys.len() * 4);
    instructions.push(Instruction::ldc_i4(i32::try_from(keys.len()).unwrap_or(i32::MAX)));
    instructions.push(Instruction::new(
        OpCode::Newobj,
        Operand::Method(refs.dictionary_ctor.clone()),
    ));
    instructions.push(Instruction::new(OpCode::Stsfld, Operand::Field(types_map.clone())));

    for (index, key) in keys.iter().enumerate() {
        instructions.push(Instruction::new(OpCode::Ldsfld, Operand::Field(types_map.clone())));
        instructions.push(Instruction::new(OpCode::Ldstr, Operand::String(key.clone())));
        instructions.push(Instruction::ldc_i4(i32::try_from(index).unwrap_or(i32::MAX)));
        instructions.push(Instruction::new(
            OpCode::Callvirt,
            Operand::Method(refs.dictionary_set_item.clone()),
        ));
    }

    instructions.push(Instruction::simple(OpCode::Ret));
    instructions
}

/// Body of `CallRegisterMethodByIndex`, one switch case per entry of `marshal_types`
#[must_use]
pub fn dispatcher_body(refs: &RuntimeRefs, marshal_types: &[TypeSig], registration_method: &str) -> MethodBody {
    let cases = marshal_types.len();
    let first_case = 5;
    let default_case = first_case + 2 * cases;
    let tail = default_case + 2;

    let mut body = MethodBody::new();
    body.variables.push(refs.nullable_int.clone());
    body.init_locals = true;

    body.push(Instruction::simple(OpCode::Ldarg1));
    body.push(Instruction::simple(OpCode::Stloc0));
    body.push(Instruction::new(OpCode::LdlocaS, Operand::Local(0)));
    body.push(Instruction::new(
        OpCode::Call,
        Operand::Method(refs.get_value_or_default.clone()),
    ));
    body.push(Instruction::new(
        OpCode::Switch,
        Operand::Switch((0..cases).map(|case| first_case + 2 * case).collect()),
    ));

    for marshal_type in marshal_types {
        body.push(Instruction::new(OpCode::Ldtoken, Operand::Type(marshal_type.clone())));
        body.push(Instruction::new(OpCode::Br, Operand::Target(tail)));
    }

    body.push(Instruction::ldc_i4(0));
    body.push(Instruction::simple(OpCode::Ret));

    body.push(Instruction::new(
        OpCode::Call,
        Operand::Method(refs.get_type_from_handle.clone()),
    ));
    body.push(Instruction::new(
        OpCode::Ldstr,
        Operand::String(registration_method.to_string()),
    ));
    body.push(Instruction::new(OpCode::Call, Operand::Method(refs.get_method.clone())));
    body.push(Instruction::new(OpCode::Ldtoken, Operand::Type(refs.action.clone())));
    body.push(Instruction::new(
        OpCode::Call,
        Operand::Method(refs.get_type_from_handle.clone()),
    ));
    body.push(Instruction::new(
        OpCode::Callvirt,
        Operand::Method(refs.create_delegate.clone()),
    ));
    body.push(Instruction::new(OpCode::Castclass, Operand::Type(refs.action.clone())));
    body.push(Instruction::simple(OpCode::Ldarg0));
    body.push(Instruction::new(
        OpCode::Callvirt,
        Operand::Method(refs.action_invoke.clone()),
    ));
    body.push(Instruction::ldc_i4(1));
    body.push(Instruction::simple(OpCode::Ret));
    body
}

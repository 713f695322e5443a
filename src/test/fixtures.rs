//! Programs shaped like a small Android application on top of its runtime assemblies.

use crate::{
    assembly::{Instruction, OpCode, Operand},
    linker::{config::LinkerConfig, context::LinkContext},
    metadata::{
        customattributes::CustomAttribute,
        field::{FieldAttributes, FieldDef},
        method::{
            MethodAccessFlags, MethodBody, MethodDef, MethodModifiers, MethodVtableFlags,
            CONSTRUCTOR_FLAGS, INTERFACE_METHOD_FLAGS,
        },
        program::Program,
        signatures::{MethodRef, TypeSig},
        token::Token,
        typesystem::{TypeAttributes, TypeBuilder},
    },
    test::{body_of, registration_body, string, void},
};

const CORLIB: &str = "mscorlib";
const INTEROP: &str = "Java.Interop";
const ANDROID: &str = "Mono.Android";
const MARSHAL_METHODS: &str = "__<$>_jni_marshal_methods";

const PUBLIC: u32 = MethodAccessFlags::PUBLIC.bits() | MethodModifiers::HIDE_BY_SIG.bits();
const PUBLIC_STATIC: u32 = PUBLIC | MethodModifiers::STATIC.bits();
const PRIVATE_STATIC: u32 = MethodAccessFlags::PRIVATE.bits()
    | MethodModifiers::HIDE_BY_SIG.bits()
    | MethodModifiers::STATIC.bits();
const NEW_VIRTUAL: u32 =
    PUBLIC | MethodModifiers::VIRTUAL.bits() | MethodVtableFlags::NEW_SLOT.bits();
const OVERRIDE: u32 = PUBLIC | MethodModifiers::VIRTUAL.bits();
const SEALED_IMPL: u32 = NEW_VIRTUAL | MethodModifiers::FINAL.bits();

fn corlib(namespace: &str, name: &str) -> TypeSig {
    TypeSig::named(CORLIB, namespace, name)
}

fn android(namespace: &str, name: &str) -> TypeSig {
    TypeSig::named(ANDROID, namespace, name)
}

fn int32() -> TypeSig {
    corlib("System", "Int32")
}

fn int_ptr() -> TypeSig {
    corlib("System", "IntPtr")
}

fn ctor() -> MethodDef {
    MethodDef::new(".ctor", CONSTRUCTOR_FLAGS, void()).with_body(MethodBody::new())
}

// Helper function to create a bridge registration attribute
pub fn register(name: &str, signature: &str, connector: &str) -> CustomAttribute {
    CustomAttribute::new(android("Android.Runtime", "RegisterAttribute"))
        .with_string(name)
        .with_string(signature)
        .with_string(connector)
}

fn nullable_int() -> TypeSig {
    corlib("System", "Nullable`1").instantiate(vec![int32()])
}

fn registration_args() -> TypeSig {
    TypeSig::named(INTEROP, "Java.Interop", "JniNativeMethodRegistrationArguments")
}

// Helper function to create the registration method of a marshal-methods type
fn register_native_members(thunks: &[&str]) -> MethodDef {
    MethodDef::new("__RegisterNativeMembers", PUBLIC_STATIC, void())
        .with_param("args", registration_args())
        .with_body(registration_body(thunks))
}

// Helper function to create a static marshal thunk taking the JNI environment and receiver
fn thunk(name: &str, extra_params: usize) -> MethodDef {
    let mut method = MethodDef::new(name, PRIVATE_STATIC, void())
        .with_param("jnienv", int_ptr())
        .with_param("native__this", int_ptr());
    for index in 0..extra_params {
        method = method.with_param(&format!("native_p{index}"), int_ptr());
    }
    method.with_body(body_of(Vec::new()))
}

fn add_corlib(program: &mut Program) {
    let asm = program.add_assembly(CORLIB);
    for name in ["Void", "Int32", "Boolean", "IntPtr", "String", "RuntimeTypeHandle"] {
        TypeBuilder::class("System", name).build(program, asm).unwrap();
    }
    TypeBuilder::class("System", "Object")
        .method(ctor())
        .build(program, asm)
        .unwrap();
    TypeBuilder::class("System", "Delegate")
        .abstract_type()
        .build(program, asm)
        .unwrap();
    TypeBuilder::class("System", "Type")
        .abstract_type()
        .method(
            MethodDef::new("GetTypeFromHandle", PUBLIC_STATIC, corlib("System", "Type"))
                .with_param("handle", corlib("System", "RuntimeTypeHandle"))
                .with_body(MethodBody::new()),
        )
        .method(
            MethodDef::new("GetMethod", PUBLIC, corlib("System.Reflection", "MethodInfo"))
                .with_param("name", string())
                .with_body(MethodBody::new()),
        )
        .build(program, asm)
        .unwrap();
    TypeBuilder::class("System.Reflection", "MethodInfo")
        .abstract_type()
        .method(
            MethodDef::new("CreateDelegate", NEW_VIRTUAL, corlib("System", "Delegate"))
                .with_param("delegateType", corlib("System", "Type"))
                .with_body(MethodBody::new()),
        )
        .build(program, asm)
        .unwrap();
    TypeBuilder::class("System", "Nullable`1")
        .generic_param("T")
        .method(
            MethodDef::new("GetValueOrDefault", PUBLIC, TypeSig::type_param(0, "T"))
                .with_body(MethodBody::new()),
        )
        .build(program, asm)
        .unwrap();
    TypeBuilder::class("System", "Action`1")
        .generic_param("T")
        .extends(corlib("System", "Delegate"))
        .method(
            MethodDef::new("Invoke", NEW_VIRTUAL, void())
                .with_param("obj", TypeSig::type_param(0, "T"))
                .with_body(MethodBody::new()),
        )
        .build(program, asm)
        .unwrap();
    TypeBuilder::class("System.Collections.Generic", "Dictionary`2")
        .generic_param("TKey")
        .generic_param("TValue")
        .method(ctor().with_param("capacity", int32()))
        .method(
            MethodDef::new("set_Item", PUBLIC, void())
                .with_param("key", TypeSig::type_param(0, "TKey"))
                .with_param("value", TypeSig::type_param(1, "TValue"))
                .with_body(MethodBody::new()),
        )
        .build(program, asm)
        .unwrap();
    TypeBuilder::class("System", "AppDomain")
        .method(
            MethodDef::new("CreateDomain", PUBLIC_STATIC, corlib("System", "AppDomain"))
                .with_param("friendlyName", string())
                .with_body(MethodBody::new()),
        )
        .build(program, asm)
        .unwrap();
    TypeBuilder::interface("System.Runtime.InteropServices", "ICustomMarshaler")
        .build(program, asm)
        .unwrap();
}

fn add_system(program: &mut Program) {
    let asm = program.add_assembly("System");
    TypeBuilder::class("System.Net.Sockets", "LingerOption")
        .field(FieldDef::new(
            "enabled",
            FieldAttributes::PRIVATE,
            corlib("System", "Boolean"),
        ))
        .field(FieldDef::new(
            "Default",
            FieldAttributes::PUBLIC | FieldAttributes::STATIC,
            TypeSig::named("System", "System.Net.Sockets", "LingerOption"),
        ))
        .build(program, asm)
        .unwrap();
}

fn add_interop(program: &mut Program) {
    let asm = program.add_assembly(INTEROP);
    TypeBuilder::interface("Java.Interop", "IJavaPeerable")
        .build(program, asm)
        .unwrap();
    TypeBuilder::class("Java.Interop", "JniNativeMethodRegistration")
        .build(program, asm)
        .unwrap();
    TypeBuilder::class("Java.Interop", "JniNativeMethodRegistrationArguments")
        .build(program, asm)
        .unwrap();
}

fn add_android(program: &mut Program) {
    let asm = program.add_assembly(ANDROID);
    TypeBuilder::interface("Android.Runtime", "IJavaObject")
        .build(program, asm)
        .unwrap();
    TypeBuilder::class("Android.Runtime", "RegisterAttribute")
        .build(program, asm)
        .unwrap();
    TypeBuilder::class("Java.Lang", "Object")
        .extends(corlib("System", "Object"))
        .implements(android("Android.Runtime", "IJavaObject"))
        .implements(TypeSig::named(INTEROP, "Java.Interop", "IJavaPeerable"))
        .method(ctor())
        .build(program, asm)
        .unwrap();
    TypeBuilder::class("Java.Lang", "AbstractMethodError")
        .extends(android("Java.Lang", "Object"))
        .method(ctor().with_param("message", string()))
        .method(ctor())
        .build(program, asm)
        .unwrap();
    TypeBuilder::class("Android.Views", "View")
        .extends(android("Java.Lang", "Object"))
        .build(program, asm)
        .unwrap();

    let type_manager = TypeBuilder::class("Java.Interop", "TypeManager")
        .build(program, asm)
        .unwrap();
    let java_type_manager = TypeBuilder::nested("JavaTypeManager")
        .build_nested(program, type_manager)
        .unwrap();
    TypeBuilder::nested(MARSHAL_METHODS)
        .flags(TypeAttributes::NESTED_PRIVATE | TypeAttributes::ABSTRACT | TypeAttributes::SEALED)
        .method(thunk("n_activate_mm", 3))
        .method(register_native_members(&["n_activate_mm"]))
        .build_nested(program, java_type_manager)
        .unwrap();

    let android_type_manager = TypeBuilder::class("Android.Runtime", "AndroidTypeManager")
        .build(program, asm)
        .unwrap();
    TypeBuilder::nested("MagicRegistrationMap")
        .flags(TypeAttributes::NESTED_PRIVATE | TypeAttributes::ABSTRACT | TypeAttributes::SEALED)
        .field(FieldDef::new(
            "typesMap",
            FieldAttributes::PRIVATE | FieldAttributes::STATIC,
            corlib("System.Collections.Generic", "Dictionary`2").instantiate(vec![string(), int32()]),
        ))
        .method(MethodDef::new("Prefill", PRIVATE_STATIC, void()).with_body(body_of(Vec::new())))
        .method(
            MethodDef::new("CallRegisterMethodByIndex", PRIVATE_STATIC, corlib("System", "Boolean"))
                .with_param("arguments", registration_args())
                .with_param("typeIdx", nullable_int())
                .with_body(body_of(vec![Instruction::ldc_i4(0)])),
        )
        .build_nested(program, android_type_manager)
        .unwrap();
}

// Helper function to create the runtime assemblies every application links against
pub fn runtime() -> Program {
    let mut program = Program::new();
    add_corlib(&mut program);
    add_system(&mut program);
    add_interop(&mut program);
    add_android(&mut program);
    program
}

/// The runtime assemblies with the default configuration
pub fn runtime_program() -> (Program, LinkerConfig) {
    (runtime(), LinkerConfig::default())
}

/// Application with a bridge type missing an interface method
pub struct LinkFixture {
    pub ctx: LinkContext,
    /// The application assembly
    pub app: Token,
    /// `App.Dog : Java.Lang.Object, App.IAnimal`, lacking `Speak`
    pub dog: Token,
    /// `App.IAnimal`
    pub animal: Token,
}

pub fn dog_fixture(config: LinkerConfig) -> LinkFixture {
    let mut program = runtime();
    let app = program.add_assembly("App");
    let animal = TypeBuilder::interface("App", "IAnimal")
        .method(MethodDef::new("Speak", INTERFACE_METHOD_FLAGS, void()))
        .build(&mut program, app)
        .unwrap();
    let dog = TypeBuilder::class("App", "Dog")
        .extends(android("Java.Lang", "Object"))
        .implements(TypeSig::named("App", "App", "IAnimal"))
        .method(ctor())
        .build(&mut program, app)
        .unwrap();

    LinkFixture {
        ctx: LinkContext::new(program, config),
        app,
        dog,
        animal,
    }
}

/// Application creating an app domain; returns the application assembly
pub fn app_domain_fixture() -> (LinkContext, Token) {
    let mut program = runtime();
    let app = program.add_assembly("App");
    let create = MethodRef::new(corlib("System", "AppDomain"), "CreateDomain", corlib("System", "AppDomain"))
        .with_param(string())
        .static_method();
    TypeBuilder::class("App", "Sandbox")
        .method(
            MethodDef::new("Run", PUBLIC_STATIC, void()).with_body(body_of(vec![
                Instruction::new(OpCode::Ldstr, Operand::String("sandbox".to_string())),
                Instruction::new(OpCode::Call, Operand::Method(create)),
                Instruction::simple(OpCode::Pop),
            ])),
        )
        .build(&mut program, app)
        .unwrap();

    (LinkContext::new(program, LinkerConfig::default()), app)
}

/// Activity implementing a bridge listener, with generated marshal methods
pub struct BridgeFixture {
    pub ctx: LinkContext,
    /// `Android.Views.IOnClickListener`, a bridge interface
    pub listener: Token,
    /// `App.MainActivity : Android.App.Activity, IOnClickListener`
    pub activity: Token,
    /// `Android.App.Activity`, declaring the connector methods
    pub bridge_base: Token,
    /// `MainActivity.OnClick`, registered with connector `GetOnClickHandler`
    pub on_click: Token,
    /// `MainActivity/__<$>_jni_marshal_methods`
    pub marshal_type: Token,
    /// `MainActivity.OnResume`, overriding the registered `Activity.OnResume`
    pub on_resume_override: Token,
    /// `System.Net.Sockets.LingerOption`
    pub linger_option: Token,
    /// `App.Marshaler`, a custom marshaler
    pub marshaler: Token,
}

pub fn bridge_fixture(config: LinkerConfig) -> BridgeFixture {
    let mut program = runtime();
    let android_asm = program.add_assembly(ANDROID);
    let view = android("Android.Views", "View");
    let delegate = corlib("System", "Delegate");

    let listener = TypeBuilder::interface("Android.Views", "IOnClickListener")
        .implements(android("Android.Runtime", "IJavaObject"))
        .method(MethodDef::new("OnClick", INTERFACE_METHOD_FLAGS, void()).with_param("v", view.clone()))
        .build(&mut program, android_asm)
        .unwrap();
    let bridge_base = TypeBuilder::class("Android.App", "Activity")
        .extends(android("Java.Lang", "Object"))
        .method(ctor())
        .method(
            MethodDef::new("OnResume", NEW_VIRTUAL, void())
                .with_attribute(register("onResume", "()V", "GetOnResumeHandler"))
                .with_body(MethodBody::new()),
        )
        .method(MethodDef::new("GetOnResumeHandler", PRIVATE_STATIC, delegate.clone()).with_body(MethodBody::new()))
        .method(MethodDef::new("GetOnClickHandler", PRIVATE_STATIC, delegate).with_body(MethodBody::new()))
        .build(&mut program, android_asm)
        .unwrap();

    let app = program.add_assembly("App");
    let activity = TypeBuilder::class("App", "MainActivity")
        .extends(android("Android.App", "Activity"))
        .implements(android("Android.Views", "IOnClickListener"))
        .method(ctor())
        .method(
            MethodDef::new("OnClick", SEALED_IMPL, void())
                .with_param("v", view)
                .with_attribute(register("onClick", "(Landroid/view/View;)V", "GetOnClickHandler"))
                .with_body(body_of(Vec::new())),
        )
        .method(MethodDef::new("OnResume", OVERRIDE, void()).with_body(body_of(Vec::new())))
        .build(&mut program, app)
        .unwrap();
    let marshal_type = TypeBuilder::nested(MARSHAL_METHODS)
        .flags(TypeAttributes::NESTED_PRIVATE | TypeAttributes::ABSTRACT | TypeAttributes::SEALED)
        .method(thunk("n_onClick__Landroid_view_View_2", 1))
        .method(thunk("n_onResume", 0))
        .method(register_native_members(&[
            "n_onClick__Landroid_view_View_2",
            "n_onResume",
        ]))
        .build_nested(&mut program, activity)
        .unwrap();

    let marshaler_interface = corlib("System.Runtime.InteropServices", "ICustomMarshaler");
    let marshaler = TypeBuilder::class("App", "Marshaler")
        .implements(marshaler_interface.clone())
        .method(
            MethodDef::new("GetInstance", PUBLIC_STATIC, marshaler_interface)
                .with_param("cookie", string())
                .with_body(MethodBody::new()),
        )
        .method(
            MethodDef::new("CleanUp", PUBLIC, void())
                .with_param("obj", corlib("System", "Object"))
                .with_body(body_of(Vec::new())),
        )
        .build(&mut program, app)
        .unwrap();

    let on_click = program.methods_named(activity, "OnClick").unwrap()[0];
    let on_resume_override = program.methods_named(activity, "OnResume").unwrap()[0];
    let linger_option = program
        .find_type("System", "System.Net.Sockets.LingerOption")
        .unwrap();

    BridgeFixture {
        ctx: LinkContext::new(program, config),
        listener,
        activity,
        bridge_base,
        on_click,
        marshal_type,
        on_resume_override,
        linger_option,
        marshaler,
    }
}

/// Application marshal type with three registered thunks, next to the runtime's
/// built-in type manager and magic registration map
pub struct RegistrationFixture {
    pub ctx: LinkContext,
    /// `App.MainActivity/__<$>_jni_marshal_methods`
    pub marshal_type: Token,
    /// Its `__RegisterNativeMembers`, registering `n_a`, `n_b` and `n_c`
    pub register_method: Token,
    /// `n_a`, `n_b`, `n_c`
    pub thunks: Vec<Token>,
    /// The built-in type manager marshal type
    pub builtin: Token,
    /// `MagicRegistrationMap.CallRegisterMethodByIndex`
    pub dispatcher: Token,
    /// `MagicRegistrationMap.Prefill`
    pub prefill: Token,
}

pub fn registration_fixture() -> RegistrationFixture {
    registration_fixture_with(LinkerConfig::default())
}

pub fn registration_fixture_with(config: LinkerConfig) -> RegistrationFixture {
    let mut program = runtime();
    let app = program.add_assembly("App");
    let activity = TypeBuilder::class("App", "MainActivity")
        .extends(android("Java.Lang", "Object"))
        .method(ctor())
        .build(&mut program, app)
        .unwrap();
    let marshal_type = TypeBuilder::nested(MARSHAL_METHODS)
        .flags(TypeAttributes::NESTED_PRIVATE | TypeAttributes::ABSTRACT | TypeAttributes::SEALED)
        .method(thunk("n_a", 0))
        .method(thunk("n_b", 0))
        .method(thunk("n_c", 0))
        .method(register_native_members(&["n_a", "n_b", "n_c"]))
        .build_nested(&mut program, activity)
        .unwrap();

    let register_method = program
        .methods_named(marshal_type, "__RegisterNativeMembers")
        .unwrap()[0];
    let thunks = ["n_a", "n_b", "n_c"]
        .iter()
        .map(|name| program.methods_named(marshal_type, name).unwrap()[0])
        .collect();
    let builtin = program
        .find_type(ANDROID, &config.builtin_marshal_type)
        .unwrap();
    let magic = program
        .find_type(ANDROID, &config.magic_registration_type)
        .unwrap();
    let dispatcher = program
        .methods_named(magic, "CallRegisterMethodByIndex")
        .unwrap()[0];
    let prefill = program.methods_named(magic, "Prefill").unwrap()[0];

    RegistrationFixture {
        ctx: LinkContext::new(program, config),
        marshal_type,
        register_method,
        thunks,
        builtin,
        dispatcher,
        prefill,
    }
}

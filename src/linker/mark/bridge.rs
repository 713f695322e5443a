//! Marking rules of the native-object bridge.
//!
//! Bridge code is reached from the Java side through JNI registrations, interface
//! metadata and reflection-like lookups the managed call graph does not show. The
//! [`BridgeMarkExtension`] adds those edges to the base algorithm:
//!
//! - interface implementation records of bridge interfaces survive unconditionally
//! - marked bridge interfaces keep all their methods
//! - registered methods keep their connector member and, optionally, their marshal thunk
//! - foundational runtime types keep the members the native runtime touches directly
//! - custom marshalers keep their static `GetInstance` factory

use std::iter;

use rustc_hash::FxHashSet;

use crate::{
    linker::{
        config::LinkerConfig,
        mark::{
            rules::{rules_for, DependencyAction},
            BridgeRegistry, MarkExtension, Marker,
        },
        signature,
    },
    metadata::{
        customattributes::RegisterAttribute,
        diagnostics::DiagnosticCategory,
        method::MethodDef,
        program::Program,
        token::Token,
        typesystem::InterfaceImpl,
    },
    Result,
};

const CUSTOM_MARSHALER_INTERFACE: &str = "System.Runtime.InteropServices.ICustomMarshaler";
const CUSTOM_MARSHALER_FACTORY: &str = "GetInstance";

/// Bridge-aware marking rules; records marshal types into a [`BridgeRegistry`].
pub struct BridgeMarkExtension<'r> {
    registry: &'r mut BridgeRegistry,
}

impl<'r> BridgeMarkExtension<'r> {
    /// Creates the extension, collecting marshal types into `registry`
    pub fn new(registry: &'r mut BridgeRegistry) -> Self {
        BridgeMarkExtension { registry }
    }

    fn apply_native_rules(marker: &mut Marker<'_>, type_token: Token) -> Result<()> {
        let program = marker.program();
        let def = program.type_def(type_token)?;
        let assembly = program.assembly_name_of(type_token)?;
        let rules = rules_for(
            assembly,
            &def.namespace,
            &def.name,
            def.is_nested(),
            marker.config().link_symbols,
        );

        for rule in rules {
            match rule.action {
                DependencyAction::InstanceFields => {
                    marker.mark_fields(type_token, false)?;
                }
                DependencyAction::AllFields => {
                    marker.mark_fields(type_token, true)?;
                }
                DependencyAction::Methods {
                    assembly: target_assembly,
                    type_name,
                    methods,
                } => {
                    let target = match type_name {
                        None => Some(type_token),
                        Some(name) => program.find_type(target_assembly.unwrap_or(assembly), name),
                    };
                    let Some(target) = target else {
                        continue;
                    };
                    for method in methods {
                        marker.mark_named_method(target, method)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn mark_custom_marshaler_factory(marker: &mut Marker<'_>, type_token: Token) -> Result<()> {
        let program = marker.program();
        let def = program.type_def(type_token)?;
        if def.methods.is_empty() || !program.implements(type_token, CUSTOM_MARSHALER_INTERFACE)? {
            return Ok(());
        }

        for method_token in &def.methods {
            let method = program.method(*method_token)?;
            if method.name == CUSTOM_MARSHALER_FACTORY
                && method.is_static()
                && method.params.len() == 1
                && method.params[0].param_type.fullname() == "System.String"
                && method.return_type.fullname() == CUSTOM_MARSHALER_INTERFACE
            {
                marker.mark_method(*method_token);
                break;
            }
        }
        Ok(())
    }

    /// Preserves what the bridge needs for a registered method
    fn process_registration(&mut self, marker: &mut Marker<'_>, method_token: Token) -> Result<()> {
        let program = marker.program();
        let config = marker.config();
        let method = program.method(method_token)?;
        let declaring_type = method.declaring_type;

        let (register, thunk_only) = match registration_of(method, config) {
            Some(register) => (register, false),
            None => {
                if !config.preserve_jni_marshal_methods
                    || marshal_methods_type(program, config, declaring_type)?.is_none()
                {
                    return Ok(());
                }
                match inherited_registration(program, config, method_token)? {
                    Some(register) => (register, true),
                    None => return Ok(()),
                }
            }
        };

        if config.preserve_jni_marshal_methods {
            if let Some(thunk) = marshal_method(program, config, declaring_type, &register)? {
                marker.mark_method(thunk);
                self.registry.add(program.method(thunk)?.declaring_type);
            }
        }

        if !thunk_only {
            preserve_registered_method(marker, declaring_type, &register)?;
        }
        Ok(())
    }
}

impl MarkExtension for BridgeMarkExtension<'_> {
    fn should_mark_interface_implementation(
        &mut self,
        marker: &Marker<'_>,
        type_token: Token,
        record: &InterfaceImpl,
        interface: Token,
    ) -> Result<bool> {
        if marker.is_marked(record.token) {
            return Ok(false);
        }
        if marker.base_should_mark_interface_implementation(type_token, record, interface) {
            return Ok(true);
        }
        exposes_bridge_capability(marker.program(), marker.config(), interface)
    }

    fn on_type_marked(&mut self, marker: &mut Marker<'_>, type_token: Token) -> Result<()> {
        Self::apply_native_rules(marker, type_token)?;
        Self::mark_custom_marshaler_factory(marker, type_token)?;

        let program = marker.program();
        if program.type_def(type_token)?.is_interface()
            && exposes_bridge_capability(program, marker.config(), type_token)?
        {
            marker.mark_methods(type_token)?;
        }
        Ok(())
    }

    fn on_method_marked(&mut self, marker: &mut Marker<'_>, method_token: Token) -> Result<()> {
        self.process_registration(marker, method_token)
    }
}

/// Returns true if the type implements one of the bridge capability interfaces
///
/// # Errors
///
/// Returns an error on cyclic or too deep inheritance.
pub fn exposes_bridge_capability(
    program: &Program,
    config: &LinkerConfig,
    type_token: Token,
) -> Result<bool> {
    Ok(program.implements(type_token, &config.java_object_interface)?
        || program.implements(type_token, &config.java_peerable_interface)?)
}

/// The method's own registration, if it names a connector
fn registration_of(method: &MethodDef, config: &LinkerConfig) -> Option<RegisterAttribute> {
    method
        .custom_attributes
        .iter()
        .filter_map(|attribute| RegisterAttribute::from_attribute(attribute, &config.register_attribute))
        .find(|register| register.connector.is_some())
}

/// Nested marshal-methods type of `type_token`
fn marshal_methods_type(
    program: &Program,
    config: &LinkerConfig,
    type_token: Token,
) -> Result<Option<Token>> {
    program.nested_type_named(type_token, &config.marshal_methods_type)
}

/// Marshal thunk generated for `register` in the marshal-methods type of `type_token`
fn marshal_method(
    program: &Program,
    config: &LinkerConfig,
    type_token: Token,
    register: &RegisterAttribute,
) -> Result<Option<Token>> {
    let Some(marshal_type) = marshal_methods_type(program, config, type_token)? else {
        return Ok(None);
    };
    let thunks = program.methods_named(marshal_type, &register.marshal_method_name())?;
    Ok(thunks.first().copied())
}

/// Registration of a base-class or interface method the method overrides.
///
/// Explicit overrides are consulted first, then equivalent virtual methods of ancestors,
/// then equivalent methods of every interface implemented by the declaring type.
fn inherited_registration(
    program: &Program,
    config: &LinkerConfig,
    method_token: Token,
) -> Result<Option<RegisterAttribute>> {
    let method = program.method(method_token)?;
    if method.is_static() || method.is_constructor() {
        return Ok(None);
    }

    for target in &method.overrides {
        if let Some(resolved) = program.resolve_method(target) {
            if let Some(register) = registration_of(program.method(resolved)?, config) {
                return Ok(Some(register));
            }
        }
    }

    let bases = program.base_types(method.declaring_type)?;
    for base in &bases {
        for candidate in &program.type_def(*base)?.methods {
            let candidate = program.method(*candidate)?;
            if candidate.is_virtual() && signature::equivalent(program, candidate, method) {
                if let Some(register) = registration_of(candidate, config) {
                    return Ok(Some(register));
                }
            }
        }
    }

    let mut pending: Vec<Token> = Vec::new();
    for owner in iter::once(method.declaring_type).chain(bases) {
        for record in &program.type_def(owner)?.interfaces {
            pending.extend(program.resolve_type(&record.interface));
        }
    }
    let mut seen = FxHashSet::default();
    while let Some(interface) = pending.pop() {
        if !seen.insert(interface) {
            continue;
        }
        let def = program.type_def(interface)?;
        for candidate in &def.methods {
            let candidate = program.method(*candidate)?;
            if signature::equivalent(program, candidate, method) {
                if let Some(register) = registration_of(candidate, config) {
                    return Ok(Some(register));
                }
            }
        }
        for record in &def.interfaces {
            pending.extend(program.resolve_type(&record.interface));
        }
    }
    Ok(None)
}

/// Marks the connector member named by `register`.
///
/// The search starts at the connector's qualifying type when one is given (looked up in
/// its qualifier assembly if that assembly is part of the program, else in the declaring
/// type's assembly), otherwise at the declaring type, and walks up the base chain until a
/// type declares a member of that name. The qualifying type is where the walk starts,
/// not merely a precondition for walking from the declaring type.
///
/// A qualifying type that does not resolve, or a member no type of the chain declares,
/// is reported as a warning and skipped.
fn preserve_registered_method(
    marker: &mut Marker<'_>,
    declaring_type: Token,
    register: &RegisterAttribute,
) -> Result<()> {
    let program = marker.program();
    let Some(target) = register.connector_target() else {
        return Ok(());
    };
    let declaring_name = program.type_def(declaring_type)?.fullname();

    let start = match target.type_name {
        None => declaring_type,
        Some(type_name) => {
            let assembly = match target.assembly {
                Some(name) if program.assembly_by_name(name).is_some() => name,
                _ => program.assembly_name_of(declaring_type)?,
            };
            let Some(start) = program.find_type(assembly, type_name) else {
                marker.diagnostics().warning(
                    DiagnosticCategory::Registration,
                    format!(
                        "Unable to resolve connector type {type_name} in {assembly} for {} registered on {declaring_name}",
                        register.name
                    ),
                );
                return Ok(());
            };
            start
        }
    };

    for type_token in iter::once(start).chain(program.base_types(start)?) {
        if marker.mark_named_method(type_token, target.member)? > 0 {
            return Ok(());
        }
    }

    marker.diagnostics().warning(
        DiagnosticCategory::Registration,
        format!(
            "Unable to find connector {} for {} registered on {declaring_name}",
            target.member, register.name
        ),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{
        linker::{
            config::LinkerConfig,
            mark::{BridgeMarkExtension, BridgeRegistry, Marker},
        },
        metadata::{
            diagnostics::DiagnosticCategory,
            method::{MethodAccessFlags, MethodDef, MethodModifiers},
            signatures::TypeSig,
            typesystem::TypeBuilder,
        },
        test::{
            body_of, string, void,
            fixtures::{self, register, BridgeFixture},
        },
    };

    fn run(fixture: &mut BridgeFixture, registry: &mut BridgeRegistry) {
        let ctx = &mut fixture.ctx;
        let diagnostics = ctx.diagnostics();
        let mut marker = Marker::new(&ctx.program, &mut ctx.annotations, &ctx.config, &diagnostics);
        marker.run(&mut BridgeMarkExtension::new(registry)).unwrap();
    }

    #[test]
    fn test_bridge_interface_keeps_all_methods() {
        let mut fixture = fixtures::bridge_fixture(LinkerConfig::default());
        fixture.ctx.annotations.mark(fixture.listener);
        run(&mut fixture, &mut BridgeRegistry::new());

        for method in &fixture.ctx.program.type_def(fixture.listener).unwrap().methods {
            assert!(fixture.ctx.annotations.is_marked(*method));
        }
    }

    #[test]
    fn test_bridge_interface_record_kept_without_uses() {
        let mut fixture = fixtures::bridge_fixture(LinkerConfig::default());
        fixture.ctx.annotations.mark(fixture.activity);
        run(&mut fixture, &mut BridgeRegistry::new());

        let record = fixture.ctx.program.type_def(fixture.activity).unwrap().interfaces[0].token;
        assert!(fixture.ctx.annotations.is_marked(record));
        assert!(fixture.ctx.annotations.is_marked(fixture.listener));
    }

    #[test]
    fn test_registered_method_keeps_connector() {
        let mut fixture = fixtures::bridge_fixture(LinkerConfig::default());
        fixture.ctx.annotations.mark(fixture.on_click);
        let mut registry = BridgeRegistry::new();
        run(&mut fixture, &mut registry);

        let program = &fixture.ctx.program;
        let handler = program.methods_named(fixture.bridge_base, "GetOnClickHandler").unwrap()[0];
        assert!(fixture.ctx.annotations.is_marked(handler));
        assert!(registry.is_empty());
        assert!(fixture
            .ctx
            .diagnostics
            .by_category(DiagnosticCategory::Registration)
            .is_empty());
    }

    #[test]
    fn test_unresolved_connector_is_reported() {
        let mut fixture = fixtures::bridge_fixture(LinkerConfig::default());
        let flags = MethodAccessFlags::PUBLIC.bits() | MethodModifiers::VIRTUAL.bits();
        let program = &mut fixture.ctx.program;
        let qualified = program
            .add_method(
                fixture.activity,
                MethodDef::new("OnLongClick", flags, void())
                    .with_attribute(register("onLongClick", "()V", "GetOnLongClickHandler:No.Such/Type"))
                    .with_body(body_of(Vec::new())),
            )
            .unwrap();
        let unqualified = program
            .add_method(
                fixture.activity,
                MethodDef::new("OnKey", flags, void())
                    .with_attribute(register("onKey", "()V", "GetOnKeyHandler"))
                    .with_body(body_of(Vec::new())),
            )
            .unwrap();
        fixture.ctx.annotations.mark(qualified);
        fixture.ctx.annotations.mark(unqualified);
        run(&mut fixture, &mut BridgeRegistry::new());

        let warnings = fixture.ctx.diagnostics.by_category(DiagnosticCategory::Registration);
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.message.contains("No.Such/Type")));
        assert!(warnings.iter().any(|w| w.message.contains("GetOnKeyHandler")));
        assert!(fixture.ctx.annotations.is_marked(qualified));
    }

    #[test]
    fn test_marshal_thunk_registered_when_preserving() {
        let mut fixture =
            fixtures::bridge_fixture(LinkerConfig::default().with_preserve_jni_marshal_methods(true));
        fixture.ctx.annotations.mark(fixture.on_click);
        let mut registry = BridgeRegistry::new();
        run(&mut fixture, &mut registry);

        let program = &fixture.ctx.program;
        let thunk = program
            .methods_named(fixture.marshal_type, "n_onClick__Landroid_view_View_2")
            .unwrap()[0];
        assert!(fixture.ctx.annotations.is_marked(thunk));
        assert!(registry.contains(fixture.marshal_type));
    }

    #[test]
    fn test_override_without_attribute_preserves_thunk_only() {
        let mut fixture =
            fixtures::bridge_fixture(LinkerConfig::default().with_preserve_jni_marshal_methods(true));
        fixture.ctx.annotations.mark(fixture.on_resume_override);
        let mut registry = BridgeRegistry::new();
        run(&mut fixture, &mut registry);

        let program = &fixture.ctx.program;
        let thunk = program.methods_named(fixture.marshal_type, "n_onResume").unwrap()[0];
        let connector = program.methods_named(fixture.bridge_base, "GetOnResumeHandler").unwrap()[0];
        assert!(fixture.ctx.annotations.is_marked(thunk));
        assert!(!fixture.ctx.annotations.is_marked(connector));
    }

    #[test]
    fn test_native_rules_mark_socket_fields() {
        let mut fixture = fixtures::bridge_fixture(LinkerConfig::default());
        fixture.ctx.annotations.mark(fixture.linger_option);
        run(&mut fixture, &mut BridgeRegistry::new());

        let def = fixture.ctx.program.type_def(fixture.linger_option).unwrap();
        let instance = fixture.ctx.program.field_named(fixture.linger_option, "enabled").unwrap().unwrap();
        let shared = fixture.ctx.program.field_named(fixture.linger_option, "Default").unwrap().unwrap();
        assert_eq!(def.fields.len(), 2);
        assert!(fixture.ctx.annotations.is_marked(instance));
        assert!(!fixture.ctx.annotations.is_marked(shared));
    }

    #[test]
    fn test_custom_marshaler_factory() {
        let mut fixture = fixtures::bridge_fixture(LinkerConfig::default());
        fixture.ctx.annotations.mark(fixture.marshaler);
        run(&mut fixture, &mut BridgeRegistry::new());

        let factory = fixture.ctx.program.methods_named(fixture.marshaler, "GetInstance").unwrap()[0];
        let other = fixture.ctx.program.methods_named(fixture.marshaler, "CleanUp").unwrap()[0];
        assert!(fixture.ctx.annotations.is_marked(factory));
        assert!(!fixture.ctx.annotations.is_marked(other));
    }

    #[test]
    fn test_inherited_custom_marshaler_factory() {
        let mut fixture = fixtures::bridge_fixture(LinkerConfig::default());
        let program = &mut fixture.ctx.program;
        let app = program.type_def(fixture.marshaler).unwrap().assembly;
        let flags = MethodAccessFlags::PUBLIC.bits() | MethodModifiers::STATIC.bits();
        let derived = TypeBuilder::class("App", "PooledMarshaler")
            .extends(TypeSig::named("App", "App", "Marshaler"))
            .method(
                MethodDef::new(
                    "GetInstance",
                    flags,
                    TypeSig::named("mscorlib", "System.Runtime.InteropServices", "ICustomMarshaler"),
                )
                .with_param("cookie", string())
                .with_body(body_of(Vec::new())),
            )
            .build(program, app)
            .unwrap();
        fixture.ctx.annotations.mark(derived);
        run(&mut fixture, &mut BridgeRegistry::new());

        let factory = fixture.ctx.program.methods_named(derived, "GetInstance").unwrap()[0];
        assert!(fixture.ctx.annotations.is_marked(factory));
    }
}

//! Abstract-method completion.
//!
//! A concrete type that declares an interface but, after trimming or incomplete authoring,
//! provides no implementation for one of its abstract methods fails to load. The
//! [`AbstractMethodCompleter`] finds such gaps and fills each with a stub whose body
//! raises the configured runtime error:
//!
//! ```text
//! newobj instance void Java.Lang.AbstractMethodError::.ctor()
//! throw
//! ```
//!
//! Assemblies that gain a stub are escalated to [`AssemblyAction::Save`] so they are
//! re-emitted, and the error type is kept alive with its constructor.
//!
//! Generic interfaces are not completed.

use crate::{
    assembly::{Instruction, OpCode, Operand},
    linker::{
        annotations::{AssemblyAction, TypePreserve},
        context::LinkContext,
        signature,
    },
    metadata::{
        diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity},
        method::{MethodBody, MethodDef, MethodModifiers, Param},
        signatures::MethodRef,
        token::Token,
    },
    Error::MissingDependency,
    Result,
};

/// Marker of the only app-domain API the target runtime cannot honour
const APP_DOMAIN_CREATE: &str = "System.AppDomain System.AppDomain::CreateDomain";

/// Synthesizes throwing stubs for unimplemented interface methods.
#[derive(Debug, Default)]
pub struct AbstractMethodCompleter {
    /// Error constructor, looked up on first use
    error_ctor: Option<(Token, MethodRef)>,
    stubs_added: usize,
    escalated: Vec<Token>,
}

impl AbstractMethodCompleter {
    /// Creates a completer with an empty constructor cache
    pub fn new() -> Self {
        AbstractMethodCompleter::default()
    }

    /// Number of stubs synthesized so far
    #[must_use]
    pub fn stubs_added(&self) -> usize {
        self.stubs_added
    }

    /// Assemblies escalated to `Save`, in processing order
    #[must_use]
    pub fn escalated(&self) -> &[Token] {
        &self.escalated
    }

    /// Runs completion over every assembly of the program.
    ///
    /// # Errors
    /// Returns [`crate::Error::MissingDependency`] if a stub is needed but the error
    /// constructor cannot be located.
    pub fn process(&mut self, ctx: &mut LinkContext) -> Result<()> {
        let assemblies: Vec<Token> = ctx.program.assemblies().map(|a| a.token).collect();
        for assembly in assemblies {
            self.process_assembly(ctx, assembly)?;
        }
        Ok(())
    }

    /// Processes one assembly: assigns the default action, warns about app-domain use,
    /// completes its types and escalates its action when anything changed.
    ///
    /// Trusted assemblies are only given their default action.
    ///
    /// # Arguments
    /// * `ctx` - The link context
    /// * `assembly` - Token of the assembly to process
    ///
    /// # Errors
    /// Returns an error if the assembly is unknown or the error constructor is missing.
    pub fn process_assembly(&mut self, ctx: &mut LinkContext, assembly: Token) -> Result<bool> {
        if !ctx.annotations.has_action(assembly) {
            ctx.annotations.set_action(assembly, AssemblyAction::Skip);
        }

        let name = ctx.program.assembly(assembly)?.name.clone();
        if ctx.config.is_trusted(&name) {
            return Ok(false);
        }

        Self::check_app_domain_usage(ctx, assembly)?;

        if !self.fix_assembly(ctx, assembly)? {
            return Ok(false);
        }

        let action = ctx
            .annotations
            .action(assembly)
            .unwrap_or(AssemblyAction::Skip);
        if matches!(
            action,
            AssemblyAction::Skip | AssemblyAction::Copy | AssemblyAction::Delete
        ) {
            ctx.annotations.set_action(assembly, AssemblyAction::Save);
            self.escalated.push(assembly);
        }

        let (ctor, _) = self.error_constructor(ctx)?;
        let error_type = ctx.program.method(ctor)?.declaring_type;
        ctx.annotations.mark(error_type);
        ctx.annotations.set_preserve(error_type, TypePreserve::Nothing);
        ctx.annotations.add_preserved_method(error_type, ctor);
        Ok(true)
    }

    /// Records a warning if the assembly creates app domains.
    ///
    /// # Errors
    /// Returns an error if the assembly is unknown.
    pub fn check_app_domain_usage(ctx: &LinkContext, assembly: Token) -> Result<bool> {
        if !ctx.program.has_type_reference(assembly, "System.AppDomain")? {
            return Ok(false);
        }

        let uses_create = ctx
            .program
            .method_references(assembly)?
            .iter()
            .any(|r| r.to_string().contains(APP_DOMAIN_CREATE));
        if uses_create {
            let name = &ctx.program.assembly(assembly)?.name;
            ctx.diagnostics.push(
                Diagnostic::new(
                    DiagnosticSeverity::Warning,
                    DiagnosticCategory::AppDomain,
                    format!(
                        "Use of AppDomain.CreateDomain() detected in assembly: {name}. \
                         AppDomains are not supported on this target and the call will throw"
                    ),
                )
                .with_token(assembly),
            );
        }
        Ok(uses_create)
    }

    /// Completes every candidate type of an assembly; returns true if a stub was added.
    ///
    /// Assemblies that do not reference the bridge base type are left alone.
    ///
    /// # Errors
    /// Returns an error on malformed hierarchies or a missing error constructor.
    pub fn fix_assembly(&mut self, ctx: &mut LinkContext, assembly: Token) -> Result<bool> {
        if let Some(base) = ctx.config.bridge_base_type.as_deref() {
            if !ctx.program.has_type_reference(assembly, base)? {
                return Ok(false);
            }
        }

        let mut changed = false;
        for type_token in ctx.program.assembly_types(assembly)? {
            if self.might_need_fix(ctx, type_token)? {
                changed |= self.complete_type(ctx, type_token)?;
            }
        }
        Ok(changed)
    }

    fn might_need_fix(&self, ctx: &LinkContext, type_token: Token) -> Result<bool> {
        let def = ctx.program.type_def(type_token)?;
        if def.is_abstract() || def.is_interface() {
            return Ok(false);
        }
        match ctx.config.bridge_base_type.as_deref() {
            Some(base) => ctx.program.is_subclass_of(type_token, base),
            None => Ok(true),
        }
    }

    /// Adds a stub for every abstract method of a non-generic implemented interface that
    /// neither the type nor one of its ancestors implements.
    ///
    /// Interfaces that cannot be resolved are reported and skipped.
    ///
    /// # Arguments
    /// * `ctx` - The link context
    /// * `type_token` - The concrete type to complete
    ///
    /// # Errors
    /// Returns an error on malformed hierarchies or a missing error constructor.
    pub fn complete_type(&mut self, ctx: &mut LinkContext, type_token: Token) -> Result<bool> {
        let def = ctx.program.type_def(type_token)?;
        if def.interfaces.is_empty() {
            return Ok(false);
        }

        let mut candidates: Vec<Token> = def.methods.clone();
        for base in ctx.program.base_types(type_token)? {
            candidates.extend(ctx.program.type_def(base)?.methods.iter().copied());
        }

        let mut missing = Vec::new();
        for record in &def.interfaces {
            let Some(iface) = ctx.program.resolve_type(&record.interface) else {
                ctx.diagnostics.warning(
                    DiagnosticCategory::Type,
                    format!("Unable to resolve interface: {}", record.interface.fullname()),
                );
                continue;
            };
            let iface_def = ctx.program.type_def(iface)?;
            if iface_def.has_generic_params() {
                continue;
            }

            for iface_method in &iface_def.methods {
                let iface_method = ctx.program.method(*iface_method)?;
                if !iface_method.is_abstract() {
                    continue;
                }

                let mut exists = false;
                for candidate in &candidates {
                    if signature::equivalent(
                        &ctx.program,
                        iface_method,
                        ctx.program.method(*candidate)?,
                    ) {
                        exists = true;
                        break;
                    }
                }
                if !exists {
                    missing.push(iface_method.token);
                }
            }
        }

        for iface_method in &missing {
            self.add_stub(ctx, type_token, *iface_method)?;
        }
        Ok(!missing.is_empty())
    }

    fn add_stub(&mut self, ctx: &mut LinkContext, type_token: Token, iface_method: Token) -> Result<Token> {
        let (_, ctor) = self.error_constructor(ctx)?;
        let assembly = ctx.program.type_def(type_token)?.assembly;
        let source = ctx.program.method(iface_method)?.clone();

        let flags =
            (source.flags | MethodModifiers::FINAL.bits()) & !MethodModifiers::ABSTRACT.bits();
        let return_type = ctx.program.import_type(assembly, &source.return_type)?;
        let mut stub = MethodDef::new(&source.name, flags, return_type);
        for param in &source.params {
            stub.params.push(Param {
                name: param.name.clone(),
                param_type: ctx.program.import_type(assembly, &param.param_type)?,
            });
        }
        stub.generic_params = source.generic_params.clone();

        let ctor = ctx.program.import_method(assembly, &ctor)?;
        stub.body = Some(MethodBody::from_instructions(vec![
            Instruction::new(OpCode::Newobj, Operand::Method(ctor)),
            Instruction::simple(OpCode::Throw),
        ]));

        let token = ctx.program.add_method(type_token, stub)?;
        self.stubs_added += 1;

        let iface_ref = ctx.program.method_ref(iface_method)?;
        let type_def = ctx.program.type_def(type_token)?;
        let scope = &ctx.program.assembly(assembly)?.name;
        ctx.diagnostics.push(
            Diagnostic::new(
                DiagnosticSeverity::Info,
                DiagnosticCategory::Completion,
                format!(
                    "Added method: {iface_ref} to type: {} scope: {scope}",
                    type_def.fullname()
                ),
            )
            .with_token(token),
        );
        Ok(token)
    }

    /// The first parameterless `.ctor` of the configured error type, cached.
    ///
    /// # Errors
    /// Returns [`crate::Error::MissingDependency`] if the assembly, the type or the
    /// constructor does not exist.
    pub fn error_constructor(&mut self, ctx: &LinkContext) -> Result<(Token, MethodRef)> {
        if let Some(cached) = &self.error_ctor {
            return Ok(cached.clone());
        }

        let missing = || MissingDependency {
            member: format!("{} constructor", ctx.config.error_type),
            assembly: ctx.config.bridge_assembly.clone(),
        };

        let error_type = ctx
            .program
            .find_type(&ctx.config.bridge_assembly, &ctx.config.error_type)
            .ok_or_else(missing)?;

        let mut found = None;
        for method in ctx.program.methods_named(error_type, ".ctor")? {
            if ctx.program.method(method)?.params.is_empty() {
                found = Some(method);
                break;
            }
        }
        let ctor = found.ok_or_else(missing)?;

        let cached = (ctor, ctx.program.method_ref(ctor)?);
        self.error_ctor = Some(cached.clone());
        Ok(cached)
    }
}

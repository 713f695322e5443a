//! Registration dispatch table rewriting.
//!
//! After a mark pass has recorded which marshal types are alive (see
//! [`crate::linker::mark::BridgeRegistry`]), the [`DispatchRewriter`] brings the generated
//! registration code in line with the surviving members:
//!
//! 1. every marshal type's `__RegisterNativeMembers` array is trimmed to its marked
//!    thunks ([`pattern`])
//! 2. the magic registration map's `Prefill` and `CallRegisterMethodByIndex` are rebuilt
//!    for the full marshal type set ([`codegen`])
//!
//! Failures in either step are recorded as diagnostics and leave the affected method as
//! it is; they never abort linking.

pub mod codegen;
pub mod pattern;

use rustc_hash::FxHashSet;

use crate::{
    linker::{context::LinkContext, mark::BridgeRegistry},
    metadata::{
        diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity},
        method::MethodBody,
        token::Token,
    },
    Result,
};

/// Rewrites registration methods and the dispatch table for the registered marshal types.
pub struct DispatchRewriter<'r> {
    registry: &'r mut BridgeRegistry,
}

impl<'r> DispatchRewriter<'r> {
    /// Creates a rewriter over `registry`
    pub fn new(registry: &'r mut BridgeRegistry) -> Self {
        DispatchRewriter { registry }
    }

    /// Trims every registration array and regenerates the dispatch table.
    ///
    /// The built-in type manager marshal type is added to the registry first.
    ///
    /// # Returns
    ///
    /// `true` if at least one registration method was rewritten. Regenerating the
    /// dispatch table alone does not count as a change.
    ///
    /// # Errors
    ///
    /// Returns an error if the program model is inconsistent.
    pub fn update_marshal_types(&mut self, ctx: &mut LinkContext) -> Result<bool> {
        match ctx
            .program
            .find_type(&ctx.config.bridge_assembly, &ctx.config.builtin_marshal_type)
        {
            Some(builtin) => {
                self.registry.add(builtin);
            }
            None => ctx.diagnostics.error(
                DiagnosticCategory::Registration,
                format!(
                    "Unable to find '{}' in {}",
                    ctx.config.builtin_marshal_type, ctx.config.bridge_assembly
                ),
            ),
        }

        let mut updated = false;
        let marshal_types: Vec<Token> = self.registry.iter().collect();
        for marshal_type in &marshal_types {
            let Some((register_method, marked)) = Self::marked_methods(ctx, *marshal_type)? else {
                continue;
            };
            updated |= Self::update_register_method(ctx, register_method, &marked)?;
        }

        Self::update_magic_registration(ctx, &marshal_types)?;
        Ok(updated)
    }

    /// The registration method of a marshal type and the names of its other marked
    /// methods; `None` if either is missing
    fn marked_methods(
        ctx: &LinkContext,
        marshal_type: Token,
    ) -> Result<Option<(Token, FxHashSet<String>)>> {
        let mut register_method = None;
        let mut marked = FxHashSet::default();

        for method_token in &ctx.program.type_def(marshal_type)?.methods {
            let method = ctx.program.method(*method_token)?;
            if method.name == ctx.config.registration_method {
                register_method = Some(*method_token);
                continue;
            }
            if method.is_constructor() {
                continue;
            }
            if ctx.annotations.is_marked(*method_token) {
                marked.insert(method.name.clone());
            }
        }

        Ok(register_method
            .filter(|_| !marked.is_empty())
            .map(|method| (method, marked)))
    }

    fn update_register_method(
        ctx: &mut LinkContext,
        method: Token,
        marked: &FxHashSet<String>,
    ) -> Result<bool> {
        if ctx.annotations.is_registration_rewritten(method) {
            ctx.annotations.mark(method);
            return Ok(false);
        }

        let name = ctx.program.method_ref(method)?.to_string();
        let Some(body) = ctx.program.method_mut(method)?.body.as_mut() else {
            ctx.diagnostics.push(
                Diagnostic::new(
                    DiagnosticSeverity::Error,
                    DiagnosticCategory::Registration,
                    format!("Unable to update {name}: method has no body"),
                )
                .with_token(method),
            );
            return Ok(false);
        };

        match pattern::trim_registration_array(body, marked) {
            Ok(trimmed) => {
                ctx.annotations.mark(method);
                ctx.annotations.set_registration_rewritten(method);
                ctx.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticSeverity::Info,
                        DiagnosticCategory::Registration,
                        format!(
                            "Updated {name}: {} slot(s) kept, {} removed",
                            trimmed.kept, trimmed.removed
                        ),
                    )
                    .with_token(method),
                );
                Ok(true)
            }
            Err(error) => {
                ctx.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticSeverity::Error,
                        DiagnosticCategory::Registration,
                        format!("Unable to update {name}: {error}"),
                    )
                    .with_token(method),
                );
                Ok(false)
            }
        }
    }

    /// Rebuilds `Prefill` and `CallRegisterMethodByIndex` of the magic registration map.
    ///
    /// Does nothing if the map type or the dispatcher method is absent, which is the case
    /// for runtimes that do not use it.
    fn update_magic_registration(ctx: &mut LinkContext, marshal_types: &[Token]) -> Result<()> {
        let config = &ctx.config;
        let Some(magic_type) = ctx
            .program
            .find_type(&config.bridge_assembly, &config.magic_registration_type)
        else {
            return Ok(());
        };
        let Some(dispatcher) = ctx
            .program
            .methods_named(magic_type, "CallRegisterMethodByIndex")?
            .first()
            .copied()
        else {
            return Ok(());
        };

        let mut switch_types = Vec::with_capacity(marshal_types.len());
        let mut keys = Vec::with_capacity(marshal_types.len());
        for marshal_type in marshal_types {
            if ctx
                .program
                .methods_named(*marshal_type, &config.registration_method)?
                .is_empty()
            {
                let fullname = ctx.program.type_def(*marshal_type)?.fullname();
                ctx.diagnostics.error(
                    DiagnosticCategory::Dispatch,
                    format!("Marshal type {fullname} has no {}", config.registration_method),
                );
                return Ok(());
            }
            switch_types.push(ctx.program.type_sig(*marshal_type)?);
            keys.push(codegen::lookup_key(
                &ctx.program.type_def(*marshal_type)?.fullname(),
                &config.marshal_methods_type,
            ));
        }

        let refs = match codegen::runtime_refs(&ctx.program, config) {
            Ok(refs) => refs,
            Err(error) => {
                ctx.diagnostics.error(
                    DiagnosticCategory::Dispatch,
                    format!("Unable to regenerate the registration dispatcher: {error}"),
                );
                return Ok(());
            }
        };

        let types_map = ctx.program.field_named(magic_type, "typesMap")?;
        let prefill = ctx.program.methods_named(magic_type, "Prefill")?.first().copied();
        let (Some(types_map), Some(prefill)) = (types_map, prefill) else {
            ctx.diagnostics.error(
                DiagnosticCategory::Dispatch,
                format!(
                    "{} lacks typesMap or Prefill",
                    config.magic_registration_type
                ),
            );
            return Ok(());
        };
        let types_map = ctx.program.field_ref(types_map)?;

        let magic_assembly = ctx.program.type_def(magic_type)?.assembly;
        for sig in &switch_types {
            ctx.program.import_type(magic_assembly, sig)?;
        }
        for reference in [
            &refs.dictionary_ctor,
            &refs.dictionary_set_item,
            &refs.get_value_or_default,
            &refs.get_type_from_handle,
            &refs.get_method,
            &refs.create_delegate,
            &refs.action_invoke,
        ] {
            ctx.program.import_method(magic_assembly, reference)?;
        }

        let prefill_instructions = codegen::prefill_body(&refs, &types_map, &keys);
        let prefill_def = ctx.program.method_mut(prefill)?;
        match prefill_def.body.as_mut() {
            Some(body) => body.instructions = prefill_instructions,
            None => prefill_def.body = Some(MethodBody::from_instructions(prefill_instructions)),
        }

        let dispatcher_body =
            codegen::dispatcher_body(&refs, &switch_types, &ctx.config.registration_method);
        ctx.program.method_mut(dispatcher)?.body = Some(dispatcher_body);

        for dependency in refs.dependencies {
            ctx.annotations.mark(dependency);
        }

        ctx.diagnostics.info(
            DiagnosticCategory::Dispatch,
            format!(
                "Regenerated registration dispatcher for {} marshal type(s)",
                marshal_types.len()
            ),
        );
        Ok(())
    }
}

//! Worklist-driven mark phase over the program's member graph.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::{
    assembly::Operand,
    linker::{
        annotations::{Annotations, AssemblyAction, TypePreserve},
        config::LinkerConfig,
        mark::MarkExtension,
        signature,
    },
    metadata::{
        customattributes::{CustomAttribute, CustomAttributeArgument},
        diagnostics::Diagnostics,
        method::MethodDef,
        program::Program,
        signatures::{FieldRef, MethodRef, TypeSig},
        token::{TableId, Token},
        typesystem::InterfaceImpl,
    },
    Result,
};

/// One mark pass over a [`Program`].
///
/// Marks are recorded in [`Annotations`] immediately and never removed. Every newly seen
/// token is queued once per pass; processing a token marks its dependencies, which are
/// queued in turn. After the queue drains, interface implementation records and virtual
/// overrides are decided, which may queue more work.
pub struct Marker<'a> {
    program: &'a Program,
    annotations: &'a mut Annotations,
    config: &'a LinkerConfig,
    diagnostics: &'a Diagnostics,
    queue: VecDeque<Token>,
    processed: FxHashSet<Token>,
}

impl<'a> Marker<'a> {
    /// Creates a marker for one pass
    pub fn new(
        program: &'a Program,
        annotations: &'a mut Annotations,
        config: &'a LinkerConfig,
        diagnostics: &'a Diagnostics,
    ) -> Self {
        Marker {
            program,
            annotations,
            config,
            diagnostics,
            queue: VecDeque::new(),
            processed: FxHashSet::default(),
        }
    }

    /// The program being marked
    #[must_use]
    pub fn program(&self) -> &'a Program {
        self.program
    }

    /// Link configuration
    #[must_use]
    pub fn config(&self) -> &'a LinkerConfig {
        self.config
    }

    /// Diagnostics collector
    #[must_use]
    pub fn diagnostics(&self) -> &'a Diagnostics {
        self.diagnostics
    }

    /// Returns true if `token` is marked
    #[must_use]
    pub fn is_marked(&self, token: Token) -> bool {
        self.annotations.is_marked(token)
    }

    /// Number of tokens processed so far in this pass
    #[must_use]
    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    /// Runs the pass to completion.
    ///
    /// # Arguments
    ///
    /// * `extension` - Additional marking rules consulted while processing.
    ///
    /// # Errors
    ///
    /// Returns an error if the program model is inconsistent, e.g. a token stored in a
    /// definition does not exist or inheritance is cyclic.
    pub fn run(&mut self, extension: &mut dyn MarkExtension) -> Result<()> {
        self.seed()?;
        loop {
            self.drain(extension)?;
            if !self.process_deferred(extension)? {
                break;
            }
        }
        Ok(())
    }

    fn seed(&mut self) -> Result<()> {
        let program = self.program;

        for assembly in program.assemblies() {
            let action = self
                .annotations
                .action(assembly.token)
                .unwrap_or(AssemblyAction::Link);

            match action {
                AssemblyAction::Delete => {}
                action if action.keeps_everything() => {
                    self.enqueue(assembly.token);
                    for type_token in program.assembly_types(assembly.token)? {
                        let def = program.type_def(type_token)?;
                        self.enqueue(type_token);
                        def.methods.iter().for_each(|m| self.enqueue(*m));
                        def.fields.iter().for_each(|f| self.enqueue(*f));
                        def.interfaces.iter().for_each(|i| self.enqueue(i.token));
                    }
                }
                _ => {
                    if let Some(entry_point) = assembly.entry_point {
                        self.enqueue(entry_point);
                    }
                    for type_token in program.assembly_types(assembly.token)? {
                        if self.annotations.preserve(type_token).is_some() {
                            self.enqueue(type_token);
                        }
                        let preserved = self.annotations.preserved_methods(type_token).to_vec();
                        preserved.into_iter().for_each(|m| self.enqueue(m));
                    }
                }
            }
        }

        // Earlier passes and earlier steps leave their marks as roots
        for token in self.annotations.marked() {
            self.enqueue(token);
        }
        Ok(())
    }

    fn enqueue(&mut self, token: Token) {
        self.annotations.mark(token);
        if !self.processed.contains(&token) {
            self.queue.push_back(token);
        }
    }

    fn drain(&mut self, extension: &mut dyn MarkExtension) -> Result<()> {
        while let Some(token) = self.queue.pop_front() {
            if !self.processed.insert(token) {
                continue;
            }

            match token.table_id() {
                Some(TableId::TypeDef) => {
                    self.process_type(token)?;
                    extension.on_type_marked(self, token)?;
                }
                Some(TableId::MethodDef) => {
                    self.process_method(token)?;
                    extension.on_method_marked(self, token)?;
                }
                Some(TableId::Field) => self.process_field(token)?,
                Some(TableId::InterfaceImpl) => self.process_interface_impl(token)?,
                Some(TableId::Assembly) | None => {}
            }
        }
        Ok(())
    }

    fn process_type(&mut self, type_token: Token) -> Result<()> {
        let program = self.program;
        let def = program.type_def(type_token)?;

        self.enqueue(def.assembly);
        if let Some(base) = &def.base {
            self.mark_type_sig(base);
        }
        if let Some(outer) = def.declaring_type {
            self.enqueue(outer);
        }
        self.mark_attributes(&def.custom_attributes);

        for method_token in &def.methods {
            if program.method(*method_token)?.is_static_constructor() {
                self.enqueue(*method_token);
            }
        }

        match self.annotations.preserve(type_token) {
            Some(TypePreserve::All) => {
                self.mark_fields(type_token, true)?;
                self.mark_methods(type_token)?;
            }
            Some(TypePreserve::Fields) => {
                self.mark_fields(type_token, true)?;
            }
            Some(TypePreserve::Methods) => self.mark_methods(type_token)?,
            Some(TypePreserve::Nothing) | None => {}
        }

        let preserved = self.annotations.preserved_methods(type_token).to_vec();
        preserved.into_iter().for_each(|m| self.enqueue(m));
        Ok(())
    }

    fn process_method(&mut self, method_token: Token) -> Result<()> {
        let program = self.program;
        let method = program.method(method_token)?;

        self.enqueue(method.declaring_type);
        self.mark_type_sig(&method.return_type);
        for param in method.param_types() {
            self.mark_type_sig(param);
        }
        for target in &method.overrides {
            self.mark_method_ref(target);
        }
        self.mark_attributes(&method.custom_attributes);

        if let Some(body) = &method.body {
            for local in &body.variables {
                self.mark_type_sig(local);
            }
            for instruction in &body.instructions {
                match &instruction.operand {
                    Operand::Method(target) => self.mark_method_ref(target),
                    Operand::Field(target) => self.mark_field_ref(target),
                    Operand::Type(sig) => self.mark_type_sig(sig),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn process_field(&mut self, field_token: Token) -> Result<()> {
        let program = self.program;
        let field = program.field(field_token)?;
        self.enqueue(field.declaring_type);
        self.mark_type_sig(&field.field_type);
        Ok(())
    }

    fn process_interface_impl(&mut self, record_token: Token) -> Result<()> {
        let program = self.program;
        let Some(owner) = program.interface_impl_owner(record_token) else {
            return Ok(());
        };
        let def = program.type_def(owner)?;
        if let Some(record) = def.interfaces.iter().find(|r| r.token == record_token) {
            self.mark_type_sig(&record.interface);
        }
        Ok(())
    }

    fn mark_attributes(&mut self, attributes: &[CustomAttribute]) {
        for attribute in attributes {
            self.mark_type_sig(&attribute.attribute_type);
            for argument in &attribute.fixed_args {
                if let CustomAttributeArgument::Type(sig) = argument {
                    self.mark_type_sig(sig);
                }
            }
        }
    }

    /// Decides interface implementation records and virtual overrides of every marked
    /// type. Returns true if anything new was marked.
    fn process_deferred(&mut self, extension: &mut dyn MarkExtension) -> Result<bool> {
        let program = self.program;
        let mut changed = false;

        for type_token in self.annotations.marked_in(TableId::TypeDef) {
            let def = program.type_def(type_token)?;

            for record in &def.interfaces {
                if self.annotations.is_marked(record.token) {
                    continue;
                }
                let Some(interface) = program.resolve_type(&record.interface) else {
                    continue;
                };
                if extension.should_mark_interface_implementation(self, type_token, record, interface)? {
                    self.mark_interface_impl(record.token);
                    changed = true;
                }
            }

            for method_token in &def.methods {
                if self.annotations.is_marked(*method_token) {
                    continue;
                }
                let method = program.method(*method_token)?;
                if method.is_virtual() && self.overrides_marked_method(type_token, method)? {
                    self.enqueue(*method_token);
                    changed = true;
                }
            }
        }
        Ok(changed)
    }

    fn overrides_marked_method(&self, type_token: Token, method: &MethodDef) -> Result<bool> {
        let program = self.program;

        for target in &method.overrides {
            if let Some(resolved) = program.resolve_method(target) {
                if self.annotations.is_marked(resolved) {
                    return Ok(true);
                }
            }
        }

        for base in program.base_types(type_token)? {
            for base_method in &program.type_def(base)?.methods {
                if !self.annotations.is_marked(*base_method) {
                    continue;
                }
                let base_method = program.method(*base_method)?;
                if base_method.is_virtual() && signature::equivalent(program, base_method, method) {
                    return Ok(true);
                }
            }
        }

        for interface in self.kept_interfaces(type_token)? {
            for iface_method in &program.type_def(interface)?.methods {
                if !self.annotations.is_marked(*iface_method) {
                    continue;
                }
                if signature::equivalent(program, program.method(*iface_method)?, method) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Interfaces reachable through marked implementation records of the type and its
    /// ancestors, including the interfaces those interfaces extend
    fn kept_interfaces(&self, type_token: Token) -> Result<Vec<Token>> {
        let program = self.program;
        let mut pending = Vec::new();

        let mut owners = vec![type_token];
        owners.extend(program.base_types(type_token)?);
        for owner in owners {
            for record in &program.type_def(owner)?.interfaces {
                if self.annotations.is_marked(record.token) {
                    pending.extend(program.resolve_type(&record.interface));
                }
            }
        }

        let mut seen = FxHashSet::default();
        let mut interfaces = Vec::new();
        while let Some(interface) = pending.pop() {
            if !seen.insert(interface) {
                continue;
            }
            interfaces.push(interface);
            for record in &program.type_def(interface)?.interfaces {
                pending.extend(program.resolve_type(&record.interface));
            }
        }
        Ok(interfaces)
    }

    /// The rule applied when no extension overrides it: keep the record once the
    /// interface type itself is marked
    #[must_use]
    pub fn base_should_mark_interface_implementation(
        &self,
        _type_token: Token,
        _record: &InterfaceImpl,
        interface: Token,
    ) -> bool {
        self.annotations.is_marked(interface)
    }

    /// Marks a type definition
    pub fn mark_type(&mut self, type_token: Token) {
        if type_token.is_table(TableId::TypeDef) {
            self.enqueue(type_token);
        }
    }

    /// Marks every type definition a signature mentions (element and generic argument
    /// types included). Types outside the program are ignored.
    pub fn mark_type_sig(&mut self, sig: &TypeSig) {
        let program = self.program;
        let mut resolved = Vec::new();
        sig.walk(&mut |s| {
            if let TypeSig::Named(_) = s {
                resolved.extend(program.resolve_type(s));
            }
        });
        resolved.into_iter().for_each(|t| self.enqueue(t));
    }

    /// Marks a method definition
    pub fn mark_method(&mut self, method_token: Token) {
        if method_token.is_table(TableId::MethodDef) {
            self.enqueue(method_token);
        }
    }

    /// Marks the types of a method reference and the method it resolves to
    pub fn mark_method_ref(&mut self, reference: &MethodRef) {
        self.mark_type_sig(&reference.declaring_type);
        if let Some(method) = self.program.resolve_method(reference) {
            self.enqueue(method);
        }
    }

    /// Marks a field definition
    pub fn mark_field(&mut self, field_token: Token) {
        if field_token.is_table(TableId::Field) {
            self.enqueue(field_token);
        }
    }

    /// Marks the declaring type of a field reference and the field it resolves to
    pub fn mark_field_ref(&mut self, reference: &FieldRef) {
        self.mark_type_sig(&reference.declaring_type);
        if let Some(field) = self.program.resolve_field(reference) {
            self.enqueue(field);
        }
    }

    /// Marks the fields of a type.
    ///
    /// # Arguments
    ///
    /// * `type_token` - The type whose fields are marked.
    /// * `include_static` - Whether static fields are marked too.
    ///
    /// # Returns
    ///
    /// The number of fields marked.
    ///
    /// # Errors
    ///
    /// Returns an error if the type or one of its fields is unknown.
    pub fn mark_fields(&mut self, type_token: Token, include_static: bool) -> Result<usize> {
        let program = self.program;
        let mut count = 0;
        for field_token in &program.type_def(type_token)?.fields {
            if include_static || !program.field(*field_token)?.is_static() {
                self.enqueue(*field_token);
                count += 1;
            }
        }
        Ok(count)
    }

    /// Marks every method of a type
    ///
    /// # Errors
    ///
    /// Returns an error if the type is unknown.
    pub fn mark_methods(&mut self, type_token: Token) -> Result<()> {
        let program = self.program;
        for method_token in &program.type_def(type_token)?.methods {
            self.enqueue(*method_token);
        }
        Ok(())
    }

    /// Marks every method of a type with the given name; returns how many were marked.
    ///
    /// # Errors
    ///
    /// Returns an error if the type is unknown.
    pub fn mark_named_method(&mut self, type_token: Token, name: &str) -> Result<usize> {
        let methods = self.program.methods_named(type_token, name)?;
        let count = methods.len();
        methods.into_iter().for_each(|m| self.enqueue(m));
        Ok(count)
    }

    /// Marks an interface implementation record
    pub fn mark_interface_impl(&mut self, record_token: Token) {
        if record_token.is_table(TableId::InterfaceImpl) {
            self.enqueue(record_token);
        }
    }
}

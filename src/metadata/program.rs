//! The closed set of assemblies a link run operates on.
//!
//! [`Program`] is an arena owning every assembly, type, method and field definition.
//! Definitions refer to each other by [`Token`]; cross-assembly and generic references are
//! plain signatures ([`TypeSig`], [`MethodRef`], [`FieldRef`]) resolved against the arena
//! on demand. Resolution returns `None` for anything outside the program, which callers
//! treat as "unresolvable" and skip.
//!
//! # Key Operations
//!
//! - Definition insertion: [`Program::add_assembly`], [`Program::add_type`],
//!   [`Program::add_nested_type`], [`Program::add_method`], [`Program::add_field`]
//! - Resolution: [`Program::resolve_type`], [`Program::resolve_method`],
//!   [`Program::resolve_field`], [`Program::find_type`]
//! - Hierarchy queries: [`Program::base_types`], [`Program::implements`],
//!   [`Program::is_subclass_of`]
//! - Cross-assembly import: [`Program::import_type`], [`Program::import_method`]
//! - Reference enumeration: [`Program::type_references`], [`Program::method_references`]
//!
//! # Examples
//!
//! ```rust
//! use cilshrink::metadata::program::Program;
//! use cilshrink::metadata::signatures::TypeSig;
//! use cilshrink::metadata::typesystem::TypeBuilder;
//!
//! let mut program = Program::new();
//! let android = program.add_assembly("Mono.Android");
//! let app = program.add_assembly("App");
//!
//! let object = TypeBuilder::class("Java.Lang", "Object").build(&mut program, android)?;
//! let activity = TypeBuilder::class("App", "MainActivity")
//!     .extends(TypeSig::named("Mono.Android", "Java.Lang", "Object"))
//!     .build(&mut program, app)?;
//!
//! assert_eq!(program.base_types(activity)?, vec![object]);
//! assert!(program.is_subclass_of(activity, "Java.Lang.Object")?);
//! # Ok::<(), cilshrink::Error>(())
//! ```

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    assembly::Operand,
    metadata::{
        assembly::Assembly,
        field::FieldDef,
        method::MethodDef,
        signatures::{FieldRef, MethodRef, TypeRefSig, TypeSig},
        token::{TableId, Token},
        typesystem::TypeDef,
    },
    Error::{AssemblyNotFound, FieldNotFound, MethodNotFound, RecursionLimit, TypeInsert, TypeNotFound},
    Result,
};

/// Upper bound for inheritance chain walks; deeper chains are treated as cyclic metadata
const MAX_INHERITANCE_DEPTH: usize = 256;

fn row_of(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

/// Arena of all definitions taking part in a link.
#[derive(Debug, Default)]
pub struct Program {
    assemblies: Vec<Assembly>,
    types: Vec<TypeDef>,
    methods: Vec<MethodDef>,
    fields: Vec<FieldDef>,
    /// Owner type of every `InterfaceImpl` row
    interface_impls: Vec<Token>,
    assembly_names: FxHashMap<String, Token>,
    type_names: FxHashMap<(Token, String), Token>,
}

impl Program {
    /// Creates an empty program
    pub fn new() -> Self {
        Program::default()
    }

    /// Adds an assembly, or returns the token of the existing one with the same name
    pub fn add_assembly(&mut self, name: &str) -> Token {
        if let Some(token) = self.assembly_names.get(name) {
            return *token;
        }
        let token = Token::from_parts(TableId::Assembly, row_of(self.assemblies.len()));
        self.assemblies.push(Assembly {
            token,
            name: name.to_string(),
            entry_point: None,
            references: Vec::new(),
            types: Vec::new(),
        });
        self.assembly_names.insert(name.to_string(), token);
        token
    }

    /// Sets the entry point of an assembly
    ///
    /// # Errors
    /// Returns an error if either token is unknown.
    pub fn set_entry_point(&mut self, assembly: Token, method: Token) -> Result<()> {
        self.method(method)?;
        self.assembly_mut(assembly)?.entry_point = Some(method);
        Ok(())
    }

    /// Inserts a top-level type into `assembly`.
    ///
    /// Interface implementation records receive their tokens here.
    ///
    /// # Errors
    /// Returns [`crate::Error::AssemblyNotFound`] for an unknown assembly and
    /// [`crate::Error::TypeInsert`] if the assembly already defines the full name.
    pub fn add_type(&mut self, assembly: Token, mut def: TypeDef) -> Result<Token> {
        self.assembly(assembly)?;
        def.namespace_path = def.namespace.clone();
        def.enclosing.clear();
        def.declaring_type = None;

        let token = self.insert_type(assembly, def)?;
        self.assembly_mut(assembly)?.types.push(token);
        Ok(token)
    }

    /// Inserts `def` as a nested type of `outer`; its namespace is cleared.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] for an unknown outer type and
    /// [`crate::Error::TypeInsert`] if the nested full name already exists.
    pub fn add_nested_type(&mut self, outer: Token, mut def: TypeDef) -> Result<Token> {
        let outer_def = self.type_def(outer)?;
        let assembly = outer_def.assembly;
        def.namespace = String::new();
        def.namespace_path = outer_def.namespace_path.clone();
        def.enclosing = outer_def.enclosing.clone();
        def.enclosing.push(outer_def.name.clone());
        def.declaring_type = Some(outer);

        let token = self.insert_type(assembly, def)?;
        self.type_def_mut(outer)?.nested_types.push(token);
        Ok(token)
    }

    fn insert_type(&mut self, assembly: Token, mut def: TypeDef) -> Result<Token> {
        let fullname = def.fullname();
        if self.type_names.contains_key(&(assembly, fullname.clone())) {
            return Err(TypeInsert(fullname));
        }

        let token = Token::from_parts(TableId::TypeDef, row_of(self.types.len()));
        def.token = token;
        def.assembly = assembly;
        for interface in &mut def.interfaces {
            interface.token =
                Token::from_parts(TableId::InterfaceImpl, row_of(self.interface_impls.len()));
            self.interface_impls.push(token);
        }

        // Members are attached through add_method / add_field / add_nested_type
        def.methods.clear();
        def.fields.clear();
        def.nested_types.clear();
        self.types.push(def);
        self.type_names.insert((assembly, fullname), token);
        Ok(token)
    }

    /// Appends a method to a type
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] for an unknown type.
    pub fn add_method(&mut self, type_token: Token, mut method: MethodDef) -> Result<Token> {
        self.type_def(type_token)?;
        let token = Token::from_parts(TableId::MethodDef, row_of(self.methods.len()));
        method.token = token;
        method.declaring_type = type_token;
        self.methods.push(method);
        self.type_def_mut(type_token)?.methods.push(token);
        Ok(token)
    }

    /// Appends a field to a type
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] for an unknown type.
    pub fn add_field(&mut self, type_token: Token, mut field: FieldDef) -> Result<Token> {
        self.type_def(type_token)?;
        let token = Token::from_parts(TableId::Field, row_of(self.fields.len()));
        field.token = token;
        field.declaring_type = type_token;
        self.fields.push(field);
        self.type_def_mut(type_token)?.fields.push(token);
        Ok(token)
    }

    /// Get an assembly by token
    ///
    /// # Errors
    /// Returns [`crate::Error::AssemblyNotFound`] if the token is not a known assembly.
    pub fn assembly(&self, token: Token) -> Result<&Assembly> {
        if !token.is_table(TableId::Assembly) {
            return Err(AssemblyNotFound(token));
        }
        self.assemblies.get(token.index()).ok_or(AssemblyNotFound(token))
    }

    fn assembly_mut(&mut self, token: Token) -> Result<&mut Assembly> {
        if !token.is_table(TableId::Assembly) {
            return Err(AssemblyNotFound(token));
        }
        self.assemblies
            .get_mut(token.index())
            .ok_or(AssemblyNotFound(token))
    }

    /// Look up an assembly by simple name
    #[must_use]
    pub fn assembly_by_name(&self, name: &str) -> Option<&Assembly> {
        self.assembly_names
            .get(name)
            .and_then(|token| self.assemblies.get(token.index()))
    }

    /// All assemblies in insertion order
    pub fn assemblies(&self) -> impl Iterator<Item = &Assembly> {
        self.assemblies.iter()
    }

    /// Get a type definition by token
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] if the token is not a known type.
    pub fn type_def(&self, token: Token) -> Result<&TypeDef> {
        if !token.is_table(TableId::TypeDef) {
            return Err(TypeNotFound(token));
        }
        self.types.get(token.index()).ok_or(TypeNotFound(token))
    }

    /// Get a mutable type definition by token
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] if the token is not a known type.
    pub fn type_def_mut(&mut self, token: Token) -> Result<&mut TypeDef> {
        if !token.is_table(TableId::TypeDef) {
            return Err(TypeNotFound(token));
        }
        self.types.get_mut(token.index()).ok_or(TypeNotFound(token))
    }

    /// Get a method definition by token
    ///
    /// # Errors
    /// Returns [`crate::Error::MethodNotFound`] if the token is not a known method.
    pub fn method(&self, token: Token) -> Result<&MethodDef> {
        if !token.is_table(TableId::MethodDef) {
            return Err(MethodNotFound(token));
        }
        self.methods.get(token.index()).ok_or(MethodNotFound(token))
    }

    /// Get a mutable method definition by token
    ///
    /// # Errors
    /// Returns [`crate::Error::MethodNotFound`] if the token is not a known method.
    pub fn method_mut(&mut self, token: Token) -> Result<&mut MethodDef> {
        if !token.is_table(TableId::MethodDef) {
            return Err(MethodNotFound(token));
        }
        self.methods.get_mut(token.index()).ok_or(MethodNotFound(token))
    }

    /// Get a field definition by token
    ///
    /// # Errors
    /// Returns [`crate::Error::FieldNotFound`] if the token is not a known field.
    pub fn field(&self, token: Token) -> Result<&FieldDef> {
        if !token.is_table(TableId::Field) {
            return Err(FieldNotFound(token));
        }
        self.fields.get(token.index()).ok_or(FieldNotFound(token))
    }

    /// All type definitions
    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.iter()
    }

    /// All method definitions
    pub fn methods(&self) -> impl Iterator<Item = &MethodDef> {
        self.methods.iter()
    }

    /// All field definitions
    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter()
    }

    /// Type owning an `InterfaceImpl` record
    #[must_use]
    pub fn interface_impl_owner(&self, token: Token) -> Option<Token> {
        if !token.is_table(TableId::InterfaceImpl) {
            return None;
        }
        self.interface_impls.get(token.index()).copied()
    }

    /// Every type of an assembly, nested types following their enclosing type
    ///
    /// # Errors
    /// Returns an error if the assembly is unknown.
    pub fn assembly_types(&self, assembly: Token) -> Result<Vec<Token>> {
        let mut pending: Vec<Token> = self.assembly(assembly)?.types.iter().rev().copied().collect();
        let mut all = Vec::new();
        while let Some(token) = pending.pop() {
            all.push(token);
            pending.extend(self.type_def(token)?.nested_types.iter().rev().copied());
        }
        Ok(all)
    }

    /// Simple name of the assembly defining a type
    ///
    /// # Errors
    /// Returns an error if the type is unknown.
    pub fn assembly_name_of(&self, type_token: Token) -> Result<&str> {
        let assembly = self.type_def(type_token)?.assembly;
        Ok(self.assembly(assembly)?.name.as_str())
    }

    /// Finds a type by assembly name and full name (`Ns.Outer/Inner`)
    #[must_use]
    pub fn find_type(&self, assembly: &str, fullname: &str) -> Option<Token> {
        let assembly = *self.assembly_names.get(assembly)?;
        self.type_names
            .get(&(assembly, fullname.to_string()))
            .copied()
    }

    /// Methods of a type with the given name, in declaration order
    ///
    /// # Errors
    /// Returns an error if the type is unknown.
    pub fn methods_named(&self, type_token: Token, name: &str) -> Result<Vec<Token>> {
        let def = self.type_def(type_token)?;
        let mut found = Vec::new();
        for method in &def.methods {
            if self.method(*method)?.name == name {
                found.push(*method);
            }
        }
        Ok(found)
    }

    /// Field of a type with the given name
    ///
    /// # Errors
    /// Returns an error if the type is unknown.
    pub fn field_named(&self, type_token: Token, name: &str) -> Result<Option<Token>> {
        let def = self.type_def(type_token)?;
        for field in &def.fields {
            if self.field(*field)?.name == name {
                return Ok(Some(*field));
            }
        }
        Ok(None)
    }

    /// Nested type of `outer` with the given simple name
    ///
    /// # Errors
    /// Returns an error if the type is unknown.
    pub fn nested_type_named(&self, outer: Token, name: &str) -> Result<Option<Token>> {
        let def = self.type_def(outer)?;
        for nested in &def.nested_types {
            if self.type_def(*nested)?.name == name {
                return Ok(Some(*nested));
            }
        }
        Ok(None)
    }

    /// Resolves a type signature to its definition.
    ///
    /// Arrays and by-refs resolve to their element type, generic instantiations to the
    /// open definition. Generic parameters and types outside the program do not resolve.
    #[must_use]
    pub fn resolve_type(&self, sig: &TypeSig) -> Option<Token> {
        match sig.element_type() {
            TypeSig::Named(named) => self.find_type(&named.scope, &named.fullname()),
            _ => None,
        }
    }

    /// Resolves a method reference, searching the declaring type and then its ancestors.
    ///
    /// A candidate matches on name, generic arity, and positional parameter and return
    /// type names.
    #[must_use]
    pub fn resolve_method(&self, reference: &MethodRef) -> Option<Token> {
        let mut current = self.resolve_type(&reference.declaring_type);
        let mut depth = 0;
        while let Some(type_token) = current {
            let def = self.type_def(type_token).ok()?;
            for method_token in &def.methods {
                let method = self.method(*method_token).ok()?;
                if Self::method_matches(method, reference) {
                    return Some(*method_token);
                }
            }

            depth += 1;
            if depth > MAX_INHERITANCE_DEPTH {
                return None;
            }
            current = def.base.as_ref().and_then(|base| self.resolve_type(base));
        }
        None
    }

    fn method_matches(method: &MethodDef, reference: &MethodRef) -> bool {
        method.name == reference.name
            && method.generic_params.len() == reference.generic_arity
            && method.params.len() == reference.params.len()
            && method.return_type.fullname() == reference.return_type.fullname()
            && method
                .param_types()
                .zip(&reference.params)
                .all(|(a, b)| a.fullname() == b.fullname())
    }

    /// Resolves a field reference, searching the declaring type and then its ancestors
    #[must_use]
    pub fn resolve_field(&self, reference: &FieldRef) -> Option<Token> {
        let mut current = self.resolve_type(&reference.declaring_type);
        let mut depth = 0;
        while let Some(type_token) = current {
            if let Ok(Some(field)) = self.field_named(type_token, &reference.name) {
                return Some(field);
            }
            depth += 1;
            if depth > MAX_INHERITANCE_DEPTH {
                return None;
            }
            current = self
                .type_def(type_token)
                .ok()?
                .base
                .as_ref()
                .and_then(|base| self.resolve_type(base));
        }
        None
    }

    /// Signature naming a type definition
    ///
    /// # Errors
    /// Returns an error if the type or its assembly is unknown.
    pub fn type_sig(&self, type_token: Token) -> Result<TypeSig> {
        let def = self.type_def(type_token)?;
        let scope = &self.assembly(def.assembly)?.name;
        Ok(def.to_sig(scope))
    }

    /// Reference to a method definition, declared on its open declaring type
    ///
    /// # Errors
    /// Returns an error if the method or its declaring type is unknown.
    pub fn method_ref(&self, method_token: Token) -> Result<MethodRef> {
        let method = self.method(method_token)?;
        Ok(MethodRef {
            declaring_type: self.type_sig(method.declaring_type)?,
            name: method.name.clone(),
            return_type: method.return_type.clone(),
            params: method.param_types().cloned().collect(),
            generic_arity: method.generic_params.len(),
            has_this: !method.is_static(),
        })
    }

    /// Reference to a field definition
    ///
    /// # Errors
    /// Returns an error if the field or its declaring type is unknown.
    pub fn field_ref(&self, field_token: Token) -> Result<FieldRef> {
        let field = self.field(field_token)?;
        Ok(FieldRef {
            declaring_type: self.type_sig(field.declaring_type)?,
            name: field.name.clone(),
            field_type: field.field_type.clone(),
        })
    }

    /// Resolvable ancestors of a type, nearest first.
    ///
    /// The walk stops at the first base type that does not resolve.
    ///
    /// # Errors
    /// Returns [`crate::Error::RecursionLimit`] for chains deeper than the supported
    /// bound, which includes cyclic inheritance.
    pub fn base_types(&self, type_token: Token) -> Result<Vec<Token>> {
        let mut bases = Vec::new();
        let mut current = self.type_def(type_token)?;
        while let Some(base) = current.base.as_ref().and_then(|b| self.resolve_type(b)) {
            if bases.len() >= MAX_INHERITANCE_DEPTH {
                return Err(RecursionLimit(MAX_INHERITANCE_DEPTH));
            }
            bases.push(base);
            current = self.type_def(base)?;
        }
        Ok(bases)
    }

    /// Returns true if the type or one of its ancestors has the given full name
    ///
    /// # Errors
    /// Returns an error on cyclic or too deep inheritance.
    pub fn is_subclass_of(&self, type_token: Token, fullname: &str) -> Result<bool> {
        if self.type_def(type_token)?.fullname() == fullname {
            return Ok(true);
        }
        for base in self.base_types(type_token)? {
            if self.type_def(base)?.fullname() == fullname {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Returns true if the type, one of its ancestors, or one of the interfaces they
    /// implement (transitively) implements the interface with the given full name.
    ///
    /// Interface references that do not resolve still match by name.
    ///
    /// # Errors
    /// Returns an error on cyclic or too deep inheritance.
    pub fn implements(&self, type_token: Token, interface: &str) -> Result<bool> {
        let mut pending = vec![type_token];
        pending.extend(self.base_types(type_token)?);
        let mut visited = FxHashSet::default();

        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }
            for record in &self.type_def(current)?.interfaces {
                if Self::open_fullname(&record.interface) == interface {
                    return Ok(true);
                }
                if let Some(resolved) = self.resolve_type(&record.interface) {
                    pending.push(resolved);
                }
            }
        }
        Ok(false)
    }

    fn open_fullname(sig: &TypeSig) -> String {
        match sig {
            TypeSig::Named(named) => named.fullname(),
            other => other.fullname(),
        }
    }

    /// Imports a type reference into `assembly`, recording every foreign scope it
    /// mentions as an assembly reference. Generic parameters pass through unchanged.
    ///
    /// # Errors
    /// Returns an error if the assembly is unknown.
    pub fn import_type(&mut self, assembly: Token, sig: &TypeSig) -> Result<TypeSig> {
        let mut scopes = Vec::new();
        sig.walk(&mut |s| {
            if let TypeSig::Named(named) = s {
                scopes.push(named.scope.clone());
            }
        });
        self.add_references(assembly, scopes)?;
        Ok(sig.clone())
    }

    /// Imports a method reference into `assembly`, see [`Program::import_type`]
    ///
    /// # Errors
    /// Returns an error if the assembly is unknown.
    pub fn import_method(&mut self, assembly: Token, reference: &MethodRef) -> Result<MethodRef> {
        self.import_type(assembly, &reference.declaring_type)?;
        self.import_type(assembly, &reference.return_type)?;
        for param in &reference.params {
            self.import_type(assembly, param)?;
        }
        Ok(reference.clone())
    }

    fn add_references(&mut self, assembly: Token, scopes: Vec<String>) -> Result<()> {
        let target = self.assembly_mut(assembly)?;
        for scope in scopes {
            if scope != target.name && !target.references.contains(&scope) {
                target.references.push(scope);
            }
        }
        Ok(())
    }

    /// Distinct foreign types an assembly refers to, as open (non-instantiated) references.
    ///
    /// Covers base types, interfaces, custom attributes, member signatures, overrides,
    /// locals and instruction operands.
    ///
    /// # Errors
    /// Returns an error if the assembly is unknown.
    pub fn type_references(&self, assembly: Token) -> Result<Vec<TypeRefSig>> {
        let scope = self.assembly(assembly)?.name.clone();
        let mut seen = FxHashSet::default();
        let mut references = Vec::new();

        let mut collect = |sig: &TypeSig| {
            sig.walk(&mut |s| {
                if let TypeSig::Named(named) = s {
                    if named.scope != scope && seen.insert((named.scope.clone(), named.fullname())) {
                        let mut open = named.clone();
                        open.generic_args.clear();
                        references.push(open);
                    }
                }
            });
        };

        for type_token in self.assembly_types(assembly)? {
            let def = self.type_def(type_token)?;
            def.base.iter().for_each(&mut collect);
            def.interfaces.iter().for_each(|i| collect(&i.interface));
            def.custom_attributes
                .iter()
                .for_each(|a| collect(&a.attribute_type));

            for field in &def.fields {
                collect(&self.field(*field)?.field_type);
            }
            for method_token in &def.methods {
                let method = self.method(*method_token)?;
                collect(&method.return_type);
                method.param_types().for_each(&mut collect);
                method
                    .custom_attributes
                    .iter()
                    .for_each(|a| collect(&a.attribute_type));
                for target in &method.overrides {
                    Self::collect_method_types(target, &mut collect);
                }
                if let Some(body) = &method.body {
                    body.variables.iter().for_each(&mut collect);
                    for instruction in &body.instructions {
                        match &instruction.operand {
                            Operand::Type(sig) => collect(sig),
                            Operand::Method(target) => Self::collect_method_types(target, &mut collect),
                            Operand::Field(target) => {
                                collect(&target.declaring_type);
                                collect(&target.field_type);
                            }
                            _ => {}
                        }
                    }
                }
            }
        }
        Ok(references)
    }

    fn collect_method_types(reference: &MethodRef, collect: &mut impl FnMut(&TypeSig)) {
        collect(&reference.declaring_type);
        collect(&reference.return_type);
        reference.params.iter().for_each(collect);
    }

    /// Returns true if the assembly refers to a foreign type with the given full name
    ///
    /// # Errors
    /// Returns an error if the assembly is unknown.
    pub fn has_type_reference(&self, assembly: Token, fullname: &str) -> Result<bool> {
        Ok(self
            .type_references(assembly)?
            .iter()
            .any(|r| r.fullname() == fullname))
    }

    /// Method references of an assembly that point outside of it or at generic
    /// instantiations, from instruction operands and explicit overrides.
    ///
    /// # Errors
    /// Returns an error if the assembly is unknown.
    pub fn method_references(&self, assembly: Token) -> Result<Vec<&MethodRef>> {
        let scope = self.assembly(assembly)?.name.as_str();
        let is_member_ref = |reference: &MethodRef| {
            reference.declaring_type.scope() != Some(scope)
                || reference.declaring_type.is_generic_instance()
        };

        let mut references = Vec::new();
        for type_token in self.assembly_types(assembly)? {
            for method_token in &self.type_def(type_token)?.methods {
                let method = self.method(*method_token)?;
                references.extend(method.overrides.iter().filter(|r| is_member_ref(*r)));
                if let Some(body) = &method.body {
                    references.extend(
                        body.instructions
                            .iter()
                            .filter_map(|i| i.method_ref())
                            .filter(|r| is_member_ref(*r)),
                    );
                }
            }
        }
        Ok(references)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assembly::{Instruction, OpCode},
        metadata::{
            method::{MethodBody, MethodDef, INTERFACE_METHOD_FLAGS},
            typesystem::TypeBuilder,
        },
        Error,
    };

    fn void() -> TypeSig {
        TypeSig::named("mscorlib", "System", "Void")
    }

    #[test]
    fn test_tokens_and_lookup() {
        let mut program = Program::new();
        let asm = program.add_assembly("App");
        assert_eq!(program.add_assembly("App"), asm);
        assert_eq!(asm.table_id(), Some(TableId::Assembly));

        let outer = TypeBuilder::class("App", "Outer").build(&mut program, asm).unwrap();
        let inner = TypeBuilder::nested("Inner")
            .method(MethodDef::new("Run", 0, void()))
            .build_nested(&mut program, outer)
            .unwrap();

        assert_eq!(program.type_def(inner).unwrap().fullname(), "App.Outer/Inner");
        assert_eq!(program.type_def(inner).unwrap().namespace, "");
        assert_eq!(program.find_type("App", "App.Outer/Inner"), Some(inner));
        assert_eq!(program.assembly_types(asm).unwrap(), vec![outer, inner]);
        assert_eq!(program.methods_named(inner, "Run").unwrap().len(), 1);

        let duplicate = TypeBuilder::class("App", "Outer").build(&mut program, asm);
        assert!(matches!(duplicate, Err(Error::TypeInsert(_))));
        assert!(matches!(program.type_def(asm), Err(Error::TypeNotFound(_))));
    }

    #[test]
    fn test_resolve_type_strips_layers() {
        let mut program = Program::new();
        let corlib = program.add_assembly("mscorlib");
        let list = TypeBuilder::class("System.Collections.Generic", "List`1")
            .generic_param("T")
            .build(&mut program, corlib)
            .unwrap();

        let instance = TypeSig::named("mscorlib", "System.Collections.Generic", "List`1")
            .instantiate(vec![TypeSig::type_param(0, "T")])
            .array();
        assert_eq!(program.resolve_type(&instance), Some(list));
        assert_eq!(program.resolve_type(&TypeSig::type_param(0, "T")), None);
        assert_eq!(
            program.resolve_type(&TypeSig::named("Other", "System.Collections.Generic", "List`1")),
            None
        );
    }

    #[test]
    fn test_resolve_method_walks_bases() {
        let mut program = Program::new();
        let asm = program.add_assembly("App");
        let base = TypeBuilder::class("App", "Base")
            .method(MethodDef::new("Run", 0, void()).with_body(MethodBody::new()))
            .build(&mut program, asm)
            .unwrap();
        TypeBuilder::class("App", "Derived")
            .extends(TypeSig::named("App", "App", "Base"))
            .build(&mut program, asm)
            .unwrap();

        let reference = MethodRef::new(TypeSig::named("App", "App", "Derived"), "Run", void());
        let run = program.methods_named(base, "Run").unwrap()[0];
        assert_eq!(program.resolve_method(&reference), Some(run));

        let wrong_arity = reference.clone().with_param(void());
        assert_eq!(program.resolve_method(&wrong_arity), None);
    }

    #[test]
    fn test_cyclic_inheritance_hits_limit() {
        let mut program = Program::new();
        let asm = program.add_assembly("App");
        TypeBuilder::class("App", "A")
            .extends(TypeSig::named("App", "App", "B"))
            .build(&mut program, asm)
            .unwrap();
        let b = TypeBuilder::class("App", "B")
            .extends(TypeSig::named("App", "App", "A"))
            .build(&mut program, asm)
            .unwrap();

        assert!(matches!(program.base_types(b), Err(Error::RecursionLimit(_))));
    }

    #[test]
    fn test_implements_through_interface_inheritance() {
        let mut program = Program::new();
        let android = program.add_assembly("Mono.Android");
        TypeBuilder::interface("Android.Runtime", "IJavaObject")
            .build(&mut program, android)
            .unwrap();
        let listener = TypeBuilder::interface("Android.Views", "IOnClickListener")
            .implements(TypeSig::named("Mono.Android", "Android.Runtime", "IJavaObject"))
            .build(&mut program, android)
            .unwrap();
        let plain = TypeBuilder::interface("Android.Views", "IPlain")
            .build(&mut program, android)
            .unwrap();

        assert!(program.implements(listener, "Android.Runtime.IJavaObject").unwrap());
        assert!(!program.implements(plain, "Android.Runtime.IJavaObject").unwrap());
    }

    #[test]
    fn test_import_and_references() {
        let mut program = Program::new();
        let app = program.add_assembly("App");
        let app_domain = TypeSig::named("mscorlib", "System", "AppDomain");
        let create = MethodRef::new(app_domain.clone(), "CreateDomain", app_domain)
            .with_param(TypeSig::named("mscorlib", "System", "String"))
            .static_method();

        let body = MethodBody::from_instructions(vec![
            Instruction::new(OpCode::Call, Operand::Method(create.clone())),
            Instruction::simple(OpCode::Ret),
        ]);
        TypeBuilder::class("App", "Main")
            .method(MethodDef::new("Run", 0, TypeSig::named("mscorlib", "System", "Void")).with_body(body))
            .build(&mut program, app)
            .unwrap();

        program.import_method(app, &create).unwrap();
        assert!(program.assembly(app).unwrap().references_assembly("mscorlib"));
        assert!(program.has_type_reference(app, "System.AppDomain").unwrap());
        assert!(!program.has_type_reference(app, "App.Main").unwrap());

        let references = program.method_references(app).unwrap();
        assert_eq!(references.len(), 1);
        assert!(references[0]
            .to_string()
            .contains("System.AppDomain System.AppDomain::CreateDomain"));
    }

    #[test]
    fn test_method_ref_round_trip_resolves() {
        let mut program = Program::new();
        let android = program.add_assembly("Mono.Android");
        let error = TypeBuilder::class("Java.Lang", "AbstractMethodError")
            .method(MethodDef::new(".ctor", 0, void()).with_body(MethodBody::new()))
            .method(MethodDef::new("Speak", INTERFACE_METHOD_FLAGS, void()))
            .build(&mut program, android)
            .unwrap();

        for method in program.type_def(error).unwrap().methods.clone() {
            let reference = program.method_ref(method).unwrap();
            assert_eq!(program.resolve_method(&reference), Some(method));
        }
    }
}

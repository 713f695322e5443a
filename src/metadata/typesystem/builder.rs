//! Builder for type definitions.
//!
//! [`TypeBuilder`] collects a type with its interfaces, methods and fields and inserts it
//! into a [`Program`] in one step, assigning every token along the way.

use crate::{
    metadata::{
        customattributes::CustomAttribute,
        field::FieldDef,
        method::MethodDef,
        program::Program,
        signatures::TypeSig,
        token::Token,
        typesystem::{InterfaceImpl, TypeAttributes, TypeDef},
    },
    Result,
};

/// Provides a fluent API for building type definitions
pub struct TypeBuilder {
    /// Type being built
    def: TypeDef,
    /// Methods to add after the type is inserted
    methods: Vec<MethodDef>,
    /// Fields to add after the type is inserted
    fields: Vec<FieldDef>,
}

impl TypeBuilder {
    /// Start building a public class
    ///
    /// ## Arguments
    /// * 'namespace' - Namespace of the type
    /// * 'name' - Simple name of the type
    pub fn class(namespace: &str, name: &str) -> Self {
        TypeBuilder {
            def: TypeDef::new(namespace, name, TypeAttributes::PUBLIC),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Start building a public interface
    ///
    /// ## Arguments
    /// * 'namespace' - Namespace of the type
    /// * 'name' - Simple name of the type
    pub fn interface(namespace: &str, name: &str) -> Self {
        TypeBuilder {
            def: TypeDef::new(
                namespace,
                name,
                TypeAttributes::PUBLIC | TypeAttributes::INTERFACE | TypeAttributes::ABSTRACT,
            ),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Start building a nested public class; insert it with [`TypeBuilder::build_nested`]
    ///
    /// ## Arguments
    /// * 'name' - Simple name of the type
    pub fn nested(name: &str) -> Self {
        TypeBuilder {
            def: TypeDef::new("", name, TypeAttributes::NESTED_PUBLIC),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Replace the type attributes
    #[must_use]
    pub fn flags(mut self, flags: u32) -> Self {
        self.def.flags = flags;
        self
    }

    /// Add `ABSTRACT` to the type attributes
    #[must_use]
    pub fn abstract_type(mut self) -> Self {
        self.def.flags |= TypeAttributes::ABSTRACT;
        self
    }

    /// Set the base type
    #[must_use]
    pub fn extends(mut self, base: TypeSig) -> Self {
        self.def.base = Some(base);
        self
    }

    /// Add an implemented interface
    #[must_use]
    pub fn implements(mut self, interface: TypeSig) -> Self {
        self.def.interfaces.push(InterfaceImpl {
            token: Token::new(0),
            interface,
        });
        self
    }

    /// Add a generic parameter
    #[must_use]
    pub fn generic_param(mut self, name: &str) -> Self {
        self.def.generic_params.push(name.to_string());
        self
    }

    /// Add a custom attribute
    #[must_use]
    pub fn attribute(mut self, attribute: CustomAttribute) -> Self {
        self.def.custom_attributes.push(attribute);
        self
    }

    /// Add a method
    #[must_use]
    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    /// Add a field
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Insert the type as a top-level type of `assembly`
    ///
    /// # Errors
    /// Returns an error if the assembly does not exist or already defines the type.
    pub fn build(self, program: &mut Program, assembly: Token) -> Result<Token> {
        let token = program.add_type(assembly, self.def)?;
        Self::add_members(program, token, self.methods, self.fields)?;
        Ok(token)
    }

    /// Insert the type as a nested type of `outer`
    ///
    /// # Errors
    /// Returns an error if `outer` does not exist or already contains the type.
    pub fn build_nested(self, program: &mut Program, outer: Token) -> Result<Token> {
        let token = program.add_nested_type(outer, self.def)?;
        Self::add_members(program, token, self.methods, self.fields)?;
        Ok(token)
    }

    fn add_members(
        program: &mut Program,
        token: Token,
        methods: Vec<MethodDef>,
        fields: Vec<FieldDef>,
    ) -> Result<()> {
        for method in methods {
            program.add_method(token, method)?;
        }
        for field in fields {
            program.add_field(token, field)?;
        }
        Ok(())
    }
}

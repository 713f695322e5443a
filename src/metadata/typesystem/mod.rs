//! Type definitions of the program model.
//!
//! A [`TypeDef`] owns the tokens of its methods, fields and nested types; the definitions
//! themselves live in the [`crate::metadata::program::Program`] arena. Base types and
//! implemented interfaces are kept as signatures ([`TypeSig`]) since they may point into
//! other assemblies, or at generic instantiations, and are resolved on demand.
//!
//! # Key Components
//!
//! - [`TypeDef`]: Type definition
//! - [`InterfaceImpl`]: Interface implementation record, annotated independently
//! - [`TypeAttributes`]: `TypeAttributes` flag constants
//! - [`TypeBuilder`]: Fluent construction of a type with its members
//!
//! # Examples
//!
//! ```rust
//! use cilshrink::metadata::program::Program;
//! use cilshrink::metadata::typesystem::{TypeAttributes, TypeBuilder};
//!
//! let mut program = Program::new();
//! let app = program.add_assembly("App");
//! let dog = TypeBuilder::class("App", "Dog")
//!     .flags(TypeAttributes::PUBLIC)
//!     .build(&mut program, app)?;
//! assert_eq!(program.type_def(dog)?.fullname(), "App.Dog");
//! # Ok::<(), cilshrink::Error>(())
//! ```

mod builder;

pub use builder::TypeBuilder;

use crate::metadata::{customattributes::CustomAttribute, signatures::TypeSig, token::Token};

#[allow(non_snake_case)]
/// All `TypeAttributes` flags the linker inspects
pub mod TypeAttributes {
    /// Mask for extracting type visibility information
    pub const VISIBILITY_MASK: u32 = 0x0000_0007;
    /// Type has no public scope
    pub const NOT_PUBLIC: u32 = 0x0000_0000;
    /// Type has public scope
    pub const PUBLIC: u32 = 0x0000_0001;
    /// Nested type with public visibility
    pub const NESTED_PUBLIC: u32 = 0x0000_0002;
    /// Nested type with private visibility
    pub const NESTED_PRIVATE: u32 = 0x0000_0003;
    /// Mask for class semantics
    pub const CLASS_SEMANTICS_MASK: u32 = 0x0000_0020;
    /// Type is a class
    pub const CLASS: u32 = 0x0000_0000;
    /// Type is an interface
    pub const INTERFACE: u32 = 0x0000_0020;
    /// Type cannot be instantiated
    pub const ABSTRACT: u32 = 0x0000_0080;
    /// Type cannot be derived from
    pub const SEALED: u32 = 0x0000_0100;
    /// Name has special meaning to tools
    pub const SPECIAL_NAME: u32 = 0x0000_0400;
    /// Type is imported from a COM type library
    pub const IMPORT: u32 = 0x0000_1000;
    /// Type can be serialized
    pub const SERIALIZABLE: u32 = 0x0000_2000;
    /// Initialize the type at first static field access
    pub const BEFORE_FIELD_INIT: u32 = 0x0010_0000;
}

/// Interface implementation record of a type.
///
/// Carries its own `InterfaceImpl` token so that reachability can keep or drop the record
/// independently of the interface type.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceImpl {
    /// `InterfaceImpl` token, null until added to a program
    pub token: Token,
    /// The implemented interface
    pub interface: TypeSig,
}

/// A type definition.
#[derive(Debug, Clone)]
pub struct TypeDef {
    /// `TypeDef` token, null until added to a program
    pub token: Token,
    /// Token of the owning assembly
    pub assembly: Token,
    /// Namespace; empty for nested types
    pub namespace: String,
    /// Simple name, including the generic arity suffix
    pub name: String,
    /// Raw `TypeAttributes`
    pub flags: u32,
    /// Base type, `None` for interfaces and `System.Object`
    pub base: Option<TypeSig>,
    /// Enclosing type of a nested type
    pub declaring_type: Option<Token>,
    /// Implemented interfaces
    pub interfaces: Vec<InterfaceImpl>,
    /// Methods in declaration order
    pub methods: Vec<Token>,
    /// Fields in declaration order
    pub fields: Vec<Token>,
    /// Directly nested types
    pub nested_types: Vec<Token>,
    /// Names of the type's generic parameters
    pub generic_params: Vec<String>,
    /// Custom attributes applied to the type
    pub custom_attributes: Vec<CustomAttribute>,
    pub(crate) namespace_path: String,
    pub(crate) enclosing: Vec<String>,
}

impl TypeDef {
    /// Creates a detached type definition
    pub fn new(namespace: &str, name: &str, flags: u32) -> Self {
        TypeDef {
            token: Token::new(0),
            assembly: Token::new(0),
            namespace: namespace.to_string(),
            name: name.to_string(),
            flags,
            base: None,
            declaring_type: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            nested_types: Vec::new(),
            generic_params: Vec::new(),
            custom_attributes: Vec::new(),
            namespace_path: namespace.to_string(),
            enclosing: Vec::new(),
        }
    }

    /// Full metadata name; nested types use `/` (`Ns.Outer/Inner`)
    #[must_use]
    pub fn fullname(&self) -> String {
        let mut name = String::new();
        if !self.namespace_path.is_empty() {
            name.push_str(&self.namespace_path);
            name.push('.');
        }
        for outer in &self.enclosing {
            name.push_str(outer);
            name.push('/');
        }
        name.push_str(&self.name);
        name
    }

    /// Returns true for interfaces
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flags & TypeAttributes::CLASS_SEMANTICS_MASK == TypeAttributes::INTERFACE
    }

    /// Returns true for abstract types (interfaces are abstract as well)
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.flags & TypeAttributes::ABSTRACT != 0
    }

    /// Returns true for nested types
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.declaring_type.is_some()
    }

    /// Returns true for open generic type definitions
    #[must_use]
    pub fn has_generic_params(&self) -> bool {
        !self.generic_params.is_empty()
    }

    /// Signature naming this (open) definition within `scope`
    #[must_use]
    pub fn to_sig(&self, scope: &str) -> TypeSig {
        TypeSig::Named(crate::metadata::signatures::TypeRefSig {
            scope: scope.to_string(),
            namespace: self.namespace_path.clone(),
            enclosing: self.enclosing.clone(),
            name: self.name.clone(),
            generic_args: Vec::new(),
        })
    }
}

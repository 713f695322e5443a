//! Method definitions of the program model.
//!
//! A [`MethodDef`] owns its signature, flags, explicit overrides, custom attributes and,
//! unless abstract, its [`MethodBody`]. Definitions are created detached (token and
//! declaring type unset) and receive both when added to a
//! [`crate::metadata::program::Program`].
//!
//! # Key Components
//! - [`MethodDef`] - Method definition
//! - [`Param`] - Named, typed parameter
//! - [`MethodBody`] - Editable instruction list
//! - [`MethodModifiers`], [`MethodAccessFlags`], [`MethodVtableFlags`] - Attribute flags
//!
//! # Examples
//!
//! ```rust
//! use cilshrink::metadata::method::{MethodDef, INTERFACE_METHOD_FLAGS};
//! use cilshrink::metadata::signatures::TypeSig;
//!
//! let speak = MethodDef::new("Speak", INTERFACE_METHOD_FLAGS, TypeSig::named("mscorlib", "System", "Void"));
//! assert!(speak.is_abstract());
//! assert!(speak.body.is_none());
//! ```

mod body;
mod types;

pub use body::MethodBody;
pub use types::*;

use crate::metadata::{
    customattributes::CustomAttribute,
    signatures::{MethodRef, TypeSig},
    token::Token,
};

/// A method parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub param_type: TypeSig,
}

/// Describes a method definition, including signature, flags and body.
#[derive(Debug, Clone)]
pub struct MethodDef {
    /// `MethodDef` token, null until added to a program
    pub token: Token,
    /// Token of the declaring type, null until added to a program
    pub declaring_type: Token,
    /// Method name
    pub name: String,
    /// Raw `MethodAttributes`
    pub flags: u32,
    /// Return type
    pub return_type: TypeSig,
    /// Parameters in declaration order
    pub params: Vec<Param>,
    /// Names of the method's own generic parameters
    pub generic_params: Vec<String>,
    /// Methods this one explicitly implements (`.override`)
    pub overrides: Vec<MethodRef>,
    /// Method body; `None` for abstract methods
    pub body: Option<MethodBody>,
    /// Custom attributes applied to the method
    pub custom_attributes: Vec<CustomAttribute>,
}

impl MethodDef {
    /// Creates a detached method without parameters or body
    pub fn new(name: &str, flags: u32, return_type: TypeSig) -> Self {
        MethodDef {
            token: Token::new(0),
            declaring_type: Token::new(0),
            name: name.to_string(),
            flags,
            return_type,
            params: Vec::new(),
            generic_params: Vec::new(),
            overrides: Vec::new(),
            body: None,
            custom_attributes: Vec::new(),
        }
    }

    /// Appends a parameter
    #[must_use]
    pub fn with_param(mut self, name: &str, param_type: TypeSig) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            param_type,
        });
        self
    }

    /// Appends a generic parameter
    #[must_use]
    pub fn with_generic_param(mut self, name: &str) -> Self {
        self.generic_params.push(name.to_string());
        self
    }

    /// Records an explicit override
    #[must_use]
    pub fn with_override(mut self, target: MethodRef) -> Self {
        self.overrides.push(target);
        self
    }

    /// Sets the body
    #[must_use]
    pub fn with_body(mut self, body: MethodBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Appends a custom attribute
    #[must_use]
    pub fn with_attribute(mut self, attribute: CustomAttribute) -> Self {
        self.custom_attributes.push(attribute);
        self
    }

    /// Decoded modifier flags
    #[must_use]
    pub fn modifiers(&self) -> MethodModifiers {
        MethodModifiers::from_method_flags(self.flags)
    }

    /// Returns true if the method has no implementation
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.modifiers().contains(MethodModifiers::ABSTRACT)
    }

    /// Returns true if the method is static
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers().contains(MethodModifiers::STATIC)
    }

    /// Returns true if the method is virtual
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.modifiers().contains(MethodModifiers::VIRTUAL)
    }

    /// Returns true for instance and static constructors
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == ".ctor" || self.name == ".cctor"
    }

    /// Returns true for the static constructor
    #[must_use]
    pub fn is_static_constructor(&self) -> bool {
        self.name == ".cctor"
    }

    /// Parameter types in declaration order
    pub fn param_types(&self) -> impl Iterator<Item = &TypeSig> {
        self.params.iter().map(|p| &p.param_type)
    }

    /// The method's generic parameters as signatures (`!!0`, `!!1`, ...)
    #[must_use]
    pub fn generic_param_sigs(&self) -> Vec<TypeSig> {
        self.generic_params
            .iter()
            .enumerate()
            .map(|(position, name)| {
                TypeSig::method_param(u16::try_from(position).unwrap_or(u16::MAX), name)
            })
            .collect()
    }
}

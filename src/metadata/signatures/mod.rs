//! Type and member signatures of the program model.
//!
//! Signatures describe types the way they appear in method parameters, return types,
//! field types, locals and instruction operands. Unlike definitions they are plain values:
//! they name their target by assembly scope and full name and are resolved against a
//! [`crate::metadata::program::Program`] on demand. Resolution may fail, for example when
//! a referenced assembly is not part of the closed program set.
//!
//! # Key Types
//!
//! - [`TypeSig`] - Named, array, by-ref and generic-parameter types
//! - [`TypeRefSig`] - Named type reference with optional generic arguments
//! - [`MethodRef`] - Method reference (declaring type, name, signature)
//! - [`FieldRef`] - Field reference (declaring type, name, type)
//!
//! # Examples
//!
//! ```rust
//! use cilshrink::metadata::signatures::{MethodRef, TypeSig};
//!
//! let object = TypeSig::named("Mono.Android", "Java.Lang", "Object");
//! let void = TypeSig::named("mscorlib", "System", "Void");
//! let ctor = MethodRef::new(object, ".ctor", void);
//! assert_eq!(ctor.to_string(), "System.Void Java.Lang.Object::.ctor()");
//! ```

mod member;
mod types;

pub use member::{FieldRef, MethodRef};
pub use types::{GenericParamKind, GenericParamSig, TypeRefSig, TypeSig};

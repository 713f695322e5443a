//! Structural method signature matching.
//!
//! Decides whether a candidate method satisfies an interface method. The comparison is
//! deliberately asymmetric: a generic parameter on the interface side accepts any type on
//! the candidate side, since it is the interface's open parameter that a concrete
//! implementation instantiates. Type references that cannot be resolved never match.
//!
//! # Examples
//!
//! ```rust
//! use cilshrink::linker::signature::same_type;
//! use cilshrink::metadata::program::Program;
//! use cilshrink::metadata::signatures::TypeSig;
//! use cilshrink::metadata::typesystem::TypeBuilder;
//!
//! let mut program = Program::new();
//! let corlib = program.add_assembly("mscorlib");
//! TypeBuilder::class("System", "String").build(&mut program, corlib)?;
//!
//! let string = TypeSig::named("mscorlib", "System", "String");
//! assert!(same_type(&program, &string, &string));
//! assert!(same_type(&program, &TypeSig::type_param(0, "T"), &string));
//! assert!(!same_type(&program, &string, &TypeSig::type_param(0, "T")));
//! # Ok::<(), cilshrink::Error>(())
//! ```

use crate::metadata::{method::MethodDef, program::Program, signatures::TypeSig};

/// Structural type equivalence, with generic parameters on the left acting as wildcards.
///
/// # Arguments
/// * `program` - Program used to resolve both sides
/// * `iface` - Type as written on the interface method
/// * `candidate` - Type as written on the candidate method
#[must_use]
pub fn same_type(program: &Program, iface: &TypeSig, candidate: &TypeSig) -> bool {
    match (iface, candidate) {
        (TypeSig::GenericParam(_), _) => true,
        (TypeSig::Array(i), TypeSig::Array(c)) | (TypeSig::ByRef(i), TypeSig::ByRef(c)) => {
            same_type(program, i, c)
        }
        (TypeSig::Array(_) | TypeSig::ByRef(_), _) => false,
        (TypeSig::Named(i), TypeSig::Named(c)) => {
            if i.name != c.name || i.namespace != c.namespace || i.enclosing != c.enclosing {
                return false;
            }

            let (Some(i_def), Some(c_def)) =
                (program.resolve_type(iface), program.resolve_type(candidate))
            else {
                return false;
            };
            let (Ok(i_def), Ok(c_def)) = (program.type_def(i_def), program.type_def(c_def)) else {
                return false;
            };
            if i_def.assembly != c_def.assembly {
                return false;
            }

            if i.is_generic_instance() && c.is_generic_instance() {
                if i.generic_args.len() != c.generic_args.len() {
                    return false;
                }
                return i
                    .generic_args
                    .iter()
                    .zip(&c.generic_args)
                    .filter(|(i_arg, _)| !i_arg.is_generic_parameter())
                    .all(|(i_arg, c_arg)| same_type(program, i_arg, c_arg));
            }
            true
        }
        (TypeSig::Named(_), _) => false,
    }
}

/// Returns true if `candidate` explicitly overrides `iface_method`
#[must_use]
pub fn is_in_overrides(program: &Program, iface_method: &MethodDef, candidate: &MethodDef) -> bool {
    candidate
        .overrides
        .iter()
        .any(|target| program.resolve_method(target) == Some(iface_method.token))
}

/// Returns true if `candidate` implements `iface_method`.
///
/// An explicit override always wins. Otherwise name, return type, parameter count,
/// generic parameter count and every parameter and generic parameter must match
/// pairwise under [`same_type`].
///
/// # Arguments
/// * `program` - Program used to resolve signatures
/// * `iface_method` - The (abstract) interface method
/// * `candidate` - A method of the implementing type or one of its ancestors
#[must_use]
pub fn equivalent(program: &Program, iface_method: &MethodDef, candidate: &MethodDef) -> bool {
    if is_in_overrides(program, iface_method, candidate) {
        return true;
    }

    if iface_method.name != candidate.name {
        return false;
    }

    if !same_type(program, &iface_method.return_type, &candidate.return_type) {
        return false;
    }

    if iface_method.params.len() != candidate.params.len()
        || iface_method.generic_params.len() != candidate.generic_params.len()
    {
        return false;
    }

    if !iface_method
        .param_types()
        .zip(candidate.param_types())
        .all(|(i, c)| same_type(program, i, c))
    {
        return false;
    }

    iface_method
        .generic_param_sigs()
        .iter()
        .zip(candidate.generic_param_sigs().iter())
        .all(|(i, c)| same_type(program, i, c))
}

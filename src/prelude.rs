//! # cilshrink Prelude
//!
//! This module provides a convenient prelude for the most commonly used types of the
//! cilshrink library. Import this module to get quick access to the program model and
//! the link pipeline.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all cilshrink operations
pub use crate::Error;

/// The result type used throughout cilshrink
pub use crate::Result;

// ================================================================================================
// Link Pipeline
// ================================================================================================

/// Runs completion and marking over a context
pub use crate::linker::pipeline::{LinkReport, Linker};

/// State shared by every step of a link run
pub use crate::linker::context::LinkContext;

/// Link configuration
pub use crate::linker::config::LinkerConfig;

/// Per-member link decisions
pub use crate::linker::annotations::{Annotations, AssemblyAction, TypePreserve};

/// Individual steps, for callers composing their own pipeline
pub use crate::linker::{completion::AbstractMethodCompleter, mark::MarkStep};

// ================================================================================================
// Program Model
// ================================================================================================

/// Arena of all definitions
pub use crate::metadata::program::Program;

/// Metadata token type for referencing definitions
pub use crate::metadata::token::{TableId, Token};

/// Type definitions
pub use crate::metadata::typesystem::{TypeAttributes, TypeBuilder, TypeDef};

/// Method definitions and bodies
pub use crate::metadata::method::{MethodBody, MethodDef, MethodModifiers, INTERFACE_METHOD_FLAGS};

/// Field definitions
pub use crate::metadata::field::{FieldAttributes, FieldDef};

/// Type, method and field references
pub use crate::metadata::signatures::{FieldRef, MethodRef, TypeSig};

/// Custom attributes
pub use crate::metadata::customattributes::{CustomAttribute, RegisterAttribute};

// ================================================================================================
// Instructions and Diagnostics
// ================================================================================================

/// CIL instructions
pub use crate::assembly::{Instruction, OpCode, Operand};

/// Diagnostics collected during a link run
pub use crate::metadata::diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics,
};

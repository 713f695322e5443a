//! In-memory program model for trimming .NET assemblies.
//!
//! This module contains the definitions the linker operates on: assemblies, types,
//! methods with editable bodies, fields and the signatures connecting them. Reading and
//! writing the binary format is not part of this crate; a loader populates a
//! [`program::Program`] and an emitter consumes it after linking.
//!
//! # Key Components
//!
//! - [`program`] - Arena of all definitions, resolution and hierarchy queries
//! - [`typesystem`] - Type definitions and the [`typesystem::TypeBuilder`]
//! - [`method`] - Method definitions and bodies
//! - [`signatures`] - Type, method and field references
//! - [`customattributes`] - Custom attributes and the bridge registration attribute
//! - [`token`] - Metadata table row references used throughout the model
//! - [`diagnostics`] - Collected informational messages, warnings and errors
//!
//! # Examples
//!
//! ```rust
//! use cilshrink::metadata::{method::MethodDef, program::Program, signatures::TypeSig,
//!     typesystem::TypeBuilder};
//!
//! let mut program = Program::new();
//! let app = program.add_assembly("App");
//! let main = TypeBuilder::class("App", "Program")
//!     .method(MethodDef::new("Main", 0x16, TypeSig::named("mscorlib", "System", "Void")))
//!     .build(&mut program, app)?;
//!
//! println!("Types: {}", program.types().count());
//! println!("Main: {}", program.type_def(main)?.fullname());
//! # Ok::<(), cilshrink::Error>(())
//! ```

/// Assemblies of the program
pub mod assembly;
/// Custom attributes and bridge registration records
pub mod customattributes;
/// Diagnostics collected while linking
pub mod diagnostics;
/// Field definitions
pub mod field;
/// Method definitions and bodies
pub mod method;
/// The arena of all definitions
pub mod program;
/// Type and member references
pub mod signatures;
/// Commonly used metadata token type
pub mod token;
/// Type definitions
pub mod typesystem;

// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]
#![deny(unsafe_code)]

//! # cilshrink
//!
//! Link-time trimming support for .NET applications that talk to a Java runtime through
//! a generated native-object bridge. `cilshrink` operates on an in-memory program model
//! of all assemblies of an application and decides what survives trimming, while
//! keeping alive everything the bridge reaches without a visible managed call.
//!
//! ## Features
//!
//! - **🧩 Abstract-method completion** - Concrete bridge types that miss an interface
//!   method receive a stub throwing `Java.Lang.AbstractMethodError`
//! - **🔍 Reachability marking** - Worklist-driven mark pass with a hook trait for
//!   extra edges
//! - **🌉 Bridge awareness** - Bridge interfaces, registered connectors, marshal thunks
//!   and implicit runtime dependencies stay alive
//! - **⚡ Dispatch-table rewriting** - Registration arrays are trimmed to the surviving
//!   thunks and the type-index dispatcher is regenerated
//! - **📊 Diagnostics** - Informational messages, warnings and recoverable errors are
//!   collected instead of aborting the link
//!
//! ## Quick Start
//!
//! ```rust
//! use cilshrink::prelude::*;
//!
//! let mut program = Program::new();
//! let app = program.add_assembly("App");
//! let main = TypeBuilder::class("App", "Program")
//!     .method(MethodDef::new("Main", 0x16, TypeSig::named("mscorlib", "System", "Void")))
//!     .build(&mut program, app)?;
//! let entry = program.methods_named(main, "Main")?[0];
//! program.set_entry_point(app, entry)?;
//!
//! let mut ctx = LinkContext::new(program, LinkerConfig::default());
//! ctx.annotations.set_action(app, AssemblyAction::Link);
//! let report = Linker::new().run(&mut ctx)?;
//!
//! assert!(ctx.annotations.is_marked(entry));
//! println!("{report}");
//! # Ok::<(), cilshrink::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`prelude`] - Convenient re-exports of commonly used types
//! - [`metadata`] - The program model: assemblies, types, methods, fields, signatures
//! - [`assembly`] - CIL instructions as stored in method bodies
//! - [`linker`] - Completion, marking, dispatch rewriting and the pipeline
//! - [`Error`] and [`Result`] - Error handling
//!
//! Reading and writing the binary assembly format is left to the caller: a loader
//! populates the [`metadata::program::Program`], and after linking an emitter sweeps
//! everything the [`linker::annotations::Annotations`] do not mark.

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use cilshrink::prelude::*;
///
/// let ctx = LinkContext::new(Program::new(), LinkerConfig::default());
/// assert_eq!(ctx.annotations.marked_count(), 0);
/// ```
pub mod prelude;

/// CIL instructions and operands as stored in method bodies
pub mod assembly;

/// Completion, reachability marking and bridge dispatch rewriting
pub mod linker;

/// The program model the linker operates on
pub mod metadata;

/// `cilshrink` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
///
/// # Examples
///
/// ```rust
/// use cilshrink::{prelude::*, Result};
///
/// fn link(program: Program) -> Result<LinkReport> {
///     let mut ctx = LinkContext::new(program, LinkerConfig::default());
///     Linker::new().run(&mut ctx)
/// }
/// # link(Program::new())?;
/// # Ok::<(), cilshrink::Error>(())
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `cilshrink` Error type
///
/// The main error type for all operations in this crate. Only missing foundational
/// dependencies and inconsistent models surface here; everything recoverable is reported
/// through [`metadata::diagnostics::Diagnostics`].
pub use error::Error;

use thiserror::Error;

use crate::metadata::token::Token;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Only a small part of the linker surfaces failures as `Err`. Unresolvable references,
/// malformed registration methods and missing dispatcher prerequisites are recoverable:
/// they are recorded in [`crate::metadata::diagnostics::Diagnostics`] and the affected unit
/// is skipped. What remains here are programming errors against the model (bad tokens,
/// duplicate definitions) and the fatal class of missing foundational dependencies.
///
/// # Error Categories
///
/// ## Model Errors
/// - [`Error::Malformed`] - Inconsistent program model content
/// - [`Error::TypeNotFound`] - A token does not name a type definition
/// - [`Error::MethodNotFound`] - A token does not name a method definition
/// - [`Error::FieldNotFound`] - A token does not name a field definition
/// - [`Error::AssemblyNotFound`] - A token does not name an assembly
/// - [`Error::TypeInsert`] - A type with the same full name already exists
///
/// ## Link Errors
/// - [`Error::MissingDependency`] - A foundational runtime member could not be located
/// - [`Error::RecursionLimit`] - An inheritance chain is deeper than allowed
///
/// # Examples
///
/// ```rust
/// use cilshrink::{Error, prelude::*};
///
/// let mut ctx = LinkContext::new(Program::new(), LinkerConfig::default());
/// match Linker::new().run(&mut ctx) {
///     Ok(report) => println!("{} stub(s) added", report.stubs_added),
///     Err(Error::MissingDependency { member, assembly }) => {
///         eprintln!("{member} missing from {assembly}");
///     }
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The program model is inconsistent.
    ///
    /// Raised when model content violates an invariant the linker relies on, for
    /// example a non-abstract method without a body being asked for its instructions.
    /// The error includes the source location where the problem was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),

    /// The token does not refer to a type definition of the program.
    #[error("Failed to find type in Program - {0}")]
    TypeNotFound(Token),

    /// The token does not refer to a method definition of the program.
    #[error("Failed to find method in Program - {0}")]
    MethodNotFound(Token),

    /// The token does not refer to a field definition of the program.
    #[error("Failed to find field in Program - {0}")]
    FieldNotFound(Token),

    /// The token does not refer to an assembly of the program.
    #[error("Failed to find assembly in Program - {0}")]
    AssemblyNotFound(Token),

    /// Failed to insert a new type into the program.
    ///
    /// A type with the same full name is already defined in the target assembly.
    #[error("Failed to insert type '{0}' into Program - already defined")]
    TypeInsert(String),

    /// A foundational runtime member could not be located.
    ///
    /// This is the only fatal link failure: without it no safe partial output can be
    /// produced (e.g. the error constructor used by synthesized method stubs).
    #[error("Unable to find {member} in the {assembly} assembly")]
    MissingDependency {
        /// Description of the missing member
        member: String,
        /// Assembly in which the member was expected
        assembly: String,
    },

    /// Recursion limit reached.
    ///
    /// Inheritance chains are walked with an explicit bound to protect against cyclic
    /// base-type metadata. The associated value is the limit that was reached.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),
}

//! Assemblies of the program model.

use crate::metadata::token::Token;

/// A named binary unit: the scope of its types and the unit of output handling.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    /// `Assembly` token
    pub token: Token,
    /// Simple assembly name, e.g. `Mono.Android`
    pub name: String,
    /// Entry point method, for executables
    pub entry_point: Option<Token>,
    /// Names of the assemblies this one references
    pub references: Vec<String>,
    /// Top-level types in definition order
    pub types: Vec<Token>,
}

impl Assembly {
    /// Returns true if `name` is among the referenced assemblies
    #[must_use]
    pub fn references_assembly(&self, name: &str) -> bool {
        self.references.iter().any(|r| r == name)
    }
}

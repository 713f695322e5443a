//! Reachability state of a link run.
//!
//! [`Annotations`] records, per token, whether a member has been marked reachable, plus
//! the output action of every assembly and the per-type preservation requests. Marking is
//! monotone: nothing in the linker ever unmarks a token, so the marked set only grows
//! between passes. An external sweep consumes the state after linking.

use rustc_hash::{FxHashMap, FxHashSet};
use strum::{Display, EnumIter};

use crate::metadata::token::{TableId, Token};

/// How an assembly is handled on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum AssemblyAction {
    /// Leave the input untouched; every member counts as reachable
    Skip,
    /// Copy the input verbatim; every member counts as reachable
    Copy,
    /// Trim unreachable members
    Link,
    /// Re-emit the (modified) assembly in full
    Save,
    /// Drop the assembly
    Delete,
}

impl AssemblyAction {
    /// Returns true if the whole assembly is kept and therefore fully marked
    #[must_use]
    pub fn keeps_everything(&self) -> bool {
        matches!(
            self,
            AssemblyAction::Skip | AssemblyAction::Copy | AssemblyAction::Save
        )
    }
}

/// Which members of a type are kept regardless of use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum TypePreserve {
    /// Only the type itself (plus explicitly preserved methods)
    Nothing,
    /// The type and all of its fields
    Fields,
    /// The type and all of its methods
    Methods,
    /// The type and all of its members
    All,
}

/// Reachability annotations.
#[derive(Debug, Default, Clone)]
pub struct Annotations {
    actions: FxHashMap<Token, AssemblyAction>,
    marked: FxHashSet<Token>,
    preserve: FxHashMap<Token, TypePreserve>,
    preserved_methods: FxHashMap<Token, Vec<Token>>,
    rewritten_registrations: FxHashSet<Token>,
}

impl Annotations {
    /// Creates empty annotations
    pub fn new() -> Self {
        Annotations::default()
    }

    /// Output action of an assembly, if one was assigned
    #[must_use]
    pub fn action(&self, assembly: Token) -> Option<AssemblyAction> {
        self.actions.get(&assembly).copied()
    }

    /// Returns true if the assembly has an action
    #[must_use]
    pub fn has_action(&self, assembly: Token) -> bool {
        self.actions.contains_key(&assembly)
    }

    /// Assigns the output action of an assembly
    pub fn set_action(&mut self, assembly: Token, action: AssemblyAction) {
        self.actions.insert(assembly, action);
    }

    /// Marks a token; returns true if it was not marked before
    pub fn mark(&mut self, token: Token) -> bool {
        self.marked.insert(token)
    }

    /// Returns true if the token is marked
    #[must_use]
    pub fn is_marked(&self, token: Token) -> bool {
        self.marked.contains(&token)
    }

    /// Number of marked tokens
    #[must_use]
    pub fn marked_count(&self) -> usize {
        self.marked.len()
    }

    /// Number of marked tokens of one table
    #[must_use]
    pub fn marked_count_in(&self, table: TableId) -> usize {
        self.marked.iter().filter(|t| t.is_table(table)).count()
    }

    /// Marked tokens of one table, in token order
    #[must_use]
    pub fn marked_in(&self, table: TableId) -> Vec<Token> {
        let mut tokens: Vec<Token> = self
            .marked
            .iter()
            .filter(|t| t.is_table(table))
            .copied()
            .collect();
        tokens.sort_unstable();
        tokens
    }

    /// Every marked token, in token order
    #[must_use]
    pub fn marked(&self) -> Vec<Token> {
        let mut tokens: Vec<Token> = self.marked.iter().copied().collect();
        tokens.sort_unstable();
        tokens
    }

    /// Preserve scope of a type
    #[must_use]
    pub fn preserve(&self, type_token: Token) -> Option<TypePreserve> {
        self.preserve.get(&type_token).copied()
    }

    /// Sets the preserve scope of a type
    pub fn set_preserve(&mut self, type_token: Token, preserve: TypePreserve) {
        self.preserve.insert(type_token, preserve);
    }

    /// Types with a preserve scope, in token order
    #[must_use]
    pub fn preserved_types(&self) -> Vec<Token> {
        let mut tokens: Vec<Token> = self.preserve.keys().copied().collect();
        tokens.sort_unstable();
        tokens
    }

    /// Requests `method` to be kept whenever `type_token` is kept
    pub fn add_preserved_method(&mut self, type_token: Token, method: Token) {
        let methods = self.preserved_methods.entry(type_token).or_default();
        if !methods.contains(&method) {
            methods.push(method);
        }
    }

    /// Methods preserved along with a type
    #[must_use]
    pub fn preserved_methods(&self, type_token: Token) -> &[Token] {
        self.preserved_methods
            .get(&type_token)
            .map_or(&[], Vec::as_slice)
    }

    /// Returns true if the registration method was already rewritten
    #[must_use]
    pub fn is_registration_rewritten(&self, method: Token) -> bool {
        self.rewritten_registrations.contains(&method)
    }

    /// Records a rewritten registration method
    pub fn set_registration_rewritten(&mut self, method: Token) {
        self.rewritten_registrations.insert(method);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_is_monotone() {
        let mut annotations = Annotations::new();
        let method = Token::from_parts(TableId::MethodDef, 3);
        assert!(annotations.mark(method));
        assert!(!annotations.mark(method));
        assert!(annotations.is_marked(method));
        assert_eq!(annotations.marked_count_in(TableId::MethodDef), 1);
        assert_eq!(annotations.marked_count_in(TableId::TypeDef), 0);
    }

    #[test]
    fn test_preserved_methods_dedup() {
        let mut annotations = Annotations::new();
        let ty = Token::from_parts(TableId::TypeDef, 1);
        let ctor = Token::from_parts(TableId::MethodDef, 1);
        annotations.add_preserved_method(ty, ctor);
        annotations.add_preserved_method(ty, ctor);
        assert_eq!(annotations.preserved_methods(ty), &[ctor]);
        assert!(annotations
            .preserved_methods(Token::from_parts(TableId::TypeDef, 2))
            .is_empty());
    }

    #[test]
    fn test_action_display() {
        assert_eq!(AssemblyAction::Save.to_string(), "Save");
        assert!(AssemblyAction::Skip.keeps_everything());
        assert!(!AssemblyAction::Link.keeps_everything());
        assert!(!AssemblyAction::Delete.keeps_everything());
    }
}

use rustc_hash::FxHashSet;

use crate::metadata::token::Token;

/// Types declaring a native registration method, collected during one mark pass.
///
/// Iteration follows insertion order; the regenerated dispatch table assigns indices in
/// that order.
#[derive(Debug, Default, Clone)]
pub struct BridgeRegistry {
    order: Vec<Token>,
    members: FxHashSet<Token>,
}

impl BridgeRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        BridgeRegistry::default()
    }

    /// Adds a type; returns false if it was already registered
    pub fn add(&mut self, type_token: Token) -> bool {
        if self.members.insert(type_token) {
            self.order.push(type_token);
            true
        } else {
            false
        }
    }

    /// Returns true if the type is registered
    #[must_use]
    pub fn contains(&self, type_token: Token) -> bool {
        self.members.contains(&type_token)
    }

    /// Forgets every registered type
    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    /// Registered types in insertion order
    pub fn iter(&self) -> impl Iterator<Item = Token> + '_ {
        self.order.iter().copied()
    }

    /// Number of registered types
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if no type is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

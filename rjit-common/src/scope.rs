//! Scoped symbol table
//!
//! A stack of name maps, one per lexical scope. Lookups search from the
//! innermost scope outward; declarations always land in the innermost scope.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ScopedTable<V> {
    scopes: Vec<HashMap<String, V>>,
}

impl<V: Clone> ScopedTable<V> {
    /// Create a table holding only the global scope
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    /// Enter a new scope
    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Exit the current scope. The global scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Add a symbol to the current scope, shadowing outer ones
    pub fn insert(&mut self, name: &str, value: V) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), value);
        }
    }

    /// Add a symbol to the global scope
    pub fn insert_global(&mut self, name: &str, value: V) {
        self.scopes[0].insert(name.to_string(), value);
    }

    /// Look up a symbol, searching from the current scope outward
    pub fn lookup(&self, name: &str) -> Option<V> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).cloned())
    }

    /// Remove a symbol from every scope it appears in
    pub fn remove(&mut self, name: &str) {
        for scope in &mut self.scopes {
            scope.remove(name);
        }
    }
}

impl<V: Clone> Default for ScopedTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_lookup_and_shadowing() {
        let mut table = ScopedTable::new();
        table.insert("x", 1);

        table.push_scope();
        assert_eq!(table.lookup("x"), Some(1));

        table.insert("x", 2);
        assert_eq!(table.lookup("x"), Some(2));

        table.pop_scope();
        assert_eq!(table.lookup("x"), Some(1));
    }

    #[test]
    fn test_global_scope_survives() {
        let mut table = ScopedTable::new();
        table.pop_scope();
        table.push_scope();
        table.insert_global("f", 7);
        table.insert("y", 3);
        table.pop_scope();

        assert_eq!(table.lookup("f"), Some(7));
        assert_eq!(table.lookup("y"), None);

        table.remove("f");
        assert_eq!(table.lookup("f"), None);
    }
}

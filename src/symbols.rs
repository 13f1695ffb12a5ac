use crate::ast::Type;
use std::collections::HashMap;
use std::fmt;

/// What an identifier means in a given scope. Only the distinction between typedef names and
/// everything else matters to the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    /// Declared by a `typedef`; carries the aliased type.
    TypeName(Type),
    /// Objects, functions, parameters and enumeration constants.
    Ordinary,
}

/// Record bodies get a scope of their own, but names declared inside them (enumeration constants
/// of a nested `enum`) belong to the nearest enclosing block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopeKind {
    #[default]
    Block,
    Record,
}

/// A single scope.
#[derive(Debug, Clone, Default)]
pub struct SymbolScope {
    symbols: HashMap<String, SymbolKind>,
    kind: ScopeKind,
}

impl SymbolScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn get(&self, name: &str) -> Option<&SymbolKind> {
        self.symbols.get(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeErr {
    PoppedRootScope,
}

impl fmt::Display for ScopeErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScopeErr::PoppedRootScope => write!(f, "attempted to pop the file scope"),
        }
    }
}

impl std::error::Error for ScopeErr {}

/// Table of identifiers visible at the current point of the parse, used to tell typedef names
/// apart from ordinary identifiers while lexing.
///
/// C scopes nest strictly and the parser only ever looks outward from the innermost one, so the
/// scopes are kept as a stack rather than as a tree: entering a block pushes, leaving it pops and
/// discards everything that block declared. Lookup walks from the top of the stack down and the
/// first hit wins, which is what makes an inner declaration hide an outer one.
///
/// The file scope is at index 0 and lives as long as the table.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<SymbolScope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self { scopes: vec![SymbolScope::new()] }
    }

    /// Number of open scopes, the file scope included.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(SymbolScope::new());
        log::debug!("entered scope, depth {}", self.depth());
    }

    /// Enter the body of a struct or union.
    pub fn push_record_scope(&mut self) {
        self.scopes.push(SymbolScope { kind: ScopeKind::Record, ..SymbolScope::default() });
        log::debug!("entered record scope, depth {}", self.depth());
    }

    /// Exit the innermost scope. The file scope can't be popped.
    pub fn pop_scope(&mut self) -> Result<(), ScopeErr> {
        if self.scopes.len() <= 1 {
            return Err(ScopeErr::PoppedRootScope);
        }
        self.scopes.pop();
        log::debug!("left scope, depth {}", self.depth());
        Ok(())
    }

    fn active_scope_mut(&mut self) -> &mut SymbolScope {
        //the file scope is never popped, so there is always a last element
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    /// Record `name` as a typedef name in the innermost scope. Redeclaring it in the same scope
    /// replaces the aliased type.
    pub fn declare_typedef(&mut self, name: &str, ty: Type) {
        log::debug!("typedef `{}` at depth {}", name, self.depth());
        self.active_scope_mut().symbols.insert(name.to_string(), SymbolKind::TypeName(ty));
    }

    /// Record `name` as an ordinary identifier in the innermost scope, hiding any typedef of the
    /// same spelling from an enclosing scope.
    pub fn declare_ordinary(&mut self, name: &str) {
        self.active_scope_mut().symbols.insert(name.to_string(), SymbolKind::Ordinary);
    }

    /// Record an enumeration constant. Unlike other ordinary identifiers it skips any record
    /// scopes, so `struct s { enum { A } e; };` leaves `A` visible after the struct.
    pub fn declare_enumerator(&mut self, name: &str) {
        let scope = self.scopes.iter_mut().rev()
            .find(|sc| sc.kind == ScopeKind::Block);
        if let Some(scope) = scope {
            scope.symbols.insert(name.to_string(), SymbolKind::Ordinary);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&SymbolKind> {
        self.scopes.iter().rev().find_map(|sc| sc.get(name))
    }

    pub fn is_type_name(&self, name: &str) -> bool {
        matches!(self.lookup(name), Some(SymbolKind::TypeName(_)))
    }

    /// The type a visible typedef name stands for.
    pub fn resolve_typedef(&self, name: &str) -> Option<&Type> {
        match self.lookup(name) {
            Some(SymbolKind::TypeName(ty)) => Some(ty),
            _ => None,
        }
    }

    pub fn active_scope(&self) -> &SymbolScope {
        &self.scopes[self.scopes.len() - 1]
    }
}

//! Arena-owned AST nodes plus a chain of lexical scopes used to resolve
//! symbol references.
//!
//! Grounded on spec.md §4.3 / §9 ("arena + handles, not shared
//! ownership"): nodes are indices into a bump-allocated `Vec` owned by
//! the symbol table, never `Rc`/`Box` trees with parent backpointers.

use std::collections::HashMap;

use crate::ast::algorithm::Algorithm;
use crate::ast::node::{Node, NodeId, NodeKind};
use crate::error::{Error, Result};

pub type SymbolId = u32;
pub type ScopeId = u32;
pub type AlgorithmId = u32;

const COMPONENT: &str = "SymbolTable";

struct Scope {
    enclosing: Option<ScopeId>,
    definitions: HashMap<SymbolId, NodeId>,
}

/// The fixed set of action/structural symbols installed in the global
/// scope at construction (spec.md §4.3), each with a stable `SymbolId`
/// so the interpreter compares identities rather than strings.
#[derive(Clone, Copy)]
pub struct PredefinedSymbols {
    pub file: SymbolId,
    pub align: SymbolId,
    pub block_enter: SymbolId,
    pub block_exit: SymbolId,
    pub block_enter_readonly: SymbolId,
    pub block_enter_writeonly: SymbolId,
    pub block_exit_readonly: SymbolId,
    pub block_exit_writeonly: SymbolId,
    pub binary_begin: SymbolId,
    pub binary_bit: SymbolId,
    pub binary_end: SymbolId,
}

pub struct SymbolTable {
    names: Vec<String>,
    name_to_id: HashMap<String, SymbolId>,
    nodes: Vec<Node>,
    algorithms: Vec<Algorithm>,
    scopes: Vec<Scope>,
    global_scope: ScopeId,
    pub predefined: PredefinedSymbols,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = SymbolTable {
            names: Vec::new(),
            name_to_id: HashMap::new(),
            nodes: Vec::new(),
            algorithms: Vec::new(),
            scopes: Vec::new(),
            global_scope: 0,
            predefined: PredefinedSymbols {
                file: 0,
                align: 0,
                block_enter: 0,
                block_exit: 0,
                block_enter_readonly: 0,
                block_enter_writeonly: 0,
                block_exit_readonly: 0,
                block_exit_writeonly: 0,
                binary_begin: 0,
                binary_bit: 0,
                binary_end: 0,
            },
        };
        table.global_scope = table.new_scope(None);
        table.predefined = PredefinedSymbols {
            file: table.intern("file"),
            align: table.intern("align"),
            block_enter: table.intern("block.enter"),
            block_exit: table.intern("block.exit"),
            block_enter_readonly: table.intern("block.enter.readonly"),
            block_enter_writeonly: table.intern("block.enter.writeonly"),
            block_exit_readonly: table.intern("block.exit.readonly"),
            block_exit_writeonly: table.intern("block.exit.writeonly"),
            binary_begin: table.intern("binary.begin"),
            binary_bit: table.intern("binary.bit"),
            binary_end: table.intern("binary.end"),
        };
        table
    }

    pub fn global_scope(&self) -> ScopeId {
        self.global_scope
    }

    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        let id = self.names.len() as SymbolId;
        self.names.push(name.to_string());
        self.name_to_id.insert(name.to_string(), id);
        id
    }

    pub fn name_of(&self, sym: SymbolId) -> &str {
        &self.names[sym as usize]
    }

    pub fn new_scope(&mut self, enclosing: Option<ScopeId>) -> ScopeId {
        let id = self.scopes.len() as ScopeId;
        self.scopes.push(Scope {
            enclosing,
            definitions: HashMap::new(),
        });
        id
    }

    pub fn define(&mut self, scope: ScopeId, sym: SymbolId, node: NodeId) {
        self.scopes[scope as usize].definitions.insert(sym, node);
    }

    /// Resolves `sym` by walking the enclosing-scope chain, failing with
    /// `UnboundSymbol` if no scope in the chain defines it.
    pub fn resolve(&self, scope: ScopeId, sym: SymbolId) -> Result<NodeId> {
        let mut cur = Some(scope);
        while let Some(s) = cur {
            let scope_ref = &self.scopes[s as usize];
            if let Some(&node) = scope_ref.definitions.get(&sym) {
                return Ok(node);
            }
            cur = scope_ref.enclosing;
        }
        Err(Error::unbound_symbol(COMPONENT, self.name_of(sym).to_string()))
    }

    pub fn alloc_node(&mut self, kind: NodeKind) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(Node::new(kind));
        id
    }

    pub fn alloc_node_with_children(&mut self, kind: NodeKind, children: Vec<NodeId>) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(Node::with_children(kind, children));
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent as usize].children.push(child);
    }

    pub fn alloc_algorithm(&mut self, algorithm: Algorithm) -> AlgorithmId {
        let id = self.algorithms.len() as AlgorithmId;
        self.algorithms.push(algorithm);
        id
    }

    pub fn algorithm(&self, id: AlgorithmId) -> &Algorithm {
        &self.algorithms[id as usize]
    }

    pub fn algorithm_mut(&mut self, id: AlgorithmId) -> &mut Algorithm {
        &mut self.algorithms[id as usize]
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predefined_symbols_have_stable_distinct_ids() {
        let t = SymbolTable::new();
        let ids = [
            t.predefined.file,
            t.predefined.align,
            t.predefined.block_enter,
            t.predefined.block_exit,
            t.predefined.binary_begin,
        ];
        let mut sorted = ids.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
    }

    #[test]
    fn resolve_walks_enclosing_chain() {
        let mut t = SymbolTable::new();
        let outer = t.new_scope(Some(t.global_scope()));
        let inner = t.new_scope(Some(outer));
        let sym = t.intern("x");
        let node = t.alloc_node(NodeKind::Integer(42));
        t.define(outer, sym, node);
        assert_eq!(t.resolve(inner, sym).unwrap(), node);
    }

    #[test]
    fn resolve_unbound_symbol_fails() {
        let mut t = SymbolTable::new();
        let sym = t.intern("nowhere");
        assert!(t.resolve(t.global_scope(), sym).is_err());
    }
}

//! The filter AST: a closed node-kind enumeration, an arena-owned
//! symbol table with lexical scoping, and the `Algorithm` aggregate
//! (spec.md §3, §4.3).

pub mod algorithm;
pub mod node;
pub mod symtab;

pub use algorithm::Algorithm;
pub use node::{Node, NodeId, NodeKind, UnimplementedKind};
pub use symtab::{AlgorithmId, PredefinedSymbols, ScopeId, SymbolId, SymbolTable};

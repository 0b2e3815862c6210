//! The filter AST's closed node-kind sum type.
//!
//! Grounded on spec.md §9's "polymorphism by kind tag" design note and
//! `original_source/experimental/src/filter_ast.h`'s node shape (a kind
//! tag plus a child list, rather than the original's deep inheritance
//! hierarchy driven by RTTI/visitors).

use crate::ast::symtab::{AlgorithmId, SymbolId};
use crate::intstream::IntTypeFormat;

pub type NodeId = u32;

/// Three node kinds the interpreter never implements (spec.md §9 Open
/// Questions): left as a distinct, named gap rather than guessed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnimplementedKind {
    ByteToByte,
    Filter,
    BlockEndNoArgs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The root of a parsed file: holds one or more `Algorithm` children.
    File,
    Algorithm(AlgorithmId),

    Sequence,
    Block,
    If,
    IfElse,
    Loop,
    LoopUnbounded,
    Switch,
    Case,
    Map,

    Eval(SymbolId),
    EvalDefault,
    Peek,

    Read(IntTypeFormat),
    Write(IntTypeFormat),
    /// A bare integer-format node used as a value-typed child (e.g. the
    /// format argument of a `read`/`write` node).
    IntFormat(IntTypeFormat),

    Callback(SymbolId),
    AlgorithmFlag,
    Define(SymbolId),
    LiteralDef(SymbolId),
    LiteralUse(SymbolId),
    Undefine(SymbolId),
    Locals,
    ParamArgs,

    /// A reference to a symbol used as a bare value (spec.md §9: left
    /// unimplemented rather than guessed).
    Symbol(SymbolId),
    Integer(u64),

    NotImplemented(UnimplementedKind),
}

impl NodeKind {
    pub fn is_integer(&self) -> bool {
        matches!(self, NodeKind::Integer(_))
    }

    pub fn is_format(&self) -> bool {
        matches!(self, NodeKind::IntFormat(_) | NodeKind::Read(_) | NodeKind::Write(_))
    }
}

pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_children(kind: NodeKind, children: Vec<NodeId>) -> Self {
        Node { kind, children }
    }
}

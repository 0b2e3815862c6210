//! Classifies an action symbol (spec.md §4.4's `Callback(Symbol)`
//! handling) against the predefined block-scope symbols, applying the
//! readonly/writeonly split decided in spec.md §9's Open Questions.

use crate::ast::{PredefinedSymbols, SymbolId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockAction {
    Enter,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionEffect {
    /// Apply the block action.
    Apply(BlockAction),
    /// Recognized but inert for this side (the `readonly`/`writeonly`
    /// suffix excludes it).
    NoOp,
    Unrecognized,
}

pub fn classify_for_reader(sym: SymbolId, p: &PredefinedSymbols) -> ActionEffect {
    classify(sym, p, true)
}

pub fn classify_for_writer(sym: SymbolId, p: &PredefinedSymbols) -> ActionEffect {
    classify(sym, p, false)
}

fn classify(sym: SymbolId, p: &PredefinedSymbols, is_reader: bool) -> ActionEffect {
    use ActionEffect::*;
    use BlockAction::*;
    if sym == p.block_enter {
        Apply(Enter)
    } else if sym == p.block_exit {
        Apply(Exit)
    } else if sym == p.block_enter_readonly {
        if is_reader {
            Apply(Enter)
        } else {
            NoOp
        }
    } else if sym == p.block_enter_writeonly {
        if is_reader {
            NoOp
        } else {
            Apply(Enter)
        }
    } else if sym == p.block_exit_readonly {
        if is_reader {
            Apply(Exit)
        } else {
            NoOp
        }
    } else if sym == p.block_exit_writeonly {
        if is_reader {
            NoOp
        } else {
            Apply(Exit)
        }
    } else {
        Unrecognized
    }
}

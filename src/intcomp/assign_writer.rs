//! The abbreviation-assign writer (spec.md §4.7): buffers a sliding
//! window of input values, periodically invokes the selector, and
//! rewrites the buffered run as a mix of abbreviation indices and
//! literal `default`/`default-multiple` runs.
//!
//! Grounded on `original_source/src/intcomp/AbbrevAssignWriter.h/.cpp`.

use crate::ast::SymbolId;
use crate::error::Result;
use crate::intcomp::count_node::CountTrie;
use crate::intcomp::selector::{AbbrevSelector, Choice};
use crate::intstream::{IntTypeFormat, IntValue};

/// One rewritten output step: an abbreviation index, or a literal run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emitted {
    Abbrev(u32),
    DefaultSingle(IntValue),
    DefaultMultiple(Vec<IntValue>),
    Align,
}

pub struct AbbrevAssignWriter<'a> {
    trie: &'a CountTrie,
    buffer: Vec<IntValue>,
    window: usize,
    pattern_length_limit: usize,
    emitted: Vec<Emitted>,
    frozen: bool,
}

impl<'a> AbbrevAssignWriter<'a> {
    pub fn new(trie: &'a CountTrie, window: usize, pattern_length_limit: usize) -> Self {
        AbbrevAssignWriter {
            trie,
            buffer: Vec::new(),
            window,
            pattern_length_limit,
            emitted: Vec::new(),
            frozen: false,
        }
    }

    pub fn emitted(&self) -> &[Emitted] {
        &self.emitted
    }

    pub fn push_value(&mut self, v: IntValue) {
        self.buffer.push(v);
        if self.buffer.len() >= self.window {
            self.drain_prefix();
        }
    }

    /// Runs the selector over the current buffer and emits a leading
    /// prefix of the chosen sequence, up to `pattern_length_limit`
    /// abbreviation steps, leaving the rest buffered.
    fn drain_prefix(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let mut selector = AbbrevSelector::new(self.trie);
        let choice = selector.select(&self.buffer);
        let steps = choice.path();

        let mut consumed = 0usize;
        for step in steps.into_iter().take(self.pattern_length_limit) {
            consumed += self.emit_step(step);
        }
        self.buffer.drain(0..consumed);
    }

    fn emit_step(&mut self, step: Choice) -> usize {
        match step {
            Choice::DefaultSingle(v) => {
                self.emitted.push(Emitted::DefaultSingle(v));
                1
            }
            Choice::DefaultMultiple(values) => {
                let n = values.len();
                self.emitted.push(Emitted::DefaultMultiple(values));
                n
            }
            Choice::Abbrev { node, values } => {
                let idx = self
                    .trie
                    .node(node)
                    .abbrev_index
                    .expect("selector only chooses assigned nodes");
                self.emitted.push(Emitted::Abbrev(idx));
                values.len()
            }
        }
    }

    /// Drains the buffer completely, one selector pass at a time.
    fn drain_all(&mut self) {
        while !self.buffer.is_empty() {
            self.drain_prefix();
        }
    }

    /// Drains whatever remains in the buffer, emits an align abbreviation
    /// if the output is not already aligned, and marks the writer frozen
    /// (spec.md §4.7 "On freeze_eof").
    pub fn freeze(&mut self, already_aligned: bool) {
        self.drain_all();
        if !already_aligned {
            if let Some(idx) = self.trie.node(self.trie.align).abbrev_index {
                self.emitted.push(Emitted::Abbrev(idx));
            } else {
                self.emitted.push(Emitted::Align);
            }
        }
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

/// Adapts [`AbbrevAssignWriter`] to the generic [`Writer`] surface so it
/// can sit at the tail of an interpreter-driven pipeline; typed writes
/// all collapse to `push_value`, exactly like the int-stream writer.
impl<'a> crate::interp::writer::Writer for AbbrevAssignWriter<'a> {
    fn write_uint8(&mut self, value: IntValue) -> Result<()> {
        self.push_value(value);
        Ok(())
    }
    fn write_uint32(&mut self, value: IntValue) -> Result<()> {
        self.push_value(value);
        Ok(())
    }
    fn write_uint64(&mut self, value: IntValue) -> Result<()> {
        self.push_value(value);
        Ok(())
    }
    fn write_varint32(&mut self, value: IntValue) -> Result<()> {
        self.push_value(value);
        Ok(())
    }
    fn write_varint64(&mut self, value: IntValue) -> Result<()> {
        self.push_value(value);
        Ok(())
    }
    fn write_varuint32(&mut self, value: IntValue) -> Result<()> {
        self.push_value(value);
        Ok(())
    }
    fn write_varuint64(&mut self, value: IntValue) -> Result<()> {
        self.push_value(value);
        Ok(())
    }
    fn write_value(&mut self, value: IntValue, _format: IntTypeFormat) -> Result<()> {
        self.push_value(value);
        Ok(())
    }
    fn write_action(&mut self, _sym: SymbolId) -> Result<()> {
        Ok(())
    }

    /// N-grams never span a block boundary, so the buffered run drains
    /// completely before the boundary's own abbreviation step is
    /// emitted — mirroring `CountWriter::observe_block_enter` clearing
    /// its frontier at the same point.
    fn open_block(&mut self) -> Result<()> {
        self.drain_all();
        let idx = self
            .trie
            .node(self.trie.block_enter)
            .abbrev_index
            .expect("block_enter always receives an abbreviation index");
        self.emitted.push(Emitted::Abbrev(idx));
        Ok(())
    }

    fn close_block(&mut self) -> Result<()> {
        self.drain_all();
        let idx = self
            .trie
            .node(self.trie.block_exit)
            .abbrev_index
            .expect("block_exit always receives an abbreviation index");
        self.emitted.push(Emitted::Abbrev(idx));
        Ok(())
    }
    fn set_minimize_block_size(&mut self, _minimize: bool) {}
    fn freeze_eof(&mut self) -> Result<()> {
        self.freeze(false);
        Ok(())
    }
}

//! A writer that inflates one stage's evaluation trace back into a
//! structured integer stream the next stage can read (spec.md §4.5,
//! "inflator writer that reconstructs AST from an integer stream";
//! spec.md §4.8's algorithm chaining).
//!
//! The original implementation inflates a textual AST; this crate's
//! intermediate representation between chained stages is an
//! [`IntStream`], so `InflatorWriter` reconstructs that instead of a
//! syntax tree, filling the same "flat trace back to structure" role
//! `chain` needs at every stage boundary but the last.
//!
//! Grounded on `original_source/src/interp/DecompressSelector.cpp`
//! (the stage-to-stage inflation point) and built on top of
//! [`crate::interp::int_io::IntStreamWriter`], which already knows how
//! to turn typed writes into [`IntStream`] contents.

use crate::ast::{PredefinedSymbols, SymbolId};
use crate::error::Result;
use crate::interp::int_io::IntStreamWriter;
use crate::interp::writer::Writer;
use crate::intstream::cursor::WriteCursor;
use crate::intstream::{IntStream, IntTypeFormat, IntValue};
use std::cell::RefCell;
use std::rc::Rc;

/// Owns the next stage's [`IntStream`] and the cursor/writer pair that
/// inflates it, so `chain::run_chain` doesn't need to juggle the three
/// separately at every stage boundary.
pub struct InflatorWriter {
    stream: Rc<RefCell<IntStream>>,
    cursor: WriteCursor,
}

impl InflatorWriter {
    pub fn new() -> Self {
        let stream = Rc::new(RefCell::new(IntStream::new()));
        let cursor = WriteCursor::new(stream.clone());
        InflatorWriter { stream, cursor }
    }

    /// Hands back the inflated stream for the next stage to read, once
    /// this stage has finished writing and frozen it.
    pub fn into_stream(self) -> Rc<RefCell<IntStream>> {
        self.stream
    }

    fn inner(&mut self, predefined: PredefinedSymbols) -> IntStreamWriter<'_> {
        IntStreamWriter::new(&mut self.cursor, predefined)
    }
}

impl Default for InflatorWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Delegates every call to a freshly built [`IntStreamWriter`] over this
/// writer's own cursor; the predefined-symbol table is fixed at
/// construction via [`InflatorWriter::for_table`].
pub struct BoundInflatorWriter<'a> {
    writer: IntStreamWriter<'a>,
}

impl InflatorWriter {
    /// Binds this inflator to a symbol table's predefined actions,
    /// producing the [`Writer`] the interpreter actually drives.
    pub fn for_table(&mut self, predefined: PredefinedSymbols) -> BoundInflatorWriter<'_> {
        BoundInflatorWriter { writer: self.inner(predefined) }
    }
}

impl<'a> Writer for BoundInflatorWriter<'a> {
    fn write_uint8(&mut self, value: IntValue) -> Result<()> {
        self.writer.write_uint8(value)
    }
    fn write_uint32(&mut self, value: IntValue) -> Result<()> {
        self.writer.write_uint32(value)
    }
    fn write_uint64(&mut self, value: IntValue) -> Result<()> {
        self.writer.write_uint64(value)
    }
    fn write_varint32(&mut self, value: IntValue) -> Result<()> {
        self.writer.write_varint32(value)
    }
    fn write_varint64(&mut self, value: IntValue) -> Result<()> {
        self.writer.write_varint64(value)
    }
    fn write_varuint32(&mut self, value: IntValue) -> Result<()> {
        self.writer.write_varuint32(value)
    }
    fn write_varuint64(&mut self, value: IntValue) -> Result<()> {
        self.writer.write_varuint64(value)
    }
    fn write_value(&mut self, value: IntValue, format: IntTypeFormat) -> Result<()> {
        self.writer.write_value(value, format)
    }
    fn write_action(&mut self, sym: SymbolId) -> Result<()> {
        self.writer.write_action(sym)
    }
    fn open_block(&mut self) -> Result<()> {
        self.writer.open_block()
    }
    fn close_block(&mut self) -> Result<()> {
        self.writer.close_block()
    }
    fn set_minimize_block_size(&mut self, minimize: bool) {
        self.writer.set_minimize_block_size(minimize)
    }
    fn freeze_eof(&mut self) -> Result<()> {
        self.writer.freeze_eof()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SymbolTable;

    #[test]
    fn inflates_values_and_blocks_into_a_readable_stream() {
        let predefined = SymbolTable::new().predefined;
        let mut inflator = InflatorWriter::new();
        {
            let mut bound = inflator.for_table(predefined);
            bound.write_uint8(1).unwrap();
            bound.open_block().unwrap();
            bound.write_uint8(2).unwrap();
            bound.close_block().unwrap();
            bound.freeze_eof().unwrap();
        }

        let stream = inflator.into_stream();
        let stream = stream.borrow();
        assert_eq!(stream.values(), &[1, 2]);
        let top = stream.block(stream.top_block());
        assert_eq!(top.subblocks.len(), 1);
    }
}

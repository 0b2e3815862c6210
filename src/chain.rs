//! Algorithm chaining (spec.md §4.8): runs a sequence of embedded
//! algorithm definitions in order, each stage's integer-stream output
//! feeding the next stage's input, with the final stage writing the
//! user-visible output.
//!
//! Grounded on `original_source/src/interp/DecompressSelector.cpp`,
//! simplified: rather than threading configure/reset callbacks through
//! one running interpreter, each queued algorithm runs as a complete
//! interpreter pass over a materialized [`IntStream`]. Every
//! intermediate stage writes through an [`InflatorWriter`] (spec.md
//! §4.5), which is what actually materializes that stream from the
//! stage's evaluation trace; [`TeeWriter`] lets a stage additionally
//! mirror its trace to a tally used for chain diagnostics.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::{AlgorithmId, SymbolTable};
use crate::error::Result;
use crate::interp::inflator_writer::InflatorWriter;
use crate::interp::int_io::IntStreamReader;
use crate::interp::reader::Reader;
use crate::interp::state::Modifier;
use crate::interp::tee_writer::TeeWriter;
use crate::interp::writer::Writer;
use crate::interp::Interpreter;
use crate::intstream::cursor::ReadCursor;
use crate::intstream::IntStream;

/// Per-stage counters collected while chaining, for diagnostics only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageTally {
    pub values_written: u64,
    pub blocks_entered: u64,
}

impl Writer for StageTally {
    fn write_uint8(&mut self, _v: crate::intstream::IntValue) -> Result<()> {
        self.values_written += 1;
        Ok(())
    }
    fn write_uint32(&mut self, _v: crate::intstream::IntValue) -> Result<()> {
        self.values_written += 1;
        Ok(())
    }
    fn write_uint64(&mut self, _v: crate::intstream::IntValue) -> Result<()> {
        self.values_written += 1;
        Ok(())
    }
    fn write_varint32(&mut self, _v: crate::intstream::IntValue) -> Result<()> {
        self.values_written += 1;
        Ok(())
    }
    fn write_varint64(&mut self, _v: crate::intstream::IntValue) -> Result<()> {
        self.values_written += 1;
        Ok(())
    }
    fn write_varuint32(&mut self, _v: crate::intstream::IntValue) -> Result<()> {
        self.values_written += 1;
        Ok(())
    }
    fn write_varuint64(&mut self, _v: crate::intstream::IntValue) -> Result<()> {
        self.values_written += 1;
        Ok(())
    }
    fn write_action(&mut self, _sym: crate::ast::SymbolId) -> Result<()> {
        Ok(())
    }
    fn open_block(&mut self) -> Result<()> {
        self.blocks_entered += 1;
        Ok(())
    }
    fn close_block(&mut self) -> Result<()> {
        Ok(())
    }
    fn set_minimize_block_size(&mut self, _minimize: bool) {}
    fn freeze_eof(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Runs `algorithms` in order: every stage but the last reads from the
/// previous stage's output (or from `reader` for the first stage) and
/// writes a fresh [`IntStream`]; the last stage writes to `writer`
/// directly, per spec.md §4.8 ("the final stage writes the
/// user-visible output").
pub fn run_chain(
    table: &SymbolTable,
    algorithms: &[AlgorithmId],
    reader: &mut dyn Reader,
    writer: &mut dyn Writer,
) -> Result<Vec<StageTally>> {
    let mut tallies = Vec::new();
    if algorithms.is_empty() {
        return Ok(tallies);
    }

    let mut stage_stream: Option<Rc<RefCell<IntStream>>> = None;

    for (i, &alg_id) in algorithms.iter().enumerate() {
        let algorithm = table.algorithm(alg_id);
        let body = match algorithm.body {
            Some(n) => n,
            None => continue,
        };
        let is_last = i + 1 == algorithms.len();

        if is_last {
            run_stage(table, body, algorithm.scope, stage_stream.take(), reader, writer)?;
        } else {
            let mut inflator = InflatorWriter::new();
            let mut tally = StageTally::default();
            {
                let mut stage_writer = inflator.for_table(table.predefined);
                let mut tee = TeeWriter::new();
                tee.add(&mut stage_writer);
                tee.add(&mut tally);
                run_stage(table, body, algorithm.scope, stage_stream.take(), reader, &mut tee)?;
                tee.freeze_eof()?;
            }
            tallies.push(tally);
            stage_stream = Some(inflator.into_stream());
        }
    }

    Ok(tallies)
}

/// Drives one algorithm's body to completion, reading either from the
/// prior stage's [`IntStream`] or, for the first stage, from `reader`.
fn run_stage(
    table: &SymbolTable,
    body: crate::ast::NodeId,
    scope: crate::ast::ScopeId,
    input_stream: Option<Rc<RefCell<IntStream>>>,
    reader: &mut dyn Reader,
    writer: &mut dyn Writer,
) -> Result<()> {
    match input_stream {
        Some(stream) => {
            let mut cursor = ReadCursor::new(stream);
            let mut stage_reader = IntStreamReader::new(&mut cursor, table.predefined);
            let mut interp = Interpreter::new(table, &mut stage_reader, writer, scope);
            interp.start(body, Modifier::ReadAndWrite);
            interp.read_backfilled()
        }
        None => {
            let mut interp = Interpreter::new(table, reader, writer, scope);
            interp.start(body, Modifier::ReadAndWrite);
            interp.read_backfilled()
        }
    }
}

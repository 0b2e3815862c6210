//! Top-level orchestration of the integer-compression pass (spec.md
//! §4.6-§4.7): count, assign, then rewrite.
//!
//! Grounded on `original_source/src/intcomp/IntCompress.cpp`'s driver
//! function, which runs the same three stages over a whole int-stream.

use crate::error::Result;
use crate::intcomp::assign::AbbrevAssignment;
use crate::intcomp::assign_writer::{AbbrevAssignWriter, Emitted};
use crate::intcomp::count_node::CountTrie;
use crate::intcomp::count_writer::CountWriter;
use crate::interp::writer::Writer;
use crate::intstream::block::BlockId;
use crate::intstream::{IntStream, IntTypeFormat};

/// Tunable thresholds for a compression run; defaults mirror the
/// original implementation's conservative built-ins.
#[derive(Debug, Clone, Copy)]
pub struct CompressOptions {
    pub count_cutoff: u64,
    pub weight_cutoff: u64,
    pub up_to_size: usize,
    pub window: usize,
    pub pattern_length_limit: usize,
}

impl Default for CompressOptions {
    fn default() -> Self {
        CompressOptions {
            count_cutoff: 4,
            weight_cutoff: 4,
            up_to_size: 4,
            window: 64,
            pattern_length_limit: 8,
        }
    }
}

/// Runs the three intcomp stages over a fully materialized [`IntStream`]
/// and returns the rewritten step sequence plus the trie the
/// abbreviation indices resolve against. Both passes walk the stream's
/// block tree, not just its flat value vector, so `block.enter`/
/// `block.exit` boundaries reach the counting and rewriting stages the
/// same way every other value does (spec.md §8's block-structure
/// round-trip invariant).
pub fn compress(stream: &IntStream, opts: CompressOptions) -> Result<(CountTrie, Vec<Emitted>)> {
    let mut counter = CountWriter::new(opts.count_cutoff, opts.up_to_size);
    replay(stream, &mut counter)?;
    let mut trie = counter.into_trie();

    AbbrevAssignment::new(opts.count_cutoff, opts.weight_cutoff).assign(&mut trie);

    let emitted = {
        let mut writer = AbbrevAssignWriter::new(&trie, opts.window, opts.pattern_length_limit);
        replay(stream, &mut writer)?;
        writer.freeze(true);
        writer.emitted().to_vec()
    };

    Ok((trie, emitted))
}

/// Forwards every value and block boundary in `stream`, in creation
/// order, to `writer` — the same traversal an interpreter pass would
/// have driven live, replayed here over the already-materialized
/// stream.
fn replay(stream: &IntStream, writer: &mut dyn Writer) -> Result<()> {
    replay_block(stream, stream.top_block(), writer)
}

fn replay_block(stream: &IntStream, block_id: BlockId, writer: &mut dyn Writer) -> Result<()> {
    let block = stream.block(block_id);
    let end = block.end_index;
    let mut idx = block.begin_index;
    for &sub_id in &block.subblocks {
        let sub_begin = stream.block(sub_id).begin_index;
        while idx < sub_begin {
            writer.write_value(stream.values()[idx], IntTypeFormat::Varuint64)?;
            idx += 1;
        }
        writer.open_block()?;
        replay_block(stream, sub_id, writer)?;
        writer.close_block()?;
        idx = stream.block(sub_id).end_index;
    }
    while idx < end {
        writer.write_value(stream.values()[idx], IntTypeFormat::Varuint64)?;
        idx += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::intstream::cursor::WriteCursor;
    use crate::intstream::IntValue;

    fn flat_stream(values: &[IntValue]) -> IntStream {
        let stream = Rc::new(RefCell::new(IntStream::new()));
        {
            let mut w = WriteCursor::new(stream.clone());
            for &v in values {
                w.write(v).unwrap();
            }
            w.freeze_eof();
        }
        Rc::try_unwrap(stream).ok().unwrap().into_inner()
    }

    #[test]
    fn compresses_a_repeated_pattern_into_fewer_steps() {
        let values: Vec<IntValue> = [1u64, 2, 1, 2, 1, 2, 1, 2, 1, 2].to_vec();
        let opts = CompressOptions {
            count_cutoff: 2,
            weight_cutoff: 1,
            up_to_size: 2,
            window: values.len(),
            pattern_length_limit: values.len(),
        };
        let (_, emitted) = compress(&flat_stream(&values), opts).unwrap();
        assert!(emitted.len() < values.len());
    }

    #[test]
    fn block_boundaries_are_emitted_as_abbreviation_steps() {
        let stream = Rc::new(RefCell::new(IntStream::new()));
        {
            let mut w = WriteCursor::new(stream.clone());
            w.write(9).unwrap();
            w.open_block();
            w.write(1).unwrap();
            w.write(2).unwrap();
            w.close_block().unwrap();
            w.write(9).unwrap();
            w.freeze_eof();
        }
        let stream = Rc::try_unwrap(stream).ok().unwrap().into_inner();

        let opts = CompressOptions {
            count_cutoff: 1,
            weight_cutoff: 1,
            up_to_size: 1,
            window: 16,
            pattern_length_limit: 16,
        };
        let (trie, emitted) = compress(&stream, opts).unwrap();
        let block_enter_idx = trie.node(trie.block_enter).abbrev_index.unwrap();
        let block_exit_idx = trie.node(trie.block_exit).abbrev_index.unwrap();
        assert!(emitted.iter().any(|s| matches!(s, Emitted::Abbrev(i) if *i == block_enter_idx)));
        assert!(emitted.iter().any(|s| matches!(s, Emitted::Abbrev(i) if *i == block_exit_idx)));
    }
}

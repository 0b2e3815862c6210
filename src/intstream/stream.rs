//! An in-memory integer stream: a value vector, a header, and a tree of
//! blocks over that vector (spec.md §3 "Integer stream IR").
//!
//! Grounded on `original_source/src/interp/IntStream.h/.cpp`.

use crate::intstream::block::{Block, BlockId};
use crate::intstream::formats::{IntTypeFormat, IntValue};

pub const TOP_BLOCK: BlockId = 0;

pub struct IntStream {
    pub(crate) header: Vec<(IntValue, IntTypeFormat)>,
    pub(crate) values: Vec<IntValue>,
    pub(crate) blocks: Vec<Block>,
    /// Flat creation order of every block opened by a write cursor; a
    /// read cursor replays this to know where nested blocks begin.
    pub(crate) block_order: Vec<BlockId>,
    pub(crate) frozen: bool,
}

impl IntStream {
    pub fn new() -> Self {
        IntStream {
            header: Vec::new(),
            values: Vec::new(),
            blocks: vec![Block::root()],
            block_order: Vec::new(),
            frozen: false,
        }
    }

    pub fn reset(&mut self) {
        *self = IntStream::new();
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn header(&self) -> &[(IntValue, IntTypeFormat)] {
        &self.header
    }

    pub fn append_header(&mut self, value: IntValue, format: IntTypeFormat) {
        self.header.push((value, format));
    }

    pub fn values(&self) -> &[IntValue] {
        &self.values
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id]
    }

    pub fn top_block(&self) -> BlockId {
        TOP_BLOCK
    }

    pub fn blocks_in_order(&self) -> &[BlockId] {
        &self.block_order
    }
}

impl Default for IntStream {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_stream_has_only_the_root_block() {
        let s = IntStream::new();
        assert_eq!(s.size(), 0);
        assert!(!s.is_frozen());
        assert_eq!(s.block(s.top_block()).begin_index, 0);
    }
}

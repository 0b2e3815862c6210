//! Read/write cursors walking an [`IntStream`]'s value vector and block
//! tree in lockstep.
//!
//! Grounded on `original_source/src/interp/IntStream.h/.cpp`'s
//! `Cursor`/`ReadCursor`/`WriteCursor`.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::intstream::block::{Block, BlockId};
use crate::intstream::formats::IntValue;
use crate::intstream::stream::IntStream;

const COMPONENT: &str = "IntStream::Cursor";

/// Shared mutable position state common to both cursor kinds: the
/// current value index and the stack of enclosing blocks (front is the
/// top block, back is the innermost open one).
struct CursorState {
    stream: Rc<RefCell<IntStream>>,
    index: usize,
    enclosing_blocks: Vec<BlockId>,
}

impl CursorState {
    fn new(stream: Rc<RefCell<IntStream>>) -> Self {
        let top = stream.borrow().top_block();
        CursorState {
            stream,
            index: 0,
            enclosing_blocks: vec![top],
        }
    }

    fn at_eof(&self) -> bool {
        let s = self.stream.borrow();
        self.index >= s.block(self.enclosing_blocks[0]).end_index
    }

    fn at_eob(&self) -> bool {
        let s = self.stream.borrow();
        let innermost = *self.enclosing_blocks.last().unwrap();
        self.index >= s.block(innermost).end_index
    }

    fn at_end(&self) -> bool {
        self.enclosing_blocks.len() == 1 && self.at_eof()
    }

    /// Pops the innermost block scope (shared by read and write close).
    fn pop_enclosing(&mut self) -> Option<BlockId> {
        if self.enclosing_blocks.len() <= 1 {
            return None;
        }
        self.enclosing_blocks.pop()
    }
}

pub struct WriteCursor {
    state: CursorState,
}

impl WriteCursor {
    pub fn new(stream: Rc<RefCell<IntStream>>) -> Self {
        WriteCursor {
            state: CursorState::new(stream),
        }
    }

    pub fn index(&self) -> usize {
        self.state.index
    }

    pub fn write(&mut self, value: IntValue) -> Result<()> {
        if self.state.stream.borrow().is_frozen() {
            return Err(Error::frozen_write(COMPONENT, self.state.index as u64));
        }
        self.state.stream.borrow_mut().values.push(value);
        self.state.index += 1;
        Ok(())
    }

    pub fn freeze_eof(&mut self) -> bool {
        let mut s = self.state.stream.borrow_mut();
        if s.is_frozen() {
            return false;
        }
        s.frozen = true;
        let eof_index = s.values.len();
        for &id in &self.state.enclosing_blocks {
            s.blocks[id].end_index = eof_index;
        }
        true
    }

    /// Opens a nested block at the current index, pushing it onto both
    /// the enclosing-block stack and the stream's flat creation order.
    pub fn open_block(&mut self) -> BlockId {
        let mut s = self.state.stream.borrow_mut();
        let cur = *self.state.enclosing_blocks.last().unwrap();
        let id = s.blocks.len();
        s.blocks.push(Block::new(self.state.index));
        s.blocks[cur].subblocks.push(id);
        s.block_order.push(id);
        drop(s);
        self.state.enclosing_blocks.push(id);
        id
    }

    pub fn close_block(&mut self) -> Result<BlockId> {
        let id = self
            .state
            .pop_enclosing()
            .ok_or_else(|| Error::protocol_violation(COMPONENT, "close_block with no open block"))?;
        self.state.stream.borrow_mut().blocks[id].end_index = self.state.index;
        Ok(id)
    }
}

pub struct ReadCursor {
    state: CursorState,
    /// Index into the stream's flat `block_order`, tracking which block
    /// opens next.
    next_block: usize,
}

impl ReadCursor {
    pub fn new(stream: Rc<RefCell<IntStream>>) -> Self {
        ReadCursor {
            state: CursorState::new(stream),
            next_block: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.state.index
    }

    pub fn at_eof(&self) -> bool {
        self.state.at_eof()
    }

    pub fn at_eob(&self) -> bool {
        self.state.at_eob()
    }

    pub fn at_end(&self) -> bool {
        self.state.at_end()
    }

    pub fn has_more_blocks(&self) -> bool {
        self.next_block < self.state.stream.borrow().block_order.len()
    }

    pub fn read(&mut self) -> Result<IntValue> {
        let s = self.state.stream.borrow();
        if self.state.index >= s.values.len() {
            return Err(Error::unexpected_eof(COMPONENT, self.state.index as u64));
        }
        let value = s.values[self.state.index];
        drop(s);
        self.state.index += 1;
        Ok(value)
    }

    /// Enters the next block in creation order, if the cursor sits
    /// exactly at its begin index.
    pub fn open_block(&mut self) -> bool {
        let id = {
            let s = self.state.stream.borrow();
            match s.block_order.get(self.next_block) {
                Some(&id) if s.block(id).begin_index == self.state.index => id,
                _ => return false,
            }
        };
        self.state.enclosing_blocks.push(id);
        self.next_block += 1;
        true
    }

    pub fn close_block(&mut self) -> Result<bool> {
        let id = self
            .state
            .pop_enclosing()
            .ok_or_else(|| Error::protocol_violation(COMPONENT, "close_block with no open block"))?;
        let end = self.state.stream.borrow().block(id).end_index;
        Ok(end == self.state.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn write_then_read_flat_values() {
        let stream = Rc::new(RefCell::new(IntStream::new()));
        let mut w = WriteCursor::new(stream.clone());
        for v in [1u64, 2, 3] {
            w.write(v).unwrap();
        }
        w.freeze_eof();

        let mut r = ReadCursor::new(stream);
        assert_eq!(r.read().unwrap(), 1);
        assert_eq!(r.read().unwrap(), 2);
        assert_eq!(r.read().unwrap(), 3);
        assert!(r.read().is_err());
    }

    #[test]
    fn nested_block_roundtrip() {
        let stream = Rc::new(RefCell::new(IntStream::new()));
        let mut w = WriteCursor::new(stream.clone());
        w.write(10).unwrap();
        w.open_block();
        w.write(20).unwrap();
        w.write(21).unwrap();
        w.close_block().unwrap();
        w.write(30).unwrap();
        w.freeze_eof();

        let mut r = ReadCursor::new(stream);
        assert_eq!(r.read().unwrap(), 10);
        assert!(r.open_block());
        assert_eq!(r.read().unwrap(), 20);
        assert_eq!(r.read().unwrap(), 21);
        assert!(r.close_block().unwrap());
        assert_eq!(r.read().unwrap(), 30);
        assert!(r.at_end());
    }

    #[test]
    fn write_after_freeze_fails() {
        let stream = Rc::new(RefCell::new(IntStream::new()));
        let mut w = WriteCursor::new(stream);
        w.write(1).unwrap();
        w.freeze_eof();
        assert!(w.write(2).is_err());
    }
}

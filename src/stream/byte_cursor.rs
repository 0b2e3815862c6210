//! Byte cursors over a paged [`Queue`]: a current address plus a stack
//! of enclosing end-of-block addresses.
//!
//! Grounded on `original_source/src/stream/Cursor.h`, `WriteCursor.h`.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::stream::eob::EobStack;
use crate::stream::queue::Queue;

const COMPONENT: &str = "ByteCursor";

pub struct ReadCursor {
    queue: Rc<Queue>,
    address: u64,
    eob: EobStack,
}

impl ReadCursor {
    pub fn new(queue: Rc<Queue>) -> Self {
        let file_eob = queue.eof_address().unwrap_or(u64::MAX);
        ReadCursor {
            queue,
            address: 0,
            eob: EobStack::new(file_eob),
        }
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn queue(&self) -> &Rc<Queue> {
        &self.queue
    }

    pub fn at_eob(&self) -> bool {
        self.address >= self.eob.top()
    }

    /// True when fewer than `headroom` bytes are guaranteed available
    /// before the innermost eob — the interpreter's suspension signal
    /// (spec.md §5).
    pub fn can_process_more_now(&self, headroom: u64) -> bool {
        self.eob.top().saturating_sub(self.address) >= headroom || self.queue.is_eof_frozen()
    }

    pub fn push_eob(&mut self, addr: u64) -> Result<()> {
        self.eob.push(addr)
    }

    pub fn pop_eob(&mut self) -> Result<u64> {
        self.eob.pop(self.address)
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        if self.address >= self.eob.top() {
            return Err(Error::unexpected_eof(COMPONENT, self.address));
        }
        let page = self.queue.read_page_for(self.address)?;
        let byte = page.borrow().get_byte(self.address);
        self.address += 1;
        Ok(byte)
    }

    pub fn read_block(&mut self, out: &mut [u8]) -> Result<usize> {
        let avail = self.eob.top().saturating_sub(self.address) as usize;
        let n = out.len().min(avail);
        let mut addr = self.address;
        let got = self.queue.read(&mut addr, &mut out[..n])?;
        self.address = addr;
        Ok(got)
    }

    /// Saves position, runs `f`, then restores it — the cursor-local
    /// state mutation a `peek` node needs (spec.md §4.4).
    pub fn peek<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let saved_addr = self.address;
        let saved_depth = self.eob.depth();
        let result = f(self);
        self.address = saved_addr;
        while self.eob.depth() > saved_depth {
            // Best-effort unwind of any block scope entered during the peek.
            let _ = self.eob.pop(self.address);
        }
        result
    }
}

pub struct WriteCursor {
    queue: Rc<Queue>,
    address: u64,
    eob: EobStack,
}

impl WriteCursor {
    pub fn new(queue: Rc<Queue>) -> Self {
        WriteCursor {
            queue,
            address: 0,
            eob: EobStack::new(u64::MAX),
        }
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn queue(&self) -> &Rc<Queue> {
        &self.queue
    }

    /// Repositions the cursor without touching the queue, used only by
    /// block-length minimization after bytes have been shifted down.
    pub fn set_address(&mut self, addr: u64) {
        self.address = addr;
    }

    pub fn push_eob(&mut self, addr: u64) -> Result<()> {
        self.eob.push(addr)
    }

    pub fn pop_eob(&mut self) -> Result<u64> {
        self.eob.pop(self.address)
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        if self.address >= self.eob.top() {
            return Err(Error::protocol_violation(
                COMPONENT,
                "write past enclosing block end",
            ));
        }
        let page = self.queue.write_page_for(self.address)?;
        page.borrow_mut().set_byte(self.address, byte);
        self.address += 1;
        Ok(())
    }

    pub fn write_block(&mut self, data: &[u8]) -> Result<()> {
        for &b in data {
            self.write_byte(b)?;
        }
        Ok(())
    }

    /// Overwrites previously-written bytes in place (used to backpatch a
    /// reserved length prefix, spec.md §4.1). Does not move the cursor.
    pub fn patch(&mut self, addr: u64, data: &[u8]) -> Result<()> {
        let mut a = addr;
        self.queue.write(&mut a, data)
    }

    pub fn freeze_eof(&mut self) {
        self.queue.freeze_eof(self.address);
        self.eob.set_file_eob(self.address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_roundtrip_then_eof() {
        let q = Rc::new(Queue::new());
        let mut w = WriteCursor::new(q.clone());
        w.write_block(&[0x00, 0x7f, 0x80, 0xff]).unwrap();
        w.freeze_eof();

        let mut r = ReadCursor::new(q);
        for expected in [0x00u8, 0x7f, 0x80, 0xff] {
            assert_eq!(r.read_byte().unwrap(), expected);
        }
        assert!(matches!(
            r.read_byte().unwrap_err(),
            Error::UnexpectedEof { .. }
        ));
    }

    #[test]
    fn nested_blocks_via_eob_stack() {
        let q = Rc::new(Queue::new());
        let mut w = WriteCursor::new(q.clone());
        w.write_byte(1).unwrap();
        w.push_eob(5).unwrap();
        w.write_byte(2).unwrap();
        w.pop_eob().unwrap();
        w.write_byte(3).unwrap();
        w.freeze_eof();

        let mut r = ReadCursor::new(q);
        assert_eq!(r.read_byte().unwrap(), 1);
        r.push_eob(2).unwrap();
        assert_eq!(r.read_byte().unwrap(), 2);
        r.pop_eob().unwrap();
        assert_eq!(r.read_byte().unwrap(), 3);
    }

    #[test]
    fn reading_past_eob_fails_without_touching_frozen_eof() {
        let q = Rc::new(Queue::new());
        let mut w = WriteCursor::new(q.clone());
        w.write_block(&[1, 2, 3, 4]).unwrap();
        w.freeze_eof();

        let mut r = ReadCursor::new(q);
        r.push_eob(2).unwrap();
        assert_eq!(r.read_byte().unwrap(), 1);
        assert_eq!(r.read_byte().unwrap(), 2);
        assert!(matches!(
            r.read_byte().unwrap_err(),
            Error::UnexpectedEof { .. }
        ));
    }

    #[test]
    fn peek_restores_position() {
        let q = Rc::new(Queue::new());
        let mut w = WriteCursor::new(q.clone());
        w.write_block(&[10, 20, 30]).unwrap();
        w.freeze_eof();

        let mut r = ReadCursor::new(q);
        let peeked = r
            .peek(|cur| {
                let a = cur.read_byte()?;
                let b = cur.read_byte()?;
                Ok((a, b))
            })
            .unwrap();
        assert_eq!(peeked, (10, 20));
        assert_eq!(r.address(), 0);
        assert_eq!(r.read_byte().unwrap(), 10);
    }
}

//! `Reader`/`Writer` implementations over a byte-level cursor, with
//! length-prefixed block framing and the block-length minimization
//! (shrink + shift) design note from spec.md §4.1/§9.

use crate::ast::{PredefinedSymbols, SymbolId};
use crate::error::{Error, Result};
use crate::interp::actions::{classify_for_reader, classify_for_writer, ActionEffect};
use crate::interp::reader::Reader;
use crate::interp::writer::Writer;
use crate::intstream::IntValue;
use crate::stream::byte_cursor::{ReadCursor, WriteCursor};
use crate::stream::format_helpers::{
    fixed_varuint_bytes, read_fixed_u32, read_fixed_u64, read_uint8, read_varint32, read_varint64,
    read_varuint32, read_varuint64, varuint_size, write_fixed_u32, write_fixed_u64,
    write_fixed_varuint32, write_uint8, write_varint32, write_varint64, write_varuint32,
    write_varuint64,
};

/// Width (bytes) reserved for a block's length prefix before its final
/// size is known (spec.md §9: "reserve the maximum width (5 bytes for
/// uint32-encoded varuints)").
const RESERVED_LENGTH_WIDTH: usize = 5;

pub struct ByteReader<'a> {
    cursor: &'a mut ReadCursor,
    predefined: PredefinedSymbols,
}

impl<'a> ByteReader<'a> {
    pub fn new(cursor: &'a mut ReadCursor, predefined: PredefinedSymbols) -> Self {
        ByteReader { cursor, predefined }
    }
}

impl<'a> Reader for ByteReader<'a> {
    fn read_uint8(&mut self) -> Result<IntValue> {
        Ok(read_uint8(self.cursor)? as IntValue)
    }

    fn read_uint32(&mut self) -> Result<IntValue> {
        Ok(read_fixed_u32(self.cursor)? as IntValue)
    }

    fn read_uint64(&mut self) -> Result<IntValue> {
        read_fixed_u64(self.cursor)
    }

    fn read_varint32(&mut self) -> Result<IntValue> {
        Ok(read_varint32(self.cursor)? as i64 as IntValue)
    }

    fn read_varint64(&mut self) -> Result<IntValue> {
        Ok(read_varint64(self.cursor)? as IntValue)
    }

    fn read_varuint32(&mut self) -> Result<IntValue> {
        Ok(read_varuint32(self.cursor)? as IntValue)
    }

    fn read_varuint64(&mut self) -> Result<IntValue> {
        read_varuint64(self.cursor)
    }

    fn read_action(&mut self, sym: SymbolId) -> Result<()> {
        match classify_for_reader(sym, &self.predefined) {
            ActionEffect::Apply(crate::interp::actions::BlockAction::Enter) => self.open_block(),
            ActionEffect::Apply(crate::interp::actions::BlockAction::Exit) => self.close_block(),
            ActionEffect::NoOp => Ok(()),
            ActionEffect::Unrecognized => Err(Error::protocol_violation(
                "ByteReader",
                "unrecognized action symbol",
            )),
        }
    }

    fn open_block(&mut self) -> Result<()> {
        let len = read_varuint32(self.cursor)? as u64;
        let addr = self.cursor.address();
        self.cursor.push_eob(addr + len)
    }

    fn close_block(&mut self) -> Result<()> {
        self.cursor.pop_eob()?;
        Ok(())
    }

    fn peek(&mut self, f: &mut dyn FnMut(&mut dyn Reader) -> Result<()>) -> Result<()> {
        let predefined = self.predefined_copy();
        self.cursor.peek(|c| {
            let mut inner = ByteReader {
                cursor: c,
                predefined,
            };
            f(&mut inner)
        })
    }

    fn at_input_eob(&self) -> bool {
        self.cursor.at_eob()
    }

    fn can_process_more_input_now(&self, headroom: u64) -> bool {
        self.cursor.can_process_more_now(headroom)
    }
}

impl<'a> ByteReader<'a> {
    fn predefined_copy(&self) -> PredefinedSymbols {
        self.predefined
    }
}

pub struct ByteWriter<'a> {
    cursor: &'a mut WriteCursor,
    predefined: PredefinedSymbols,
    minimize: bool,
    /// Stack of (length-field address, body-start address) for each
    /// currently-open block.
    open_blocks: Vec<(u64, u64)>,
}

impl<'a> ByteWriter<'a> {
    pub fn new(cursor: &'a mut WriteCursor, predefined: PredefinedSymbols) -> Self {
        ByteWriter {
            cursor,
            predefined,
            minimize: false,
            open_blocks: Vec::new(),
        }
    }
}

impl<'a> Writer for ByteWriter<'a> {
    fn write_uint8(&mut self, value: IntValue) -> Result<()> {
        write_uint8(value as u8, self.cursor)
    }

    fn write_uint32(&mut self, value: IntValue) -> Result<()> {
        write_fixed_u32(value as u32, self.cursor)
    }

    fn write_uint64(&mut self, value: IntValue) -> Result<()> {
        write_fixed_u64(value, self.cursor)
    }

    fn write_varint32(&mut self, value: IntValue) -> Result<()> {
        write_varint32(value as i64 as i32, self.cursor)
    }

    fn write_varint64(&mut self, value: IntValue) -> Result<()> {
        write_varint64(value as i64, self.cursor)
    }

    fn write_varuint32(&mut self, value: IntValue) -> Result<()> {
        write_varuint32(value as u32, self.cursor)
    }

    fn write_varuint64(&mut self, value: IntValue) -> Result<()> {
        write_varuint64(value, self.cursor)
    }

    fn write_action(&mut self, sym: SymbolId) -> Result<()> {
        match classify_for_writer(sym, &self.predefined) {
            ActionEffect::Apply(crate::interp::actions::BlockAction::Enter) => self.open_block(),
            ActionEffect::Apply(crate::interp::actions::BlockAction::Exit) => self.close_block(),
            ActionEffect::NoOp => Ok(()),
            ActionEffect::Unrecognized => Err(Error::protocol_violation(
                "ByteWriter",
                "unrecognized action symbol",
            )),
        }
    }

    fn open_block(&mut self) -> Result<()> {
        let length_addr = self.cursor.address();
        write_fixed_varuint32(0, RESERVED_LENGTH_WIDTH, self.cursor)?;
        let body_start = self.cursor.address();
        self.open_blocks.push((length_addr, body_start));
        Ok(())
    }

    fn close_block(&mut self) -> Result<()> {
        let (length_addr, body_start) = self
            .open_blocks
            .pop()
            .ok_or_else(|| Error::protocol_violation("ByteWriter", "close_block with no open block"))?;
        let body_len = self.cursor.address() - body_start;

        if self.minimize {
            let min_width = varuint_size(body_len).max(1);
            if min_width < RESERVED_LENGTH_WIDTH {
                let shift = (RESERVED_LENGTH_WIDTH - min_width) as u64;
                let mut buf = vec![0u8; body_len as usize];
                let mut raddr = body_start;
                self.cursor.queue().read(&mut raddr, &mut buf)?;
                let new_body_start = body_start - shift;
                let mut waddr = new_body_start;
                self.cursor.queue().write(&mut waddr, &buf)?;
                let bytes = fixed_varuint_bytes(body_len as u32, min_width)?;
                self.cursor.patch(length_addr, &bytes)?;
                self.cursor.set_address(new_body_start + body_len);
                return Ok(());
            }
        }
        let bytes = fixed_varuint_bytes(body_len as u32, RESERVED_LENGTH_WIDTH)?;
        self.cursor.patch(length_addr, &bytes)
    }

    fn set_minimize_block_size(&mut self, minimize: bool) {
        self.minimize = minimize;
    }

    fn freeze_eof(&mut self) -> Result<()> {
        if !self.open_blocks.is_empty() {
            return Err(Error::protocol_violation(
                "ByteWriter",
                "freeze_eof with open blocks",
            ));
        }
        self.cursor.freeze_eof();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SymbolTable;
    use crate::stream::queue::Queue;
    use std::rc::Rc;

    fn predefined() -> PredefinedSymbols {
        SymbolTable::new().predefined
    }

    #[test]
    fn nested_blocks_minimized_round_trip() {
        let q = Rc::new(Queue::new());
        let mut wc = WriteCursor::new(q.clone());
        {
            let mut w = ByteWriter::new(&mut wc, predefined());
            w.set_minimize_block_size(true);
            w.open_block().unwrap();
            w.write_uint8(1).unwrap();
            w.open_block().unwrap();
            w.write_uint8(2).unwrap();
            w.close_block().unwrap();
            w.write_uint8(3).unwrap();
            w.close_block().unwrap();
            w.freeze_eof().unwrap();
        }

        let mut rc = ReadCursor::new(q);
        let mut r = ByteReader::new(&mut rc, predefined());
        r.open_block().unwrap();
        assert_eq!(r.read_uint8().unwrap(), 1);
        r.open_block().unwrap();
        assert_eq!(r.read_uint8().unwrap(), 2);
        r.close_block().unwrap();
        assert_eq!(r.read_uint8().unwrap(), 3);
        r.close_block().unwrap();
    }

    #[test]
    fn close_without_open_fails() {
        let q = Rc::new(Queue::new());
        let mut wc = WriteCursor::new(q);
        let mut w = ByteWriter::new(&mut wc, predefined());
        assert!(w.close_block().is_err());
    }
}

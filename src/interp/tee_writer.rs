//! A writer that broadcasts every write action to a set of child writers
//! (spec.md §4.5, "tee writer that fans out to a list of children").
//!
//! Grounded on `original_source/src/interp/TeeWriter.h/.cpp`: each typed
//! write is forwarded to every child in registration order, stopping at
//! the first child that fails.

use crate::ast::SymbolId;
use crate::error::Result;
use crate::interp::writer::Writer;
use crate::intstream::{IntTypeFormat, IntValue};

/// Fans out writes to its children; holds them as borrowed trait
/// objects since every current caller tees within one stack frame.
pub struct TeeWriter<'a> {
    children: Vec<&'a mut dyn Writer>,
}

impl<'a> TeeWriter<'a> {
    pub fn new() -> Self {
        TeeWriter { children: Vec::new() }
    }

    pub fn add(&mut self, writer: &'a mut dyn Writer) {
        self.children.push(writer);
    }
}

impl<'a> Default for TeeWriter<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Writer for TeeWriter<'a> {
    fn write_uint8(&mut self, value: IntValue) -> Result<()> {
        for c in self.children.iter_mut() {
            c.write_uint8(value)?;
        }
        Ok(())
    }
    fn write_uint32(&mut self, value: IntValue) -> Result<()> {
        for c in self.children.iter_mut() {
            c.write_uint32(value)?;
        }
        Ok(())
    }
    fn write_uint64(&mut self, value: IntValue) -> Result<()> {
        for c in self.children.iter_mut() {
            c.write_uint64(value)?;
        }
        Ok(())
    }
    fn write_varint32(&mut self, value: IntValue) -> Result<()> {
        for c in self.children.iter_mut() {
            c.write_varint32(value)?;
        }
        Ok(())
    }
    fn write_varint64(&mut self, value: IntValue) -> Result<()> {
        for c in self.children.iter_mut() {
            c.write_varint64(value)?;
        }
        Ok(())
    }
    fn write_varuint32(&mut self, value: IntValue) -> Result<()> {
        for c in self.children.iter_mut() {
            c.write_varuint32(value)?;
        }
        Ok(())
    }
    fn write_varuint64(&mut self, value: IntValue) -> Result<()> {
        for c in self.children.iter_mut() {
            c.write_varuint64(value)?;
        }
        Ok(())
    }

    fn write_value(&mut self, value: IntValue, format: IntTypeFormat) -> Result<()> {
        for c in self.children.iter_mut() {
            c.write_value(value, format)?;
        }
        Ok(())
    }

    fn write_action(&mut self, sym: SymbolId) -> Result<()> {
        for c in self.children.iter_mut() {
            c.write_action(sym)?;
        }
        Ok(())
    }

    fn write_header_value(&mut self, value: IntValue, format: IntTypeFormat) -> Result<()> {
        for c in self.children.iter_mut() {
            c.write_header_value(value, format)?;
        }
        Ok(())
    }

    fn open_block(&mut self) -> Result<()> {
        for c in self.children.iter_mut() {
            c.open_block()?;
        }
        Ok(())
    }

    fn close_block(&mut self) -> Result<()> {
        for c in self.children.iter_mut() {
            c.close_block()?;
        }
        Ok(())
    }

    fn set_minimize_block_size(&mut self, minimize: bool) {
        for c in self.children.iter_mut() {
            c.set_minimize_block_size(minimize);
        }
    }

    fn freeze_eof(&mut self) -> Result<()> {
        for c in self.children.iter_mut() {
            c.freeze_eof()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SymbolTable;
    use crate::intstream::cursor::WriteCursor;
    use crate::intstream::IntStream;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn new_int_writer(stream: &Rc<RefCell<IntStream>>) -> WriteCursor {
        WriteCursor::new(stream.clone())
    }

    #[test]
    fn broadcasts_values_and_blocks_to_every_child() {
        let predefined = SymbolTable::new().predefined;
        let a = Rc::new(RefCell::new(IntStream::new()));
        let b = Rc::new(RefCell::new(IntStream::new()));
        let mut cursor_a = new_int_writer(&a);
        let mut cursor_b = new_int_writer(&b);

        {
            let mut writer_a = crate::interp::int_io::IntStreamWriter::new(&mut cursor_a, predefined);
            let mut writer_b = crate::interp::int_io::IntStreamWriter::new(&mut cursor_b, predefined);
            let mut tee = TeeWriter::new();
            tee.add(&mut writer_a);
            tee.add(&mut writer_b);

            tee.write_uint8(7).unwrap();
            tee.open_block().unwrap();
            tee.write_uint8(8).unwrap();
            tee.close_block().unwrap();
            tee.freeze_eof().unwrap();
        }

        assert_eq!(a.borrow().values(), &[7, 8]);
        assert_eq!(b.borrow().values(), &[7, 8]);
    }

    #[test]
    fn stops_at_the_first_child_that_fails() {
        let predefined = SymbolTable::new().predefined;
        let a = Rc::new(RefCell::new(IntStream::new()));
        let mut cursor_a = new_int_writer(&a);
        {
            let mut writer_a = crate::interp::int_io::IntStreamWriter::new(&mut cursor_a, predefined);
            writer_a.freeze_eof().unwrap();

            let mut tee = TeeWriter::new();
            tee.add(&mut writer_a);
            // A frozen int-stream writer rejects further writes.
            assert!(tee.write_uint8(1).is_err());
        }
    }
}

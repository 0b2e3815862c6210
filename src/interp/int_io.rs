//! `Reader`/`Writer` implementations over an [`IntStream`] cursor: the
//! intermediate representation stage between the byte-level container
//! and the integer compressor (spec.md §4.5, "integer-stream writer").

use crate::ast::{PredefinedSymbols, SymbolId};
use crate::error::{Error, Result};
use crate::interp::actions::{classify_for_reader, classify_for_writer, ActionEffect};
use crate::interp::reader::Reader;
use crate::interp::writer::Writer;
use crate::intstream::cursor::{ReadCursor, WriteCursor};
use crate::intstream::{IntTypeFormat, IntValue};

pub struct IntStreamReader<'a> {
    cursor: &'a mut ReadCursor,
    predefined: PredefinedSymbols,
}

impl<'a> IntStreamReader<'a> {
    pub fn new(cursor: &'a mut ReadCursor, predefined: PredefinedSymbols) -> Self {
        IntStreamReader { cursor, predefined }
    }
}

impl<'a> Reader for IntStreamReader<'a> {
    fn read_uint8(&mut self) -> Result<IntValue> {
        self.cursor.read()
    }
    fn read_uint32(&mut self) -> Result<IntValue> {
        self.cursor.read()
    }
    fn read_uint64(&mut self) -> Result<IntValue> {
        self.cursor.read()
    }
    fn read_varint32(&mut self) -> Result<IntValue> {
        self.cursor.read()
    }
    fn read_varint64(&mut self) -> Result<IntValue> {
        self.cursor.read()
    }
    fn read_varuint32(&mut self) -> Result<IntValue> {
        self.cursor.read()
    }
    fn read_varuint64(&mut self) -> Result<IntValue> {
        self.cursor.read()
    }

    fn read_value(&mut self, _format: IntTypeFormat) -> Result<IntValue> {
        self.cursor.read()
    }

    fn read_action(&mut self, sym: SymbolId) -> Result<()> {
        match classify_for_reader(sym, &self.predefined) {
            ActionEffect::Apply(crate::interp::actions::BlockAction::Enter) => self.open_block(),
            ActionEffect::Apply(crate::interp::actions::BlockAction::Exit) => self.close_block(),
            ActionEffect::NoOp => Ok(()),
            ActionEffect::Unrecognized => Err(Error::protocol_violation(
                "IntStreamReader",
                "unrecognized action symbol",
            )),
        }
    }

    fn open_block(&mut self) -> Result<()> {
        if !self.cursor.open_block() {
            return Err(Error::protocol_violation(
                "IntStreamReader",
                "open_block does not match next recorded block",
            ));
        }
        Ok(())
    }

    fn close_block(&mut self) -> Result<()> {
        if !self.cursor.close_block()? {
            return Err(Error::protocol_violation(
                "IntStreamReader",
                "close_block index does not match block end",
            ));
        }
        Ok(())
    }

    fn peek(&mut self, _f: &mut dyn FnMut(&mut dyn Reader) -> Result<()>) -> Result<()> {
        Err(Error::internal(
            "IntStreamReader",
            "peek is not supported over an integer stream",
        ))
    }

    fn at_input_eob(&self) -> bool {
        self.cursor.at_eob()
    }

    fn can_process_more_input_now(&self, _headroom: u64) -> bool {
        // The integer stream is fully materialized in memory; there is
        // never a reason to suspend reading it.
        true
    }
}

pub struct IntStreamWriter<'a> {
    cursor: &'a mut WriteCursor,
    predefined: PredefinedSymbols,
    minimize: bool,
}

impl<'a> IntStreamWriter<'a> {
    pub fn new(cursor: &'a mut WriteCursor, predefined: PredefinedSymbols) -> Self {
        IntStreamWriter {
            cursor,
            predefined,
            minimize: false,
        }
    }
}

impl<'a> Writer for IntStreamWriter<'a> {
    fn write_uint8(&mut self, value: IntValue) -> Result<()> {
        self.cursor.write(value)
    }
    fn write_uint32(&mut self, value: IntValue) -> Result<()> {
        self.cursor.write(value)
    }
    fn write_uint64(&mut self, value: IntValue) -> Result<()> {
        self.cursor.write(value)
    }
    fn write_varint32(&mut self, value: IntValue) -> Result<()> {
        self.cursor.write(value)
    }
    fn write_varint64(&mut self, value: IntValue) -> Result<()> {
        self.cursor.write(value)
    }
    fn write_varuint32(&mut self, value: IntValue) -> Result<()> {
        self.cursor.write(value)
    }
    fn write_varuint64(&mut self, value: IntValue) -> Result<()> {
        self.cursor.write(value)
    }

    fn write_value(&mut self, value: IntValue, _format: IntTypeFormat) -> Result<()> {
        self.cursor.write(value)
    }

    fn write_action(&mut self, sym: SymbolId) -> Result<()> {
        match classify_for_writer(sym, &self.predefined) {
            ActionEffect::Apply(crate::interp::actions::BlockAction::Enter) => self.open_block(),
            ActionEffect::Apply(crate::interp::actions::BlockAction::Exit) => self.close_block(),
            ActionEffect::NoOp => Ok(()),
            ActionEffect::Unrecognized => Err(Error::protocol_violation(
                "IntStreamWriter",
                "unrecognized action symbol",
            )),
        }
    }

    fn open_block(&mut self) -> Result<()> {
        self.cursor.open_block();
        Ok(())
    }

    fn close_block(&mut self) -> Result<()> {
        self.cursor.close_block()?;
        Ok(())
    }

    fn set_minimize_block_size(&mut self, minimize: bool) {
        // Block-size minimization is a byte-container concept; recorded
        // here only so a chained byte stage downstream can query it.
        self.minimize = minimize;
    }

    fn freeze_eof(&mut self) -> Result<()> {
        self.cursor.freeze_eof();
        Ok(())
    }
}

impl<'a> IntStreamWriter<'a> {
    pub fn minimize_block_size(&self) -> bool {
        self.minimize
    }
}

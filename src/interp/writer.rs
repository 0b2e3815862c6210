//! The interpreter's output-side contract: typed writes, header
//! emission, block scoping with optional minimization, and actions.
//!
//! Grounded on spec.md §4.5.

use crate::ast::SymbolId;
use crate::error::Result;
use crate::intstream::{IntTypeFormat, IntValue};

pub trait Writer {
    fn write_uint8(&mut self, value: IntValue) -> Result<()>;
    fn write_uint32(&mut self, value: IntValue) -> Result<()>;
    fn write_uint64(&mut self, value: IntValue) -> Result<()>;
    fn write_varint32(&mut self, value: IntValue) -> Result<()>;
    fn write_varint64(&mut self, value: IntValue) -> Result<()>;
    fn write_varuint32(&mut self, value: IntValue) -> Result<()>;
    fn write_varuint64(&mut self, value: IntValue) -> Result<()>;

    fn write_value(&mut self, value: IntValue, format: IntTypeFormat) -> Result<()> {
        match format {
            IntTypeFormat::Uint8 => self.write_uint8(value),
            IntTypeFormat::Uint32 => self.write_uint32(value),
            IntTypeFormat::Uint64 => self.write_uint64(value),
            IntTypeFormat::Varint32 => self.write_varint32(value),
            IntTypeFormat::Varint64 => self.write_varint64(value),
            IntTypeFormat::Varuint32 => self.write_varuint32(value),
            IntTypeFormat::Varuint64 => self.write_varuint64(value),
        }
    }

    /// Propagates a recognized action symbol; per spec.md §9,
    /// `readonly`-suffixed actions are no-ops on the writer.
    fn write_action(&mut self, sym: SymbolId) -> Result<()>;

    fn write_header_value(&mut self, value: IntValue, format: IntTypeFormat) -> Result<()> {
        self.write_value(value, format)
    }

    fn open_block(&mut self) -> Result<()>;
    fn close_block(&mut self) -> Result<()>;

    fn set_minimize_block_size(&mut self, minimize: bool);
    fn freeze_eof(&mut self) -> Result<()>;
}

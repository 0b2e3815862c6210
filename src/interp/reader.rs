//! The interpreter's input-side contract: typed reads, header matching,
//! block scoping, peeking, and suspension introspection.
//!
//! Grounded on spec.md §4.5.

use crate::ast::SymbolId;
use crate::error::Result;
use crate::intstream::{IntTypeFormat, IntValue};

pub trait Reader {
    fn read_uint8(&mut self) -> Result<IntValue>;
    fn read_uint32(&mut self) -> Result<IntValue>;
    fn read_uint64(&mut self) -> Result<IntValue>;
    fn read_varint32(&mut self) -> Result<IntValue>;
    fn read_varint64(&mut self) -> Result<IntValue>;
    fn read_varuint32(&mut self) -> Result<IntValue>;
    fn read_varuint64(&mut self) -> Result<IntValue>;

    fn read_value(&mut self, format: IntTypeFormat) -> Result<IntValue> {
        match format {
            IntTypeFormat::Uint8 => self.read_uint8(),
            IntTypeFormat::Uint32 => self.read_uint32(),
            IntTypeFormat::Uint64 => self.read_uint64(),
            IntTypeFormat::Varint32 => self.read_varint32(),
            IntTypeFormat::Varint64 => self.read_varint64(),
            IntTypeFormat::Varuint32 => self.read_varuint32(),
            IntTypeFormat::Varuint64 => self.read_varuint64(),
        }
    }

    /// Propagates a recognized action symbol (`block.enter`/`block.exit`,
    /// per spec.md §4.4); unrecognized symbols fail with
    /// `ProtocolViolation`.
    fn read_action(&mut self, sym: SymbolId) -> Result<()>;

    /// Reads a value of `format` and checks it equals `value` (used for
    /// source/read header literals).
    fn read_header_value(&mut self, value: IntValue, format: IntTypeFormat) -> Result<bool> {
        Ok(self.read_value(format)? == value)
    }

    fn open_block(&mut self) -> Result<()>;
    fn close_block(&mut self) -> Result<()>;

    /// Saves cursor state, runs `f`, then restores it regardless of
    /// outcome (spec.md §5: "during a peek, all observed state
    /// mutations are confined to the cursor itself").
    fn peek(&mut self, f: &mut dyn FnMut(&mut dyn Reader) -> Result<()>) -> Result<()>;

    fn at_input_eob(&self) -> bool;
    fn can_process_more_input_now(&self, headroom: u64) -> bool;
    fn still_more_input_to_process_now(&self) -> bool {
        !self.at_input_eob()
    }
}

//! The integer stream intermediate representation: a flat value vector
//! with a tree of nested blocks layered over it, plus the per-value
//! format cache used to choose how each integer is eventually encoded
//! (spec.md §3, §4.3).

pub mod block;
pub mod cursor;
pub mod formats;
pub mod stream;

pub use cursor::{ReadCursor, WriteCursor};
pub use formats::{IntTypeFormat, IntTypeFormats, IntValue};
pub use stream::IntStream;

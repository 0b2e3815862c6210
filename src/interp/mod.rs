pub mod actions;
pub mod byte_io;
pub mod inflator_writer;
pub mod int_io;
pub mod interpreter;
pub mod reader;
pub mod state;
pub mod tee_writer;
pub mod writer;

pub use inflator_writer::InflatorWriter;
pub use interpreter::{Interpreter, RESUME_HEADROOM};
pub use reader::Reader;
pub use state::{Frame, Method, Modifier, State};
pub use tee_writer::TeeWriter;
pub use writer::Writer;

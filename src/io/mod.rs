//! File/stdio-backed byte sources and sinks (SPEC_FULL.md §4.10).

pub mod file_io;

pub use file_io::{open_input, open_output, STDIN_MARK, STDOUT_MARK};

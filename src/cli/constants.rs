//! Verbosity-gated diagnostic output, shared across the CLI.
//!
//! Grounded on `jafreck-lz4r/src/cli/constants.rs`'s `DISPLAY_LEVEL`
//! atomic and `displaylevel!` macro: a crate-level global rather than a
//! value threaded through every call, since diagnostics are emitted
//! from deep inside the interpreter and pipeline where plumbing a
//! verbosity argument would touch nearly every function signature.
//!
//! 0 = silent; 1 = errors only; 2 = normal; 3 = verbose; 4 = trace.

use std::sync::atomic::{AtomicU32, Ordering};

pub static DISPLAY_LEVEL: AtomicU32 = AtomicU32::new(2);

#[inline]
pub fn display_level() -> u32 {
    DISPLAY_LEVEL.load(Ordering::Relaxed)
}

#[inline]
pub fn set_display_level(level: u32) {
    DISPLAY_LEVEL.store(level, Ordering::Relaxed);
}

/// Print to stdout, unconditionally — result/payload output, never a
/// diagnostic.
#[macro_export]
macro_rules! displayout {
    ($($arg:tt)*) => { print!($($arg)*) };
}

/// Print to stderr, unconditionally.
#[macro_export]
macro_rules! display {
    ($($arg:tt)*) => { eprint!($($arg)*) };
}

/// Print to stderr only when the current display level is at or above
/// `level`.
#[macro_export]
macro_rules! displaylevel {
    ($level:expr, $($arg:tt)*) => {
        if $crate::cli::constants::display_level() >= $level {
            eprint!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_level_round_trips() {
        let prev = display_level();
        set_display_level(3);
        assert_eq!(display_level(), 3);
        set_display_level(prev);
    }
}

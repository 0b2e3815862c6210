//! Error kinds shared by every layer of the core: streams, the integer
//! stream, the AST/interpreter, and the integer compressor.

use thiserror::Error;

/// A single-line diagnostic naming the failing component and, where
/// known, the AST node kind involved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A typed read demanded more bytes than the input provides before a
    /// frozen EOF or before the current end-of-block.
    #[error("{component}: unexpected eof at address {address}")]
    UnexpectedEof { component: &'static str, address: u64 },

    /// A LEB128 sequence was malformed, a value didn't fit the requested
    /// format, a header literal didn't match, or a block length was
    /// inconsistent.
    #[error("{component}: bad format: {reason}")]
    BadFormat {
        component: &'static str,
        reason: String,
    },

    /// A block was closed before it was opened, a cursor crossed a block
    /// boundary on open/close, or an action symbol was unrecognized.
    #[error("{component}: protocol violation: {reason}")]
    ProtocolViolation {
        component: &'static str,
        reason: String,
    },

    /// AST evaluation referenced a symbol not resolvable in the current
    /// scope chain.
    #[error("{component}: unbound symbol {name:?}")]
    UnboundSymbol { component: &'static str, name: String },

    /// A write was attempted past a frozen EOF.
    #[error("{component}: write past frozen eof at address {address}")]
    FrozenWrite { component: &'static str, address: u64 },

    /// An invariant was violated (kind/state mismatch). Fatal.
    #[error("{component}: internal error: {reason}")]
    Internal {
        component: &'static str,
        reason: String,
    },
}

impl Error {
    pub fn unexpected_eof(component: &'static str, address: u64) -> Self {
        Error::UnexpectedEof { component, address }
    }

    pub fn bad_format(component: &'static str, reason: impl Into<String>) -> Self {
        Error::BadFormat {
            component,
            reason: reason.into(),
        }
    }

    pub fn protocol_violation(component: &'static str, reason: impl Into<String>) -> Self {
        Error::ProtocolViolation {
            component,
            reason: reason.into(),
        }
    }

    pub fn unbound_symbol(component: &'static str, name: impl Into<String>) -> Self {
        Error::UnboundSymbol {
            component,
            name: name.into(),
        }
    }

    pub fn frozen_write(component: &'static str, address: u64) -> Self {
        Error::FrozenWrite { component, address }
    }

    pub fn internal(component: &'static str, reason: impl Into<String>) -> Self {
        Error::Internal {
            component,
            reason: reason.into(),
        }
    }

    /// The component name carried by every variant, used by the CLI to
    /// build the `ErrorsFound` diagnostic line.
    pub fn component(&self) -> &'static str {
        match self {
            Error::UnexpectedEof { component, .. }
            | Error::BadFormat { component, .. }
            | Error::ProtocolViolation { component, .. }
            | Error::UnboundSymbol { component, .. }
            | Error::FrozenWrite { component, .. }
            | Error::Internal { component, .. } => component,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_component() {
        let e = Error::unexpected_eof("ByteCursor", 42);
        assert_eq!(e.component(), "ByteCursor");
        assert!(e.to_string().contains("ByteCursor"));
        assert!(e.to_string().contains("42"));
    }
}

//! A small S-expression front-end for the filter AST (SPEC_FULL.md
//! §4.9), grounded loosely in the shape of
//! `original_source/src/sexp-parser/Driver.h` and
//! `original_source/src/sexp/CasmReader.h` but implemented as a
//! hand-rolled recursive-descent reader rather than a port of the
//! original's bison/flex grammar: macros, comments-as-data, and
//! pretty-printing are out of scope.

pub mod lexer;
pub mod parser;

pub use parser::parse;

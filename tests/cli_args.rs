//! Argument-parsing checks for `casm::cli::Cli` (SPEC_FULL.md §6's flag
//! table), exercised through `clap`'s parser directly rather than by
//! spawning the compiled binary.

use casm::cli::{Cli, Command};
use clap::Parser;

#[test]
fn parses_compress_with_input_and_output_paths() {
    let cli = Cli::try_parse_from([
        "casm",
        "compress",
        "--filter",
        "copy.casm",
        "-i",
        "in.bin",
        "-o",
        "out.bin",
    ])
    .expect("valid compress invocation");
    assert!(matches!(cli.command, Command::Compress));
    assert_eq!(cli.filter.as_deref().unwrap().to_str().unwrap(), "copy.casm");
    assert_eq!(cli.input.as_deref(), Some("in.bin"));
    assert_eq!(cli.output.as_deref(), Some("out.bin"));
    assert!(!cli.expect_fail);
}

#[test]
fn repeated_verbose_flags_accumulate() {
    let cli = Cli::try_parse_from(["casm", "decompress", "--filter", "f.casm", "-vvv"])
        .expect("valid decompress invocation");
    assert_eq!(cli.verbose, 3);
}

#[test]
fn expect_fail_and_minimize_flags_parse() {
    let cli = Cli::try_parse_from([
        "casm",
        "encode-filter",
        "--filter",
        "f.casm",
        "--expect-fail",
        "-m",
    ])
    .expect("valid encode-filter invocation");
    assert!(matches!(cli.command, Command::EncodeFilter));
    assert!(cli.expect_fail);
    assert!(cli.minimize_block_size);
}

#[test]
fn missing_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["casm"]).is_err());
}

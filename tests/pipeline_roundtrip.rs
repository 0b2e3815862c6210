//! End-to-end compress/decompress scenarios exercising the interpreter,
//! the integer compressor, and the container codec together, the way
//! spec.md §8's "end-to-end scenarios" frame a round trip: parse a
//! filter, compress under it, decompress under the same filter, and
//! get the original bytes back exactly.

use casm::ast::{AlgorithmId, NodeKind, SymbolTable};
use casm::config::Prefs;
use casm::text::parse;

fn load(src: &str) -> (SymbolTable, AlgorithmId) {
    let mut table = SymbolTable::new();
    let file = parse(src, &mut table).expect("filter source parses");
    let alg_node = table.node(file).children[0];
    let alg = match table.node(alg_node).kind {
        NodeKind::Algorithm(id) => id,
        _ => panic!("expected an algorithm node"),
    };
    (table, alg)
}

fn round_trip(src: &str, prefs: &Prefs, original: &[u8]) -> Vec<u8> {
    let (table, alg) = load(src);
    let mut compressed = Vec::new();
    casm::pipeline::compress(&table, alg, prefs, &mut &original[..], &mut compressed)
        .expect("compress succeeds");

    let mut restored = Vec::new();
    casm::pipeline::decompress(&table, alg, &mut &compressed[..], &mut restored)
        .expect("decompress succeeds");
    restored
}

#[test]
fn byte_copy_filter_round_trips_arbitrary_bytes() {
    let src = "(algorithm copy (source) (read) (write) \
                (loop.unbounded (seq (read uint8) (write uint8))))";
    let original: Vec<u8> = (0..=255u8).chain(0..=255u8).collect();
    let prefs = Prefs::default();
    assert_eq!(round_trip(src, &prefs, &original), original);
}

#[test]
fn highly_repetitive_input_compresses_smaller_and_still_round_trips() {
    let src = "(algorithm copy (source) (read) (write) \
                (loop.unbounded (seq (read uint8) (write uint8))))";
    let original: Vec<u8> = std::iter::repeat([1u8, 2, 1, 2, 1, 2, 3])
        .take(64)
        .flatten()
        .collect();
    let prefs = Prefs {
        count_cutoff: 2,
        weight_cutoff: 1,
        up_to_size: 2,
        window: original.len(),
        pattern_length_limit: original.len(),
        ..Prefs::default()
    };

    let (table, alg) = load(src);
    let mut compressed = Vec::new();
    casm::pipeline::compress(&table, alg, &prefs, &mut &original[..], &mut compressed).unwrap();
    assert!(
        compressed.len() < original.len(),
        "expected the repeated 1,2 pattern to compress: {} vs {}",
        compressed.len(),
        original.len()
    );

    let mut restored = Vec::new();
    casm::pipeline::decompress(&table, alg, &mut &compressed[..], &mut restored).unwrap();
    assert_eq!(restored, original);
}

#[test]
fn switch_driven_filter_reads_a_tag_and_conditional_payload() {
    // Tag 0 is followed by a one-byte payload; tag 1 stands alone.
    let src = "(algorithm tagged (source) (read) (write) \
                (loop.unbounded \
                    (switch (read uint8) \
                        (case 0 0 (write uint8) (read uint8) (write uint8)) \
                        (case 1 1 (write uint8)))))";
    let original: Vec<u8> = vec![0, 42, 1, 0, 7];
    let prefs = Prefs::default();
    let restored = round_trip(src, &prefs, &original);
    assert_eq!(restored, original);
}

#[test]
fn block_structured_filter_round_trips_its_nested_region() {
    // The length prefix is written with a fixed 5-byte varuint (spec.md §9's
    // reserved block-length width), so the input encodes it the same way to
    // reproduce the original bytes exactly.
    let src = "(algorithm blocked (source) (read) (write) \
                (read uint8) (write uint8) \
                (block (read uint8) (write uint8) (read uint8) (write uint8)) \
                (read uint8) (write uint8))";
    let original: Vec<u8> = vec![0xAA, 0x82, 0x80, 0x80, 0x80, 0x00, 0x01, 0x02, 0xBB];
    let prefs = Prefs::default();
    assert_eq!(round_trip(src, &prefs, &original), original);
}

#[test]
fn decompressing_a_truncated_container_is_an_error_not_a_panic() {
    let src = "(algorithm copy (source) (read) (write) \
                (loop.unbounded (seq (read uint8) (write uint8))))";
    let (table, alg) = load(src);
    let original = vec![1u8, 2, 3, 4, 5];
    let prefs = Prefs::default();
    let mut compressed = Vec::new();
    casm::pipeline::compress(&table, alg, &prefs, &mut &original[..], &mut compressed).unwrap();

    let truncated = &compressed[..compressed.len() / 2];
    let mut restored = Vec::new();
    assert!(casm::pipeline::decompress(&table, alg, &mut &truncated[..], &mut restored).is_err());
}

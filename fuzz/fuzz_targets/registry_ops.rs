//! Fuzz target for registry operations
//!
//! Drives a registry with arbitrary insert, query and discard sequences and
//! checks that stored mappings never overlap.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mpseq_core::{MappingRegistry, RegistryConfig, SeqNum, SequenceMapping};

#[derive(Debug, Arbitrary)]
enum Op {
    Insert { data: u32, subflow: u32, length: u16 },
    InsertAuto { data: u32, length: u16 },
    Translate(u32),
    Discard(u32),
    DiscardData(u32),
}

#[derive(Debug, Arbitrary)]
struct RegistryInput {
    tx_head: u32,
    strict: bool,
    ops: Vec<Op>,
}

fuzz_target!(|input: RegistryInput| {
    let head = SeqNum::new(input.tx_head);
    let config = RegistryConfig {
        enforce_subflow_order: input.strict,
        ..RegistryConfig::default()
    };
    let mut registry = MappingRegistry::with_config(config);
    registry.bind_transmit_buffer(&head);

    // Cap op count to keep the quadratic overlap check below cheap
    for op in input.ops.iter().take(256) {
        match *op {
            Op::Insert { data, subflow, length } => {
                let mapping = SequenceMapping::with_positions(SeqNum::new(data), SeqNum::new(subflow), length);
                let _ = registry.insert_with_fixed_subflow_position(mapping);
            }
            Op::InsertAuto { data, length } => {
                let mut mapping = SequenceMapping::new();
                mapping.configure(SeqNum::new(data), length);
                let _ = registry.insert_with_auto_assigned_subflow_position(mapping);
            }
            Op::Translate(ssn) => {
                let _ = registry.translate(SeqNum::new(ssn));
            }
            Op::Discard(watermark) => {
                registry.discard_mappings_below(SeqNum::new(watermark));
            }
            Op::DiscardData(watermark) => {
                registry.discard_mappings_below_data(SeqNum::new(watermark));
            }
        }
    }

    let stored: Vec<_> = registry.iter().copied().collect();
    for (i, a) in stored.iter().enumerate() {
        for b in stored.iter().skip(i + 1) {
            assert!(!a.overlaps(b) && !b.overlaps(a), "{a} overlaps {b}");
        }
    }
    let _ = registry.dump();
});

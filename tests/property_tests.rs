//! Property-based tests for mpseq
//!
//! Uses proptest to verify registry invariants across arbitrary insertion
//! sequences.

use mpseq_core::{MappingRegistry, SeqNum, SequenceMapping};
use mpseq_integration_tests::{StubTxBuffer, outgoing_mapping, received_mapping};
use proptest::prelude::*;

/// Arbitrary received mappings packed into a small window so that
/// collisions are frequent and no range crosses the counter wrap.
fn arb_mapping() -> impl Strategy<Value = SequenceMapping> {
    (0u32..4000, 0u32..4000, 1u16..200)
        .prop_map(|(data, subflow, length)| received_mapping(data, subflow, length))
}

fn filled_registry(candidates: &[SequenceMapping]) -> MappingRegistry<'static> {
    let mut registry = MappingRegistry::new();
    for mapping in candidates {
        let _ = registry.insert_with_fixed_subflow_position(*mapping);
    }
    registry
}

// ============================================================================
// Insertion Invariants
// ============================================================================

mod insertion_properties {
    use super::*;

    proptest! {
        /// No two stored mappings overlap in either space
        #[test]
        fn stored_mappings_never_overlap(
            candidates in prop::collection::vec(arb_mapping(), 0..40),
        ) {
            let registry = filled_registry(&candidates);
            let stored: Vec<_> = registry.iter().copied().collect();

            for (i, a) in stored.iter().enumerate() {
                for b in stored.iter().skip(i + 1) {
                    prop_assert!(!a.overlaps(b), "{} overlaps {}", a, b);
                    prop_assert!(!b.overlaps(a), "{} overlaps {}", b, a);
                }
            }
        }

        /// Stored mappings are sorted by data head
        #[test]
        fn stored_mappings_sorted(
            candidates in prop::collection::vec(arb_mapping(), 0..40),
        ) {
            let registry = filled_registry(&candidates);
            let heads: Vec<u32> = registry.iter().map(|m| m.data_head().value()).collect();

            for pair in heads.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
        }

        /// A failed insertion leaves the registry untouched
        #[test]
        fn failed_insert_is_atomic(
            candidates in prop::collection::vec(arb_mapping(), 1..40),
            extra in arb_mapping(),
        ) {
            let mut registry = filled_registry(&candidates);
            let before: Vec<_> = registry.iter().map(|m| (m.data_head(), m.subflow_head(), m.length())).collect();

            if registry.insert_with_fixed_subflow_position(extra).is_err() {
                let after: Vec<_> = registry.iter().map(|m| (m.data_head(), m.subflow_head(), m.length())).collect();
                prop_assert_eq!(before, after);
            } else {
                prop_assert_eq!(registry.len(), before.len() + 1);
            }
        }

        /// Auto-assigned mappings tile the subflow space from the buffer head
        #[test]
        fn auto_insert_tiles_subflow_space(
            head in 0u32..1_000_000,
            lengths in prop::collection::vec(1u16..1500, 1..30),
        ) {
            let tx = StubTxBuffer::new(head);
            let mut registry = MappingRegistry::with_transmit_buffer(&tx);

            let mut data_head = 0u32;
            let mut expected_ssn = head;
            for length in &lengths {
                let mapping = registry
                    .insert_with_auto_assigned_subflow_position(outgoing_mapping(data_head, *length))
                    .expect("disjoint chunks must insert");
                prop_assert_eq!(mapping.subflow_head(), SeqNum::new(expected_ssn));
                data_head += u32::from(*length);
                expected_ssn += u32::from(*length);
            }

            prop_assert_eq!(
                registry.next_unmapped_subflow_position().unwrap(),
                SeqNum::new(expected_ssn)
            );
        }
    }
}

// ============================================================================
// Query Properties
// ============================================================================

mod query_properties {
    use super::*;

    proptest! {
        /// Lookup is Some exactly when a stored range covers the position
        #[test]
        fn find_matches_brute_force(
            candidates in prop::collection::vec(arb_mapping(), 0..40),
            positions in prop::collection::vec(0u32..4300, 1..50),
        ) {
            let registry = filled_registry(&candidates);

            for pos in positions {
                let ssn = SeqNum::new(pos);
                let covering = registry.iter().filter(|m| m.contains_subflow(ssn)).count();
                prop_assert!(covering <= 1);

                let found = registry.find_mapping_for_subflow_position(ssn);
                prop_assert_eq!(found.is_some(), covering == 1);

                if let Some(mapping) = found {
                    let offset = pos - mapping.subflow_head().value();
                    prop_assert_eq!(
                        registry.translate(ssn),
                        Some(SeqNum::new(mapping.data_head().value() + offset))
                    );
                } else {
                    prop_assert_eq!(registry.translate(ssn), None);
                }
            }
        }
    }
}

// ============================================================================
// Pruning Properties
// ============================================================================

mod discard_properties {
    use super::*;

    proptest! {
        /// Discarding twice with the same watermark changes nothing the second time
        #[test]
        fn discard_is_idempotent(
            candidates in prop::collection::vec(arb_mapping(), 0..40),
            watermark in 0u32..4300,
        ) {
            let mut registry = filled_registry(&candidates);
            registry.discard_mappings_below(SeqNum::new(watermark));
            let once: Vec<_> = registry.iter().map(|m| (m.data_head(), m.subflow_head())).collect();

            prop_assert_eq!(registry.discard_mappings_below(SeqNum::new(watermark)), 0);
            let twice: Vec<_> = registry.iter().map(|m| (m.data_head(), m.subflow_head())).collect();
            prop_assert_eq!(once, twice);
        }

        /// Discard removes exactly the mappings that end below the watermark
        #[test]
        fn discard_respects_watermark(
            candidates in prop::collection::vec(arb_mapping(), 0..40),
            watermark in 0u32..4300,
        ) {
            let mut registry = filled_registry(&candidates);
            let total = registry.len();
            let below = registry
                .iter()
                .filter(|m| m.subflow_tail().value() < watermark)
                .count();

            prop_assert_eq!(registry.discard_mappings_below(SeqNum::new(watermark)), below);
            prop_assert_eq!(registry.len(), total - below);
            prop_assert!(registry.iter().all(|m| m.subflow_tail().value() >= watermark));
        }
    }
}

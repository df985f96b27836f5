//! Mapping scripts: ordered registry operations loaded from TOML.
//!
//! ```toml
//! tx_head = 1
//!
//! [[step]]
//! op = "insert_auto"
//! data_head = 100
//! length = 10
//!
//! [[step]]
//! op = "translate"
//! subflow = 5
//! ```

use mpseq_core::{MappingRegistry, RegistryConfig, SeqNum, SequenceMapping};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// A replayable sequence of registry operations
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Head position reported by the transmit buffer stub
    #[serde(default)]
    pub tx_head: Option<SeqNum>,
    /// Steps in execution order
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

/// One registry operation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Strict insertion with both anchors given
    Insert {
        /// Data head
        data_head: SeqNum,
        /// Subflow head
        subflow_head: SeqNum,
        /// Length in bytes
        length: u16,
    },
    /// Insertion at the next unmapped subflow position
    InsertAuto {
        /// Data head
        data_head: SeqNum,
        /// Length in bytes
        length: u16,
    },
    /// Subflow to data translation
    Translate {
        /// Subflow position
        subflow: SeqNum,
    },
    /// Lookup of the covering mapping
    Find {
        /// Subflow position
        subflow: SeqNum,
    },
    /// Next unmapped subflow position
    NextUnmapped,
    /// Subflow watermark pruning
    Discard {
        /// Subflow watermark
        watermark: SeqNum,
    },
    /// Data watermark pruning
    DiscardData {
        /// Data watermark
        watermark: SeqNum,
    },
    /// Registry listing
    Dump,
}

impl Script {
    /// Load a script from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse a script from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid script.
    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Run every step against a fresh registry
    ///
    /// Returns one output line per step. A step that fails is reported in
    /// its line and does not stop the replay.
    pub fn replay(&self, config: &RegistryConfig) -> Vec<String> {
        let mut registry = MappingRegistry::with_config(config.clone());
        if let Some(head) = &self.tx_head {
            registry.bind_transmit_buffer(head);
        }

        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                tracing::debug!("Step {}: {:?}", index + 1, step);
                format!("[{}] {}", index + 1, step.apply(&mut registry))
            })
            .collect()
    }
}

impl Step {
    fn apply(&self, registry: &mut MappingRegistry<'_>) -> String {
        match *self {
            Step::Insert {
                data_head,
                subflow_head,
                length,
            } => {
                let mapping = SequenceMapping::with_positions(data_head, subflow_head, length);
                match registry.insert_with_fixed_subflow_position(mapping) {
                    Ok(()) => format!("insert {mapping}: ok"),
                    Err(e) => format!("insert {mapping}: {e}"),
                }
            }
            Step::InsertAuto { data_head, length } => {
                let mut mapping = SequenceMapping::new();
                mapping.configure(data_head, length);
                match registry.insert_with_auto_assigned_subflow_position(mapping) {
                    Ok(mapping) => format!("insert_auto {mapping}: ok"),
                    Err(e) => format!("insert_auto DSN {data_head} length {length}: {e}"),
                }
            }
            Step::Translate { subflow } => match registry.translate(subflow) {
                Some(dsn) => format!("translate SSN {subflow}: DSN {dsn}"),
                None => format!("translate SSN {subflow}: not mapped"),
            },
            Step::Find { subflow } => match registry.find_mapping_for_subflow_position(subflow) {
                Some(mapping) => format!("find SSN {subflow}: {mapping}"),
                None => format!("find SSN {subflow}: not mapped"),
            },
            Step::NextUnmapped => match registry.next_unmapped_subflow_position() {
                Ok(ssn) => format!("next_unmapped: SSN {ssn}"),
                Err(e) => format!("next_unmapped: {e}"),
            },
            Step::Discard { watermark } => {
                let removed = registry.discard_mappings_below(watermark);
                format!(
                    "discard below SSN {watermark}: removed {removed}, {} left",
                    registry.len()
                )
            }
            Step::DiscardData { watermark } => {
                let removed = registry.discard_mappings_below_data(watermark);
                format!(
                    "discard below DSN {watermark}: removed {removed}, {} left",
                    registry.len()
                )
            }
            Step::Dump => format!("dump\n{}", registry.dump()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"
tx_head = 1

[[step]]
op = "insert_auto"
data_head = 100
length = 10

[[step]]
op = "insert"
data_head = 200
subflow_head = 5
length = 11

[[step]]
op = "insert"
data_head = 110
subflow_head = 11
length = 10

[[step]]
op = "next_unmapped"

[[step]]
op = "translate"
subflow = 15

[[step]]
op = "discard"
watermark = 15

[[step]]
op = "find"
subflow = 5
"#;

    #[test]
    fn test_parse_script() {
        let script = Script::parse(SCRIPT).unwrap();
        assert_eq!(script.tx_head, Some(SeqNum::new(1)));
        assert_eq!(script.steps.len(), 7);
        assert_eq!(
            script.steps[0],
            Step::InsertAuto {
                data_head: SeqNum::new(100),
                length: 10
            }
        );
        assert_eq!(script.steps[3], Step::NextUnmapped);
    }

    #[test]
    fn test_parse_rejects_unknown_op() {
        let result = Script::parse("[[step]]\nop = \"explode\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let result = Script::parse("[[step]]\nop = \"translate\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_replay() {
        let script = Script::parse(SCRIPT).unwrap();
        let lines = script.replay(&RegistryConfig::default());

        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "[1] insert_auto DSN [100-109] mapped to SSN [1-10]: ok");
        assert!(lines[1].contains("mapping conflict"));
        assert!(lines[2].ends_with(": ok"));
        assert_eq!(lines[3], "[4] next_unmapped: SSN 21");
        assert_eq!(lines[4], "[5] translate SSN 15: DSN 114");
        assert_eq!(lines[5], "[6] discard below SSN 15: removed 1, 1 left");
        assert_eq!(lines[6], "[7] find SSN 5: not mapped");
    }

    #[test]
    fn test_replay_without_tx_head() {
        let script = Script::parse("[[step]]\nop = \"insert_auto\"\ndata_head = 1\nlength = 1\n").unwrap();
        let lines = script.replay(&RegistryConfig::default());

        assert!(lines[0].contains("precondition violated"));
    }

    #[test]
    fn test_replay_dump() {
        let script = Script::parse(
            "[[step]]\nop = \"insert\"\ndata_head = 100\nsubflow_head = 1\nlength = 10\n\n[[step]]\nop = \"dump\"\n",
        )
        .unwrap();
        let lines = script.replay(&RegistryConfig::default());

        assert!(lines[1].contains("DSN [100-109] mapped to SSN [1-10]"));
    }

    #[test]
    fn test_bundled_script() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/scripts/send_and_prune.toml");
        let script = Script::load(path).unwrap();
        let lines = script.replay(&RegistryConfig::default());

        assert_eq!(lines.len(), 7);
        assert!(lines[2].contains("mapping conflict"));
        assert_eq!(lines[3], "[4] translate SSN 15: DSN 114");
        assert_eq!(lines[4], "[5] next_unmapped: SSN 21");
        assert_eq!(lines[5], "[6] discard below SSN 15: removed 1, 1 left");
    }
}

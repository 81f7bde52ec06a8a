//! # Cross-Check Configuration
//!
//! Everything a run needs to know, passed in explicitly: the engine never
//! reads process-wide settings.
//!
//! ## TOML layout
//!
//! ```toml
//! namespace_index = 4
//! node_prefix = "|var|NEXTO PLC.Z.O83."
//! sample_count = 20
//! word_order = "big_endian"        # or "word_swap"
//! empty_coil_policy = "read_as_false"  # or "reject"
//! ```
//!
//! Missing keys take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bytes::WordOrder;
use crate::codec::{Decoder, EmptyCoilPolicy};
use crate::constants::{DEFAULT_NAMESPACE_INDEX, DEFAULT_NODE_PREFIX, DEFAULT_SAMPLE_COUNT};
use crate::error::{CrossCheckError, CrossCheckResult};

/// Settings for address translation, sampling and decoding.
///
/// # Example
///
/// ```rust
/// use voltage_crosscheck::{CrossCheckConfig, WordOrder};
///
/// let config = CrossCheckConfig::new()
///     .with_namespace_index(2)
///     .with_node_prefix("Plc.")
///     .with_sample_count(5)
///     .with_word_order(WordOrder::WordSwap);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.sample_count, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossCheckConfig {
    /// OPC UA namespace index for derived node identifiers.
    pub namespace_index: u16,
    /// Path prefix prepended to tag names in node identifiers.
    pub node_prefix: String,
    /// Number of tags to compare per run.
    pub sample_count: usize,
    /// Word order of register pairs.
    pub word_order: WordOrder,
    /// Behaviour for empty single-coil replies.
    pub empty_coil_policy: EmptyCoilPolicy,
}

impl Default for CrossCheckConfig {
    fn default() -> Self {
        Self {
            namespace_index: DEFAULT_NAMESPACE_INDEX,
            node_prefix: DEFAULT_NODE_PREFIX.to_string(),
            sample_count: DEFAULT_SAMPLE_COUNT,
            word_order: WordOrder::default(),
            empty_coil_policy: EmptyCoilPolicy::default(),
        }
    }
}

impl CrossCheckConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the OPC UA namespace index.
    pub fn with_namespace_index(mut self, index: u16) -> Self {
        self.namespace_index = index;
        self
    }

    /// Set the node path prefix.
    pub fn with_node_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.node_prefix = prefix.into();
        self
    }

    /// Set the number of tags compared per run.
    pub fn with_sample_count(mut self, count: usize) -> Self {
        self.sample_count = count;
        self
    }

    /// Set the word order for register pairs.
    pub fn with_word_order(mut self, order: WordOrder) -> Self {
        self.word_order = order;
        self
    }

    /// Set the empty single-coil policy.
    pub fn with_empty_coil_policy(mut self, policy: EmptyCoilPolicy) -> Self {
        self.empty_coil_policy = policy;
        self
    }

    /// Decoder matching these settings.
    pub fn decoder(&self) -> Decoder {
        Decoder::new()
            .with_word_order(self.word_order)
            .with_empty_coil_policy(self.empty_coil_policy)
    }

    /// Reject settings a run cannot use.
    pub fn validate(&self) -> CrossCheckResult<()> {
        if self.sample_count == 0 {
            return Err(CrossCheckError::config("sample_count must be at least 1"));
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> CrossCheckResult<Self> {
        let config: CrossCheckConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> CrossCheckResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> CrossCheckResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

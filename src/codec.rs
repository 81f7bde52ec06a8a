//! # Register Decoder
//!
//! Turns a raw Modbus reply into a [`DecodedValue`].
//!
//! ## Decoding by kind and count
//!
//! | Kind | Count | Result | Short reply |
//! |------|-------|--------|-------------|
//! | Coil / DiscreteInput | 1 | `Boolean` | `Boolean(false)` (legacy) or `EmptyResult` |
//! | Coil / DiscreteInput | other | `BooleanArray` | bits as delivered |
//! | Holding / Input | 1 | `ScalarInt16` | `EmptyResult` |
//! | Holding / Input | 2 | `AmbiguousWide` | `InsufficientData` |
//! | Holding / Input | other | `Int16Array` | words as delivered |
//!
//! The decoder never chooses between the integer and float readings of a
//! register pair; see [`crate::resolve`] for that.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bytes::WordOrder;
use crate::constants::WIDE_REGISTER_COUNT;
use crate::error::{CrossCheckError, CrossCheckResult};
use crate::tag::{RegisterKind, TagDescriptor};
use crate::value::{DecodedValue, WideValue};

/// What to do when a single-coil read returns no bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyCoilPolicy {
    /// Report `Boolean(false)`, indistinguishable from a real `false`.
    /// Kept so results line up with existing comparison logs.
    #[default]
    ReadAsFalse,
    /// Report [`CrossCheckError::EmptyResult`].
    Reject,
}

/// Raw units returned by a Modbus read.
///
/// Bit kinds fill `bits`, register kinds fill `words`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRead {
    /// Register words, in wire order
    pub words: Vec<u16>,
    /// Coil/discrete input states, in address order
    pub bits: Vec<bool>,
}

impl RawRead {
    /// Reply to a register read.
    pub fn from_words(words: Vec<u16>) -> Self {
        Self {
            words,
            bits: Vec::new(),
        }
    }

    /// Reply to a coil or discrete input read.
    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self {
            words: Vec::new(),
            bits,
        }
    }

    /// Whether nothing came back.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.bits.is_empty()
    }
}

/// Register decoder with its word-order and empty-coil settings.
///
/// # Example
///
/// ```rust
/// use voltage_crosscheck::{Decoder, DecodedValue, RegisterKind};
///
/// let decoder = Decoder::new();
/// let value = decoder
///     .decode(&RegisterKind::HoldingRegister, &[0xFFFF], &[], 1)
///     .unwrap();
/// assert_eq!(value, DecodedValue::ScalarInt16(-1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decoder {
    /// Word order for register pairs.
    pub word_order: WordOrder,
    /// Behaviour for empty single-coil replies.
    pub empty_coil_policy: EmptyCoilPolicy,
}

impl Decoder {
    /// Decoder with big-endian pairs and the legacy empty-coil behaviour.
    pub fn new() -> Self {
        Self::default()
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

    /// Decode raw units for a tag of `kind` spanning `count` registers/bits.
    pub fn decode(
        &self,
        kind: &RegisterKind,
        words: &[u16],
        bits: &[bool],
        count: u16,
    ) -> CrossCheckResult<DecodedValue> {
        match kind {
            RegisterKind::Coil | RegisterKind::DiscreteInput => self.decode_bits(kind, bits, count),
            RegisterKind::HoldingRegister | RegisterKind::InputRegister => {
                self.decode_words(kind, words, count)
            }
            RegisterKind::Other(_) => Err(CrossCheckError::unsupported_kind(kind)),
        }
    }

    /// Decode a collaborator reply for `tag`.
    pub fn decode_read(&self, tag: &TagDescriptor, raw: &RawRead) -> CrossCheckResult<DecodedValue> {
        self.decode(&tag.register_kind, &raw.words, &raw.bits, tag.register_count)
    }

    fn decode_bits(
        &self,
        kind: &RegisterKind,
        bits: &[bool],
        count: u16,
    ) -> CrossCheckResult<DecodedValue> {
        if count != 1 {
            return Ok(DecodedValue::BooleanArray(bits.to_vec()));
        }

        match (bits.first(), self.empty_coil_policy) {
            (Some(&bit), _) => Ok(DecodedValue::Boolean(bit)),
            (None, EmptyCoilPolicy::ReadAsFalse) => {
                debug!("Empty {} read, reporting false", kind);
                Ok(DecodedValue::Boolean(false))
            }
            (None, EmptyCoilPolicy::Reject) => Err(CrossCheckError::empty_result(kind)),
        }
    }

    fn decode_words(
        &self,
        kind: &RegisterKind,
        words: &[u16],
        count: u16,
    ) -> CrossCheckResult<DecodedValue> {
        match count {
            1 => words
                .first()
                .map(|&w| DecodedValue::ScalarInt16(w as i16))
                .ok_or_else(|| CrossCheckError::empty_result(kind)),
            WIDE_REGISTER_COUNT => match words {
                [high, low, rest @ ..] => {
                    if !rest.is_empty() {
                        debug!("Ignoring {} surplus words in register pair", rest.len());
                    }
                    Ok(DecodedValue::AmbiguousWide(WideValue::from_words(
                        [*high, *low],
                        self.word_order,
                    )))
                }
                _ => Err(CrossCheckError::insufficient_data(
                    usize::from(WIDE_REGISTER_COUNT),
                    words.len(),
                )),
            },
            _ => Ok(DecodedValue::Int16Array(
                words.iter().map(|&w| w as i16).collect(),
            )),
        }
    }
}

/// Decode with big-endian pairs and the legacy empty-coil behaviour.
///
/// # Example
///
/// ```rust
/// use voltage_crosscheck::{decode, DecodedValue, RegisterKind};
///
/// let value = decode(&RegisterKind::InputRegister, &[0x41C8, 0x0000], &[], 2).unwrap();
/// match value {
///     DecodedValue::AmbiguousWide(wide) => assert_eq!(wide.as_f32, 25.0),
///     other => panic!("unexpected {:?}", other),
/// }
/// ```
pub fn decode(
    kind: &RegisterKind,
    words: &[u16],
    bits: &[bool],
    count: u16,
) -> CrossCheckResult<DecodedValue> {
    Decoder::new().decode(kind, words, bits, count)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_coil() {
        assert_eq!(
            decode(&RegisterKind::Coil, &[], &[true], 1).unwrap(),
            DecodedValue::Boolean(true)
        );
        assert_eq!(
            decode(&RegisterKind::DiscreteInput, &[], &[false], 1).unwrap(),
            DecodedValue::Boolean(false)
        );
    }

    #[test]
    fn test_empty_single_coil_reads_false() {
        assert_eq!(
            decode(&RegisterKind::Coil, &[], &[], 1).unwrap(),
            DecodedValue::Boolean(false)
        );
    }

    #[test]
    fn test_empty_single_coil_rejected_when_strict() {
        let decoder = Decoder::new().with_empty_coil_policy(EmptyCoilPolicy::Reject);
        let err = decoder.decode(&RegisterKind::Coil, &[], &[], 1).unwrap_err();
        assert_eq!(err, CrossCheckError::empty_result("Coil"));
    }

    #[test]
    fn test_multiple_coils_not_padded() {
        let value = decode(&RegisterKind::Coil, &[], &[true, false, true], 8).unwrap();
        assert_eq!(value, DecodedValue::BooleanArray(vec![true, false, true]));
    }

    #[test]
    fn test_single_register_signed() {
        assert_eq!(
            decode(&RegisterKind::HoldingRegister, &[0x8000], &[], 1).unwrap(),
            DecodedValue::ScalarInt16(i16::MIN)
        );
        assert_eq!(
            decode(&RegisterKind::InputRegister, &[42], &[], 1).unwrap(),
            DecodedValue::ScalarInt16(42)
        );
    }

    #[test]
    fn test_single_register_empty() {
        let err = decode(&RegisterKind::HoldingRegister, &[], &[], 1).unwrap_err();
        assert!(matches!(err, CrossCheckError::EmptyResult { .. }));
    }

    #[test]
    fn test_register_pair() {
        let value = decode(&RegisterKind::HoldingRegister, &[0x4270, 0x0000], &[], 2).unwrap();
        let DecodedValue::AmbiguousWide(wide) = value else {
            panic!("Expected AmbiguousWide");
        };
        assert_eq!(wide.as_f32, 60.0);
        assert_eq!(wide.as_i32, 1114636288);
        assert_eq!(wide.raw, [0x4270, 0x0000]);
    }

    #[test]
    fn test_register_pair_word_swap() {
        let decoder = Decoder::new().with_word_order(WordOrder::WordSwap);
        let value = decoder
            .decode(&RegisterKind::HoldingRegister, &[0x0000, 0x4270], &[], 2)
            .unwrap();
        let DecodedValue::AmbiguousWide(wide) = value else {
            panic!("Expected AmbiguousWide");
        };
        assert_eq!(wide.as_f32, 60.0);
    }

    #[test]
    fn test_register_pair_insufficient() {
        let err = decode(&RegisterKind::HoldingRegister, &[0x4270], &[], 2).unwrap_err();
        assert_eq!(err, CrossCheckError::insufficient_data(2, 1));

        let err = decode(&RegisterKind::InputRegister, &[], &[], 2).unwrap_err();
        assert_eq!(err, CrossCheckError::insufficient_data(2, 0));
    }

    #[test]
    fn test_register_array_truncated() {
        let value = decode(&RegisterKind::HoldingRegister, &[1, 0xFFFF, 3], &[], 5).unwrap();
        assert_eq!(value, DecodedValue::Int16Array(vec![1, -1, 3]));
    }

    #[test]
    fn test_unsupported_kind() {
        let kind = RegisterKind::Other("StringRegister".into());
        let err = decode(&kind, &[1], &[true], 1).unwrap_err();
        assert_eq!(err, CrossCheckError::unsupported_kind("StringRegister"));
    }

    #[test]
    fn test_decode_read() {
        let tag = TagDescriptor::new("Level", RegisterKind::InputRegister, 7, 1);
        let raw = RawRead::from_words(vec![300]);
        assert_eq!(
            Decoder::new().decode_read(&tag, &raw).unwrap(),
            DecodedValue::ScalarInt16(300)
        );
    }
}

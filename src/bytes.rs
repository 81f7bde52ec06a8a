//! # Word Order for Wide Scalars
//!
//! A 32-bit quantity spread over two Modbus registers can arrive with its
//! words in either order, depending on the PLC or gateway.
//!
//! Uses ABCD notation where A is the most significant byte. For `0x12345678`:
//! - `BigEndian (ABCD)`: registers \[0x1234, 0x5678\]
//! - `WordSwap (CDAB)`: registers \[0x5678, 0x1234\]
//!
//! Bytes inside each register are always big-endian on the Modbus wire.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Order of the two 16-bit words forming a 32-bit value.
///
/// # Example
///
/// ```rust
/// use voltage_crosscheck::WordOrder;
///
/// let order = WordOrder::from_str("CDAB").unwrap();
/// assert_eq!(order, WordOrder::WordSwap);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordOrder {
    /// ABCD: high word first (Modbus convention)
    #[default]
    BigEndian,
    /// CDAB: low word first, common on some PLC gateways
    WordSwap,
}

impl WordOrder {
    /// Parse the usual spellings: "ABCD", "BE", "CDAB", "word_swap", ...
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        match normalized.as_str() {
            "ABCD" | "BE" | "BIGENDIAN" => Some(Self::BigEndian),
            "CDAB" | "WORDSWAP" | "BIGENDIANSWAP" => Some(Self::WordSwap),
            _ => None,
        }
    }

    /// Get descriptive name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BigEndian => "ABCD (Big-Endian)",
            Self::WordSwap => "CDAB (Word Swap)",
        }
    }
}

impl fmt::Display for WordOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assemble two registers into a 32-bit pattern.
///
/// ```rust
/// use voltage_crosscheck::bytes::{regs_to_u32, WordOrder};
///
/// assert_eq!(regs_to_u32([0x1234, 0x5678], WordOrder::BigEndian), 0x1234_5678);
/// assert_eq!(regs_to_u32([0x5678, 0x1234], WordOrder::WordSwap), 0x1234_5678);
/// ```
#[inline]
pub fn regs_to_u32(regs: [u16; 2], order: WordOrder) -> u32 {
    let (high, low) = match order {
        WordOrder::BigEndian => (regs[0], regs[1]),
        WordOrder::WordSwap => (regs[1], regs[0]),
    };
    (u32::from(high) << 16) | u32::from(low)
}

/// Split a 32-bit pattern into two registers. Inverse of [`regs_to_u32`].
#[inline]
pub fn u32_to_regs(value: u32, order: WordOrder) -> [u16; 2] {
    let high = (value >> 16) as u16;
    let low = (value & 0xFFFF) as u16;
    match order {
        WordOrder::BigEndian => [high, low],
        WordOrder::WordSwap => [low, high],
    }
}

/// Encode an f32 as two registers.
#[inline]
pub fn f32_to_regs(value: f32, order: WordOrder) -> [u16; 2] {
    u32_to_regs(value.to_bits(), order)
}

/// Encode an i32 as two registers.
#[inline]
pub fn i32_to_regs(value: i32, order: WordOrder) -> [u16; 2] {
    u32_to_regs(value as u32, order)
}

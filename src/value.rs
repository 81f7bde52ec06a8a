//! # Tag Value Types
//!
//! Closed value types flowing between the read, decode and compare steps:
//!
//! - [`DecodedValue`]: what the register decoder makes of a Modbus reply
//! - [`NodeValue`]: the scalar variants an OPC UA read can return
//! - [`Sample`]: a borrowed view over either side, used as a comparator operand
//!
//! A two-register read is ambiguous on the wire (the same 32 bits may be an
//! `i32` or an `f32`), so it is kept as a [`WideValue`] carrying both
//! interpretations until something needs a single number.

use std::fmt;

use crate::bytes::{regs_to_u32, WordOrder};
use crate::error::{CrossCheckError, CrossCheckResult};
use crate::resolve::{resolve, Resolved};
use crate::tag::ValueKind;

/// Both readings of one 32-bit register pair.
///
/// `as_i32` and `as_f32` are bit-identical reinterpretations of the same
/// pattern; `raw` holds the words exactly as they came off the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WideValue {
    /// Signed 32-bit reading
    pub as_i32: i32,
    /// IEEE-754 single-precision reading
    pub as_f32: f32,
    /// Wire words, in arrival order
    pub raw: [u16; 2],
}

impl WideValue {
    /// Assemble two wire words into both interpretations.
    ///
    /// ```rust
    /// use voltage_crosscheck::{WideValue, WordOrder};
    ///
    /// let wide = WideValue::from_words([0x4270, 0x0000], WordOrder::BigEndian);
    /// assert_eq!(wide.as_f32, 60.0);
    /// assert_eq!(wide.as_i32, 1114636288);
    /// ```
    pub fn from_words(raw: [u16; 2], order: WordOrder) -> Self {
        let bits = regs_to_u32(raw, order);
        Self {
            as_i32: bits as i32,
            as_f32: f32::from_bits(bits),
            raw,
        }
    }

    /// The shared 32-bit pattern.
    #[inline]
    pub fn bits(&self) -> u32 {
        self.as_i32 as u32
    }

    /// Collapse to the most plausible single reading.
    #[inline]
    pub fn resolve(&self) -> Resolved {
        resolve(self)
    }
}

impl fmt::Display for WideValue {
    /// Chosen reading first, the alternative in parentheses.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolve() {
            Resolved::Float32(v) => write!(f, "float32: {} (int32: {})", Compact(v), self.as_i32),
            Resolved::Int32(v) => write!(f, "int32: {} (float32: {})", v, Compact(self.as_f32)),
        }
    }
}

/// A decoded Modbus reading.
///
/// # Variants by kind and register count
///
/// | Kind | Count | Variant |
/// |------|-------|---------|
/// | Coil / DiscreteInput | 1 | `Boolean` |
/// | Coil / DiscreteInput | > 1 | `BooleanArray` |
/// | Holding / Input | 1 | `ScalarInt16` |
/// | Holding / Input | 2 | `AmbiguousWide` |
/// | Holding / Input | > 2 | `Int16Array` |
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    /// Single coil or discrete input
    Boolean(bool),
    /// Several coils or discrete inputs, as delivered
    BooleanArray(Vec<bool>),
    /// Single register, signed
    ScalarInt16(i16),
    /// Register pair, both interpretations retained
    AmbiguousWide(WideValue),
    /// More than two registers, each signed
    Int16Array(Vec<i16>),
}

impl DecodedValue {
    /// Returns the variant name for logging/debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            DecodedValue::Boolean(_) => "bool",
            DecodedValue::BooleanArray(_) => "[bool]",
            DecodedValue::ScalarInt16(_) => "int16",
            DecodedValue::AmbiguousWide(_) => "int32|float32",
            DecodedValue::Int16Array(_) => "[int16]",
        }
    }

    /// Number of bits or words carried.
    pub fn len(&self) -> usize {
        match self {
            DecodedValue::Boolean(_) | DecodedValue::ScalarInt16(_) => 1,
            DecodedValue::AmbiguousWide(_) => 2,
            DecodedValue::BooleanArray(v) => v.len(),
            DecodedValue::Int16Array(v) => v.len(),
        }
    }

    /// Whether an array variant came back empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Boolean(v) => write!(f, "{}", v),
            DecodedValue::BooleanArray(v) => write!(f, "{:?}", v),
            DecodedValue::ScalarInt16(v) => write!(f, "{}", v),
            DecodedValue::AmbiguousWide(w) => write!(f, "{}", w),
            DecodedValue::Int16Array(v) => write!(f, "{:?}", v),
        }
    }
}

/// Scalar variants returned by an OPC UA attribute read.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    /// Boolean
    Boolean(bool),
    /// Int16
    Int16(i16),
    /// Int32
    Int32(i32),
    /// Int64
    Int64(i64),
    /// UInt16
    UInt16(u16),
    /// UInt32
    UInt32(u32),
    /// Float
    Float(f32),
    /// Double
    Double(f64),
    /// String
    String(String),
}

impl NodeValue {
    /// Returns the OPC UA built-in type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeValue::Boolean(_) => "Boolean",
            NodeValue::Int16(_) => "Int16",
            NodeValue::Int32(_) => "Int32",
            NodeValue::Int64(_) => "Int64",
            NodeValue::UInt16(_) => "UInt16",
            NodeValue::UInt32(_) => "UInt32",
            NodeValue::Float(_) => "Float",
            NodeValue::Double(_) => "Double",
            NodeValue::String(_) => "String",
        }
    }

    /// Narrow a raw read to the type the node is declared as.
    ///
    /// - `Boolean` accepts only booleans.
    /// - `Integer16` accepts any integer variant, truncating to 16 bits.
    /// - `Float32` accepts floats and integers.
    ///
    /// Strings never coerce.
    pub fn coerce(self, kind: ValueKind) -> CrossCheckResult<NodeValue> {
        let coerced = match (kind, &self) {
            (ValueKind::Boolean, NodeValue::Boolean(_)) => Some(self.clone()),
            (ValueKind::Integer16, NodeValue::Int16(_)) => Some(self.clone()),
            (ValueKind::Integer16, NodeValue::Int32(v)) => Some(NodeValue::Int16(*v as i16)),
            (ValueKind::Integer16, NodeValue::Int64(v)) => Some(NodeValue::Int16(*v as i16)),
            (ValueKind::Integer16, NodeValue::UInt16(v)) => Some(NodeValue::Int16(*v as i16)),
            (ValueKind::Integer16, NodeValue::UInt32(v)) => Some(NodeValue::Int16(*v as i16)),
            (ValueKind::Float32, NodeValue::Float(_)) => Some(self.clone()),
            (ValueKind::Float32, NodeValue::Double(v)) => Some(NodeValue::Float(*v as f32)),
            (ValueKind::Float32, NodeValue::Int16(v)) => Some(NodeValue::Float(f32::from(*v))),
            (ValueKind::Float32, NodeValue::Int32(v)) => Some(NodeValue::Float(*v as f32)),
            (ValueKind::Float32, NodeValue::Int64(v)) => Some(NodeValue::Float(*v as f32)),
            (ValueKind::Float32, NodeValue::UInt16(v)) => Some(NodeValue::Float(f32::from(*v))),
            (ValueKind::Float32, NodeValue::UInt32(v)) => Some(NodeValue::Float(*v as f32)),
            _ => None,
        };

        coerced.ok_or_else(|| {
            CrossCheckError::incomparable(format!(
                "cannot convert {} value {} to {}",
                self.type_name(),
                self,
                kind
            ))
        })
    }
}

impl fmt::Display for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeValue::Boolean(v) => write!(f, "{}", v),
            NodeValue::Int16(v) => write!(f, "{}", v),
            NodeValue::Int32(v) => write!(f, "{}", v),
            NodeValue::Int64(v) => write!(f, "{}", v),
            NodeValue::UInt16(v) => write!(f, "{}", v),
            NodeValue::UInt32(v) => write!(f, "{}", v),
            NodeValue::Float(v) => write!(f, "{}", Compact(*v)),
            NodeValue::Double(v) => write!(f, "{}", Compact(*v)),
            NodeValue::String(v) => f.write_str(v),
        }
    }
}

// ============================================================================
// From implementations for ergonomic construction
// ============================================================================

impl From<bool> for NodeValue {
    fn from(v: bool) -> Self {
        NodeValue::Boolean(v)
    }
}

impl From<i16> for NodeValue {
    fn from(v: i16) -> Self {
        NodeValue::Int16(v)
    }
}

impl From<i32> for NodeValue {
    fn from(v: i32) -> Self {
        NodeValue::Int32(v)
    }
}

impl From<i64> for NodeValue {
    fn from(v: i64) -> Self {
        NodeValue::Int64(v)
    }
}

impl From<u16> for NodeValue {
    fn from(v: u16) -> Self {
        NodeValue::UInt16(v)
    }
}

impl From<u32> for NodeValue {
    fn from(v: u32) -> Self {
        NodeValue::UInt32(v)
    }
}

impl From<f32> for NodeValue {
    fn from(v: f32) -> Self {
        NodeValue::Float(v)
    }
}

impl From<f64> for NodeValue {
    fn from(v: f64) -> Self {
        NodeValue::Double(v)
    }
}

impl From<String> for NodeValue {
    fn from(v: String) -> Self {
        NodeValue::String(v)
    }
}

impl From<&str> for NodeValue {
    fn from(v: &str) -> Self {
        NodeValue::String(v.to_string())
    }
}

/// Borrowed comparator operand: a reading from either protocol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample<'a> {
    /// Decoded Modbus reading
    Register(&'a DecodedValue),
    /// OPC UA reading
    Node(&'a NodeValue),
}

impl<'a> From<&'a DecodedValue> for Sample<'a> {
    fn from(v: &'a DecodedValue) -> Self {
        Sample::Register(v)
    }
}

impl<'a> From<&'a NodeValue> for Sample<'a> {
    fn from(v: &'a NodeValue) -> Self {
        Sample::Node(v)
    }
}

impl fmt::Display for Sample<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sample::Register(v) => write!(f, "{}", v),
            Sample::Node(v) => write!(f, "{}", v),
        }
    }
}

/// Float rendering in the style of Go's `%v`: plain decimal while the
/// decimal exponent is in `-4..6`, otherwise exponent form with a sign and at
/// least two exponent digits (`5e-05`, `1.234e-10`, `1e+06`).
pub(crate) struct Compact<T>(pub(crate) T);

impl<T> fmt::Display for Compact<T>
where
    T: Copy + Into<f64> + fmt::Display + fmt::LowerExp,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value: f64 = self.0.into();
        if value.is_nan() {
            return f.write_str("NaN");
        }
        if value.is_infinite() {
            return f.write_str(if value > 0.0 { "+Inf" } else { "-Inf" });
        }

        // Shortest round-trip digits decide the exponent
        let sci = format!("{:e}", self.0);
        let (mantissa, exponent) = match sci.split_once('e') {
            Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
            None => (sci.as_str(), 0),
        };

        if value == 0.0 || (-4..6).contains(&exponent) {
            write!(f, "{}", self.0)
        } else {
            let sign = if exponent < 0 { '-' } else { '+' };
            write!(f, "{}e{}{:02}", mantissa, sign, exponent.abs())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

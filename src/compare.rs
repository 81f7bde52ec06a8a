//! # Cross-Protocol Comparator
//!
//! Decides whether a Modbus reading and an OPC UA reading of the same tag agree.
//!
//! | Tag kind | Rule |
//! |----------|------|
//! | Coil / DiscreteInput | both sides are booleans and equal |
//! | Holding / Input register | both sides reduce to a number and differ by less than [`MATCH_TOLERANCE`] |
//! | anything else | rendered text is identical |
//!
//! The tolerance is absolute: process values here are small scaled integers
//! or plain engineering units.

use crate::constants::MATCH_TOLERANCE;
use crate::error::{CrossCheckError, CrossCheckResult};
use crate::tag::RegisterKind;
use crate::value::{DecodedValue, NodeValue, Sample};

/// Narrow an operand to a boolean.
pub fn as_bool(sample: Sample<'_>) -> Option<bool> {
    match sample {
        Sample::Register(DecodedValue::Boolean(v)) => Some(*v),
        Sample::Node(NodeValue::Boolean(v)) => Some(*v),
        _ => None,
    }
}

/// Reduce an operand to f64.
///
/// Register pairs are resolved first. Booleans, arrays and strings have no
/// numeric form.
pub fn as_f64(sample: Sample<'_>) -> Option<f64> {
    match sample {
        Sample::Register(value) => match value {
            DecodedValue::ScalarInt16(v) => Some(f64::from(*v)),
            DecodedValue::AmbiguousWide(wide) => Some(wide.resolve().as_f64()),
            DecodedValue::Boolean(_)
            | DecodedValue::BooleanArray(_)
            | DecodedValue::Int16Array(_) => None,
        },
        Sample::Node(value) => match value {
            NodeValue::Int16(v) => Some(f64::from(*v)),
            NodeValue::Int32(v) => Some(f64::from(*v)),
            NodeValue::Int64(v) => Some(*v as f64),
            NodeValue::UInt16(v) => Some(f64::from(*v)),
            NodeValue::UInt32(v) => Some(f64::from(*v)),
            NodeValue::Float(v) => Some(f64::from(*v)),
            NodeValue::Double(v) => Some(*v),
            NodeValue::Boolean(_) | NodeValue::String(_) => None,
        },
    }
}

/// Compare two readings, reporting operands that cannot be compared.
///
/// Returns `Ok(false)` for a genuine disagreement and
/// [`CrossCheckError::NoComparableRepresentation`] when either operand has no
/// boolean/numeric form for the tag kind.
pub fn try_matches<'a, 'b>(
    a: impl Into<Sample<'a>>,
    b: impl Into<Sample<'b>>,
    kind: &RegisterKind,
) -> CrossCheckResult<bool> {
    let (a, b) = (a.into(), b.into());

    match kind {
        RegisterKind::Coil | RegisterKind::DiscreteInput => {
            let left = as_bool(a).ok_or_else(|| not_comparable(a, "boolean"))?;
            let right = as_bool(b).ok_or_else(|| not_comparable(b, "boolean"))?;
            Ok(left == right)
        }
        RegisterKind::HoldingRegister | RegisterKind::InputRegister => {
            let left = as_f64(a).ok_or_else(|| not_comparable(a, "number"))?;
            let right = as_f64(b).ok_or_else(|| not_comparable(b, "number"))?;
            Ok((left - right).abs() < MATCH_TOLERANCE)
        }
        RegisterKind::Other(_) => Ok(a.to_string() == b.to_string()),
    }
}

/// Whether two readings of a tag agree.
///
/// Operands without a comparable form count as a mismatch.
///
/// # Example
///
/// ```rust
/// use voltage_crosscheck::{matches, DecodedValue, NodeValue, RegisterKind};
///
/// let modbus = DecodedValue::ScalarInt16(10);
/// let opc = NodeValue::Float(10.0005);
/// assert!(matches(&opc, &modbus, &RegisterKind::HoldingRegister));
/// ```
pub fn matches<'a, 'b>(
    a: impl Into<Sample<'a>>,
    b: impl Into<Sample<'b>>,
    kind: &RegisterKind,
) -> bool {
    try_matches(a, b, kind).unwrap_or(false)
}

fn not_comparable(sample: Sample<'_>, wanted: &str) -> CrossCheckError {
    let type_name = match sample {
        Sample::Register(v) => v.type_name(),
        Sample::Node(v) => v.type_name(),
    };
    CrossCheckError::incomparable(format!("{} value {} is not a {}", type_name, sample, wanted))
}

//! Protocol limits, default configuration and heuristic bounds
//!
//! Register/coil limits come from the Modbus specification:
//! - Maximum PDU size: 253 bytes (inherited from RS485 ADU limit of 256 bytes)
//! - Read limits are calculated to fit a response within the PDU size

// ============================================================================
// Modbus Read Limits
// ============================================================================

/// Maximum number of registers for FC03/FC04
///
/// Response PDU: 1 (FC) + 1 (byte count) + N × 2 ≤ 253, so N ≤ 125
pub const MAX_READ_REGISTERS: usize = 125;

/// Maximum number of coils for FC01/FC02
///
/// Response PDU: 1 (FC) + 1 (byte count) + ceil(N / 8) ≤ 253, rounded to 2000
pub const MAX_READ_COILS: usize = 2000;

/// Registers occupied by a wide (32-bit) scalar
pub const WIDE_REGISTER_COUNT: u16 = 2;

// ============================================================================
// Default Configuration
// ============================================================================

/// OPC UA namespace index the PLC publishes its variables under
pub const DEFAULT_NAMESPACE_INDEX: u16 = 4;

/// Path prefix prepended to every tag name in the node identifier
pub const DEFAULT_NODE_PREFIX: &str = "|var|NEXTO PLC.Z.O83.";

/// Number of tags compared per run
pub const DEFAULT_SAMPLE_COUNT: usize = 20;

// ============================================================================
// Reconciliation
// ============================================================================

/// Absolute tolerance for numeric matches
pub const MATCH_TOLERANCE: f64 = 0.001;

/// Upper bound (exclusive) for a whole-number float to be preferred
pub const WHOLE_FLOAT_LIMIT: f32 = 100_000.0;

/// Lower bound (exclusive) of the plausible float range
pub const PLAUSIBLE_FLOAT_MIN: f32 = 0.001;

/// Upper bound (exclusive) of the plausible float range
pub const PLAUSIBLE_FLOAT_MAX: f32 = 1_000_000.0;

/// Upper bound (exclusive) for an integer reading to be preferred
pub const PLAUSIBLE_INT_LIMIT: i32 = 100_000;

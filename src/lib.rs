//! # Voltage CrossCheck - Modbus / OPC UA Tag Reconciliation
//!
//! **Author:** Evan Liu <liuyifanz.1996@gmail.com>
//! **Version:** 0.1.0
//! **License:** MIT
//!
//! Verifies that a PLC reports the same process values over Modbus and over
//! OPC UA. Tags come from the PLC tool's tab-separated export; each tag is
//! translated into its OPC UA node, read over both protocols and compared.
//!
//! ## Features
//!
//! - **Address Translation**: `ns=<n>;s=<prefix><name>` node ids and BOOL/INT/REAL typing
//! - **Register Pair Disambiguation**: 32-bit pairs decoded as both INT32 and FLOAT32,
//!   then resolved with plausibility rules
//! - **Tolerant Comparison**: numeric agreement within 0.001, exact boolean agreement
//! - **Sampling**: evenly spaced, bounded sample of a large tag table
//! - **Injectable Sessions**: [`RegisterReader`] / [`NodeReader`] traits, plus an
//!   in-process [`MirrorDevice`]
//!
//! ## Register Kinds
//!
//! | Kind | Function | Count 1 | Count 2 | Count > 2 |
//! |------|----------|---------|---------|-----------|
//! | Coil | 0x01 | BOOL | bool array | bool array |
//! | Discrete Input | 0x02 | BOOL | bool array | bool array |
//! | Holding Register | 0x03 | INT | REAL (ambiguous pair) | INT array |
//! | Input Register | 0x04 | INT | REAL (ambiguous pair) | INT array |
//!
//! ## Quick Start
//!
//! ```rust
//! use voltage_crosscheck::{tag_file::parse_tags, CrossCheckConfig, CrossChecker, MirrorDevice};
//!
//! #[tokio::main]
//! async fn main() -> voltage_crosscheck::CrossCheckResult<()> {
//!     let tags = parse_tags(
//!         "Temperature\tHoldingRegister\t1\t40001\t2\t1..2\n\
//!          PumpStatus\tCoil\t5\t00005\t1\t5..5\n".as_bytes(),
//!     )?;
//!
//!     let config = CrossCheckConfig::new().with_sample_count(2);
//!     let device = MirrorDevice::from_tags(&tags, &config);
//!     device.diverge("Temperature", 0.5);
//!
//!     let mut checker = CrossChecker::new(device.clone(), device, config)?;
//!     let report = checker.run(&tags).await?;
//!
//!     assert_eq!(report.summary.mismatched, 1);
//!     assert!(!report.summary.passed());
//!     Ok(())
//! }
//! ```

// ============================================================================
// Core modules
// ============================================================================

/// Core error types and result handling
pub mod error;

/// Protocol constants and reconciliation thresholds
pub mod constants;

/// Tag, register kind and node descriptors
pub mod tag;

/// Modbus tag to OPC UA node translation
pub mod translate;

// ============================================================================
// Value handling
// ============================================================================

/// Word order handling for register pairs
pub mod bytes;

/// Decoded Modbus values and OPC UA node values
pub mod value;

/// Decoding of raw Modbus replies
pub mod codec;

/// Disambiguation of 32-bit register pairs
pub mod resolve;

/// Cross-protocol value comparison
pub mod compare;

// ============================================================================
// Run orchestration
// ============================================================================

/// Sample index selection
pub mod sampling;

/// Read-compare loop and reader traits
pub mod driver;

/// Run configuration
pub mod config;

/// Tab-separated tag table loader
pub mod tag_file;

/// In-process dual-protocol device
pub mod mirror;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// === Async runtime ===
pub use tokio;

// === Error handling ===
pub use error::{CrossCheckError, CrossCheckResult, Protocol};

// === Core types ===
pub use bytes::WordOrder;
pub use tag::{NodeDescriptor, RegisterKind, TagDescriptor, ValueKind};
pub use value::{DecodedValue, NodeValue, Sample, WideValue};

// === Reconciliation ===
pub use codec::{decode, Decoder, EmptyCoilPolicy, RawRead};
pub use compare::{matches, try_matches};
pub use resolve::{resolve, ResolutionRule, Resolved};
pub use sampling::sample_indices;
pub use translate::{translate, translate_all};

// === Driver ===
pub use config::CrossCheckConfig;
pub use driver::{
    CrossCheckReport, CrossChecker, NodeReader, RegisterReader, RunSummary, SampleOutcome, Verdict,
};
pub use mirror::MirrorDevice;

// === Thresholds (commonly needed constants) ===
pub use constants::{MATCH_TOLERANCE, WIDE_REGISTER_COUNT};

#[doc(hidden)]
pub use bytes::{f32_to_regs, i32_to_regs, regs_to_u32, u32_to_regs};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn info() -> String {
    format!(
        "Voltage CrossCheck v{} - Modbus / OPC UA tag reconciliation by Evan Liu",
        VERSION
    )
}

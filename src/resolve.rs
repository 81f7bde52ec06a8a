//! # Value Disambiguator
//!
//! Picks one reading out of an ambiguous register pair.
//!
//! This is a plausibility filter, not a type oracle: it assumes process values
//! are small scaled numbers. Values outside the bounds below can be resolved
//! to the wrong interpretation, and callers that need exact typing must carry
//! the type out of band.
//!
//! ## Decision order (first match wins)
//!
//! | Rule | Condition | Choice |
//! |------|-----------|--------|
//! | 1 | `f32` in `[0, 100000)` and a whole number | float |
//! | 2 | `f32` in `(0.001, 1000000)` | float |
//! | 3 | `i32` in `[0, 100000)` | int |
//! | 4 | otherwise | float |

use std::fmt;

use crate::constants::{
    PLAUSIBLE_FLOAT_MAX, PLAUSIBLE_FLOAT_MIN, PLAUSIBLE_INT_LIMIT, WHOLE_FLOAT_LIMIT,
};
use crate::value::{Compact, WideValue};

/// The interpretation chosen for a register pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved {
    /// Read as IEEE-754 single
    Float32(f32),
    /// Read as signed 32-bit integer
    Int32(i32),
}

impl Resolved {
    /// Widen to f64 for comparison.
    #[inline]
    pub fn as_f64(&self) -> f64 {
        match self {
            Resolved::Float32(v) => f64::from(*v),
            Resolved::Int32(v) => f64::from(*v),
        }
    }

    /// Returns the type name as a string for logging/debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Resolved::Float32(_) => "float32",
            Resolved::Int32(_) => "int32",
        }
    }
}

impl fmt::Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Float32(v) => write!(f, "{}", Compact(*v)),
            Resolved::Int32(v) => write!(f, "{}", v),
        }
    }
}

/// Which rule of the decision table fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionRule {
    /// Non-negative whole number below 100000 as float
    WholeFloat,
    /// Float in the plausible engineering range
    PlausibleFloat,
    /// Integer in the plausible counter range
    PlausibleInt,
    /// Nothing looked plausible; float by default
    DefaultFloat,
}

impl ResolutionRule {
    /// Apply this rule's choice to a register pair.
    #[inline]
    pub fn apply(self, wide: &WideValue) -> Resolved {
        match self {
            ResolutionRule::PlausibleInt => Resolved::Int32(wide.as_i32),
            _ => Resolved::Float32(wide.as_f32),
        }
    }
}

/// Find the first rule of the decision table that matches.
///
/// NaN and infinite floats fail both float rules.
pub fn classify(wide: &WideValue) -> ResolutionRule {
    let f = wide.as_f32;
    let i = wide.as_i32;

    if (0.0..WHOLE_FLOAT_LIMIT).contains(&f) && f.fract() == 0.0 {
        ResolutionRule::WholeFloat
    } else if f > PLAUSIBLE_FLOAT_MIN && f < PLAUSIBLE_FLOAT_MAX {
        ResolutionRule::PlausibleFloat
    } else if (0..PLAUSIBLE_INT_LIMIT).contains(&i) {
        ResolutionRule::PlausibleInt
    } else {
        ResolutionRule::DefaultFloat
    }
}

/// Collapse a register pair to its most plausible reading.
///
/// # Example
///
/// ```rust
/// use voltage_crosscheck::{resolve, Resolved, WideValue, WordOrder};
///
/// // 0x42700000 is 60.0 as a float and 1114636288 as an integer
/// let wide = WideValue::from_words([0x4270, 0x0000], WordOrder::BigEndian);
/// assert_eq!(resolve(&wide), Resolved::Float32(60.0));
///
/// // 100 as an integer is a denormal-range float
/// let wide = WideValue::from_words([0x0000, 0x0064], WordOrder::BigEndian);
/// assert_eq!(resolve(&wide), Resolved::Int32(100));
/// ```
#[inline]
pub fn resolve(wide: &WideValue) -> Resolved {
    classify(wide).apply(wide)
}

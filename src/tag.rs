//! # Tag Descriptor Model
//!
//! The same physical tag as each protocol sees it.
//!
//! | Modbus kind | Count | OPC UA value kind |
//! |-------------|-------|-------------------|
//! | Coil / DiscreteInput | any | Boolean |
//! | Holding / Input register | 1 | Integer16 |
//! | Holding / Input register | 2 | Float32 |
//! | anything else | any | Integer16 |

use std::fmt;
use std::str::FromStr;

use crate::constants::WIDE_REGISTER_COUNT;

/// Modbus addressing space a tag lives in.
///
/// Tag tables may name kinds this crate does not model; those are kept
/// verbatim in [`RegisterKind::Other`] so they still translate and compare.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegisterKind {
    /// Read/write single bit (FC01)
    Coil,
    /// Read-only single bit (FC02)
    DiscreteInput,
    /// Read/write 16-bit word (FC03)
    HoldingRegister,
    /// Read-only 16-bit word (FC04)
    InputRegister,
    /// Unrecognized kind name from the tag source
    Other(String),
}

impl RegisterKind {
    /// Canonical name, as written in tag tables.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Coil => "Coil",
            Self::DiscreteInput => "DiscreteInput",
            Self::HoldingRegister => "HoldingRegister",
            Self::InputRegister => "InputRegister",
            Self::Other(name) => name,
        }
    }

    /// Single-bit kinds.
    #[inline]
    pub fn is_bit(&self) -> bool {
        matches!(self, Self::Coil | Self::DiscreteInput)
    }

    /// 16-bit word kinds.
    #[inline]
    pub fn is_register(&self) -> bool {
        matches!(self, Self::HoldingRegister | Self::InputRegister)
    }

    /// Whether the decoder knows how to interpret reads of this kind.
    #[inline]
    pub fn is_modelled(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Modbus read function code for this kind, if any.
    pub fn read_function_code(&self) -> Option<u8> {
        match self {
            Self::Coil => Some(0x01),
            Self::DiscreteInput => Some(0x02),
            Self::HoldingRegister => Some(0x03),
            Self::InputRegister => Some(0x04),
            Self::Other(_) => None,
        }
    }
}

impl FromStr for RegisterKind {
    type Err = std::convert::Infallible;

    /// Never fails: unknown names become [`RegisterKind::Other`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "Coil" => Self::Coil,
            "DiscreteInput" => Self::DiscreteInput,
            "HoldingRegister" => Self::HoldingRegister,
            "InputRegister" => Self::InputRegister,
            other => Self::Other(other.to_string()),
        })
    }
}

impl fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tag as exposed over Modbus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDescriptor {
    /// Identifier, unique within a run
    pub name: String,
    /// Addressing space
    pub register_kind: RegisterKind,
    /// 1-based register/coil offset as exposed by the PLC
    pub address: u16,
    /// Fully-qualified address (e.g. 40001), informational only
    pub extended_address: u32,
    /// Consecutive words or bits the value occupies (at least 1)
    pub register_count: u16,
    /// Display range such as `2210..2211`, informational only
    pub address_range: String,
}

impl TagDescriptor {
    /// Create a descriptor with no extended address or range text.
    pub fn new(
        name: impl Into<String>,
        register_kind: RegisterKind,
        address: u16,
        register_count: u16,
    ) -> Self {
        Self {
            name: name.into(),
            register_kind,
            address,
            extended_address: 0,
            register_count,
            address_range: String::new(),
        }
    }

    /// Set the informational extended address.
    pub fn with_extended_address(mut self, extended_address: u32) -> Self {
        self.extended_address = extended_address;
        self
    }

    /// Set the informational range text.
    pub fn with_address_range(mut self, range: impl Into<String>) -> Self {
        self.address_range = range.into();
        self
    }

    /// Zero-based offset to put on the wire.
    ///
    /// Returns `None` for address 0, which has no 1-based meaning.
    #[inline]
    pub fn wire_address(&self) -> Option<u16> {
        self.address.checked_sub(1)
    }

    /// Whether the value spans exactly two registers.
    #[inline]
    pub fn is_wide(&self) -> bool {
        self.register_kind.is_register() && self.register_count == WIDE_REGISTER_COUNT
    }
}

/// OPC UA data type a node is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// BOOL
    Boolean,
    /// INT (16-bit signed)
    Integer16,
    /// REAL (IEEE-754 single)
    Float32,
}

impl ValueKind {
    /// Derive the node value kind from the Modbus kind and width.
    pub fn for_register(kind: &RegisterKind, count: u16) -> Self {
        match kind {
            RegisterKind::Coil | RegisterKind::DiscreteInput => Self::Boolean,
            RegisterKind::HoldingRegister | RegisterKind::InputRegister => match count {
                1 => Self::Integer16,
                WIDE_REGISTER_COUNT => Self::Float32,
                _ => Self::Integer16,
            },
            RegisterKind::Other(_) => Self::Integer16,
        }
    }

    /// IEC 61131-3 type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "BOOL",
            Self::Integer16 => "INT",
            Self::Float32 => "REAL",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tag as exposed over OPC UA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDescriptor {
    /// Copied from the Modbus descriptor
    pub name: String,
    /// `ns=<index>;s=<prefix><name>`
    pub node_id: String,
    /// Expected data type
    pub value_kind: ValueKind,
}

//! Error types for the cross-check engine
//!
//! Core decode/compare failures are local and recoverable: the driver records
//! them per sample and moves on. Only [`CrossCheckError::SessionLost`] aborts a run.

use std::fmt;

use thiserror::Error;

/// Result type used throughout the crate.
pub type CrossCheckResult<T> = Result<T, CrossCheckError>;

/// The two read paths being cross-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Register-oriented path
    Modbus,
    /// Node-oriented path
    OpcUa,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Modbus => write!(f, "Modbus"),
            Protocol::OpcUa => write!(f, "OPC UA"),
        }
    }
}

/// Errors surfaced by decoding, comparison, collaborators and configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CrossCheckError {
    /// Fewer raw words than a wide decode requires
    #[error("Insufficient data: expected {expected} words, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// A scalar decode received zero units
    #[error("Empty result for {kind} read")]
    EmptyResult { kind: String },

    /// Decode or read requested for a register kind the decoder does not model
    #[error("Unsupported register kind: {kind}")]
    UnsupportedRegisterKind { kind: String },

    /// A comparison operand has no numeric or boolean form
    #[error("No comparable representation: {message}")]
    NoComparableRepresentation { message: String },

    /// A single read failed on one protocol path
    #[error("{protocol} read failed: {message}")]
    Read { protocol: Protocol, message: String },

    /// The protocol session is gone; no further reads can succeed
    #[error("{protocol} session lost: {message}")]
    SessionLost { protocol: Protocol, message: String },

    /// Malformed tag file
    #[error("Tag file error at line {line}: {message}")]
    TagFile { line: usize, message: String },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O failure while loading tags or configuration
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl CrossCheckError {
    /// Create an insufficient data error
    pub fn insufficient_data(expected: usize, actual: usize) -> Self {
        Self::InsufficientData { expected, actual }
    }

    /// Create an empty result error
    pub fn empty_result(kind: impl fmt::Display) -> Self {
        Self::EmptyResult {
            kind: kind.to_string(),
        }
    }

    /// Create an unsupported register kind error
    pub fn unsupported_kind(kind: impl fmt::Display) -> Self {
        Self::UnsupportedRegisterKind {
            kind: kind.to_string(),
        }
    }

    /// Create a no-comparable-representation error
    pub fn incomparable<S: Into<String>>(message: S) -> Self {
        Self::NoComparableRepresentation {
            message: message.into(),
        }
    }

    /// Create a read error
    pub fn read<S: Into<String>>(protocol: Protocol, message: S) -> Self {
        Self::Read {
            protocol,
            message: message.into(),
        }
    }

    /// Create a session lost error
    pub fn session_lost<S: Into<String>>(protocol: Protocol, message: S) -> Self {
        Self::SessionLost {
            protocol,
            message: message.into(),
        }
    }

    /// Create a tag file error
    pub fn tag_file<S: Into<String>>(line: usize, message: S) -> Self {
        Self::TagFile {
            line,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error should abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SessionLost { .. })
    }

    /// Whether the run can continue with the next sample.
    pub fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }

    /// Whether this is one of the core decode/compare kinds.
    pub fn is_core(&self) -> bool {
        matches!(
            self,
            Self::InsufficientData { .. }
                | Self::EmptyResult { .. }
                | Self::UnsupportedRegisterKind { .. }
                | Self::NoComparableRepresentation { .. }
        )
    }
}

impl From<std::io::Error> for CrossCheckError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<csv::Error> for CrossCheckError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map_or(0, |p| p.line() as usize);
        Self::tag_file(line, err.to_string())
    }
}

impl From<toml::de::Error> for CrossCheckError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}

impl From<toml::ser::Error> for CrossCheckError {
    fn from(err: toml::ser::Error) -> Self {
        Self::config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_session_loss_is_fatal() {
        assert!(CrossCheckError::session_lost(Protocol::Modbus, "reset by peer").is_fatal());
        assert!(CrossCheckError::read(Protocol::OpcUa, "BadNodeIdUnknown").is_recoverable());
        assert!(CrossCheckError::insufficient_data(2, 1).is_recoverable());
        assert!(CrossCheckError::incomparable("string").is_recoverable());
    }

    #[test]
    fn test_core_classification() {
        assert!(CrossCheckError::empty_result("HoldingRegister").is_core());
        assert!(CrossCheckError::unsupported_kind("Bogus").is_core());
        assert!(!CrossCheckError::config("bad").is_core());
        assert!(!CrossCheckError::read(Protocol::Modbus, "timeout").is_core());
    }

    #[test]
    fn test_display() {
        let err = CrossCheckError::read(Protocol::OpcUa, "timeout");
        assert_eq!(err.to_string(), "OPC UA read failed: timeout");

        let err = CrossCheckError::insufficient_data(2, 1);
        assert_eq!(err.to_string(), "Insufficient data: expected 2 words, got 1");
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.tsv");
        let err: CrossCheckError = io.into();
        assert!(matches!(err, CrossCheckError::Io { .. }));
    }
}

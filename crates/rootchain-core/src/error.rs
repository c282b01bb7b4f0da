//! # Error Types — Structured Error Hierarchy
//!
//! Defines the leaf error types shared across the rootchain crates. All
//! errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Parse errors name the offending input and what was expected.
//! - Cryptographic errors fail loudly with full context.
//! - Bootstrap and scheduling errors live next to the state they guard
//!   (`rootchain-state`), not here.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Amounts must be strings or integers.
    #[error("float values are not permitted in canonical representations; use string or integer for amount: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error parsing a textual identifier, amount or timestamp.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Address text is not 20 bytes of hex.
    #[error("invalid address {input:?}: {reason}")]
    InvalidAddress {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Amount text is not an unsigned decimal integer.
    #[error("invalid amount {input:?}: expected an unsigned decimal integer")]
    InvalidAmount {
        /// The rejected input.
        input: String,
    },

    /// Hex payload could not be decoded.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Timestamp is malformed or not UTC.
    #[error("invalid timestamp {input:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Invalid deployment parameters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A BFT set must tolerate at least one faulty operator.
    #[error("fault tolerance must be at least 1, got {0}")]
    ZeroFaultTolerance(u32),

    /// `3f + 1` does not fit in the operator-count type.
    #[error("fault tolerance {0} is too large")]
    FaultToleranceOverflow(u32),
}

/// Error in cryptographic operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The signature could not be parsed or no key could be recovered from it.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// Key generation or parsing failed.
    #[error("key error: {0}")]
    KeyError(String),
}

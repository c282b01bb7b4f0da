//! # Identity Newtypes
//!
//! Newtype wrappers for the identifiers the rootchain passes around.
//! An `EntryId` cannot be passed where a `PriorityKey` is expected, and an
//! `Address` is always exactly 20 bytes.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::digest::keccak256;
use crate::error::ParseError;

/// A 20-byte operator / account address.
///
/// Text form is `0x` followed by 40 lowercase hex characters. Parsing
/// accepts upper-case hex and a missing prefix.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Wrap raw address bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// The raw 20 address bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Derive the address of an uncompressed secp256k1 public key.
    ///
    /// `uncompressed` is the 64-byte `x ‖ y` encoding, without the `0x04`
    /// tag. The address is the last 20 bytes of its Keccak-256 hash.
    pub fn from_public_key_bytes(uncompressed: &[u8; 64]) -> Self {
        let hash = keccak256(uncompressed);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[12..]);
        Self(bytes)
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if body.len() != 40 {
            return Err(ParseError::InvalidAddress {
                input: s.to_string(),
                reason: format!("expected 40 hex chars, got {}", body.len()),
            });
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(body, &mut bytes).map_err(|e| ParseError::InvalidAddress {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({self})")
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Stable identifier of a submitted entry.
///
/// Assigned from a monotonically increasing counter, so it doubles as the
/// submission sequence number used to break priority ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub u64);

impl EntryId {
    /// The submission sequence number.
    pub fn sequence(&self) -> u64 {
        self.0
    }

    /// The identifier that follows this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "entry:{}", self.0)
    }
}

/// Total order over pending entries. Lower keys are served first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriorityKey(#[serde(with = "crate::amount::u128_text")] pub u128);

impl PriorityKey {
    /// Key for a checkpoint: lower block numbers finalize first.
    pub fn checkpoint(block_number: u64) -> Self {
        Self(u128::from(block_number))
    }

    /// Key for an exit claim.
    ///
    /// The high 64 bits are the time the exit becomes eligible, the low 64
    /// bits its position in the child chain, so the oldest eligible exit is
    /// served first and position orders exits eligible in the same second.
    pub fn exit(eligible_at: u64, position: u64) -> Self {
        Self((u128::from(eligible_at) << 64) | u128::from(position))
    }

    /// The raw numeric key.
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl From<u128> for PriorityKey {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for PriorityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

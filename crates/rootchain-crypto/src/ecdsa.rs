//! # secp256k1 Operator Keys and Recoverable Signatures
//!
//! Operators co-sign entries with recoverable ECDSA over secp256k1. The
//! rootchain never stores operator public keys: the signer's address is
//! recovered from the signature and matched against the operator set.
//!
//! ## Signature Encoding
//!
//! 65 bytes, `r ‖ s ‖ v`. `v` is the recovery id, accepted either raw
//! (`0`, `1`) or in the legacy `27`/`28` offset form. Signatures produced
//! here always carry the raw form.
//!
//! ## Security Invariant
//!
//! - The signing input is a `ContentDigest`, which is only produced from
//!   `CanonicalBytes`; you cannot sign arbitrary bytes.
//! - `OperatorKey` does not implement `Serialize`, and its `Debug` output
//!   never contains key material.

use std::str::FromStr;

use rootchain_core::{Address, ContentDigest, CryptoError};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, SecretKey, SECP256K1};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Length of an encoded recoverable signature.
pub const SIGNATURE_LEN: usize = 65;

/// A 65-byte recoverable ECDSA signature (`r ‖ s ‖ v`).
///
/// Holds unvalidated bytes: parsing into curve points happens at recovery
/// time, where malformed input surfaces as `CryptoError::MalformedSignature`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EcdsaSignature([u8; SIGNATURE_LEN]);

impl EcdsaSignature {
    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    /// The raw 65 signature bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// Render as `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse 130 hex characters, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let trimmed = s.trim();
        let body = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        if body.len() != SIGNATURE_LEN * 2 {
            return Err(CryptoError::MalformedSignature(format!(
                "signature hex must be {} chars, got {}",
                SIGNATURE_LEN * 2,
                body.len()
            )));
        }
        let mut bytes = [0u8; SIGNATURE_LEN];
        hex::decode_to_slice(body, &mut bytes)
            .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Split into the compact `r ‖ s` part and a parsed recovery id.
    pub(crate) fn to_recoverable(self) -> Result<RecoverableSignature, CryptoError> {
        let v = match self.0[64] {
            v @ (0 | 1) => v,
            v @ (27 | 28) => v - 27,
            other => {
                return Err(CryptoError::MalformedSignature(format!(
                    "invalid recovery id {other}"
                )))
            }
        };
        let recovery_id = RecoveryId::from_i32(i32::from(v))
            .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
        RecoverableSignature::from_compact(&self.0[..64], recovery_id)
            .map_err(|e| CryptoError::MalformedSignature(e.to_string()))
    }
}

impl FromStr for EcdsaSignature {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl std::fmt::Debug for EcdsaSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EcdsaSignature(0x{}..)", hex::encode(&self.0[..4]))
    }
}

impl std::fmt::Display for EcdsaSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for EcdsaSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EcdsaSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// An operator's secp256k1 signing key.
pub struct OperatorKey {
    secret: SecretKey,
}

impl OperatorKey {
    /// Generate a new random key from the OS CSPRNG.
    pub fn generate() -> Self {
        let secret = SecretKey::new(&mut rand::rngs::OsRng);
        Self { secret }
    }

    /// Build a key from a 32-byte scalar.
    ///
    /// Fails for zero and for values at or above the curve order.
    pub fn from_seed(seed: &[u8; 32]) -> Result<Self, CryptoError> {
        let secret = SecretKey::from_slice(seed)
            .map_err(|e| CryptoError::KeyError(format!("invalid secret key: {e}")))?;
        Ok(Self { secret })
    }

    /// Parse a 64-character hex secret, with or without `0x`.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let trimmed = s.trim();
        let body = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let mut seed = [0u8; 32];
        hex::decode_to_slice(body, &mut seed)
            .map_err(|e| CryptoError::KeyError(format!("secret key hex: {e}")))?;
        Self::from_seed(&seed)
    }

    /// Export the secret scalar as hex. Only for key-generation tooling.
    pub fn secret_hex(&self) -> String {
        format!("0x{}", hex::encode(self.secret.secret_bytes()))
    }

    /// The public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_secret_key_global(&self.secret)
    }

    /// The address this key signs as.
    pub fn address(&self) -> Address {
        address_of(&self.public_key())
    }

    /// Sign a content digest.
    pub fn sign(&self, digest: &ContentDigest) -> EcdsaSignature {
        let message = Message::from_digest(*digest.as_bytes());
        let sig = SECP256K1.sign_ecdsa_recoverable(&message, &self.secret);
        let (recovery_id, compact) = sig.serialize_compact();

        let mut bytes = [0u8; SIGNATURE_LEN];
        bytes[..64].copy_from_slice(&compact);
        // to_i32() is always 0..=3
        bytes[64] = recovery_id.to_i32() as u8;
        EcdsaSignature(bytes)
    }
}

impl std::fmt::Debug for OperatorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OperatorKey({})", self.address())
    }
}

/// Address of a secp256k1 public key.
pub fn address_of(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let mut xy = [0u8; 64];
    xy.copy_from_slice(&uncompressed[1..]);
    Address::from_public_key_bytes(&xy)
}

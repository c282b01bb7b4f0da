//! # Signature Recovery
//!
//! The rootchain consumes signature recovery as an oracle:
//! `recover(digest, signature) -> Address`. The trait is the seam; the
//! scheduler never names secp256k1 directly, so tests can swap in a
//! deterministic double.

use rootchain_core::{Address, ContentDigest, CryptoError};
use secp256k1::{Message, SECP256K1};

use crate::ecdsa::{address_of, EcdsaSignature};

/// Recovers the signer address of a signature over a digest.
///
/// Implementations must be pure: same inputs, same output, no side effects.
pub trait SignatureRecovery {
    /// Recover the address that produced `signature` over `digest`.
    ///
    /// # Errors
    ///
    /// `CryptoError::MalformedSignature` if the signature cannot be parsed
    /// or no public key can be recovered from it.
    fn recover(&self, digest: &ContentDigest, signature: &EcdsaSignature) -> Result<Address, CryptoError>;
}

impl<R: SignatureRecovery + ?Sized> SignatureRecovery for &R {
    fn recover(&self, digest: &ContentDigest, signature: &EcdsaSignature) -> Result<Address, CryptoError> {
        (**self).recover(digest, signature)
    }
}

/// secp256k1 public-key recovery using the global verification context.
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Recovery;

impl SignatureRecovery for Secp256k1Recovery {
    fn recover(&self, digest: &ContentDigest, signature: &EcdsaSignature) -> Result<Address, CryptoError> {
        let message = Message::from_digest(*digest.as_bytes());
        let recoverable = signature.to_recoverable()?;
        let public_key = SECP256K1
            .recover_ecdsa(&message, &recoverable)
            .map_err(|e| CryptoError::MalformedSignature(format!("recovery failed: {e}")))?;
        Ok(address_of(&public_key))
    }
}

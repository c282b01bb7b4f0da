//! # rootchain-crypto — Cryptographic Primitives
//!
//! - **secp256k1 recoverable ECDSA** for operator co-signatures.
//! - **`SignatureRecovery`**, the oracle seam the scheduler verifies
//!   quorums through, with the `Secp256k1Recovery` implementation.
//!
//! ## Crate Policy
//!
//! - Depends only on `rootchain-core` internally.
//! - Tests use real keys and real signatures; deterministic doubles of
//!   `SignatureRecovery` belong in consumer tests, not here.

pub mod ecdsa;
pub mod recovery;

pub use ecdsa::{address_of, EcdsaSignature, OperatorKey, SIGNATURE_LEN};
pub use recovery::{Secp256k1Recovery, SignatureRecovery};

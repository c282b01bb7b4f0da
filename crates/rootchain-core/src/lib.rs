//! # rootchain-core — Foundational Types for the PBFT Rootchain
//!
//! Leaf crate of the workspace. Every other crate depends on it; it depends
//! on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtypes for domain primitives.** `Address`, `Amount`, `EntryId`,
//!    `PriorityKey` — no bare integers or strings cross crate boundaries.
//!
//! 2. **`CanonicalBytes` newtype.** Every signing digest is computed with
//!    `keccak256_digest(&CanonicalBytes)`, so operators that serialize the
//!    same entry always sign the same 32 bytes.
//!
//! 3. **Parameters, not constants.** The fault tolerance and deposit floor
//!    live in `RootchainParams`; set sizes and quorum are derived.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `rootchain-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod amount;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod params;
pub mod temporal;

pub use amount::Amount;
pub use canonical::CanonicalBytes;
pub use digest::{keccak256, keccak256_digest, ContentDigest};
pub use error::{CanonicalizationError, ConfigError, CryptoError, ParseError};
pub use identity::{Address, EntryId, PriorityKey};
pub use params::{quorum_size, tolerated_faults, RootchainParams};
pub use temporal::Timestamp;

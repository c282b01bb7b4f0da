//! # rootchain-cli — PBFT Rootchain Command-Line Interface
//!
//! Operator and deployer tooling around the rootchain library.
//!
//! ## Subcommands
//!
//! - `bootstrap` — dry-run a YAML deployment manifest through the bootstrap validator
//! - `keygen` — generate or derive a secp256k1 operator key
//! - `digest` — compute the digest operators sign for an entry
//! - `sign` — sign an entry digest with an operator key
//!
//! ## Crate Policy
//!
//! - CLI construction (argument parsing) is separated from business logic.
//! - Handlers return serializable reports; the binary decides how to print them.
//! - `anyhow` is used here and nowhere else in the workspace.

pub mod bootstrap;
pub mod keygen;
pub mod manifest;
pub mod signing;

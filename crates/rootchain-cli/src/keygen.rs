//! # Keygen Subcommand
//!
//! Generates an operator key, or derives one from a given secret.

use anyhow::Context;
use clap::Args;
use rootchain_core::Address;
use rootchain_crypto::OperatorKey;
use serde::Serialize;

/// Arguments for the keygen subcommand.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// 32-byte secret as hex. A random key is generated when omitted.
    #[arg(long)]
    pub seed: Option<String>,
}

/// A generated operator key.
#[derive(Debug, Serialize)]
pub struct KeyReport {
    /// Address the key signs as.
    pub address: Address,
    /// Secret scalar as hex.
    pub secret_key: String,
}

/// Produce an operator key.
pub fn run(args: &KeygenArgs) -> anyhow::Result<KeyReport> {
    let key = match &args.seed {
        Some(seed) => OperatorKey::from_hex(seed).context("--seed")?,
        None => OperatorKey::generate(),
    };
    tracing::debug!(address = %key.address(), "operator key ready");
    Ok(KeyReport {
        address: key.address(),
        secret_key: key.secret_hex(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_is_deterministic() {
        let seed = format!("0x{}01", "00".repeat(31));
        let report = run(&KeygenArgs { seed: Some(seed.clone()) }).unwrap();
        assert_eq!(report.address.to_string(), "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf");
        assert_eq!(report.secret_key, seed);
    }

    #[test]
    fn random_keys_differ() {
        let a = run(&KeygenArgs { seed: None }).unwrap();
        let b = run(&KeygenArgs { seed: None }).unwrap();
        assert_ne!(a.address, b.address);
    }

    #[test]
    fn bad_seed_is_rejected() {
        assert!(run(&KeygenArgs { seed: Some("0x1234".into()) }).is_err());
    }
}

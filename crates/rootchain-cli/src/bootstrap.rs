//! # Bootstrap Subcommand
//!
//! Dry-runs a deployment manifest through the bootstrap validator and
//! reports the resulting operator set, or the first failed check.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use rootchain_core::Amount;
use rootchain_crypto::Secp256k1Recovery;
use rootchain_state::{Operator, Rootchain};
use serde::Serialize;

use crate::manifest::DeploymentManifest;

/// Arguments for the bootstrap subcommand.
#[derive(Args, Debug)]
pub struct BootstrapArgs {
    /// Path to the YAML deployment manifest.
    #[arg(long)]
    pub manifest: PathBuf,
}

/// Summary of a successful bootstrap.
#[derive(Debug, Serialize)]
pub struct BootstrapReport {
    /// Operators in input order.
    pub operators: Vec<Operator>,
    /// Faults the set tolerates.
    pub fault_tolerance: usize,
    /// Distinct signatures needed per entry.
    pub quorum: usize,
    /// Value escrowed at deployment.
    pub escrowed: Amount,
    /// Escrow not attributed to any operator.
    pub reserve: Amount,
}

/// Validate the manifest's deployment.
pub fn run(args: &BootstrapArgs) -> anyhow::Result<BootstrapReport> {
    let manifest = DeploymentManifest::load(&args.manifest)?;
    let chain: Rootchain = Rootchain::deploy(&manifest.params, manifest.deployment, Secp256k1Recovery)
        .with_context(|| format!("bootstrap of {} rejected", args.manifest.display()))?;

    let set = chain.operators();
    Ok(BootstrapReport {
        operators: set.iter().cloned().collect(),
        fault_tolerance: set.fault_tolerance(),
        quorum: set.quorum(),
        escrowed: set.escrowed(),
        reserve: set.reserve(),
    })
}

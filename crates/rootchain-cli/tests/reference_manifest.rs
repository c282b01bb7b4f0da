//! Runs the checked-in reference deployment manifest through the CLI handlers.

use std::path::PathBuf;

use rootchain_cli::bootstrap::{run, BootstrapArgs};
use rootchain_cli::manifest::DeploymentManifest;

fn reference_manifest() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../deploy/pbft-rootchain.yaml")
}

#[test]
fn reference_manifest_parses() {
    let manifest = DeploymentManifest::load(&reference_manifest()).unwrap();
    assert_eq!(manifest.params.fault_tolerance, 1);
    assert_eq!(manifest.deployment.addresses.len(), 4);
}

#[test]
fn reference_manifest_bootstraps() {
    let report = run(&BootstrapArgs { manifest: reference_manifest() }).unwrap();
    assert_eq!(report.operators.len(), 4);
    assert_eq!(report.quorum, 3);
    assert_eq!(
        report.operators[0].address.to_string(),
        "0xca35b7d915458ef540ade6068dfe2f44e8fa733c"
    );
    assert!(report
        .operators
        .iter()
        .all(|op| op.posted_deposit >= op.required_deposit));
}

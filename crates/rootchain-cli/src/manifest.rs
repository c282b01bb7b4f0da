//! # Deployment Manifest
//!
//! YAML description of a rootchain deployment: the parameters plus the
//! constructor arguments.
//!
//! ```yaml
//! params:
//!   fault_tolerance: 1
//!   min_operator_deposit: "1000000000"
//! deployment:
//!   addresses:
//!     - "0xca35b7d915458ef540ade6068dfe2f44e8fa733c"
//!   deposits: ["1234567890"]
//!   value: "8234567890"
//! ```
//!
//! `params` may be omitted entirely, in which case the defaults apply.

use std::path::Path;

use anyhow::Context;
use rootchain_core::RootchainParams;
use rootchain_state::DeploymentRequest;
use serde::{Deserialize, Serialize};

/// A parsed deployment manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentManifest {
    /// Deployment parameters.
    #[serde(default)]
    pub params: RootchainParams,
    /// Constructor arguments.
    pub deployment: DeploymentRequest,
}

impl DeploymentManifest {
    /// Parse a manifest from YAML text.
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let manifest: Self = serde_yaml::from_str(yaml).context("parsing deployment manifest")?;
        manifest.params.validate().context("deployment manifest params")?;
        Ok(manifest)
    }

    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        Self::from_yaml_str(&yaml).with_context(|| format!("in {}", path.display()))
    }
}

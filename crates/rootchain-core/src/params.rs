//! # Deployment Parameters
//!
//! `RootchainParams` fixes the two numbers a deployment is judged against:
//! the tolerated-fault count `f` and the per-operator deposit floor.
//! Everything else about the operator set is derived from them.
//!
//! | quantity        | value            |
//! |-----------------|------------------|
//! | minimum set     | `3f + 1`         |
//! | quorum (n ops)  | `n - ⌊(n-1)/3⌋`  |
//!
//! For `n = 3f + 1` the quorum is exactly `2f + 1`.

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::error::ConfigError;

/// Default tolerated-fault count; yields the four-operator minimum set.
pub const DEFAULT_FAULT_TOLERANCE: u32 = 1;

/// Default per-operator deposit floor in base units.
pub const DEFAULT_MIN_OPERATOR_DEPOSIT: Amount = Amount::new(1_000_000_000);

/// Parameters a deployment is validated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RootchainParams {
    /// Number of Byzantine operators the set must tolerate.
    #[serde(default = "default_fault_tolerance")]
    pub fault_tolerance: u32,
    /// Collateral every operator must post at bootstrap.
    #[serde(default = "default_min_operator_deposit")]
    pub min_operator_deposit: Amount,
}

fn default_fault_tolerance() -> u32 {
    DEFAULT_FAULT_TOLERANCE
}

fn default_min_operator_deposit() -> Amount {
    DEFAULT_MIN_OPERATOR_DEPOSIT
}

impl Default for RootchainParams {
    fn default() -> Self {
        Self {
            fault_tolerance: DEFAULT_FAULT_TOLERANCE,
            min_operator_deposit: DEFAULT_MIN_OPERATOR_DEPOSIT,
        }
    }
}

impl RootchainParams {
    /// Build validated parameters.
    pub fn new(fault_tolerance: u32, min_operator_deposit: Amount) -> Result<Self, ConfigError> {
        let params = Self {
            fault_tolerance,
            min_operator_deposit,
        };
        params.validate()?;
        Ok(params)
    }

    /// Reject parameters no BFT set can satisfy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fault_tolerance == 0 {
            return Err(ConfigError::ZeroFaultTolerance(self.fault_tolerance));
        }
        min_set_size(self.fault_tolerance)
            .ok_or(ConfigError::FaultToleranceOverflow(self.fault_tolerance))?;
        Ok(())
    }

    /// Smallest operator set tolerating `f` faults: `3f + 1`.
    ///
    /// Saturates for absurd `f`; [`validate`](Self::validate) rejects those.
    pub fn min_operators(&self) -> usize {
        min_set_size(self.fault_tolerance).unwrap_or(usize::MAX)
    }
}

fn min_set_size(f: u32) -> Option<usize> {
    usize::try_from(f).ok()?.checked_mul(3)?.checked_add(1)
}

/// Faults an `n`-operator set can tolerate: `⌊(n-1)/3⌋`.
pub fn tolerated_faults(operators: usize) -> usize {
    operators.saturating_sub(1) / 3
}

/// Distinct signatures needed to certify an entry in an `n`-operator set.
///
/// Any two quorums of this size intersect in at least one honest operator.
/// Never below 1, so an empty set certifies nothing.
pub fn quorum_size(operators: usize) -> usize {
    (operators - tolerated_faults(operators)).max(1)
}

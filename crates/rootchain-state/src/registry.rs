//! # Operator Registry and Bootstrap Validator
//!
//! One-shot, all-or-nothing validation of the initial operator set and the
//! collateral sent with the deployment.
//!
//! ## Check Order
//!
//! ```text
//! 1. count      len(addresses) >= 3f + 1         InsufficientOperatorCount
//! 2. distinct   no address appears twice         DuplicateOperator
//! 3. shape      len(addresses) == len(deposits)  ArrayLengthMismatch
//! 4. aggregate  value >= sum(deposits)           InsufficientAggregateValue
//! 5. floor      deposits[i] >= min deposit       InsufficientOperatorDeposit
//! ```
//!
//! The order is part of the contract: a deployment failing several checks
//! reports the first one. Mismatched arrays are reported before any deposit
//! arithmetic runs.
//!
//! ## Escrow Attribution
//!
//! Operator `i` is attributed exactly `deposits[i]` of the received value.
//! Whatever `value` exceeds the sum stays with the rootchain as an
//! unattributed reserve. Each operator's required deposit is the
//! deployment-wide floor `min_operator_deposit`.

use std::collections::BTreeSet;

use rootchain_core::{quorum_size, tolerated_faults, Address, Amount, ConfigError, RootchainParams};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Constructor arguments of a rootchain deployment.
///
/// `addresses` and `deposits` are parallel arrays; their lengths are checked
/// by [`bootstrap`], not here, so malformed requests can be represented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentRequest {
    /// Operator addresses in input order.
    pub addresses: Vec<Address>,
    /// Declared deposit per operator, parallel to `addresses`.
    pub deposits: Vec<Amount>,
    /// Total value attached to the deployment.
    pub value: Amount,
}

/// One BFT participant with its escrowed collateral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    /// Unique operator address.
    pub address: Address,
    /// Minimum collateral this operator had to post.
    pub required_deposit: Amount,
    /// Collateral attributed to this operator at bootstrap.
    pub posted_deposit: Amount,
}

/// The immutable operator set fixed at bootstrap.
///
/// Only [`bootstrap`] constructs one. It serializes for reports but has no
/// `Deserialize` impl, so a set can never skip the bootstrap checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorSet {
    operators: Vec<Operator>,
    escrowed: Amount,
    reserve: Amount,
}

/// Rejection reasons of [`bootstrap`], in check order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BootstrapError {
    /// The deployment parameters themselves are unusable.
    #[error("invalid deployment parameters: {0}")]
    InvalidParams(#[from] ConfigError),

    /// Fewer operators than `3f + 1`.
    #[error("insufficient operator count: {provided} provided, at least {required} required")]
    InsufficientOperatorCount {
        /// Operators supplied.
        provided: usize,
        /// Minimum BFT-safe set size.
        required: usize,
    },

    /// The same address appears more than once.
    #[error("duplicate operator {address}")]
    DuplicateOperator {
        /// First repeated address in input order.
        address: Address,
    },

    /// `addresses` and `deposits` differ in length.
    #[error("array length mismatch: {operators} operators, {deposits} deposits")]
    ArrayLengthMismatch {
        /// Length of `addresses`.
        operators: usize,
        /// Length of `deposits`.
        deposits: usize,
    },

    /// The attached value does not cover the declared deposits.
    ///
    /// `required` is `None` when the declared deposits overflow `u128`.
    #[error("insufficient aggregate value: received {received}, deposits require {}", display_required(.required))]
    InsufficientAggregateValue {
        /// Sum of the declared deposits.
        required: Option<Amount>,
        /// Value attached to the deployment.
        received: Amount,
    },

    /// An operator's deposit is below the per-operator floor.
    #[error("insufficient deposit for operator {index} ({address}): posted {posted}, required {required}")]
    InsufficientOperatorDeposit {
        /// Position of the operator in the input.
        index: usize,
        /// The operator's address.
        address: Address,
        /// Deposit attributed to it.
        posted: Amount,
        /// Floor it had to meet.
        required: Amount,
    },
}

fn display_required(required: &Option<Amount>) -> String {
    match required {
        Some(amount) => amount.to_string(),
        None => "more than u128::MAX".to_string(),
    }
}

/// Validate a deployment and build its operator set.
///
/// Runs the five checks in the order documented at module level. Nothing
/// is constructed unless all of them pass.
pub fn bootstrap(
    params: &RootchainParams,
    addresses: &[Address],
    deposits: &[Amount],
    total_value_received: Amount,
) -> Result<OperatorSet, BootstrapError> {
    params.validate()?;

    let required = params.min_operators();
    if addresses.len() < required {
        return Err(BootstrapError::InsufficientOperatorCount {
            provided: addresses.len(),
            required,
        });
    }

    let mut seen = BTreeSet::new();
    for address in addresses {
        if !seen.insert(*address) {
            return Err(BootstrapError::DuplicateOperator { address: *address });
        }
    }

    if addresses.len() != deposits.len() {
        return Err(BootstrapError::ArrayLengthMismatch {
            operators: addresses.len(),
            deposits: deposits.len(),
        });
    }

    let attributed = match Amount::checked_sum(deposits) {
        Some(sum) if sum <= total_value_received => sum,
        sum => {
            return Err(BootstrapError::InsufficientAggregateValue {
                required: sum,
                received: total_value_received,
            })
        }
    };

    let floor = params.min_operator_deposit;
    let mut operators = Vec::with_capacity(addresses.len());
    for (index, (address, posted)) in addresses.iter().zip(deposits).enumerate() {
        if *posted < floor {
            return Err(BootstrapError::InsufficientOperatorDeposit {
                index,
                address: *address,
                posted: *posted,
                required: floor,
            });
        }
        operators.push(Operator {
            address: *address,
            required_deposit: floor,
            posted_deposit: *posted,
        });
    }

    // attributed <= total_value_received was checked above
    let reserve = total_value_received
        .checked_sub(attributed)
        .unwrap_or(Amount::ZERO);

    Ok(OperatorSet {
        operators,
        escrowed: total_value_received,
        reserve,
    })
}

impl DeploymentRequest {
    /// Run [`bootstrap`] over this request.
    pub fn bootstrap(&self, params: &RootchainParams) -> Result<OperatorSet, BootstrapError> {
        bootstrap(params, &self.addresses, &self.deposits, self.value)
    }
}

impl OperatorSet {
    /// Number of operators.
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    /// Always false for a bootstrapped set; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Whether `address` belongs to the set.
    ///
    /// Linear in the set size, which is bounded by the deployment.
    pub fn contains(&self, address: &Address) -> bool {
        self.operators.iter().any(|op| op.address == *address)
    }

    /// Look up an operator by address.
    pub fn get(&self, address: &Address) -> Option<&Operator> {
        self.operators.iter().find(|op| op.address == *address)
    }

    /// Operators in input order.
    pub fn iter(&self) -> impl Iterator<Item = &Operator> {
        self.operators.iter()
    }

    /// Operator addresses in input order.
    pub fn addresses(&self) -> impl Iterator<Item = Address> + '_ {
        self.operators.iter().map(|op| op.address)
    }

    /// Faults this set tolerates: `⌊(n-1)/3⌋`.
    pub fn fault_tolerance(&self) -> usize {
        tolerated_faults(self.len())
    }

    /// Distinct operator signatures needed to certify an entry.
    ///
    /// This is `n - ⌊(n-1)/3⌋`, which equals `2f + 1` only when the set has
    /// exactly `3f + 1` operators. Larger sets need more: 5 operators with
    /// `f = 1` require 4 signatures, not 3.
    pub fn quorum(&self) -> usize {
        quorum_size(self.len())
    }

    /// Total value escrowed at bootstrap.
    pub fn escrowed(&self) -> Amount {
        self.escrowed
    }

    /// Escrowed value not attributed to any operator.
    pub fn reserve(&self) -> Amount {
        self.reserve
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    fn addrs(n: u8) -> Vec<Address> {
        (1..=n).map(addr).collect()
    }

    fn amounts(values: &[u128]) -> Vec<Amount> {
        values.iter().copied().map(Amount::new).collect()
    }

    const DEPOSIT: u128 = 1_234_567_890;

    #[test]
    fn exactly_one_below_minimum_fails_count_check() {
        let err = bootstrap(
            &RootchainParams::default(),
            &addrs(3),
            &amounts(&[DEPOSIT; 3]),
            Amount::new(u128::MAX),
        )
        .unwrap_err();
        assert_eq!(
            err,
            BootstrapError::InsufficientOperatorCount { provided: 3, required: 4 }
        );
    }

    #[test]
    fn count_check_precedes_duplicate_check() {
        let err = bootstrap(
            &RootchainParams::default(),
            &[addr(1), addr(1)],
            &amounts(&[DEPOSIT; 2]),
            Amount::new(DEPOSIT * 2),
        )
        .unwrap_err();
        assert!(matches!(err, BootstrapError::InsufficientOperatorCount { .. }));
    }

    #[test]
    fn reports_first_repeated_address() {
        let addresses = vec![addr(1), addr(2), addr(3), addr(2), addr(1)];
        let err = bootstrap(
            &RootchainParams::default(),
            &addresses,
            &amounts(&[DEPOSIT; 5]),
            Amount::new(DEPOSIT * 5),
        )
        .unwrap_err();
        assert_eq!(err, BootstrapError::DuplicateOperator { address: addr(2) });
    }

    #[test]
    fn shorter_deposit_array_is_a_mismatch() {
        let err = bootstrap(
            &RootchainParams::default(),
            &addrs(4),
            &amounts(&[DEPOSIT; 3]),
            Amount::new(DEPOSIT * 4),
        )
        .unwrap_err();
        assert_eq!(err, BootstrapError::ArrayLengthMismatch { operators: 4, deposits: 3 });
    }

    #[test]
    fn overflowing_deposits_fail_aggregate_check() {
        let err = bootstrap(
            &RootchainParams::default(),
            &addrs(4),
            &amounts(&[u128::MAX, 1, DEPOSIT, DEPOSIT]),
            Amount::new(u128::MAX),
        )
        .unwrap_err();
        assert_eq!(
            err,
            BootstrapError::InsufficientAggregateValue {
                required: None,
                received: Amount::new(u128::MAX),
            }
        );
        assert!(err.to_string().contains("more than u128::MAX"));
    }

    #[test]
    fn deposit_floor_reports_first_offender() {
        let err = bootstrap(
            &RootchainParams::default(),
            &addrs(4),
            &amounts(&[DEPOSIT, 5, DEPOSIT, 7]),
            Amount::new(DEPOSIT * 4),
        )
        .unwrap_err();
        assert_eq!(
            err,
            BootstrapError::InsufficientOperatorDeposit {
                index: 1,
                address: addr(2),
                posted: Amount::new(5),
                required: Amount::new(1_000_000_000),
            }
        );
    }

    #[test]
    fn exact_value_leaves_no_reserve() {
        let set = bootstrap(
            &RootchainParams::default(),
            &addrs(4),
            &amounts(&[DEPOSIT; 4]),
            Amount::new(DEPOSIT * 4),
        )
        .unwrap();
        assert_eq!(set.reserve(), Amount::ZERO);
        assert_eq!(set.escrowed(), Amount::new(DEPOSIT * 4));
    }

    #[test]
    fn surplus_is_kept_as_reserve() {
        let set = bootstrap(
            &RootchainParams::default(),
            &addrs(4),
            &amounts(&[DEPOSIT; 4]),
            Amount::new(8_234_567_890),
        )
        .unwrap();
        assert_eq!(set.reserve(), Amount::new(8_234_567_890 - DEPOSIT * 4));
        for op in set.iter() {
            assert!(op.posted_deposit >= op.required_deposit);
        }
    }

    #[test]
    fn lookups_and_quorum() {
        let set = bootstrap(
            &RootchainParams::default(),
            &addrs(7),
            &amounts(&[DEPOSIT; 7]),
            Amount::new(DEPOSIT * 7),
        )
        .unwrap();
        assert_eq!(set.len(), 7);
        assert!(set.contains(&addr(7)));
        assert!(!set.contains(&addr(8)));
        assert_eq!(set.get(&addr(3)).map(|op| op.posted_deposit), Some(Amount::new(DEPOSIT)));
        assert_eq!(set.fault_tolerance(), 2);
        assert_eq!(set.quorum(), 5);
        assert_eq!(set.addresses().collect::<Vec<_>>(), addrs(7));
    }

    #[test]
    fn oversized_set_needs_more_than_two_f_plus_one() {
        let set = bootstrap(
            &RootchainParams::default(),
            &addrs(5),
            &amounts(&[DEPOSIT; 5]),
            Amount::new(DEPOSIT * 5),
        )
        .unwrap();
        assert_eq!(set.fault_tolerance(), 1);
        assert_eq!(set.quorum(), 4);
    }

    #[test]
    fn empty_set_cannot_certify_without_signatures() {
        struct NoRecovery;
        impl rootchain_crypto::SignatureRecovery for NoRecovery {
            fn recover(
                &self,
                _digest: &rootchain_core::ContentDigest,
                _signature: &rootchain_crypto::EcdsaSignature,
            ) -> Result<Address, rootchain_core::CryptoError> {
                Err(rootchain_core::CryptoError::MalformedSignature("unused".into()))
            }
        }

        let empty = OperatorSet {
            operators: Vec::new(),
            escrowed: Amount::ZERO,
            reserve: Amount::ZERO,
        };
        assert_eq!(empty.quorum(), 1);

        let digest = rootchain_core::ContentDigest::from_bytes([0x11; 32]);
        let err = crate::quorum::verify_quorum(&NoRecovery, &empty, &digest, &[]).unwrap_err();
        assert!(matches!(
            err,
            crate::scheduler::SchedulerError::QuorumNotMet { signers: 0, required: 1 }
        ));
    }

    #[test]
    fn zero_fault_tolerance_is_rejected_before_any_check() {
        let params = RootchainParams {
            fault_tolerance: 0,
            min_operator_deposit: Amount::ZERO,
        };
        let err = bootstrap(&params, &[], &[], Amount::ZERO).unwrap_err();
        assert_eq!(err, BootstrapError::InvalidParams(ConfigError::ZeroFaultTolerance(0)));
    }

    #[test]
    fn request_deserializes_from_json() {
        let json = r#"{
            "addresses": ["0x0101010101010101010101010101010101010101"],
            "deposits": ["1234567890"],
            "value": 8234567890
        }"#;
        let req: DeploymentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.addresses, vec![addr(1)]);
        assert_eq!(req.deposits, amounts(&[DEPOSIT]));
        assert_eq!(req.value, Amount::new(8_234_567_890));
    }
}

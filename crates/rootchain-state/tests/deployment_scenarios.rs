//! # Deployment and Scheduling Scenarios
//!
//! End-to-end checks against the public API: the literal bootstrap
//! scenarios of the reference deployment, then entry scheduling with real
//! secp256k1 operator keys.

use proptest::prelude::*;
use rootchain_core::{Address, Amount, ContentDigest, CryptoError, EntryId, PriorityKey, RootchainParams};
use rootchain_crypto::{EcdsaSignature, OperatorKey, Secp256k1Recovery, SignatureRecovery};
use rootchain_state::{
    BootstrapError, DeploymentRequest, EntryPayload, EntryState, HeapQueue, Rootchain, ScheduleKey,
    SchedulerError,
};

// ─── Reference deployment ────────────────────────────────────────────

const OPERATORS: [&str; 4] = [
    "0xca35b7d915458ef540ade6068dfe2f44e8fa733c",
    "0x14723a09acff6d2a60dcdf7aa4aff308fddc160c",
    "0x4b0897b0513fdc7c541b6d9d7e929c4e5364d2db",
    "0x583031d1113ad414f02576bd6afabfb302140225",
];

const DEPOSIT: u128 = 1_234_567_890;
const VALUE: u128 = 8_234_567_890;

fn address(s: &str) -> Address {
    s.parse().expect("valid address literal")
}

fn operators() -> Vec<Address> {
    OPERATORS.iter().map(|s| address(s)).collect()
}

fn amounts(values: &[u128]) -> Vec<Amount> {
    values.iter().copied().map(Amount::new).collect()
}

fn deploy(addresses: Vec<Address>, deposits: &[u128], value: u128) -> Result<Rootchain, BootstrapError> {
    let request = DeploymentRequest {
        addresses,
        deposits: amounts(deposits),
        value: Amount::new(value),
    };
    Rootchain::deploy(&RootchainParams::default(), request, Secp256k1Recovery)
}

#[test]
fn single_operator_is_rejected() {
    let err = deploy(vec![address(OPERATORS[0])], &[DEPOSIT], VALUE).unwrap_err();
    assert_eq!(
        err,
        BootstrapError::InsufficientOperatorCount { provided: 1, required: 4 }
    );
}

#[test]
fn repeated_operator_is_rejected() {
    let err = deploy(vec![address(OPERATORS[0]); 4], &[DEPOSIT; 4], VALUE).unwrap_err();
    assert_eq!(
        err,
        BootstrapError::DuplicateOperator { address: address(OPERATORS[0]) }
    );
}

#[test]
fn underfunded_deployment_is_rejected() {
    let err = deploy(operators(), &[DEPOSIT; 4], 823_456_789).unwrap_err();
    assert_eq!(
        err,
        BootstrapError::InsufficientAggregateValue {
            required: Some(Amount::new(4 * DEPOSIT)),
            received: Amount::new(823_456_789),
        }
    );
}

#[test]
fn extra_deposit_is_a_length_mismatch() {
    let err = deploy(operators(), &[DEPOSIT; 5], VALUE).unwrap_err();
    assert_eq!(err, BootstrapError::ArrayLengthMismatch { operators: 4, deposits: 5 });
}

#[test]
fn first_operator_below_floor_is_rejected() {
    let err = deploy(operators(), &[123_456_789, DEPOSIT, DEPOSIT, DEPOSIT], VALUE).unwrap_err();
    assert_eq!(
        err,
        BootstrapError::InsufficientOperatorDeposit {
            index: 0,
            address: address(OPERATORS[0]),
            posted: Amount::new(123_456_789),
            required: Amount::new(1_000_000_000),
        }
    );
}

#[test]
fn reference_deployment_succeeds() {
    let chain = deploy(operators(), &[DEPOSIT; 4], VALUE).unwrap();
    let set = chain.operators();
    assert_eq!(set.len(), 4);
    assert_eq!(set.addresses().collect::<Vec<_>>(), operators());
    for op in set.iter() {
        assert!(op.posted_deposit >= op.required_deposit);
        assert_eq!(op.posted_deposit, Amount::new(DEPOSIT));
    }
    assert_eq!(set.escrowed(), Amount::new(VALUE));
    assert_eq!(set.reserve(), Amount::new(VALUE - 4 * DEPOSIT));
    assert_eq!(set.quorum(), 3);
}

#[test]
fn count_failure_wins_over_every_other_failure() {
    // Also duplicated, mismatched, underfunded and below the floor.
    let err = deploy(vec![address(OPERATORS[0]); 2], &[1, 1, 1], 0).unwrap_err();
    assert!(matches!(err, BootstrapError::InsufficientOperatorCount { .. }));
}

#[test]
fn mismatch_is_reported_before_deposit_arithmetic() {
    // Deposits would overflow, but the shape check runs first.
    let err = deploy(operators(), &[u128::MAX, u128::MAX, 1], VALUE).unwrap_err();
    assert!(matches!(err, BootstrapError::ArrayLengthMismatch { .. }));
}

#[test]
fn larger_fault_tolerance_needs_more_operators() {
    let params = RootchainParams::new(2, Amount::new(1)).unwrap();
    let request = DeploymentRequest {
        addresses: operators(),
        deposits: amounts(&[DEPOSIT; 4]),
        value: Amount::new(VALUE),
    };
    let err = Rootchain::<Secp256k1Recovery, HeapQueue<ScheduleKey, EntryId>>::deploy(
        &params,
        request,
        Secp256k1Recovery,
    )
    .unwrap_err();
    assert_eq!(err, BootstrapError::InsufficientOperatorCount { provided: 4, required: 7 });
}

// ─── Scheduling with real keys ───────────────────────────────────────

fn operator_keys(n: u8) -> Vec<OperatorKey> {
    (1..=n)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = 0x5a;
            seed[31] = i;
            OperatorKey::from_seed(&seed).expect("valid seed")
        })
        .collect()
}

fn keyed_chain(keys: &[OperatorKey]) -> Rootchain {
    let deposits = vec![DEPOSIT; keys.len()];
    deploy(keys.iter().map(OperatorKey::address).collect(), &deposits, DEPOSIT * keys.len() as u128)
        .expect("keyed deployment")
}

fn sign_all(keys: &[OperatorKey], payload: &EntryPayload, key: PriorityKey) -> Vec<EcdsaSignature> {
    let digest = payload.signing_digest(key).expect("digest");
    keys.iter().map(|k| k.sign(&digest)).collect()
}

fn submit_checkpoint(chain: &mut Rootchain, keys: &[OperatorKey], block: u64) -> EntryId {
    let payload = EntryPayload::checkpoint(block.to_be_bytes().to_vec());
    let key = PriorityKey::checkpoint(block);
    let quorum = chain.operators().quorum();
    let sigs = sign_all(&keys[..quorum], &payload, key);
    chain.submit(payload, key, keys[0].address(), sigs).expect("quorum submit")
}

#[test]
fn entries_pop_in_priority_order() {
    let keys = operator_keys(4);
    let mut chain = keyed_chain(&keys);
    for block in [5, 1, 3] {
        submit_checkpoint(&mut chain, &keys, block);
    }
    let served: Vec<u128> = std::iter::from_fn(|| chain.pop_highest_priority())
        .map(|e| e.priority_key.value())
        .collect();
    assert_eq!(served, vec![1, 3, 5]);
}

#[test]
fn equal_priorities_are_served_in_submission_order() {
    let keys = operator_keys(4);
    let mut chain = keyed_chain(&keys);
    let key = PriorityKey::exit(1_700_000_000, 0);
    let mut ids = Vec::new();
    for tag in 0u8..3 {
        let payload = EntryPayload::exit(vec![tag]);
        let sigs = sign_all(&keys[..3], &payload, key);
        ids.push(chain.submit(payload, key, keys[1].address(), sigs).unwrap());
    }
    let served: Vec<EntryId> = std::iter::from_fn(|| chain.pop_highest_priority())
        .map(|e| e.id)
        .collect();
    assert_eq!(served, ids);
}

#[test]
fn exits_are_ordered_by_eligibility_then_position() {
    let keys = operator_keys(4);
    let mut chain = keyed_chain(&keys);
    let keys_in = [
        PriorityKey::exit(200, 0),
        PriorityKey::exit(100, 9),
        PriorityKey::exit(100, 2),
    ];
    for key in keys_in {
        let payload = EntryPayload::exit(key.value().to_be_bytes().to_vec());
        let sigs = sign_all(&keys[..3], &payload, key);
        chain.submit(payload, key, keys[0].address(), sigs).unwrap();
    }
    let served: Vec<PriorityKey> = std::iter::from_fn(|| chain.pop_highest_priority())
        .map(|e| e.priority_key)
        .collect();
    assert_eq!(served, vec![keys_in[2], keys_in[1], keys_in[0]]);
}

#[test]
fn quorum_boundary_for_seven_operators() {
    // f = 2: quorum is 2f + 1 = 5.
    let keys = operator_keys(7);
    let mut chain = keyed_chain(&keys);
    assert_eq!(chain.operators().quorum(), 5);

    let payload = EntryPayload::checkpoint(vec![0xab; 32]);
    let key = PriorityKey::checkpoint(42);
    let below = sign_all(&keys[..4], &payload, key);
    let err = chain.submit(payload.clone(), key, keys[0].address(), below).unwrap_err();
    assert!(matches!(err, SchedulerError::QuorumNotMet { signers: 4, required: 5 }));

    let exact = sign_all(&keys[..5], &payload, key);
    let id = chain.submit(payload, key, keys[0].address(), exact).unwrap();
    assert_eq!(chain.state(id), Some(EntryState::Pending));
}

#[test]
fn duplicated_signatures_count_once() {
    let keys = operator_keys(4);
    let mut chain = keyed_chain(&keys);
    let payload = EntryPayload::checkpoint(vec![1]);
    let key = PriorityKey::checkpoint(1);
    let sigs = sign_all(&keys[..2], &payload, key);
    let padded = vec![sigs[0], sigs[1], sigs[0], sigs[1]];
    let err = chain.submit(payload, key, keys[0].address(), padded).unwrap_err();
    assert!(matches!(err, SchedulerError::QuorumNotMet { signers: 2, required: 3 }));
}

#[test]
fn padding_past_the_operator_count_still_reports_quorum() {
    let keys = operator_keys(4);
    let mut chain = keyed_chain(&keys);
    let payload = EntryPayload::checkpoint(vec![1]);
    let key = PriorityKey::checkpoint(1);
    let sigs = sign_all(&keys[..2], &payload, key);
    let padded = vec![sigs[0], sigs[1], sigs[0], sigs[1], sigs[0]];
    let err = chain.submit(payload, key, keys[0].address(), padded).unwrap_err();
    assert!(matches!(err, SchedulerError::QuorumNotMet { signers: 2, required: 3 }));
    assert_eq!(chain.pending_len(), 0);
}

#[test]
fn outsider_cannot_complete_a_quorum() {
    let keys = operator_keys(5);
    let mut chain = keyed_chain(&keys[..4]);
    let payload = EntryPayload::checkpoint(vec![2]);
    let key = PriorityKey::checkpoint(2);
    let digest = payload.signing_digest(key).unwrap();
    let sigs: Vec<EcdsaSignature> = [&keys[0], &keys[1], &keys[4]].iter().map(|k| k.sign(&digest)).collect();
    let err = chain.submit(payload, key, keys[0].address(), sigs).unwrap_err();
    assert!(matches!(err, SchedulerError::UnauthorizedSigner { signer } if signer == keys[4].address()));
}

#[test]
fn legacy_recovery_ids_are_accepted() {
    let keys = operator_keys(4);
    let mut chain = keyed_chain(&keys);
    let payload = EntryPayload::exit(vec![7]);
    let key = PriorityKey::exit(5, 5);
    let sigs: Vec<EcdsaSignature> = sign_all(&keys[..3], &payload, key)
        .into_iter()
        .map(|s| {
            let mut bytes = *s.as_bytes();
            bytes[64] += 27;
            EcdsaSignature::from_bytes(bytes)
        })
        .collect();
    assert!(chain.submit(payload, key, keys[0].address(), sigs).is_ok());
}

// ─── Deterministic recovery double ───────────────────────────────────

/// Reads the signer address straight out of the signature bytes.
#[derive(Debug, Default)]
struct EmbeddedSigner;

impl SignatureRecovery for EmbeddedSigner {
    fn recover(&self, _digest: &ContentDigest, signature: &EcdsaSignature) -> Result<Address, CryptoError> {
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&signature.as_bytes()[..20]);
        Ok(Address::from_bytes(addr))
    }
}

fn embedded(n: u8) -> EcdsaSignature {
    let mut bytes = [0u8; 65];
    bytes[..20].copy_from_slice(&[n; 20]);
    EcdsaSignature::from_bytes(bytes)
}

fn embedded_chain() -> Rootchain<EmbeddedSigner> {
    let request = DeploymentRequest {
        addresses: (1..=4).map(|n| Address::from_bytes([n; 20])).collect(),
        deposits: amounts(&[DEPOSIT; 4]),
        value: Amount::new(VALUE),
    };
    Rootchain::deploy(&RootchainParams::default(), request, EmbeddedSigner).expect("deploy")
}

#[derive(Debug, Clone)]
enum Op {
    Submit(u8),
    Pop,
    Withdraw(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..8).prop_map(Op::Submit),
        2 => Just(Op::Pop),
        1 => (0usize..32).prop_map(Op::Withdraw),
    ]
}

proptest! {
    #[test]
    fn served_keys_never_decrease_between_submissions(priorities in proptest::collection::vec(0u8..8, 1..40)) {
        let mut chain = embedded_chain();
        let submitter = Address::from_bytes([0xaa; 20]);
        for p in &priorities {
            let sigs = vec![embedded(1), embedded(2), embedded(3)];
            chain
                .submit(EntryPayload::checkpoint(vec![*p]), PriorityKey(u128::from(*p)), submitter, sigs)
                .unwrap();
        }
        let mut last: Option<ScheduleKey> = None;
        while let Some(entry) = chain.pop_highest_priority() {
            let key = ScheduleKey { priority_key: entry.priority_key, sequence: entry.id.sequence() };
            if let Some(prev) = last {
                prop_assert!(prev < key);
            }
            last = Some(key);
        }
        prop_assert_eq!(chain.pending_len(), 0);
    }

    #[test]
    fn interleaved_operations_serve_the_minimum_live_entry(ops in proptest::collection::vec(op_strategy(), 1..60)) {
        let mut chain = embedded_chain();
        let submitter = Address::from_bytes([0xaa; 20]);
        let mut live: Vec<(ScheduleKey, EntryId)> = Vec::new();
        let mut submitted: Vec<EntryId> = Vec::new();

        for op in ops {
            match op {
                Op::Submit(p) => {
                    let key = PriorityKey(u128::from(p));
                    let id = chain
                        .submit(EntryPayload::exit(vec![p]), key, submitter, vec![embedded(2), embedded(3), embedded(4)])
                        .unwrap();
                    live.push((ScheduleKey { priority_key: key, sequence: id.sequence() }, id));
                    submitted.push(id);
                }
                Op::Pop => {
                    live.sort();
                    let expected = if live.is_empty() { None } else { Some(live.remove(0).1) };
                    prop_assert_eq!(chain.pop_highest_priority().map(|e| e.id), expected);
                }
                Op::Withdraw(i) => {
                    let Some(&id) = submitted.get(i) else { continue };
                    let was_live = live.iter().any(|(_, l)| *l == id);
                    let result = chain.withdraw(id, submitter);
                    prop_assert_eq!(result.is_ok(), was_live);
                    live.retain(|(_, l)| *l != id);
                }
            }
            prop_assert_eq!(chain.pending_len(), live.len());
        }
    }
}

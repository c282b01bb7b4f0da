//! # Quorum Verification
//!
//! Turns a list of signatures over an entry digest into the set of distinct
//! operators that signed it, then checks that set against the quorum size.
//!
//! ## Security Invariant
//!
//! - Every signature must recover to a member of the operator set. One
//!   foreign or unparseable signature rejects the whole call.
//! - Signatures from the same operator count once. Byte-identical copies
//!   are dropped before anything else, so a padded list reports a missed
//!   quorum rather than an oversized one.
//! - Lists with more distinct signatures than the set has operators are
//!   rejected before any recovery runs, which bounds the work per call by
//!   the set size.

use std::collections::{BTreeMap, HashSet};

use rootchain_core::{Address, ContentDigest};
use rootchain_crypto::{EcdsaSignature, SignatureRecovery};
use serde::{Deserialize, Serialize};

use crate::registry::OperatorSet;
use crate::scheduler::SchedulerError;

/// Distinct operator signatures that certify one digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumCertificate {
    /// The certified digest.
    pub digest: ContentDigest,
    /// One accepted signature per distinct operator, ordered by address.
    pub attestations: BTreeMap<Address, EcdsaSignature>,
}

impl QuorumCertificate {
    /// Number of distinct signers.
    pub fn signers(&self) -> usize {
        self.attestations.len()
    }
}

/// Recover every signer and check membership.
///
/// Returns one signature per distinct operator. The first signature seen
/// from an operator is kept. Error indices refer to positions in
/// `signatures`.
pub fn recover_signers<R: SignatureRecovery>(
    recovery: &R,
    operators: &OperatorSet,
    digest: &ContentDigest,
    signatures: &[EcdsaSignature],
) -> Result<BTreeMap<Address, EcdsaSignature>, SchedulerError> {
    let mut seen = HashSet::with_capacity(signatures.len());
    let unique: Vec<(usize, &EcdsaSignature)> = signatures
        .iter()
        .enumerate()
        .filter(|(_, signature)| seen.insert(**signature))
        .collect();
    if unique.len() > operators.len() {
        return Err(SchedulerError::TooManySignatures {
            provided: unique.len(),
            max: operators.len(),
        });
    }

    let mut recovered = BTreeMap::new();
    for (index, signature) in unique {
        let signer = recovery
            .recover(digest, signature)
            .map_err(|source| SchedulerError::MalformedSignature { index, source })?;
        if !operators.contains(&signer) {
            return Err(SchedulerError::UnauthorizedSigner { signer });
        }
        recovered.entry(signer).or_insert(*signature);
    }
    Ok(recovered)
}

/// Recover signers and require at least `operators.quorum()` of them.
pub fn verify_quorum<R: SignatureRecovery>(
    recovery: &R,
    operators: &OperatorSet,
    digest: &ContentDigest,
    signatures: &[EcdsaSignature],
) -> Result<QuorumCertificate, SchedulerError> {
    let attestations = recover_signers(recovery, operators, digest, signatures)?;
    let required = operators.quorum();
    if attestations.len() < required {
        return Err(SchedulerError::QuorumNotMet {
            signers: attestations.len(),
            required,
        });
    }
    Ok(QuorumCertificate { digest: *digest, attestations })
}

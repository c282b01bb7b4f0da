//! # Checkpoint and Exit Entries
//!
//! Entries are the unit of work the operator quorum certifies and the
//! scheduler serves in priority order.
//!
//! ## States
//!
//! ```text
//! Submitted ──▶ Pending ──▶ Finalized (terminal)
//!                  │
//!                  └──▶ Withdrawn (terminal)
//! ```
//!
//! `Pending` cannot be skipped: an entry only reaches the ordered container
//! after a quorum of operators has signed its digest.

use std::collections::BTreeMap;

use rootchain_core::{
    keccak256_digest, Address, CanonicalBytes, CanonicalizationError, ContentDigest, EntryId,
    PriorityKey, Timestamp,
};
use rootchain_crypto::EcdsaSignature;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Domain separator bound into every entry signing digest.
pub const ENTRY_DIGEST_DOMAIN: &str = "pbft-rootchain/entry/v1";

// ─── Payload ─────────────────────────────────────────────────────────

/// What an entry asks the rootchain to finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A child-chain block commitment.
    Checkpoint,
    /// A claim to move value off the child chain.
    Exit,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Checkpoint => "checkpoint",
            Self::Exit => "exit",
        })
    }
}

impl std::str::FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checkpoint" => Ok(Self::Checkpoint),
            "exit" => Ok(Self::Exit),
            other => Err(format!("unknown entry kind {other:?}, expected checkpoint or exit")),
        }
    }
}

/// Kind plus opaque bytes (block root, exit claim).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryPayload {
    /// Entry kind.
    pub kind: EntryKind,
    /// Opaque payload bytes, `0x`-hex on the wire.
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
}

#[derive(Serialize)]
struct SigningInput<'a> {
    domain: &'static str,
    kind: EntryKind,
    #[serde(with = "hex_bytes")]
    data: &'a [u8],
    priority_key: PriorityKey,
}

impl EntryPayload {
    /// Build a checkpoint payload.
    pub fn checkpoint(data: impl Into<Vec<u8>>) -> Self {
        Self { kind: EntryKind::Checkpoint, data: data.into() }
    }

    /// Build an exit payload.
    pub fn exit(data: impl Into<Vec<u8>>) -> Self {
        Self { kind: EntryKind::Exit, data: data.into() }
    }

    /// The digest operators sign to admit this payload under `priority_key`.
    ///
    /// The key is part of the signed input, so a certified entry cannot be
    /// re-queued at a different priority.
    pub fn signing_digest(&self, priority_key: PriorityKey) -> Result<ContentDigest, CanonicalizationError> {
        let input = SigningInput {
            domain: ENTRY_DIGEST_DOMAIN,
            kind: self.kind,
            data: &self.data,
            priority_key,
        };
        let canonical = CanonicalBytes::new(&input)?;
        Ok(keccak256_digest(&canonical))
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, T: AsRef<[u8]>>(data: &T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(data.as_ref())))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let body = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(body).map_err(serde::de::Error::custom)
    }
}

// ─── Lifecycle ───────────────────────────────────────────────────────

/// Lifecycle state of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryState {
    /// Proposed, collecting operator signatures.
    Submitted,
    /// Quorum-certified and waiting in the ordered container.
    Pending,
    /// Served by the scheduler (terminal).
    Finalized,
    /// Pulled back by its submitter before being served (terminal).
    Withdrawn,
}

impl EntryState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::Withdrawn)
    }

    /// Whether `self -> to` is an edge of the lifecycle.
    pub fn can_transition_to(&self, to: EntryState) -> bool {
        matches!(
            (self, to),
            (Self::Submitted, Self::Pending)
                | (Self::Pending, Self::Finalized)
                | (Self::Pending, Self::Withdrawn)
        )
    }
}

impl std::fmt::Display for EntryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Submitted => "SUBMITTED",
            Self::Pending => "PENDING",
            Self::Finalized => "FINALIZED",
            Self::Withdrawn => "WITHDRAWN",
        })
    }
}

/// A lifecycle edge that does not exist.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid entry transition: {from} -> {to}")]
pub struct InvalidTransition {
    /// Current state.
    pub from: EntryState,
    /// Attempted target state.
    pub to: EntryState,
}

/// Record of an entry state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// State before the transition.
    pub from_state: EntryState,
    /// State after the transition.
    pub to_state: EntryState,
    /// When the transition occurred.
    pub timestamp: Timestamp,
    /// Why it happened.
    pub reason: String,
}

/// Current state and transition log of one entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryLifecycle {
    /// Entry the log belongs to.
    pub id: EntryId,
    /// Current state.
    pub state: EntryState,
    /// Address that created the entry.
    pub submitter: Address,
    /// When the entry was created.
    pub created_at: Timestamp,
    /// Ordered log of all state transitions.
    pub transitions: Vec<TransitionRecord>,
}

impl EntryLifecycle {
    /// Start a lifecycle in `Submitted`.
    pub fn new(id: EntryId, submitter: Address) -> Self {
        Self {
            id,
            state: EntryState::Submitted,
            submitter,
            created_at: Timestamp::now(),
            transitions: Vec::new(),
        }
    }

    /// Move to `to`, recording the transition.
    pub fn advance(&mut self, to: EntryState, reason: &str) -> Result<(), InvalidTransition> {
        if !self.state.can_transition_to(to) {
            return Err(InvalidTransition { from: self.state, to });
        }
        self.transitions.push(TransitionRecord {
            from_state: self.state,
            to_state: to,
            timestamp: Timestamp::now(),
            reason: reason.to_string(),
        });
        self.state = to;
        Ok(())
    }
}

// ─── Entries ─────────────────────────────────────────────────────────

/// A quorum-certified entry waiting to be served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEntry {
    /// Entry identifier, also its submission sequence.
    pub id: EntryId,
    /// What is being finalized.
    pub payload: EntryPayload,
    /// Service order key.
    pub priority_key: PriorityKey,
    /// Address that submitted the entry.
    pub submitter: Address,
    /// Digest the operators signed.
    pub digest: ContentDigest,
    /// One signature per certifying operator, parallel to `signers`.
    pub signatures: Vec<EcdsaSignature>,
    /// Distinct operators whose signatures certified the entry.
    pub signers: Vec<Address>,
}

/// An entry still collecting operator signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Entry identifier reserved at proposal time.
    pub id: EntryId,
    /// What is being finalized.
    pub payload: EntryPayload,
    /// Service order key.
    pub priority_key: PriorityKey,
    /// Address that proposed the entry.
    pub submitter: Address,
    /// Digest operators must sign.
    pub digest: ContentDigest,
    /// Accepted signature per operator.
    pub attestations: BTreeMap<Address, EcdsaSignature>,
}

impl Proposal {
    /// Number of distinct operators that have attested.
    pub fn attested(&self) -> usize {
        self.attestations.len()
    }

    /// Promote to a pending entry.
    pub fn into_pending(self) -> PendingEntry {
        let (signers, signatures): (Vec<Address>, Vec<EcdsaSignature>) =
            self.attestations.into_iter().unzip();
        PendingEntry {
            id: self.id,
            payload: self.payload,
            priority_key: self.priority_key,
            submitter: self.submitter,
            digest: self.digest,
            signatures,
            signers,
        }
    }
}

//! # Priority-Ordered Checkpoint/Exit Scheduler
//!
//! Admits quorum-certified entries and serves them lowest priority key
//! first, equal keys in submission order.
//!
//! Two admission paths:
//!
//! - [`Scheduler::submit`] takes a complete signature set and queues the
//!   entry in one step.
//! - [`Scheduler::propose`] opens a proposal that operators co-sign through
//!   [`Scheduler::attest`] until quorum promotes it.
//!
//! ## Lazy Withdrawal
//!
//! Withdrawing an entry drops it from the entry table but leaves its key in
//! the ordered container. Stale keys are discarded whenever they reach the
//! head, so the head of the container is always a live entry.
//!
//! Every failing call leaves the scheduler unchanged.

use std::collections::BTreeMap;

use rootchain_core::{Address, CanonicalizationError, CryptoError, EntryId, PriorityKey};
use rootchain_crypto::{EcdsaSignature, SignatureRecovery};
use thiserror::Error;

use crate::entry::{EntryLifecycle, EntryPayload, EntryState, PendingEntry, Proposal, TransitionRecord};
use crate::queue::{HeapQueue, PriorityQueue, ScheduleKey};
use crate::quorum::{recover_signers, verify_quorum};
use crate::registry::OperatorSet;

// ─── Errors ──────────────────────────────────────────────────────────

/// Rejection reasons of scheduler operations.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// Fewer distinct operator signatures than the quorum.
    #[error("quorum not met: {signers} distinct operator signatures, {required} required")]
    QuorumNotMet {
        /// Distinct operators that signed.
        signers: usize,
        /// Quorum size of the operator set.
        required: usize,
    },

    /// A signature recovered to an address outside the operator set.
    #[error("signer {signer} is not an operator")]
    UnauthorizedSigner {
        /// The recovered address.
        signer: Address,
    },

    /// A signature could not be parsed or recovered.
    #[error("malformed signature at index {index}: {source}")]
    MalformedSignature {
        /// Position in the submitted list.
        index: usize,
        /// Underlying recovery failure.
        source: CryptoError,
    },

    /// More signatures than there are operators.
    #[error("too many signatures: {provided} provided, at most {max} accepted")]
    TooManySignatures {
        /// Signatures supplied.
        provided: usize,
        /// Operator count.
        max: usize,
    },

    /// No entry with this id.
    #[error("unknown entry {0}")]
    UnknownEntry(EntryId),

    /// The operation would take the entry along a missing lifecycle edge.
    #[error("invalid transition for {id}: {from} -> {to}")]
    InvalidTransition {
        /// The entry.
        id: EntryId,
        /// Its current state.
        from: EntryState,
        /// The state the operation needs.
        to: EntryState,
    },

    /// Only the submitter may withdraw an entry.
    #[error("{caller} is not the submitter of {id}")]
    NotSubmitter {
        /// The entry.
        id: EntryId,
        /// Who asked.
        caller: Address,
    },

    /// The signing digest could not be computed.
    #[error("signing digest: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

// ─── Scheduler ───────────────────────────────────────────────────────

/// Quorum-gated priority scheduler over a [`PriorityQueue`].
#[derive(Debug)]
pub struct Scheduler<Q = HeapQueue<ScheduleKey, EntryId>> {
    queue: Q,
    pending: BTreeMap<EntryId, PendingEntry>,
    proposals: BTreeMap<EntryId, Proposal>,
    lifecycles: BTreeMap<EntryId, EntryLifecycle>,
    next_id: EntryId,
}

impl<Q: PriorityQueue<ScheduleKey, EntryId> + Default> Default for Scheduler<Q> {
    fn default() -> Self {
        Self::with_queue(Q::default())
    }
}

impl Scheduler {
    /// A scheduler over the binary-heap container.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<Q: PriorityQueue<ScheduleKey, EntryId>> Scheduler<Q> {
    /// A scheduler over a caller-supplied container.
    ///
    /// Anything already in the container is discarded: only keys the
    /// scheduler admitted itself may reach the head.
    pub fn with_queue(mut queue: Q) -> Self {
        let mut dropped = 0usize;
        while queue.remove_min().is_some() {
            dropped += 1;
        }
        if dropped > 0 {
            tracing::warn!(dropped, "discarded foreign keys from scheduler queue");
        }
        Self {
            queue,
            pending: BTreeMap::new(),
            proposals: BTreeMap::new(),
            lifecycles: BTreeMap::new(),
            next_id: EntryId(1),
        }
    }

    /// Admit an entry signed by a quorum of operators.
    ///
    /// On success the entry is `Pending` and its id is also its
    /// submission sequence.
    pub fn submit<R: SignatureRecovery>(
        &mut self,
        recovery: &R,
        operators: &OperatorSet,
        payload: EntryPayload,
        priority_key: PriorityKey,
        submitter: Address,
        signatures: Vec<EcdsaSignature>,
    ) -> Result<EntryId, SchedulerError> {
        let digest = payload.signing_digest(priority_key)?;
        let certificate = verify_quorum(recovery, operators, &digest, &signatures)?;

        let id = self.allocate_id();
        let proposal = Proposal {
            id,
            payload,
            priority_key,
            submitter,
            digest,
            attestations: certificate.attestations,
        };
        self.lifecycles.insert(id, EntryLifecycle::new(id, submitter));
        self.enqueue(proposal)?;
        Ok(id)
    }

    /// Open a proposal that operators co-sign through [`Self::attest`].
    pub fn propose(
        &mut self,
        payload: EntryPayload,
        priority_key: PriorityKey,
        submitter: Address,
    ) -> Result<EntryId, SchedulerError> {
        let digest = payload.signing_digest(priority_key)?;
        let id = self.allocate_id();
        self.proposals.insert(
            id,
            Proposal {
                id,
                payload,
                priority_key,
                submitter,
                digest,
                attestations: BTreeMap::new(),
            },
        );
        self.lifecycles.insert(id, EntryLifecycle::new(id, submitter));
        tracing::info!(entry_id = %id, priority_key = %priority_key, "entry proposed");
        Ok(id)
    }

    /// Add operator signatures to a proposal.
    ///
    /// All signatures in one call are accepted or none are. Returns
    /// `Pending` once the proposal reached quorum and was queued,
    /// `Submitted` otherwise.
    pub fn attest<R: SignatureRecovery>(
        &mut self,
        recovery: &R,
        operators: &OperatorSet,
        id: EntryId,
        signatures: &[EcdsaSignature],
    ) -> Result<EntryState, SchedulerError> {
        let state = self.state(id).ok_or(SchedulerError::UnknownEntry(id))?;
        let Some(proposal) = self.proposals.get_mut(&id) else {
            return Err(SchedulerError::InvalidTransition { id, from: state, to: EntryState::Pending });
        };

        let recovered = recover_signers(recovery, operators, &proposal.digest, signatures)?;
        for (signer, signature) in recovered {
            proposal.attestations.entry(signer).or_insert(signature);
        }
        tracing::debug!(entry_id = %id, signers = proposal.attested(), "attestations recorded");

        if proposal.attested() < operators.quorum() {
            return Ok(EntryState::Submitted);
        }
        match self.proposals.remove(&id) {
            Some(proposal) => {
                self.enqueue(proposal)?;
                Ok(EntryState::Pending)
            }
            None => Err(SchedulerError::UnknownEntry(id)),
        }
    }

    /// Remove and finalize the entry with the lowest `(priority_key, sequence)`.
    pub fn pop_highest_priority(&mut self) -> Option<PendingEntry> {
        let (_, id) = self.queue.remove_min()?;
        let entry = self.pending.remove(&id);
        self.discard_stale_head();

        let entry = entry?;
        if let Some(lifecycle) = self.lifecycles.get_mut(&id) {
            if let Err(e) = lifecycle.advance(EntryState::Finalized, "served by scheduler") {
                tracing::warn!(entry_id = %id, error = %e, "finalizing entry outside pending state");
            }
        }
        tracing::info!(
            entry_id = %id,
            priority_key = %entry.priority_key,
            kind = %entry.payload.kind,
            "entry finalized"
        );
        Some(entry)
    }

    /// The entry [`Self::pop_highest_priority`] would return next.
    pub fn peek_highest_priority(&self) -> Option<&PendingEntry> {
        let (_, id) = self.queue.peek_min()?;
        self.pending.get(id)
    }

    /// Withdraw a pending entry. Only its submitter may do so.
    pub fn withdraw(&mut self, id: EntryId, caller: Address) -> Result<PendingEntry, SchedulerError> {
        let lifecycle = self.lifecycles.get_mut(&id).ok_or(SchedulerError::UnknownEntry(id))?;
        if lifecycle.submitter != caller {
            tracing::warn!(entry_id = %id, caller = %caller, "withdrawal by non-submitter rejected");
            return Err(SchedulerError::NotSubmitter { id, caller });
        }
        lifecycle
            .advance(EntryState::Withdrawn, "withdrawn by submitter")
            .map_err(|e| SchedulerError::InvalidTransition { id, from: e.from, to: e.to })?;

        let entry = self.pending.remove(&id).ok_or(SchedulerError::UnknownEntry(id))?;
        self.discard_stale_head();
        tracing::info!(entry_id = %id, submitter = %caller, "entry withdrawn");
        Ok(entry)
    }

    /// Current lifecycle state of an entry.
    pub fn state(&self, id: EntryId) -> Option<EntryState> {
        self.lifecycles.get(&id).map(|lc| lc.state)
    }

    /// Transition log of an entry.
    pub fn history(&self, id: EntryId) -> Option<&[TransitionRecord]> {
        self.lifecycles.get(&id).map(|lc| lc.transitions.as_slice())
    }

    /// Open proposal by id.
    pub fn proposal(&self, id: EntryId) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    /// Pending entry by id.
    pub fn pending_entry(&self, id: EntryId) -> Option<&PendingEntry> {
        self.pending.get(&id)
    }

    /// Number of live pending entries.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn allocate_id(&mut self) -> EntryId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }

    /// Promote a quorum-certified proposal into the ordered container.
    fn enqueue(&mut self, proposal: Proposal) -> Result<(), SchedulerError> {
        let id = proposal.id;
        let lifecycle = self.lifecycles.get_mut(&id).ok_or(SchedulerError::UnknownEntry(id))?;
        lifecycle
            .advance(EntryState::Pending, "operator quorum reached")
            .map_err(|e| SchedulerError::InvalidTransition { id, from: e.from, to: e.to })?;

        let entry = proposal.into_pending();
        let key = ScheduleKey { priority_key: entry.priority_key, sequence: id.sequence() };
        tracing::info!(
            entry_id = %id,
            priority_key = %entry.priority_key,
            signers = entry.signers.len(),
            "entry queued"
        );
        self.pending.insert(id, entry);
        self.queue.insert(key, id);
        Ok(())
    }

    fn discard_stale_head(&mut self) {
        while let Some((_, id)) = self.queue.peek_min() {
            if self.pending.contains_key(id) {
                break;
            }
            tracing::debug!(entry_id = %id, "discarding withdrawn entry from queue head");
            self.queue.remove_min();
        }
    }
}

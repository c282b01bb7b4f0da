//! # Rootchain Aggregate
//!
//! Owns the operator set, the scheduler and the signature-recovery oracle,
//! and records every committed state change as a [`RootchainEvent`].
//!
//! All mutation takes `&mut self`. There is exactly one writer at a time,
//! which is the sequential execution model the rootchain needs.

use rootchain_core::{Address, Amount, EntryId, PriorityKey, RootchainParams};
use rootchain_crypto::{EcdsaSignature, Secp256k1Recovery, SignatureRecovery};
use serde::{Deserialize, Serialize};

use crate::entry::{EntryKind, EntryPayload, EntryState, PendingEntry, TransitionRecord};
use crate::queue::{HeapQueue, PriorityQueue, ScheduleKey};
use crate::registry::{BootstrapError, DeploymentRequest, OperatorSet};
use crate::scheduler::{Scheduler, SchedulerError};

/// Committed state changes, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RootchainEvent {
    /// The operator set was fixed at deployment.
    OperatorsBootstrapped {
        /// Operator addresses in input order.
        operators: Vec<Address>,
        /// Value escrowed at deployment.
        escrowed: Amount,
        /// Escrow not attributed to any operator.
        reserve: Amount,
    },
    /// A proposal was opened.
    EntryProposed {
        /// The entry.
        id: EntryId,
        /// Proposer.
        submitter: Address,
        /// Service order key.
        priority_key: PriorityKey,
    },
    /// Operators co-signed a proposal.
    EntryAttested {
        /// The entry.
        id: EntryId,
        /// Distinct operators that have attested so far.
        signers: usize,
    },
    /// An entry reached quorum and entered the ordered container.
    EntryQueued {
        /// The entry.
        id: EntryId,
        /// Service order key.
        priority_key: PriorityKey,
        /// Certifying operators.
        signers: Vec<Address>,
    },
    /// The scheduler served an entry.
    EntryFinalized {
        /// The entry.
        id: EntryId,
        /// What was finalized.
        kind: EntryKind,
        /// Service order key.
        priority_key: PriorityKey,
    },
    /// The submitter withdrew a pending entry.
    EntryWithdrawn {
        /// The entry.
        id: EntryId,
        /// The submitter.
        submitter: Address,
    },
}

/// A deployed rootchain.
#[derive(Debug)]
pub struct Rootchain<R = Secp256k1Recovery, Q = HeapQueue<ScheduleKey, EntryId>> {
    params: RootchainParams,
    operators: OperatorSet,
    scheduler: Scheduler<Q>,
    recovery: R,
    events: Vec<RootchainEvent>,
}

impl<R, Q> Rootchain<R, Q>
where
    R: SignatureRecovery,
    Q: PriorityQueue<ScheduleKey, EntryId> + Default,
{
    /// Validate the deployment and fix the operator set.
    ///
    /// Fails atomically: on error nothing is constructed.
    pub fn deploy(
        params: &RootchainParams,
        request: DeploymentRequest,
        recovery: R,
    ) -> Result<Self, BootstrapError> {
        let operators = request.bootstrap(params).map_err(|e| {
            tracing::warn!(error = %e, "rootchain deployment rejected");
            e
        })?;

        tracing::info!(
            operators = operators.len(),
            quorum = operators.quorum(),
            escrowed = %operators.escrowed(),
            reserve = %operators.reserve(),
            "rootchain deployed"
        );
        let bootstrapped = RootchainEvent::OperatorsBootstrapped {
            operators: operators.addresses().collect(),
            escrowed: operators.escrowed(),
            reserve: operators.reserve(),
        };
        Ok(Self {
            params: params.clone(),
            operators,
            scheduler: Scheduler::default(),
            recovery,
            events: vec![bootstrapped],
        })
    }
}

impl<R, Q> Rootchain<R, Q>
where
    R: SignatureRecovery,
    Q: PriorityQueue<ScheduleKey, EntryId>,
{
    /// Deployment parameters.
    pub fn params(&self) -> &RootchainParams {
        &self.params
    }

    /// The operator set fixed at deployment.
    pub fn operators(&self) -> &OperatorSet {
        &self.operators
    }

    /// Admit a fully signed entry.
    pub fn submit(
        &mut self,
        payload: EntryPayload,
        priority_key: PriorityKey,
        submitter: Address,
        signatures: Vec<EcdsaSignature>,
    ) -> Result<EntryId, SchedulerError> {
        let id = self
            .scheduler
            .submit(&self.recovery, &self.operators, payload, priority_key, submitter, signatures)
            .map_err(|e| {
                tracing::warn!(error = %e, "entry submission rejected");
                e
            })?;
        self.record_queued(id);
        Ok(id)
    }

    /// Open a proposal for operators to co-sign.
    pub fn propose(
        &mut self,
        payload: EntryPayload,
        priority_key: PriorityKey,
        submitter: Address,
    ) -> Result<EntryId, SchedulerError> {
        let id = self.scheduler.propose(payload, priority_key, submitter)?;
        self.events.push(RootchainEvent::EntryProposed { id, submitter, priority_key });
        Ok(id)
    }

    /// Add operator signatures to a proposal.
    ///
    /// `EntryAttested` is recorded only when the proposal gained a signer.
    pub fn attest(&mut self, id: EntryId, signatures: &[EcdsaSignature]) -> Result<EntryState, SchedulerError> {
        let before = self.attested(id);
        let state = self
            .scheduler
            .attest(&self.recovery, &self.operators, id, signatures)
            .map_err(|e| {
                tracing::warn!(entry_id = %id, error = %e, "attestation rejected");
                e
            })?;
        match state {
            EntryState::Pending => self.record_queued(id),
            _ => {
                let signers = self.attested(id);
                if signers > before {
                    self.events.push(RootchainEvent::EntryAttested { id, signers });
                }
            }
        }
        Ok(state)
    }

    fn attested(&self, id: EntryId) -> usize {
        self.scheduler.proposal(id).map_or(0, |p| p.attested())
    }

    /// Serve the entry with the lowest priority key.
    pub fn pop_highest_priority(&mut self) -> Option<PendingEntry> {
        let entry = self.scheduler.pop_highest_priority()?;
        self.events.push(RootchainEvent::EntryFinalized {
            id: entry.id,
            kind: entry.payload.kind,
            priority_key: entry.priority_key,
        });
        Some(entry)
    }

    /// The entry that would be served next.
    pub fn peek_highest_priority(&self) -> Option<&PendingEntry> {
        self.scheduler.peek_highest_priority()
    }

    /// Withdraw a pending entry on behalf of its submitter.
    pub fn withdraw(&mut self, id: EntryId, caller: Address) -> Result<PendingEntry, SchedulerError> {
        let entry = self.scheduler.withdraw(id, caller)?;
        self.events.push(RootchainEvent::EntryWithdrawn { id, submitter: entry.submitter });
        Ok(entry)
    }

    /// Lifecycle state of an entry.
    pub fn state(&self, id: EntryId) -> Option<EntryState> {
        self.scheduler.state(id)
    }

    /// Transition log of an entry.
    pub fn history(&self, id: EntryId) -> Option<&[TransitionRecord]> {
        self.scheduler.history(id)
    }

    /// Number of entries waiting to be served.
    pub fn pending_len(&self) -> usize {
        self.scheduler.pending_len()
    }

    /// Events recorded since the last drain.
    pub fn events(&self) -> &[RootchainEvent] {
        &self.events
    }

    /// Hand the event log to a consumer, leaving it empty.
    pub fn drain_events(&mut self) -> Vec<RootchainEvent> {
        std::mem::take(&mut self.events)
    }

    fn record_queued(&mut self, id: EntryId) {
        if let Some(entry) = self.scheduler.pending_entry(id) {
            self.events.push(RootchainEvent::EntryQueued {
                id,
                priority_key: entry.priority_key,
                signers: entry.signers.clone(),
            });
        }
    }
}

//! # rootchain-state — Operator Registry and Entry Scheduler
//!
//! The stateful half of the PBFT rootchain.
//!
//! ## Components
//!
//! - **Registry** (`registry.rs`): one-shot bootstrap of the operator set
//!   with five ordered, mutually exclusive failure modes and collateral
//!   attribution.
//!
//! - **Entries** (`entry.rs`): checkpoint/exit payloads, their signing
//!   digest and the `Submitted → Pending → Finalized | Withdrawn`
//!   lifecycle.
//!
//! - **Quorum** (`quorum.rs`): signer recovery through the
//!   `SignatureRecovery` oracle, membership and distinct-signer counting.
//!
//! - **Ordered container** (`queue.rs`): the `PriorityQueue` trait, the
//!   `ScheduleKey` tie-break and the binary-heap reference implementation.
//!
//! - **Scheduler** (`scheduler.rs`): quorum-gated admission and
//!   lowest-key-first service with lazy withdrawal.
//!
//! - **Rootchain** (`rootchain.rs`): the aggregate that owns all of the
//!   above and emits `RootchainEvent`s.
//!
//! ## Design
//!
//! There is no global state. A deployment is a `Rootchain` value, every
//! mutation takes `&mut self`, and the signature oracle and container are
//! type parameters so tests can substitute deterministic doubles.

pub mod entry;
pub mod queue;
pub mod quorum;
pub mod registry;
pub mod rootchain;
pub mod scheduler;

// ─── Registry re-exports ────────────────────────────────────────────

pub use registry::{bootstrap, BootstrapError, DeploymentRequest, Operator, OperatorSet};

// ─── Entry re-exports ───────────────────────────────────────────────

pub use entry::{
    EntryKind, EntryLifecycle, EntryPayload, EntryState, InvalidTransition, PendingEntry,
    Proposal, TransitionRecord, ENTRY_DIGEST_DOMAIN,
};

// ─── Scheduling re-exports ──────────────────────────────────────────

pub use queue::{HeapQueue, PriorityQueue, ScheduleKey};
pub use quorum::{recover_signers, verify_quorum, QuorumCertificate};
pub use rootchain::{Rootchain, RootchainEvent};
pub use scheduler::{Scheduler, SchedulerError};

//! # Digest and Sign Subcommands
//!
//! Compute the digest operators sign for an entry, and produce an
//! operator's signature over it. Submitters collect these signatures
//! off-chain before calling `submit`.

use anyhow::Context;
use clap::Args;
use rootchain_core::{Address, ContentDigest, PriorityKey};
use rootchain_crypto::{EcdsaSignature, OperatorKey};
use rootchain_state::{EntryKind, EntryPayload};
use serde::Serialize;

/// Entry selection shared by `digest` and `sign`.
#[derive(Args, Debug, Clone)]
pub struct EntryArgs {
    /// Entry kind: `checkpoint` or `exit`.
    #[arg(long)]
    pub kind: EntryKind,

    /// Payload bytes as hex.
    #[arg(long)]
    pub data: String,

    /// Priority key. Lower is served first.
    #[arg(long)]
    pub priority: u128,
}

impl EntryArgs {
    fn payload(&self) -> anyhow::Result<EntryPayload> {
        let body = self.data.strip_prefix("0x").unwrap_or(&self.data);
        let data = hex::decode(body).context("--data must be hex")?;
        Ok(EntryPayload { kind: self.kind, data })
    }

    fn digest(&self) -> anyhow::Result<ContentDigest> {
        let digest = self
            .payload()?
            .signing_digest(PriorityKey::from(self.priority))
            .context("computing entry signing digest")?;
        Ok(digest)
    }
}

/// Arguments for the digest subcommand.
#[derive(Args, Debug)]
pub struct DigestArgs {
    #[command(flatten)]
    pub entry: EntryArgs,
}

/// Arguments for the sign subcommand.
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Operator secret key as hex.
    #[arg(long)]
    pub key: String,

    #[command(flatten)]
    pub entry: EntryArgs,
}

/// Digest of an entry.
#[derive(Debug, Serialize)]
pub struct DigestReport {
    /// Digest operators sign.
    pub digest: ContentDigest,
}

/// An operator's signature over an entry.
#[derive(Debug, Serialize)]
pub struct SignatureReport {
    /// Digest that was signed.
    pub digest: ContentDigest,
    /// Signing operator.
    pub signer: Address,
    /// 65-byte recoverable signature.
    pub signature: EcdsaSignature,
}

/// Compute an entry's signing digest.
pub fn run_digest(args: &DigestArgs) -> anyhow::Result<DigestReport> {
    Ok(DigestReport { digest: args.entry.digest()? })
}

/// Sign an entry's digest with an operator key.
pub fn run_sign(args: &SignArgs) -> anyhow::Result<SignatureReport> {
    let key = OperatorKey::from_hex(&args.key).context("--key")?;
    let digest = args.entry.digest()?;
    let signature = key.sign(&digest);
    tracing::info!(signer = %key.address(), digest = %digest, "entry signed");
    Ok(SignatureReport {
        digest,
        signer: key.address(),
        signature,
    })
}

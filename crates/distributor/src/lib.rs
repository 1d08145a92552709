//! merkledrop Distributor
//!
//! Verifies Merkle claims against a committed root and disburses each
//! recipient's allocation exactly once.
//!
//! ## Claim Flow
//!
//! 1. **Check**: a recipient already marked in the [`ClaimLedger`] is
//!    rejected with `AlreadyClaimed`.
//! 2. **Verify**: `(recipient, amount, proof)` must fold to the committed
//!    root, otherwise `NotInMerkle`.
//! 3. **Mark**: the ledger flag is set atomically *before* any value moves,
//!    so code running inside the transfer sees the claim as consumed.
//! 4. **Transfer**: the allocation leaves custody through the
//!    [`TokenLedger`]. On failure the mark is reverted and the claim fails
//!    with `TransferFailed`.
//! 5. **Emit**: a `Claimed` event is appended to the [`EventLog`].
//!
//! The admin returned by the [`AdminAuthority`] may `sweep` any asset out
//! of custody; sweeps never touch the claim ledger.

mod access;
mod config;
mod custody;
mod distributor;
mod events;
mod ledger;
mod registry;
mod snapshot;
mod types;

pub use access::{AdminAuthority, FixedAdmin, SharedAdmin};
pub use config::DistributorConfig;
pub use custody::{InMemoryTokenLedger, TokenLedger};
pub use distributor::Distributor;
pub use events::EventLog;
pub use ledger::{ClaimLedger, MarkOutcome};
pub use registry::RootRegistry;
pub use snapshot::{BalanceEntry, DistributorSnapshot};
pub use types::*;

use merkledrop_core::{Address, Amount};
use thiserror::Error;

/// Rejection from the external asset store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Insufficient custody balance: available {available}, requested {requested}")]
    InsufficientBalance { available: Amount, requested: Amount },

    #[error("Transfer rejected by recipient {0}")]
    RecipientRejected(Address),

    #[error("Ledger error: {0}")]
    Ledger(String),
}

#[derive(Error, Debug)]
pub enum DistributorError {
    #[error("Allocation already claimed")]
    AlreadyClaimed,

    #[error("Proof does not match the committed root")]
    NotInMerkle,

    #[error("Transfer failed: {0}")]
    TransferFailed(#[from] TransferError),

    #[error("Not authorized: {0} is not the admin")]
    Unauthorized(Address),

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl DistributorError {
    /// Only custody failures can succeed on a later attempt with the same
    /// inputs (e.g. after custody is replenished).
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::TransferFailed(_))
    }
}

pub type Result<T> = std::result::Result<T, DistributorError>;

//! Per-recipient claim flags.
//!
//! Unknown recipients read as unclaimed. The only externally visible
//! transition is unclaimed → claimed; `revert_claim` exists solely for the
//! distributor to undo its own mark when the transfer that followed it
//! failed.

use std::collections::HashSet;

use merkledrop_core::Address;
use parking_lot::RwLock;

/// Result of an atomic mark attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// The flag was unset and is now set
    Success,
    /// The flag was already set; nothing changed
    AlreadyClaimed,
}

/// Claim record keyed by recipient
#[derive(Debug, Default)]
pub struct ClaimLedger {
    claimed: RwLock<HashSet<Address>>,
}

impl ClaimLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from previously claimed recipients.
    pub fn from_claimed(claimed: impl IntoIterator<Item = Address>) -> Self {
        Self {
            claimed: RwLock::new(claimed.into_iter().collect()),
        }
    }

    pub fn is_claimed(&self, recipient: &Address) -> bool {
        self.claimed.read().contains(recipient)
    }

    /// Set the flag if unset. Check and set happen under one write lock, so
    /// of any number of concurrent callers for one recipient exactly one
    /// sees `Success`.
    pub fn try_mark_claimed(&self, recipient: Address) -> MarkOutcome {
        if self.claimed.write().insert(recipient) {
            MarkOutcome::Success
        } else {
            MarkOutcome::AlreadyClaimed
        }
    }

    pub(crate) fn revert_claim(&self, recipient: &Address) {
        self.claimed.write().remove(recipient);
    }

    pub fn claimed_count(&self) -> usize {
        self.claimed.read().len()
    }

    /// Claimed recipients in ascending order.
    pub fn claimed(&self) -> Vec<Address> {
        let mut out: Vec<Address> = self.claimed.read().iter().copied().collect();
        out.sort();
        out
    }
}

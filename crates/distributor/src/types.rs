//! Claim results and externally observable events

use merkledrop_core::{serde_amount, Address, Amount};
use serde::{Deserialize, Serialize};

/// Successful disbursement of one allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimReceipt {
    /// Recipient whose allocation was paid
    pub recipient: Address,
    /// Amount transferred out of custody
    pub amount: Amount,
}

/// Notification appended to the event log after a state change commits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DistributorEvent {
    /// An allocation was disbursed to its recipient
    Claimed {
        recipient: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    /// The admin recovered an asset held in custody
    Recovered {
        asset: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
}

//! Disbursement executor and sweep path.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use merkledrop_core::{hex_prefix, Address, Amount, Digest};
use tracing::{debug, error, info, warn};

use crate::{
    AdminAuthority, ClaimLedger, ClaimReceipt, DistributorConfig, DistributorError,
    DistributorEvent, EventLog, MarkOutcome, Result, RootRegistry, TokenLedger, TransferError,
};

/// Merkle distributor
///
/// Shared through `Arc`; every method takes `&self`. Claims for different
/// recipients run concurrently, claims for the same recipient are decided
/// by the ledger's atomic mark, and custody debits are serialised by the
/// token ledger itself.
pub struct Distributor {
    registry: RootRegistry,
    ledger: Arc<ClaimLedger>,
    admin: Arc<dyn AdminAuthority>,
    events: EventLog,
}

impl Distributor {
    /// Create a distributor committed to `config.merkle_root`, disbursing
    /// from `token`'s custody account.
    pub fn new(
        config: DistributorConfig,
        token: Arc<dyn TokenLedger>,
        admin: Arc<dyn AdminAuthority>,
    ) -> Self {
        Self::with_state(config, token, admin, ClaimLedger::new(), EventLog::new())
    }

    /// Create a distributor resuming from existing claim state and history.
    pub fn with_state(
        config: DistributorConfig,
        token: Arc<dyn TokenLedger>,
        admin: Arc<dyn AdminAuthority>,
        ledger: ClaimLedger,
        events: EventLog,
    ) -> Self {
        info!(
            "Distributor ready (root: {}, hash: {}, asset: {}, custody: {})",
            hex_prefix(&config.merkle_root),
            config.hash,
            token.asset_id(),
            token.custody(),
        );
        Self {
            registry: RootRegistry::new(config, token),
            ledger: Arc::new(ledger),
            admin,
            events,
        }
    }

    pub fn config(&self) -> &DistributorConfig {
        self.registry.config()
    }

    pub fn merkle_root(&self) -> &Digest {
        self.registry.merkle_root()
    }

    pub fn token(&self) -> &Arc<dyn TokenLedger> {
        self.registry.token()
    }

    /// Read handle on the claim ledger (observers, snapshots).
    pub fn ledger(&self) -> Arc<ClaimLedger> {
        Arc::clone(&self.ledger)
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn admin(&self) -> Address {
        self.admin.current_admin()
    }

    /// Pre-flight proof check. No side effects.
    pub fn check_claim(&self, recipient: &Address, amount: Amount, proof: &[Digest]) -> bool {
        let valid = self.registry.verify(recipient, amount, proof);
        debug!(
            "Checked claim for {} ({}): {}",
            hex_prefix(recipient.as_bytes()),
            amount,
            if valid { "valid" } else { "invalid" },
        );
        valid
    }

    pub fn is_claimed(&self, recipient: &Address) -> bool {
        self.ledger.is_claimed(recipient)
    }

    pub async fn custody_balance(&self) -> Amount {
        let token = self.registry.token();
        token.balance_of(token.custody()).await
    }

    /// Disburse `recipient`'s allocation.
    ///
    /// The recipient is marked claimed before the transfer is requested, so
    /// code running inside the transfer sees the allocation as consumed.
    /// The mark is reverted if the transfer fails, panics, or the returned
    /// future is dropped before the transfer completes; a failed call leaves
    /// no state change.
    pub async fn claim(
        &self,
        recipient: Address,
        amount: Amount,
        proof: &[Digest],
    ) -> Result<ClaimReceipt> {
        if self.ledger.is_claimed(&recipient) {
            debug!("Rejected claim for {}: already claimed", hex_prefix(recipient.as_bytes()));
            return Err(DistributorError::AlreadyClaimed);
        }

        if !self.registry.verify(&recipient, amount, proof) {
            debug!(
                "Rejected claim for {} ({}): proof does not match root",
                hex_prefix(recipient.as_bytes()),
                amount,
            );
            return Err(DistributorError::NotInMerkle);
        }

        if self.ledger.try_mark_claimed(recipient) == MarkOutcome::AlreadyClaimed {
            debug!(
                "Rejected claim for {}: claimed concurrently",
                hex_prefix(recipient.as_bytes())
            );
            return Err(DistributorError::AlreadyClaimed);
        }
        let mark = MarkGuard::new(&self.ledger, recipient);

        let transfer = self.registry.token().transfer(recipient, amount);
        match AssertUnwindSafe(transfer).catch_unwind().await {
            Ok(Ok(())) => {
                mark.disarm();
                self.events.append(DistributorEvent::Claimed { recipient, amount });
                info!("Claimed {} for {}", amount, recipient);
                Ok(ClaimReceipt { recipient, amount })
            }
            Ok(Err(e)) => {
                drop(mark);
                warn!("Claim for {} rolled back: {}", recipient, e);
                Err(DistributorError::TransferFailed(e))
            }
            Err(payload) => {
                drop(mark);
                let reason = panic_message(payload.as_ref());
                error!("Transfer to {} panicked, claim rolled back: {}", recipient, reason);
                Err(DistributorError::TransferFailed(TransferError::Ledger(format!(
                    "transfer panicked: {}",
                    reason
                ))))
            }
        }
    }

    /// Recover `amount` of `asset` from custody to the current admin.
    ///
    /// `asset` may be the distributed token or anything else that ended up
    /// in custody. The claim ledger is never consulted or modified.
    pub async fn sweep(
        &self,
        caller: Address,
        asset: &dyn TokenLedger,
        amount: Amount,
    ) -> Result<()> {
        let admin = self.admin.current_admin();
        if caller != admin {
            warn!("Unauthorized sweep attempt by {}", caller);
            return Err(DistributorError::Unauthorized(caller));
        }

        asset.transfer(admin, amount).await?;

        let asset_id = asset.asset_id();
        self.events.append(DistributorEvent::Recovered {
            asset: asset_id,
            amount,
        });
        info!("Recovered {} of asset {} to admin {}", amount, asset_id, admin);
        Ok(())
    }

    /// Sweep of the distributed token itself.
    pub async fn sweep_distributed(&self, caller: Address, amount: Amount) -> Result<()> {
        let token = Arc::clone(self.registry.token());
        self.sweep(caller, token.as_ref(), amount).await
    }
}

/// Claim mark held while the transfer is in flight. Dropping it without
/// `disarm` reverts the mark, which covers errors, panics and a dropped
/// claim future alike.
struct MarkGuard<'a> {
    ledger: &'a ClaimLedger,
    recipient: Address,
    armed: bool,
}

impl<'a> MarkGuard<'a> {
    fn new(ledger: &'a ClaimLedger, recipient: Address) -> Self {
        Self {
            ledger,
            recipient,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for MarkGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.ledger.revert_claim(&self.recipient);
            debug!("Reverted claim mark for {}", hex_prefix(self.recipient.as_bytes()));
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl std::fmt::Debug for Distributor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Distributor")
            .field("registry", &self.registry)
            .field("claimed", &self.ledger.claimed_count())
            .field("events", &self.events.len())
            .finish()
    }
}

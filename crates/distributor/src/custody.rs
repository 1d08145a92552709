//! External asset store interface and an in-memory implementation.
//!
//! A `TokenLedger` handle is bound to one asset and one custody account:
//! `transfer` always moves value *out of* that custody account. The
//! distributor never debits anything else.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use merkledrop_core::{hex_prefix, Address, Amount};
use parking_lot::Mutex;
use tracing::debug;

use crate::TransferError;

/// Fungible asset store the distributor disburses from.
///
/// Implementations own their balance consistency: concurrent `transfer`
/// calls must never overdraw custody.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Address identifying the asset
    fn asset_id(&self) -> Address;

    /// Account whose balance `transfer` debits
    fn custody(&self) -> Address;

    /// Move `amount` from custody to `to`.
    ///
    /// Dropping the returned future before it resolves must leave balances
    /// unchanged; the distributor treats a dropped transfer as not having
    /// happened.
    async fn transfer(&self, to: Address, amount: Amount) -> Result<(), TransferError>;

    async fn balance_of(&self, owner: Address) -> Amount;
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<Address, Amount>,
    /// Recipients whose side refuses incoming transfers
    rejecting: HashSet<Address>,
}

/// Token ledger held entirely in memory.
///
/// Debit and credit happen under a single lock, which serialises every
/// custody movement.
#[derive(Debug)]
pub struct InMemoryTokenLedger {
    asset: Address,
    custody: Address,
    state: Mutex<LedgerState>,
}

impl InMemoryTokenLedger {
    pub fn new(asset: Address, custody: Address) -> Self {
        Self {
            asset,
            custody,
            state: Mutex::new(LedgerState::default()),
        }
    }

    /// Builder-style initial balance.
    pub fn with_balance(self, owner: Address, amount: Amount) -> Self {
        self.state.lock().balances.insert(owner, amount);
        self
    }

    /// Credit `amount` to `owner` out of thin air (funding custody).
    pub fn mint(&self, owner: Address, amount: Amount) -> Result<(), TransferError> {
        let mut state = self.state.lock();
        let balance = state.balances.entry(owner).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| TransferError::Ledger("balance overflow".to_string()))?;
        Ok(())
    }

    /// Make every future transfer to `recipient` fail on the recipient side.
    pub fn reject_transfers_to(&self, recipient: Address) {
        self.state.lock().rejecting.insert(recipient);
    }

    pub fn accept_transfers_to(&self, recipient: &Address) {
        self.state.lock().rejecting.remove(recipient);
    }

    pub fn balance(&self, owner: &Address) -> Amount {
        self.state.lock().balances.get(owner).copied().unwrap_or(0)
    }

    pub fn custody_balance(&self) -> Amount {
        self.balance(&self.custody)
    }

    /// Non-zero balances in ascending owner order.
    pub fn balances(&self) -> Vec<(Address, Amount)> {
        let state = self.state.lock();
        let mut out: Vec<(Address, Amount)> = state
            .balances
            .iter()
            .filter(|(_, amount)| **amount > 0)
            .map(|(owner, amount)| (*owner, *amount))
            .collect();
        out.sort();
        out
    }

    fn apply_transfer(&self, to: Address, amount: Amount) -> Result<(), TransferError> {
        let mut state = self.state.lock();

        if state.rejecting.contains(&to) {
            return Err(TransferError::RecipientRejected(to));
        }

        let available = state.balances.get(&self.custody).copied().unwrap_or(0);
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                available,
                requested: amount,
            });
        }

        if to == self.custody {
            return Ok(());
        }

        let credited = state
            .balances
            .get(&to)
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or_else(|| TransferError::Ledger("balance overflow".to_string()))?;

        state.balances.insert(self.custody, available - amount);
        state.balances.insert(to, credited);
        Ok(())
    }
}

#[async_trait]
impl TokenLedger for InMemoryTokenLedger {
    fn asset_id(&self) -> Address {
        self.asset
    }

    fn custody(&self) -> Address {
        self.custody
    }

    async fn transfer(&self, to: Address, amount: Amount) -> Result<(), TransferError> {
        let result = self.apply_transfer(to, amount);
        debug!(
            "Transfer of {} {} to {}: {:?}",
            amount,
            hex_prefix(self.asset.as_bytes()),
            hex_prefix(to.as_bytes()),
            result,
        );
        result
    }

    async fn balance_of(&self, owner: Address) -> Amount {
        self.balance(&owner)
    }
}

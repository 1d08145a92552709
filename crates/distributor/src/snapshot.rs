//! Persisted distributor state.
//!
//! A snapshot captures a distributor backed by an [`InMemoryTokenLedger`]:
//! configuration, admin, custody balances, claimed recipients and the event
//! history. The CLI loads one, runs a single operation, and saves it back.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use merkledrop_core::{serde_amount, Address, Amount};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::{
    ClaimLedger, Distributor, DistributorConfig, DistributorError, DistributorEvent, EventLog,
    FixedAdmin, InMemoryTokenLedger, Result, TokenLedger,
};

/// One owner's balance of the distributed asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub owner: Address,
    #[serde(with = "serde_amount")]
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributorSnapshot {
    pub config: DistributorConfig,
    pub admin: Address,
    pub asset: Address,
    pub custody: Address,
    pub balances: Vec<BalanceEntry>,
    pub claimed: Vec<Address>,
    pub events: Vec<DistributorEvent>,
}

impl DistributorSnapshot {
    /// Fresh state: nothing claimed, custody funded with `custody_balance`.
    pub fn genesis(
        config: DistributorConfig,
        admin: Address,
        asset: Address,
        custody: Address,
        custody_balance: Amount,
    ) -> Self {
        Self {
            config,
            admin,
            asset,
            custody,
            balances: vec![BalanceEntry {
                owner: custody,
                amount: custody_balance,
            }],
            claimed: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Capture `distributor` and the in-memory ledger it disburses from.
    pub fn capture(distributor: &Distributor, token: &InMemoryTokenLedger) -> Self {
        Self {
            config: *distributor.config(),
            admin: distributor.admin(),
            asset: token.asset_id(),
            custody: token.custody(),
            balances: token
                .balances()
                .into_iter()
                .map(|(owner, amount)| BalanceEntry { owner, amount })
                .collect(),
            claimed: distributor.ledger().claimed(),
            events: distributor.events().events(),
        }
    }

    /// Rebuild the distributor and its token ledger.
    pub fn restore(&self) -> Result<(Distributor, Arc<InMemoryTokenLedger>)> {
        let token = InMemoryTokenLedger::new(self.asset, self.custody);
        for entry in &self.balances {
            token
                .mint(entry.owner, entry.amount)
                .map_err(|e| DistributorError::Snapshot(e.to_string()))?;
        }
        let token = Arc::new(token);

        let distributor = Distributor::with_state(
            self.config,
            token.clone(),
            Arc::new(FixedAdmin(self.admin)),
            ClaimLedger::from_claimed(self.claimed.iter().copied()),
            EventLog::from_events(self.events.clone()),
        );
        Ok((distributor, token))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| DistributorError::Snapshot(format!("read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| DistributorError::Snapshot(format!("parse {}: {}", path.display(), e)))
    }

    /// Write via a temp file in the target directory, then rename over
    /// `path`, so readers see either the old snapshot or the new one.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DistributorError::Snapshot(e.to_string()))?;

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let write = || -> std::io::Result<()> {
            fs::create_dir_all(parent)?;
            let mut temp_file = NamedTempFile::new_in(parent)?;
            temp_file.write_all(json.as_bytes())?;
            temp_file.as_file().sync_all()?;
            temp_file.persist(path).map_err(|e| e.error)?;
            Ok(())
        };
        write().map_err(|e| DistributorError::Snapshot(format!("write {}: {}", path.display(), e)))?;

        debug!("Saved snapshot to {}", path.display());
        Ok(())
    }
}

//! Immutable root and custody handle.

use std::sync::Arc;

use merkledrop_core::{Address, Amount, Digest};
use merkledrop_merkle::{verify, HashAlgorithm};

use crate::{DistributorConfig, TokenLedger};

/// Holds what a distributor is committed to for its whole lifetime.
///
/// There are no setters: the only way to obtain a different root or token
/// is to build a new registry.
pub struct RootRegistry {
    config: DistributorConfig,
    token: Arc<dyn TokenLedger>,
}

impl RootRegistry {
    pub fn new(config: DistributorConfig, token: Arc<dyn TokenLedger>) -> Self {
        Self { config, token }
    }

    pub fn merkle_root(&self) -> &Digest {
        &self.config.merkle_root
    }

    pub fn hash(&self) -> HashAlgorithm {
        self.config.hash
    }

    pub fn config(&self) -> &DistributorConfig {
        &self.config
    }

    pub fn token(&self) -> &Arc<dyn TokenLedger> {
        &self.token
    }

    /// Proof check against the committed root. Pure.
    pub fn verify(&self, recipient: &Address, amount: Amount, proof: &[Digest]) -> bool {
        verify(self.config.hash, recipient, amount, proof, &self.config.merkle_root)
    }
}

impl std::fmt::Debug for RootRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootRegistry")
            .field("config", &self.config)
            .field("asset", &self.token.asset_id())
            .field("custody", &self.token.custody())
            .finish()
    }
}

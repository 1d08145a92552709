//! Hash primitive selection.
//!
//! One algorithm is used for leaves and internal nodes of a tree. The
//! algorithm is part of the distribution's identity: a root built with one
//! never verifies proofs hashed with the other.

use std::fmt;
use std::str::FromStr;

use merkledrop_core::Digest;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sha3::{Digest as _, Keccak256};

/// 32-byte hash used throughout a tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// Keccak-256, the convention of EVM allocation tooling (default)
    #[default]
    Keccak256,
    /// SHA-256
    Sha256,
}

impl HashAlgorithm {
    /// Hash the concatenation of `parts`.
    pub fn hash(&self, parts: &[&[u8]]) -> Digest {
        match self {
            Self::Keccak256 => {
                let mut hasher = Keccak256::new();
                for part in parts {
                    hasher.update(part);
                }
                hasher.finalize().into()
            }
            Self::Sha256 => {
                let mut hasher = Sha256::new();
                for part in parts {
                    hasher.update(part);
                }
                hasher.finalize().into()
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keccak256 => "keccak256",
            Self::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown hash algorithm: {0} (expected keccak256 or sha256)")]
pub struct ParseHashAlgorithmError(String);

impl FromStr for HashAlgorithm {
    type Err = ParseHashAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keccak256" | "keccak" => Ok(Self::Keccak256),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            other => Err(ParseHashAlgorithmError(other.to_string())),
        }
    }
}

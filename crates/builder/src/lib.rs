//! merkledrop Builder
//!
//! Off-line construction of a distribution: reads an allocation list, sorts
//! it by recipient for a deterministic root, builds the Merkle tree and
//! emits the root together with a proof for every recipient.
//!
//! The output file is what recipients (or a front-end acting for them) use
//! to find their proof, and what the distributor is configured from.

mod allocation;
mod distribution;

pub use allocation::{load_allocations, parse_allocations_csv, Allocation};
pub use distribution::{ClaimEntry, Distribution};

use merkledrop_core::Address;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuilderError {
    #[error("Allocation list is empty")]
    Empty,

    #[error("Duplicate recipient: {0}")]
    DuplicateRecipient(Address),

    #[error("Zero address at entry {0}")]
    ZeroAddress(usize),

    #[error("Zero amount for {0}")]
    ZeroAmount(Address),

    #[error("Total allocation overflows")]
    TotalOverflow,

    #[error("Invalid entry at line {line}: {reason}")]
    InvalidEntry { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BuilderError>;

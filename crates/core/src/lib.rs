//! merkledrop core types
//!
//! Identities, digests and amounts shared by the verifier, the distributor
//! and the off-line builder, plus the hex codecs used on every external
//! surface (JSON files, CLI arguments, log lines).

mod codec;
mod types;

pub use codec::{hex_prefix, parse_amount, parse_digest, serde_amount, serde_digest, serde_digests};
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Zero address not allowed")]
    ZeroAddress,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

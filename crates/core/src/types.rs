use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::decode_fixed;
use crate::CoreError;

/// 32-byte digest (leaf, tree node or committed root)
pub type Digest = [u8; 32];

/// Token amount. Encoded into leaves as a 256-bit big-endian word.
pub type Amount = u128;

/// Width of the amount field inside a leaf preimage
pub const AMOUNT_WORD_BYTES: usize = 32;

/// Width of an address inside a leaf preimage
pub const ADDRESS_BYTES: usize = 20;

/// 20-byte account identity.
///
/// Recipients, the admin, the custody account and asset contracts all use
/// this type. Displayed and serialized as `0x`-prefixed lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; ADDRESS_BYTES]);

impl Address {
    pub const ZERO: Address = Address([0u8; ADDRESS_BYTES]);

    pub const fn new(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }

    /// Deterministic address with every byte set to `byte` (tests, fixtures)
    pub const fn repeat_byte(byte: u8) -> Self {
        Self([byte; ADDRESS_BYTES])
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_BYTES] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_BYTES]
    }

    /// Parse a hex address, rejecting the zero address.
    pub fn parse_nonzero(s: &str) -> crate::Result<Self> {
        let address: Address = s.parse()?;
        if address.is_zero() {
            return Err(CoreError::ZeroAddress);
        }
        Ok(address)
    }
}

impl From<[u8; ADDRESS_BYTES]> for Address {
    fn from(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<ADDRESS_BYTES>(s).map(Address)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Encode an amount as the 32-byte big-endian word used in leaf preimages.
pub fn amount_word(amount: Amount) -> [u8; AMOUNT_WORD_BYTES] {
    let mut word = [0u8; AMOUNT_WORD_BYTES];
    word[AMOUNT_WORD_BYTES - 16..].copy_from_slice(&amount.to_be_bytes());
    word
}

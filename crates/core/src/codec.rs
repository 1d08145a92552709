//! Hex and decimal codecs for external representations.

use crate::{Amount, CoreError, Digest};

/// Decode a `0x`-optional hex string into exactly `N` bytes.
pub(crate) fn decode_fixed<const N: usize>(s: &str) -> crate::Result<[u8; N]> {
    let trimmed = s.trim();
    let cleaned = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if cleaned.len() != N * 2 {
        return Err(CoreError::InvalidLength {
            expected: N,
            actual: cleaned.len() / 2,
        });
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(cleaned, &mut out).map_err(|e| CoreError::InvalidHex(e.to_string()))?;
    Ok(out)
}

/// Parse a 32-byte digest from hex (with or without `0x`).
pub fn parse_digest(s: &str) -> crate::Result<Digest> {
    decode_fixed::<32>(s)
}

/// Parse a decimal amount.
pub fn parse_amount(s: &str) -> crate::Result<Amount> {
    s.trim()
        .parse::<Amount>()
        .map_err(|e| CoreError::InvalidAmount(format!("{s:?}: {e}")))
}

/// Short hex prefix of an identity for log lines.
pub fn hex_prefix(bytes: &[u8]) -> String {
    hex::encode(&bytes[..bytes.len().min(6)])
}

/// `#[serde(with = "serde_digest")]` for `Digest` fields as `0x` hex.
pub mod serde_digest {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::Digest;

    pub fn serialize<S: Serializer>(digest: &Digest, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(digest)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Digest, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_digest(&s).map_err(serde::de::Error::custom)
    }
}

/// `#[serde(with = "serde_digests")]` for proof paths.
pub mod serde_digests {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::Digest;

    pub fn serialize<S: Serializer>(digests: &[Digest], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(digests.len()))?;
        for digest in digests {
            seq.serialize_element(&format!("0x{}", hex::encode(digest)))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Digest>, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|s| super::parse_digest(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

/// `#[serde(with = "serde_amount")]`: amounts are written as decimal strings
/// (they routinely exceed the 53-bit range of JSON tooling) and accepted as
/// either strings or integers. Integers above `u64::MAX` reach the
/// deserializer as floats and are rejected; such amounts must be strings.
pub mod serde_amount {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    use crate::Amount;

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(amount)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }

    struct AmountVisitor;

    impl<'de> Visitor<'de> for AmountVisitor {
        type Value = Amount;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative integer or decimal string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
            Ok(v as Amount)
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
            Amount::try_from(v).map_err(|_| E::custom(format!("negative amount: {v}")))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
            Err(E::custom(format!(
                "amount {v} is not an exact integer; write amounts above {} as decimal strings",
                u64::MAX
            )))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
            super::parse_amount(v).map_err(E::custom)
        }
    }
}

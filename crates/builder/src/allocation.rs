//! Allocation list input.
//!
//! Two formats are accepted:
//! - JSON: `[{"address": "0x..", "amount": "100"}, ...]`
//! - CSV: one `address,amount` per line; blank lines, `#` comments and an
//!   optional `address,amount` header on the first non-comment line are
//!   skipped.

use std::fs;
use std::path::Path;

use merkledrop_core::{parse_amount, serde_amount, Address, Amount};
use serde::{Deserialize, Serialize};

use crate::{BuilderError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub address: Address,
    #[serde(with = "serde_amount")]
    pub amount: Amount,
}

impl Allocation {
    pub fn new(address: Address, amount: Amount) -> Self {
        Self { address, amount }
    }
}

/// Load allocations from `path`, choosing the format by extension
/// (`.json` → JSON, anything else → CSV).
pub fn load_allocations(path: &Path) -> Result<Vec<Allocation>> {
    let content = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        Ok(serde_json::from_str(&content)?)
    } else {
        parse_allocations_csv(&content)
    }
}

pub fn parse_allocations_csv(content: &str) -> Result<Vec<Allocation>> {
    let mut allocations = Vec::new();
    let mut seen_content = false;

    for (line_num, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let first = !seen_content;
        seen_content = true;
        if first && is_header(trimmed) {
            continue;
        }

        let invalid = |reason: String| BuilderError::InvalidEntry {
            line: line_num + 1,
            reason,
        };

        let (address, amount) = trimmed
            .split_once(',')
            .ok_or_else(|| invalid(format!("expected 'address,amount', got '{}'", trimmed)))?;
        let address: Address = address.trim().parse().map_err(|e| invalid(format!("{}", e)))?;
        let amount = parse_amount(amount).map_err(|e| invalid(format!("{}", e)))?;

        allocations.push(Allocation::new(address, amount));
    }

    Ok(allocations)
}

fn is_header(line: &str) -> bool {
    match line.split_once(',') {
        Some((address, amount)) => {
            address.trim().eq_ignore_ascii_case("address") && amount.trim().eq_ignore_ascii_case("amount")
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn addr_hex(byte: u8) -> String {
        Address::repeat_byte(byte).to_string()
    }

    #[test]
    fn test_parse_csv() {
        let csv = format!(
            "address,amount\n{},100\n\n# comment\n{}, 200 \n",
            addr_hex(1),
            addr_hex(2)
        );
        let allocations = parse_allocations_csv(&csv).unwrap();
        assert_eq!(
            allocations,
            vec![
                Allocation::new(Address::repeat_byte(1), 100),
                Allocation::new(Address::repeat_byte(2), 200),
            ]
        );
    }

    #[test]
    fn test_header_after_comments() {
        let csv = format!("# airdrop round 1\n\nAddress, Amount\n{},5\n", addr_hex(4));
        let allocations = parse_allocations_csv(&csv).unwrap();
        assert_eq!(allocations, vec![Allocation::new(Address::repeat_byte(4), 5)]);
    }

    #[test]
    fn test_header_only_first() {
        let csv = format!("{},5\naddress,amount\n", addr_hex(4));
        assert!(matches!(
            parse_allocations_csv(&csv),
            Err(BuilderError::InvalidEntry { line: 2, .. })
        ));
    }

    #[test]
    fn test_parse_csv_reports_line() {
        let csv = format!("{},100\nnot-a-line\n", addr_hex(1));
        match parse_allocations_csv(&csv) {
            Err(BuilderError::InvalidEntry { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected InvalidEntry, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_csv_bad_amount() {
        let csv = format!("{},-5\n", addr_hex(1));
        assert!(matches!(
            parse_allocations_csv(&csv),
            Err(BuilderError::InvalidEntry { line: 1, .. })
        ));
    }

    #[test]
    fn test_load_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("allocations.json");
        let mut file = fs::File::create(&path).unwrap();
        write!(
            file,
            r#"[{{"address": "{}", "amount": "100"}}, {{"address": "{}", "amount": 200}}]"#,
            addr_hex(1),
            addr_hex(2)
        )
        .unwrap();

        let allocations = load_allocations(&path).unwrap();
        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations[1].amount, 200);
    }

    #[test]
    fn test_load_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("allocations.csv");
        fs::write(&path, format!("{},7\n", addr_hex(3))).unwrap();

        let allocations = load_allocations(&path).unwrap();
        assert_eq!(allocations, vec![Allocation::new(Address::repeat_byte(3), 7)]);
    }
}

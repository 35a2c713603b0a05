//! Destination wallet address list
//!
//! Loaded once from a CSV file, one address per row (first column).
//! Indexing is 1-based everywhere: wallet 1 is the first row.

use std::path::Path;

use crate::error::{Error, Result};

/// Ordered, immutable list of destination addresses
#[derive(Debug, Clone)]
pub struct WalletAddressList {
    addresses: Vec<String>,
}

impl WalletAddressList {
    /// Load addresses from a CSV file.
    ///
    /// Takes the first comma-separated field of each non-empty row. A
    /// leading `address` header row is skipped if present.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::WalletList(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let list = Self::parse(&content)?;
        if list.is_empty() {
            return Err(Error::WalletList(format!(
                "{} contains no addresses",
                path.display()
            )));
        }
        Ok(list)
    }

    fn parse(content: &str) -> Result<Self> {
        let mut addresses = Vec::new();
        for (i, line) in content.lines().enumerate() {
            let field = line.split(',').next().unwrap_or("").trim();
            if field.is_empty() {
                continue;
            }
            if i == 0 && field.eq_ignore_ascii_case("address") {
                continue;
            }
            addresses.push(field.to_string());
        }
        Ok(Self { addresses })
    }

    pub fn from_addresses(addresses: Vec<String>) -> Self {
        Self { addresses }
    }

    /// Address at a 1-based index
    pub fn get(&self, index: usize) -> Option<&str> {
        if index == 0 {
            return None;
        }
        self.addresses.get(index - 1).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

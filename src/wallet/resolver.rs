//! Wallet index specification and resolution
//!
//! Config names destinations by 1-based index into the wallet list, either
//! as a single index or an inclusive range like `"4-6"`. Resolution expands
//! specs in their configured order; indexes outside the list are recorded
//! as skipped, never an error - one bad index must not sink the batch.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::error::{Error, Result};

use super::list::WalletAddressList;

/// A single 1-based wallet index or an inclusive range
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSpec {
    Single(usize),
    Range(usize, usize),
}

impl IndexSpec {
    fn validate(self) -> Result<Self> {
        match self {
            IndexSpec::Single(0) => Err(Error::Config("wallet index 0 is invalid (1-based)".into())),
            IndexSpec::Range(a, b) if a == 0 => Err(Error::Config(format!(
                "wallet range {}-{} is invalid (1-based)",
                a, b
            ))),
            IndexSpec::Range(a, b) if a > b => Err(Error::Config(format!(
                "wallet range {}-{} is reversed",
                a, b
            ))),
            spec => Ok(spec),
        }
    }
}

impl FromStr for IndexSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some((a, b)) = s.split_once('-') {
            let start = a.trim().parse::<usize>().map_err(|_| {
                Error::Config(format!("Invalid wallet range start in {:?}", s))
            })?;
            let end = b.trim().parse::<usize>().map_err(|_| {
                Error::Config(format!("Invalid wallet range end in {:?}", s))
            })?;
            IndexSpec::Range(start, end).validate()
        } else {
            let index = s
                .parse::<usize>()
                .map_err(|_| Error::Config(format!("Invalid wallet index {:?}", s)))?;
            IndexSpec::Single(index).validate()
        }
    }
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexSpec::Single(i) => write!(f, "{}", i),
            IndexSpec::Range(a, b) => write!(f, "{}-{}", a, b),
        }
    }
}

// Config files write specs as either bare integers or "a-b" strings
impl<'de> Deserialize<'de> for IndexSpec {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u64),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(i) => IndexSpec::Single(i as usize)
                .validate()
                .map_err(de::Error::custom),
            Raw::Str(s) => s.parse().map_err(de::Error::custom),
        }
    }
}

/// Outcome of resolving specs against an address list
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Destination addresses paired with their 1-based index, in spec order
    pub addresses: Vec<(usize, String)>,
    /// Indexes that fell outside the address list
    pub skipped: Vec<usize>,
}

/// Expand specs into concrete addresses.
///
/// Spec order is preserved, ranges expand ascending in place. Deterministic:
/// same specs and list always produce the same sequence.
pub fn resolve(specs: &[IndexSpec], list: &WalletAddressList) -> Resolution {
    let mut addresses = Vec::new();
    let mut skipped = Vec::new();

    let mut push = |index: usize| match list.get(index) {
        Some(addr) => addresses.push((index, addr.to_string())),
        None => skipped.push(index),
    };

    for spec in specs {
        match spec {
            IndexSpec::Single(i) => push(*i),
            IndexSpec::Range(a, b) => {
                for i in *a..=*b {
                    push(i);
                }
            }
        }
    }

    Resolution { addresses, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn six_wallets() -> WalletAddressList {
        WalletAddressList::from_addresses(
            (1..=6).map(|i| format!("0xwallet{}", i)).collect(),
        )
    }

    fn specs(raw: &[&str]) -> Vec<IndexSpec> {
        raw.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn test_singles_and_ranges_in_spec_order() {
        let resolution = resolve(&specs(&["2", "4-6", "1"]), &six_wallets());
        let indexes: Vec<usize> = resolution.addresses.iter().map(|(i, _)| *i).collect();
        assert_eq!(indexes, vec![2, 4, 5, 6, 1]);
        assert_eq!(resolution.addresses[0].1, "0xwallet2");
        assert!(resolution.skipped.is_empty());
    }

    #[test]
    fn test_out_of_range_skipped_without_disturbing_rest() {
        let resolution = resolve(&specs(&["2", "7", "1"]), &six_wallets());
        let indexes: Vec<usize> = resolution.addresses.iter().map(|(i, _)| *i).collect();
        assert_eq!(indexes, vec![2, 1]);
        assert_eq!(resolution.skipped, vec![7]);
    }

    #[test]
    fn test_range_partially_out_of_bounds() {
        let resolution = resolve(&specs(&["5-8"]), &six_wallets());
        let indexes: Vec<usize> = resolution.addresses.iter().map(|(i, _)| *i).collect();
        assert_eq!(indexes, vec![5, 6]);
        assert_eq!(resolution.skipped, vec![7, 8]);
    }

    #[test]
    fn test_resolution_is_reproducible() {
        let s = specs(&["3-4", "1"]);
        let list = six_wallets();
        assert_eq!(resolve(&s, &list), resolve(&s, &list));
    }

    #[test]
    fn test_parse_accepts_int_and_string_forms() {
        let json = r#"[2, "4-6", "1"]"#;
        let parsed: Vec<IndexSpec> = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed,
            vec![
                IndexSpec::Single(2),
                IndexSpec::Range(4, 6),
                IndexSpec::Single(1)
            ]
        );
    }

    #[test]
    fn test_parse_rejects_bad_specs() {
        assert!("x".parse::<IndexSpec>().is_err());
        assert!("0".parse::<IndexSpec>().is_err());
        assert!("6-4".parse::<IndexSpec>().is_err());
        assert!("0-3".parse::<IndexSpec>().is_err());
        assert!(serde_json::from_str::<Vec<IndexSpec>>(r#"[0]"#).is_err());
    }
}

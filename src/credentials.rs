//! Exchange API credentials
//!
//! Loaded once from a JSON file at startup, immutable for process lifetime.
//! Never written back, never logged, never echoed in error messages.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// API credentials for the exchange account
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub api_key: String,
    pub secret_key: String,
    pub passphrase: String,
    pub withdrawal_password: String,
}

impl Credentials {
    /// Load credentials from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Credentials(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let credentials: Credentials = serde_json::from_str(&content).map_err(|e| {
            Error::Credentials(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        credentials.validate()?;
        Ok(credentials)
    }

    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("api_key", &self.api_key),
            ("secret_key", &self.secret_key),
            ("passphrase", &self.passphrase),
            ("withdrawal_password", &self.withdrawal_password),
        ] {
            if value.is_empty() {
                return Err(Error::Credentials(format!("{} must not be empty", field)));
            }
        }
        Ok(())
    }
}

// Redact all fields - credentials must never reach logs or error output
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"***")
            .field("secret_key", &"***")
            .field("passphrase", &"***")
            .field("withdrawal_password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_json() -> &'static str {
        r#"{
            "api_key": "key-1",
            "secret_key": "sec-1",
            "passphrase": "phrase-1",
            "withdrawal_password": "pw-1"
        }"#
    }

    #[test]
    fn test_load_valid_credentials() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(valid_json().as_bytes()).unwrap();
        let creds = Credentials::load(file.path()).unwrap();
        assert_eq!(creds.api_key, "key-1");
    }

    #[test]
    fn test_empty_field_rejected() {
        let json = r#"{
            "api_key": "",
            "secret_key": "sec-1",
            "passphrase": "phrase-1",
            "withdrawal_password": "pw-1"
        }"#;
        let creds: Credentials = serde_json::from_str(json).unwrap();
        assert!(creds.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_startup_error() {
        let err = Credentials::load("/nonexistent/keys.json").unwrap_err();
        assert!(err.is_startup_error());
    }

    #[test]
    fn test_debug_redacts_all_fields() {
        let creds: Credentials = serde_json::from_str(valid_json()).unwrap();
        let dbg = format!("{:?}", creds);
        assert!(!dbg.contains("key-1"));
        assert!(!dbg.contains("sec-1"));
        assert!(!dbg.contains("phrase-1"));
        assert!(!dbg.contains("pw-1"));
    }
}

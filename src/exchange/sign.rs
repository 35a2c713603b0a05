//! Request signing for the exchange API
//!
//! Every authenticated call carries a base64 HMAC-SHA256 signature over
//! `timestamp + method + request_path + body`. The timestamp must be
//! generated fresh for every signed call - the exchange rejects reuse.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Secret key material, in the form the exchange account was provisioned with.
///
/// Some accounts hold the raw secret string, others hold base64-encoded key
/// material that must be decoded before keying the MAC. The caller declares
/// which form it has.
#[derive(Clone)]
pub enum SecretKey {
    Raw(String),
    Base64(String),
}

impl SecretKey {
    fn key_bytes(&self) -> Result<Vec<u8>> {
        match self {
            SecretKey::Raw(s) => Ok(s.as_bytes().to_vec()),
            SecretKey::Base64(s) => BASE64
                .decode(s.as_bytes())
                .map_err(|e| Error::Credentials(format!("Secret key is not valid base64: {}", e))),
        }
    }
}

// Never expose key material through Debug
impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretKey::Raw(_) => f.write_str("SecretKey::Raw(***)"),
            SecretKey::Base64(_) => f.write_str("SecretKey::Base64(***)"),
        }
    }
}

/// Current UTC time in millisecond ISO-8601 form with a trailing `Z`,
/// e.g. `2024-05-01T12:34:56.789Z`.
pub fn timestamp_now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Compute the request signature.
///
/// `request_path` must include the query string if any, and `body` must be
/// the exact transmitted bytes (empty string for bodyless requests).
/// Deterministic: identical inputs always produce identical output.
pub fn sign(
    timestamp: &str,
    method: &str,
    request_path: &str,
    body: &str,
    secret: &SecretKey,
) -> Result<String> {
    let key = secret.key_bytes()?;
    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|e| Error::Credentials(format!("Invalid HMAC key: {}", e)))?;
    mac.update(timestamp.as_bytes());
    mac.update(method.as_bytes());
    mac.update(request_path.as_bytes());
    mac.update(body.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_deterministic() {
        let secret = SecretKey::Raw("test-secret".into());
        let a = sign(
            "2024-05-01T12:00:00.000Z",
            "GET",
            "/api/v5/account/balance",
            "",
            &secret,
        )
        .unwrap();
        let b = sign(
            "2024-05-01T12:00:00.000Z",
            "GET",
            "/api/v5/account/balance",
            "",
            &secret,
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_signature_changes_with_any_input() {
        let secret = SecretKey::Raw("test-secret".into());
        let base = sign("t", "GET", "/p", "", &secret).unwrap();
        assert_ne!(base, sign("t2", "GET", "/p", "", &secret).unwrap());
        assert_ne!(base, sign("t", "POST", "/p", "", &secret).unwrap());
        assert_ne!(base, sign("t", "GET", "/q", "", &secret).unwrap());
        assert_ne!(base, sign("t", "GET", "/p", "{}", &secret).unwrap());
    }

    #[test]
    fn test_known_vector_raw_key() {
        // HMAC-SHA256("secret", "2024-05-01T12:00:00.000ZGET/api/v5/account/balance")
        let secret = SecretKey::Raw("secret".into());
        let sig = sign(
            "2024-05-01T12:00:00.000Z",
            "GET",
            "/api/v5/account/balance",
            "",
            &secret,
        )
        .unwrap();
        assert_eq!(sig, "54vgVN9O5h/giGlt42piM/tmTv4/DGUFVw+AoZ1fos8=");
    }

    #[test]
    fn test_base64_key_decoded_before_use() {
        // "c2VjcmV0" is base64 for "secret" - must match the raw form
        let raw = SecretKey::Raw("secret".into());
        let b64 = SecretKey::Base64("c2VjcmV0".into());
        let sig_raw = sign("t", "GET", "/p", "", &raw).unwrap();
        let sig_b64 = sign("t", "GET", "/p", "", &b64).unwrap();
        assert_eq!(sig_raw, sig_b64);

        // A different raw string that is itself valid base64 input text
        // must disagree once declared as base64 key material
        let as_raw = SecretKey::Raw("c2VjcmV0".into());
        assert_ne!(sig_b64, sign("t", "GET", "/p", "", &as_raw).unwrap());
    }

    #[test]
    fn test_invalid_base64_key_rejected() {
        let secret = SecretKey::Base64("not base64!!!".into());
        assert!(sign("t", "GET", "/p", "", &secret).is_err());
    }

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp_now();
        assert!(ts.ends_with('Z'));
        // 2024-05-01T12:34:56.789Z
        assert_eq!(ts.len(), 24);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "T");
        assert_eq!(&ts[19..20], ".");
    }

    #[test]
    fn test_secret_key_debug_redacts() {
        let dbg = format!("{:?}", SecretKey::Raw("super-secret".into()));
        assert!(!dbg.contains("super-secret"));
    }
}

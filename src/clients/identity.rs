//! Identity-provider webhook signature verification (Svix signing scheme).
//!
//! The signed content is `"{id}.{timestamp}.{body}"`, signed with HMAC-SHA256
//! using the base64 key that follows the `whsec_` prefix of the secret. The
//! signature header holds space-separated `v1,<base64>` entries.

use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

/// Accepted clock skew between the provider and us.
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid webhook secret")]
    InvalidSecret,
    #[error("invalid timestamp")]
    InvalidTimestamp,
    #[error("timestamp outside tolerance window")]
    TimestampOutOfRange,
    #[error("no matching signature")]
    Mismatch,
}

#[derive(Debug, Clone, Copy)]
pub struct SignedHeaders<'a> {
    pub id: &'a str,
    pub timestamp: &'a str,
    pub signature: &'a str,
}

fn signing_key(secret: &str) -> Result<Vec<u8>, SignatureError> {
    let encoded = secret.strip_prefix("whsec_").unwrap_or(secret);
    STANDARD
        .decode(encoded)
        .map_err(|_| SignatureError::InvalidSecret)
}

fn mac_for(key: &[u8], headers: &SignedHeaders<'_>, body: &[u8]) -> Result<Hmac<Sha256>, SignatureError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).map_err(|_| SignatureError::InvalidSecret)?;
    mac.update(headers.id.as_bytes());
    mac.update(b".");
    mac.update(headers.timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    Ok(mac)
}

/// Verify a webhook delivery. `now` is the current unix time in seconds.
pub fn verify(
    secret: &str,
    headers: &SignedHeaders<'_>,
    body: &[u8],
    now: i64,
) -> Result<(), SignatureError> {
    let timestamp: i64 = headers
        .timestamp
        .trim()
        .parse()
        .map_err(|_| SignatureError::InvalidTimestamp)?;
    if (now - timestamp).abs() > TIMESTAMP_TOLERANCE_SECS {
        return Err(SignatureError::TimestampOutOfRange);
    }

    let key = signing_key(secret)?;
    let mac = mac_for(&key, headers, body)?;

    let matched = headers
        .signature
        .split_whitespace()
        .filter_map(|entry| entry.split_once(','))
        .filter(|(version, _)| *version == "v1")
        .filter_map(|(_, sig)| STANDARD.decode(sig).ok())
        .any(|sig| mac.clone().verify_slice(&sig).is_ok());

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Produce a `v1,<base64>` signature entry.
pub fn sign(secret: &str, headers: &SignedHeaders<'_>, body: &[u8]) -> Result<String, SignatureError> {
    let key = signing_key(secret)?;
    let mac = mac_for(&key, headers, body)?;
    Ok(format!("v1,{}", STANDARD.encode(mac.finalize().into_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";
    const BODY: &[u8] = br#"{"type":"user.created","data":{"id":"user_1"}}"#;

    fn headers<'a>(timestamp: &'a str, signature: &'a str) -> SignedHeaders<'a> {
        SignedHeaders {
            id: "msg_1",
            timestamp,
            signature,
        }
    }

    #[test]
    fn accepts_valid_signature() {
        let sig = sign(SECRET, &headers("1700000000", ""), BODY).unwrap();
        assert_eq!(verify(SECRET, &headers("1700000000", &sig), BODY, 1_700_000_010), Ok(()));
    }

    #[test]
    fn accepts_when_any_entry_matches() {
        let sig = sign(SECRET, &headers("1700000000", ""), BODY).unwrap();
        let header = format!("v1,bm90LWl0 {sig}");
        assert_eq!(verify(SECRET, &headers("1700000000", &header), BODY, 1_700_000_000), Ok(()));
    }

    #[test]
    fn rejects_tampered_body() {
        let sig = sign(SECRET, &headers("1700000000", ""), BODY).unwrap();
        assert_eq!(
            verify(SECRET, &headers("1700000000", &sig), b"{}", 1_700_000_000),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_stale_timestamp() {
        let sig = sign(SECRET, &headers("1700000000", ""), BODY).unwrap();
        assert_eq!(
            verify(SECRET, &headers("1700000000", &sig), BODY, 1_700_000_000 + 301),
            Err(SignatureError::TimestampOutOfRange)
        );
        assert_eq!(
            verify(SECRET, &headers("soon", &sig), BODY, 1_700_000_000),
            Err(SignatureError::InvalidTimestamp)
        );
    }
}

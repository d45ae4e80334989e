//! Paddle webhook signature verification.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "paddle-signature";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("Missing Paddle-Signature header")]
    Missing,
    #[error("Malformed Paddle-Signature header")]
    Malformed,
    #[error("Webhook signature timestamp outside tolerance")]
    Expired,
    #[error("Webhook signature mismatch")]
    Mismatch,
}

/// Verify a Paddle webhook signature.
///
/// Header format: `ts=<unix seconds>;h1=<hex hmac>`. The signed payload is
/// `<ts>:<raw body>`. Several `h1` entries may be present while a secret is
/// being rotated; any match is accepted. A `tolerance_secs` of 0 skips the
/// timestamp check.
pub fn verify_signature(
    payload: &[u8],
    signature_header: Option<&str>,
    secret: &str,
    tolerance_secs: u64,
) -> Result<(), SignatureError> {
    let header = signature_header.ok_or(SignatureError::Missing)?;

    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(';') {
        let mut kv = part.trim().splitn(2, '=');
        match (kv.next(), kv.next()) {
            (Some("ts"), Some(ts)) => timestamp = Some(ts),
            (Some("h1"), Some(sig)) => signatures.push(sig),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if signatures.is_empty() {
        return Err(SignatureError::Malformed);
    }
    let issued_at: i64 = timestamp.parse().map_err(|_| SignatureError::Malformed)?;

    if tolerance_secs > 0 && Utc::now().timestamp().abs_diff(issued_at) > tolerance_secs {
        return Err(SignatureError::Expired);
    }

    let expected = sign(payload, timestamp, secret)?;

    // Constant-time comparison
    let matched = signatures
        .iter()
        .any(|sig| bool::from(subtle::ConstantTimeEq::ct_eq(expected.as_bytes(), sig.as_bytes())));
    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Hex HMAC-SHA256 of `<timestamp>:<payload>`
pub fn sign(payload: &[u8], timestamp: &str, secret: &str) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Malformed)?;
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Build a header value the way Paddle sends it
pub fn signature_header(payload: &[u8], timestamp: i64, secret: &str) -> Result<String, SignatureError> {
    let ts = timestamp.to_string();
    Ok(format!("ts={};h1={}", ts, sign(payload, &ts, secret)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "pdl_ntfset_test_secret";
    const BODY: &[u8] = br#"{"event_type":"subscription.updated"}"#;

    #[test]
    fn accepts_valid_signature() {
        let header = signature_header(BODY, Utc::now().timestamp(), SECRET).unwrap();
        assert_eq!(verify_signature(BODY, Some(&header), SECRET, 300), Ok(()));
    }

    #[test]
    fn rejects_tampered_body_and_wrong_secret() {
        let header = signature_header(BODY, Utc::now().timestamp(), SECRET).unwrap();
        let tampered = br#"{"event_type":"subscription.canceled"}"#;
        assert_eq!(verify_signature(tampered, Some(&header), SECRET, 300), Err(SignatureError::Mismatch));
        assert_eq!(verify_signature(BODY, Some(&header), "other", 300), Err(SignatureError::Mismatch));
    }

    #[test]
    fn enforces_tolerance_only_when_configured() {
        let stale = signature_header(BODY, Utc::now().timestamp() - 3600, SECRET).unwrap();
        assert_eq!(verify_signature(BODY, Some(&stale), SECRET, 300), Err(SignatureError::Expired));
        assert_eq!(verify_signature(BODY, Some(&stale), SECRET, 0), Ok(()));
    }

    #[test]
    fn accepts_any_rotated_signature() {
        let ts = Utc::now().timestamp().to_string();
        let good = sign(BODY, &ts, SECRET).unwrap();
        let header = format!("ts={};h1={};h1={}", ts, "00".repeat(32), good);
        assert_eq!(verify_signature(BODY, Some(&header), SECRET, 300), Ok(()));
    }

    #[test]
    fn rejects_missing_and_malformed_headers() {
        assert_eq!(verify_signature(BODY, None, SECRET, 0), Err(SignatureError::Missing));
        assert_eq!(verify_signature(BODY, Some("h1=abc"), SECRET, 0), Err(SignatureError::Malformed));
        assert_eq!(verify_signature(BODY, Some("ts=abc;h1=abc"), SECRET, 0), Err(SignatureError::Malformed));
    }

    #[test]
    fn extreme_timestamps_are_expired() {
        let header = "ts=-9223372036854775808;h1=00";
        assert_eq!(verify_signature(b"{}", Some(header), SECRET, 300), Err(SignatureError::Expired));

        let header = format!("ts={};h1=00", i64::MAX);
        assert_eq!(verify_signature(b"{}", Some(&header), SECRET, 300), Err(SignatureError::Expired));
    }
}

//! HMAC-SHA256 webhook signatures.
//!
//! Two header formats are supported:
//! - hex: `hex(HMAC(secret, body))`
//! - timestamped: `t=<unix>,v1=<hex>` where the MAC covers `"{t}.{body}"`
//!
//! Comparison goes through `Mac::verify_slice`, which is constant-time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(secret: &[u8], parts: &[&[u8]]) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    for part in parts {
        mac.update(part);
    }
    Some(mac)
}

/// Hex signature of `body`.
#[must_use]
pub fn sign_hex(secret: &[u8], body: &[u8]) -> String {
    mac_for(secret, &[body])
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default()
}

/// Timestamped signature header for `body` signed at `timestamp`.
#[must_use]
pub fn sign_timestamped(secret: &[u8], timestamp: i64, body: &[u8]) -> String {
    let t = timestamp.to_string();
    let v1 = mac_for(secret, &[t.as_bytes(), b".", body])
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default();
    format!("t={t},v1={v1}")
}

/// Verifies a hex signature.
#[must_use]
pub fn verify_hex(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    mac_for(secret, &[body]).is_some_and(|mac| mac.verify_slice(&expected).is_ok())
}

/// Verifies a timestamped header, rejecting timestamps more than
/// `tolerance_secs` away from `now`.
#[must_use]
pub fn verify_timestamped(
    secret: &[u8],
    body: &[u8],
    header: &str,
    now: i64,
    tolerance_secs: i64,
) -> bool {
    let mut timestamp: Option<&str> = None;
    let mut candidates: Vec<&str> = Vec::new();
    for part in header.split(',') {
        let part = part.trim();
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = Some(t);
        } else if let Some(v1) = part.strip_prefix("v1=") {
            candidates.push(v1);
        }
    }

    let Some(ts_str) = timestamp else {
        return false;
    };
    let Ok(ts) = ts_str.parse::<i64>() else {
        return false;
    };
    if now.abs_diff(ts) > tolerance_secs.unsigned_abs() {
        return false;
    }

    candidates.into_iter().any(|candidate| {
        let Ok(expected) = hex::decode(candidate) else {
            return false;
        };
        mac_for(secret, &[ts_str.as_bytes(), b".", body])
            .is_some_and(|mac| mac.verify_slice(&expected).is_ok())
    })
}

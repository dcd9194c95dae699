use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify a GitHub `X-Hub-Signature-256` header against the raw request body.
///
/// With no secret configured, verification is disabled and every request is
/// accepted; that must be a conscious operational choice, not a production
/// default. Otherwise the header must carry `sha256=<lowercase hex>` of the
/// HMAC-SHA256 digest of the body.
pub fn verify_signature(secret: Option<&str>, body: &[u8], signature_header: &str) -> bool {
    let secret = match secret {
        Some(s) if !s.is_empty() => s,
        _ => return true,
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(body);
    let expected = format!("sha256={}", hex::encode(mac.finalize().into_bytes()));

    constant_time_eq(expected.as_bytes(), signature_header.as_bytes())
}

/// Constant-time comparison: length check, then a full fold over the bytes
/// with no early exit.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

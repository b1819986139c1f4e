//! Webhook payload signature verification.
//!
//! The platform signs every POST body with HMAC-SHA1 keyed by the app secret
//! and sends the digest in the `x-hub-signature` header as `sha1=<hex>`.
//!
//! The digest MUST be computed over the raw body bytes, before any JSON
//! decoding takes place.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use tracing::warn;

type HmacSha1 = Hmac<Sha1>;

/// Header carrying the payload signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature";

/// Length of the `sha1=` prefix stripped before verification.
const SIGNATURE_PREFIX_LEN: usize = 5;

/// Sign a payload with HMAC-SHA1 and return the lowercase hex digest.
///
/// Returns `None` if the key is rejected by the MAC.
pub fn sign_payload(secret: &str, payload: &[u8]) -> Option<String> {
    let mut mac = match HmacSha1::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            warn!("webhook_signature_invalid_key");
            return None;
        }
    };
    mac.update(payload);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a hex-encoded HMAC-SHA1 signature against a payload.
///
/// Returns `false` on any mismatch, including an empty or malformed
/// signature. Never panics.
pub fn verify_signature(secret: &str, payload: &[u8], signature_hex: &str) -> bool {
    let expected = match sign_payload(secret, payload) {
        Some(digest) => digest,
        None => return false,
    };

    // Constant-time comparison to prevent timing attacks
    let valid = constant_time_compare(&expected, signature_hex);

    if !valid {
        warn!(
            expected_length = expected.len(),
            actual_length = signature_hex.len(),
            "webhook_signature_mismatch"
        );
    }

    valid
}

/// Verify the raw `x-hub-signature` header value (`sha1=<hex>`).
///
/// A missing header, or one shorter than six characters, is rejected without
/// computing a digest.
pub fn verify_signature_header(secret: &str, payload: &[u8], header: Option<&str>) -> bool {
    let header = match header {
        Some(h) if h.len() > SIGNATURE_PREFIX_LEN => h,
        other => {
            warn!(
                has_header = other.is_some(),
                header_length = other.map(str::len).unwrap_or(0),
                "webhook_signature_header_invalid"
            );
            return false;
        }
    };

    match header.get(SIGNATURE_PREFIX_LEN..) {
        Some(signature_hex) => verify_signature(secret, payload, signature_hex),
        None => {
            warn!("webhook_signature_header_not_ascii");
            false
        }
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Check if signature verification is enabled.
///
/// Any non-empty secret enables it, whitespace included.
pub fn is_signature_verification_enabled(app_secret: &Option<String>) -> bool {
    app_secret.as_deref().is_some_and(|k| !k.is_empty())
}

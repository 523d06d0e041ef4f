//! HMAC-SHA256 webhook signature verification (§4.15, §6.1).
//!
//! The forge sends `X-Signature-256: sha256=<hex>`. We recompute the
//! HMAC over the raw request body with the configured secret and compare
//! in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Verify a `sha256=<hex>`-prefixed signature header against `body`.
#[must_use]
pub fn verify_signature(body: &[u8], header: &str, secret: &str) -> bool {
    let Some(hex_sig) = header.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(signature_bytes) = hex::decode(hex_sig) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    let computed = mac.finalize().into_bytes();
    computed.as_slice().ct_eq(&signature_bytes).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(body: &[u8], secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn accepts_a_matching_signature() {
        let body = b"{\"action\":\"opened\"}";
        let header = sign(body, "s3cr3t");
        assert!(verify_signature(body, &header, "s3cr3t"));
    }

    #[test]
    fn rejects_a_signature_for_a_different_secret() {
        let body = b"{\"action\":\"opened\"}";
        let header = sign(body, "s3cr3t");
        assert!(!verify_signature(body, &header, "other"));
    }

    #[test]
    fn rejects_a_signature_for_a_tampered_body() {
        let body = b"{\"action\":\"opened\"}";
        let header = sign(body, "s3cr3t");
        assert!(!verify_signature(b"{\"action\":\"closed\"}", &header, "s3cr3t"));
    }

    #[test]
    fn rejects_a_header_missing_the_sha256_prefix() {
        let body = b"payload";
        assert!(!verify_signature(body, "deadbeef", "s3cr3t"));
    }

    #[test]
    fn rejects_non_hex_garbage() {
        assert!(!verify_signature(b"payload", "sha256=not-hex", "s3cr3t"));
    }
}

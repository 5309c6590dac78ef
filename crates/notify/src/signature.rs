//! `x-line-signature` verification.
//!
//! LINE signs every webhook request body with HMAC-SHA256 keyed by the
//! channel secret and sends the base64 digest in the `x-line-signature`
//! header.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the base64 signature of `body`.
pub fn sign(channel_secret: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length, so this cannot fail.
    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Check `signature` (the raw header value) against `body`.
///
/// The comparison is constant-time; a header that is not valid base64 is
/// simply a mismatch.
pub fn verify(channel_secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = STANDARD.decode(signature.trim()) else {
        return false;
    };

    let mut mac = match HmacSha256::new_from_slice(channel_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-channel-secret";
    const BODY: &[u8] = br#"{"destination":"U0","events":[]}"#;

    #[test]
    fn signature_of_body_verifies() {
        let sig = sign(SECRET, BODY);
        assert!(verify(SECRET, BODY, &sig));
    }

    #[test]
    fn tampered_body_is_rejected() {
        let sig = sign(SECRET, BODY);
        assert!(!verify(SECRET, br#"{"destination":"U0","events":[{}]}"#, &sig));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let sig = sign("another-secret", BODY);
        assert!(!verify(SECRET, BODY, &sig));
    }

    #[test]
    fn garbage_header_is_rejected() {
        assert!(!verify(SECRET, BODY, "not base64 !!"));
        assert!(!verify(SECRET, BODY, ""));
    }

    #[test]
    fn known_vector() {
        // RFC 4231 test case 2: key "Jefe", data "what do ya want for nothing?".
        let sig = sign("Jefe", b"what do ya want for nothing?");
        assert_eq!(sig, "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM=");
    }
}

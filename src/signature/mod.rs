//! Tamper-evidence signatures for detail save/delete requests.
//!
//! The signature covers a fixed, explicitly-enumerated attribute subset
//! (module id, grid id, category, storage type, user-specific flag,
//! update-name-only flag) — not the submitted payload. Tampering with any
//! covered attribute invalidates the token; payload contents themselves are
//! outside the signature's scope, which is a documented limitation of the
//! scheme, not an oversight to patch here.
//!
//! Verification fails closed: malformed or missing input produces a typed
//! error with a human-readable reason, never a panic.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Negative verification result. Carries the reason a caller can surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// No signature was submitted with the request.
    Missing,
    /// The submitted signature does not match the request attributes.
    Mismatch,
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureError::Missing => write!(f, "the configuration signature is missing"),
            SignatureError::Mismatch => write!(
                f,
                "the configuration signature does not match the request attributes \
                 (the form data may have been tampered with)"
            ),
        }
    }
}

impl std::error::Error for SignatureError {}

/// Sign the ordered attribute values with the externally supplied salt.
///
/// Returns a hex-encoded HMAC-SHA256 token over the concatenated values.
pub fn sign(values: &[&str], salt: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(salt.as_bytes()).expect("hmac accepts any key length");
    for value in values {
        mac.update(value.as_bytes());
    }
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a submitted signature against the attribute values and salt.
pub fn verify(signature: &str, values: &[&str], salt: &str) -> Result<(), SignatureError> {
    if signature.is_empty() {
        return Err(SignatureError::Missing);
    }
    if sign(values, salt) != signature {
        return Err(SignatureError::Mismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: &str = "test-salt";

    fn attrs() -> Vec<&'static str> {
        vec!["gridprefs", "orders-grid", "filter", "session", "0", "0"]
    }

    #[test]
    fn sign_is_deterministic() {
        assert_eq!(sign(&attrs(), SALT), sign(&attrs(), SALT));
    }

    #[test]
    fn valid_signature_verifies() {
        let signature = sign(&attrs(), SALT);
        assert!(verify(&signature, &attrs(), SALT).is_ok());
    }

    #[test]
    fn empty_signature_fails_closed() {
        assert_eq!(verify("", &attrs(), SALT), Err(SignatureError::Missing));
    }

    #[test]
    fn wrong_salt_fails_closed() {
        let signature = sign(&attrs(), SALT);
        assert_eq!(
            verify(&signature, &attrs(), "other-salt"),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn altered_attribute_fails_closed() {
        let signature = sign(&attrs(), SALT);
        let mut altered = attrs();
        altered[3] = "db";
        assert_eq!(
            verify(&signature, &altered, SALT),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn garbage_signature_is_an_error_not_a_panic() {
        assert_eq!(
            verify("zz-not-hex-\u{fffd}", &attrs(), SALT),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn token_is_hex() {
        let signature = sign(&attrs(), SALT);
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Domain separation prefixes. The PIN hash and the auth token are both
/// SHA-256 digests over salted input; distinct prefixes keep one from ever
/// being a valid value for the other.
const PIN_DOMAIN: &[u8] = b"pin:";
const AUTH_DOMAIN: &[u8] = b"auth:";

pub const SALT_LEN: usize = 16;

/// Derive the stored PIN hash: hex(SHA-256("pin:" || pin || salt)).
/// Deterministic, so `verify_pin` can recompute it.
pub fn derive_pin_hash(pin: &str, salt: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(PIN_DOMAIN);
    hasher.update(pin.as_bytes());
    hasher.update(salt);
    hex::encode(hasher.finalize())
}

/// Recompute and compare in constant time. A stored hash of the wrong
/// length is a mismatch, never a panic.
pub fn verify_pin(pin: &str, salt: &[u8], stored_hash: &str) -> bool {
    let computed = derive_pin_hash(pin, salt);
    ct_str_eq(&computed, stored_hash)
}

/// Derive the auth token: hex(SHA-256("auth:" || syncCode || salt)).
/// Deliberately independent of the PIN — a device that logged in once keeps
/// authenticating without it, while knowing the (public) sync code alone is
/// not enough without the server-side salt.
pub fn derive_auth_token(sync_code: &str, salt: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(AUTH_DOMAIN);
    hasher.update(sync_code.as_bytes());
    hasher.update(salt);
    hex::encode(hasher.finalize())
}

pub fn verify_auth_token(token: &str, sync_code: &str, salt: &[u8]) -> bool {
    let computed = derive_auth_token(sync_code, salt);
    ct_str_eq(&computed, token)
}

/// Auth tokens are hex-encoded SHA-256: exactly 64 hex chars.
pub fn is_valid_auth_token(token: &str) -> bool {
    token.len() == 64 && token.chars().all(|c| c.is_ascii_hexdigit())
}

/// Exactly 4 ASCII digits.
pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == 4 && pin.bytes().all(|b| b.is_ascii_digit())
}

pub fn generate_salt() -> [u8; SALT_LEN] {
    rand::Rng::gen(&mut rand::thread_rng())
}

fn ct_str_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: &[u8] = b"0123456789abcdef";

    #[test]
    fn test_pin_hash_deterministic() {
        assert_eq!(derive_pin_hash("4242", SALT), derive_pin_hash("4242", SALT));
        assert_eq!(derive_pin_hash("4242", SALT).len(), 64);
    }

    #[test]
    fn test_pin_hash_sensitive_to_inputs() {
        let base = derive_pin_hash("4242", SALT);
        assert_ne!(base, derive_pin_hash("4243", SALT));
        assert_ne!(base, derive_pin_hash("4242", b"fedcba9876543210"));
    }

    #[test]
    fn test_verify_pin_roundtrip() {
        let hash = derive_pin_hash("4242", SALT);
        assert!(verify_pin("4242", SALT, &hash));
        assert!(!verify_pin("0000", SALT, &hash));
        assert!(!verify_pin("4242", b"fedcba9876543210", &hash));
    }

    #[test]
    fn test_verify_pin_length_mismatch_is_false() {
        // Truncated or garbage stored hashes must not panic.
        assert!(!verify_pin("4242", SALT, ""));
        assert!(!verify_pin("4242", SALT, "abc"));
    }

    #[test]
    fn test_auth_token_distinct_from_pin_hash() {
        // Same raw material, different domain prefix: never equal.
        let code = "SIGNAL-ABCDEF";
        assert_ne!(derive_auth_token(code, SALT), derive_pin_hash(code, SALT));
    }

    #[test]
    fn test_verify_auth_token_roundtrip() {
        let token = derive_auth_token("SIGNAL-ABCDEF", SALT);
        assert!(is_valid_auth_token(&token));
        assert!(verify_auth_token(&token, "SIGNAL-ABCDEF", SALT));
        assert!(!verify_auth_token(&token, "SIGNAL-FEDCBA", SALT));
        assert!(!verify_auth_token("nonsense", "SIGNAL-ABCDEF", SALT));
    }

    #[test]
    fn test_valid_auth_token_format() {
        assert!(is_valid_auth_token(
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        ));
        assert!(!is_valid_auth_token("tooshort"));
        assert!(!is_valid_auth_token(
            "zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz"
        ));
    }

    #[test]
    fn test_valid_pin_format() {
        assert!(is_valid_pin("0000"));
        assert!(is_valid_pin("4242"));
        assert!(!is_valid_pin("424"));
        assert!(!is_valid_pin("42424"));
        assert!(!is_valid_pin("42a2"));
        assert!(!is_valid_pin(""));
    }
}

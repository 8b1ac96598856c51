//! Password hashing and session tokens
//!
//! Passwords are stored as an iterated salted SHA-256 digest (hex) next to
//! their random salt (hex), matching the `password_hash` / `password_salt`
//! columns of the `users` table.
//!
//! Pure functions only; HTTP concerns live in the web crate.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of SHA-256 rounds applied to `salt || password`
pub const PASSWORD_HASH_ROUNDS: u32 = 20_000;

const SALT_BYTES: usize = 16;
const TOKEN_BYTES: usize = 32;

/// Hash a password with a fresh random salt
///
/// Returns `(hash_hex, salt_hex)`.
pub fn hash_password(password: &str) -> (String, String) {
    let mut salt = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt_hex = to_hex(&salt);
    let hash = hash_with_salt(password, &salt_hex);
    (hash, salt_hex)
}

/// Check a password against a stored hash and salt
///
/// Accounts with an empty stored hash cannot log in.
pub fn verify_password(password: &str, stored_hash: &str, salt: &str) -> bool {
    if stored_hash.is_empty() {
        return false;
    }
    let calculated = hash_with_salt(password, salt);
    constant_time_eq(calculated.as_bytes(), stored_hash.as_bytes())
}

fn hash_with_salt(password: &str, salt_hex: &str) -> String {
    let mut digest = {
        let mut hasher = Sha256::new();
        hasher.update(salt_hex.as_bytes());
        hasher.update(password.as_bytes());
        hasher.finalize()
    };

    for _ in 1..PASSWORD_HASH_ROUNDS {
        let mut hasher = Sha256::new();
        hasher.update(digest);
        hasher.update(salt_hex.as_bytes());
        digest = hasher.finalize();
    }

    format!("{:x}", digest)
}

/// Generate an opaque random session token (64 hex chars)
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    to_hex(&bytes)
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let (hash, salt) = hash_password("correct horse battery");
        assert_eq!(hash.len(), 64);
        assert_eq!(salt.len(), SALT_BYTES * 2);
        assert!(verify_password("correct horse battery", &hash, &salt));
        assert!(!verify_password("wrong horse battery", &hash, &salt));
    }

    #[test]
    fn test_same_password_different_salt() {
        let (hash1, salt1) = hash_password("s3cret-pass");
        let (hash2, salt2) = hash_password("s3cret-pass");
        assert_ne!(salt1, salt2);
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_empty_hash_never_verifies() {
        assert!(!verify_password("", "", ""));
        assert!(!verify_password("anything", "", "abcd"));
    }

    #[test]
    fn test_session_token_shape() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}

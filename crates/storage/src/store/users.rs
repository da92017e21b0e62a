#![forbid(unsafe_code)]

//! Salted password digests for the `User.Password` column.

use sha2::{Digest, Sha256};

const SALT_BYTES: usize = 16;

pub fn hash_password(password: &str) -> String {
    let salt: [u8; SALT_BYTES] = rand::random();
    let salt_hex = hex::encode(salt);
    let digest = digest(&salt_hex, password);
    format!("{salt_hex}${digest}")
}

pub fn verify_password(stored: &str, password: &str) -> bool {
    let Some((salt_hex, expected)) = stored.split_once('$') else {
        return false;
    };
    let actual = digest(salt_hex, password);
    constant_time_eq(actual.as_bytes(), expected.as_bytes())
}

fn digest(salt_hex: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt_hex.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
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
    fn hashes_are_salted_and_verifiable() {
        let first = hash_password("admin");
        let second = hash_password("admin");
        assert_ne!(first, second);
        assert!(verify_password(&first, "admin"));
        assert!(verify_password(&second, "admin"));
        assert!(!verify_password(&first, "Admin"));
        assert!(!verify_password("admin", "admin"));
    }
}

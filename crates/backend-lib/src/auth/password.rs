// ============================
// inventory-backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use crate::config::PasswordRequirements;
use scrypt::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Scrypt,
};
use zeroize::Zeroize;

/// Hash a password using scrypt. A fresh random salt is embedded in the
/// output, so hashing the same password twice yields different strings.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Scrypt
        .hash_password(plain.as_bytes(), &salt)?
        .to_string();
    Ok(hash)
}

/// Verify a password against a hash. Malformed hashes and mismatches both
/// return false; this never errors.
pub fn verify_password(hash: &str, plain: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
}

/// Check if a password meets the complexity requirements
pub fn validate_password_strength(password: &str, requirements: &PasswordRequirements) -> bool {
    if password.len() < requirements.min_length {
        return false;
    }

    if requirements.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
        return false;
    }

    if requirements.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
        return false;
    }

    if requirements.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }

    if requirements.require_special && !password.chars().any(|c| !c.is_alphanumeric()) {
        return false;
    }

    true
}

/// Hash a password and zeroize the plaintext buffer
pub fn hash_password_secure(plain: &mut String) -> anyhow::Result<String> {
    let hash = hash_password(plain)?;
    plain.zeroize();
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password(&hash, "correct horse battery staple"));
        assert!(!verify_password(&hash, "correct horse battery stable"));
    }

    #[test]
    fn same_password_hashes_differently() {
        let first = hash_password("hunter2hunter2").unwrap();
        let second = hash_password("hunter2hunter2").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_hash_verifies_false() {
        assert!(!verify_password("not a phc string", "anything"));
        assert!(!verify_password("", "anything"));
    }

    #[test]
    fn strength_requirements_enforced() {
        let req = PasswordRequirements::default();
        assert!(validate_password_strength("Str0ng&Secure", &req));
        assert!(!validate_password_strength("short", &req));
        assert!(!validate_password_strength("alllowercase1!", &req));
        assert!(!validate_password_strength("NoDigitsHere!", &req));
        assert!(!validate_password_strength("NoSpecials123", &req));
    }

    #[test]
    fn secure_hash_scrubs_plaintext() {
        let mut plain = String::from("Str0ng&Secure");
        let hash = hash_password_secure(&mut plain).unwrap();
        assert!(plain.is_empty());
        assert!(verify_password(&hash, "Str0ng&Secure"));
    }
}

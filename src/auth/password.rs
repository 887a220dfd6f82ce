//! Credential hashing. Every login attempt pays one Argon2 verification,
//! whether or not the email is registered.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::warn;

lazy_static! {
    /// Verified against when the email is unknown so both paths cost the same.
    static ref DECOY_HASH: String = hash_password("reliefhub-decoy-credential").unwrap_or_default();
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| anyhow::anyhow!("argon2 hash failed: {e}"))
}

/// `false` on mismatch and on a stored hash that cannot be parsed.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!(error = %e, "stored password hash is unreadable");
            false
        }
    }
}

/// Check a login attempt. `stored` is `None` when no user has the email;
/// the decoy hash is still verified and the attempt is rejected.
pub fn check_login(plain: &str, stored: Option<&str>) -> bool {
    match stored {
        Some(hash) => verify_password(plain, hash),
        None => {
            let _ = verify_password(plain, &DECOY_HASH);
            false
        }
    }
}

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

fn hash_error(context: &'static str, err: password_hash::Error) -> anyhow::Error {
    error!(error = %err, context, "argon2 failure");
    anyhow::anyhow!("{context}: {err}")
}

/// Salted argon2id PHC string for a profile's stored password.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| hash_error("hash password", e))
}

/// `Ok(false)` on a wrong password; `Err` only when the stored hash is unreadable.
/// Cost parameters are taken from the stored hash, so older hashes keep verifying.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| hash_error("parse stored hash", e))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{Algorithm, Params, Version};

    #[test]
    fn stored_hash_is_argon2id_phc() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2id$v=19$"));
        assert!(!hash.contains("hunter22"));
        assert!(verify_password("hunter22", &hash).unwrap());
        assert!(!verify_password("Hunter22", &hash).unwrap());
    }

    #[test]
    fn each_profile_gets_its_own_salt() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("same", &a).unwrap());
        assert!(verify_password("same", &b).unwrap());
    }

    #[test]
    fn hashes_with_other_cost_parameters_still_verify() {
        let params = Params::new(8 * 1024, 1, 1, None).unwrap();
        let weaker = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);
        let stored = weaker
            .hash_password(b"legacy-pw", &salt)
            .unwrap()
            .to_string();
        assert!(verify_password("legacy-pw", &stored).unwrap());
        assert!(!verify_password("other", &stored).unwrap());
    }

    #[test]
    fn non_argon2_stored_hash_never_verifies() {
        // plaintext column value
        assert!(verify_password("hunter22", "hunter22").is_err());
        // PHC string from another algorithm
        let foreign = "$pbkdf2-sha256$i=1000$c2FsdHNhbHQ$aGFzaGhhc2hoYXNoaGFzaA";
        assert!(!matches!(verify_password("hunter22", foreign), Ok(true)));
    }
}

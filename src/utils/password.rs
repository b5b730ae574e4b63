use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Newtype for plaintext passwords to prevent accidental logging.
#[derive(Debug, Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Newtype for stored password hashes.
#[derive(Debug, Clone)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Fixed, well-formed Argon2id hash. Login verifies against this when no
/// account matches the email and discards the result, so both failure modes
/// pay the same hashing cost and stay indistinguishable by timing.
pub const DECOY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$VE0e3g7DalWHgDwou3nuRA$uC6TER156UQpk0lNQ5+jHM0l5poVjPA1he8TZebqM4A";

/// Hash a password using Argon2id with a per-call random salt. The salt and
/// parameters are embedded in the resulting hash string.
pub fn hash_password(password: &Password) -> Result<PasswordHashString, anyhow::Error> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = argon2
        .hash_password(password.as_str().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(PasswordHashString::new(password_hash))
}

/// Verify a password against a stored hash.
///
/// Returns `false` for a mismatch or a malformed hash; this never surfaces an
/// error to callers, so a corrupt hash behaves like a wrong password.
pub fn verify_password(password: &Password, password_hash: &PasswordHashString) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(password_hash.as_str()) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_str().as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = Password::new("mySecurePassword123".to_string());
        let hash = hash_password(&password).expect("Failed to hash password");

        assert!(!hash.as_str().is_empty());
        assert!(hash.as_str().starts_with("$argon2"));
    }

    #[test]
    fn test_verify_password_correct() {
        let password = Password::new("mySecurePassword123".to_string());
        let hash = hash_password(&password).expect("Failed to hash password");

        assert!(verify_password(&password, &hash));
    }

    #[test]
    fn test_verify_password_incorrect() {
        let password = Password::new("mySecurePassword123".to_string());
        let hash = hash_password(&password).expect("Failed to hash password");

        let wrong_password = Password::new("wrongPassword".to_string());
        assert!(!verify_password(&wrong_password, &hash));
    }

    #[test]
    fn test_verify_password_malformed_hash() {
        let password = Password::new("mySecurePassword123".to_string());
        let garbage = PasswordHashString::new("not-a-phc-string".to_string());

        assert!(!verify_password(&password, &garbage));
    }

    #[test]
    fn test_decoy_hash_is_well_formed() {
        // A malformed decoy would take the cheap early-return path in
        // verify_password and reopen the timing difference it exists to close.
        assert!(PasswordHash::new(DECOY_HASH).is_ok());

        let password = Password::new("mySecurePassword123".to_string());
        assert!(!verify_password(
            &password,
            &PasswordHashString::new(DECOY_HASH.to_string())
        ));
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let password = Password::new("mySecurePassword123".to_string());
        let hash1 = hash_password(&password).expect("Failed to hash password");
        let hash2 = hash_password(&password).expect("Failed to hash password");

        // Random salt: same password, different hashes.
        assert_ne!(hash1.as_str(), hash2.as_str());

        assert!(verify_password(&password, &hash1));
        assert!(verify_password(&password, &hash2));
    }
}

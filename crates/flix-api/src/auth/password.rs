/// Password hashing and verification using Argon2id
///
/// Digests are PHC strings carrying algorithm, parameters and a random
/// 16-byte salt, so no separate salt storage is needed and two hashes of
/// the same password differ.
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use flix_core::AuthConfig;
use thiserror::Error;

/// Password hashing and verification errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

/// Argon2 cost parameters
///
/// Verification reads the parameters back from the digest, so changing
/// these only affects newly hashed passwords.
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// Memory cost in KiB (default: 65536 = 64 MB)
    pub memory_cost: u32,
    /// Time cost (iterations, default: 3)
    pub time_cost: u32,
    /// Parallelism (lanes, default: 4)
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

impl From<&AuthConfig> for PasswordConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            memory_cost: config.hash_memory_kib,
            time_cost: config.hash_iterations,
            parallelism: config.hash_parallelism,
        }
    }
}

impl PasswordConfig {
    /// Lowest-cost parameters, for tests only
    pub fn insecure_fast() -> Self {
        Self {
            memory_cost: 256,
            time_cost: 1,
            parallelism: 1,
        }
    }

    fn to_params(&self) -> Result<Params, PasswordError> {
        Params::new(self.memory_cost, self.time_cost, self.parallelism, Some(32))
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }
}

/// Hash a plaintext password
///
/// # Example
///
/// ```no_run
/// use flix_api::auth::password::{hash_password, PasswordConfig};
///
/// let hash = hash_password("password123", &PasswordConfig::default()).unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str, config: &PasswordConfig) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = config.to_params()?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(password_hash.to_string())
}

/// Verify a plaintext password against a stored digest
///
/// * `Ok(true)` - Password matches
/// * `Ok(false)` - Password does not match
/// * `Err(PasswordError)` - The digest is malformed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fast() -> PasswordConfig {
        PasswordConfig::insecure_fast()
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("password123", &fast()).expect("Failed to hash password");

        assert!(verify_password("password123", &hash).expect("Verification failed"));
        assert!(!verify_password("password124", &hash).expect("Verification failed"));
    }

    #[test]
    fn test_same_password_produces_different_hashes() {
        let hash1 = hash_password("SamePassword123", &fast()).unwrap();
        let hash2 = hash_password("SamePassword123", &fast()).unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_password("SamePassword123", &hash1).unwrap());
        assert!(verify_password("SamePassword123", &hash2).unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        let result = verify_password("password", "invalid-hash-format");
        assert!(matches!(result, Err(PasswordError::InvalidHashFormat)));
    }

    #[test]
    fn test_digest_does_not_contain_plaintext() {
        let hash = hash_password("hunter2hunter2", &fast()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("hunter2hunter2"));
    }

    #[test]
    fn test_custom_config() {
        let config = PasswordConfig {
            memory_cost: 1024,
            time_cost: 2,
            parallelism: 1,
        };

        let hash = hash_password("TestPassword123", &config).unwrap();
        assert!(verify_password("TestPassword123", &hash).unwrap());
        assert!(hash.contains("m=1024"));
        assert!(hash.contains("t=2"));
        assert!(hash.contains("p=1"));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let config = PasswordConfig {
            memory_cost: 1,
            time_cost: 0,
            parallelism: 0,
        };
        assert!(matches!(
            hash_password("password123", &config),
            Err(PasswordError::HashingFailed(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(12))]

        #[test]
        fn prop_verify_accepts_only_original(
            password in "[ -~]{1,32}",
            other in "[ -~]{1,32}",
        ) {
            let hash = hash_password(&password, &fast()).unwrap();
            prop_assert!(verify_password(&password, &hash).unwrap());
            if other != password {
                prop_assert!(!verify_password(&other, &hash).unwrap());
            }
        }
    }
}

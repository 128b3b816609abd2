/// Password hashing and verification using Argon2id
///
/// Every hash carries its own random 16-byte salt and the cost parameters it
/// was produced with (PHC string format), so verification never needs the
/// current configuration. The cost is taken from `AuthConfig`:
/// - Memory: 64 MB (default)
/// - Iterations: 3 (default)
/// - Parallelism: 4 (default)
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use carebook_core::AuthConfig;
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

    #[error("Password worker failed: {0}")]
    WorkerFailed(String),
}

/// Password hashing configuration
///
/// Increasing memory or iterations improves security but slows down hashing.
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// Memory cost in KB
    pub memory_cost: u32,
    /// Time cost (iterations)
    pub time_cost: u32,
    /// Parallelism (lanes)
    pub parallelism: u32,
    /// Output length in bytes
    pub output_len: Option<usize>,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

impl From<&AuthConfig> for PasswordConfig {
    fn from(auth: &AuthConfig) -> Self {
        Self {
            memory_cost: auth.password_memory_cost,
            time_cost: auth.password_time_cost,
            parallelism: auth.password_parallelism,
            output_len: Some(32),
        }
    }
}

impl PasswordConfig {
    /// Create Argon2 parameters from this configuration
    fn to_params(&self) -> Result<Params, PasswordError> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            self.output_len,
        )
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }
}

/// Hash a plaintext password with the given cost
///
/// # Returns
///
/// * `Ok(String)` - PHC string format hash (includes algorithm, parameters, salt, and hash)
/// * `Err(PasswordError)` - If hashing fails
///
/// # Example
///
/// ```no_run
/// use carebook_api::auth::password::{hash_password, PasswordConfig};
///
/// let hash = hash_password("SecureP@ssw0rd!", &PasswordConfig::default())
///     .expect("Failed to hash password");
/// // $argon2id$v=19$m=65536,t=3,p=4$...
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

/// Verify a plaintext password against a stored hash
///
/// # Returns
///
/// * `Ok(true)` - Password matches
/// * `Ok(false)` - Password does not match
/// * `Err(PasswordError)` - If the stored hash is not a valid PHC string
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    // Parameters come from the PHC string
    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
    }
}

/// [`hash_password`] on the blocking thread pool
pub async fn hash_password_blocking(
    password: String,
    config: PasswordConfig,
) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password, &config))
        .await
        .map_err(|e| PasswordError::WorkerFailed(e.to_string()))?
}

/// [`verify_password`] on the blocking thread pool
pub async fn verify_password_blocking(
    password: String,
    hash: String,
) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| PasswordError::WorkerFailed(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light_config() -> PasswordConfig {
        PasswordConfig {
            memory_cost: 8192,
            time_cost: 1,
            parallelism: 1,
            output_len: Some(32),
        }
    }

    #[test]
    fn test_hash_and_verify_password() {
        let password = "SecureP@ssw0rd!";
        let hash = hash_password(password, &light_config()).expect("Failed to hash password");

        assert_ne!(hash, password);
        assert!(verify_password(password, &hash).expect("Verification failed"));
        assert!(!verify_password("WrongPassword", &hash).expect("Verification failed"));
    }

    #[test]
    fn test_same_password_produces_different_hashes() {
        // Random salt per hash
        let password = "1234";

        let hash1 = hash_password(password, &light_config()).unwrap();
        let hash2 = hash_password(password, &light_config()).unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_password(password, &hash1).unwrap());
        assert!(verify_password(password, &hash2).unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        let result = verify_password("password", "invalid-hash-format");
        assert!(matches!(result, Err(PasswordError::InvalidHashFormat)));
    }

    #[test]
    fn test_cost_is_encoded_in_hash() {
        let config = PasswordConfig {
            memory_cost: 16384,
            time_cost: 2,
            parallelism: 2,
            output_len: Some(32),
        };

        let hash = hash_password("TestPassword123!", &config).unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("m=16384"));
        assert!(hash.contains("t=2"));
        assert!(hash.contains("p=2"));
    }

    #[test]
    fn test_default_config_follows_auth_config() {
        let config = PasswordConfig::default();
        assert_eq!(config.memory_cost, 65536);
        assert_eq!(config.time_cost, 3);
        assert_eq!(config.parallelism, 4);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let config = PasswordConfig {
            memory_cost: 1,
            ..light_config()
        };
        assert!(matches!(
            hash_password("secret", &config),
            Err(PasswordError::HashingFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_blocking_wrappers() {
        let hash = hash_password_blocking("1234".to_string(), light_config())
            .await
            .unwrap();

        assert!(verify_password_blocking("1234".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password_blocking("4321".to_string(), hash)
            .await
            .unwrap());
    }
}

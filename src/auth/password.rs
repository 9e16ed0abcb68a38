use crate::types::{AppError, Result};
use crate::utils::toml_config::HashingConfig;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::sync::atomic::{AtomicU64, Ordering};

const DECOY_SECRET: &str = "evently-decoy-credential";

/// Salted, memory-hard password hashing (Argon2id).
///
/// The cost parameters come from configuration. Digests are PHC strings, so
/// each digest carries the parameters it was produced with and remains
/// verifiable after the configured cost changes.
#[derive(Debug)]
pub struct CredentialHasher {
    params: Params,
    /// Digest of a fixed secret under the configured cost, checked against
    /// when a login names an unknown account.
    decoy: String,
    verifications: AtomicU64,
}

impl CredentialHasher {
    /// Creates a hasher from explicit Argon2 cost parameters.
    pub fn new(config: &HashingConfig) -> Result<Self> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| AppError::Hashing(format!("Invalid Argon2 parameters: {}", e)))?;

        let mut hasher = Self {
            params,
            decoy: String::new(),
            verifications: AtomicU64::new(0),
        };
        hasher.decoy = hasher.hash(DECOY_SECRET)?;

        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes a secret with a fresh random salt.
    pub fn hash(&self, secret: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Hashing(format!("Failed to hash password: {}", e)))
    }

    /// Checks a secret against a stored digest.
    ///
    /// A mismatch is `false`, never an error. A digest that cannot be parsed
    /// also yields `false`.
    pub fn verify(&self, secret: &str, digest: &str) -> bool {
        self.verifications.fetch_add(1, Ordering::Relaxed);

        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "stored password digest is not a valid PHC string");
                return false;
            }
        };

        self.argon2()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }

    /// Runs a full verification against the decoy digest and always returns
    /// `false`.
    ///
    /// Used when no account matches, so a failed login costs the same whether
    /// or not the account exists.
    pub fn verify_decoy(&self, secret: &str) -> bool {
        let _ = self.verify(secret, &self.decoy);
        false
    }

    /// Number of digest verifications performed, decoys included.
    pub fn verifications(&self) -> u64 {
        self.verifications.load(Ordering::Relaxed)
    }
}

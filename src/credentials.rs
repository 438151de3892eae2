//! Credential verification for HTTP Basic authentication.
//!
//! The gateway depends only on [`CredentialVerifier`], so a real identity
//! provider can replace [`StaticCredentials`] without touching dispatch.

use crate::error::CredentialError;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand_core::OsRng;
use std::collections::HashMap;

const DECOY_SECRET: &str = "filegate-decoy-secret";

/// Capability to check a username/secret pair.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, secret: &str) -> bool;
}

/// Fixed allow-list of users with exact password match.
///
/// Plaintext passwords are salted and hashed with Argon2id when the store is
/// built, so nothing comparable to the original secret stays in memory.
/// Values that already look like PHC strings (`$argon2...`) are kept as-is.
///
/// Unknown usernames are checked against a decoy hash built with the same
/// parameters, so a miss costs as much as a wrong password.
pub struct StaticCredentials {
    hashes: HashMap<String, String>,
    decoy: String,
    argon2: Argon2<'static>,
}

impl StaticCredentials {
    /// Build a store using the default Argon2id cost parameters.
    pub fn new<I, U, P>(users: I) -> Result<Self, CredentialError>
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: AsRef<str>,
    {
        Self::with_params(users, Params::default())
    }

    /// Build a store with explicit Argon2id cost parameters.
    pub fn with_params<I, U, P>(users: I, params: Params) -> Result<Self, CredentialError>
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: AsRef<str>,
    {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let mut hashes = HashMap::new();

        for (user, password) in users {
            let user = user.into();
            let password = password.as_ref();

            let hash = if is_phc_hash(password) {
                password.to_string()
            } else {
                hash_secret(&argon2, &user, password)?
            };

            hashes.insert(user, hash);
        }

        let decoy = hash_secret(&argon2, "<decoy>", DECOY_SECRET)?;
        Ok(Self {
            hashes,
            decoy,
            argon2,
        })
    }

    /// Cheap parameters for tests and local development.
    pub fn insecure_fast<I, U, P>(users: I) -> Result<Self, CredentialError>
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: AsRef<str>,
    {
        let params =
            Params::new(8, 1, 1, None).map_err(|e| CredentialError::Params(e.to_string()))?;
        Self::with_params(users, params)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, username: &str, secret: &str) -> bool {
        let Some(stored) = self.hashes.get(username) else {
            if let Ok(parsed) = PasswordHash::new(&self.decoy) {
                let _ = self.argon2.verify_password(secret.as_bytes(), &parsed);
            }
            return false;
        };

        match PasswordHash::new(stored) {
            Ok(parsed) => self
                .argon2
                .verify_password(secret.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!(user = %username, error = %e, "Stored credential is not a valid hash");
                false
            }
        }
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("users", &self.hashes.len())
            .finish()
    }
}

fn hash_secret(argon2: &Argon2<'_>, user: &str, secret: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::Hash {
            user: user.to_string(),
            message: e.to_string(),
        })
}

fn is_phc_hash(value: &str) -> bool {
    value.starts_with("$argon2")
}

use crate::application_port::{CredentialVerifier, SignInError};
use crate::domain_model::AccountRecord;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

/// Argon2id verification of PHC-formatted password hashes. Hashing runs on
/// the blocking pool so a burst of sign-ins does not stall the reactor.
#[derive(Debug, Default)]
pub struct Argon2CredentialVerifier;

impl Argon2CredentialVerifier {
    pub fn new() -> Self {
        Self
    }

    pub fn hash_password(password: &str) -> Result<String, SignInError> {
        let salt = argon2::password_hash::SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| SignInError::Upstream(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    fn verify_blocking(password: &str, password_hash: &str) -> Result<bool, SignInError> {
        let parsed = PasswordHash::new(password_hash)
            .map_err(|e| SignInError::Upstream(format!("invalid PHC hash: {}", e)))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(SignInError::Upstream(format!("verify error: {}", e))),
        }
    }
}

#[async_trait::async_trait]
impl CredentialVerifier for Argon2CredentialVerifier {
    async fn verify_password(
        &self,
        account: &AccountRecord,
        password: &str,
    ) -> Result<bool, SignInError> {
        let password = password.to_owned();
        let password_hash = account.password_hash.clone();
        tokio::task::spawn_blocking(move || Self::verify_blocking(&password, &password_hash))
            .await
            .map_err(|e| SignInError::Upstream(e.to_string()))?
    }
}

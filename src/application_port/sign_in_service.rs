use crate::domain_model::*;
use crate::domain_port::StoreError;

/// Sign-in failures. The two credential-class variants are presented to
/// callers as the same "sign-in failed" outcome; only the lockout variant
/// carries extra data.
#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum SignInError {
    #[error("incorrect email or password")]
    InvalidCredentials,
    #[error("account locked for {remaining_seconds} seconds")]
    AccountLocked { remaining_seconds: u64 },
    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl From<StoreError> for SignInError {
    fn from(error: StoreError) -> Self {
        SignInError::Upstream(error.to_string())
    }
}

impl From<TokenError> for SignInError {
    fn from(error: TokenError) -> Self {
        SignInError::Upstream(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct SignInInput {
    pub email: Email,
    pub password: String,
}

#[async_trait::async_trait]
pub trait SignInService: Send + Sync {
    async fn sign_in(&self, request: SignInInput) -> Result<SessionToken, SignInError>;
}

#[async_trait::async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify_password(
        &self,
        account: &AccountRecord,
        password: &str,
    ) -> Result<bool, SignInError>;
}

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum TokenError {
    #[error("token invalid")]
    Invalid,
    #[error("token expired")]
    Expired,
    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Clone)]
pub struct VerifiedAccess {
    pub account_id: AccountId,
    pub email: Email,
    pub roles: Vec<Role>,
}

#[async_trait::async_trait]
pub trait TokenService: Send + Sync {
    async fn mint(&self, account: &AccountRecord, roles: &[Role])
    -> Result<TokenPair, TokenError>;

    async fn verify_access(&self, token: &str) -> Result<VerifiedAccess, TokenError>;

    /// Like `verify_access` but accepts a token past its expiry. Signature,
    /// issuer and audience are still checked.
    async fn decode_expired(&self, token: &str) -> Result<VerifiedAccess, TokenError>;
}

use super::TokenError;
use crate::domain_model::SessionToken;
use crate::domain_port::StoreError;

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum RefreshError {
    #[error("access or refresh token is not valid")]
    InvalidToken,
    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl From<StoreError> for RefreshError {
    fn from(error: StoreError) -> Self {
        RefreshError::Upstream(error.to_string())
    }
}

impl From<TokenError> for RefreshError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Invalid | TokenError::Expired => RefreshError::InvalidToken,
            TokenError::InternalError(_) => RefreshError::Upstream(error.to_string()),
        }
    }
}

/// The pair a client got at sign-in (or its last refresh). The access token
/// may already be expired.
#[derive(Debug, Clone)]
pub struct RefreshInput {
    pub access_token: String,
    pub refresh_token: String,
}

#[async_trait::async_trait]
pub trait SessionRefreshService: Send + Sync {
    /// Trade a still-valid refresh token for a new token pair. The old
    /// refresh token is consumed.
    async fn refresh(&self, request: RefreshInput) -> Result<SessionToken, RefreshError>;
}

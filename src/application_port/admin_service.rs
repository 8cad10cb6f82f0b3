use crate::domain_model::Email;
use crate::domain_port::StoreError;
use serde::Serialize;

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum AdminError {
    #[error("no account for '{0}'")]
    AccountNotFound(String),
    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl From<StoreError> for AdminError {
    fn from(error: StoreError) -> Self {
        AdminError::Upstream(error.to_string())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct LockoutStatus {
    pub locked: bool,
    pub remaining_seconds: u64,
    pub lockout_count: u32,
    pub failed_attempts: u64,
}

#[async_trait::async_trait]
pub trait AdminService: Send + Sync {
    /// End any active lockout now. The lockout count is left as is.
    async fn fast_forward_lockout(&self, email: &Email) -> Result<(), AdminError>;

    async fn reset_lockout_count(&self, email: &Email) -> Result<(), AdminError>;

    async fn lockout_status(&self, email: &Email) -> Result<LockoutStatus, AdminError>;
}

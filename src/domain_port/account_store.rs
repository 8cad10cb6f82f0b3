use super::StoreError;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

/// Durable account records owned by the identity provider. Sign-in only
/// touches the lockout columns and the provider's failed-access count.
#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &Email) -> Result<Option<AccountRecord>, StoreError>;

    async fn roles_of(&self, account_id: AccountId) -> Result<Vec<Role>, StoreError>;

    /// Persist a new lockout episode.
    async fn record_lockout(
        &self,
        account_id: AccountId,
        lockout_end: DateTime<Utc>,
        lockout_count: u32,
    ) -> Result<(), StoreError>;

    async fn reset_lockout_count(&self, account_id: AccountId) -> Result<(), StoreError>;

    async fn set_lockout_end(
        &self,
        account_id: AccountId,
        lockout_end: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;

    async fn reset_access_failed_count(&self, account_id: AccountId) -> Result<(), StoreError>;
}

use super::StoreError;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

#[async_trait::async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn save(&self, record: &RefreshTokenRecord) -> Result<(), StoreError>;

    /// Consume `token` if it was issued to `account_id` and is still unexpired
    /// at `now`. Returns `false` for unknown, expired, foreign or already
    /// redeemed tokens. A token redeems at most once.
    async fn redeem(
        &self,
        token: &str,
        account_id: AccountId,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}

use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// Refresh tokens held in process. Redeemed tokens are dropped, so only
/// never-used tokens accumulate until `purge_expired` runs.
pub struct InMemoryRefreshTokenStore {
    tokens: DashMap<String, RefreshTokenRecord>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRefreshTokenStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        InMemoryRefreshTokenStore {
            tokens: DashMap::new(),
            clock,
        }
    }

    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.tokens.len();
        self.tokens.retain(|_, record| record.expires_at > now);
        before.saturating_sub(self.tokens.len())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn save(&self, record: &RefreshTokenRecord) -> Result<(), StoreError> {
        self.tokens.insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn redeem(
        &self,
        token: &str,
        account_id: AccountId,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        // Another account's token is left in place.
        match self
            .tokens
            .remove_if(token, |_, record| record.account_id == account_id)
        {
            Some((_, record)) => Ok(record.expires_at > now),
            None => Ok(false),
        }
    }
}

use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;

pub struct RealAdminService {
    accounts: Arc<dyn AccountStore>,
    cache: Arc<dyn EphemeralCache>,
    clock: Arc<dyn Clock>,
}

impl RealAdminService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        cache: Arc<dyn EphemeralCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            cache,
            clock,
        }
    }

    async fn account(&self, email: &Email) -> Result<AccountRecord, AdminError> {
        self.accounts
            .find_by_email(email)
            .await?
            .ok_or_else(|| AdminError::AccountNotFound(email.to_string()))
    }
}

#[async_trait::async_trait]
impl AdminService for RealAdminService {
    async fn fast_forward_lockout(&self, email: &Email) -> Result<(), AdminError> {
        let account = self.account(email).await?;
        self.accounts
            .set_lockout_end(account.account_id, Some(self.clock.now()))
            .await?;
        info!(account = %email.fingerprint(), "lockout fast-forwarded");
        Ok(())
    }

    async fn reset_lockout_count(&self, email: &Email) -> Result<(), AdminError> {
        let account = self.account(email).await?;
        self.accounts.reset_lockout_count(account.account_id).await?;
        info!(
            account = %email.fingerprint(),
            previous = account.lockout_count,
            "lockout count reset"
        );
        Ok(())
    }

    async fn lockout_status(&self, email: &Email) -> Result<LockoutStatus, AdminError> {
        let account = self.account(email).await?;
        let remaining = account.lockout_remaining(self.clock.now());
        let key = CacheKey::failed(&account.email);
        let failed_attempts = match self.cache.get(&key).await? {
            Some(raw) => raw.parse::<u64>().map_err(|e| StoreError::Corrupt {
                key,
                reason: e.to_string(),
            })?,
            None => 0,
        };
        Ok(LockoutStatus {
            locked: remaining.is_some(),
            remaining_seconds: remaining.unwrap_or(0),
            lockout_count: account.lockout_count,
            failed_attempts,
        })
    }
}

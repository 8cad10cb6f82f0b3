use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Account store backed by process memory. Updates for unknown ids are
/// no-ops, matching an `UPDATE` that touches zero rows.
#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: DashMap<AccountId, AccountRecord>,
    by_email: DashMap<Email, AccountId>,
    roles: DashMap<AccountId, Vec<Role>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, account: AccountRecord, roles: Vec<Role>) {
        self.by_email
            .insert(account.email.clone(), account.account_id);
        self.roles.insert(account.account_id, roles);
        self.accounts.insert(account.account_id, account);
    }

    pub fn get(&self, account_id: AccountId) -> Option<AccountRecord> {
        self.accounts.get(&account_id).map(|a| a.clone())
    }

    fn update(&self, account_id: AccountId, f: impl FnOnce(&mut AccountRecord)) {
        if let Some(mut account) = self.accounts.get_mut(&account_id) {
            f(&mut account);
        }
    }
}

#[async_trait::async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<AccountRecord>, StoreError> {
        let Some(account_id) = self.by_email.get(email).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.get(account_id))
    }

    async fn roles_of(&self, account_id: AccountId) -> Result<Vec<Role>, StoreError> {
        Ok(self
            .roles
            .get(&account_id)
            .map(|r| r.clone())
            .unwrap_or_default())
    }

    async fn record_lockout(
        &self,
        account_id: AccountId,
        lockout_end: DateTime<Utc>,
        lockout_count: u32,
    ) -> Result<(), StoreError> {
        self.update(account_id, |a| {
            a.lockout_end = Some(lockout_end);
            a.lockout_count = lockout_count;
        });
        Ok(())
    }

    async fn reset_lockout_count(&self, account_id: AccountId) -> Result<(), StoreError> {
        self.update(account_id, |a| a.lockout_count = 0);
        Ok(())
    }

    async fn set_lockout_end(
        &self,
        account_id: AccountId,
        lockout_end: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        self.update(account_id, |a| a.lockout_end = lockout_end);
        Ok(())
    }

    async fn reset_access_failed_count(&self, account_id: AccountId) -> Result<(), StoreError> {
        self.update(account_id, |a| a.access_failed_count = 0);
        Ok(())
    }
}

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use loginguard::application_impl::{LoginThrottle, ThrottleConfig};
use loginguard::application_port::*;
use loginguard::domain_model::*;
use loginguard::domain_port::*;
use loginguard::infra_memory::{InMemoryAccountStore, InMemoryCache, InMemoryRefreshTokenStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const EMAIL: &str = "donor@example.com";
pub const PASSWORD: &str = "Donor#2024";
pub const WRONG: &str = "Donor#2025";

/// Accepts `password` when the stored hash is `plain:<password>`.
#[derive(Default)]
pub struct PlainVerifier {
    pub calls: AtomicUsize,
    pub delay: Option<Duration>,
}

impl PlainVerifier {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CredentialVerifier for PlainVerifier {
    async fn verify_password(
        &self,
        account: &AccountRecord,
        password: &str,
    ) -> Result<bool, SignInError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(account.password_hash == format!("plain:{}", password))
    }
}

/// Mints numbered token pairs and remembers who each access token was for.
pub struct CountingTokens {
    pub mints: AtomicUsize,
    pub expire_minutes: u64,
    issued: Mutex<HashMap<String, VerifiedAccess>>,
}

impl CountingTokens {
    pub fn new(expire_minutes: u64) -> Self {
        CountingTokens {
            mints: AtomicUsize::new(0),
            expire_minutes,
            issued: Mutex::new(HashMap::new()),
        }
    }

    pub fn mints(&self) -> usize {
        self.mints.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TokenService for CountingTokens {
    async fn mint(
        &self,
        account: &AccountRecord,
        roles: &[Role],
    ) -> Result<TokenPair, TokenError> {
        let n = self.mints.fetch_add(1, Ordering::SeqCst) + 1;
        let access_token = format!("access-{}", n);
        self.issued.lock().unwrap().insert(
            access_token.clone(),
            VerifiedAccess {
                account_id: account.account_id,
                email: account.email.clone(),
                roles: roles.to_vec(),
            },
        );
        Ok(TokenPair {
            access_token,
            refresh_token: format!("refresh-{}", n),
            expire_minutes: self.expire_minutes,
        })
    }

    async fn verify_access(&self, token: &str) -> Result<VerifiedAccess, TokenError> {
        self.decode_expired(token).await
    }

    async fn decode_expired(&self, token: &str) -> Result<VerifiedAccess, TokenError> {
        self.issued
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or(TokenError::Invalid)
    }
}

/// In-memory store that counts lockout-count writes and can be told to fail
/// lockout writes.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: InMemoryAccountStore,
    pub lockout_count_resets: AtomicUsize,
    pub fail_lockout_writes: AtomicBool,
}

impl RecordingStore {
    pub fn resets(&self) -> usize {
        self.lockout_count_resets.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AccountStore for RecordingStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<AccountRecord>, StoreError> {
        self.inner.find_by_email(email).await
    }

    async fn roles_of(&self, account_id: AccountId) -> Result<Vec<Role>, StoreError> {
        self.inner.roles_of(account_id).await
    }

    async fn record_lockout(
        &self,
        account_id: AccountId,
        lockout_end: DateTime<Utc>,
        lockout_count: u32,
    ) -> Result<(), StoreError> {
        if self.fail_lockout_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("account database offline".to_string()));
        }
        self.inner
            .record_lockout(account_id, lockout_end, lockout_count)
            .await
    }

    async fn reset_lockout_count(&self, account_id: AccountId) -> Result<(), StoreError> {
        self.lockout_count_resets.fetch_add(1, Ordering::SeqCst);
        self.inner.reset_lockout_count(account_id).await
    }

    async fn set_lockout_end(
        &self,
        account_id: AccountId,
        lockout_end: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        self.inner.set_lockout_end(account_id, lockout_end).await
    }

    async fn reset_access_failed_count(&self, account_id: AccountId) -> Result<(), StoreError> {
        self.inner.reset_access_failed_count(account_id).await
    }
}

pub fn policy() -> LockoutPolicy {
    LockoutPolicy {
        max_failed_attempts: 3,
        base_lockout_minutes: 5,
        lockout_multiplier: 2,
        max_lockout_minutes: 60,
    }
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub accounts: Arc<RecordingStore>,
    pub cache: Arc<InMemoryCache>,
    pub refresh_tokens: Arc<InMemoryRefreshTokenStore>,
    pub verifier: Arc<PlainVerifier>,
    pub tokens: Arc<CountingTokens>,
    pub throttle: Arc<LoginThrottle>,
    pub account_id: AccountId,
}

pub struct HarnessBuilder {
    pub config: ThrottleConfig,
    pub expire_minutes: u64,
    pub verifier_delay: Option<Duration>,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        HarnessBuilder {
            config: ThrottleConfig {
                policy: policy(),
                session_safety_margin: Duration::from_secs(60),
                upstream_timeout: Duration::from_secs(5),
                refresh_token_lifetime: Duration::from_secs(24 * 60 * 60),
            },
            expire_minutes: 30,
            verifier_delay: None,
        }
    }
}

impl HarnessBuilder {
    pub fn build(self) -> Harness {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let accounts = Arc::new(RecordingStore::default());
        let cache = Arc::new(InMemoryCache::new(clock.clone()));
        let refresh_tokens = Arc::new(InMemoryRefreshTokenStore::new(clock.clone()));
        let verifier = Arc::new(PlainVerifier {
            delay: self.verifier_delay,
            ..PlainVerifier::default()
        });
        let tokens = Arc::new(CountingTokens::new(self.expire_minutes));

        let account_id = AccountId(uuid::Uuid::new_v4());
        accounts.inner.insert(
            AccountRecord::new(account_id, Email::new(EMAIL), format!("plain:{}", PASSWORD)),
            vec![Role::User],
        );

        let throttle = Arc::new(LoginThrottle::new(
            accounts.clone(),
            cache.clone(),
            verifier.clone(),
            tokens.clone(),
            refresh_tokens.clone(),
            clock.clone(),
            self.config,
        ));

        Harness {
            clock,
            accounts,
            cache,
            refresh_tokens,
            verifier,
            tokens,
            throttle,
            account_id,
        }
    }
}

impl Harness {
    pub fn new() -> Self {
        HarnessBuilder::default().build()
    }

    pub async fn attempt(&self, password: &str) -> Result<SessionToken, SignInError> {
        self.throttle
            .sign_in(SignInInput {
                email: Email::new(EMAIL),
                password: password.to_string(),
            })
            .await
    }

    pub fn account(&self) -> AccountRecord {
        self.accounts
            .inner
            .get(self.account_id)
            .expect("seeded account")
    }

    pub async fn refresh(&self, tokens: &TokenPair) -> Result<SessionToken, RefreshError> {
        self.throttle
            .refresh(RefreshInput {
                access_token: tokens.access_token.clone(),
                refresh_token: tokens.refresh_token.clone(),
            })
            .await
    }

    pub async fn failed_counter(&self) -> Option<String> {
        self.cache
            .get(&CacheKey::failed(&Email::new(EMAIL)))
            .await
            .unwrap()
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.clock.advance(by);
    }
}

//! Failed sign-in throttling with escalating account lockout.
//!
//! Every sign-in goes through [`LoginThrottle`]. A locked account is rejected
//! before its password is looked at. Wrong passwords bump a per-account
//! counter in the ephemeral cache; once the counter reaches the policy
//! threshold the account is locked for a window that grows with each lockout
//! episode. Successful sign-ins clear the counter and reuse a cached token pair
//! while it is still comfortably inside its validity. Refresh tokens handed
//! out with a pair are stored and redeem once for a new pair.

use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    pub policy: LockoutPolicy,
    /// Cached sessions expire this long before the tokens they hold.
    pub session_safety_margin: Duration,
    /// Bound on each credential check and token mint.
    pub upstream_timeout: Duration,
    pub refresh_token_lifetime: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        ThrottleConfig {
            policy: LockoutPolicy::default(),
            session_safety_margin: Duration::from_secs(60),
            upstream_timeout: Duration::from_secs(5),
            refresh_token_lifetime: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

/// Errors that can report a timed-out or failed collaborator.
trait UpstreamFailure {
    fn upstream(reason: String) -> Self;
}

impl UpstreamFailure for SignInError {
    fn upstream(reason: String) -> Self {
        SignInError::Upstream(reason)
    }
}

impl UpstreamFailure for RefreshError {
    fn upstream(reason: String) -> Self {
        RefreshError::Upstream(reason)
    }
}

enum FailureOutcome {
    Counted,
    Locked { minutes: u64 },
}

pub struct LoginThrottle {
    accounts: Arc<dyn AccountStore>,
    cache: Arc<dyn EphemeralCache>,
    verifier: Arc<dyn CredentialVerifier>,
    tokens: Arc<dyn TokenService>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    clock: Arc<dyn Clock>,
    config: ThrottleConfig,
}

impl LoginThrottle {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        cache: Arc<dyn EphemeralCache>,
        verifier: Arc<dyn CredentialVerifier>,
        tokens: Arc<dyn TokenService>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        clock: Arc<dyn Clock>,
        config: ThrottleConfig,
    ) -> Self {
        Self {
            accounts,
            cache,
            verifier,
            tokens,
            refresh_tokens,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    async fn bounded<R, T, E, F>(&self, what: &'static str, call: F) -> Result<T, R>
    where
        F: Future<Output = Result<T, E>>,
        R: From<E> + UpstreamFailure,
    {
        match tokio::time::timeout(self.config.upstream_timeout, call).await {
            Ok(result) => result.map_err(R::from),
            Err(_) => Err(R::upstream(format!(
                "{} timed out after {:?}",
                what, self.config.upstream_timeout
            ))),
        }
    }

    async fn failed_attempts(&self, key: &str) -> Result<u64, SignInError> {
        match self.cache.get(key).await? {
            None => Ok(0),
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                SignInError::from(StoreError::Corrupt {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            }),
        }
    }

    async fn record_failure(
        &self,
        account: &AccountRecord,
        now: DateTime<Utc>,
    ) -> Result<FailureOutcome, SignInError> {
        let policy = &self.config.policy;
        let key = CacheKey::failed(&account.email);
        let count = self.cache.increment(&key, policy.counter_ttl()).await?;

        if count < u64::from(policy.max_failed_attempts) {
            debug!(
                account = %account.email.fingerprint(),
                failed_attempts = count,
                "sign-in failed"
            );
            return Ok(FailureOutcome::Counted);
        }

        let lockout_count = account.lockout_count.saturating_add(1);
        let minutes = policy.lockout_minutes(lockout_count);
        let lockout_end = i64::try_from(minutes)
            .ok()
            .and_then(chrono::Duration::try_minutes)
            .and_then(|window| now.checked_add_signed(window))
            .ok_or_else(|| {
                SignInError::Upstream(format!("lockout of {} minutes is out of range", minutes))
            })?;

        self.accounts
            .record_lockout(account.account_id, lockout_end, lockout_count)
            .await?;
        self.cache.remove(&key).await?;

        warn!(
            account = %account.email.fingerprint(),
            lockout_count,
            lockout_minutes = minutes,
            "account locked after repeated sign-in failures"
        );
        Ok(FailureOutcome::Locked { minutes })
    }

    async fn clear_failures(&self, account: &AccountRecord) -> Result<(), SignInError> {
        if account.lockout_count != 0 {
            self.accounts.reset_lockout_count(account.account_id).await?;
        }
        self.cache.remove(&CacheKey::failed(&account.email)).await?;
        self.accounts
            .reset_access_failed_count(account.account_id)
            .await?;
        Ok(())
    }

    async fn cached_session(
        &self,
        account: &AccountRecord,
    ) -> Result<Option<SessionToken>, StoreError> {
        let token = self.cache.get(&CacheKey::token(&account.email)).await?;
        let roles = self.cache.get(&CacheKey::roles(&account.email)).await?;
        let (Some(token), Some(roles)) = (token, roles) else {
            return Ok(None);
        };

        match (
            serde_json::from_str::<TokenPair>(&token),
            serde_json::from_str::<Vec<Role>>(&roles),
        ) {
            (Ok(tokens), Ok(roles)) => Ok(Some(SessionToken {
                account_id: account.account_id,
                roles,
                tokens,
            })),
            _ => {
                warn!(
                    account = %account.email.fingerprint(),
                    "discarding undecodable session cache entry"
                );
                Ok(None)
            }
        }
    }

    async fn forget_session(&self, account: &AccountRecord) -> Result<(), StoreError> {
        self.cache.remove(&CacheKey::token(&account.email)).await?;
        self.cache.remove(&CacheKey::roles(&account.email)).await
    }

    async fn store_session(
        &self,
        account: &AccountRecord,
        session: &SessionToken,
    ) -> Result<(), StoreError> {
        let lifetime = Duration::from_secs(session.tokens.expire_minutes.saturating_mul(60));
        let ttl = lifetime.saturating_sub(self.config.session_safety_margin);
        if ttl.is_zero() {
            debug!(
                account = %account.email.fingerprint(),
                expire_minutes = session.tokens.expire_minutes,
                "token lifetime inside safety margin, not caching"
            );
            return Ok(());
        }

        let token = serde_json::to_string(&session.tokens)
            .map_err(|e| StoreError::InternalError(e.into()))?;
        let roles = serde_json::to_string(&session.roles)
            .map_err(|e| StoreError::InternalError(e.into()))?;

        self.cache
            .set_many(
                &[
                    (CacheKey::token(&account.email), token),
                    (CacheKey::roles(&account.email), roles),
                ],
                ttl,
            )
            .await
    }

    /// Mint a pair and remember its refresh token.
    async fn mint_session<R>(
        &self,
        account: &AccountRecord,
        now: DateTime<Utc>,
    ) -> Result<SessionToken, R>
    where
        R: From<StoreError> + From<TokenError> + UpstreamFailure,
    {
        let roles = self.accounts.roles_of(account.account_id).await?;
        let tokens = self
            .bounded::<R, _, _, _>("token mint", self.tokens.mint(account, &roles))
            .await?;

        let expires_at = chrono::Duration::from_std(self.config.refresh_token_lifetime)
            .ok()
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| R::upstream("refresh token lifetime is out of range".to_string()))?;
        self.refresh_tokens
            .save(&RefreshTokenRecord {
                token: tokens.refresh_token.clone(),
                account_id: account.account_id,
                expires_at,
            })
            .await?;

        Ok(SessionToken {
            account_id: account.account_id,
            roles,
            tokens,
        })
    }

    async fn issue_session(
        &self,
        account: &AccountRecord,
        now: DateTime<Utc>,
    ) -> Result<SessionToken, SignInError> {
        if let Some(session) = self.cached_session(account).await? {
            debug!(account = %account.email.fingerprint(), "reusing cached session");
            return Ok(session);
        }

        let session = self.mint_session::<SignInError>(account, now).await?;
        self.store_session(account, &session).await?;
        Ok(session)
    }
}

#[async_trait::async_trait]
impl SignInService for LoginThrottle {
    async fn sign_in(&self, request: SignInInput) -> Result<SessionToken, SignInError> {
        let SignInInput { email, password } = request;

        let account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(SignInError::InvalidCredentials)?;

        let now = self.clock.now();
        if let Some(remaining_seconds) = account.lockout_remaining(now) {
            debug!(
                account = %account.email.fingerprint(),
                remaining_seconds,
                "sign-in rejected, account locked"
            );
            return Err(SignInError::AccountLocked { remaining_seconds });
        }

        let prior_failures = self
            .failed_attempts(&CacheKey::failed(&account.email))
            .await?;

        let verified = self
            .bounded::<SignInError, _, _, _>(
                "credential check",
                self.verifier.verify_password(&account, &password),
            )
            .await?;

        if !verified {
            return Err(match self.record_failure(&account, now).await? {
                FailureOutcome::Counted => SignInError::InvalidCredentials,
                FailureOutcome::Locked { minutes } => SignInError::AccountLocked {
                    remaining_seconds: minutes.saturating_mul(60),
                },
            });
        }

        self.clear_failures(&account).await?;
        let session = self.issue_session(&account, now).await?;

        info!(
            account = %account.email.fingerprint(),
            prior_failures,
            "sign-in succeeded"
        );
        Ok(session)
    }
}

#[async_trait::async_trait]
impl SessionRefreshService for LoginThrottle {
    async fn refresh(&self, request: RefreshInput) -> Result<SessionToken, RefreshError> {
        let RefreshInput {
            access_token,
            refresh_token,
        } = request;

        let access = self.tokens.decode_expired(&access_token).await?;
        let account = self
            .accounts
            .find_by_email(&access.email)
            .await?
            .filter(|account| account.account_id == access.account_id)
            .ok_or(RefreshError::InvalidToken)?;

        let now = self.clock.now();
        if !self
            .refresh_tokens
            .redeem(&refresh_token, account.account_id, now)
            .await?
        {
            debug!(
                account = %account.email.fingerprint(),
                "refresh rejected, token unknown, expired or already used"
            );
            return Err(RefreshError::InvalidToken);
        }

        // The cached pair carries the refresh token just consumed.
        self.forget_session(&account).await?;
        let session = self.mint_session::<RefreshError>(&account, now).await?;
        self.store_session(&account, &session).await?;

        info!(account = %account.email.fingerprint(), "session refreshed");
        Ok(session)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct AccountId(pub uuid::Uuid);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AccountId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(AccountId)
    }
}

/// Normalised account email. Trimmed and lower-cased so every spelling of the
/// same address maps to one account and one set of cache keys.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Email(raw.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short stable digest for log fields. Raw addresses stay out of logs.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        hex::encode(&digest[..6])
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Email {
    fn from(raw: String) -> Self {
        Email::new(raw)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub account_id: AccountId,
    pub email: Email,
    pub password_hash: String,
    pub lockout_end: Option<DateTime<Utc>>,
    pub lockout_count: u32,
    pub access_failed_count: u32,
}

impl AccountRecord {
    pub fn new(account_id: AccountId, email: Email, password_hash: impl Into<String>) -> Self {
        AccountRecord {
            account_id,
            email,
            password_hash: password_hash.into(),
            lockout_end: None,
            lockout_count: 0,
            access_failed_count: 0,
        }
    }

    /// Seconds left on an active lockout, or `None` when sign-in may proceed.
    pub fn lockout_remaining(&self, now: DateTime<Utc>) -> Option<u64> {
        match self.lockout_end {
            Some(end) if end > now => Some((end - now).num_seconds().max(0) as u64),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn email_is_normalised() {
        let email = Email::new("  Jane.Doe@Example.COM ");
        assert_eq!(email.as_str(), "jane.doe@example.com");
        assert_eq!(email, Email::new("jane.doe@example.com"));
    }

    #[test]
    fn fingerprint_is_stable_and_hides_address() {
        let a = Email::new("someone@example.com").fingerprint();
        let b = Email::new("SOMEONE@example.com").fingerprint();
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
        assert!(!a.contains("someone"));
    }

    #[test]
    fn lockout_remaining_truncates_and_expires() {
        let now = Utc::now();
        let mut account = AccountRecord::new(
            AccountId(uuid::Uuid::new_v4()),
            Email::new("a@example.com"),
            "hash",
        );
        assert_eq!(account.lockout_remaining(now), None);

        account.lockout_end = Some(now + Duration::milliseconds(90_500));
        assert_eq!(account.lockout_remaining(now), Some(90));

        account.lockout_end = Some(now);
        assert_eq!(account.lockout_remaining(now), None);

        account.lockout_end = Some(now - Duration::minutes(1));
        assert_eq!(account.lockout_remaining(now), None);
    }
}

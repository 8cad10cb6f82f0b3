use super::{AccountId, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token pair as handed out by the token service.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expire_minutes: u64,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct SessionToken {
    pub account_id: AccountId,
    pub roles: Vec<Role>,
    pub tokens: TokenPair,
}

/// Stored refresh token. Redeeming it consumes it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub account_id: AccountId,
    pub expires_at: DateTime<Utc>,
}

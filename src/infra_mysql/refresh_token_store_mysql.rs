//! Refresh tokens in MySQL.
//!
//! ```sql
//! CREATE TABLE refresh_token (
//!     token      VARCHAR(64) NOT NULL PRIMARY KEY,
//!     account_id BINARY(16)  NOT NULL,
//!     expires_at DATETIME(6) NOT NULL,
//!     KEY idx_refresh_token_account (account_id)
//! );
//! ```

use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

pub struct MySqlRefreshTokenStore {
    pool: MySqlPool,
}

fn store_err(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

impl MySqlRefreshTokenStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlRefreshTokenStore { pool }
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for MySqlRefreshTokenStore {
    async fn save(&self, record: &RefreshTokenRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
INSERT INTO refresh_token (token, account_id, expires_at)
VALUES (?, ?, ?)
"#,
        )
        .bind(&record.token)
        .bind(record.account_id.0.as_bytes().as_slice())
        .bind(record.expires_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn redeem(
        &self,
        token: &str,
        account_id: AccountId,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        // The delete is the claim: of two concurrent redeems only one sees a row.
        let result = sqlx::query(
            r#"
DELETE FROM refresh_token
WHERE token = ? AND account_id = ? AND expires_at > ?
"#,
        )
        .bind(token)
        .bind(account_id.0.as_bytes().as_slice())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(result.rows_affected() == 1)
    }
}

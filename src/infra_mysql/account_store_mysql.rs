//! Account store over the identity tables.
//!
//! ```sql
//! CREATE TABLE account (
//!     account_id          BINARY(16)   NOT NULL PRIMARY KEY,
//!     email               VARCHAR(256) NOT NULL UNIQUE,
//!     password_hash       VARCHAR(256) NOT NULL,
//!     lockout_end         DATETIME(6)  NULL,
//!     lockout_count       INT UNSIGNED NOT NULL DEFAULT 0,
//!     access_failed_count INT UNSIGNED NOT NULL DEFAULT 0
//! );
//! CREATE TABLE account_role (
//!     account_id BINARY(16)  NOT NULL,
//!     role       VARCHAR(32) NOT NULL,
//!     PRIMARY KEY (account_id, role)
//! );
//! ```

use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::query::Query;
use sqlx::{MySql, MySqlPool, Row};
use uuid::Uuid;

pub struct MySqlAccountStore {
    pool: MySqlPool,
}

fn store_err(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

impl MySqlAccountStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlAccountStore { pool }
    }

    #[inline]
    fn id_as_bytes(id: &AccountId) -> &[u8] {
        id.0.as_bytes()
    }

    #[inline]
    fn id_from_bytes(id: &[u8]) -> Result<AccountId, StoreError> {
        Ok(AccountId(Uuid::from_slice(id).map_err(|e| {
            StoreError::Corrupt {
                key: "account.account_id".to_string(),
                reason: e.to_string(),
            }
        })?))
    }

    fn row_to_record(row: MySqlRow) -> Result<AccountRecord, StoreError> {
        let account_id_bytes: Vec<u8> = row.try_get("account_id").map_err(store_err)?;
        let account_id = Self::id_from_bytes(&account_id_bytes)?;

        let email: String = row.try_get("email").map_err(store_err)?;
        let password_hash: String = row.try_get("password_hash").map_err(store_err)?;
        let lockout_end: Option<DateTime<Utc>> = row.try_get("lockout_end").map_err(store_err)?;
        let lockout_count: u32 = row.try_get("lockout_count").map_err(store_err)?;
        let access_failed_count: u32 = row.try_get("access_failed_count").map_err(store_err)?;

        Ok(AccountRecord {
            account_id,
            email: Email::new(email),
            password_hash,
            lockout_end,
            lockout_count,
            access_failed_count,
        })
    }

    async fn execute(&self, query: Query<'_, MySql, MySqlArguments>) -> Result<(), StoreError> {
        query.execute(&self.pool).await.map_err(store_err)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl AccountStore for MySqlAccountStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<AccountRecord>, StoreError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT account_id, email, password_hash, lockout_end, lockout_count, access_failed_count
FROM account
WHERE email = ?
"#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn roles_of(&self, account_id: AccountId) -> Result<Vec<Role>, StoreError> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
SELECT role
FROM account_role
WHERE account_id = ?
ORDER BY role
"#,
        )
        .bind(Self::id_as_bytes(&account_id))
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        names
            .iter()
            .map(|name| {
                name.parse::<Role>().map_err(|e| StoreError::Corrupt {
                    key: "account_role.role".to_string(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    async fn record_lockout(
        &self,
        account_id: AccountId,
        lockout_end: DateTime<Utc>,
        lockout_count: u32,
    ) -> Result<(), StoreError> {
        self.execute(
            sqlx::query(
                r#"
UPDATE account
SET lockout_end = ?, lockout_count = ?
WHERE account_id = ?
"#,
            )
            .bind(lockout_end)
            .bind(lockout_count)
            .bind(Self::id_as_bytes(&account_id)),
        )
        .await
    }

    async fn reset_lockout_count(&self, account_id: AccountId) -> Result<(), StoreError> {
        self.execute(
            sqlx::query("UPDATE account SET lockout_count = 0 WHERE account_id = ?")
                .bind(Self::id_as_bytes(&account_id)),
        )
        .await
    }

    async fn set_lockout_end(
        &self,
        account_id: AccountId,
        lockout_end: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        self.execute(
            sqlx::query("UPDATE account SET lockout_end = ? WHERE account_id = ?")
                .bind(lockout_end)
                .bind(Self::id_as_bytes(&account_id)),
        )
        .await
    }

    async fn reset_access_failed_count(&self, account_id: AccountId) -> Result<(), StoreError> {
        self.execute(
            sqlx::query("UPDATE account SET access_failed_count = 0 WHERE account_id = ?")
                .bind(Self::id_as_bytes(&account_id)),
        )
        .await
    }
}

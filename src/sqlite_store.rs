use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::account::AccountDocument;
use crate::models::metrics::{AccountMetrics, Metrics};
use crate::models::snapshot::Snapshot;
use crate::store::AccountStore;
use crate::util::{code_prefix, now_millis};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

type AccountRow = (String, String, Vec<u8>, i64, i64, String);

fn row_to_document(row: AccountRow) -> Result<AccountDocument, AppError> {
    let (sync_code, pin_hash, salt, created_at, last_synced_at, snapshot_json) = row;
    let snapshot: Snapshot = serde_json::from_str(&snapshot_json)?;
    Ok(AccountDocument {
        sync_code,
        pin_hash,
        salt,
        created_at,
        last_synced_at,
        snapshot,
    })
}

#[async_trait]
impl AccountStore for SqliteStore {
    async fn exists(&self, sync_code: &str) -> Result<bool, AppError> {
        tracing::debug!(sync_code = %code_prefix(sync_code), "db: SELECT 1 (account exists check)");

        let exists: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM accounts WHERE sync_code = ?")
                .bind(sync_code)
                .fetch_optional(&self.pool)
                .await?;

        let found = exists.is_some();
        tracing::debug!(sync_code = %code_prefix(sync_code), found, "db: account exists result");

        Ok(found)
    }

    async fn create(&self, doc: &AccountDocument) -> Result<(), AppError> {
        tracing::debug!(sync_code = %code_prefix(&doc.sync_code), "db: INSERT account");

        let snapshot_json = serde_json::to_string(&doc.snapshot)?;

        // Plain INSERT: the primary key makes this fail on an existing sync
        // code, so a lost allocation race cannot overwrite an account.
        sqlx::query(
            "INSERT INTO accounts (sync_code, pin_hash, salt, created_at, last_synced_at, snapshot) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&doc.sync_code)
        .bind(&doc.pin_hash)
        .bind(&doc.salt)
        .bind(doc.created_at)
        .bind(doc.last_synced_at)
        .bind(snapshot_json)
        .execute(&self.pool)
        .await?;

        tracing::debug!(sync_code = %code_prefix(&doc.sync_code), "db: account row inserted");

        Ok(())
    }

    async fn load(&self, sync_code: &str) -> Result<Option<AccountDocument>, AppError> {
        tracing::debug!(sync_code = %code_prefix(sync_code), "db: SELECT account");

        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT sync_code, pin_hash, salt, created_at, last_synced_at, snapshot \
             FROM accounts WHERE sync_code = ?",
        )
        .bind(sync_code)
        .fetch_optional(&self.pool)
        .await?;

        tracing::debug!(
            sync_code = %code_prefix(sync_code),
            found = row.is_some(),
            "db: account lookup result"
        );

        row.map(row_to_document).transpose()
    }

    async fn save(&self, doc: &AccountDocument) -> Result<(), AppError> {
        tracing::debug!(
            sync_code = %code_prefix(&doc.sync_code),
            last_synced_at = doc.last_synced_at,
            "db: UPDATE account snapshot"
        );

        let snapshot_json = serde_json::to_string(&doc.snapshot)?;

        // Only the mutable columns; pin_hash/salt/created_at stay as written
        // at creation.
        sqlx::query(
            "UPDATE accounts SET snapshot = ?, last_synced_at = ? WHERE sync_code = ?",
        )
        .bind(snapshot_json)
        .bind(doc.last_synced_at)
        .bind(&doc.sync_code)
        .execute(&self.pool)
        .await?;

        tracing::debug!(sync_code = %code_prefix(&doc.sync_code), "db: account snapshot updated");

        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn metrics(&self) -> Result<Metrics, AppError> {
        let now = now_millis();
        let day = 24 * 60 * 60 * 1000;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;

        let mut windows = [0i64; 3];
        for (i, days) in [1i64, 7, 30].into_iter().enumerate() {
            let cutoff = now - days * day;
            let (count,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM accounts WHERE last_synced_at >= ?")
                    .bind(cutoff)
                    .fetch_one(&self.pool)
                    .await?;
            windows[i] = count;
        }

        Ok(Metrics {
            accounts: AccountMetrics {
                total,
                synced_last_24h: windows[0],
                synced_last_7d: windows[1],
                synced_last_30d: windows[2],
            },
            collected_at: now,
        })
    }
}

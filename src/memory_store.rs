use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::account::AccountDocument;
use crate::models::metrics::{AccountMetrics, Metrics};
use crate::store::AccountStore;
use crate::util::now_millis;

/// In-memory account store for tests and the allocator's unit tests. Same
/// contract as the SQLite store, including create-fails-on-existing.
#[derive(Default)]
pub struct MemoryStore {
    accounts: Mutex<HashMap<String, AccountDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a sync code so allocator tests can force collisions.
    pub fn seed(&self, doc: AccountDocument) {
        self.accounts
            .lock()
            .expect("memory store lock poisoned")
            .insert(doc.sync_code.clone(), doc);
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn exists(&self, sync_code: &str) -> Result<bool, AppError> {
        let accounts = self.accounts.lock().expect("memory store lock poisoned");
        Ok(accounts.contains_key(sync_code))
    }

    async fn create(&self, doc: &AccountDocument) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().expect("memory store lock poisoned");
        if accounts.contains_key(&doc.sync_code) {
            return Err(AppError::Internal(format!(
                "sync code already exists: {}",
                doc.sync_code
            )));
        }
        accounts.insert(doc.sync_code.clone(), doc.clone());
        Ok(())
    }

    async fn load(&self, sync_code: &str) -> Result<Option<AccountDocument>, AppError> {
        let accounts = self.accounts.lock().expect("memory store lock poisoned");
        Ok(accounts.get(sync_code).cloned())
    }

    async fn save(&self, doc: &AccountDocument) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().expect("memory store lock poisoned");
        if let Some(existing) = accounts.get_mut(&doc.sync_code) {
            existing.snapshot = doc.snapshot.clone();
            existing.last_synced_at = doc.last_synced_at;
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn metrics(&self) -> Result<Metrics, AppError> {
        let now = now_millis();
        let day = 24 * 60 * 60 * 1000;
        let accounts = self.accounts.lock().expect("memory store lock poisoned");

        let count_since = |cutoff: i64| {
            accounts
                .values()
                .filter(|a| a.last_synced_at >= cutoff)
                .count() as i64
        };

        Ok(Metrics {
            accounts: AccountMetrics {
                total: accounts.len() as i64,
                synced_last_24h: count_since(now - day),
                synced_last_7d: count_since(now - 7 * day),
                synced_last_30d: count_since(now - 30 * day),
            },
            collected_at: now,
        })
    }
}

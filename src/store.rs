use async_trait::async_trait;

use crate::error::AppError;
use crate::models::account::AccountDocument;
use crate::models::metrics::Metrics;

/// The account store: one document per sync code. The sync handlers and the
/// code allocator depend on this trait, never on a concrete backend, so
/// tests can substitute an in-memory store.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn exists(&self, sync_code: &str) -> Result<bool, AppError>;

    /// Create the document, failing if the sync code is already taken. The
    /// write itself is the collision authority; the allocator's existence
    /// pre-check only keeps retries cheap.
    async fn create(&self, doc: &AccountDocument) -> Result<(), AppError>;

    async fn load(&self, sync_code: &str) -> Result<Option<AccountDocument>, AppError>;

    /// Persist the mutable portion of the document (`snapshot`,
    /// `last_synced_at`). `pin_hash`, `salt` and `created_at` are immutable
    /// after `create` and never rewritten.
    async fn save(&self, doc: &AccountDocument) -> Result<(), AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
    async fn metrics(&self) -> Result<Metrics, AppError>;
}

use crate::models::snapshot::Snapshot;

/// One account document per sync code. `pin_hash` and `salt` never leave
/// the service; only `snapshot` and `last_synced_at` mutate after creation.
#[derive(Debug, Clone)]
pub struct AccountDocument {
    pub sync_code: String,
    pub pin_hash: String,
    pub salt: Vec<u8>,
    pub created_at: i64,
    pub last_synced_at: i64,
    pub snapshot: Snapshot,
}

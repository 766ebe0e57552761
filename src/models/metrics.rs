use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub accounts: AccountMetrics,
    pub collected_at: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMetrics {
    pub total: i64,
    pub synced_last_24h: i64,
    pub synced_last_7d: i64,
    pub synced_last_30d: i64,
}

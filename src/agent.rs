use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch, Mutex};

use crate::models::snapshot::{Snapshot, SnapshotPatch};
use crate::models::sync::{LoginResponse, PushResponse, SetupResponse};

const DEBOUNCE: Duration = Duration::from_secs(1);
const BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_CAP: Duration = Duration::from_secs(10);
const MAX_PUSH_ATTEMPTS: u32 = 3;

const CREDENTIALS_KEY: &str = "sync.credentials";

/// Device-held sync credentials. Absence means the device is offline-only
/// and the agent makes no network calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub sync_code: String,
    pub auth_token: String,
    pub last_synced_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Bad credentials or unknown account. Retrying the same request cannot
    /// succeed, so the agent fails fast instead of backing off.
    Auth,
    /// Malformed request, rejected by validation.
    Invalid,
    /// Network or server failure; worth retrying.
    Transient,
}

#[derive(Debug, Clone)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Transient,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Transport to the sync service, abstracted so the agent runs against HTTP
/// in the app and against a fake in tests.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    async fn setup(
        &self,
        pin: &str,
        existing_data: &Snapshot,
    ) -> Result<SetupResponse, TransportError>;
    async fn login(&self, sync_code: &str, pin: &str) -> Result<LoginResponse, TransportError>;
    async fn push(
        &self,
        credentials: &Credentials,
        patch: &SnapshotPatch,
    ) -> Result<PushResponse, TransportError>;
}

/// Key-value persistence the UI platform provides (browser local storage in
/// the app). The agent keeps its credentials here, nothing else.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// The UI-owned synchronized state. Read when a push fires (so the push
/// carries the state as of push time, not notify time), replaced wholesale
/// after Login.
pub trait LocalState: Send + Sync {
    fn snapshot(&self) -> Snapshot;
    fn replace(&self, snapshot: Snapshot);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// No credentials held; sync is off.
    Disabled,
    Idle,
    Syncing,
    /// Push failed past its retry budget (or failed authentication); shown
    /// persistently until the next debounced push clears or re-raises it.
    Error(String),
}

pub struct SyncAgent {
    inner: Arc<AgentInner>,
    dirty_tx: mpsc::UnboundedSender<()>,
}

struct AgentInner {
    transport: Arc<dyn SyncTransport>,
    local: Arc<dyn LocalStore>,
    state: Arc<dyn LocalState>,
    credentials: Mutex<Option<Credentials>>,
    status_tx: watch::Sender<SyncStatus>,
}

impl SyncAgent {
    pub fn new(
        transport: Arc<dyn SyncTransport>,
        local: Arc<dyn LocalStore>,
        state: Arc<dyn LocalState>,
    ) -> Self {
        let credentials = local
            .get(CREDENTIALS_KEY)
            .and_then(|raw| serde_json::from_str::<Credentials>(&raw).ok());

        let initial = if credentials.is_some() {
            SyncStatus::Idle
        } else {
            SyncStatus::Disabled
        };
        let (status_tx, _) = watch::channel(initial);

        let inner = Arc::new(AgentInner {
            transport,
            local,
            state,
            credentials: Mutex::new(credentials),
            status_tx,
        });

        let (dirty_tx, dirty_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_loop(inner.clone(), dirty_rx));

        Self { inner, dirty_tx }
    }

    /// Tell the agent the synchronized state changed. Cheap and callable
    /// from any mutation path; bursts coalesce into one push through the
    /// debounce window.
    pub fn notify_changed(&self) {
        let _ = self.dirty_tx.send(());
    }

    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status_tx.subscribe()
    }

    pub async fn is_enabled(&self) -> bool {
        self.inner.credentials.lock().await.is_some()
    }

    pub async fn credentials(&self) -> Option<Credentials> {
        self.inner.credentials.lock().await.clone()
    }

    /// Create a new account from the current local state.
    pub async fn setup(&self, pin: &str) -> Result<Credentials, TransportError> {
        let snapshot = self.inner.state.snapshot();
        let response = self.inner.transport.setup(pin, &snapshot).await?;

        let credentials = Credentials {
            sync_code: response.sync_code,
            auth_token: response.auth_token,
            last_synced_at: 0,
        };
        self.inner.store_credentials(credentials.clone()).await;
        Ok(credentials)
    }

    /// Connect this device to an existing account. The returned snapshot
    /// replaces the local state entirely — remote wins at this transition,
    /// deliberately asymmetric with Push's field-level optionality.
    pub async fn login(&self, sync_code: &str, pin: &str) -> Result<Credentials, TransportError> {
        let response = self.inner.transport.login(sync_code, pin).await?;

        let credentials = Credentials {
            sync_code: response.sync_code,
            auth_token: response.auth_token,
            last_synced_at: response.last_synced_at,
        };
        self.inner.state.replace(response.snapshot);
        self.inner.store_credentials(credentials.clone()).await;
        Ok(credentials)
    }

    /// Drop credentials; the device goes back to offline-only operation.
    pub async fn disconnect(&self) {
        *self.inner.credentials.lock().await = None;
        self.inner.local.remove(CREDENTIALS_KEY);
        self.inner.status_tx.send_replace(SyncStatus::Disabled);
    }
}

impl AgentInner {
    async fn store_credentials(&self, credentials: Credentials) {
        if let Ok(raw) = serde_json::to_string(&credentials) {
            self.local.set(CREDENTIALS_KEY, &raw);
        }
        *self.credentials.lock().await = Some(credentials);
        self.status_tx.send_replace(SyncStatus::Idle);
    }

    async fn push_with_retry(&self) {
        let Some(mut credentials) = self.credentials.lock().await.clone() else {
            return;
        };

        self.status_tx.send_replace(SyncStatus::Syncing);
        let patch = full_patch(self.state.snapshot());

        let mut delay = BACKOFF_BASE;
        for attempt in 1..=MAX_PUSH_ATTEMPTS {
            match self.transport.push(&credentials, &patch).await {
                Ok(PushResponse { last_synced_at }) => {
                    credentials.last_synced_at = last_synced_at;
                    self.store_credentials(credentials).await;
                    tracing::debug!(attempt, last_synced_at, "Push accepted");
                    return;
                }
                Err(e) if e.kind == TransportErrorKind::Transient && attempt < MAX_PUSH_ATTEMPTS => {
                    tracing::warn!(
                        attempt,
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "Push failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(BACKOFF_CAP);
                }
                Err(e) => {
                    // Auth/validation errors cannot succeed on retry, and
                    // transient ones just ran out of budget. Either way the
                    // error sticks until the next debounced trigger.
                    tracing::warn!(attempt, error = %e, "Push abandoned");
                    self.status_tx.send_replace(SyncStatus::Error(e.message));
                    return;
                }
            }
        }
    }
}

/// A full-state patch: every field present, so the push overwrites the whole
/// remote snapshot.
fn full_patch(snapshot: Snapshot) -> SnapshotPatch {
    SnapshotPatch {
        todos: Some(snapshot.todos),
        recurring_todos: Some(snapshot.recurring_todos),
        pause_logs: Some(snapshot.pause_logs),
        timer_state: Some(snapshot.timer_state),
        recurring_added_today: Some(snapshot.recurring_added_today),
    }
}

async fn run_loop(inner: Arc<AgentInner>, mut dirty_rx: mpsc::UnboundedReceiver<()>) {
    while dirty_rx.recv().await.is_some() {
        // Debounce: keep extending the window while edits arrive, then push
        // once the burst settles. An in-flight push is never cancelled; a
        // later burst simply queues the next one.
        loop {
            match tokio::time::timeout(DEBOUNCE, dirty_rx.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => return,
                Err(_) => break,
            }
        }
        inner.push_with_retry().await;
    }
}

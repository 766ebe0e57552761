use axum::{extract::State, response::IntoResponse, Extension, Json};

use crate::credentials::verify_auth_token;
use crate::error::AppError;
use crate::middleware::auth::SyncAuth;
use crate::models::account::AccountDocument;
use crate::models::snapshot::SnapshotPatch;
use crate::models::sync::{PullResponse, PushResponse};
use crate::util::{code_prefix, now_millis};
use crate::AppState;

async fn load_verified(
    state: &AppState,
    auth: &SyncAuth,
) -> Result<AccountDocument, AppError> {
    let doc = state
        .store
        .load(&auth.sync_code)
        .await?
        .ok_or_else(|| AppError::NotFound("Sync code not found".into()))?;

    if !verify_auth_token(&auth.auth_token, &doc.sync_code, &doc.salt) {
        tracing::warn!(
            sync_code = %code_prefix(&auth.sync_code),
            "Auth token verification failed"
        );
        return Err(AppError::Unauthorized("Invalid auth token".into()));
    }

    Ok(doc)
}

/// POST /api/v1/sync/push — merge a (possibly partial) snapshot into the
/// account document. Present fields overwrite, absent fields are preserved,
/// the whole document is written back in one store call (no partial apply).
pub async fn push(
    State(state): State<AppState>,
    Extension(auth): Extension<SyncAuth>,
    Json(patch): Json<SnapshotPatch>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(
        handler = "push",
        sync_code = %code_prefix(&auth.sync_code),
        pushed_tasks = patch.task_count(),
        "Handler: POST /api/v1/sync/push"
    );

    if patch.task_count() > state.max_tasks_per_snapshot {
        tracing::warn!(handler = "push", "Validation failed: snapshot task limit exceeded");
        return Err(AppError::BadRequest("Snapshot task limit exceeded".into()));
    }

    tracing::debug!(handler = "push", "Dispatching to store.load (verify auth)");
    let mut doc = load_verified(&state, &auth).await?;

    doc.snapshot.apply(patch);
    doc.last_synced_at = now_millis();

    tracing::debug!(handler = "push", "Dispatching to store.save");
    state.store.save(&doc).await?;

    tracing::info!(
        handler = "push",
        sync_code = %code_prefix(&auth.sync_code),
        last_synced_at = doc.last_synced_at,
        status = 200,
        "Responding: push accepted"
    );

    Ok(Json(PushResponse {
        last_synced_at: doc.last_synced_at,
    }))
}

/// GET /api/v1/sync/pull — full snapshot for an authenticated device.
/// Read-only, does not advance `lastSyncedAt`.
pub async fn pull(
    State(state): State<AppState>,
    Extension(auth): Extension<SyncAuth>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(
        handler = "pull",
        sync_code = %code_prefix(&auth.sync_code),
        "Handler: GET /api/v1/sync/pull"
    );

    tracing::debug!(handler = "pull", "Dispatching to store.load (verify auth)");
    let doc = load_verified(&state, &auth).await?;

    tracing::info!(
        handler = "pull",
        sync_code = %code_prefix(&auth.sync_code),
        todos = doc.snapshot.todos.len(),
        status = 200,
        "Responding: pull complete"
    );

    Ok(Json(PullResponse {
        snapshot: doc.snapshot,
        last_synced_at: doc.last_synced_at,
    }))
}

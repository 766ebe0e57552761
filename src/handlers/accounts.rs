use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::credentials::{
    derive_auth_token, derive_pin_hash, generate_salt, is_valid_pin, verify_pin,
};
use crate::error::AppError;
use crate::models::account::AccountDocument;
use crate::models::sync::{LoginRequest, LoginResponse, SetupRequest, SetupResponse};
use crate::sync_code::{allocate_sync_code, normalize_sync_code};
use crate::util::{code_prefix, now_millis};
use crate::AppState;

/// POST /api/v1/accounts — create an account (Setup).
/// The caller's local data becomes the initial remote snapshot.
pub async fn setup(
    State(state): State<AppState>,
    Json(body): Json<SetupRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(
        handler = "setup",
        has_existing_data = body.existing_data.is_some(),
        "Handler: POST /api/v1/accounts"
    );

    if !is_valid_pin(&body.pin) {
        tracing::warn!(handler = "setup", "Validation failed: PIN must be exactly 4 digits");
        return Err(AppError::BadRequest("PIN must be exactly 4 digits".into()));
    }

    let now = now_millis();
    let mut snapshot = body.existing_data.unwrap_or_default();
    snapshot.normalize(now);

    if snapshot.task_count() > state.max_tasks_per_snapshot {
        tracing::warn!(handler = "setup", "Validation failed: snapshot task limit exceeded");
        return Err(AppError::BadRequest("Snapshot task limit exceeded".into()));
    }

    tracing::debug!(handler = "setup", "Dispatching to sync code allocator");
    let sync_code = allocate_sync_code(state.store.as_ref()).await?;

    let salt = generate_salt();
    let pin_hash = derive_pin_hash(&body.pin, &salt);
    let auth_token = derive_auth_token(&sync_code, &salt);

    let doc = AccountDocument {
        sync_code: sync_code.clone(),
        pin_hash,
        salt: salt.to_vec(),
        created_at: now,
        last_synced_at: now,
        snapshot,
    };

    tracing::debug!(handler = "setup", "Dispatching to store.create");
    state.store.create(&doc).await?;

    tracing::info!(
        handler = "setup",
        sync_code = %code_prefix(&sync_code),
        status = 201,
        "Responding: account created"
    );

    Ok((
        StatusCode::CREATED,
        Json(SetupResponse {
            sync_code,
            auth_token,
        }),
    ))
}

/// POST /api/v1/accounts/login — authenticate a device with sync code + PIN
/// and hand back the auth token plus the full snapshot. Read-only: the
/// account document is not mutated, `lastSyncedAt` stays at the last Push.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(
        handler = "login",
        sync_code = %code_prefix(&body.sync_code),
        "Handler: POST /api/v1/accounts/login"
    );

    if body.sync_code.trim().is_empty() || body.pin.is_empty() {
        tracing::warn!(handler = "login", "Validation failed: missing sync code or PIN");
        return Err(AppError::BadRequest("Sync code and PIN are required".into()));
    }

    let sync_code = normalize_sync_code(&body.sync_code);

    tracing::debug!(handler = "login", "Dispatching to store.load");
    let doc = state
        .store
        .load(&sync_code)
        .await?
        .ok_or_else(|| AppError::NotFound("Sync code not found".into()))?;
    tracing::debug!(handler = "login", "Store returned: account found");

    if !verify_pin(&body.pin, &doc.salt, &doc.pin_hash) {
        tracing::warn!(
            handler = "login",
            sync_code = %code_prefix(&sync_code),
            "PIN verification failed"
        );
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let auth_token = derive_auth_token(&doc.sync_code, &doc.salt);

    tracing::info!(
        handler = "login",
        sync_code = %code_prefix(&sync_code),
        status = 200,
        "Responding: login successful"
    );

    Ok(Json(LoginResponse {
        sync_code: doc.sync_code,
        auth_token,
        snapshot: doc.snapshot,
        last_synced_at: doc.last_synced_at,
    }))
}

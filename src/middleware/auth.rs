use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::credentials::is_valid_auth_token;
use crate::sync_code::{is_valid_sync_code, normalize_sync_code};
use crate::util::code_prefix;

const SYNC_CODE_HEADER: &str = "x-sync-code";
const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Validated credentials for an authenticated sync request. This middleware
/// only checks shape and normalizes the sync code; the handler verifies the
/// token against the account's salt, which requires a store lookup.
#[derive(Debug, Clone)]
pub struct SyncAuth {
    pub sync_code: String,
    pub auth_token: String,
}

/// Extract and shape-check the `x-sync-code` and `x-auth-token` headers.
pub async fn require_sync_auth(mut req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().path().to_string();

    // Scope the closure so its borrow of `req` (whose body is not `Sync`)
    // ends before the final await, keeping this future `Send`.
    let (raw_code, auth_token) = {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        };
        (header(SYNC_CODE_HEADER), header(AUTH_TOKEN_HEADER))
    };

    let (Some(raw_code), Some(auth_token)) = (raw_code, auth_token) else {
        tracing::warn!(
            method = %method,
            uri = %uri,
            "Auth middleware: rejected — missing sync credentials headers"
        );
        return (
            StatusCode::UNAUTHORIZED,
            "Missing x-sync-code or x-auth-token header",
        )
            .into_response();
    };

    let sync_code = normalize_sync_code(&raw_code);
    if !is_valid_sync_code(&sync_code) || !is_valid_auth_token(&auth_token) {
        tracing::warn!(
            method = %method,
            uri = %uri,
            sync_code = %code_prefix(&sync_code),
            "Auth middleware: rejected — malformed credentials"
        );
        return (StatusCode::BAD_REQUEST, "Malformed sync credentials").into_response();
    }

    tracing::debug!(
        sync_code = %code_prefix(&sync_code),
        method = %method,
        uri = %uri,
        "Auth middleware: credentials well-formed, forwarding to handler"
    );
    req.extensions_mut().insert(SyncAuth {
        sync_code,
        auth_token,
    });
    next.run(req).await
}

//! `POST /changepassword/`

use crate::domain::error::{ApiResponse, HandlerError, HandlerResult};
use crate::domain::session::SessionContext;
use crate::router::GatewayState;
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Runs under the namespace lock (POST is mutating).
///
/// Domain failures from the authenticator are returned verbatim; anything
/// else becomes an opaque HTTP 500 via [`HandlerError`].
pub async fn change_password(
    State(state): State<GatewayState>,
    Extension(session): Extension<SessionContext>,
    Json(body): Json<ChangePasswordRequest>,
) -> HandlerResult<ApiResponse> {
    let Some(namespace) = session.namespace() else {
        return Ok(ApiResponse::not_authorized());
    };

    debug!(namespace, "Changing password");
    let authenticator = state.authenticators.get(namespace);
    authenticator
        .change_password(&body.old_password, &body.new_password)
        .await
        .inspect_err(|e| {
            if matches!(e, HandlerError::Internal(_)) {
                state.metrics.record_internal_error();
            }
        })?;

    Ok(ApiResponse::ok("Password changed."))
}

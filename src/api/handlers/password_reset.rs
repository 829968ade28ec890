use axum::{
    Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::info;

use super::types::{FinishPasswordResetRequest, FinishPasswordResetResponse};
use crate::auth::error::AuthError;
use crate::auth::password;
use crate::auth::pipeline::{Authorizer, MemberRequirement};
use crate::auth::session::SessionType;
use crate::auth::unix_now;

#[utoipa::path(
    post,
    path = "/api/finishpasswordreset",
    request_body = FinishPasswordResetRequest,
    responses(
        (status = 200, description = "Password replaced; the session is upgraded to a regular one", body = FinishPasswordResetResponse),
        (status = 400, description = "Missing payload, invalid session, or invalid token", body = String),
        (status = 403, description = "Session is not a password-reset session", body = String)
    ),
    tag = "auth"
)]
pub async fn finish_password_reset(
    Extension(authorizer): Extension<Arc<Authorizer>>,
    headers: HeaderMap,
    payload: Option<Json<FinishPasswordResetRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "missing payload").into_response();
    };
    match finish(&authorizer, &headers, &payload).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn finish(
    authorizer: &Authorizer,
    headers: &HeaderMap,
    payload: &FinishPasswordResetRequest,
) -> Result<FinishPasswordResetResponse, AuthError> {
    let context = authorizer
        .authorize(
            headers,
            SessionType::PASSWORD_RESET,
            MemberRequirement::Required,
        )
        .await?;
    let session = context.session.ok_or(AuthError::MissingAuthorization)?;

    authorizer
        .consume_request_token(&payload.token, &session)
        .await?;

    let entry = password::new_password_entry(&payload.new_password, unix_now())?;
    authorizer
        .store()
        .push_password_entry(&session.user_account.username, entry)
        .await?;
    info!(username = %session.user_account.username, "Password reset finished");

    // The reset is done; widen the session back to a regular one so the
    // caller does not have to sign in again.
    let session = authorizer
        .sessions()
        .set_session_type(session, SessionType::REGULAR)
        .await?;

    Ok(FinishPasswordResetResponse {
        session_id: session.id,
    })
}

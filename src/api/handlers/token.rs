use axum::{
    Extension,
    http::HeaderMap,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::types::TokenResponse;
use crate::auth::error::AuthError;
use crate::auth::pipeline::{Authorizer, MemberRequirement};
use crate::auth::session::SessionType;

#[utoipa::path(
    get,
    path = "/api/token",
    responses(
        (status = 200, description = "A fresh single-use request token", body = TokenResponse),
        (status = 400, description = "Missing or invalid session", body = String)
    ),
    tag = "auth"
)]
pub async fn token(
    Extension(authorizer): Extension<Arc<Authorizer>>,
    headers: HeaderMap,
) -> Response {
    match issue(&authorizer, &headers).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn issue(authorizer: &Authorizer, headers: &HeaderMap) -> Result<TokenResponse, AuthError> {
    // Password-reset sessions need tokens too: finishing the reset is itself
    // a token-protected mutation.
    let context = authorizer
        .authorize(
            headers,
            SessionType::REGULAR | SessionType::PASSWORD_RESET,
            MemberRequirement::Required,
        )
        .await?;
    let session = context.session.ok_or(AuthError::MissingAuthorization)?;
    let token = authorizer.tokens().issue(session.user_account).await?;
    Ok(TokenResponse { token })
}

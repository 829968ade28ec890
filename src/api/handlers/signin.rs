use axum::{
    Extension,
    http::{HeaderMap, StatusCode, header::HOST},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::info;

use super::types::{SigninRequest, SigninResponse, SigninResult};
use crate::api::recaptcha;
use crate::auth::error::AuthError;
use crate::auth::password::{self, PasswordResult};
use crate::auth::pipeline::Authorizer;
use crate::auth::session::SessionType;

#[utoipa::path(
    post,
    path = "/api/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Signed in; a password_expired result carries a reset-only session", body = SigninResponse),
        (status = 400, description = "Missing payload or incorrect credentials", body = String),
        (status = 404, description = "Hostname does not resolve to an account", body = String)
    ),
    tag = "auth"
)]
pub async fn signin(
    Extension(authorizer): Extension<Arc<Authorizer>>,
    headers: HeaderMap,
    payload: Option<Json<SigninRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "missing credentials").into_response();
    };
    match try_signin(&authorizer, &headers, &payload).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn try_signin(
    authorizer: &Authorizer,
    headers: &HeaderMap,
    payload: &SigninRequest,
) -> Result<SigninResponse, AuthError> {
    let hostname = headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::InvalidHostname)?;
    authorizer.resolve_account(hostname).await?;

    if let Some(secret) = authorizer.config().recaptcha_secret() {
        let response = payload.recaptcha.as_deref().unwrap_or_default();
        if !recaptcha::verify(secret, response).await? {
            return Err(AuthError::IncorrectCredentials);
        }
    }

    // Unknown usernames and wrong passwords produce the same error.
    let user = authorizer
        .store()
        .find_user_by_username(&payload.username)
        .await?
        .ok_or(AuthError::IncorrectCredentials)?;

    match password::check_password(&user, &payload.password) {
        PasswordResult::Invalid => Err(AuthError::IncorrectCredentials),
        PasswordResult::Valid => {
            let session = authorizer.sessions().create(user).await?;
            info!(username = %payload.username, "Signed in");
            Ok(SigninResponse {
                result: SigninResult::Success,
                session_id: session.id,
            })
        }
        PasswordResult::ValidExpired => {
            let session = authorizer.sessions().create(user).await?;
            let session = authorizer
                .sessions()
                .set_session_type(session, SessionType::PASSWORD_RESET)
                .await?;
            info!(username = %payload.username, "Signed in with an expired password");
            Ok(SigninResponse {
                result: SigninResult::PasswordExpired,
                session_id: session.id,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::signin;
    use crate::auth::pipeline::Authorizer;
    use crate::config::{AppConfig, Environment};
    use crate::store::MemoryStore;
    use anyhow::Result;
    use axum::Extension;
    use axum::http::{HeaderMap, StatusCode};
    use std::sync::Arc;

    #[tokio::test]
    async fn missing_payload_is_a_bad_request() -> Result<()> {
        let authorizer = Arc::new(Authorizer::new(
            Arc::new(MemoryStore::new()),
            AppConfig::new(Environment::Production),
        ));
        let response = signin(Extension(authorizer), HeaderMap::new(), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}

//! OpenAPI document for the API, served at `/api/docs/openapi.json`.

use axum::response::{IntoResponse, Json};
use utoipa::OpenApi;

use super::handlers;
use crate::auth::member::{DutyPosition, Member, MemberReference};
use crate::auth::permission::{ManageEvent, PermissionLevel, PermissionSet};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "capunit-auth",
        description = "Session, token, and permission service for CAP unit accounts"
    ),
    paths(
        handlers::health::health,
        handlers::signin::signin,
        handlers::token::token,
        handlers::me::me,
        handlers::password_reset::finish_password_reset,
        handlers::su::su,
    ),
    components(schemas(
        handlers::health::Health,
        handlers::types::SigninRequest,
        handlers::types::SigninResult,
        handlers::types::SigninResponse,
        handlers::types::TokenResponse,
        handlers::types::MeResponse,
        handlers::types::FinishPasswordResetRequest,
        handlers::types::FinishPasswordResetResponse,
        handlers::types::SuRequest,
        Member,
        MemberReference,
        DutyPosition,
        PermissionSet,
        ManageEvent,
        PermissionLevel,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "Sessions, tokens, and impersonation")
    )
)]
pub struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub async fn docs() -> impl IntoResponse {
    Json(openapi())
}

#[cfg(test)]
mod tests {
    use super::openapi;
    use anyhow::Result;

    #[test]
    fn document_lists_every_route() -> Result<()> {
        let doc = serde_json::to_value(openapi())?;
        for path in [
            "/health",
            "/api/signin",
            "/api/token",
            "/api/me",
            "/api/finishpasswordreset",
            "/api/su",
        ] {
            assert!(doc["paths"][path].is_object(), "missing path: {path}");
        }
        Ok(())
    }
}

use axum::{
    Extension,
    http::HeaderMap,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::types::MeResponse;
use crate::auth::error::AuthError;
use crate::auth::pipeline::{Authorizer, MemberRequirement};
use crate::auth::session::SessionType;

#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Resolved account, member, and permissions for the caller", body = MeResponse),
        (status = 404, description = "Hostname does not resolve to an account", body = String)
    ),
    tag = "auth"
)]
pub async fn me(Extension(authorizer): Extension<Arc<Authorizer>>, headers: HeaderMap) -> Response {
    match resolve(&authorizer, &headers).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn resolve(authorizer: &Authorizer, headers: &HeaderMap) -> Result<MeResponse, AuthError> {
    let context = authorizer
        .authorize(headers, SessionType::REGULAR, MemberRequirement::Optional)
        .await?;
    Ok(MeResponse {
        account_id: context.account.id,
        member: context.member,
        permissions: context.permissions,
    })
}

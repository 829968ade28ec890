use axum::{
    Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::warn;

use super::types::SuRequest;
use crate::auth::error::AuthError;
use crate::auth::permission;
use crate::auth::pipeline::{Authorizer, MemberRequirement};
use crate::auth::session::SessionType;

#[utoipa::path(
    post,
    path = "/api/su",
    request_body = SuRequest,
    responses(
        (status = 204, description = "Session now acts as the target member"),
        (status = 403, description = "Caller is not a superuser", body = String),
        (status = 404, description = "Target member has no credential", body = String)
    ),
    tag = "auth"
)]
pub async fn su(
    Extension(authorizer): Extension<Arc<Authorizer>>,
    headers: HeaderMap,
    payload: Option<Json<SuRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "missing payload").into_response();
    };
    match impersonate(&authorizer, &headers, &payload).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

async fn impersonate(
    authorizer: &Authorizer,
    headers: &HeaderMap,
    payload: &SuRequest,
) -> Result<(), AuthError> {
    let context = authorizer
        .authorize(headers, SessionType::REGULAR, MemberRequirement::Required)
        .await?;
    let session = context.session.ok_or(AuthError::MissingAuthorization)?;

    if !permission::is_superuser(&session.user_account.member) {
        warn!(
            caller = %session.user_account.member.key(),
            "Impersonation attempt by a non-superuser"
        );
        return Err(AuthError::Forbidden);
    }

    authorizer
        .consume_request_token(&payload.token, &session)
        .await?;

    let target = authorizer
        .store()
        .find_user_by_member(&payload.member)
        .await?
        .ok_or(AuthError::MemberNotFound)?;

    warn!(
        caller = %session.user_account.member.key(),
        target = %payload.member.key(),
        "Superuser impersonation"
    );
    authorizer.sessions().impersonate(session, target).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::su;
    use crate::api::handlers::types::SuRequest;
    use crate::auth::account::{Account, AccountType};
    use crate::auth::credential::UserAccountInfo;
    use crate::auth::member::MemberReference;
    use crate::auth::pipeline::Authorizer;
    use crate::config::{AppConfig, Environment};
    use crate::store::MemoryStore;
    use anyhow::Result;
    use axum::Extension;
    use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION, header::HOST};
    use std::sync::Arc;

    fn user(username: &str, capid: u32) -> UserAccountInfo {
        UserAccountInfo {
            username: username.to_string(),
            member: MemberReference::CapNhq { id: capid },
            password_history: Vec::new(),
        }
    }

    async fn seeded() -> Result<Arc<Authorizer>> {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_account(Account {
                id: "md089".to_string(),
                aliases: Vec::new(),
                kind: AccountType::Squadron {
                    main_org: 916,
                    org_ids: vec![916],
                },
            })
            .await;
        store.insert_user(user("admin", 542_488)).await;
        store.insert_user(user("jdoe", 911_111)).await;
        Ok(Arc::new(Authorizer::new(
            store,
            AppConfig::new(Environment::Production),
        )))
    }

    fn headers(session_id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, "md089.capunit.com".parse().expect("valid host"));
        headers.insert(AUTHORIZATION, session_id.parse().expect("valid session"));
        headers
    }

    #[tokio::test]
    async fn non_superuser_is_forbidden() -> Result<()> {
        let authorizer = seeded().await?;
        let session = authorizer.sessions().create(user("jdoe", 911_111)).await?;
        let token = authorizer.tokens().issue(user("jdoe", 911_111)).await?;

        let response = su(
            Extension(authorizer.clone()),
            headers(&session.id),
            Some(axum::Json(SuRequest {
                token,
                member: MemberReference::CapNhq { id: 542_488 },
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // The session still acts as the original member.
        let session = authorizer.sessions().validate(&session.id).await?;
        assert_eq!(session.user_account.username, "jdoe");
        Ok(())
    }

    #[tokio::test]
    async fn superuser_rewrites_the_session_in_place() -> Result<()> {
        let authorizer = seeded().await?;
        let session = authorizer.sessions().create(user("admin", 542_488)).await?;
        let token = authorizer.tokens().issue(user("admin", 542_488)).await?;

        let response = su(
            Extension(authorizer.clone()),
            headers(&session.id),
            Some(axum::Json(SuRequest {
                token,
                member: MemberReference::CapNhq { id: 911_111 },
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        // Same bearer id, target credential.
        let rewritten = authorizer.sessions().validate(&session.id).await?;
        assert_eq!(rewritten.id, session.id);
        assert_eq!(rewritten.user_account.username, "jdoe");
        Ok(())
    }

    #[tokio::test]
    async fn unknown_target_is_not_found() -> Result<()> {
        let authorizer = seeded().await?;
        let session = authorizer.sessions().create(user("admin", 542_488)).await?;
        let token = authorizer.tokens().issue(user("admin", 542_488)).await?;

        let response = su(
            Extension(authorizer.clone()),
            headers(&session.id),
            Some(axum::Json(SuRequest {
                token,
                member: MemberReference::CapNhq { id: 999_999 },
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }
}

//! Request authorization pipeline.
//!
//! Every handler funnels through [`Authorizer::authorize`]: resolve the
//! account from the `Host` header, validate the bearer session id from the
//! `Authorization` header, hydrate the member record, resolve permissions,
//! then gate on the endpoint's accepted session-type mask. The result is a
//! [`RequestContext`] the handler can trust without re-checking anything.

use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, HOST};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use super::account::{Account, account_id_for_hostname};
use super::error::AuthError;
use super::member::Member;
use super::permission::{self, PermissionSet};
use super::session::{SessionManager, SessionType, UserSession};
use super::token::TokenManager;
use crate::config::AppConfig;
use crate::store::Store;

/// Whether an endpoint tolerates anonymous requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberRequirement {
    Required,
    Optional,
}

/// Everything a handler needs to know about the caller. An anonymous context
/// (no session, no member) still carries the resolved account and an all-NONE
/// permission set.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub account: Account,
    pub session: Option<UserSession>,
    pub member: Option<Member>,
    pub permissions: PermissionSet,
}

pub struct Authorizer {
    store: Arc<dyn Store>,
    config: AppConfig,
    sessions: SessionManager,
    tokens: TokenManager,
}

impl Authorizer {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        let sessions = SessionManager::new(store.clone(), config.effective_session_age_seconds());
        let tokens = TokenManager::new(store.clone(), config.token_age_seconds());
        Self {
            store,
            config,
            sessions,
            tokens,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Resolve the single account a hostname names.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidHostname`] if no segment rule applies and
    /// [`AuthError::AccountNotFound`] unless exactly one account matches.
    pub async fn resolve_account(&self, hostname: &str) -> Result<Account, AuthError> {
        let account_id = account_id_for_hostname(hostname, &self.config)?;
        let mut matches = self.store.find_accounts(&account_id).await?;
        if matches.len() != 1 {
            return Err(AuthError::AccountNotFound);
        }
        Ok(matches.remove(0))
    }

    /// Authorize a request against an endpoint's accepted session-type mask.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingAuthorization`] when a required header is
    /// absent, [`AuthError::InvalidSessionId`] when a required session does
    /// not validate, and [`AuthError::SessionTypeMismatch`] when the session
    /// validates but its type is outside `accepted`.
    pub async fn authorize(
        &self,
        headers: &HeaderMap,
        accepted: SessionType,
        requirement: MemberRequirement,
    ) -> Result<RequestContext, AuthError> {
        let hostname = headers
            .get(HOST)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::InvalidHostname)?;
        let account = self.resolve_account(hostname).await?;

        let session_id = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        let Some(session_id) = session_id else {
            return match requirement {
                MemberRequirement::Required => Err(AuthError::MissingAuthorization),
                MemberRequirement::Optional => Ok(Self::anonymous(account)),
            };
        };

        let session = match self.sessions.validate(session_id).await {
            Ok(session) => session,
            // Optional endpoints degrade a stale or bogus id to anonymous
            // instead of failing the whole request.
            Err(AuthError::InvalidSessionId) if requirement == MemberRequirement::Optional => {
                return Ok(Self::anonymous(account));
            }
            Err(err) => return Err(err),
        };

        let reference = &session.user_account.member;
        let member = match self.store.find_member(reference).await? {
            Some(member) => member,
            None => Member::bare(reference.clone()),
        };
        let stored = self.store.find_permissions(&account.id, reference).await?;
        let permissions = permission::resolve(&member, &account, stored.as_ref());

        if !session.session_type.intersects(accepted) {
            return Err(AuthError::SessionTypeMismatch);
        }

        Ok(RequestContext {
            account,
            session: Some(session),
            member: Some(member),
            permissions,
        })
    }

    /// Spend a single-use request token on behalf of a validated session.
    ///
    /// The token must have been minted for the same credential the session
    /// carries; a token leaked across sessions is worthless.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] when the token cannot be consumed
    /// or was bound to a different member.
    pub async fn consume_request_token(
        &self,
        presented: &str,
        session: &UserSession,
    ) -> Result<(), AuthError> {
        let bound = self.tokens.consume(presented).await?;
        let same_member: bool = bound
            .member
            .key()
            .as_bytes()
            .ct_eq(session.user_account.member.key().as_bytes())
            .into();
        if !same_member {
            return Err(AuthError::InvalidToken);
        }
        Ok(())
    }

    fn anonymous(account: Account) -> RequestContext {
        RequestContext {
            account,
            session: None,
            member: None,
            permissions: PermissionSet::NONE,
        }
    }
}

//! Session records and the session manager.
//!
//! A session is a server-side record keyed by a 64-byte random bearer id.
//! Expiry is lazy and sliding: stale rows are purged inline before every
//! validation, and a successful validation refreshes the creation timestamp.

use anyhow::{Context, Result};
use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use std::ops::BitOr;
use std::sync::Arc;
use utoipa::ToSchema;

use super::credential::UserAccountInfo;
use super::error::AuthError;
use super::unix_now;
use crate::store::Store;

pub const SESSION_ID_BYTES: usize = 64;

/// Bitmask of session kinds an endpoint accepts. A session passes a gate
/// when its type intersects the declared mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct SessionType(u32);

impl SessionType {
    pub const REGULAR: Self = Self(1);
    pub const PASSWORD_RESET: Self = Self(2);

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for SessionType {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A session row. The credential is embedded so validation resolves straight
/// to a member without a second lookup.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UserSession {
    pub id: String,
    pub created: i64,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    #[serde(rename = "userAccount")]
    pub user_account: UserAccountInfo,
}

/// Generate a 64-byte random session id, hex encoded (128 characters).
///
/// # Errors
///
/// Returns an error if the system randomness source fails.
pub fn generate_session_id() -> Result<String> {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session id")?;
    Ok(hex::encode(bytes))
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn Store>,
    session_age_seconds: i64,
}

impl SessionManager {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, session_age_seconds: i64) -> Self {
        Self {
            store,
            session_age_seconds,
        }
    }

    /// Create a REGULAR session for a signed-in credential.
    ///
    /// # Errors
    ///
    /// Returns an error if id generation or the insert fails.
    pub async fn create(&self, user_account: UserAccountInfo) -> Result<UserSession, AuthError> {
        let session = UserSession {
            id: generate_session_id()?,
            created: unix_now(),
            session_type: SessionType::REGULAR,
            user_account,
        };
        self.store.insert_session(&session).await?;
        Ok(session)
    }

    /// Validate a presented session id.
    ///
    /// Purges expired rows, requires exactly one row with this id, then
    /// refreshes `created` so the expiry window slides forward.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidSessionId`] if the id does not resolve to
    /// exactly one live row.
    pub async fn validate(&self, id: &str) -> Result<UserSession, AuthError> {
        let now = unix_now();
        self.store
            .purge_sessions_created_before(now - self.session_age_seconds)
            .await?;

        let mut matches = self.store.find_sessions(id).await?;
        if matches.len() != 1 {
            return Err(AuthError::InvalidSessionId);
        }
        self.store.touch_session(id, now).await?;

        let mut session = matches.remove(0);
        session.created = now;
        Ok(session)
    }

    /// Persist a new session type, e.g. restricting a fresh session to
    /// PASSWORD_RESET after an expired-password signin.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn set_session_type(
        &self,
        mut session: UserSession,
        session_type: SessionType,
    ) -> Result<UserSession, AuthError> {
        self.store
            .update_session_type(&session.id, session_type)
            .await?;
        session.session_type = session_type;
        Ok(session)
    }

    /// Rewrite the embedded credential of an existing session in place: same
    /// bearer id, different effective identity. Callers must have already
    /// checked the superuser predicate.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn impersonate(
        &self,
        mut session: UserSession,
        target: UserAccountInfo,
    ) -> Result<UserSession, AuthError> {
        self.store
            .update_session_account(&session.id, &target)
            .await?;
        session.user_account = target;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionManager, SessionType, UserSession, generate_session_id};
    use crate::auth::credential::UserAccountInfo;
    use crate::auth::error::AuthError;
    use crate::auth::member::MemberReference;
    use crate::auth::unix_now;
    use crate::store::{MemoryStore, Store};
    use anyhow::Result;
    use std::sync::Arc;

    fn user(username: &str, capid: u32) -> UserAccountInfo {
        UserAccountInfo {
            username: username.to_string(),
            member: MemberReference::CapNhq { id: capid },
            password_history: Vec::new(),
        }
    }

    fn manager(store: &Arc<MemoryStore>) -> SessionManager {
        SessionManager::new(store.clone(), 600)
    }

    #[test]
    fn session_type_masks() {
        let both = SessionType::REGULAR | SessionType::PASSWORD_RESET;
        assert!(both.intersects(SessionType::REGULAR));
        assert!(both.intersects(SessionType::PASSWORD_RESET));
        assert!(!SessionType::REGULAR.intersects(SessionType::PASSWORD_RESET));
        assert_eq!(SessionType::REGULAR.bits(), 1);
        assert_eq!(SessionType::from_bits(3), both);
    }

    #[test]
    fn session_ids_are_128_hex_chars() -> Result<()> {
        let id = generate_session_id()?;
        assert_eq!(id.len(), 128);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        Ok(())
    }

    #[tokio::test]
    async fn create_then_validate_slides_the_window() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let sessions = manager(&store);

        let session = sessions.create(user("jdoe", 911_111)).await?;
        assert_eq!(session.session_type, SessionType::REGULAR);

        let validated = sessions.validate(&session.id).await?;
        assert!(validated.created >= session.created);

        // Immediately repeated validation keeps succeeding.
        let again = sessions.validate(&session.id).await?;
        assert_eq!(again.id, session.id);
        Ok(())
    }

    #[tokio::test]
    async fn expired_sessions_are_purged_on_validation() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let sessions = manager(&store);

        let stale = UserSession {
            id: generate_session_id()?,
            created: unix_now() - 10_000,
            session_type: SessionType::REGULAR,
            user_account: user("jdoe", 911_111),
        };
        store.insert_session(&stale).await?;

        let err = sessions.validate(&stale.id).await.err();
        assert!(matches!(err, Some(AuthError::InvalidSessionId)));
        assert!(store.find_sessions(&stale.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn unknown_id_is_invalid() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let sessions = manager(&store);
        let err = sessions.validate("does-not-exist").await.err();
        assert!(matches!(err, Some(AuthError::InvalidSessionId)));
        Ok(())
    }

    #[tokio::test]
    async fn set_session_type_persists() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let sessions = manager(&store);

        let session = sessions.create(user("jdoe", 911_111)).await?;
        let restricted = sessions
            .set_session_type(session, SessionType::PASSWORD_RESET)
            .await?;
        assert_eq!(restricted.session_type, SessionType::PASSWORD_RESET);

        let validated = sessions.validate(&restricted.id).await?;
        assert_eq!(validated.session_type, SessionType::PASSWORD_RESET);
        Ok(())
    }

    #[tokio::test]
    async fn impersonation_keeps_the_bearer_id() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let sessions = manager(&store);

        let session = sessions.create(user("admin", 542_488)).await?;
        let id = session.id.clone();
        let rewritten = sessions.impersonate(session, user("jdoe", 911_111)).await?;
        assert_eq!(rewritten.id, id);
        assert_eq!(rewritten.user_account.username, "jdoe");

        let validated = sessions.validate(&id).await?;
        assert_eq!(validated.user_account.username, "jdoe");
        Ok(())
    }
}

//! Single-use request tokens.
//!
//! Tokens defend mutating endpoints against replay and cross-site request
//! forgery: minted once by a session-gated endpoint, spent exactly once, and
//! expired after tens of seconds. They are layered on top of sessions, never
//! a replacement for one.

use anyhow::{Context, Result};
use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use super::credential::UserAccountInfo;
use super::error::AuthError;
use super::unix_now;
use crate::store::Store;

pub const TOKEN_BYTES: usize = 64;

/// A minted token bound to the issuing credential.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token: String,
    pub created: i64,
    pub member: UserAccountInfo,
}

fn generate_token() -> Result<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate request token")?;
    Ok(hex::encode(bytes))
}

#[derive(Clone)]
pub struct TokenManager {
    store: Arc<dyn Store>,
    token_age_seconds: i64,
}

impl TokenManager {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, token_age_seconds: i64) -> Self {
        Self {
            store,
            token_age_seconds,
        }
    }

    /// Mint a token for an already-validated session's credential.
    ///
    /// # Errors
    ///
    /// Returns an error if token generation or the insert fails.
    pub async fn issue(&self, member: UserAccountInfo) -> Result<String, AuthError> {
        let record = TokenRecord {
            token: generate_token()?,
            created: unix_now(),
            member,
        };
        self.store.insert_token(&record).await?;
        Ok(record.token)
    }

    /// Consume a presented token and return the bound credential.
    ///
    /// The matching row is deleted the moment it is read, regardless of the
    /// final outcome, so a token can never be spent twice. The deleted row's
    /// stored value is then compared against the input in constant time.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] if the token is missing, expired,
    /// already consumed, ambiguous, or not an exact match.
    pub async fn consume(&self, presented: &str) -> Result<UserAccountInfo, AuthError> {
        let now = unix_now();
        self.store
            .purge_tokens_created_before(now - self.token_age_seconds)
            .await?;

        let mut removed = self.store.take_tokens(presented).await?;
        if removed.len() != 1 {
            return Err(AuthError::InvalidToken);
        }
        let record = removed.remove(0);
        let matches: bool = record
            .token
            .as_bytes()
            .ct_eq(presented.as_bytes())
            .into();
        if !matches {
            return Err(AuthError::InvalidToken);
        }
        Ok(record.member)
    }
}

#[cfg(test)]
mod tests {
    use super::{TokenManager, TokenRecord, generate_token};
    use crate::auth::credential::UserAccountInfo;
    use crate::auth::error::AuthError;
    use crate::auth::member::MemberReference;
    use crate::auth::unix_now;
    use crate::store::{MemoryStore, Store};
    use anyhow::Result;
    use std::sync::Arc;

    fn user() -> UserAccountInfo {
        UserAccountInfo {
            username: "jdoe".to_string(),
            member: MemberReference::CapNhq { id: 911_111 },
            password_history: Vec::new(),
        }
    }

    #[tokio::test]
    async fn issue_then_consume_once() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let tokens = TokenManager::new(store, 20);

        let token = tokens.issue(user()).await?;
        assert_eq!(token.len(), 128);

        let credential = tokens.consume(&token).await?;
        assert_eq!(credential.username, "jdoe");

        // Single-use: a second consume with the same value fails.
        let err = tokens.consume(&token).await.err();
        assert!(matches!(err, Some(AuthError::InvalidToken)));
        Ok(())
    }

    #[tokio::test]
    async fn expired_tokens_are_purged_before_lookup() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let tokens = TokenManager::new(store.clone(), 20);

        let record = TokenRecord {
            token: generate_token()?,
            created: unix_now() - 60,
            member: user(),
        };
        store.insert_token(&record).await?;

        let err = tokens.consume(&record.token).await.err();
        assert!(matches!(err, Some(AuthError::InvalidToken)));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_token_fails() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let tokens = TokenManager::new(store, 20);
        let err = tokens.consume("deadbeef").await.err();
        assert!(matches!(err, Some(AuthError::InvalidToken)));
        Ok(())
    }
}

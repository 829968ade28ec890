//! Persistence seam for the authorization core.
//!
//! The managers only see the [`Store`] trait; the server wires in the
//! Postgres implementation and tests run against the in-memory one. Every
//! mutation is scoped by a unique key (session id, token value, username, or
//! account+member), so concurrent requests for different keys never contend
//! and same-key operations rely on the backend's single-row atomicity.

use anyhow::Result;
use async_trait::async_trait;

use crate::auth::account::Account;
use crate::auth::credential::{PasswordEntry, UserAccountInfo};
use crate::auth::member::{Member, MemberReference};
use crate::auth::permission::PermissionSet;
use crate::auth::session::{SessionType, UserSession};
use crate::auth::token::TokenRecord;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Backend liveness check for the health endpoint.
    async fn ping(&self) -> Result<()>;

    /// All accounts whose id or alias set matches `id_or_alias`.
    async fn find_accounts(&self, id_or_alias: &str) -> Result<Vec<Account>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserAccountInfo>>;

    async fn find_user_by_member(&self, member: &MemberReference)
    -> Result<Option<UserAccountInfo>>;

    /// Prepend a new active password entry; history is retained, never
    /// truncated.
    async fn push_password_entry(&self, username: &str, entry: PasswordEntry) -> Result<()>;

    async fn insert_session(&self, session: &UserSession) -> Result<()>;

    async fn purge_sessions_created_before(&self, cutoff: i64) -> Result<u64>;

    async fn find_sessions(&self, id: &str) -> Result<Vec<UserSession>>;

    /// Refresh a session's creation timestamp (sliding expiration).
    async fn touch_session(&self, id: &str, created: i64) -> Result<()>;

    async fn update_session_type(&self, id: &str, session_type: SessionType) -> Result<()>;

    /// Rewrite the embedded credential in place (impersonation).
    async fn update_session_account(&self, id: &str, user_account: &UserAccountInfo)
    -> Result<()>;

    async fn insert_token(&self, record: &TokenRecord) -> Result<()>;

    async fn purge_tokens_created_before(&self, cutoff: i64) -> Result<u64>;

    /// Delete and return every row matching `token`. Deletion happens on
    /// read so a token can only ever be spent once.
    async fn take_tokens(&self, token: &str) -> Result<Vec<TokenRecord>>;

    async fn find_member(&self, reference: &MemberReference) -> Result<Option<Member>>;

    /// Stored per-(account, member) permission overrides, if any.
    async fn find_permissions(
        &self,
        account_id: &str,
        member: &MemberReference,
    ) -> Result<Option<PermissionSet>>;
}

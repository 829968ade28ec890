//! In-memory store for tests and local runs.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::Store;
use crate::auth::account::Account;
use crate::auth::credential::{PasswordEntry, UserAccountInfo};
use crate::auth::member::{Member, MemberReference};
use crate::auth::permission::PermissionSet;
use crate::auth::session::{SessionType, UserSession};
use crate::auth::token::TokenRecord;

#[derive(Default)]
struct Collections {
    accounts: Vec<Account>,
    users: HashMap<String, UserAccountInfo>,
    sessions: HashMap<String, UserSession>,
    tokens: HashMap<String, TokenRecord>,
    members: HashMap<String, Member>,
    permissions: HashMap<(String, String), PermissionSet>,
}

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_account(&self, account: Account) {
        self.collections.write().await.accounts.push(account);
    }

    pub async fn insert_user(&self, user: UserAccountInfo) {
        let mut collections = self.collections.write().await;
        collections.users.insert(user.username.clone(), user);
    }

    pub async fn insert_member(&self, member: Member) {
        let mut collections = self.collections.write().await;
        collections.members.insert(member.reference.key(), member);
    }

    pub async fn set_permissions(
        &self,
        account_id: &str,
        member: &MemberReference,
        permissions: PermissionSet,
    ) {
        let mut collections = self.collections.write().await;
        collections
            .permissions
            .insert((account_id.to_string(), member.key()), permissions);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn find_accounts(&self, id_or_alias: &str) -> Result<Vec<Account>> {
        let collections = self.collections.read().await;
        Ok(collections
            .accounts
            .iter()
            .filter(|account| account.matches(id_or_alias))
            .cloned()
            .collect())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserAccountInfo>> {
        let collections = self.collections.read().await;
        Ok(collections.users.get(username).cloned())
    }

    async fn find_user_by_member(
        &self,
        member: &MemberReference,
    ) -> Result<Option<UserAccountInfo>> {
        let collections = self.collections.read().await;
        Ok(collections
            .users
            .values()
            .find(|user| user.member == *member)
            .cloned())
    }

    async fn push_password_entry(&self, username: &str, entry: PasswordEntry) -> Result<()> {
        let mut collections = self.collections.write().await;
        if let Some(user) = collections.users.get_mut(username) {
            user.password_history.insert(0, entry);
        }
        Ok(())
    }

    async fn insert_session(&self, session: &UserSession) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .sessions
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn purge_sessions_created_before(&self, cutoff: i64) -> Result<u64> {
        let mut collections = self.collections.write().await;
        let before = collections.sessions.len();
        collections
            .sessions
            .retain(|_, session| session.created >= cutoff);
        Ok((before - collections.sessions.len()) as u64)
    }

    async fn find_sessions(&self, id: &str) -> Result<Vec<UserSession>> {
        let collections = self.collections.read().await;
        Ok(collections.sessions.get(id).cloned().into_iter().collect())
    }

    async fn touch_session(&self, id: &str, created: i64) -> Result<()> {
        let mut collections = self.collections.write().await;
        if let Some(session) = collections.sessions.get_mut(id) {
            session.created = created;
        }
        Ok(())
    }

    async fn update_session_type(&self, id: &str, session_type: SessionType) -> Result<()> {
        let mut collections = self.collections.write().await;
        if let Some(session) = collections.sessions.get_mut(id) {
            session.session_type = session_type;
        }
        Ok(())
    }

    async fn update_session_account(
        &self,
        id: &str,
        user_account: &UserAccountInfo,
    ) -> Result<()> {
        let mut collections = self.collections.write().await;
        if let Some(session) = collections.sessions.get_mut(id) {
            session.user_account = user_account.clone();
        }
        Ok(())
    }

    async fn insert_token(&self, record: &TokenRecord) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .tokens
            .insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn purge_tokens_created_before(&self, cutoff: i64) -> Result<u64> {
        let mut collections = self.collections.write().await;
        let before = collections.tokens.len();
        collections
            .tokens
            .retain(|_, record| record.created >= cutoff);
        Ok((before - collections.tokens.len()) as u64)
    }

    async fn take_tokens(&self, token: &str) -> Result<Vec<TokenRecord>> {
        let mut collections = self.collections.write().await;
        Ok(collections.tokens.remove(token).into_iter().collect())
    }

    async fn find_member(&self, reference: &MemberReference) -> Result<Option<Member>> {
        let collections = self.collections.read().await;
        Ok(collections.members.get(&reference.key()).cloned())
    }

    async fn find_permissions(
        &self,
        account_id: &str,
        member: &MemberReference,
    ) -> Result<Option<PermissionSet>> {
        let collections = self.collections.read().await;
        Ok(collections
            .permissions
            .get(&(account_id.to_string(), member.key()))
            .copied())
    }
}

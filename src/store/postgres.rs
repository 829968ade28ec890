//! Postgres-backed store.
//!
//! Rows are document-flavored: each collection keeps its lookup keys as
//! plain columns and the full record as a JSONB document, mirroring the
//! document-store shape the data originally lived in. See `schema.sql`.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::{Instrument, info_span};

use super::Store;
use crate::auth::account::Account;
use crate::auth::credential::{PasswordEntry, UserAccountInfo};
use crate::auth::member::{Member, MemberReference};
use crate::auth::permission::PermissionSet;
use crate::auth::session::{SessionType, UserSession};
use crate::auth::token::TokenRecord;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with the pool settings the server runs with.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }
}

fn query_span(operation: &'static str, statement: &'static str) -> tracing::Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<()> {
        use sqlx::Connection;
        let span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("failed to acquire database connection")?;
        conn.ping()
            .instrument(span)
            .await
            .context("failed to ping database")
    }

    async fn find_accounts(&self, id_or_alias: &str) -> Result<Vec<Account>> {
        let query = r"
            SELECT doc FROM accounts
            WHERE id = $1 OR jsonb_exists(doc->'aliases', $1)
        ";
        let rows = sqlx::query(query)
            .bind(id_or_alias)
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to look up accounts")?;
        rows.into_iter()
            .map(|row| Ok(row.get::<Json<Account>, _>("doc").0))
            .collect()
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserAccountInfo>> {
        let query = "SELECT doc FROM user_account_info WHERE username = $1";
        let row = sqlx::query(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to look up credential by username")?;
        Ok(row.map(|row| row.get::<Json<UserAccountInfo>, _>("doc").0))
    }

    async fn find_user_by_member(
        &self,
        member: &MemberReference,
    ) -> Result<Option<UserAccountInfo>> {
        let query = "SELECT doc FROM user_account_info WHERE member_key = $1";
        let row = sqlx::query(query)
            .bind(member.key())
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to look up credential by member")?;
        Ok(row.map(|row| row.get::<Json<UserAccountInfo>, _>("doc").0))
    }

    async fn push_password_entry(&self, username: &str, entry: PasswordEntry) -> Result<()> {
        // New entries go to the front of the history array; index 0 is the
        // active password.
        let query = r"
            UPDATE user_account_info
            SET doc = jsonb_set(
                doc,
                '{passwordHistory}',
                $2::jsonb || COALESCE(doc->'passwordHistory', '[]'::jsonb)
            )
            WHERE username = $1
        ";
        let entry_array =
            serde_json::to_value(vec![entry]).context("failed to serialize password entry")?;
        sqlx::query(query)
            .bind(username)
            .bind(Json(entry_array))
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to append password entry")?;
        Ok(())
    }

    async fn insert_session(&self, session: &UserSession) -> Result<()> {
        let query = r"
            INSERT INTO sessions (id, created, session_type, user_account)
            VALUES ($1, $2, $3, $4)
        ";
        sqlx::query(query)
            .bind(&session.id)
            .bind(session.created)
            .bind(i64::from(session.session_type.bits()))
            .bind(Json(&session.user_account))
            .execute(&self.pool)
            .instrument(query_span("INSERT", query))
            .await
            .context("failed to insert session")?;
        Ok(())
    }

    async fn purge_sessions_created_before(&self, cutoff: i64) -> Result<u64> {
        let query = "DELETE FROM sessions WHERE created < $1";
        let result = sqlx::query(query)
            .bind(cutoff)
            .execute(&self.pool)
            .instrument(query_span("DELETE", query))
            .await
            .context("failed to purge expired sessions")?;
        Ok(result.rows_affected())
    }

    async fn find_sessions(&self, id: &str) -> Result<Vec<UserSession>> {
        let query = "SELECT id, created, session_type, user_account FROM sessions WHERE id = $1";
        let rows = sqlx::query(query)
            .bind(id)
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to look up session")?;
        rows.into_iter()
            .map(|row| {
                let bits = u32::try_from(row.get::<i64, _>("session_type"))
                    .map_err(|_| anyhow!("stored session type out of range"))?;
                Ok(UserSession {
                    id: row.get("id"),
                    created: row.get("created"),
                    session_type: SessionType::from_bits(bits),
                    user_account: row.get::<Json<UserAccountInfo>, _>("user_account").0,
                })
            })
            .collect()
    }

    async fn touch_session(&self, id: &str, created: i64) -> Result<()> {
        let query = "UPDATE sessions SET created = $2 WHERE id = $1";
        sqlx::query(query)
            .bind(id)
            .bind(created)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to refresh session")?;
        Ok(())
    }

    async fn update_session_type(&self, id: &str, session_type: SessionType) -> Result<()> {
        let query = "UPDATE sessions SET session_type = $2 WHERE id = $1";
        sqlx::query(query)
            .bind(id)
            .bind(i64::from(session_type.bits()))
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to update session type")?;
        Ok(())
    }

    async fn update_session_account(
        &self,
        id: &str,
        user_account: &UserAccountInfo,
    ) -> Result<()> {
        let query = "UPDATE sessions SET user_account = $2 WHERE id = $1";
        sqlx::query(query)
            .bind(id)
            .bind(Json(user_account))
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to rewrite session credential")?;
        Ok(())
    }

    async fn insert_token(&self, record: &TokenRecord) -> Result<()> {
        let query = r"
            INSERT INTO tokens (token, created, member)
            VALUES ($1, $2, $3)
        ";
        sqlx::query(query)
            .bind(&record.token)
            .bind(record.created)
            .bind(Json(&record.member))
            .execute(&self.pool)
            .instrument(query_span("INSERT", query))
            .await
            .context("failed to insert token")?;
        Ok(())
    }

    async fn purge_tokens_created_before(&self, cutoff: i64) -> Result<u64> {
        let query = "DELETE FROM tokens WHERE created < $1";
        let result = sqlx::query(query)
            .bind(cutoff)
            .execute(&self.pool)
            .instrument(query_span("DELETE", query))
            .await
            .context("failed to purge expired tokens")?;
        Ok(result.rows_affected())
    }

    async fn take_tokens(&self, token: &str) -> Result<Vec<TokenRecord>> {
        // DELETE .. RETURNING makes the read-and-delete a single atomic
        // statement; the manager still re-verifies the returned value.
        let query = r"
            DELETE FROM tokens WHERE token = $1
            RETURNING token, created, member
        ";
        let rows = sqlx::query(query)
            .bind(token)
            .fetch_all(&self.pool)
            .instrument(query_span("DELETE", query))
            .await
            .context("failed to consume token")?;
        Ok(rows
            .into_iter()
            .map(|row| TokenRecord {
                token: row.get("token"),
                created: row.get("created"),
                member: row.get::<Json<UserAccountInfo>, _>("member").0,
            })
            .collect())
    }

    async fn find_member(&self, reference: &MemberReference) -> Result<Option<Member>> {
        let query = "SELECT doc FROM members WHERE member_key = $1";
        let row = sqlx::query(query)
            .bind(reference.key())
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to look up member")?;
        Ok(row.map(|row| row.get::<Json<Member>, _>("doc").0))
    }

    async fn find_permissions(
        &self,
        account_id: &str,
        member: &MemberReference,
    ) -> Result<Option<PermissionSet>> {
        let query = r"
            SELECT doc FROM unit_permissions
            WHERE account_id = $1 AND member_key = $2
        ";
        let row = sqlx::query(query)
            .bind(account_id)
            .bind(member.key())
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to look up permission overrides")?;
        Ok(row.map(|row| row.get::<Json<PermissionSet>, _>("doc").0))
    }
}

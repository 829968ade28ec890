//! Stored signin credentials.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::member::MemberReference;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PasswordAlgorithm {
    #[serde(rename = "pbkdf2sha512")]
    Pbkdf2Sha512,
}

/// One entry in a credential's password history. Salt and hash are hex.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PasswordEntry {
    pub algorithm: PasswordAlgorithm,
    pub salt: String,
    pub iterations: u32,
    pub hash: String,
    pub created: i64,
}

/// The username/member/password record authenticated at signin.
///
/// `password_history` is ordered most recent first; the first entry is the
/// active password. Older entries are retained to detect stale-but-matching
/// passwords and are never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserAccountInfo {
    pub username: String,
    pub member: MemberReference,
    #[serde(rename = "passwordHistory")]
    pub password_history: Vec<PasswordEntry>,
}

impl UserAccountInfo {
    /// The active password entry, if any password has ever been set.
    #[must_use]
    pub fn current_password(&self) -> Option<&PasswordEntry> {
        self.password_history.first()
    }
}

#[cfg(test)]
mod tests {
    use super::{PasswordAlgorithm, PasswordEntry, UserAccountInfo};
    use crate::auth::member::MemberReference;
    use anyhow::Result;

    fn entry(created: i64) -> PasswordEntry {
        PasswordEntry {
            algorithm: PasswordAlgorithm::Pbkdf2Sha512,
            salt: "00".to_string(),
            iterations: 1,
            hash: "ff".to_string(),
            created,
        }
    }

    #[test]
    fn current_password_is_the_first_entry() {
        let info = UserAccountInfo {
            username: "jdoe".to_string(),
            member: MemberReference::CapNhq { id: 911_111 },
            password_history: vec![entry(200), entry(100)],
        };
        assert_eq!(info.current_password().map(|e| e.created), Some(200));
    }

    #[test]
    fn empty_history_has_no_current_password() {
        let info = UserAccountInfo {
            username: "jdoe".to_string(),
            member: MemberReference::Null,
            password_history: Vec::new(),
        };
        assert!(info.current_password().is_none());
    }

    #[test]
    fn algorithm_serializes_to_its_wire_name() -> Result<()> {
        let value = serde_json::to_value(PasswordAlgorithm::Pbkdf2Sha512)?;
        assert_eq!(value, "pbkdf2sha512");
        Ok(())
    }
}

//! Password hashing and three-way verification.
//!
//! Verification distinguishes a wrong password from a right-but-stale one:
//! a submission matching only an older history entry yields `ValidExpired`,
//! which the signin flow turns into a password-reset-only session instead of
//! a rejection.

use anyhow::{Context, Result};
use pbkdf2::pbkdf2_hmac;
use rand::{RngCore, rngs::OsRng};
use sha2::Sha512;
use subtle::ConstantTimeEq;

use super::credential::{PasswordAlgorithm, PasswordEntry, UserAccountInfo};

const SALT_BYTES: usize = 32;
const HASH_BYTES: usize = 64;

/// Iteration count for newly created password entries. Stored per entry, so
/// raising it only affects passwords set afterwards.
pub const PASSWORD_ITERATIONS: u32 = 32_768;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PasswordResult {
    /// Matches the active password.
    Valid,
    /// Matches an older history entry; caller must force a reset.
    ValidExpired,
    Invalid,
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_BYTES] {
    let mut out = [0u8; HASH_BYTES];
    pbkdf2_hmac::<Sha512>(password.as_bytes(), salt, iterations, &mut out);
    out
}

/// Hash `password` with a fresh random salt into a new history entry.
///
/// # Errors
///
/// Returns an error if the system randomness source fails.
pub fn new_password_entry(password: &str, created: i64) -> Result<PasswordEntry> {
    let mut salt = [0u8; SALT_BYTES];
    OsRng
        .try_fill_bytes(&mut salt)
        .context("failed to generate password salt")?;
    let hash = derive(password, &salt, PASSWORD_ITERATIONS);
    Ok(PasswordEntry {
        algorithm: PasswordAlgorithm::Pbkdf2Sha512,
        salt: hex::encode(salt),
        iterations: PASSWORD_ITERATIONS,
        hash: hex::encode(hash),
        created,
    })
}

fn entry_matches(entry: &PasswordEntry, submitted: &str) -> bool {
    let Ok(salt) = hex::decode(&entry.salt) else {
        return false;
    };
    let Ok(stored) = hex::decode(&entry.hash) else {
        return false;
    };
    let PasswordAlgorithm::Pbkdf2Sha512 = entry.algorithm;
    let derived = derive(submitted, &salt, entry.iterations);
    derived.ct_eq(stored.as_slice()).into()
}

/// Check a submitted password against a credential's history.
#[must_use]
pub fn check_password(info: &UserAccountInfo, submitted: &str) -> PasswordResult {
    let Some(current) = info.current_password() else {
        return PasswordResult::Invalid;
    };
    if entry_matches(current, submitted) {
        return PasswordResult::Valid;
    }
    if info
        .password_history
        .iter()
        .skip(1)
        .any(|entry| entry_matches(entry, submitted))
    {
        return PasswordResult::ValidExpired;
    }
    PasswordResult::Invalid
}

#[cfg(test)]
mod tests {
    use super::{PasswordResult, check_password, new_password_entry};
    use crate::auth::credential::UserAccountInfo;
    use crate::auth::member::MemberReference;
    use anyhow::Result;

    fn account_with_history(passwords: &[&str]) -> Result<UserAccountInfo> {
        // Most recent first, matching the stored ordering.
        let mut history = Vec::new();
        for (index, password) in passwords.iter().enumerate() {
            let created = i64::try_from(passwords.len() - index)?;
            history.push(new_password_entry(password, created)?);
        }
        Ok(UserAccountInfo {
            username: "jdoe".to_string(),
            member: MemberReference::CapNhq { id: 911_111 },
            password_history: history,
        })
    }

    #[test]
    fn current_password_is_valid() -> Result<()> {
        let info = account_with_history(&["fresh", "stale"])?;
        assert_eq!(check_password(&info, "fresh"), PasswordResult::Valid);
        Ok(())
    }

    #[test]
    fn old_password_is_valid_expired() -> Result<()> {
        let info = account_with_history(&["fresh", "stale"])?;
        assert_eq!(check_password(&info, "stale"), PasswordResult::ValidExpired);
        Ok(())
    }

    #[test]
    fn unknown_password_is_invalid() -> Result<()> {
        let info = account_with_history(&["fresh", "stale"])?;
        assert_eq!(check_password(&info, "other"), PasswordResult::Invalid);
        Ok(())
    }

    #[test]
    fn empty_history_is_invalid() -> Result<()> {
        let info = account_with_history(&[])?;
        assert_eq!(check_password(&info, "anything"), PasswordResult::Invalid);
        Ok(())
    }

    #[test]
    fn entries_use_fresh_salts() -> Result<()> {
        let first = new_password_entry("same", 0)?;
        let second = new_password_entry("same", 0)?;
        assert_ne!(first.salt, second.salt);
        assert_ne!(first.hash, second.hash);
        Ok(())
    }
}

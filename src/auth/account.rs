//! Accounts and hostname-to-account resolution.
//!
//! Each account is a tenant scoping members, events, and permissions. The
//! account an inbound request belongs to is derived entirely from the `Host`
//! header: the subdomain names the account, the bare apex resolves to the
//! sales site, and single-segment or raw-IP hostnames resolve to a fixed
//! test account outside production.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::AuthError;
use crate::config::AppConfig;

/// Account id served for the bare apex domain.
pub const SALES_ACCOUNT_ID: &str = "sales";

/// Organizational scope of an account. Each variant carries the NHQ
/// organization ids used to scope member and duty-position lookups.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type")]
pub enum AccountType {
    Squadron {
        #[serde(rename = "mainOrg")]
        main_org: u32,
        #[serde(rename = "orgIDs")]
        org_ids: Vec<u32>,
    },
    Group {
        orgid: u32,
    },
    Wing {
        orgid: u32,
        #[serde(rename = "orgIDs")]
        org_ids: Vec<u32>,
    },
    Region {
        orgid: u32,
    },
    /// Event-only accounts have no NHQ scope; membership is account-local.
    Event,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Account {
    pub id: String,
    pub aliases: Vec<String>,
    pub kind: AccountType,
}

impl Account {
    /// Whether `candidate` names this account, by id or by alias.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.id == candidate || self.aliases.iter().any(|alias| alias == candidate)
    }

    /// All NHQ organization ids in scope for this account.
    #[must_use]
    pub fn org_ids(&self) -> Vec<u32> {
        match &self.kind {
            AccountType::Squadron { main_org, org_ids } => {
                let mut ids = org_ids.clone();
                if !ids.contains(main_org) {
                    ids.push(*main_org);
                }
                ids
            }
            AccountType::Wing { orgid, org_ids } => {
                let mut ids = org_ids.clone();
                if !ids.contains(orgid) {
                    ids.push(*orgid);
                }
                ids
            }
            AccountType::Group { orgid } | AccountType::Region { orgid } => vec![*orgid],
            AccountType::Event => Vec::new(),
        }
    }
}

/// Derive the account id a hostname names.
///
/// A leading `www` segment is stripped unconditionally, then the remaining
/// segment count decides:
///
/// - 1 segment (`localhost`): the configured test account, outside production only
/// - 2 segments (bare apex): the sales account
/// - 3 segments: the first segment is the account id or alias
/// - 4 segments (raw IPv4): the test account, outside production only
///
/// Anything else is an invalid hostname.
///
/// # Errors
///
/// Returns [`AuthError::InvalidHostname`] when no rule applies.
pub fn account_id_for_hostname(hostname: &str, config: &AppConfig) -> Result<String, AuthError> {
    let host = hostname
        .split(':')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    let mut segments: Vec<&str> = host.split('.').filter(|s| !s.is_empty()).collect();
    if segments.first() == Some(&"www") {
        segments.remove(0);
    }

    let production = config.environment().is_production();
    match segments.len() {
        1 if !production => Ok(config.test_account_id().to_string()),
        2 => Ok(SALES_ACCOUNT_ID.to_string()),
        3 => Ok(segments[0].to_string()),
        4 if !production => Ok(config.test_account_id().to_string()),
        _ => Err(AuthError::InvalidHostname),
    }
}

#[cfg(test)]
mod tests {
    use super::{Account, AccountType, account_id_for_hostname};
    use crate::config::{AppConfig, Environment};

    fn production() -> AppConfig {
        AppConfig::new(Environment::Production)
    }

    fn development() -> AppConfig {
        AppConfig::new(Environment::Development)
    }

    #[test]
    fn subdomain_names_the_account() {
        let id = account_id_for_hostname("md089.capunit.com", &production());
        assert_eq!(id.ok().as_deref(), Some("md089"));
    }

    #[test]
    fn bare_apex_resolves_to_sales() {
        let id = account_id_for_hostname("www.capunit.com", &production());
        assert_eq!(id.ok().as_deref(), Some("sales"));
        let id = account_id_for_hostname("capunit.com", &production());
        assert_eq!(id.ok().as_deref(), Some("sales"));
    }

    #[test]
    fn www_is_stripped_before_counting() {
        let id = account_id_for_hostname("www.md089.capunit.com", &production());
        assert_eq!(id.ok().as_deref(), Some("md089"));
    }

    #[test]
    fn localhost_resolves_to_test_account_outside_production() {
        let id = account_id_for_hostname("localhost", &development());
        assert_eq!(id.ok().as_deref(), Some("mdx89"));
        assert!(account_id_for_hostname("localhost", &production()).is_err());
    }

    #[test]
    fn raw_ip_resolves_to_test_account_outside_production() {
        let id = account_id_for_hostname("192.168.1.10", &development());
        assert_eq!(id.ok().as_deref(), Some("mdx89"));
        assert!(account_id_for_hostname("192.168.1.10", &production()).is_err());
    }

    #[test]
    fn five_segments_is_invalid() {
        assert!(account_id_for_hostname("a.b.c.d.e", &production()).is_err());
        assert!(account_id_for_hostname("a.b.c.d.e", &development()).is_err());
    }

    #[test]
    fn port_is_stripped() {
        let id = account_id_for_hostname("md089.capunit.com:3001", &production());
        assert_eq!(id.ok().as_deref(), Some("md089"));
    }

    #[test]
    fn account_matches_id_and_aliases() {
        let account = Account {
            id: "md089".to_string(),
            aliases: vec!["stmarys".to_string()],
            kind: AccountType::Squadron {
                main_org: 916,
                org_ids: vec![916, 2529],
            },
        };
        assert!(account.matches("md089"));
        assert!(account.matches("stmarys"));
        assert!(!account.matches("md001"));
    }

    #[test]
    fn org_ids_include_main_org_once() {
        let account = Account {
            id: "md089".to_string(),
            aliases: Vec::new(),
            kind: AccountType::Squadron {
                main_org: 916,
                org_ids: vec![916, 2529],
            },
        };
        assert_eq!(account.org_ids(), vec![916, 2529]);

        let event = Account {
            id: "encampment".to_string(),
            aliases: Vec::new(),
            kind: AccountType::Event,
        };
        assert!(event.org_ids().is_empty());
    }
}

//! Application configuration.
//!
//! Every environment-sensitive behavior is an explicit knob here: the
//! development-only hostname fallbacks and the extended session age never
//! apply unless the operator opts into `Environment::Development`.

use secrecy::SecretString;
use std::str::FromStr;

const DEFAULT_SESSION_AGE_SECONDS: i64 = 60 * 10;
const DEFAULT_TOKEN_AGE_SECONDS: i64 = 20;
const DEFAULT_TEST_ACCOUNT_ID: &str = "mdx89";

/// Session age outside production is stretched to ease local testing.
const DEVELOPMENT_SESSION_AGE_MULTIPLIER: i64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    #[must_use]
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "development" => Ok(Self::Development),
            other => Err(format!("invalid environment: {other}")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    environment: Environment,
    session_age_seconds: i64,
    token_age_seconds: i64,
    test_account_id: String,
    recaptcha_secret: Option<SecretString>,
}

impl AppConfig {
    #[must_use]
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            session_age_seconds: DEFAULT_SESSION_AGE_SECONDS,
            token_age_seconds: DEFAULT_TOKEN_AGE_SECONDS,
            test_account_id: DEFAULT_TEST_ACCOUNT_ID.to_string(),
            recaptcha_secret: None,
        }
    }

    #[must_use]
    pub fn with_session_age_seconds(mut self, seconds: i64) -> Self {
        self.session_age_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_token_age_seconds(mut self, seconds: i64) -> Self {
        self.token_age_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_test_account_id(mut self, account_id: String) -> Self {
        self.test_account_id = account_id;
        self
    }

    #[must_use]
    pub fn with_recaptcha_secret(mut self, secret: Option<SecretString>) -> Self {
        self.recaptcha_secret = secret;
        self
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    #[must_use]
    pub fn session_age_seconds(&self) -> i64 {
        self.session_age_seconds
    }

    /// Session age actually enforced at validation time. Multiplied outside
    /// production so local sessions survive a debugging pause.
    #[must_use]
    pub fn effective_session_age_seconds(&self) -> i64 {
        if self.environment.is_production() {
            self.session_age_seconds
        } else {
            self.session_age_seconds
                .saturating_mul(DEVELOPMENT_SESSION_AGE_MULTIPLIER)
        }
    }

    #[must_use]
    pub fn token_age_seconds(&self) -> i64 {
        self.token_age_seconds
    }

    /// Account resolved for single-segment and bare-IP hostnames, honored
    /// only outside production.
    #[must_use]
    pub fn test_account_id(&self) -> &str {
        &self.test_account_id
    }

    /// `None` disables reCAPTCHA verification on signin (development only).
    #[must_use]
    pub fn recaptcha_secret(&self) -> Option<&SecretString> {
        self.recaptcha_secret.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, Environment};

    #[test]
    fn environment_parses_case_insensitively() {
        assert_eq!(
            "Production".parse::<Environment>(),
            Ok(Environment::Production)
        );
        assert_eq!(
            "development".parse::<Environment>(),
            Ok(Environment::Development)
        );
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn session_age_is_stretched_outside_production() {
        let config = AppConfig::new(Environment::Development).with_session_age_seconds(600);
        assert_eq!(config.session_age_seconds(), 600);
        assert_eq!(config.effective_session_age_seconds(), 60_000);

        let config = AppConfig::new(Environment::Production).with_session_age_seconds(600);
        assert_eq!(config.effective_session_age_seconds(), 600);
    }

    #[test]
    fn defaults_and_overrides() {
        let config = AppConfig::new(Environment::Production);
        assert_eq!(config.token_age_seconds(), 20);
        assert_eq!(config.test_account_id(), "mdx89");
        assert!(config.recaptcha_secret().is_none());

        let config = config
            .with_token_age_seconds(45)
            .with_test_account_id("va001".to_string());
        assert_eq!(config.token_age_seconds(), 45);
        assert_eq!(config.test_account_id(), "va001");
    }
}

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::config::Environment;

pub const ARG_ENVIRONMENT: &str = "environment";
pub const ARG_SESSION_AGE_SECONDS: &str = "session-age-seconds";
pub const ARG_TOKEN_AGE_SECONDS: &str = "token-age-seconds";
pub const ARG_TEST_ACCOUNT_ID: &str = "test-account-id";
pub const ARG_RECAPTCHA_SECRET: &str = "recaptcha-secret";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ENVIRONMENT)
                .long(ARG_ENVIRONMENT)
                .help("Deployment environment: production or development")
                .env("CAPUNIT_ENVIRONMENT")
                .default_value("production")
                .value_parser(["production", "development"]),
        )
        .arg(
            Arg::new(ARG_SESSION_AGE_SECONDS)
                .long(ARG_SESSION_AGE_SECONDS)
                .help("Sliding session expiration window in seconds")
                .env("CAPUNIT_SESSION_AGE_SECONDS")
                .default_value("600")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_TOKEN_AGE_SECONDS)
                .long(ARG_TOKEN_AGE_SECONDS)
                .help("Single-use request token lifetime in seconds")
                .env("CAPUNIT_TOKEN_AGE_SECONDS")
                .default_value("20")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_TEST_ACCOUNT_ID)
                .long(ARG_TEST_ACCOUNT_ID)
                .help("Account served for localhost and raw-IP hostnames outside production")
                .env("CAPUNIT_TEST_ACCOUNT_ID")
                .default_value("mdx89"),
        )
        .arg(
            Arg::new(ARG_RECAPTCHA_SECRET)
                .long(ARG_RECAPTCHA_SECRET)
                .help("reCAPTCHA secret key; omit to disable verification on signin")
                .env("CAPUNIT_RECAPTCHA_SECRET"),
        )
}

pub struct Options {
    pub environment: Environment,
    pub session_age_seconds: i64,
    pub token_age_seconds: i64,
    pub test_account_id: String,
    pub recaptcha_secret: Option<SecretString>,
}

impl Options {
    /// Extract the auth options from parsed matches.
    ///
    /// # Errors
    /// Returns an error if a value is missing or malformed.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let environment = matches
            .get_one::<String>(ARG_ENVIRONMENT)
            .context("missing required argument: --environment")?
            .parse::<Environment>()
            .map_err(|err| anyhow::anyhow!(err))?;
        let session_age_seconds = matches
            .get_one::<i64>(ARG_SESSION_AGE_SECONDS)
            .copied()
            .context("missing required argument: --session-age-seconds")?;
        let token_age_seconds = matches
            .get_one::<i64>(ARG_TOKEN_AGE_SECONDS)
            .copied()
            .context("missing required argument: --token-age-seconds")?;
        let test_account_id = matches
            .get_one::<String>(ARG_TEST_ACCOUNT_ID)
            .cloned()
            .context("missing required argument: --test-account-id")?;
        let recaptcha_secret = matches
            .get_one::<String>(ARG_RECAPTCHA_SECRET)
            .cloned()
            .map(SecretString::from);

        Ok(Self {
            environment,
            session_age_seconds,
            token_age_seconds,
            test_account_id,
            recaptcha_secret,
        })
    }
}

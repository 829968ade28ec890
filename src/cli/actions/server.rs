use crate::{api, config::AppConfig, config::Environment, store::PgStore};
use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub environment: Environment,
    pub session_age_seconds: i64,
    pub token_age_seconds: i64,
    pub test_account_id: String,
    pub recaptcha_secret: Option<SecretString>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let config = AppConfig::new(args.environment)
        .with_session_age_seconds(args.session_age_seconds)
        .with_token_age_seconds(args.token_age_seconds)
        .with_test_account_id(args.test_account_id)
        .with_recaptcha_secret(args.recaptcha_secret);

    if !config.environment().is_production() {
        warn!("Running in development mode: test-account hostnames and extended session ages are enabled");
    }
    if config.recaptcha_secret().is_none() {
        warn!("reCAPTCHA verification is disabled");
    }

    let store = Arc::new(PgStore::connect(&args.dsn).await?);

    api::new(args.port, store, config).await
}

//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action the binary should execute.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::auth;
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(3001);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        environment: auth_opts.environment,
        session_age_seconds: auth_opts.session_age_seconds,
        token_age_seconds: auth_opts.token_age_seconds,
        test_account_id: auth_opts.test_account_id,
        recaptcha_secret: auth_opts.recaptcha_secret,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::actions::Action;
    use crate::config::Environment;

    #[test]
    fn handler_builds_a_server_action() {
        temp_env::with_vars(
            [
                ("CAPUNIT_DSN", Some("postgres://localhost:5432/capunit")),
                ("CAPUNIT_ENVIRONMENT", Some("development")),
                ("CAPUNIT_TOKEN_AGE_SECONDS", Some("45")),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["capunit-auth"]);
                let action = handler(&matches).ok();
                let Some(Action::Server(args)) = action else {
                    panic!("expected a server action");
                };
                assert_eq!(args.port, 3001);
                assert_eq!(args.environment, Environment::Development);
                assert_eq!(args.token_age_seconds, 45);
            },
        );
    }
}

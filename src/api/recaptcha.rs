//! reCAPTCHA siteverify client used by the signin endpoint.

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use crate::APP_USER_AGENT;

const SITEVERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

// One client for the process so the connection pool is reused across
// signin requests.
static CLIENT: OnceCell<reqwest::Client> = OnceCell::new();

fn client() -> Result<&'static reqwest::Client> {
    CLIENT.get_or_try_init(|| {
        reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build reCAPTCHA client")
    })
}

#[derive(Debug, Deserialize)]
struct SiteverifyResponse {
    success: bool,
}

/// Verify a client-submitted reCAPTCHA response against Google.
///
/// # Errors
///
/// Returns an error if the verification service cannot be reached or sends
/// back an unparseable reply. A reachable service that rejects the response
/// is `Ok(false)`, not an error.
pub async fn verify(secret: &SecretString, response: &str) -> Result<bool> {
    let client = client()?;

    let params = [
        ("secret", secret.expose_secret()),
        ("response", response),
    ];
    let reply: SiteverifyResponse = client
        .post(SITEVERIFY_URL)
        .form(&params)
        .send()
        .await
        .context("Failed to reach reCAPTCHA verification service")?
        .json()
        .await
        .context("Failed to parse reCAPTCHA verification response")?;

    Ok(reply.success)
}

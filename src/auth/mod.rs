//! Session, credential, and permission core.
//!
//! Everything request authorization needs lives under this module: account
//! resolution from the request hostname, password verification against a
//! stored history, sliding-expiry sessions, single-use request tokens,
//! graded permission resolution, and the [`pipeline::Authorizer`] that ties
//! them together per request.

use std::time::{SystemTime, UNIX_EPOCH};

pub mod account;
pub mod credential;
pub mod error;
pub mod member;
pub mod password;
pub mod permission;
pub mod pipeline;
pub mod session;
pub mod token;

/// Seconds since the Unix epoch. All stored timestamps use this scale.
pub(crate) fn unix_now() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX),
        // Pre-epoch clocks only happen on badly misconfigured hosts; treat
        // them as the epoch rather than poisoning every caller with a Result.
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::unix_now;

    #[test]
    fn unix_now_is_past_2020() {
        assert!(unix_now() > 1_577_836_800);
    }
}

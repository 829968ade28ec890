//! Session, token, and permission service for CAP unit accounts.
//!
//! Each unit account is a tenant resolved from the request hostname; members
//! authenticate with a password history, carry server-side sessions with
//! sliding expiration, and spend single-use tokens on mutating endpoints.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

//! Error taxonomy for the authorization core.
//!
//! Every variant maps to a stable HTTP class and a fixed client message.
//! Infrastructure failures are wrapped in `Storage` and never leak their
//! detail to the client; the original error is logged instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Hostname did not match any of the segment rules.
    #[error("invalid hostname")]
    InvalidHostname,

    /// Zero or multiple accounts matched the resolved account id.
    #[error("could not find account")]
    AccountNotFound,

    /// Endpoint requires a member but no authorization header was sent.
    #[error("missing authorization header")]
    MissingAuthorization,

    /// No session row, more than one, or the row had already expired.
    #[error("invalid session id")]
    InvalidSessionId,

    /// Token missing, consumed, expired, or not an exact match.
    #[error("invalid token")]
    InvalidToken,

    /// Uniform signin failure; never reveals whether the username exists.
    #[error("incorrect credentials")]
    IncorrectCredentials,

    /// Session type does not intersect the endpoint's accepted mask.
    #[error("your session does not allow this operation; sign out and sign back in")]
    SessionTypeMismatch,

    /// Authenticated but not allowed, e.g. impersonation by a non-superuser.
    #[error("forbidden")]
    Forbidden,

    /// Target of an operation does not exist.
    #[error("could not find member")]
    MemberNotFound,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidHostname
            | Self::MissingAuthorization
            | Self::InvalidSessionId
            | Self::InvalidToken
            | Self::IncorrectCredentials => StatusCode::BAD_REQUEST,
            Self::SessionTypeMismatch | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::AccountNotFound | Self::MemberNotFound => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let Self::Storage(err) = &self {
            error!("Storage failure while authorizing request: {err:#}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
                .into_response();
        }
        (self.status(), self.to_string()).into_response()
    }
}

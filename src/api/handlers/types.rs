//! Request and response bodies for the API endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::member::{Member, MemberReference};
use crate::auth::permission::PermissionSet;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SigninRequest {
    pub username: String,
    pub password: String,
    /// Client-side reCAPTCHA response. Ignored when verification is
    /// disabled by configuration.
    pub recaptcha: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SigninResult {
    Success,
    /// Credentials were right but stale; the returned session can only
    /// finish a password reset.
    PasswordExpired,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SigninResponse {
    pub result: SigninResult,
    #[serde(rename = "sessionID")]
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    #[serde(rename = "accountID")]
    pub account_id: String,
    /// `None` for anonymous requests.
    pub member: Option<Member>,
    pub permissions: PermissionSet,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FinishPasswordResetRequest {
    pub token: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FinishPasswordResetResponse {
    #[serde(rename = "sessionID")]
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuRequest {
    pub token: String,
    pub member: MemberReference,
}

#[cfg(test)]
mod tests {
    use super::{SigninResponse, SigninResult, SuRequest};
    use crate::auth::member::MemberReference;
    use anyhow::Result;

    #[test]
    fn signin_response_uses_wire_names() -> Result<()> {
        let response = SigninResponse {
            result: SigninResult::PasswordExpired,
            session_id: "abc".to_string(),
        };
        let value = serde_json::to_value(&response)?;
        assert_eq!(value["result"], "password_expired");
        assert_eq!(value["sessionID"], "abc");
        Ok(())
    }

    #[test]
    fn su_request_parses_a_tagged_member() -> Result<()> {
        let request: SuRequest = serde_json::from_str(
            r#"{"token": "t", "member": {"type": "CAPNHQMember", "id": 911111}}"#,
        )?;
        assert_eq!(request.member, MemberReference::CapNhq { id: 911_111 });
        Ok(())
    }
}

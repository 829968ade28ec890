//! Member references and member records.
//!
//! A member reference is the polymorphic identity stored inside credentials,
//! sessions, tokens, and event POC lists. It is a tagged union, never an
//! inheritance hierarchy: NHQ members are identified by CAPID, prospective
//! members by a locally issued string id, and `Null` stands for "no member".

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type")]
pub enum MemberReference {
    #[serde(rename = "CAPNHQMember")]
    CapNhq { id: u32 },
    #[serde(rename = "CAPProspectiveMember")]
    CapProspective { id: String },
    Null,
}

impl MemberReference {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Canonical storage key, also used to key permission override rows.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::CapNhq { id } => format!("CAPNHQMember:{id}"),
            Self::CapProspective { id } => format!("CAPProspectiveMember:{id}"),
            Self::Null => "Null".to_string(),
        }
    }
}

/// An organizational role held by a member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DutyPosition {
    pub duty: String,
    /// NHQ organization the duty is scoped to. `None` marks an account-local
    /// position (prospective members and event-account assignments).
    pub org: Option<u32>,
}

/// Full member record resolved from a session's bound credential.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Member {
    pub reference: MemberReference,
    pub name: String,
    pub duty_positions: Vec<DutyPosition>,
}

impl Member {
    /// Placeholder for a credential whose member record is missing; resolves
    /// to an all-NONE permission set downstream.
    #[must_use]
    pub fn bare(reference: MemberReference) -> Self {
        Self {
            reference,
            name: String::new(),
            duty_positions: Vec::new(),
        }
    }
}

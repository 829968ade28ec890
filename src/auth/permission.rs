//! Permission resolution.
//!
//! Permissions are graded levels compared with `>=`, not booleans. The
//! effective set for a member within an account is the field-wise maximum of
//! the stored per-account overrides and the levels implied by the member's
//! duty positions in the account's organizational scope. Resolution is pure:
//! given the same inputs it always produces the same set, so it is safe to
//! recompute on every request.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::account::Account;
use super::member::{Member, MemberReference};

/// The two identities that bypass all permission checks. Kept behind
/// [`is_superuser`] as the single point of change until a proper role system
/// replaces them.
const SUPERUSER_CAP_IDS: [u32; 2] = [542_488, 546_319];

#[must_use]
pub fn is_superuser(member: &MemberReference) -> bool {
    match member {
        MemberReference::CapNhq { id } => SUPERUSER_CAP_IDS.contains(id),
        MemberReference::CapProspective { .. } | MemberReference::Null => false,
    }
}

/// Event management levels, ordered from least to most capable.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
pub enum ManageEvent {
    None,
    AddDraftEvents,
    Full,
}

/// Two-level grade used by permissions without intermediate tiers.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
pub enum PermissionLevel {
    None,
    Full,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PermissionSet {
    #[serde(rename = "ManageEvent")]
    pub manage_event: ManageEvent,
    #[serde(rename = "AssignTasks")]
    pub assign_tasks: PermissionLevel,
    #[serde(rename = "FileManagement")]
    pub file_management: PermissionLevel,
    #[serde(rename = "FlightAssign")]
    pub flight_assign: PermissionLevel,
    #[serde(rename = "ProspectiveMemberManagement")]
    pub prospective_member_management: PermissionLevel,
    #[serde(rename = "PermissionManagement")]
    pub permission_management: PermissionLevel,
}

impl PermissionSet {
    pub const NONE: Self = Self {
        manage_event: ManageEvent::None,
        assign_tasks: PermissionLevel::None,
        file_management: PermissionLevel::None,
        flight_assign: PermissionLevel::None,
        prospective_member_management: PermissionLevel::None,
        permission_management: PermissionLevel::None,
    };

    pub const FULL: Self = Self {
        manage_event: ManageEvent::Full,
        assign_tasks: PermissionLevel::Full,
        file_management: PermissionLevel::Full,
        flight_assign: PermissionLevel::Full,
        prospective_member_management: PermissionLevel::Full,
        permission_management: PermissionLevel::Full,
    };

    /// Field-wise maximum. Merging never lowers an explicitly granted level.
    #[must_use]
    pub fn merge_max(self, other: Self) -> Self {
        Self {
            manage_event: self.manage_event.max(other.manage_event),
            assign_tasks: self.assign_tasks.max(other.assign_tasks),
            file_management: self.file_management.max(other.file_management),
            flight_assign: self.flight_assign.max(other.flight_assign),
            prospective_member_management: self
                .prospective_member_management
                .max(other.prospective_member_management),
            permission_management: self.permission_management.max(other.permission_management),
        }
    }
}

impl Default for PermissionSet {
    fn default() -> Self {
        Self::NONE
    }
}

/// The event fields permission resolution cares about.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Event {
    pub id: u32,
    #[serde(rename = "accountID")]
    pub account_id: String,
    pub author: MemberReference,
    #[serde(rename = "pointsOfContact")]
    pub points_of_contact: Vec<MemberReference>,
}

impl Event {
    /// Whether the member authored the event or is a listed internal POC.
    #[must_use]
    pub fn is_point_of_contact(&self, member: &MemberReference) -> bool {
        if member.is_null() {
            return false;
        }
        self.author == *member || self.points_of_contact.contains(member)
    }
}

fn duty_implications(member: &Member, account: &Account) -> PermissionSet {
    let org_ids = account.org_ids();
    let mut implied = PermissionSet::NONE;
    for position in &member.duty_positions {
        // Account-local positions (org = None) always count; NHQ positions
        // only count inside the account's organizational scope.
        let in_scope = position.org.map_or(true, |org| org_ids.contains(&org));
        if !in_scope {
            continue;
        }
        let from_duty = match position.duty.as_str() {
            "Operations Officer" => PermissionSet {
                manage_event: ManageEvent::Full,
                ..PermissionSet::NONE
            },
            "Cadet Operations Officer" | "Cadet Operations NCO" => PermissionSet {
                manage_event: ManageEvent::AddDraftEvents,
                ..PermissionSet::NONE
            },
            _ => PermissionSet::NONE,
        };
        implied = implied.merge_max(from_duty);
    }
    implied
}

/// Effective permissions for `member` within `account`.
///
/// Unknown members and members with no overrides or qualifying duties simply
/// resolve to all-NONE; there is no failure path.
#[must_use]
pub fn resolve(member: &Member, account: &Account, stored: Option<&PermissionSet>) -> PermissionSet {
    if is_superuser(&member.reference) {
        return PermissionSet::FULL;
    }
    let base = stored.copied().unwrap_or(PermissionSet::NONE);
    base.merge_max(duty_implications(member, account))
}

/// Like [`resolve`], with event-specific escalation: a registered point of
/// contact gets `ManageEvent::Full` for that event regardless of their
/// account-wide level.
#[must_use]
pub fn resolve_for_event(
    member: &Member,
    account: &Account,
    stored: Option<&PermissionSet>,
    event: &Event,
) -> PermissionSet {
    let mut permissions = resolve(member, account, stored);
    if event.is_point_of_contact(&member.reference) {
        permissions.manage_event = permissions.manage_event.max(ManageEvent::Full);
    }
    permissions
}

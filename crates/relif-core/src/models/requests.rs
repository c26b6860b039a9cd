//! Invites and requests exchanged between users, organizations and the
//! platform staff.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::column_enum;
use super::organization::{Organization, OrganizationType};
use super::user::UserSummary;

column_enum! {
    pub enum RequestStatus {
        #[default]
        Pending => "PENDING",
        Accepted => "ACCEPTED",
        Rejected => "REJECTED",
        Canceled => "CANCELED",
        Granted => "GRANTED",
        Approved => "APPROVED",
    }
}

/// Invitation for an email address to join an organization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrganizationInvite {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A user asking to join an organization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JoinOrganizationRequest {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub user: UserSummary,
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// An organization asking to read another organization's data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataAccessRequest {
    pub id: Uuid,
    pub target_organization_id: Uuid,
    pub requesting_organization_id: Uuid,
    #[serde(default)]
    pub requesting_organization: Organization,
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// An organization asking platform staff to change its type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrganizationTypeRequest {
    pub id: Uuid,
    pub organization_id: Uuid,
    #[serde(default)]
    pub organization: Organization,
    pub requested_by_id: Uuid,
    #[serde(default)]
    pub requested_by: UserSummary,
    pub new_type: OrganizationType,
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Invitation for an organization's member to join the platform staff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlatformInvite {
    pub id: Uuid,
    #[serde(default)]
    pub organization_id: Option<Uuid>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::column_enum;
use super::organization::Organization;

column_enum! {
    /// Coarse authorization tier assigned to a user.
    pub enum PlatformRole {
        #[default]
        NoOrg => "NO_ORG",
        OrgMember => "ORG_MEMBER",
        OrgAdmin => "ORG_ADMIN",
        RelifMember => "RELIF_MEMBER",
    }
}

column_enum! {
    pub enum UserStatus {
        #[default]
        Active => "ACTIVE",
        Inactive => "INACTIVE",
        Unverified => "UNVERIFIED",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Preferences {
    pub language: String,
    pub timezone: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            language: "en".into(),
            timezone: "UTC".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phones: Vec<String>,
    /// Job title inside the organization (free text).
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub platform_role: PlatformRole,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub organization_id: Option<Uuid>,
    #[serde(default)]
    pub organization: Organization,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Minimal user projection embedded in cases and requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UserSummary {
    pub id: Uuid,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

/// Fields that can be updated on an existing user.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phones: Option<Vec<String>>,
    pub role: Option<String>,
    pub platform_role: Option<PlatformRole>,
    pub preferences: Option<Preferences>,
}

/// Filters accepted by user search. Empty fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct UserSearch {
    pub term: String,
    pub organization_id: Option<Uuid>,
    pub platform_role: Option<PlatformRole>,
}

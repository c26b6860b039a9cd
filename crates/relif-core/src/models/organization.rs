//! Organization domain model.
//!
//! Organizations are the tenant root: every beneficiary, housing, case,
//! product and volunteer belongs to exactly one of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{column_enum, empty_object};

column_enum! {
    /// Role an organization plays in the aid network.
    pub enum OrganizationType {
        #[default]
        Manager => "MANAGER",
        Coordinator => "COORDINATOR",
    }
}

column_enum! {
    /// Lifecycle status shared by organizations, housings and rooms.
    pub enum RecordStatus {
        #[default]
        Active => "ACTIVE",
        Inactive => "INACTIVE",
        Pending => "PENDING",
        Accepted => "ACCEPTED",
        Rejected => "REJECTED",
        Archived => "ARCHIVED",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub org_type: OrganizationType,
    #[serde(default)]
    pub status: RecordStatus,
    /// Free-form address blob (`street`, `city`, `zip_code`, ...).
    #[serde(default = "empty_object")]
    pub address: serde_json::Value,
    #[serde(default)]
    pub areas_of_work: Vec<String>,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    /// Organizations that were granted read access to this one's data.
    #[serde(default)]
    pub access_granted_ids: Vec<Uuid>,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Organization {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            name: String::new(),
            description: String::new(),
            org_type: OrganizationType::default(),
            status: RecordStatus::default(),
            address: empty_object(),
            areas_of_work: Vec::new(),
            owner_id: None,
            access_granted_ids: Vec::new(),
            phones: Vec::new(),
            email: String::new(),
            website: String::new(),
            logo: String::new(),
            created_at: None,
            updated_at: None,
        }
    }
}

/// Fields required to create a new organization.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateOrganization {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub org_type: Option<OrganizationType>,
    pub address: Option<serde_json::Value>,
    pub phones: Option<Vec<String>>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub logo: Option<String>,
}

/// Fields that can be updated on an existing organization.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateOrganization {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub org_type: Option<OrganizationType>,
    pub address: Option<serde_json::Value>,
    pub phones: Option<Vec<String>>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub logo: Option<String>,
}

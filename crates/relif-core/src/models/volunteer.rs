//! Volunteer ("voluntary people") domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{column_enum, empty_object};

column_enum! {
    pub enum VolunteerStatus {
        #[default]
        Active => "ACTIVE",
        Inactive => "INACTIVE",
        Pending => "PENDING",
    }
}

fn empty_array() -> serde_json::Value {
    serde_json::Value::Array(Vec::new())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Volunteer {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub gender: String,
    /// List of identity documents; `[]` when absent.
    #[serde(default = "empty_array")]
    pub documents: serde_json::Value,
    #[serde(default)]
    pub birthdate: String,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default = "empty_object")]
    pub address: serde_json::Value,
    #[serde(default)]
    pub status: VolunteerStatus,
    #[serde(default)]
    pub segments: Vec<String>,
    #[serde(default = "empty_object")]
    pub medical_information: serde_json::Value,
    #[serde(default = "empty_array")]
    pub emergency_contacts: serde_json::Value,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateVolunteer {
    pub full_name: String,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub documents: Option<serde_json::Value>,
    pub birthdate: Option<String>,
    pub phones: Option<Vec<String>>,
    pub address: Option<serde_json::Value>,
    pub segments: Option<Vec<String>>,
    pub medical_information: Option<serde_json::Value>,
    pub emergency_contacts: Option<serde_json::Value>,
    pub notes: Option<String>,
}

/// Same fields as [`CreateVolunteer`], all optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateVolunteer {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub documents: Option<serde_json::Value>,
    pub birthdate: Option<String>,
    pub phones: Option<Vec<String>>,
    pub address: Option<serde_json::Value>,
    pub segments: Option<Vec<String>>,
    pub medical_information: Option<serde_json::Value>,
    pub emergency_contacts: Option<serde_json::Value>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VolunteerStats {
    pub total_volunteers: u64,
    pub active_volunteers: u64,
    pub pending_volunteers: u64,
    pub inactive_volunteers: u64,
}

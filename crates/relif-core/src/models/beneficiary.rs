//! Beneficiary domain model and allocation history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::housing::{HousingSummary, SpaceSummary};
use super::{column_enum, empty_object};

column_enum! {
    pub enum BeneficiaryStatus {
        #[default]
        Active => "ACTIVE",
        Inactive => "INACTIVE",
        Pending => "PENDING",
    }
}

column_enum! {
    pub enum AllocationType {
        #[default]
        Allocation => "ALLOCATION",
        Reallocation => "REALLOCATION",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Beneficiary {
    pub id: Uuid,
    #[serde(default)]
    pub organization_id: Option<Uuid>,
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default = "empty_object")]
    pub documents: serde_json::Value,
    #[serde(default)]
    pub birthdate: String,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub civil_status: String,
    #[serde(default)]
    pub spoken_languages: Vec<String>,
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub occupation: String,
    #[serde(default = "empty_object")]
    pub address: serde_json::Value,
    #[serde(default)]
    pub status: BeneficiaryStatus,
    #[serde(default)]
    pub current_housing_id: Option<Uuid>,
    #[serde(default)]
    pub current_housing: HousingSummary,
    #[serde(default)]
    pub current_room_id: Option<Uuid>,
    #[serde(default)]
    pub current_room: SpaceSummary,
    #[serde(default = "empty_object")]
    pub medical_information: serde_json::Value,
    #[serde(default = "empty_object")]
    pub emergency_contacts: serde_json::Value,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields accepted when registering a beneficiary.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateBeneficiary {
    pub full_name: String,
    pub email: Option<String>,
    pub phones: Option<Vec<String>>,
    pub birthdate: Option<String>,
    pub gender: Option<String>,
    pub civil_status: Option<String>,
    pub spoken_languages: Option<Vec<String>>,
    pub education: Option<String>,
    pub occupation: Option<String>,
    pub address: Option<serde_json::Value>,
    pub medical_information: Option<serde_json::Value>,
    pub emergency_contacts: Option<serde_json::Value>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateBeneficiary {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
    pub documents: Option<serde_json::Value>,
    pub phones: Option<Vec<String>>,
    pub birthdate: Option<String>,
    pub gender: Option<String>,
    pub civil_status: Option<String>,
    pub spoken_languages: Option<Vec<String>>,
    pub education: Option<String>,
    pub occupation: Option<String>,
    pub address: Option<serde_json::Value>,
    pub status: Option<BeneficiaryStatus>,
    pub medical_information: Option<serde_json::Value>,
    pub emergency_contacts: Option<serde_json::Value>,
    pub notes: Option<String>,
}

/// Target of an allocation or reallocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllocationTarget {
    pub housing_id: Uuid,
    pub room_id: Uuid,
}

/// Beneficiary projection embedded in allocation history and donations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BeneficiarySummary {
    pub id: Uuid,
    #[serde(default)]
    pub full_name: String,
}

/// One row of a beneficiary's housing history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BeneficiaryAllocation {
    pub id: Uuid,
    pub beneficiary_id: Uuid,
    #[serde(default)]
    pub beneficiary: BeneficiarySummary,
    pub housing_id: Uuid,
    #[serde(default)]
    pub housing: HousingSummary,
    pub room_id: Uuid,
    #[serde(default)]
    pub room: SpaceSummary,
    #[serde(default)]
    pub old_housing_id: Option<Uuid>,
    #[serde(default)]
    pub old_housing: HousingSummary,
    #[serde(default)]
    pub old_room_id: Option<Uuid>,
    #[serde(default)]
    pub old_room: SpaceSummary,
    #[serde(rename = "type", default)]
    pub allocation_type: AllocationType,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Status counts; `active + pending + inactive == total_beneficiaries`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BeneficiaryStats {
    pub total_beneficiaries: u64,
    pub active_beneficiaries: u64,
    pub pending_beneficiaries: u64,
    pub inactive_beneficiaries: u64,
}

//! Housing and housing room ("space") models.
//!
//! Occupancy counters are denormalized: a housing's `total_vacancies`,
//! `total_rooms` and `occupied_vacancies` mirror the sum of its rooms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::empty_object;
use super::organization::RecordStatus;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Housing {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default = "empty_object")]
    pub address: serde_json::Value,
    #[serde(default)]
    pub occupied_vacancies: u32,
    #[serde(default)]
    pub total_vacancies: u32,
    #[serde(default)]
    pub total_rooms: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Housing projection embedded in beneficiaries and allocations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HousingSummary {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default = "empty_object")]
    pub address: serde_json::Value,
}

impl Default for HousingSummary {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            name: String::new(),
            address: empty_object(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHousing {
    pub name: String,
    pub address: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateHousing {
    pub name: Option<String>,
    pub status: Option<RecordStatus>,
    pub address: Option<serde_json::Value>,
}

/// Counts are a partition of `total_housing`: every housing is exactly one
/// of available, occupied or maintenance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct HousingStats {
    pub total_housing: u64,
    pub available_housing: u64,
    pub occupied_housing: u64,
    pub maintenance_housing: u64,
    pub total_capacity: u64,
    pub total_occupied: u64,
}

/// A room inside a housing. Stored as `capacity`/`occupied`, exposed as
/// vacancies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Space {
    pub id: Uuid,
    pub housing_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub total_vacancies: u32,
    #[serde(default)]
    pub occupied_vacancies: u32,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Room projection embedded in beneficiaries and allocations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SpaceSummary {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub capacity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSpace {
    pub name: String,
    /// Room capacity; a missing value creates a single-bed room.
    pub total_vacancies: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateSpace {
    pub name: Option<String>,
    pub total_vacancies: Option<u32>,
    pub status: Option<RecordStatus>,
}

//! Case management models: cases, notes and documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::column_enum;
use super::user::UserSummary;

column_enum! {
    pub enum CaseStatus {
        #[default]
        Pending => "PENDING",
        InProgress => "IN_PROGRESS",
        OnHold => "ON_HOLD",
        Closed => "CLOSED",
        Cancelled => "CANCELLED",
    }
}

impl CaseStatus {
    /// Closed and cancelled cases no longer count as open work.
    pub fn is_open(&self) -> bool {
        !matches!(self, CaseStatus::Closed | CaseStatus::Cancelled)
    }
}

column_enum! {
    pub enum CasePriority {
        #[default]
        Medium => "MEDIUM",
        Low => "LOW",
        High => "HIGH",
        Urgent => "URGENT",
    }
}

column_enum! {
    pub enum UrgencyLevel {
        #[default]
        Flexible => "FLEXIBLE",
        Immediate => "IMMEDIATE",
        WithinWeek => "WITHIN_WEEK",
        WithinMonth => "WITHIN_MONTH",
    }
}

column_enum! {
    pub enum NoteType {
        #[default]
        Update => "UPDATE",
        Call => "CALL",
        Meeting => "MEETING",
        Visit => "VISIT",
        Appointment => "APPOINTMENT",
        Other => "OTHER",
    }
}

/// Beneficiary projection embedded in a case. Names are split from the
/// stored `full_name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CaseBeneficiary {
    pub id: Uuid,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub current_address: String,
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Case {
    pub id: Uuid,
    pub case_number: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: CaseStatus,
    #[serde(default)]
    pub priority: CasePriority,
    #[serde(default)]
    pub urgency_level: UrgencyLevel,
    #[serde(default)]
    pub service_types: Vec<String>,
    pub beneficiary_id: Uuid,
    #[serde(default)]
    pub beneficiary: CaseBeneficiary,
    #[serde(default)]
    pub assigned_to_id: Option<Uuid>,
    #[serde(default)]
    pub assigned_to: UserSummary,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_duration: String,
    /// Decimal amount rendered as text; empty when no budget was set.
    #[serde(default)]
    pub budget_allocated: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes_count: u32,
    #[serde(default)]
    pub documents_count: u32,
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateCase {
    pub title: String,
    pub description: Option<String>,
    pub priority: CasePriority,
    pub urgency_level: UrgencyLevel,
    #[serde(default)]
    pub service_types: Vec<String>,
    pub beneficiary_id: Uuid,
    pub assigned_to_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_duration: Option<String>,
    pub budget_allocated: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Written as the first note right after the case row is created.
    pub initial_note: Option<CreateCaseNote>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateCase {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<CaseStatus>,
    pub priority: Option<CasePriority>,
    pub urgency_level: Option<UrgencyLevel>,
    pub service_types: Option<Vec<String>>,
    pub assigned_to_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_duration: Option<String>,
    pub budget_allocated: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CaseStats {
    pub total_cases: u64,
    pub open_cases: u64,
    pub in_progress_cases: u64,
    pub overdue_cases: u64,
    pub closed_this_month: u64,
    pub avg_resolution_days: f64,
}

/// Author or uploader reference with a display name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Author {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseNote {
    pub id: Uuid,
    pub case_id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub note_type: NoteType,
    #[serde(default)]
    pub is_important: bool,
    pub created_by: Author,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateCaseNote {
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub note_type: NoteType,
    #[serde(default)]
    pub is_important: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateCaseNote {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub note_type: Option<NoteType>,
    pub is_important: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseDocument {
    pub id: Uuid,
    pub case_id: Uuid,
    pub document_name: String,
    pub file_name: String,
    #[serde(default)]
    pub document_type: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub uploaded_by: Author,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub download_url: String,
}

/// Metadata recorded after the file itself was uploaded to `file_key`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateCaseDocument {
    pub document_name: String,
    pub document_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub file_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateCaseDocument {
    pub document_name: Option<String>,
    pub document_type: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_finalized: Option<bool>,
}

/// A direct-upload target: PUT the file to `link`, then register the
/// document with `file_key`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadLink {
    pub link: String,
    pub file_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DownloadLink {
    pub link: String,
}

//! Row-to-model transforms.
//!
//! Every function here is total: a missing, null or mistyped column falls
//! back to the model's default (empty string, empty list, `{}`, zero, the
//! enum's default variant) instead of failing.

use chrono::{DateTime, NaiveDate, Utc};
use relif_core::models::{
    auth::AuthUser,
    beneficiary::{
        AllocationType, Beneficiary, BeneficiaryAllocation, BeneficiaryStatus, BeneficiarySummary,
    },
    case::{
        Author, Case, CaseBeneficiary, CaseDocument, CaseNote, CasePriority, CaseStatus, NoteType,
        UrgencyLevel,
    },
    empty_object,
    housing::{Housing, HousingSummary, Space, SpaceSummary},
    inventory::{EntryLocation, EntryType, LocationType, ProductEntry, ProductType},
    organization::{Organization, OrganizationType, RecordStatus},
    requests::{
        DataAccessRequest, JoinOrganizationRequest, OrganizationInvite, OrganizationTypeRequest,
        PlatformInvite, RequestStatus,
    },
    user::{PlatformRole, Preferences, User, UserStatus, UserSummary},
    volunteer::{Volunteer, VolunteerStatus},
};
use serde_json::Value;
use uuid::Uuid;

static NULL: Value = Value::Null;

/// Lenient accessor over a raw JSON row.
#[derive(Clone, Copy)]
pub(crate) struct Row<'a>(&'a Value);

impl<'a> Row<'a> {
    pub(crate) fn new(value: &'a Value) -> Self {
        Row(value)
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub(crate) fn is_present(&self, key: &str) -> bool {
        self.get(key).is_some_and(Value::is_object)
    }

    pub(crate) fn opt_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub(crate) fn str(&self, key: &str) -> String {
        self.opt_str(key).unwrap_or_default()
    }

    pub(crate) fn opt_uuid(&self, key: &str) -> Option<Uuid> {
        self.get(key)
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    pub(crate) fn uuid(&self, key: &str) -> Uuid {
        self.opt_uuid(key).unwrap_or_else(Uuid::nil)
    }

    fn array(&self, key: &str) -> &'a [Value] {
        self.get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn strings(&self, key: &str) -> Vec<String> {
        self.array(key)
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect()
    }

    fn uuids(&self, key: &str) -> Vec<Uuid> {
        self.array(key)
            .iter()
            .filter_map(|v| v.as_str().and_then(|s| Uuid::parse_str(s).ok()))
            .collect()
    }

    /// JSON object column, `{}` when absent.
    fn object(&self, key: &str) -> Value {
        self.get(key)
            .filter(|v| v.is_object())
            .cloned()
            .unwrap_or_else(empty_object)
    }

    fn json_or(&self, key: &str, default: Value) -> Value {
        self.get(key).cloned().unwrap_or(default)
    }

    pub(crate) fn u64(&self, key: &str) -> u64 {
        match self.get(key) {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
                .unwrap_or(0),
            Some(Value::String(s)) => s.parse().unwrap_or(0),
            _ => 0,
        }
    }

    pub(crate) fn u32(&self, key: &str) -> u32 {
        u32::try_from(self.u64(key)).unwrap_or(u32::MAX)
    }

    fn bool(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// RFC 3339 timestamp or plain `YYYY-MM-DD` date.
    pub(crate) fn time(&self, key: &str) -> Option<DateTime<Utc>> {
        let raw = self.get(key)?.as_str()?;
        if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
            return Some(t.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|t| t.and_utc())
    }

    pub(crate) fn parse<T: Default>(&self, key: &str, parse: fn(&str) -> Option<T>) -> T {
        self.get(key)
            .and_then(Value::as_str)
            .and_then(parse)
            .unwrap_or_default()
    }

    /// Embedded relation; a missing one reads as an all-null row.
    pub(crate) fn nested(&self, key: &str) -> Row<'a> {
        Row(self.get(key).unwrap_or(&NULL))
    }
}

// ---------------------------------------------------------------------------
// Organizations and users
// ---------------------------------------------------------------------------

pub fn organization(row: &Value) -> Organization {
    let r = Row::new(row);
    Organization {
        id: r.uuid("id"),
        name: r.str("name"),
        description: r.str("description"),
        org_type: r.parse("type", OrganizationType::parse),
        status: r.parse("status", RecordStatus::parse),
        address: r.object("address"),
        areas_of_work: r.strings("areas_of_work"),
        owner_id: r.opt_uuid("owner_id"),
        access_granted_ids: r.uuids("access_granted_ids"),
        phones: r.strings("phones"),
        email: r.str("email"),
        website: r.str("website"),
        logo: r.str("logo"),
        created_at: r.time("created_at"),
        updated_at: r.time("updated_at"),
    }
}

fn preferences(value: Row<'_>) -> Preferences {
    let defaults = Preferences::default();
    Preferences {
        language: value.opt_str("language").unwrap_or(defaults.language),
        timezone: value.opt_str("timezone").unwrap_or(defaults.timezone),
    }
}

/// `users` row, with the organization embedded as `organization`.
pub fn user(row: &Value) -> User {
    let r = Row::new(row);
    User {
        id: r.uuid("id"),
        first_name: r.str("first_name"),
        last_name: r.str("last_name"),
        email: r.str("email"),
        phones: r.strings("phones"),
        role: r.str("role"),
        platform_role: r.parse("platform_role", PlatformRole::parse),
        status: r.parse("status", UserStatus::parse),
        preferences: preferences(r.nested("preferences")),
        organization_id: r.opt_uuid("organization_id"),
        organization: organization(r.nested("organization").0),
        created_at: r.time("created_at"),
        updated_at: r.time("updated_at"),
    }
}

pub fn user_summary(row: &Value) -> UserSummary {
    let r = Row::new(row);
    UserSummary {
        id: r.uuid("id"),
        first_name: r.str("first_name"),
        last_name: r.str("last_name"),
        email: r.str("email"),
    }
}

/// The signed-in user as described by auth metadata alone.
pub fn auth_user(user: &AuthUser) -> User {
    let meta = Row::new(&user.user_metadata);
    User {
        id: user.id,
        first_name: meta.str("first_name"),
        last_name: meta.str("last_name"),
        email: user.email.clone().unwrap_or_default(),
        phones: meta.strings("phones"),
        role: meta.str("role"),
        platform_role: meta
            .get("platform_role")
            .and_then(Value::as_str)
            .and_then(PlatformRole::parse)
            .unwrap_or(PlatformRole::OrgMember),
        status: UserStatus::Active,
        preferences: preferences(meta.nested("preferences")),
        organization_id: meta.opt_uuid("organization_id"),
        organization: organization(meta.nested("organization").0),
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

// ---------------------------------------------------------------------------
// Housing
// ---------------------------------------------------------------------------

pub fn housing(row: &Value) -> Housing {
    let r = Row::new(row);
    Housing {
        id: r.uuid("id"),
        organization_id: r.uuid("organization_id"),
        name: r.str("name"),
        status: r.parse("status", RecordStatus::parse),
        address: r.object("address"),
        occupied_vacancies: r.u32("occupied_vacancies"),
        total_vacancies: r.u32("total_vacancies"),
        total_rooms: r.u32("total_rooms"),
        created_at: r.time("created_at"),
        updated_at: r.time("updated_at"),
    }
}

fn housing_summary(r: Row<'_>) -> HousingSummary {
    HousingSummary {
        id: r.uuid("id"),
        name: r.str("name"),
        address: r.object("address"),
    }
}

/// `housing_rooms` row; `capacity`/`occupied` become vacancies.
pub fn space(row: &Value) -> Space {
    let r = Row::new(row);
    Space {
        id: r.uuid("id"),
        housing_id: r.uuid("housing_id"),
        name: r.str("name"),
        total_vacancies: r.u32("capacity"),
        occupied_vacancies: r.u32("occupied"),
        status: r.parse("status", RecordStatus::parse),
        created_at: r.time("created_at"),
        updated_at: r.time("updated_at"),
    }
}

fn space_summary(r: Row<'_>) -> SpaceSummary {
    SpaceSummary {
        id: r.uuid("id"),
        name: r.str("name"),
        capacity: r.u32("capacity"),
    }
}

// ---------------------------------------------------------------------------
// Beneficiaries
// ---------------------------------------------------------------------------

pub fn beneficiary(row: &Value) -> Beneficiary {
    let r = Row::new(row);
    Beneficiary {
        id: r.uuid("id"),
        organization_id: r.opt_uuid("organization_id"),
        full_name: r.str("full_name"),
        email: r.str("email"),
        image_url: r.str("image_url"),
        documents: r.object("documents"),
        birthdate: r.str("birthdate"),
        phones: r.strings("phones"),
        civil_status: r.str("civil_status"),
        spoken_languages: r.strings("spoken_languages"),
        education: r.str("education"),
        gender: r.str("gender"),
        occupation: r.str("occupation"),
        address: r.object("address"),
        status: r.parse("status", BeneficiaryStatus::parse),
        current_housing_id: r.opt_uuid("current_housing_id"),
        current_housing: housing_summary(r.nested("current_housing")),
        current_room_id: r.opt_uuid("current_room_id"),
        current_room: space_summary(r.nested("current_room")),
        medical_information: r.object("medical_information"),
        emergency_contacts: r.object("emergency_contacts"),
        notes: r.str("notes"),
        created_at: r.time("created_at"),
        updated_at: r.time("updated_at"),
    }
}

pub fn allocation(row: &Value) -> BeneficiaryAllocation {
    let r = Row::new(row);
    let person = r.nested("beneficiary");
    BeneficiaryAllocation {
        id: r.uuid("id"),
        beneficiary_id: r.uuid("beneficiary_id"),
        beneficiary: BeneficiarySummary {
            id: person.uuid("id"),
            full_name: person.str("full_name"),
        },
        housing_id: r.uuid("housing_id"),
        housing: housing_summary(r.nested("housing")),
        room_id: r.uuid("room_id"),
        room: space_summary(r.nested("room")),
        old_housing_id: r.opt_uuid("old_housing_id"),
        old_housing: housing_summary(r.nested("old_housing")),
        old_room_id: r.opt_uuid("old_room_id"),
        old_room: space_summary(r.nested("old_room")),
        allocation_type: r.parse("type", AllocationType::parse),
        created_at: r.time("created_at"),
    }
}

// ---------------------------------------------------------------------------
// Cases
// ---------------------------------------------------------------------------

/// Splits `full_name` at the first space.
fn split_name(full_name: &str) -> (String, String) {
    let mut parts = full_name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}

fn case_beneficiary(r: Row<'_>, fallback_id: Uuid) -> CaseBeneficiary {
    if !r.0.is_object() {
        return CaseBeneficiary {
            id: fallback_id,
            ..CaseBeneficiary::default()
        };
    }
    let full_name = r.str("full_name");
    let (first_name, last_name) = split_name(&full_name);
    CaseBeneficiary {
        id: r.uuid("id"),
        first_name,
        last_name,
        full_name,
        phone: r.strings("phones").into_iter().next().unwrap_or_default(),
        email: r.str("email"),
        current_address: r.nested("address").str("street"),
        image_url: r.str("image_url"),
    }
}

/// `cases` row with `beneficiaries` and `assigned_to` embeds.
pub fn case(row: &Value) -> Case {
    let r = Row::new(row);
    let beneficiary_id = r.uuid("beneficiary_id");
    let assigned_to_id = r.opt_uuid("assigned_to_id");
    let assigned = r.nested("assigned_to");
    let assigned_to = if r.is_present("assigned_to") {
        user_summary(assigned.0)
    } else {
        UserSummary {
            id: assigned_to_id.unwrap_or_else(Uuid::nil),
            ..UserSummary::default()
        }
    };
    Case {
        id: r.uuid("id"),
        case_number: r.str("case_number"),
        title: r.str("title"),
        description: r.str("description"),
        status: r.parse("status", CaseStatus::parse),
        priority: r.parse("priority", CasePriority::parse),
        urgency_level: r.parse("urgency_level", UrgencyLevel::parse),
        service_types: r.strings("service_types"),
        beneficiary_id,
        beneficiary: case_beneficiary(r.nested("beneficiaries"), beneficiary_id),
        assigned_to_id,
        assigned_to,
        due_date: r.time("due_date"),
        estimated_duration: r.str("estimated_duration"),
        budget_allocated: r.str("budget_allocated"),
        tags: r.strings("tags"),
        notes_count: r.u32("notes_count"),
        documents_count: r.u32("documents_count"),
        last_activity: r.time("last_activity").or_else(|| r.time("updated_at")),
        created_at: r.time("created_at"),
        updated_at: r.time("updated_at"),
    }
}

/// Display name of an embedded `users` row, keyed by `id_column` when the
/// embed is missing.
fn author(r: Row<'_>, embed: &str, id_column: &str) -> Author {
    let user = r.nested(embed);
    if r.is_present(embed) {
        let name = format!("{} {}", user.str("first_name"), user.str("last_name"));
        Author {
            id: user.uuid("id"),
            name: name.trim().to_string(),
        }
    } else {
        Author {
            id: r.uuid(id_column),
            name: "Unknown User".into(),
        }
    }
}

pub fn case_note(row: &Value) -> CaseNote {
    let r = Row::new(row);
    CaseNote {
        id: r.uuid("id"),
        case_id: r.uuid("case_id"),
        title: r.opt_str("title").unwrap_or_else(|| "Note".into()),
        content: r.str("content"),
        tags: r.strings("tags"),
        note_type: r.parse("note_type", NoteType::parse),
        is_important: r.bool("is_important"),
        created_by: author(r, "users", "author_id"),
        created_at: r.time("created_at"),
        updated_at: r.time("updated_at"),
    }
}

pub fn case_document(row: &Value) -> CaseDocument {
    let r = Row::new(row);
    let file_name = r.str("file_name");
    CaseDocument {
        id: r.uuid("id"),
        case_id: r.uuid("case_id"),
        document_name: r.opt_str("document_name").unwrap_or_else(|| file_name.clone()),
        file_name,
        document_type: r.opt_str("document_type").unwrap_or_else(|| "OTHER".into()),
        file_size: r.u64("file_size"),
        mime_type: r
            .opt_str("file_type")
            .unwrap_or_else(|| "application/octet-stream".into()),
        description: r.str("description"),
        tags: r.strings("tags"),
        uploaded_by: author(r, "users", "uploaded_by_id"),
        created_at: r.time("created_at"),
        download_url: r.str("file_url"),
    }
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// `product_types` row with the owning organization embedded as
/// `organizations`.
pub fn product(row: &Value) -> ProductType {
    let r = Row::new(row);
    ProductType {
        id: r.uuid("id"),
        name: r.str("name"),
        description: r.str("description"),
        brand: r.str("brand"),
        category: r.str("category"),
        organization_id: r.uuid("organization_id"),
        organization: organization(r.nested("organizations").0),
        unit_type: r.opt_str("unit_type").unwrap_or_else(|| "pcs".into()),
        total_in_storage: r.u64("total_in_storage"),
        created_at: r.time("created_at"),
        updated_at: r.time("updated_at"),
    }
}

/// `donations` row: stock handed from a location to a beneficiary.
pub fn donation(row: &Value) -> ProductEntry {
    let r = Row::new(row);
    let product_row = r.nested("product_types");
    let created_at = r.time("created_at");
    ProductEntry {
        id: r.str("id"),
        product_type_id: r.uuid("product_type_id"),
        product_type: product(product_row.0),
        brand: product_row.str("brand"),
        category: product_row.str("category"),
        description: product_row.str("description"),
        created_at,
        updated_at: created_at,
        quantity: r.u64("quantity"),
        from: EntryLocation {
            id: r.str("from_id"),
            location_type: r.parse("from_type", LocationType::parse),
        },
        to: EntryLocation {
            id: r.str("beneficiary_id"),
            location_type: LocationType::Beneficiary,
        },
        entry_type: EntryType::Donation,
        organization_id: r.uuid("organization_id"),
        organization: organization(r.nested("organizations").0),
    }
}

// ---------------------------------------------------------------------------
// Volunteers
// ---------------------------------------------------------------------------

pub fn volunteer(row: &Value) -> Volunteer {
    let r = Row::new(row);
    Volunteer {
        id: r.uuid("id"),
        organization_id: r.uuid("organization_id"),
        full_name: r.str("full_name"),
        email: r.str("email"),
        gender: r.str("gender"),
        documents: r.json_or("documents", Value::Array(Vec::new())),
        birthdate: r.str("birthdate"),
        phones: r.strings("phones"),
        address: r.object("address"),
        status: r.parse("status", VolunteerStatus::parse),
        segments: r.strings("segments"),
        medical_information: r.object("medical_information"),
        emergency_contacts: r.json_or("emergency_contacts", Value::Array(Vec::new())),
        notes: r.str("notes"),
        created_at: r.time("created_at"),
        updated_at: r.time("updated_at"),
    }
}

// ---------------------------------------------------------------------------
// Invites and requests
// ---------------------------------------------------------------------------

pub fn organization_invite(row: &Value) -> OrganizationInvite {
    let r = Row::new(row);
    OrganizationInvite {
        id: r.uuid("id"),
        organization_id: r.uuid("organization_id"),
        email: r.str("email"),
        role: r.str("role"),
        status: r.parse("status", RequestStatus::parse),
        created_at: r.time("created_at"),
    }
}

pub fn join_request(row: &Value) -> JoinOrganizationRequest {
    let r = Row::new(row);
    JoinOrganizationRequest {
        id: r.uuid("id"),
        organization_id: r.uuid("organization_id"),
        user_id: r.uuid("user_id"),
        user: user_summary(r.nested("user").0),
        status: r.parse("status", RequestStatus::parse),
        created_at: r.time("created_at"),
    }
}

pub fn data_access_request(row: &Value) -> DataAccessRequest {
    let r = Row::new(row);
    DataAccessRequest {
        id: r.uuid("id"),
        target_organization_id: r.uuid("target_organization_id"),
        requesting_organization_id: r.uuid("requesting_organization_id"),
        requesting_organization: organization(r.nested("requesting_organization").0),
        status: r.parse("status", RequestStatus::parse),
        created_at: r.time("created_at"),
    }
}

pub fn type_request(row: &Value) -> OrganizationTypeRequest {
    let r = Row::new(row);
    OrganizationTypeRequest {
        id: r.uuid("id"),
        organization_id: r.uuid("organization_id"),
        organization: organization(r.nested("organization").0),
        requested_by_id: r.uuid("requested_by_id"),
        requested_by: user_summary(r.nested("requested_by").0),
        new_type: r.parse("new_type", OrganizationType::parse),
        status: r.parse("status", RequestStatus::parse),
        created_at: r.time("created_at"),
    }
}

pub fn platform_invite(row: &Value) -> PlatformInvite {
    let r = Row::new(row);
    PlatformInvite {
        id: r.uuid("id"),
        organization_id: r.opt_uuid("organization_id"),
        email: r.str("email"),
        status: r.parse("status", RequestStatus::parse),
        created_at: r.time("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn null_rows_transform_to_defaults() {
        let row = Value::Null;

        let b = beneficiary(&row);
        assert_eq!(b.id, Uuid::nil());
        assert_eq!(b.full_name, "");
        assert!(b.phones.is_empty());
        assert_eq!(b.address, json!({}));
        assert_eq!(b.medical_information, json!({}));
        assert_eq!(b.current_housing, HousingSummary::default());
        assert_eq!(b.status, BeneficiaryStatus::Active);

        let v = volunteer(&row);
        assert_eq!(v.documents, json!([]));
        assert_eq!(v.emergency_contacts, json!([]));
        assert!(v.segments.is_empty());

        let o = organization(&row);
        assert_eq!(o.address, json!({}));
        assert!(o.access_granted_ids.is_empty());

        let u = user(&row);
        assert_eq!(u.preferences, Preferences::default());
        assert_eq!(u.platform_role, PlatformRole::NoOrg);

        let s = space(&row);
        assert_eq!((s.total_vacancies, s.occupied_vacancies), (0, 0));

        let p = product(&row);
        assert_eq!(p.unit_type, "pcs");
        assert_eq!(p.total_in_storage, 0);
    }

    #[test]
    fn explicit_nulls_are_treated_as_missing() {
        let row = json!({
            "id": "0b7b4a3e-98a4-4d8e-9d35-2f4a1f5c1c01",
            "full_name": "Ana Maria Souza",
            "address": null,
            "phones": null,
            "documents": null,
            "status": "NOT_A_STATUS",
        });
        let b = beneficiary(&row);
        assert_eq!(b.address, json!({}));
        assert!(b.phones.is_empty());
        assert_eq!(b.documents, json!({}));
        assert_eq!(b.status, BeneficiaryStatus::Active);
    }

    #[test]
    fn case_flattens_embedded_relations() {
        let row = json!({
            "id": "4c0e7f9a-5a3f-4f0c-8b8e-0c2d6d1f2a11",
            "case_number": "CASE-20240105-123456",
            "title": "Housing support",
            "status": "IN_PROGRESS",
            "beneficiary_id": "0b7b4a3e-98a4-4d8e-9d35-2f4a1f5c1c01",
            "budget_allocated": 150.5,
            "updated_at": "2024-01-05T10:00:00Z",
            "beneficiaries": {
                "id": "0b7b4a3e-98a4-4d8e-9d35-2f4a1f5c1c01",
                "full_name": "Ana Maria Souza",
                "phones": ["+351 900 000 000", "+351 911 111 111"],
                "address": {"street": "Rua Augusta 1"}
            },
            "assigned_to": null,
            "assigned_to_id": "9a1c2b3d-4e5f-4a6b-8c7d-0e1f2a3b4c5d"
        });
        let c = case(&row);
        assert_eq!(c.status, CaseStatus::InProgress);
        assert_eq!(c.beneficiary.first_name, "Ana");
        assert_eq!(c.beneficiary.last_name, "Maria Souza");
        assert_eq!(c.beneficiary.phone, "+351 900 000 000");
        assert_eq!(c.beneficiary.current_address, "Rua Augusta 1");
        assert_eq!(c.budget_allocated, "150.5");
        assert_eq!(c.assigned_to.id, c.assigned_to_id.unwrap());
        assert_eq!(c.assigned_to.first_name, "");
        assert_eq!(c.last_activity, c.updated_at);
    }

    #[test]
    fn note_and_document_defaults() {
        let note = case_note(&json!({"author_id": "9a1c2b3d-4e5f-4a6b-8c7d-0e1f2a3b4c5d"}));
        assert_eq!(note.title, "Note");
        assert_eq!(note.note_type, NoteType::Update);
        assert_eq!(note.created_by.name, "Unknown User");

        let note = case_note(&json!({"users": {"id": null, "first_name": "Ana", "last_name": null}}));
        assert_eq!(note.created_by.name, "Ana");

        let doc = case_document(&json!({"file_name": "id.pdf"}));
        assert_eq!(doc.document_name, "id.pdf");
        assert_eq!(doc.document_type, "OTHER");
        assert_eq!(doc.mime_type, "application/octet-stream");
    }

    #[test]
    fn date_only_columns_parse() {
        let row = json!({"due_date": "2024-03-01"});
        let c = case(&row);
        assert_eq!(
            c.due_date.map(|d| d.to_rfc3339()),
            Some("2024-03-01T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn donation_goes_to_beneficiary() {
        let entry = donation(&json!({
            "id": "d1",
            "quantity": 4,
            "from_id": "org-1",
            "beneficiary_id": "b-1",
            "product_types": {"name": "Rice", "brand": "Acme"}
        }));
        assert_eq!(entry.entry_type, EntryType::Donation);
        assert_eq!(entry.from.location_type, LocationType::Organization);
        assert_eq!(entry.to.id, "b-1");
        assert_eq!(entry.to.location_type, LocationType::Beneficiary);
        assert_eq!(entry.brand, "Acme");
        assert_eq!(entry.product_type.unit_type, "pcs");
    }
}

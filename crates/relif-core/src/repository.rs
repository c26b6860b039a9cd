//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Organization-scoped listings take
//! the organization id explicitly; single-row operations address rows by
//! their own id.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RelifResult;
use crate::models::{
    auth::{AuthUser, InviteSignUpInput, SignUpInput, SignedIn},
    beneficiary::{
        AllocationTarget, Beneficiary, BeneficiaryAllocation, BeneficiaryStats, CreateBeneficiary,
        UpdateBeneficiary,
    },
    case::{
        Case, CaseDocument, CaseNote, CaseStats, CreateCase, CreateCaseDocument, CreateCaseNote,
        DownloadLink, UpdateCase, UpdateCaseDocument, UpdateCaseNote, UploadLink,
    },
    housing::{
        CreateHousing, CreateSpace, Housing, HousingStats, Space, UpdateHousing, UpdateSpace,
    },
    inventory::{
        AddStock, CreateProduct, InventoryStats, MoveStock, ProductEntry, ProductType,
        StockLevel, StorageRecord, UpdateProduct,
    },
    organization::{CreateOrganization, Organization, UpdateOrganization},
    requests::{
        DataAccessRequest, JoinOrganizationRequest, OrganizationInvite, OrganizationTypeRequest,
        PlatformInvite,
    },
    user::{PlatformRole, UpdateUser, User, UserSearch, UserStatus},
    volunteer::{CreateVolunteer, UpdateVolunteer, Volunteer, VolunteerStats, VolunteerStatus},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Pagination {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// Inclusive row range `(from, to)` covered by this page, or `None`
    /// for an empty page.
    pub fn range(&self) -> Option<(u64, u64)> {
        if self.limit == 0 {
            return None;
        }
        Some((self.offset, self.offset + self.limit - 1))
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
        }
    }
}

/// A paginated result set.
///
/// `count` is the number of rows matching the filter, independent of the
/// requested page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub count: u64,
    pub data: Vec<T>,
}

impl<T> PaginatedResult<T> {
    pub fn empty() -> Self {
        Self {
            count: 0,
            data: Vec::new(),
        }
    }
}

impl<T> Default for PaginatedResult<T> {
    fn default() -> Self {
        Self::empty()
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

pub trait AuthRepository: Send + Sync {
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = RelifResult<SignedIn>> + Send;
    fn sign_out(&self) -> impl Future<Output = RelifResult<()>> + Send;
    /// Returns the access token of the new session.
    fn sign_up(&self, input: SignUpInput) -> impl Future<Output = RelifResult<String>> + Send;
    fn org_sign_up(
        &self,
        input: InviteSignUpInput,
    ) -> impl Future<Output = RelifResult<String>> + Send;
    fn admin_sign_up(
        &self,
        input: InviteSignUpInput,
    ) -> impl Future<Output = RelifResult<String>> + Send;
    /// The signed-in user, shaped from auth metadata.
    fn me(&self) -> impl Future<Output = RelifResult<User>> + Send;
    fn current_auth_user(&self) -> impl Future<Output = RelifResult<AuthUser>> + Send;
    fn request_password_change(&self, email: &str)
    -> impl Future<Output = RelifResult<()>> + Send;
    fn update_password(&self, password: &str) -> impl Future<Output = RelifResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Organization & users (global scope)
// ---------------------------------------------------------------------------

pub trait OrganizationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateOrganization,
    ) -> impl Future<Output = RelifResult<Organization>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RelifResult<Organization>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateOrganization,
    ) -> impl Future<Output = RelifResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = RelifResult<PaginatedResult<Organization>>> + Send;
    fn deactivate(&self, id: Uuid) -> impl Future<Output = RelifResult<()>> + Send;
    fn reactivate(&self, id: Uuid) -> impl Future<Output = RelifResult<()>> + Send;
}

pub trait UserRepository: Send + Sync {
    fn list_by_organization(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = RelifResult<PaginatedResult<User>>> + Send;
    /// Users holding the platform-staff role.
    fn list_platform_staff(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = RelifResult<PaginatedResult<User>>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RelifResult<User>> + Send;
    fn update(&self, id: Uuid, input: UpdateUser) -> impl Future<Output = RelifResult<User>> + Send;
    fn reactivate(&self, id: Uuid) -> impl Future<Output = RelifResult<User>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = RelifResult<()>> + Send;
    fn update_status(
        &self,
        id: Uuid,
        status: UserStatus,
    ) -> impl Future<Output = RelifResult<User>> + Send;
    fn update_platform_role(
        &self,
        id: Uuid,
        role: PlatformRole,
    ) -> impl Future<Output = RelifResult<User>> + Send;
    fn search(
        &self,
        search: UserSearch,
        pagination: Pagination,
    ) -> impl Future<Output = RelifResult<PaginatedResult<User>>> + Send;
}

// ---------------------------------------------------------------------------
// Organization-scoped repositories
// ---------------------------------------------------------------------------

pub trait BeneficiaryRepository: Send + Sync {
    fn list_by_organization(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
        search: &str,
    ) -> impl Future<Output = RelifResult<PaginatedResult<Beneficiary>>> + Send;
    fn create(
        &self,
        organization_id: Uuid,
        input: CreateBeneficiary,
    ) -> impl Future<Output = RelifResult<Beneficiary>> + Send;
    fn stats(
        &self,
        organization_id: Uuid,
    ) -> impl Future<Output = RelifResult<BeneficiaryStats>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RelifResult<Beneficiary>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateBeneficiary,
    ) -> impl Future<Output = RelifResult<Beneficiary>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = RelifResult<()>> + Send;
    /// First placement of a beneficiary into a room.
    fn allocate(
        &self,
        id: Uuid,
        target: AllocationTarget,
    ) -> impl Future<Output = RelifResult<BeneficiaryAllocation>> + Send;
    /// Move an allocated beneficiary to another room.
    fn reallocate(
        &self,
        id: Uuid,
        target: AllocationTarget,
    ) -> impl Future<Output = RelifResult<BeneficiaryAllocation>> + Send;
    fn allocations(
        &self,
        id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = RelifResult<PaginatedResult<BeneficiaryAllocation>>> + Send;
}

pub trait HousingRepository: Send + Sync {
    fn list_by_organization(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
        search: &str,
    ) -> impl Future<Output = RelifResult<PaginatedResult<Housing>>> + Send;
    fn stats(
        &self,
        organization_id: Uuid,
    ) -> impl Future<Output = RelifResult<HousingStats>> + Send;
    /// Creates a housing in the signed-in user's organization.
    fn create(&self, input: CreateHousing) -> impl Future<Output = RelifResult<Housing>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RelifResult<Housing>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateHousing,
    ) -> impl Future<Output = RelifResult<Housing>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = RelifResult<()>> + Send;
    fn spaces(
        &self,
        housing_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = RelifResult<PaginatedResult<Space>>> + Send;
    fn beneficiaries(
        &self,
        housing_id: Uuid,
        pagination: Pagination,
        search: &str,
    ) -> impl Future<Output = RelifResult<PaginatedResult<Beneficiary>>> + Send;
    fn allocations(
        &self,
        housing_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = RelifResult<PaginatedResult<BeneficiaryAllocation>>> + Send;
    fn create_spaces(
        &self,
        housing_id: Uuid,
        spaces: Vec<CreateSpace>,
    ) -> impl Future<Output = RelifResult<Vec<Space>>> + Send;
}

pub trait SpaceRepository: Send + Sync {
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RelifResult<Space>> + Send;
    fn create(
        &self,
        housing_id: Uuid,
        input: CreateSpace,
    ) -> impl Future<Output = RelifResult<Space>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateSpace,
    ) -> impl Future<Output = RelifResult<Space>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = RelifResult<()>> + Send;
    fn beneficiaries(
        &self,
        space_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = RelifResult<PaginatedResult<Beneficiary>>> + Send;
    /// Allocation rows that moved beneficiaries into or out of the room.
    fn allocations(
        &self,
        space_id: Uuid,
    ) -> impl Future<Output = RelifResult<Vec<BeneficiaryAllocation>>> + Send;
}

pub trait CaseRepository: Send + Sync {
    fn list_by_organization(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
        search: &str,
    ) -> impl Future<Output = RelifResult<PaginatedResult<Case>>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RelifResult<Case>> + Send;
    /// Creates a case in the signed-in user's organization.
    fn create(&self, input: CreateCase) -> impl Future<Output = RelifResult<Case>> + Send;
    fn update(&self, id: Uuid, input: UpdateCase) -> impl Future<Output = RelifResult<Case>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = RelifResult<()>> + Send;
    fn stats(&self, organization_id: Uuid) -> impl Future<Output = RelifResult<CaseStats>> + Send;

    fn list_notes(&self, case_id: Uuid) -> impl Future<Output = RelifResult<Vec<CaseNote>>> + Send;
    fn create_note(
        &self,
        case_id: Uuid,
        input: CreateCaseNote,
    ) -> impl Future<Output = RelifResult<CaseNote>> + Send;
    fn update_note(
        &self,
        case_id: Uuid,
        note_id: Uuid,
        input: UpdateCaseNote,
    ) -> impl Future<Output = RelifResult<CaseNote>> + Send;
    fn delete_note(
        &self,
        case_id: Uuid,
        note_id: Uuid,
    ) -> impl Future<Output = RelifResult<()>> + Send;

    fn list_documents(
        &self,
        case_id: Uuid,
    ) -> impl Future<Output = RelifResult<Vec<CaseDocument>>> + Send;
    fn document_upload_link(
        &self,
        case_id: Uuid,
        file_type: &str,
    ) -> impl Future<Output = RelifResult<UploadLink>> + Send;
    fn document_download_link(
        &self,
        case_id: Uuid,
        document_id: Uuid,
    ) -> impl Future<Output = RelifResult<DownloadLink>> + Send;
    fn create_document(
        &self,
        case_id: Uuid,
        input: CreateCaseDocument,
    ) -> impl Future<Output = RelifResult<CaseDocument>> + Send;
    fn update_document(
        &self,
        case_id: Uuid,
        document_id: Uuid,
        input: UpdateCaseDocument,
    ) -> impl Future<Output = RelifResult<CaseDocument>> + Send;
    fn delete_document(
        &self,
        case_id: Uuid,
        document_id: Uuid,
    ) -> impl Future<Output = RelifResult<()>> + Send;
}

pub trait InventoryRepository: Send + Sync {
    fn list_by_organization(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
        search: &str,
    ) -> impl Future<Output = RelifResult<PaginatedResult<ProductType>>> + Send;
    fn stats(
        &self,
        organization_id: Uuid,
    ) -> impl Future<Output = RelifResult<InventoryStats>> + Send;
    fn create(
        &self,
        organization_id: Uuid,
        input: CreateProduct,
    ) -> impl Future<Output = RelifResult<ProductType>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RelifResult<ProductType>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateProduct,
    ) -> impl Future<Output = RelifResult<ProductType>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = RelifResult<()>> + Send;
    fn add_stock(
        &self,
        id: Uuid,
        input: AddStock,
    ) -> impl Future<Output = RelifResult<StockLevel>> + Send;
    fn move_stock(
        &self,
        id: Uuid,
        input: MoveStock,
    ) -> impl Future<Output = RelifResult<StockLevel>> + Send;
    fn allocations(
        &self,
        id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = RelifResult<PaginatedResult<ProductEntry>>> + Send;
    fn donations(
        &self,
        id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = RelifResult<PaginatedResult<ProductEntry>>> + Send;
    fn storage_records(
        &self,
        id: Uuid,
    ) -> impl Future<Output = RelifResult<Vec<StorageRecord>>> + Send;
}

pub trait VolunteerRepository: Send + Sync {
    fn list_by_organization(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
        search: &str,
    ) -> impl Future<Output = RelifResult<PaginatedResult<Volunteer>>> + Send;
    fn stats(
        &self,
        organization_id: Uuid,
    ) -> impl Future<Output = RelifResult<VolunteerStats>> + Send;
    fn create(
        &self,
        organization_id: Uuid,
        input: CreateVolunteer,
    ) -> impl Future<Output = RelifResult<Volunteer>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RelifResult<Volunteer>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateVolunteer,
    ) -> impl Future<Output = RelifResult<Volunteer>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = RelifResult<()>> + Send;
    fn update_status(
        &self,
        id: Uuid,
        status: VolunteerStatus,
    ) -> impl Future<Output = RelifResult<Volunteer>> + Send;
}

// ---------------------------------------------------------------------------
// Invites and requests
// ---------------------------------------------------------------------------

pub trait RequestRepository: Send + Sync {
    fn create_organization_invite(
        &self,
        organization_id: Uuid,
        email: &str,
        role: &str,
    ) -> impl Future<Output = RelifResult<()>> + Send;
    fn list_organization_invites(
        &self,
        organization_id: Uuid,
    ) -> impl Future<Output = RelifResult<Vec<OrganizationInvite>>> + Send;
    fn cancel_organization_invite(&self, id: Uuid)
    -> impl Future<Output = RelifResult<()>> + Send;

    fn list_join_requests(
        &self,
        organization_id: Uuid,
    ) -> impl Future<Output = RelifResult<Vec<JoinOrganizationRequest>>> + Send;
    /// Runs server-side: adds the user to the organization and closes the
    /// request.
    fn accept_join_request(&self, id: Uuid) -> impl Future<Output = RelifResult<()>> + Send;
    fn reject_join_request(&self, id: Uuid) -> impl Future<Output = RelifResult<()>> + Send;

    fn list_data_access_requests(
        &self,
        target_organization_id: Uuid,
    ) -> impl Future<Output = RelifResult<Vec<DataAccessRequest>>> + Send;
    fn accept_data_access_request(&self, id: Uuid)
    -> impl Future<Output = RelifResult<()>> + Send;
    fn reject_data_access_request(&self, id: Uuid)
    -> impl Future<Output = RelifResult<()>> + Send;

    fn list_type_requests(
        &self,
        organization_id: Uuid,
    ) -> impl Future<Output = RelifResult<Vec<OrganizationTypeRequest>>> + Send;
    fn accept_type_request(&self, id: Uuid) -> impl Future<Output = RelifResult<()>> + Send;
    fn reject_type_request(&self, id: Uuid) -> impl Future<Output = RelifResult<()>> + Send;
    /// Filed on behalf of the signed-in user.
    fn create_type_request(
        &self,
        organization_id: Uuid,
        new_type: crate::models::organization::OrganizationType,
    ) -> impl Future<Output = RelifResult<()>> + Send;

    fn list_platform_invites(
        &self,
        organization_id: Uuid,
    ) -> impl Future<Output = RelifResult<Vec<PlatformInvite>>> + Send;
    fn accept_platform_invite(&self, id: Uuid) -> impl Future<Output = RelifResult<()>> + Send;
    fn create_platform_admin_invite(
        &self,
        email: &str,
    ) -> impl Future<Output = RelifResult<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_range_is_inclusive() {
        assert_eq!(Pagination::new(0, 20).range(), Some((0, 19)));
        assert_eq!(Pagination::new(20, 20).range(), Some((20, 39)));
        assert_eq!(Pagination::new(5, 0).range(), None);
    }

    #[test]
    fn legacy_envelope_deserializes() {
        let page: PaginatedResult<u32> =
            serde_json::from_value(serde_json::json!({"count": 3, "data": [1, 2]})).unwrap();
        assert_eq!(page.count, 3);
        assert_eq!(page.data, vec![1, 2]);
    }
}

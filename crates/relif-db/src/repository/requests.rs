//! Hosted implementation of [`RequestRepository`]: invites and the requests
//! an organization receives or files.

use relif_core::error::RelifResult;
use relif_core::models::organization::OrganizationType;
use relif_core::models::requests::{
    DataAccessRequest, JoinOrganizationRequest, OrganizationInvite, OrganizationTypeRequest,
    PlatformInvite, RequestStatus,
};
use relif_core::repository::RequestRepository;
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use crate::backend::{Backend, EdgeCall};
use crate::error::DbError;
use crate::legacy::{LegacyApi, LegacyRequest};
use crate::query::Embed;
use crate::transform;

const ORGANIZATION_INVITES: &str = "organization_invites";
const JOIN_REQUESTS: &str = "organization_join_requests";
const DATA_ACCESS_REQUESTS: &str = "organization_data_access_requests";
const TYPE_REQUESTS: &str = "update_organization_type_requests";
const PLATFORM_INVITES: &str = "platform_invites";
const PLATFORM_ADMIN_INVITES: &str = "platform_admin_invites";

/// Server-side function that moves the requesting user into the
/// organization.
const ACCEPT_JOIN_REQUEST: &str = "accept-join-request";

super::hosted_repository! {
    /// Organization invites, join, data access and type change requests,
    /// and platform invites.
    SupabaseRequestRepository
}

impl<B: Backend, L: LegacyApi> SupabaseRequestRepository<B, L> {
    async fn set_status(&self, table: &str, id: Uuid, status: RequestStatus) -> Result<(), DbError> {
        let updated = self
            .client
            .from(table)
            .update(json!({ "status": status }))
            .eq("id", id)
            .execute()
            .await?;
        if updated.rows.is_empty() {
            return Err(DbError::not_found(table, id));
        }
        info!(table, id = %id, %status, "Request status changed");
        Ok(())
    }

    async fn insert(&self, table: &str, row: Value) -> Result<(), DbError> {
        self.client.from(table).insert(row).execute().await?;
        Ok(())
    }

    async fn list<T>(
        &self,
        table: &str,
        column: &str,
        organization_id: Uuid,
        embeds: Vec<Embed>,
        transform: fn(&Value) -> T,
    ) -> Result<Vec<T>, DbError> {
        let mut query = self.client.from(table).eq(column, organization_id);
        for embed in embeds {
            query = query.embed(embed);
        }
        let output = query.order("created_at", false).execute().await?;
        Ok(output.rows.iter().map(transform).collect())
    }
}

impl<B: Backend, L: LegacyApi> RequestRepository for SupabaseRequestRepository<B, L> {
    async fn create_organization_invite(
        &self,
        organization_id: Uuid,
        email: &str,
        role: &str,
    ) -> RelifResult<()> {
        let legacy = LegacyRequest::post("join-organization-invites").json(&json!({
            "organization_id": organization_id,
            "email": email,
            "role": role,
        }));
        let hosted = async {
            self.insert(
                ORGANIZATION_INVITES,
                json!({
                    "organization_id": organization_id,
                    "email": email,
                    "role": role,
                    "status": RequestStatus::Pending,
                }),
            )
            .await?;
            info!(%organization_id, email, role, "Organization invite created");
            Ok::<_, DbError>(())
        };
        Ok(self.fallback.run_void("invites.create", hosted, legacy).await?)
    }

    async fn list_organization_invites(
        &self,
        organization_id: Uuid,
    ) -> RelifResult<Vec<OrganizationInvite>> {
        let legacy = LegacyRequest::get(format!(
            "organizations/{organization_id}/join-organization-invites"
        ));
        let hosted = self.list(
            ORGANIZATION_INVITES,
            "organization_id",
            organization_id,
            Vec::new(),
            transform::organization_invite,
        );
        Ok(self.fallback.run("invites.list", hosted, legacy).await?)
    }

    async fn cancel_organization_invite(&self, id: Uuid) -> RelifResult<()> {
        let legacy = LegacyRequest::put(format!("join-organization-invites/{id}/cancel"));
        let hosted = self.set_status(ORGANIZATION_INVITES, id, RequestStatus::Canceled);
        Ok(self.fallback.run_void("invites.cancel", hosted, legacy).await?)
    }

    async fn list_join_requests(
        &self,
        organization_id: Uuid,
    ) -> RelifResult<Vec<JoinOrganizationRequest>> {
        let legacy = LegacyRequest::get(format!(
            "organizations/{organization_id}/join-organization-requests"
        ));
        let hosted = self.list(
            JOIN_REQUESTS,
            "organization_id",
            organization_id,
            vec![Embed::new("user", "users", "user_id", &[])],
            transform::join_request,
        );
        Ok(self.fallback.run("join_requests.list", hosted, legacy).await?)
    }

    async fn accept_join_request(&self, id: Uuid) -> RelifResult<()> {
        let legacy = LegacyRequest::put(format!("join-organization-requests/{id}/accept"));
        let hosted = async {
            self.client
                .call_edge_function(ACCEPT_JOIN_REQUEST, EdgeCall::post(json!({ "requestId": id })))
                .await?;
            info!(request_id = %id, "Join request accepted");
            Ok::<_, DbError>(())
        };
        Ok(self.fallback.run_void("join_requests.accept", hosted, legacy).await?)
    }

    async fn reject_join_request(&self, id: Uuid) -> RelifResult<()> {
        let legacy = LegacyRequest::put(format!("join-organization-requests/{id}/reject"));
        let hosted = self.set_status(JOIN_REQUESTS, id, RequestStatus::Rejected);
        Ok(self.fallback.run_void("join_requests.reject", hosted, legacy).await?)
    }

    async fn list_data_access_requests(
        &self,
        target_organization_id: Uuid,
    ) -> RelifResult<Vec<DataAccessRequest>> {
        let legacy = LegacyRequest::get(format!(
            "organizations/{target_organization_id}/organization-data-access-requests"
        ));
        let hosted = self.list(
            DATA_ACCESS_REQUESTS,
            "target_organization_id",
            target_organization_id,
            vec![Embed::new(
                "requesting_organization",
                "organizations",
                "requesting_organization_id",
                &[],
            )],
            transform::data_access_request,
        );
        Ok(self.fallback.run("data_access_requests.list", hosted, legacy).await?)
    }

    async fn accept_data_access_request(&self, id: Uuid) -> RelifResult<()> {
        let legacy = LegacyRequest::put(format!("organization-data-access-requests/{id}/accept"));
        let hosted = self.set_status(DATA_ACCESS_REQUESTS, id, RequestStatus::Granted);
        Ok(self.fallback.run_void("data_access_requests.accept", hosted, legacy).await?)
    }

    async fn reject_data_access_request(&self, id: Uuid) -> RelifResult<()> {
        let legacy = LegacyRequest::put(format!("organization-data-access-requests/{id}/reject"));
        let hosted = self.set_status(DATA_ACCESS_REQUESTS, id, RequestStatus::Rejected);
        Ok(self.fallback.run_void("data_access_requests.reject", hosted, legacy).await?)
    }

    async fn list_type_requests(
        &self,
        organization_id: Uuid,
    ) -> RelifResult<Vec<OrganizationTypeRequest>> {
        let legacy = LegacyRequest::get(format!(
            "organizations/{organization_id}/update-organization-type-requests"
        ));
        let hosted = self.list(
            TYPE_REQUESTS,
            "organization_id",
            organization_id,
            vec![
                Embed::new("organization", "organizations", "organization_id", &[]),
                Embed::new("requested_by", "users", "requested_by_id", &[]),
            ],
            transform::type_request,
        );
        Ok(self.fallback.run("type_requests.list", hosted, legacy).await?)
    }

    async fn accept_type_request(&self, id: Uuid) -> RelifResult<()> {
        let legacy = LegacyRequest::put(format!("update-organization-type-requests/{id}/accept"));
        let hosted = self.set_status(TYPE_REQUESTS, id, RequestStatus::Approved);
        Ok(self.fallback.run_void("type_requests.accept", hosted, legacy).await?)
    }

    async fn reject_type_request(&self, id: Uuid) -> RelifResult<()> {
        let legacy = LegacyRequest::put(format!("update-organization-type-requests/{id}/reject"));
        let hosted = self.set_status(TYPE_REQUESTS, id, RequestStatus::Rejected);
        Ok(self.fallback.run_void("type_requests.reject", hosted, legacy).await?)
    }

    async fn create_type_request(
        &self,
        organization_id: Uuid,
        new_type: OrganizationType,
    ) -> RelifResult<()> {
        let legacy = LegacyRequest::post("update-organization-type-requests").json(&json!({
            "organization_id": organization_id,
            "new_type": new_type,
        }));
        let hosted = async {
            let requested_by_id = self.client.current_user_id()?;
            self.insert(
                TYPE_REQUESTS,
                json!({
                    "organization_id": organization_id,
                    "requested_by_id": requested_by_id,
                    "new_type": new_type,
                    "status": RequestStatus::Pending,
                }),
            )
            .await?;
            info!(%organization_id, %new_type, "Organization type change requested");
            Ok::<_, DbError>(())
        };
        Ok(self.fallback.run_void("type_requests.create", hosted, legacy).await?)
    }

    async fn list_platform_invites(&self, organization_id: Uuid) -> RelifResult<Vec<PlatformInvite>> {
        let legacy =
            LegacyRequest::get(format!("organizations/{organization_id}/join-platform-invites"));
        let hosted = self.list(
            PLATFORM_INVITES,
            "organization_id",
            organization_id,
            Vec::new(),
            transform::platform_invite,
        );
        Ok(self.fallback.run("platform_invites.list", hosted, legacy).await?)
    }

    async fn accept_platform_invite(&self, id: Uuid) -> RelifResult<()> {
        let legacy = LegacyRequest::put(format!("join-platform-invites/{id}/accept"));
        let hosted = self.set_status(PLATFORM_INVITES, id, RequestStatus::Accepted);
        Ok(self.fallback.run_void("platform_invites.accept", hosted, legacy).await?)
    }

    async fn create_platform_admin_invite(&self, email: &str) -> RelifResult<()> {
        let legacy =
            LegacyRequest::post("join-platform-admin-invites").json(&json!({ "email": email }));
        let hosted = async {
            self.insert(
                PLATFORM_ADMIN_INVITES,
                json!({ "email": email, "status": RequestStatus::Pending }),
            )
            .await?;
            info!(email, "Platform admin invite created");
            Ok::<_, DbError>(())
        };
        Ok(self.fallback.run_void("platform_admin_invites.create", hosted, legacy).await?)
    }
}

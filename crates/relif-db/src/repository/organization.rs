//! Hosted implementation of [`OrganizationRepository`].

use relif_core::error::RelifResult;
use relif_core::models::organization::{
    CreateOrganization, Organization, RecordStatus, UpdateOrganization,
};
use relif_core::repository::{OrganizationRepository, PaginatedResult, Pagination};
use serde_json::{Value, json};
use tracing::{debug, info};
use uuid::Uuid;

use super::{changes, first_row, page};
use crate::backend::Backend;
use crate::error::DbError;
use crate::legacy::{LegacyApi, LegacyRequest};
use crate::transform;

const TABLE: &str = "organizations";

super::hosted_repository! {
    /// Organizations, addressed globally by id.
    SupabaseOrganizationRepository
}

impl<B: Backend, L: LegacyApi> SupabaseOrganizationRepository<B, L> {
    /// Applies `patch` to one organization; `NotFound` when no row matched.
    async fn patch(&self, id: Uuid, patch: Value) -> Result<(), DbError> {
        let updated = self
            .client
            .from(TABLE)
            .update(patch)
            .eq("id", id)
            .execute()
            .await?;
        if updated.rows.is_empty() {
            return Err(DbError::not_found(TABLE, id));
        }
        Ok(())
    }

    async fn set_status(&self, id: Uuid, status: RecordStatus) -> Result<(), DbError> {
        self.patch(id, json!({ "status": status })).await
    }
}

impl<B: Backend, L: LegacyApi> OrganizationRepository for SupabaseOrganizationRepository<B, L> {
    async fn create(&self, input: CreateOrganization) -> RelifResult<Organization> {
        let legacy = LegacyRequest::post(TABLE).json(&input);
        let hosted = async {
            let owner_id = self.client.current_user_id()?;
            let mut row = changes(&input)?;
            if let Some(object) = row.as_object_mut() {
                object.insert("status".into(), json!(RecordStatus::Active));
                object.insert("owner_id".into(), json!(owner_id));
            }
            let output = self.client.from(TABLE).insert(row).execute().await?;
            let created = transform::organization(&first_row(output, TABLE, &input.name)?);
            info!(organization_id = %created.id, name = %created.name, "Organization created");
            Ok::<_, DbError>(created)
        };
        Ok(self.fallback.run("organizations.create", hosted, legacy).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> RelifResult<Organization> {
        let legacy = LegacyRequest::get(format!("{TABLE}/{id}"));
        let hosted = async {
            let row = self.client.from(TABLE).eq("id", id).single().await?;
            Ok::<_, DbError>(transform::organization(&row))
        };
        Ok(self.fallback.run("organizations.get", hosted, legacy).await?)
    }

    async fn update(&self, id: Uuid, input: UpdateOrganization) -> RelifResult<()> {
        let legacy = LegacyRequest::put(format!("{TABLE}/{id}")).json(&input);
        let hosted = async {
            self.patch(id, changes(&input)?).await?;
            info!(organization_id = %id, "Organization updated");
            Ok::<_, DbError>(())
        };
        Ok(self.fallback.run_void("organizations.update", hosted, legacy).await?)
    }

    async fn list(&self, pagination: Pagination) -> RelifResult<PaginatedResult<Organization>> {
        debug!(offset = pagination.offset, limit = pagination.limit, "Listing organizations");
        let legacy = LegacyRequest::get(TABLE).page(pagination);
        let hosted = async {
            let output = self
                .client
                .from(TABLE)
                .order("created_at", false)
                .page(pagination)
                .execute()
                .await?;
            Ok::<_, DbError>(page(output, transform::organization))
        };
        Ok(self.fallback.run("organizations.list", hosted, legacy).await?)
    }

    async fn deactivate(&self, id: Uuid) -> RelifResult<()> {
        let legacy = LegacyRequest::put(format!("{TABLE}/{id}/deactivate"));
        let hosted = async {
            self.set_status(id, RecordStatus::Inactive).await?;
            info!(organization_id = %id, "Organization deactivated");
            Ok::<_, DbError>(())
        };
        Ok(self.fallback.run_void("organizations.deactivate", hosted, legacy).await?)
    }

    async fn reactivate(&self, id: Uuid) -> RelifResult<()> {
        let legacy = LegacyRequest::put(format!("{TABLE}/{id}/reactivate"));
        let hosted = async {
            self.set_status(id, RecordStatus::Active).await?;
            info!(organization_id = %id, "Organization reactivated");
            Ok::<_, DbError>(())
        };
        Ok(self.fallback.run_void("organizations.reactivate", hosted, legacy).await?)
    }
}

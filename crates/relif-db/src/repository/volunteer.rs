//! Hosted implementation of [`VolunteerRepository`] over `voluntary_people`.

use relif_core::error::RelifResult;
use relif_core::models::volunteer::{
    CreateVolunteer, UpdateVolunteer, Volunteer, VolunteerStats, VolunteerStatus,
};
use relif_core::repository::{PaginatedResult, Pagination, VolunteerRepository};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use super::{changes, first_row, page, search};
use crate::backend::Backend;
use crate::error::DbError;
use crate::legacy::{LegacyApi, LegacyRequest};
use crate::{stats, transform};

const TABLE: &str = "voluntary_people";
const LEGACY_PREFIX: &str = "voluntaries";

super::hosted_repository! {
    /// Volunteers registered by an organization.
    SupabaseVolunteerRepository
}

impl<B: Backend, L: LegacyApi> VolunteerRepository for SupabaseVolunteerRepository<B, L> {
    async fn list_by_organization(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
        term: &str,
    ) -> RelifResult<PaginatedResult<Volunteer>> {
        debug!(%organization_id, offset = pagination.offset, search = term, "Listing volunteers");
        let legacy = LegacyRequest::get(format!("organizations/{organization_id}/{LEGACY_PREFIX}"))
            .page(pagination)
            .query("search", term);
        let hosted = async {
            let output = self
                .client
                .from(TABLE)
                .eq("organization_id", organization_id)
                .or(search(&["full_name", "email", "notes"], term))
                .order("created_at", false)
                .page(pagination)
                .execute()
                .await?;
            Ok::<_, DbError>(page(output, transform::volunteer))
        };
        Ok(self.fallback.run("volunteers.list", hosted, legacy).await?)
    }

    async fn stats(&self, organization_id: Uuid) -> RelifResult<VolunteerStats> {
        let legacy =
            LegacyRequest::get(format!("organizations/{organization_id}/{LEGACY_PREFIX}/stats"));
        let hosted = async {
            let rows =
                stats::organization_rows(&self.client, TABLE, "id,status", organization_id)
                    .await?;
            Ok::<_, DbError>(stats::volunteer_stats(&rows))
        };
        Ok(self.fallback.run("volunteers.stats", hosted, legacy).await?)
    }

    async fn create(
        &self,
        organization_id: Uuid,
        input: CreateVolunteer,
    ) -> RelifResult<Volunteer> {
        let legacy = LegacyRequest::post(format!("organizations/{organization_id}/{LEGACY_PREFIX}"))
            .json(&input);
        let hosted = async {
            let mut row = changes(&input)?;
            if let Some(object) = row.as_object_mut() {
                object.insert("organization_id".into(), json!(organization_id));
                object.insert("status".into(), json!(VolunteerStatus::Active));
            }
            let output = self.client.from(TABLE).insert(row).execute().await?;
            let created = transform::volunteer(&first_row(output, TABLE, &input.full_name)?);
            info!(volunteer_id = %created.id, %organization_id, "Volunteer created");
            Ok::<_, DbError>(created)
        };
        Ok(self.fallback.run("volunteers.create", hosted, legacy).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> RelifResult<Volunteer> {
        let legacy = LegacyRequest::get(format!("{LEGACY_PREFIX}/{id}"));
        let hosted = async {
            let row = self.client.from(TABLE).eq("id", id).single().await?;
            Ok::<_, DbError>(transform::volunteer(&row))
        };
        Ok(self.fallback.run("volunteers.get", hosted, legacy).await?)
    }

    async fn update(&self, id: Uuid, input: UpdateVolunteer) -> RelifResult<Volunteer> {
        let legacy = LegacyRequest::put(format!("{LEGACY_PREFIX}/{id}")).json(&input);
        let hosted = async {
            let row = self
                .client
                .from(TABLE)
                .update(changes(&input)?)
                .eq("id", id)
                .single()
                .await?;
            info!(volunteer_id = %id, "Volunteer updated");
            Ok::<_, DbError>(transform::volunteer(&row))
        };
        Ok(self.fallback.run("volunteers.update", hosted, legacy).await?)
    }

    async fn delete(&self, id: Uuid) -> RelifResult<()> {
        let legacy = LegacyRequest::delete(format!("{LEGACY_PREFIX}/{id}"));
        let hosted = async {
            self.client.from(TABLE).delete().eq("id", id).execute().await?;
            info!(volunteer_id = %id, "Volunteer deleted");
            Ok::<_, DbError>(())
        };
        Ok(self.fallback.run_void("volunteers.delete", hosted, legacy).await?)
    }

    async fn update_status(&self, id: Uuid, status: VolunteerStatus) -> RelifResult<Volunteer> {
        let legacy = LegacyRequest::put(format!("{LEGACY_PREFIX}/{id}/status"))
            .json(&json!({ "status": status }));
        let hosted = async {
            let row = self
                .client
                .from(TABLE)
                .update(json!({ "status": status }))
                .eq("id", id)
                .single()
                .await?;
            info!(volunteer_id = %id, %status, "Volunteer status updated");
            Ok::<_, DbError>(transform::volunteer(&row))
        };
        Ok(self.fallback.run("volunteers.update_status", hosted, legacy).await?)
    }
}

//! Hosted implementation of [`HousingRepository`].

use relif_core::error::RelifResult;
use relif_core::models::beneficiary::{Beneficiary, BeneficiaryAllocation};
use relif_core::models::housing::{
    CreateHousing, CreateSpace, Housing, HousingStats, Space, UpdateHousing,
};
use relif_core::models::organization::RecordStatus;
use relif_core::models::empty_object;
use relif_core::repository::{HousingRepository, PaginatedResult, Pagination};
use serde_json::{Value, json};
use tracing::{debug, info};
use uuid::Uuid;

use super::beneficiary::{allocation_query, beneficiary_query};
use super::{changes, first_row, page, search};
use crate::backend::Backend;
use crate::client::SupabaseClient;
use crate::error::DbError;
use crate::fallback::after_commit;
use crate::legacy::{LegacyApi, LegacyRequest};
use crate::{stats, transform};

const TABLE: &str = "housing";
pub(super) const ROOMS: &str = "housing_rooms";
const LEGACY_PREFIX: &str = "housings";

/// Room row for a new space; a missing or zero capacity becomes one bed.
pub(super) fn room_row(housing_id: Uuid, room: &CreateSpace) -> Value {
    json!({
        "housing_id": housing_id,
        "name": room.name,
        "capacity": room.total_vacancies.filter(|v| *v > 0).unwrap_or(1),
        "occupied": 0,
        "status": RecordStatus::Active,
    })
}

/// Recomputes a housing's room count and vacancy totals from its rooms.
pub(super) async fn refresh_totals<B: Backend>(
    client: &SupabaseClient<B>,
    housing_id: Uuid,
) -> Result<(), DbError> {
    let rooms = client
        .from(ROOMS)
        .select("capacity,occupied")
        .eq("housing_id", housing_id)
        .execute()
        .await?
        .rows;
    let sum = |column: &str| -> u64 {
        rooms
            .iter()
            .filter_map(|r| r.get(column).and_then(Value::as_u64))
            .sum()
    };
    client
        .from(TABLE)
        .update(json!({
            "total_rooms": rooms.len(),
            "total_vacancies": sum("capacity"),
            "occupied_vacancies": sum("occupied"),
        }))
        .eq("id", housing_id)
        .execute()
        .await?;
    debug!(%housing_id, rooms = rooms.len(), "Housing totals refreshed");
    Ok(())
}

super::hosted_repository! {
    /// Housings and the rooms, residents and history attached to them.
    SupabaseHousingRepository
}

impl<B: Backend, L: LegacyApi> HousingRepository for SupabaseHousingRepository<B, L> {
    async fn list_by_organization(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
        term: &str,
    ) -> RelifResult<PaginatedResult<Housing>> {
        debug!(%organization_id, offset = pagination.offset, search = term, "Listing housing");
        let legacy = LegacyRequest::get(format!("organizations/{organization_id}/{LEGACY_PREFIX}"))
            .page(pagination)
            .query("search", term);
        let hosted = async {
            let output = self
                .client
                .from(TABLE)
                .eq("organization_id", organization_id)
                .or(search(&["name"], term))
                .order("created_at", false)
                .page(pagination)
                .execute()
                .await?;
            Ok::<_, DbError>(page(output, transform::housing))
        };
        Ok(self.fallback.run("housing.list", hosted, legacy).await?)
    }

    async fn stats(&self, organization_id: Uuid) -> RelifResult<HousingStats> {
        let legacy =
            LegacyRequest::get(format!("organizations/{organization_id}/{LEGACY_PREFIX}/stats"));
        let hosted = async {
            let rows = stats::organization_rows(
                &self.client,
                TABLE,
                "id,status,total_vacancies,occupied_vacancies",
                organization_id,
            )
            .await?;
            Ok::<_, DbError>(stats::housing_stats(&rows))
        };
        Ok(self.fallback.run("housing.stats", hosted, legacy).await?)
    }

    async fn create(&self, input: CreateHousing) -> RelifResult<Housing> {
        let legacy = LegacyRequest::post(LEGACY_PREFIX).json(&input);
        let hosted = async {
            let organization_id = self.client.current_organization_id().await?;
            let row = json!({
                "organization_id": organization_id,
                "name": input.name,
                "address": input.address.clone().unwrap_or_else(empty_object),
                "status": RecordStatus::Active,
                "total_vacancies": 0,
                "total_rooms": 0,
                "occupied_vacancies": 0,
            });
            let output = self.client.from(TABLE).insert(row).execute().await?;
            let created = transform::housing(&first_row(output, TABLE, &input.name)?);
            info!(housing_id = %created.id, %organization_id, "Housing created");
            Ok::<_, DbError>(created)
        };
        Ok(self.fallback.run("housing.create", hosted, legacy).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> RelifResult<Housing> {
        let legacy = LegacyRequest::get(format!("{LEGACY_PREFIX}/{id}"));
        let hosted = async {
            let row = self.client.from(TABLE).eq("id", id).single().await?;
            Ok::<_, DbError>(transform::housing(&row))
        };
        Ok(self.fallback.run("housing.get", hosted, legacy).await?)
    }

    async fn update(&self, id: Uuid, input: UpdateHousing) -> RelifResult<Housing> {
        let legacy = LegacyRequest::put(format!("{LEGACY_PREFIX}/{id}")).json(&input);
        let hosted = async {
            let row = self
                .client
                .from(TABLE)
                .update(changes(&input)?)
                .eq("id", id)
                .single()
                .await?;
            info!(housing_id = %id, "Housing updated");
            Ok::<_, DbError>(transform::housing(&row))
        };
        Ok(self.fallback.run("housing.update", hosted, legacy).await?)
    }

    async fn delete(&self, id: Uuid) -> RelifResult<()> {
        let legacy = LegacyRequest::delete(format!("{LEGACY_PREFIX}/{id}"));
        let hosted = async {
            self.client.from(TABLE).delete().eq("id", id).execute().await?;
            info!(housing_id = %id, "Housing deleted");
            Ok::<_, DbError>(())
        };
        Ok(self.fallback.run_void("housing.delete", hosted, legacy).await?)
    }

    async fn spaces(
        &self,
        housing_id: Uuid,
        pagination: Pagination,
    ) -> RelifResult<PaginatedResult<Space>> {
        let legacy = LegacyRequest::get(format!("{LEGACY_PREFIX}/{housing_id}/rooms")).page(pagination);
        let hosted = async {
            let output = self
                .client
                .from(ROOMS)
                .eq("housing_id", housing_id)
                .order("created_at", true)
                .page(pagination)
                .execute()
                .await?;
            Ok::<_, DbError>(page(output, transform::space))
        };
        Ok(self.fallback.run("housing.spaces", hosted, legacy).await?)
    }

    async fn beneficiaries(
        &self,
        housing_id: Uuid,
        pagination: Pagination,
        term: &str,
    ) -> RelifResult<PaginatedResult<Beneficiary>> {
        let legacy = LegacyRequest::get(format!("{LEGACY_PREFIX}/{housing_id}/beneficiaries"))
            .page(pagination)
            .query("search", term);
        let hosted = async {
            let output = beneficiary_query(&self.client)
                .eq("current_housing_id", housing_id)
                .or(search(&["full_name", "email"], term))
                .order("created_at", false)
                .page(pagination)
                .execute()
                .await?;
            Ok::<_, DbError>(page(output, transform::beneficiary))
        };
        Ok(self.fallback.run("housing.beneficiaries", hosted, legacy).await?)
    }

    async fn allocations(
        &self,
        housing_id: Uuid,
        pagination: Pagination,
    ) -> RelifResult<PaginatedResult<BeneficiaryAllocation>> {
        let legacy =
            LegacyRequest::get(format!("{LEGACY_PREFIX}/{housing_id}/allocations")).page(pagination);
        let hosted = async {
            let output = allocation_query(&self.client)
                .eq("housing_id", housing_id)
                .order("created_at", false)
                .page(pagination)
                .execute()
                .await?;
            Ok::<_, DbError>(page(output, transform::allocation))
        };
        Ok(self.fallback.run("housing.allocations", hosted, legacy).await?)
    }

    async fn create_spaces(
        &self,
        housing_id: Uuid,
        spaces: Vec<CreateSpace>,
    ) -> RelifResult<Vec<Space>> {
        let legacy = LegacyRequest::post(format!("{LEGACY_PREFIX}/{housing_id}/rooms")).json(&spaces);
        let hosted = async {
            if spaces.is_empty() {
                return Ok(Vec::new());
            }
            let rows: Vec<Value> = spaces.iter().map(|s| room_row(housing_id, s)).collect();
            let output = self
                .client
                .from(ROOMS)
                .insert(Value::Array(rows))
                .execute()
                .await?;
            after_commit("housing.refresh_totals", refresh_totals(&self.client, housing_id).await);
            info!(%housing_id, count = output.rows.len(), "Rooms created");
            Ok::<_, DbError>(output.rows.iter().map(transform::space).collect())
        };
        Ok(self.fallback.run("housing.create_spaces", hosted, legacy).await?)
    }
}

//! Hosted implementation of [`SpaceRepository`] over `housing_rooms`.
//!
//! Every room change is followed by a recount of the parent housing's
//! totals.

use relif_core::error::RelifResult;
use relif_core::models::beneficiary::{Beneficiary, BeneficiaryAllocation};
use relif_core::models::housing::{CreateSpace, Space, UpdateSpace};
use relif_core::repository::{PaginatedResult, Pagination, SpaceRepository};
use serde_json::{Map, Value, json};
use tracing::info;
use uuid::Uuid;

use super::beneficiary::{allocation_query, beneficiary_query};
use super::housing::{ROOMS, refresh_totals, room_row};
use super::{first_row, page};
use crate::backend::Backend;
use crate::error::DbError;
use crate::fallback::{after_commit, empty_on_not_found};
use crate::legacy::{LegacyApi, LegacyRequest};
use crate::query::Filter;
use crate::transform;

const LEGACY_PREFIX: &str = "housing-rooms";

/// Column patch for a room; vacancies are stored as `capacity`.
fn room_patch(input: &UpdateSpace) -> Value {
    let mut patch = Map::new();
    if let Some(name) = &input.name {
        patch.insert("name".into(), json!(name));
    }
    if let Some(capacity) = input.total_vacancies {
        patch.insert("capacity".into(), json!(capacity));
    }
    if let Some(status) = input.status {
        patch.insert("status".into(), json!(status));
    }
    Value::Object(patch)
}

super::hosted_repository! {
    /// Rooms inside a housing.
    SupabaseSpaceRepository
}

impl<B: Backend, L: LegacyApi> SpaceRepository for SupabaseSpaceRepository<B, L> {
    async fn get_by_id(&self, id: Uuid) -> RelifResult<Space> {
        let legacy = LegacyRequest::get(format!("{LEGACY_PREFIX}/{id}"));
        let hosted = async {
            let row = self.client.from(ROOMS).eq("id", id).single().await?;
            Ok::<_, DbError>(transform::space(&row))
        };
        Ok(self.fallback.run("spaces.get", hosted, legacy).await?)
    }

    async fn create(&self, housing_id: Uuid, input: CreateSpace) -> RelifResult<Space> {
        let legacy = LegacyRequest::post(LEGACY_PREFIX).json(&json!({
            "housing_id": housing_id,
            "name": input.name,
            "total_vacancies": input.total_vacancies,
        }));
        let hosted = async {
            let output = self
                .client
                .from(ROOMS)
                .insert(room_row(housing_id, &input))
                .execute()
                .await?;
            let space = transform::space(&first_row(output, ROOMS, &input.name)?);
            after_commit("spaces.refresh_totals", refresh_totals(&self.client, housing_id).await);
            info!(space_id = %space.id, %housing_id, "Room created");
            Ok::<_, DbError>(space)
        };
        Ok(self.fallback.run("spaces.create", hosted, legacy).await?)
    }

    async fn update(&self, id: Uuid, input: UpdateSpace) -> RelifResult<Space> {
        let legacy = LegacyRequest::put(format!("{LEGACY_PREFIX}/{id}")).json(&input);
        let hosted = async {
            if let Some(capacity) = input.total_vacancies {
                let current = self.client.from(ROOMS).select("occupied").eq("id", id).single().await?;
                let occupied = current.get("occupied").and_then(Value::as_u64).unwrap_or(0);
                if u64::from(capacity) < occupied {
                    return Err(DbError::Invalid(format!(
                        "room {id} has {occupied} residents, more than {capacity} vacancies"
                    )));
                }
            }
            let row = self
                .client
                .from(ROOMS)
                .update(room_patch(&input))
                .eq("id", id)
                .single()
                .await?;
            let space = transform::space(&row);
            if input.total_vacancies.is_some() {
                let refreshed = refresh_totals(&self.client, space.housing_id).await;
                after_commit("spaces.refresh_totals", refreshed);
            }
            info!(space_id = %id, "Room updated");
            Ok::<_, DbError>(space)
        };
        Ok(self.fallback.run("spaces.update", hosted, legacy).await?)
    }

    async fn delete(&self, id: Uuid) -> RelifResult<()> {
        let legacy = LegacyRequest::delete(format!("{LEGACY_PREFIX}/{id}"));
        let hosted = async {
            let removed = self.client.from(ROOMS).delete().eq("id", id).execute().await?;
            if let Some(row) = removed.rows.first() {
                let refreshed = refresh_totals(&self.client, transform::space(row).housing_id).await;
                after_commit("spaces.refresh_totals", refreshed);
            }
            info!(space_id = %id, "Room deleted");
            Ok::<_, DbError>(())
        };
        Ok(self.fallback.run_void("spaces.delete", hosted, legacy).await?)
    }

    async fn beneficiaries(
        &self,
        space_id: Uuid,
        pagination: Pagination,
    ) -> RelifResult<PaginatedResult<Beneficiary>> {
        let legacy =
            LegacyRequest::get(format!("{LEGACY_PREFIX}/{space_id}/beneficiaries")).page(pagination);
        let hosted = async {
            let output = beneficiary_query(&self.client)
                .eq("current_room_id", space_id)
                .order("created_at", false)
                .page(pagination)
                .execute()
                .await?;
            Ok::<_, DbError>(page(output, transform::beneficiary))
        };
        Ok(self.fallback.run("spaces.beneficiaries", hosted, legacy).await?)
    }

    async fn allocations(&self, space_id: Uuid) -> RelifResult<Vec<BeneficiaryAllocation>> {
        let legacy = LegacyRequest::get(format!("{LEGACY_PREFIX}/{space_id}/allocations"));
        let hosted = async {
            let output = allocation_query(&self.client)
                .or(vec![
                    Filter::eq("room_id", space_id),
                    Filter::eq("old_room_id", space_id),
                ])
                .order("created_at", false)
                .execute()
                .await?;
            Ok::<_, DbError>(output.rows.iter().map(transform::allocation).collect())
        };
        // Legacy answers 404 for a room that never had residents.
        Ok(empty_on_not_found(
            self.fallback.run("spaces.allocations", hosted, legacy).await,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use relif_core::models::organization::RecordStatus;

    use super::*;

    #[test]
    fn vacancies_are_stored_as_capacity() {
        let patch = room_patch(&UpdateSpace {
            name: None,
            total_vacancies: Some(4),
            status: Some(RecordStatus::Inactive),
        });
        assert_eq!(patch, json!({"capacity": 4, "status": "INACTIVE"}));
    }
}

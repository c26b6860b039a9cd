//! Hosted implementation of [`BeneficiaryRepository`].
//!
//! Allocation goes through the `allocate_beneficiary` procedure so the
//! room and housing counters, the beneficiary's current placement and the
//! history row change together. Deletion first calls `release_beneficiary`
//! to give the bed back.

use relif_core::error::RelifResult;
use relif_core::models::beneficiary::{
    AllocationTarget, AllocationType, Beneficiary, BeneficiaryAllocation, BeneficiaryStats,
    BeneficiaryStatus, CreateBeneficiary, UpdateBeneficiary,
};
use relif_core::repository::{BeneficiaryRepository, PaginatedResult, Pagination};
use serde_json::{Value, json};
use tracing::{debug, info};
use uuid::Uuid;

use super::{changes, first_row, page, search};
use crate::backend::Backend;
use crate::client::SupabaseClient;
use crate::error::DbError;
use crate::fallback::{after_commit, empty_on_not_found};
use crate::legacy::{LegacyApi, LegacyRequest};
use crate::query::{Embed, QueryBuilder};
use crate::{stats, transform};

const TABLE: &str = "beneficiaries";
pub(super) const ALLOCATIONS: &str = "beneficiary_allocations";

/// Beneficiaries with their current housing and room embedded.
pub(super) fn beneficiary_query<B: Backend>(client: &SupabaseClient<B>) -> QueryBuilder<'_, B> {
    client
        .from(TABLE)
        .embed(Embed::new(
            "current_housing",
            "housing",
            "current_housing_id",
            &["id", "name", "address"],
        ))
        .embed(Embed::new(
            "current_room",
            "housing_rooms",
            "current_room_id",
            &["id", "name", "capacity"],
        ))
}

/// Allocation history rows with every referenced entity embedded.
pub(super) fn allocation_query<B: Backend>(client: &SupabaseClient<B>) -> QueryBuilder<'_, B> {
    client
        .from(ALLOCATIONS)
        .embed(Embed::new(
            "beneficiary",
            TABLE,
            "beneficiary_id",
            &["id", "full_name"],
        ))
        .embed(Embed::new("housing", "housing", "housing_id", &["id", "name", "address"]))
        .embed(Embed::new("room", "housing_rooms", "room_id", &["id", "name", "capacity"]))
        .embed(Embed::new(
            "old_housing",
            "housing",
            "old_housing_id",
            &["id", "name", "address"],
        ))
        .embed(Embed::new(
            "old_room",
            "housing_rooms",
            "old_room_id",
            &["id", "name", "capacity"],
        ))
}

super::hosted_repository! {
    /// Beneficiaries and their housing history.
    SupabaseBeneficiaryRepository
}

impl<B: Backend, L: LegacyApi> SupabaseBeneficiaryRepository<B, L> {
    async fn place(
        &self,
        id: Uuid,
        target: AllocationTarget,
        kind: AllocationType,
    ) -> Result<BeneficiaryAllocation, DbError> {
        let created = self
            .client
            .rpc(
                "allocate_beneficiary",
                json!({
                    "beneficiary_id": id,
                    "housing_id": target.housing_id,
                    "room_id": target.room_id,
                    "type": kind,
                }),
            )
            .await?;
        // The placement has committed; without the embedded re-read the
        // procedure's own row is returned.
        let reread = match created.get("id").and_then(Value::as_str) {
            Some(allocation_id) => {
                let row = allocation_query(&self.client)
                    .eq("id", allocation_id)
                    .single()
                    .await;
                after_commit("beneficiaries.allocation_row", row)
            }
            None => None,
        };
        let row = reread.unwrap_or(created);
        info!(
            beneficiary_id = %id,
            housing_id = %target.housing_id,
            room_id = %target.room_id,
            allocation_type = %kind,
            "Beneficiary allocated"
        );
        Ok(transform::allocation(&row))
    }
}

impl<B: Backend, L: LegacyApi> BeneficiaryRepository for SupabaseBeneficiaryRepository<B, L> {
    async fn list_by_organization(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
        term: &str,
    ) -> RelifResult<PaginatedResult<Beneficiary>> {
        debug!(%organization_id, offset = pagination.offset, search = term, "Listing beneficiaries");
        let legacy = LegacyRequest::get(format!("organizations/{organization_id}/{TABLE}"))
            .page(pagination)
            .query("search", term);
        let hosted = async {
            let output = beneficiary_query(&self.client)
                .eq("organization_id", organization_id)
                .or(search(&["full_name", "email"], term))
                .order("created_at", false)
                .page(pagination)
                .execute()
                .await?;
            Ok::<_, DbError>(page(output, transform::beneficiary))
        };
        Ok(self.fallback.run("beneficiaries.list", hosted, legacy).await?)
    }

    async fn create(
        &self,
        organization_id: Uuid,
        input: CreateBeneficiary,
    ) -> RelifResult<Beneficiary> {
        let legacy =
            LegacyRequest::post(format!("organizations/{organization_id}/{TABLE}")).json(&input);
        let hosted = async {
            let mut row = changes(&input)?;
            if let Some(object) = row.as_object_mut() {
                object.insert("organization_id".into(), json!(organization_id));
                object.insert("status".into(), json!(BeneficiaryStatus::Active));
            }
            let output = self.client.from(TABLE).insert(row).execute().await?;
            let created = transform::beneficiary(&first_row(output, TABLE, &input.full_name)?);
            info!(beneficiary_id = %created.id, %organization_id, "Beneficiary created");
            Ok::<_, DbError>(created)
        };
        Ok(self.fallback.run("beneficiaries.create", hosted, legacy).await?)
    }

    async fn stats(&self, organization_id: Uuid) -> RelifResult<BeneficiaryStats> {
        let legacy = LegacyRequest::get(format!("organizations/{organization_id}/{TABLE}/stats"));
        let hosted = async {
            let rows =
                stats::organization_rows(&self.client, TABLE, "id,status", organization_id)
                    .await?;
            Ok::<_, DbError>(stats::beneficiary_stats(&rows))
        };
        Ok(self.fallback.run("beneficiaries.stats", hosted, legacy).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> RelifResult<Beneficiary> {
        let legacy = LegacyRequest::get(format!("{TABLE}/{id}"));
        let hosted = async {
            let row = beneficiary_query(&self.client).eq("id", id).single().await?;
            Ok::<_, DbError>(transform::beneficiary(&row))
        };
        Ok(self.fallback.run("beneficiaries.get", hosted, legacy).await?)
    }

    async fn update(&self, id: Uuid, input: UpdateBeneficiary) -> RelifResult<Beneficiary> {
        let legacy = LegacyRequest::put(format!("{TABLE}/{id}")).json(&input);
        let hosted = async {
            let row = beneficiary_query(&self.client)
                .update(changes(&input)?)
                .eq("id", id)
                .single()
                .await?;
            info!(beneficiary_id = %id, "Beneficiary updated");
            Ok::<_, DbError>(transform::beneficiary(&row))
        };
        Ok(self.fallback.run("beneficiaries.update", hosted, legacy).await?)
    }

    async fn delete(&self, id: Uuid) -> RelifResult<()> {
        let legacy = LegacyRequest::delete(format!("{TABLE}/{id}"));
        let hosted = async {
            // Occupancy is released before the row goes.
            self.client
                .rpc("release_beneficiary", json!({ "beneficiary_id": id }))
                .await?;
            self.client.from(TABLE).delete().eq("id", id).execute().await?;
            info!(beneficiary_id = %id, "Beneficiary deleted");
            Ok::<_, DbError>(())
        };
        Ok(self.fallback.run_void("beneficiaries.delete", hosted, legacy).await?)
    }

    async fn allocate(
        &self,
        id: Uuid,
        target: AllocationTarget,
    ) -> RelifResult<BeneficiaryAllocation> {
        let legacy = LegacyRequest::post(format!("{TABLE}/{id}/allocate")).json(&target);
        let hosted = self.place(id, target, AllocationType::Allocation);
        Ok(self.fallback.run("beneficiaries.allocate", hosted, legacy).await?)
    }

    async fn reallocate(
        &self,
        id: Uuid,
        target: AllocationTarget,
    ) -> RelifResult<BeneficiaryAllocation> {
        let legacy = LegacyRequest::post(format!("{TABLE}/{id}/reallocate")).json(&target);
        let hosted = self.place(id, target, AllocationType::Reallocation);
        Ok(self.fallback.run("beneficiaries.reallocate", hosted, legacy).await?)
    }

    async fn allocations(
        &self,
        id: Uuid,
        pagination: Pagination,
    ) -> RelifResult<PaginatedResult<BeneficiaryAllocation>> {
        let legacy = LegacyRequest::get(format!("{TABLE}/{id}/allocations")).page(pagination);
        let hosted = async {
            let output = allocation_query(&self.client)
                .eq("beneficiary_id", id)
                .order("created_at", false)
                .page(pagination)
                .execute()
                .await?;
            Ok::<_, DbError>(page(output, transform::allocation))
        };
        // Legacy answers 404 when there is no history yet.
        Ok(empty_on_not_found(
            self.fallback.run("beneficiaries.allocations", hosted, legacy).await,
        )?)
    }
}

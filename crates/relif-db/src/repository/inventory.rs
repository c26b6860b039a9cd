//! Hosted implementation of [`InventoryRepository`] over `product_types`.
//!
//! Stock lives in the `total_in_storage` counter, changed only through the
//! `adjust_product_stock` procedure. Allocation history and storage
//! records are derived from the counter; donations have their own table.

use relif_core::error::RelifResult;
use relif_core::models::inventory::{
    AddStock, CreateProduct, EntryLocation, EntryType, InventoryStats, LocationType, MoveStock,
    ProductEntry, ProductType, StockLevel, StorageLocation, StorageRecord, UpdateProduct,
};
use relif_core::repository::{InventoryRepository, PaginatedResult, Pagination};
use serde_json::{Value, json};
use tracing::{debug, info};
use uuid::Uuid;

use super::{changes, first_row, page, search};
use crate::backend::Backend;
use crate::error::DbError;
use crate::legacy::{LegacyApi, LegacyRequest};
use crate::query::{Embed, QueryBuilder};
use crate::{stats, transform};

const TABLE: &str = "product_types";
const DONATIONS: &str = "donations";

fn organization_embed() -> Embed {
    Embed::new("organizations", "organizations", "organization_id", &[])
}

fn organization_storage(product: &ProductType) -> EntryLocation {
    EntryLocation {
        id: product.organization_id.to_string(),
        location_type: LocationType::Organization,
    }
}

/// The current stock as a single entrance into the organization's storage.
fn current_stock_entry(product: &ProductType) -> Option<ProductEntry> {
    (product.total_in_storage > 0).then(|| ProductEntry {
        id: format!("{}-current-stock", product.id),
        product_type_id: product.id,
        product_type: product.clone(),
        brand: product.brand.clone(),
        category: product.category.clone(),
        description: product.description.clone(),
        created_at: product.created_at,
        updated_at: product.updated_at,
        quantity: product.total_in_storage,
        from: organization_storage(product),
        to: organization_storage(product),
        entry_type: EntryType::Entrance,
        organization_id: product.organization_id,
        organization: product.organization.clone(),
    })
}

fn storage_record(product: &ProductType) -> Option<StorageRecord> {
    let name = if product.organization.name.is_empty() {
        "Organization Storage".to_string()
    } else {
        product.organization.name.clone()
    };
    (product.total_in_storage > 0).then(|| StorageRecord {
        id: format!("{}-org-storage", product.id),
        location: StorageLocation {
            id: product.organization_id.to_string(),
            name,
            location_type: LocationType::Organization,
        },
        quantity: product.total_in_storage,
    })
}

fn stock_level(value: &Value, fallback_id: Uuid) -> StockLevel {
    let row = transform::Row::new(value);
    StockLevel {
        product_type_id: row.opt_uuid("product_type_id").unwrap_or(fallback_id),
        total_in_storage: row.u64("total_in_storage"),
    }
}

super::hosted_repository! {
    /// Product types and their stock.
    SupabaseInventoryRepository
}

impl<B: Backend, L: LegacyApi> SupabaseInventoryRepository<B, L> {
    fn products(&self) -> QueryBuilder<'_, B> {
        self.client.from(TABLE).embed(organization_embed())
    }

    async fn product(&self, id: Uuid) -> Result<ProductType, DbError> {
        let row = self.products().eq("id", id).single().await?;
        Ok(transform::product(&row))
    }
}

impl<B: Backend, L: LegacyApi> InventoryRepository for SupabaseInventoryRepository<B, L> {
    async fn list_by_organization(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
        term: &str,
    ) -> RelifResult<PaginatedResult<ProductType>> {
        debug!(%organization_id, offset = pagination.offset, search = term, "Listing products");
        let legacy = LegacyRequest::get(format!("organizations/{organization_id}/products"))
            .page(pagination)
            .query("search", term);
        let hosted = async {
            let output = self
                .products()
                .eq("organization_id", organization_id)
                .or(search(&["name", "description", "brand"], term))
                .order("created_at", false)
                .page(pagination)
                .execute()
                .await?;
            Ok::<_, DbError>(page(output, transform::product))
        };
        Ok(self.fallback.run("inventory.list", hosted, legacy).await?)
    }

    async fn stats(&self, organization_id: Uuid) -> RelifResult<InventoryStats> {
        let legacy = LegacyRequest::get(format!("organizations/{organization_id}/products/stats"));
        let hosted = async {
            let rows = stats::organization_rows(
                &self.client,
                TABLE,
                "id,total_in_storage",
                organization_id,
            )
            .await?;
            Ok::<_, DbError>(stats::inventory_stats(&rows))
        };
        Ok(self.fallback.run("inventory.stats", hosted, legacy).await?)
    }

    async fn create(&self, organization_id: Uuid, input: CreateProduct) -> RelifResult<ProductType> {
        let legacy =
            LegacyRequest::post(format!("organizations/{organization_id}/products")).json(&input);
        let hosted = async {
            let mut row = changes(&input)?;
            if let Some(object) = row.as_object_mut() {
                object.insert("organization_id".into(), json!(organization_id));
                object.insert("total_in_storage".into(), json!(0));
            }
            let output = self.products().insert(row).execute().await?;
            let created = transform::product(&first_row(output, TABLE, &input.name)?);
            info!(product_id = %created.id, %organization_id, "Product created");
            Ok::<_, DbError>(created)
        };
        Ok(self.fallback.run("inventory.create", hosted, legacy).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> RelifResult<ProductType> {
        let legacy = LegacyRequest::get(format!("products/{id}"));
        Ok(self.fallback.run("inventory.get", self.product(id), legacy).await?)
    }

    async fn update(&self, id: Uuid, input: UpdateProduct) -> RelifResult<ProductType> {
        let legacy = LegacyRequest::put(format!("products/{id}")).json(&input);
        let hosted = async {
            let row = self
                .products()
                .update(changes(&input)?)
                .eq("id", id)
                .single()
                .await?;
            info!(product_id = %id, "Product updated");
            Ok::<_, DbError>(transform::product(&row))
        };
        Ok(self.fallback.run("inventory.update", hosted, legacy).await?)
    }

    async fn delete(&self, id: Uuid) -> RelifResult<()> {
        let legacy = LegacyRequest::delete(format!("products/{id}"));
        let hosted = async {
            self.client.from(TABLE).delete().eq("id", id).execute().await?;
            info!(product_id = %id, "Product deleted");
            Ok::<_, DbError>(())
        };
        Ok(self.fallback.run_void("inventory.delete", hosted, legacy).await?)
    }

    async fn add_stock(&self, id: Uuid, input: AddStock) -> RelifResult<StockLevel> {
        let legacy = LegacyRequest::post(format!("products/{id}/allocate")).json(&input);
        let hosted = async {
            if input.quantity == 0 {
                return Err(DbError::Invalid("quantity must be positive".into()));
            }
            let level = self
                .client
                .rpc(
                    "adjust_product_stock",
                    json!({ "product_type_id": id, "delta": input.quantity }),
                )
                .await?;
            let level = stock_level(&level, id);
            info!(
                product_id = %id,
                quantity = input.quantity,
                total = level.total_in_storage,
                "Stock added"
            );
            Ok::<_, DbError>(level)
        };
        Ok(self.fallback.run("inventory.add_stock", hosted, legacy).await?)
    }

    async fn move_stock(&self, id: Uuid, input: MoveStock) -> RelifResult<StockLevel> {
        let legacy = LegacyRequest::post(format!("products/{id}/reallocate")).json(&input);
        let hosted = async {
            let product = self.product(id).await?;
            if input.quantity == 0 {
                return Err(DbError::Invalid("quantity must be positive".into()));
            }
            if input.quantity > product.total_in_storage {
                return Err(DbError::Invalid(format!(
                    "cannot move {} units, only {} in storage",
                    input.quantity, product.total_in_storage
                )));
            }
            // No per-location ledger exists, so a move is recorded in the log only.
            info!(
                product_id = %id,
                from = %input.from.id,
                from_type = %input.from.location_type,
                to = %input.to.id,
                to_type = %input.to.location_type,
                quantity = input.quantity,
                "Stock moved"
            );
            Ok::<_, DbError>(StockLevel {
                product_type_id: id,
                total_in_storage: product.total_in_storage,
            })
        };
        Ok(self.fallback.run("inventory.move_stock", hosted, legacy).await?)
    }

    async fn allocations(
        &self,
        id: Uuid,
        pagination: Pagination,
    ) -> RelifResult<PaginatedResult<ProductEntry>> {
        let legacy = LegacyRequest::get(format!("products/{id}/allocations")).page(pagination);
        let hosted = async {
            let product = self.product(id).await?;
            let data: Vec<ProductEntry> = current_stock_entry(&product).into_iter().collect();
            Ok::<_, DbError>(PaginatedResult {
                count: data.len() as u64,
                data,
            })
        };
        Ok(self.fallback.run("inventory.allocations", hosted, legacy).await?)
    }

    async fn donations(
        &self,
        id: Uuid,
        pagination: Pagination,
    ) -> RelifResult<PaginatedResult<ProductEntry>> {
        let legacy = LegacyRequest::get(format!("products/{id}/donations")).page(pagination);
        let hosted = async {
            let output = self
                .client
                .from(DONATIONS)
                .embed(Embed::new("product_types", TABLE, "product_type_id", &[]))
                .embed(organization_embed())
                .embed(Embed::new(
                    "beneficiaries",
                    "beneficiaries",
                    "beneficiary_id",
                    &["id", "full_name"],
                ))
                .eq("product_type_id", id)
                .order("created_at", false)
                .page(pagination)
                .execute()
                .await?;
            Ok::<_, DbError>(page(output, transform::donation))
        };
        Ok(self.fallback.run("inventory.donations", hosted, legacy).await?)
    }

    async fn storage_records(&self, id: Uuid) -> RelifResult<Vec<StorageRecord>> {
        let legacy = LegacyRequest::get(format!("products/{id}/storage-records"));
        let hosted = async {
            let product = self.product(id).await?;
            Ok::<_, DbError>(storage_record(&product).into_iter().collect())
        };
        Ok(self.fallback.run("inventory.storage_records", hosted, legacy).await?)
    }
}

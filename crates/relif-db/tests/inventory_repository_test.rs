//! Integration tests for products and stock on the in-memory engine.

use relif_core::error::RelifError;
use relif_core::models::inventory::{
    AddStock, CreateProduct, EntryLocation, EntryType, LocationType, MoveStock, UpdateProduct,
};
use relif_core::repository::{InventoryRepository, Pagination};
use relif_db::repository::SupabaseInventoryRepository;
use relif_db::{ClientConfig, MemoryBackend, SupabaseClient};
use serde_json::json;
use uuid::Uuid;

async fn setup() -> (SupabaseClient<MemoryBackend>, Uuid) {
    let backend = MemoryBackend::new();
    let org = backend
        .seed("organizations", vec![json!({"name": "Banco de Alimentos"})])
        .await;
    let org_id = Uuid::parse_str(org[0]["id"].as_str().unwrap()).unwrap();
    backend
        .seed_user("admin@banco.test", "secret", Some(org_id))
        .await;
    let client = SupabaseClient::new(backend, ClientConfig::default());
    client.sign_in("admin@banco.test", "secret").await.unwrap();
    (client, org_id)
}

fn product(name: &str) -> CreateProduct {
    CreateProduct {
        name: name.into(),
        brand: Some("Solidária".into()),
        category: Some("food".into()),
        unit_type: Some("kg".into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn stock_is_added_and_moves_are_checked() {
    let (client, org_id) = setup().await;
    let repo = SupabaseInventoryRepository::new(client);

    let rice = repo.create(org_id, product("Rice")).await.unwrap();
    assert_eq!(rice.total_in_storage, 0);
    assert_eq!(rice.organization.name, "Banco de Alimentos");

    let level = repo.add_stock(rice.id, AddStock { quantity: 12 }).await.unwrap();
    assert_eq!(level.product_type_id, rice.id);
    assert_eq!(level.total_in_storage, 12);
    let level = repo.add_stock(rice.id, AddStock { quantity: 3 }).await.unwrap();
    assert_eq!(level.total_in_storage, 15);

    let zero = repo.add_stock(rice.id, AddStock { quantity: 0 }).await.unwrap_err();
    assert!(matches!(zero, RelifError::Validation { .. }));

    let storage = EntryLocation {
        id: org_id.to_string(),
        location_type: LocationType::Organization,
    };
    let family = EntryLocation {
        id: Uuid::new_v4().to_string(),
        location_type: LocationType::Beneficiary,
    };
    let too_many = repo
        .move_stock(
            rice.id,
            MoveStock {
                from: storage.clone(),
                to: family.clone(),
                quantity: 16,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(too_many, RelifError::Validation { .. }));

    let moved = repo
        .move_stock(
            rice.id,
            MoveStock {
                from: storage,
                to: family,
                quantity: 5,
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.total_in_storage, 15);
}

#[tokio::test]
async fn history_and_storage_reflect_current_stock() {
    let (client, org_id) = setup().await;
    let repo = SupabaseInventoryRepository::new(client);
    let beans = repo.create(org_id, product("Beans")).await.unwrap();

    assert_eq!(
        repo.allocations(beans.id, Pagination::default())
            .await
            .unwrap()
            .count,
        0
    );
    assert!(repo.storage_records(beans.id).await.unwrap().is_empty());

    repo.add_stock(beans.id, AddStock { quantity: 40 }).await.unwrap();

    let history = repo
        .allocations(beans.id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(history.count, 1);
    assert_eq!(history.data[0].entry_type, EntryType::Entrance);
    assert_eq!(history.data[0].quantity, 40);

    let records = repo.storage_records(beans.id).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].location.name, "Banco de Alimentos");
    assert_eq!(records[0].quantity, 40);
}

#[tokio::test]
async fn donations_are_listed_per_product() {
    let (client, org_id) = setup().await;
    let repo = SupabaseInventoryRepository::new(client.clone());
    let milk = repo.create(org_id, product("Milk")).await.unwrap();
    let beneficiary = Uuid::new_v4();

    client
        .backend()
        .seed(
            "donations",
            (0..3)
                .map(|i| {
                    json!({
                        "product_type_id": milk.id,
                        "organization_id": org_id,
                        "beneficiary_id": beneficiary,
                        "from_id": org_id,
                        "from_type": "ORGANIZATION",
                        "quantity": i + 1,
                    })
                })
                .collect(),
        )
        .await;

    let page = repo
        .donations(milk.id, Pagination::new(0, 2))
        .await
        .unwrap();
    assert_eq!(page.count, 3);
    assert_eq!(page.data.len(), 2);
    let entry = &page.data[0];
    assert_eq!(entry.entry_type, EntryType::Donation);
    assert_eq!(entry.product_type.name, "Milk");
    assert_eq!(entry.to.id, beneficiary.to_string());
    assert_eq!(entry.to.location_type, LocationType::Beneficiary);
    assert_eq!(entry.from.location_type, LocationType::Organization);
}

#[tokio::test]
async fn catalogue_search_update_delete_and_stats() {
    let (client, org_id) = setup().await;
    let repo = SupabaseInventoryRepository::new(client);

    let rice = repo.create(org_id, product("Rice")).await.unwrap();
    let soap = repo
        .create(
            org_id,
            CreateProduct {
                name: "Soap".into(),
                description: Some("hygiene kit".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let empty = repo.create(org_id, product("Oil")).await.unwrap();
    repo.add_stock(rice.id, AddStock { quantity: 50 }).await.unwrap();
    repo.add_stock(soap.id, AddStock { quantity: 4 }).await.unwrap();

    let found = repo
        .list_by_organization(org_id, Pagination::default(), "HYGIENE")
        .await
        .unwrap();
    assert_eq!(found.count, 1);
    assert_eq!(found.data[0].id, soap.id);
    assert_eq!(found.data[0].unit_type, "pcs");

    let stats = repo.stats(org_id).await.unwrap();
    assert_eq!(stats.total_products, 3);
    assert_eq!(stats.in_stock_products, 1);
    assert_eq!(stats.low_stock_products, 1);
    assert_eq!(stats.out_of_stock_products, 1);
    assert_eq!(stats.total_quantity, 54);

    let renamed = repo
        .update(
            empty.id,
            UpdateProduct {
                name: Some("Olive oil".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Olive oil");
    assert_eq!(renamed.brand, "Solidária");

    repo.delete(empty.id).await.unwrap();
    assert!(matches!(
        repo.get_by_id(empty.id).await.unwrap_err(),
        RelifError::NotFound { .. }
    ));
}

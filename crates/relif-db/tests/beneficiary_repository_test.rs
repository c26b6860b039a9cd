//! Integration tests for the beneficiary repository on the in-memory engine.

use relif_core::error::RelifError;
use relif_core::models::beneficiary::{
    AllocationTarget, AllocationType, BeneficiaryStatus, CreateBeneficiary, UpdateBeneficiary,
};
use relif_core::models::housing::{CreateHousing, CreateSpace};
use relif_core::repository::{BeneficiaryRepository, HousingRepository, Pagination};
use relif_db::repository::{SupabaseBeneficiaryRepository, SupabaseHousingRepository};
use relif_db::{ClientConfig, MemoryBackend, SupabaseClient};
use serde_json::json;
use uuid::Uuid;

/// Helper: memory backend with one organization and a signed-in admin.
async fn setup() -> (SupabaseClient<MemoryBackend>, Uuid) {
    let backend = MemoryBackend::new();
    let org = backend
        .seed("organizations", vec![json!({"name": "Casa Abrigo", "status": "ACTIVE"})])
        .await;
    let org_id = Uuid::parse_str(org[0]["id"].as_str().unwrap()).unwrap();
    backend
        .seed_user("admin@abrigo.test", "secret", Some(org_id))
        .await;

    let client = SupabaseClient::new(backend, ClientConfig::default());
    client.sign_in("admin@abrigo.test", "secret").await.unwrap();
    (client, org_id)
}

fn person(name: &str) -> CreateBeneficiary {
    CreateBeneficiary {
        full_name: name.into(),
        email: Some(format!("{}@mail.test", name.to_lowercase().replace(' ', "."))),
        ..Default::default()
    }
}

#[tokio::test]
async fn pages_report_the_full_count() {
    let (client, org_id) = setup().await;
    let repo = SupabaseBeneficiaryRepository::new(client);

    for i in 0..25 {
        repo.create(org_id, person(&format!("Person {i:02}")))
            .await
            .unwrap();
    }

    let first = repo
        .list_by_organization(org_id, Pagination::new(0, 20), "")
        .await
        .unwrap();
    assert_eq!(first.count, 25);
    assert_eq!(first.data.len(), 20);

    let second = repo
        .list_by_organization(org_id, Pagination::new(20, 20), "")
        .await
        .unwrap();
    assert_eq!(second.count, 25);
    assert_eq!(second.data.len(), 5);
}

#[tokio::test]
async fn search_matches_name_or_email() {
    let (client, org_id) = setup().await;
    let repo = SupabaseBeneficiaryRepository::new(client);

    repo.create(org_id, person("Maria Silva")).await.unwrap();
    repo.create(org_id, person("João Souza")).await.unwrap();
    repo.create(
        org_id,
        CreateBeneficiary {
            full_name: "Ana Lima".into(),
            email: Some("silva.family@mail.test".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let found = repo
        .list_by_organization(org_id, Pagination::default(), "silva")
        .await
        .unwrap();
    assert_eq!(found.count, 2);

    let other_org = repo
        .list_by_organization(Uuid::new_v4(), Pagination::default(), "")
        .await
        .unwrap();
    assert_eq!(other_org.count, 0);
    assert!(other_org.data.is_empty());
}

#[tokio::test]
async fn create_update_and_delete() {
    let (client, org_id) = setup().await;
    let repo = SupabaseBeneficiaryRepository::new(client);

    let created = repo.create(org_id, person("Maria Silva")).await.unwrap();
    assert_eq!(created.status, BeneficiaryStatus::Active);
    assert_eq!(created.organization_id, Some(org_id));
    assert!(created.current_housing_id.is_none());

    let updated = repo
        .update(
            created.id,
            UpdateBeneficiary {
                occupation: Some("Cook".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.occupation, "Cook");
    assert_eq!(updated.full_name, "Maria Silva");

    repo.delete(created.id).await.unwrap();
    let err = repo.get_by_id(created.id).await.unwrap_err();
    assert!(matches!(err, RelifError::NotFound { .. }));
}

#[tokio::test]
async fn stats_partition_the_total() {
    let (client, org_id) = setup().await;
    let repo = SupabaseBeneficiaryRepository::new(client);

    let a = repo.create(org_id, person("A One")).await.unwrap();
    let b = repo.create(org_id, person("B Two")).await.unwrap();
    repo.create(org_id, person("C Three")).await.unwrap();
    for (id, status) in [
        (a.id, BeneficiaryStatus::Inactive),
        (b.id, BeneficiaryStatus::Pending),
    ] {
        repo.update(
            id,
            UpdateBeneficiary {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    let stats = repo.stats(org_id).await.unwrap();
    assert_eq!(stats.total_beneficiaries, 3);
    assert_eq!(stats.active_beneficiaries, 1);
    assert_eq!(stats.pending_beneficiaries, 1);
    assert_eq!(stats.inactive_beneficiaries, 1);
    assert_eq!(
        stats.active_beneficiaries + stats.pending_beneficiaries + stats.inactive_beneficiaries,
        stats.total_beneficiaries
    );
}

#[tokio::test]
async fn allocation_moves_counters_and_records_history() {
    let (client, org_id) = setup().await;
    let housing_repo = SupabaseHousingRepository::new(client.clone());
    let repo = SupabaseBeneficiaryRepository::new(client);

    let housing = housing_repo
        .create(CreateHousing {
            name: "Abrigo Central".into(),
            address: None,
        })
        .await
        .unwrap();
    let rooms = housing_repo
        .create_spaces(
            housing.id,
            vec![
                CreateSpace {
                    name: "Room A".into(),
                    total_vacancies: Some(1),
                },
                CreateSpace {
                    name: "Room B".into(),
                    total_vacancies: Some(2),
                },
            ],
        )
        .await
        .unwrap();
    let (room_a, room_b) = (rooms[0].id, rooms[1].id);

    let maria = repo.create(org_id, person("Maria Silva")).await.unwrap();
    let joao = repo.create(org_id, person("João Souza")).await.unwrap();

    let first = repo
        .allocate(
            maria.id,
            AllocationTarget {
                housing_id: housing.id,
                room_id: room_a,
            },
        )
        .await
        .unwrap();
    assert_eq!(first.allocation_type, AllocationType::Allocation);
    assert_eq!(first.room.name, "Room A");
    assert_eq!(first.beneficiary.full_name, "Maria Silva");
    assert!(first.old_room_id.is_none());

    let placed = repo.get_by_id(maria.id).await.unwrap();
    assert_eq!(placed.current_room_id, Some(room_a));
    assert_eq!(placed.current_housing.name, "Abrigo Central");
    assert_eq!(housing_repo.get_by_id(housing.id).await.unwrap().occupied_vacancies, 1);

    // Room A holds a single bed.
    let full = repo
        .allocate(
            joao.id,
            AllocationTarget {
                housing_id: housing.id,
                room_id: room_a,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(full, RelifError::Validation { .. }));

    let moved = repo
        .reallocate(
            maria.id,
            AllocationTarget {
                housing_id: housing.id,
                room_id: room_b,
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.allocation_type, AllocationType::Reallocation);
    assert_eq!(moved.old_room_id, Some(room_a));

    let spaces = housing_repo
        .spaces(housing.id, Pagination::default())
        .await
        .unwrap();
    let occupied = |id: Uuid| {
        spaces
            .data
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.occupied_vacancies)
            .unwrap()
    };
    assert_eq!(occupied(room_a), 0);
    assert_eq!(occupied(room_b), 1);
    assert_eq!(housing_repo.get_by_id(housing.id).await.unwrap().occupied_vacancies, 1);

    let history = repo
        .allocations(maria.id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(history.count, 2);
    assert!(
        history
            .data
            .iter()
            .any(|a| a.allocation_type == AllocationType::Reallocation
                && a.old_room.name == "Room A")
    );

    let residents = housing_repo
        .beneficiaries(housing.id, Pagination::default(), "")
        .await
        .unwrap();
    assert_eq!(residents.count, 1);
    assert_eq!(residents.data[0].id, maria.id);
}

#[tokio::test]
async fn deleting_a_placed_beneficiary_frees_the_bed() {
    let (client, org_id) = setup().await;
    let housing_repo = SupabaseHousingRepository::new(client.clone());
    let repo = SupabaseBeneficiaryRepository::new(client);

    let housing = housing_repo
        .create(CreateHousing {
            name: "Abrigo Central".into(),
            address: None,
        })
        .await
        .unwrap();
    let rooms = housing_repo
        .create_spaces(
            housing.id,
            vec![CreateSpace {
                name: "Single".into(),
                total_vacancies: Some(1),
            }],
        )
        .await
        .unwrap();
    let target = AllocationTarget {
        housing_id: housing.id,
        room_id: rooms[0].id,
    };

    let ana = repo.create(org_id, person("Ana Lima")).await.unwrap();
    let bia = repo.create(org_id, person("Bia Rocha")).await.unwrap();
    repo.allocate(ana.id, target).await.unwrap();
    repo.delete(ana.id).await.unwrap();

    let after = housing_repo.get_by_id(housing.id).await.unwrap();
    assert_eq!(after.occupied_vacancies, 0);
    let spaces = housing_repo
        .spaces(housing.id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(spaces.data[0].occupied_vacancies, 0);

    let placed = repo.allocate(bia.id, target).await.unwrap();
    assert_eq!(placed.room_id, rooms[0].id);

    // An unplaced beneficiary is deleted without touching counters.
    let caio = repo.create(org_id, person("Caio Dias")).await.unwrap();
    repo.delete(caio.id).await.unwrap();
    assert_eq!(
        housing_repo.get_by_id(housing.id).await.unwrap().occupied_vacancies,
        1
    );
}

//! Integration tests for housing and rooms on the in-memory engine.

use relif_core::error::RelifError;
use relif_core::models::beneficiary::{AllocationTarget, CreateBeneficiary};
use relif_core::models::housing::{CreateHousing, CreateSpace, UpdateHousing, UpdateSpace};
use relif_core::models::organization::RecordStatus;
use relif_core::repository::{
    BeneficiaryRepository, HousingRepository, Pagination, SpaceRepository,
};
use relif_db::repository::{
    SupabaseBeneficiaryRepository, SupabaseHousingRepository, SupabaseSpaceRepository,
};
use relif_db::{ClientConfig, MemoryBackend, SupabaseClient};
use serde_json::json;
use uuid::Uuid;

async fn setup() -> (SupabaseClient<MemoryBackend>, Uuid) {
    let backend = MemoryBackend::new();
    let org = backend
        .seed("organizations", vec![json!({"name": "Casa Abrigo"})])
        .await;
    let org_id = Uuid::parse_str(org[0]["id"].as_str().unwrap()).unwrap();
    backend
        .seed_user("admin@abrigo.test", "secret", Some(org_id))
        .await;
    let client = SupabaseClient::new(backend, ClientConfig::default());
    client.sign_in("admin@abrigo.test", "secret").await.unwrap();
    (client, org_id)
}

fn room(name: &str, beds: Option<u32>) -> CreateSpace {
    CreateSpace {
        name: name.into(),
        total_vacancies: beds,
    }
}

#[tokio::test]
async fn housing_is_created_in_the_callers_organization() {
    let (client, org_id) = setup().await;
    let repo = SupabaseHousingRepository::new(client);

    let housing = repo
        .create(CreateHousing {
            name: "Abrigo Central".into(),
            address: Some(json!({"street": "Rua A", "city": "Porto Alegre"})),
        })
        .await
        .unwrap();
    assert_eq!(housing.organization_id, org_id);
    assert_eq!(housing.status, RecordStatus::Active);
    assert_eq!(housing.total_rooms, 0);
    assert_eq!(housing.address["city"], "Porto Alegre");

    let updated = repo
        .update(
            housing.id,
            UpdateHousing {
                name: Some("Abrigo Norte".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Abrigo Norte");

    let listed = repo
        .list_by_organization(org_id, Pagination::default(), "norte")
        .await
        .unwrap();
    assert_eq!(listed.count, 1);

    repo.delete(housing.id).await.unwrap();
    assert!(repo.get_by_id(housing.id).await.is_err());
}

#[tokio::test]
async fn room_totals_follow_room_changes() {
    let (client, _) = setup().await;
    let housing_repo = SupabaseHousingRepository::new(client.clone());
    let space_repo = SupabaseSpaceRepository::new(client);

    let housing = housing_repo
        .create(CreateHousing {
            name: "Abrigo Central".into(),
            address: None,
        })
        .await
        .unwrap();

    assert!(
        housing_repo
            .create_spaces(housing.id, Vec::new())
            .await
            .unwrap()
            .is_empty()
    );

    let rooms = housing_repo
        .create_spaces(
            housing.id,
            vec![room("A", Some(4)), room("B", Some(2)), room("C", None)],
        )
        .await
        .unwrap();
    assert_eq!(rooms.len(), 3);
    assert_eq!(rooms[2].total_vacancies, 1);

    let totals = housing_repo.get_by_id(housing.id).await.unwrap();
    assert_eq!(totals.total_rooms, 3);
    assert_eq!(totals.total_vacancies, 7);
    assert_eq!(totals.occupied_vacancies, 0);

    let extra = space_repo
        .create(housing.id, room("D", Some(3)))
        .await
        .unwrap();
    space_repo
        .update(
            rooms[0].id,
            UpdateSpace {
                total_vacancies: Some(6),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let totals = housing_repo.get_by_id(housing.id).await.unwrap();
    assert_eq!(totals.total_rooms, 4);
    assert_eq!(totals.total_vacancies, 12);

    space_repo.delete(extra.id).await.unwrap();
    let totals = housing_repo.get_by_id(housing.id).await.unwrap();
    assert_eq!(totals.total_rooms, 3);
    assert_eq!(totals.total_vacancies, 9);

    let page = housing_repo
        .spaces(housing.id, Pagination::new(0, 2))
        .await
        .unwrap();
    assert_eq!(page.count, 3);
    assert_eq!(page.data.len(), 2);
}

#[tokio::test]
async fn stats_classify_each_housing_once() {
    let (client, org_id) = setup().await;
    let repo = SupabaseHousingRepository::new(client);

    let open = repo
        .create(CreateHousing {
            name: "Open".into(),
            address: None,
        })
        .await
        .unwrap();
    repo.create_spaces(open.id, vec![room("A", Some(2))])
        .await
        .unwrap();
    let closed = repo
        .create(CreateHousing {
            name: "Closed".into(),
            address: None,
        })
        .await
        .unwrap();
    repo.update(
        closed.id,
        UpdateHousing {
            status: Some(RecordStatus::Inactive),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let stats = repo.stats(org_id).await.unwrap();
    assert_eq!(stats.total_housing, 2);
    assert_eq!(stats.available_housing, 1);
    assert_eq!(stats.total_capacity, 2);
    assert_eq!(
        stats.available_housing + stats.occupied_housing + stats.maintenance_housing,
        stats.total_housing
    );
}

#[tokio::test]
async fn room_residents_and_history() {
    let (client, org_id) = setup().await;
    let housing_repo = SupabaseHousingRepository::new(client.clone());
    let space_repo = SupabaseSpaceRepository::new(client.clone());
    let beneficiaries = SupabaseBeneficiaryRepository::new(client);

    let housing = housing_repo
        .create(CreateHousing {
            name: "Abrigo Central".into(),
            address: None,
        })
        .await
        .unwrap();
    let rooms = housing_repo
        .create_spaces(housing.id, vec![room("A", Some(2)), room("B", Some(2))])
        .await
        .unwrap();
    let person = beneficiaries
        .create(
            org_id,
            CreateBeneficiary {
                full_name: "Maria Silva".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    beneficiaries
        .allocate(
            person.id,
            AllocationTarget {
                housing_id: housing.id,
                room_id: rooms[0].id,
            },
        )
        .await
        .unwrap();
    beneficiaries
        .reallocate(
            person.id,
            AllocationTarget {
                housing_id: housing.id,
                room_id: rooms[1].id,
            },
        )
        .await
        .unwrap();

    let left = space_repo
        .beneficiaries(rooms[0].id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(left.count, 0);
    let now_in = space_repo
        .beneficiaries(rooms[1].id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(now_in.count, 1);

    // Room A appears as the target of the first move and the origin of the second.
    assert_eq!(space_repo.allocations(rooms[0].id).await.unwrap().len(), 2);
    assert_eq!(space_repo.allocations(rooms[1].id).await.unwrap().len(), 1);

    let history = housing_repo
        .allocations(housing.id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(history.count, 2);
    assert_eq!(
        space_repo.get_by_id(rooms[1].id).await.unwrap().occupied_vacancies,
        1
    );
}

#[tokio::test]
async fn room_cannot_shrink_below_its_residents() {
    let (client, org_id) = setup().await;
    let housing_repo = SupabaseHousingRepository::new(client.clone());
    let space_repo = SupabaseSpaceRepository::new(client.clone());
    let beneficiaries = SupabaseBeneficiaryRepository::new(client);

    let housing = housing_repo
        .create(CreateHousing {
            name: "Abrigo Central".into(),
            address: None,
        })
        .await
        .unwrap();
    let rooms = housing_repo
        .create_spaces(housing.id, vec![room("A", Some(2))])
        .await
        .unwrap();
    for name in ["Maria Silva", "Joana Prado"] {
        let person = beneficiaries
            .create(
                org_id,
                CreateBeneficiary {
                    full_name: name.into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        beneficiaries
            .allocate(
                person.id,
                AllocationTarget {
                    housing_id: housing.id,
                    room_id: rooms[0].id,
                },
            )
            .await
            .unwrap();
    }

    let err = space_repo
        .update(
            rooms[0].id,
            UpdateSpace {
                total_vacancies: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RelifError::Validation { .. }));
    assert_eq!(
        space_repo.get_by_id(rooms[0].id).await.unwrap().total_vacancies,
        2
    );

    let grown = space_repo
        .update(
            rooms[0].id,
            UpdateSpace {
                total_vacancies: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(grown.total_vacancies, 3);
    assert_eq!(grown.occupied_vacancies, 2);
}

//! Integration tests for volunteers on the in-memory engine.

use relif_core::error::RelifError;
use relif_core::models::volunteer::{CreateVolunteer, UpdateVolunteer, VolunteerStatus};
use relif_core::repository::{Pagination, VolunteerRepository};
use relif_db::repository::SupabaseVolunteerRepository;
use relif_db::{ClientConfig, MemoryBackend, SupabaseClient};
use serde_json::json;
use uuid::Uuid;

async fn setup() -> (SupabaseClient<MemoryBackend>, Uuid) {
    let backend = MemoryBackend::new();
    let org = backend
        .seed("organizations", vec![json!({"name": "Mãos Unidas"})])
        .await;
    let org_id = Uuid::parse_str(org[0]["id"].as_str().unwrap()).unwrap();
    backend
        .seed_user("coord@maos.test", "secret", Some(org_id))
        .await;
    let client = SupabaseClient::new(backend, ClientConfig::default());
    client.sign_in("coord@maos.test", "secret").await.unwrap();
    (client, org_id)
}

#[tokio::test]
async fn volunteer_lifecycle() {
    let (client, org_id) = setup().await;
    let repo = SupabaseVolunteerRepository::new(client);

    let created = repo
        .create(
            org_id,
            CreateVolunteer {
                full_name: "João Pereira".into(),
                email: Some("joao@mail.test".into()),
                segments: Some(vec!["kitchen".into(), "transport".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(created.organization_id, org_id);
    assert_eq!(created.status, VolunteerStatus::Active);
    assert_eq!(created.segments, vec!["kitchen", "transport"]);
    assert_eq!(created.documents, json!([]));
    assert_eq!(created.address, json!({}));

    let updated = repo
        .update(
            created.id,
            UpdateVolunteer {
                notes: Some("Available on weekends".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.notes, "Available on weekends");
    assert_eq!(updated.email, "joao@mail.test");

    let paused = repo
        .update_status(created.id, VolunteerStatus::Inactive)
        .await
        .unwrap();
    assert_eq!(paused.status, VolunteerStatus::Inactive);
    assert_eq!(
        repo.get_by_id(created.id).await.unwrap().status,
        VolunteerStatus::Inactive
    );

    repo.delete(created.id).await.unwrap();
    assert!(matches!(
        repo.get_by_id(created.id).await.unwrap_err(),
        RelifError::NotFound { .. }
    ));
}

#[tokio::test]
async fn stats_accept_lowercase_status_rows() {
    let (client, org_id) = setup().await;
    client
        .backend()
        .seed(
            "voluntary_people",
            vec![
                json!({"organization_id": org_id, "full_name": "A", "status": "active"}),
                json!({"organization_id": org_id, "full_name": "B", "status": "pending"}),
                json!({"organization_id": org_id, "full_name": "C", "status": "INACTIVE"}),
                json!({"organization_id": org_id, "full_name": "D", "status": "ACTIVE"}),
                json!({"organization_id": Uuid::new_v4(), "full_name": "E", "status": "ACTIVE"}),
            ],
        )
        .await;
    let repo = SupabaseVolunteerRepository::new(client);

    let stats = repo.stats(org_id).await.unwrap();
    assert_eq!(stats.total_volunteers, 4);
    assert_eq!(stats.active_volunteers, 2);
    assert_eq!(stats.pending_volunteers, 1);
    assert_eq!(stats.inactive_volunteers, 1);

    let page = repo
        .list_by_organization(org_id, Pagination::default(), "")
        .await
        .unwrap();
    assert_eq!(page.count, 4);
    let pending = page.data.iter().find(|v| v.full_name == "B").unwrap();
    assert_eq!(pending.status, VolunteerStatus::Pending);
}

#[tokio::test]
async fn search_covers_name_email_and_notes() {
    let (client, org_id) = setup().await;
    let repo = SupabaseVolunteerRepository::new(client);

    for (name, email, notes) in [
        ("Ana Lima", "ana@mail.test", "driver"),
        ("Bruno Reis", "bruno@mail.test", "cook"),
        ("Carla Dias", "carla@ong.test", "first aid"),
    ] {
        repo.create(
            org_id,
            CreateVolunteer {
                full_name: name.into(),
                email: Some(email.into()),
                notes: Some(notes.into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    let by_name = repo
        .list_by_organization(org_id, Pagination::default(), "bruno")
        .await
        .unwrap();
    assert_eq!(by_name.count, 1);

    let by_email = repo
        .list_by_organization(org_id, Pagination::default(), "ong.test")
        .await
        .unwrap();
    assert_eq!(by_email.data[0].full_name, "Carla Dias");

    let by_notes = repo
        .list_by_organization(org_id, Pagination::default(), "DRIVER")
        .await
        .unwrap();
    assert_eq!(by_notes.data[0].full_name, "Ana Lima");

    let windowed = repo
        .list_by_organization(org_id, Pagination::new(1, 1), "")
        .await
        .unwrap();
    assert_eq!(windowed.count, 3);
    assert_eq!(windowed.data.len(), 1);
}

//! Integration tests for users and organizations on the in-memory engine.

use relif_core::error::RelifError;
use relif_core::models::organization::{CreateOrganization, RecordStatus, UpdateOrganization};
use relif_core::models::user::{PlatformRole, UpdateUser, UserSearch, UserStatus};
use relif_core::repository::{OrganizationRepository, Pagination, UserRepository};
use relif_db::repository::{SupabaseOrganizationRepository, SupabaseUserRepository};
use relif_db::{ClientConfig, MemoryBackend, SupabaseClient};
use serde_json::json;
use uuid::Uuid;

/// Helper: one organization, its admin (signed in) and a second member.
async fn setup() -> (SupabaseClient<MemoryBackend>, Uuid, Uuid, Uuid) {
    let backend = MemoryBackend::new();
    let org = backend
        .seed("organizations", vec![json!({"name": "Casa Abrigo", "status": "ACTIVE"})])
        .await;
    let org_id = Uuid::parse_str(org[0]["id"].as_str().unwrap()).unwrap();
    let admin = backend
        .seed_user("alice@abrigo.test", "secret", Some(org_id))
        .await;
    let member = backend
        .seed_user("bruno@abrigo.test", "secret", Some(org_id))
        .await;

    let client = SupabaseClient::new(backend, ClientConfig::default());
    client.sign_in("alice@abrigo.test", "secret").await.unwrap();
    (client, org_id, admin, member)
}

#[tokio::test]
async fn status_change_is_visible_on_read() {
    let (client, _, _, member) = setup().await;
    let repo = SupabaseUserRepository::new(client);

    let updated = repo
        .update_status(member, UserStatus::Inactive)
        .await
        .unwrap();
    assert_eq!(updated.status, UserStatus::Inactive);

    let fetched = repo.get_by_id(member).await.unwrap();
    assert_eq!(fetched.status, UserStatus::Inactive);
    assert_eq!(fetched.organization.name, "Casa Abrigo");

    let reactivated = repo.reactivate(member).await.unwrap();
    assert_eq!(reactivated.status, UserStatus::Active);
}

#[tokio::test]
async fn list_update_and_delete_members() {
    let (client, org_id, admin, member) = setup().await;
    let repo = SupabaseUserRepository::new(client);

    let members = repo
        .list_by_organization(org_id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(members.count, 2);

    let renamed = repo
        .update(
            admin,
            UpdateUser {
                last_name: Some("Souza".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.first_name, "alice");
    assert_eq!(renamed.last_name, "Souza");

    repo.delete(member).await.unwrap();
    let err = repo.get_by_id(member).await.unwrap_err();
    assert!(matches!(err, RelifError::NotFound { .. }));
}

#[tokio::test]
async fn search_and_platform_staff() {
    let (client, org_id, _, member) = setup().await;
    let repo = SupabaseUserRepository::new(client);

    let staff = repo.list_platform_staff(Pagination::default()).await.unwrap();
    assert_eq!(staff.count, 0);

    repo.update_platform_role(member, PlatformRole::RelifMember)
        .await
        .unwrap();
    let staff = repo.list_platform_staff(Pagination::default()).await.unwrap();
    assert_eq!(staff.count, 1);
    assert_eq!(staff.data[0].id, member);

    let found = repo
        .search(
            UserSearch {
                term: "BRUNO".into(),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(found.count, 1);

    let scoped = repo
        .search(
            UserSearch {
                term: "abrigo".into(),
                organization_id: Some(org_id),
                platform_role: Some(PlatformRole::OrgAdmin),
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(scoped.count, 1);
    assert_eq!(scoped.data[0].email, "alice@abrigo.test");
}

#[tokio::test]
async fn organization_lifecycle() {
    let (client, _, admin, _) = setup().await;
    let repo = SupabaseOrganizationRepository::new(client);

    let created = repo
        .create(CreateOrganization {
            name: "Rede Solidária".into(),
            email: Some("contato@rede.test".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.status, RecordStatus::Active);
    assert_eq!(created.owner_id, Some(admin));

    repo.update(
        created.id,
        UpdateOrganization {
            description: Some("Food bank".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    repo.deactivate(created.id).await.unwrap();

    let fetched = repo.get_by_id(created.id).await.unwrap();
    assert_eq!(fetched.description, "Food bank");
    assert_eq!(fetched.status, RecordStatus::Inactive);

    repo.reactivate(created.id).await.unwrap();
    assert_eq!(
        repo.get_by_id(created.id).await.unwrap().status,
        RecordStatus::Active
    );

    let all = repo.list(Pagination::new(0, 1)).await.unwrap();
    assert_eq!(all.count, 2);
    assert_eq!(all.data.len(), 1);
}

#[tokio::test]
async fn organization_changes_require_an_existing_row() {
    let (client, _, _, _) = setup().await;
    let repo = SupabaseOrganizationRepository::new(client);
    let missing = Uuid::new_v4();

    let err = repo
        .update(
            missing,
            UpdateOrganization {
                name: Some("Ghost".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RelifError::NotFound { .. }));

    assert!(matches!(
        repo.deactivate(missing).await.unwrap_err(),
        RelifError::NotFound { .. }
    ));
    assert!(matches!(
        repo.reactivate(missing).await.unwrap_err(),
        RelifError::NotFound { .. }
    ));
}

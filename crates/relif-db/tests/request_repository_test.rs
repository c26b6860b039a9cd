//! Integration tests for invites and organization requests.

use relif_core::error::RelifError;
use relif_core::models::organization::OrganizationType;
use relif_core::models::requests::RequestStatus;
use relif_core::repository::RequestRepository;
use relif_db::backend::HttpMethod;
use relif_db::repository::SupabaseRequestRepository;
use relif_db::{ClientConfig, MemoryBackend, SupabaseClient};
use serde_json::json;
use uuid::Uuid;

/// Helper: two organizations and a signed-in admin of the first.
async fn setup() -> (SupabaseClient<MemoryBackend>, Uuid, Uuid, Uuid) {
    let backend = MemoryBackend::new();
    let orgs = backend
        .seed(
            "organizations",
            vec![json!({"name": "Casa Abrigo"}), json!({"name": "Rede Norte"})],
        )
        .await;
    let org_id = Uuid::parse_str(orgs[0]["id"].as_str().unwrap()).unwrap();
    let other_id = Uuid::parse_str(orgs[1]["id"].as_str().unwrap()).unwrap();
    let admin = backend
        .seed_user("admin@abrigo.test", "secret", Some(org_id))
        .await;
    let client = SupabaseClient::new(backend, ClientConfig::default());
    client.sign_in("admin@abrigo.test", "secret").await.unwrap();
    (client, org_id, other_id, admin)
}

#[tokio::test]
async fn organization_invites_can_be_cancelled() {
    let (client, org_id, _, _) = setup().await;
    let repo = SupabaseRequestRepository::new(client);

    repo.create_organization_invite(org_id, "new@abrigo.test", "social worker")
        .await
        .unwrap();
    let invites = repo.list_organization_invites(org_id).await.unwrap();
    assert_eq!(invites.len(), 1);
    assert_eq!(invites[0].email, "new@abrigo.test");
    assert_eq!(invites[0].status, RequestStatus::Pending);

    repo.cancel_organization_invite(invites[0].id).await.unwrap();
    let invites = repo.list_organization_invites(org_id).await.unwrap();
    assert_eq!(invites[0].status, RequestStatus::Canceled);

    let missing = repo
        .cancel_organization_invite(Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(missing, RelifError::NotFound { .. }));
}

#[tokio::test]
async fn join_requests_accept_through_edge_function() {
    let (client, org_id, _, _) = setup().await;
    let applicant = client
        .backend()
        .seed_user("applicant@mail.test", "secret", None)
        .await;
    let rows = client
        .backend()
        .seed(
            "organization_join_requests",
            vec![
                json!({"organization_id": org_id, "user_id": applicant, "status": "PENDING"}),
                json!({"organization_id": org_id, "user_id": applicant, "status": "PENDING"}),
            ],
        )
        .await;
    let first = Uuid::parse_str(rows[0]["id"].as_str().unwrap()).unwrap();
    let second = Uuid::parse_str(rows[1]["id"].as_str().unwrap()).unwrap();
    let repo = SupabaseRequestRepository::new(client.clone());

    let requests = repo.list_join_requests(org_id).await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.user.email == "applicant@mail.test"));

    // Unscripted functions answer 404.
    let err = repo.accept_join_request(first).await.unwrap_err();
    assert_eq!(err.status(), Some(404));

    client
        .backend()
        .set_function_response("accept-join-request", Ok(json!({"ok": true})))
        .await;
    repo.accept_join_request(first).await.unwrap();

    let calls = client.backend().function_calls().await;
    let (name, call) = calls.last().unwrap();
    assert_eq!(name, "accept-join-request");
    assert_eq!(call.method, HttpMethod::Post);
    assert_eq!(call.body, Some(json!({"requestId": first})));

    repo.reject_join_request(second).await.unwrap();
    let rejected = repo
        .list_join_requests(org_id)
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.id == second)
        .unwrap();
    assert_eq!(rejected.status, RequestStatus::Rejected);
}

#[tokio::test]
async fn data_access_requests_are_granted_or_rejected() {
    let (client, org_id, other_id, _) = setup().await;
    let rows = client
        .backend()
        .seed(
            "organization_data_access_requests",
            vec![
                json!({"target_organization_id": org_id, "requesting_organization_id": other_id, "status": "PENDING"}),
                json!({"target_organization_id": org_id, "requesting_organization_id": other_id, "status": "PENDING"}),
                json!({"target_organization_id": other_id, "requesting_organization_id": org_id, "status": "PENDING"}),
            ],
        )
        .await;
    let granted = Uuid::parse_str(rows[0]["id"].as_str().unwrap()).unwrap();
    let rejected = Uuid::parse_str(rows[1]["id"].as_str().unwrap()).unwrap();
    let repo = SupabaseRequestRepository::new(client);

    let received = repo.list_data_access_requests(org_id).await.unwrap();
    assert_eq!(received.len(), 2);
    assert!(
        received
            .iter()
            .all(|r| r.requesting_organization.name == "Rede Norte")
    );

    repo.accept_data_access_request(granted).await.unwrap();
    repo.reject_data_access_request(rejected).await.unwrap();

    let received = repo.list_data_access_requests(org_id).await.unwrap();
    let status_of = |id: Uuid| received.iter().find(|r| r.id == id).unwrap().status;
    assert_eq!(status_of(granted), RequestStatus::Granted);
    assert_eq!(status_of(rejected), RequestStatus::Rejected);
}

#[tokio::test]
async fn type_requests_are_filed_by_the_signed_in_user() {
    let (client, org_id, _, admin) = setup().await;
    let repo = SupabaseRequestRepository::new(client);

    repo.create_type_request(org_id, OrganizationType::Coordinator)
        .await
        .unwrap();
    let requests = repo.list_type_requests(org_id).await.unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.requested_by_id, admin);
    assert_eq!(request.requested_by.email, "admin@abrigo.test");
    assert_eq!(request.organization.name, "Casa Abrigo");
    assert_eq!(request.new_type, OrganizationType::Coordinator);
    assert_eq!(request.status, RequestStatus::Pending);

    repo.accept_type_request(request.id).await.unwrap();
    assert_eq!(
        repo.list_type_requests(org_id).await.unwrap()[0].status,
        RequestStatus::Approved
    );

    repo.reject_type_request(request.id).await.unwrap();
    assert_eq!(
        repo.list_type_requests(org_id).await.unwrap()[0].status,
        RequestStatus::Rejected
    );
}

#[tokio::test]
async fn platform_invites_and_admin_invites() {
    let (client, org_id, _, _) = setup().await;
    let rows = client
        .backend()
        .seed(
            "platform_invites",
            vec![json!({"organization_id": org_id, "email": "staff@abrigo.test", "status": "PENDING"})],
        )
        .await;
    let invite = Uuid::parse_str(rows[0]["id"].as_str().unwrap()).unwrap();
    let repo = SupabaseRequestRepository::new(client.clone());

    let invites = repo.list_platform_invites(org_id).await.unwrap();
    assert_eq!(invites.len(), 1);
    assert_eq!(invites[0].organization_id, Some(org_id));

    repo.accept_platform_invite(invite).await.unwrap();
    assert_eq!(
        repo.list_platform_invites(org_id).await.unwrap()[0].status,
        RequestStatus::Accepted
    );

    repo.create_platform_admin_invite("root@relif.test")
        .await
        .unwrap();
    let admin_invites = client.backend().rows("platform_admin_invites").await;
    assert_eq!(admin_invites.len(), 1);
    assert_eq!(admin_invites[0]["email"], "root@relif.test");
    assert_eq!(admin_invites[0]["status"], "PENDING");
}

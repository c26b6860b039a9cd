//! Integration tests for the auth repository on the in-memory engine.

use relif_core::error::RelifError;
use relif_core::models::auth::{InviteSignUpInput, SignUpInput};
use relif_core::models::user::PlatformRole;
use relif_core::repository::AuthRepository;
use relif_db::repository::SupabaseAuthRepository;
use relif_db::{ClientConfig, MemoryBackend, SupabaseClient};
use serde_json::json;
use uuid::Uuid;

/// Helper: an organization with one admin account, nobody signed in.
async fn setup() -> (SupabaseClient<MemoryBackend>, Uuid) {
    let backend = MemoryBackend::new();
    let org = backend
        .seed("organizations", vec![json!({"name": "Casa Abrigo"})])
        .await;
    let org_id = Uuid::parse_str(org[0]["id"].as_str().unwrap()).unwrap();
    backend
        .seed_user("admin@abrigo.test", "secret", Some(org_id))
        .await;
    (SupabaseClient::new(backend, ClientConfig::default()), org_id)
}

#[tokio::test]
async fn sign_in_me_and_sign_out() {
    let (client, org_id) = setup().await;
    let auth = SupabaseAuthRepository::new(client.clone());

    let wrong = auth.sign_in("admin@abrigo.test", "nope").await.unwrap_err();
    assert!(matches!(wrong, RelifError::AuthenticationFailed { .. }));

    let signed_in = auth.sign_in("ADMIN@abrigo.test", "secret").await.unwrap();
    assert!(!signed_in.session.access_token.is_empty());
    assert_eq!(signed_in.user.id, signed_in.session.user.id);

    let me = auth.me().await.unwrap();
    assert_eq!(me.email, "admin@abrigo.test");
    assert_eq!(me.first_name, "admin");
    assert_eq!(me.organization_id, Some(org_id));
    assert_eq!(me.platform_role, PlatformRole::OrgAdmin);

    auth.sign_out().await.unwrap();
    assert!(client.get_session().is_none());
    assert!(matches!(
        auth.current_auth_user().await.unwrap_err(),
        RelifError::AuthenticationFailed { .. }
    ));
}

#[tokio::test]
async fn sign_up_creates_profile_and_session() {
    let (client, _) = setup().await;
    let auth = SupabaseAuthRepository::new(client.clone());

    let token = auth
        .sign_up(SignUpInput {
            email: "new@mail.test".into(),
            password: "pa55word".into(),
            first_name: "Nina".into(),
            last_name: "Costa".into(),
            phones: vec!["+55 11 90000-0000".into()],
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(client.get_session().unwrap().access_token, token);

    let me = auth.me().await.unwrap();
    assert_eq!(me.first_name, "Nina");
    assert_eq!(me.phones, vec!["+55 11 90000-0000"]);

    let users = client.backend().rows("users").await;
    assert!(users.iter().any(|u| u["email"] == "new@mail.test"));

    let duplicate = auth
        .sign_up(SignUpInput {
            email: "new@mail.test".into(),
            password: "other".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(duplicate, RelifError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn invite_sign_up_adopts_the_returned_session() {
    let (client, _) = setup().await;
    let user_id = Uuid::new_v4();
    client
        .backend()
        .set_function_response(
            "auth",
            Ok(json!({
                "session": {
                    "access_token": "invite-token",
                    "refresh_token": "refresh",
                    "expires_in": 3600,
                    "token_type": "bearer",
                    "user": {"id": user_id, "email": "invited@mail.test"},
                }
            })),
        )
        .await;
    let auth = SupabaseAuthRepository::new(client.clone());

    let token = auth
        .org_sign_up(InviteSignUpInput {
            code: "INV-123".into(),
            email: "invited@mail.test".into(),
            password: "secret".into(),
            first_name: "Ivo".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(token, "invite-token");
    assert_eq!(client.current_user_id().unwrap(), user_id);

    let calls = client.backend().function_calls().await;
    let body = calls[0].1.body.clone().unwrap();
    assert_eq!(body["action"], "org-sign-up");
    assert_eq!(body["code"], "INV-123");

    client
        .backend()
        .set_function_response("auth", Ok(json!({"error": "invalid code"})))
        .await;
    let err = auth
        .admin_sign_up(InviteSignUpInput {
            code: "BAD".into(),
            email: "x@mail.test".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RelifError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn password_recovery_and_change() {
    let (client, _) = setup().await;
    let auth = SupabaseAuthRepository::new(client.clone());

    auth.request_password_change("admin@abrigo.test")
        .await
        .unwrap();
    let recoveries = client.backend().recovery_requests().await;
    assert_eq!(
        recoveries,
        vec![(
            "admin@abrigo.test".to_string(),
            "http://localhost:3000/recover-password".to_string()
        )]
    );

    assert!(auth.update_password("changed").await.is_err());

    auth.sign_in("admin@abrigo.test", "secret").await.unwrap();
    auth.update_password("changed").await.unwrap();
    auth.sign_out().await.unwrap();

    assert!(auth.sign_in("admin@abrigo.test", "secret").await.is_err());
    auth.sign_in("admin@abrigo.test", "changed").await.unwrap();
}

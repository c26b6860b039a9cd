//! Hosted implementation of [`AuthRepository`].
//!
//! Authentication never falls back to the legacy API: the session store is
//! owned by the hosted auth service.

use relif_core::error::{RelifError, RelifResult};
use relif_core::models::auth::{AuthUser, InviteSignUpInput, Session, SignUpInput, SignedIn};
use relif_core::models::user::User;
use relif_core::repository::AuthRepository;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::backend::{Backend, EdgeCall};
use crate::client::SupabaseClient;
use crate::transform;

/// Edge function handling invite-based sign-ups.
const AUTH_FUNCTION: &str = "auth";

pub struct SupabaseAuthRepository<B: Backend> {
    client: SupabaseClient<B>,
}

impl<B: Backend> Clone for SupabaseAuthRepository<B> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

impl<B: Backend> SupabaseAuthRepository<B> {
    pub fn new(client: SupabaseClient<B>) -> Self {
        Self { client }
    }

    /// Runs an invite sign-up through the edge function and adopts the
    /// returned session.
    async fn invite_sign_up(&self, action: &str, input: InviteSignUpInput) -> RelifResult<String> {
        let mut body = serde_json::to_value(&input).map_err(crate::error::DbError::from)?;
        if let Some(object) = body.as_object_mut() {
            object.insert("action".into(), Value::String(action.into()));
        }
        let result = self
            .client
            .call_edge_function(AUTH_FUNCTION, EdgeCall::post(body))
            .await?;

        let session = result.get("session").cloned().unwrap_or(Value::Null);
        let Some(token) = session
            .get("access_token")
            .and_then(Value::as_str)
            .map(String::from)
        else {
            return Err(RelifError::AuthenticationFailed {
                reason: format!("{action} returned no session token"),
            });
        };
        match serde_json::from_value::<Session>(session) {
            Ok(session) => self.client.session_store().set(Some(session)),
            Err(err) => warn!(action, error = %err, "Sign-up session could not be stored"),
        }
        info!(action, email = %input.email, "Invite sign-up completed");
        Ok(token)
    }
}

impl<B: Backend> AuthRepository for SupabaseAuthRepository<B> {
    async fn sign_in(&self, email: &str, password: &str) -> RelifResult<SignedIn> {
        let session = self.client.sign_in(email, password).await?;
        Ok(SignedIn {
            user: session.user.clone(),
            session,
        })
    }

    async fn sign_out(&self) -> RelifResult<()> {
        self.client.sign_out().await?;
        info!("Signed out");
        Ok(())
    }

    async fn sign_up(&self, input: SignUpInput) -> RelifResult<String> {
        let metadata = json!({
            "first_name": input.first_name,
            "last_name": input.last_name,
            "phones": input.phones,
            "role": input.role,
            "preferences": input.preferences,
        });
        let session = self
            .client
            .sign_up(&input.email, &input.password, metadata)
            .await?;
        session
            .map(|s| s.access_token)
            .ok_or_else(|| RelifError::AuthenticationFailed {
                reason: "sign up returned no session token".into(),
            })
    }

    async fn org_sign_up(&self, input: InviteSignUpInput) -> RelifResult<String> {
        self.invite_sign_up("org-sign-up", input).await
    }

    async fn admin_sign_up(&self, input: InviteSignUpInput) -> RelifResult<String> {
        self.invite_sign_up("admin-sign-up", input).await
    }

    async fn me(&self) -> RelifResult<User> {
        let user = self.client.get_user().await?;
        Ok(transform::auth_user(&user))
    }

    async fn current_auth_user(&self) -> RelifResult<AuthUser> {
        Ok(self.client.get_user().await?)
    }

    async fn request_password_change(&self, email: &str) -> RelifResult<()> {
        self.client.reset_password(email).await?;
        info!(email, "Password reset requested");
        Ok(())
    }

    async fn update_password(&self, password: &str) -> RelifResult<()> {
        let user = self.client.update_password(password).await?;
        info!(user_id = %user.id, "Password updated");
        Ok(())
    }
}

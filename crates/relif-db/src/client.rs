//! The uniform client every repository goes through.

use std::sync::{Arc, RwLock};

use relif_core::models::auth::{AuthUser, Session};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::{AuthRequest, Backend, EdgeCall, StorageRequest, StorageResponse};
use crate::connection::ClientConfig;
use crate::error::DbError;
use crate::query::{QueryBuilder, QueryOutput, TableQuery};

/// Process-wide holder of the current session, shared between the hosted
/// client and the legacy API client.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionStore {
    pub fn get(&self) -> Option<Session> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set(&self, session: Option<Session>) {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = session;
    }

    pub fn access_token(&self) -> Option<String> {
        self.get().map(|s| s.access_token)
    }
}

/// Hosted-backend client generic over its engine.
pub struct SupabaseClient<B: Backend> {
    backend: Arc<B>,
    config: Arc<ClientConfig>,
    session: SessionStore,
}

impl<B: Backend> Clone for SupabaseClient<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            config: Arc::clone(&self.config),
            session: self.session.clone(),
        }
    }
}

impl<B: Backend> SupabaseClient<B> {
    pub fn new(backend: B, config: ClientConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            config: Arc::new(config),
            session: SessionStore::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session_store(&self) -> &SessionStore {
        &self.session
    }

    /// Starts a query against `table`.
    pub fn from(&self, table: &str) -> QueryBuilder<'_, B> {
        QueryBuilder::new(self, table)
    }

    pub(crate) async fn execute(&self, query: TableQuery) -> Result<QueryOutput, DbError> {
        debug!(table = %query.table, "Executing table query");
        self.backend
            .execute(query, self.session.access_token())
            .await
    }

    /// Calls a server-side procedure.
    pub async fn rpc(&self, name: &str, args: Value) -> Result<Value, DbError> {
        debug!(procedure = name, "Calling procedure");
        self.backend
            .rpc(name, args, self.session.access_token())
            .await
    }

    // -- Auth ---------------------------------------------------------------

    pub fn get_session(&self) -> Option<Session> {
        self.session.get()
    }

    /// Resolves the signed-in user against the auth service.
    pub async fn get_user(&self) -> Result<AuthUser, DbError> {
        let access_token = self
            .session
            .access_token()
            .ok_or_else(|| DbError::Unauthenticated("no active session".into()))?;
        let response = self
            .backend
            .auth(AuthRequest::GetUser { access_token })
            .await?;
        response
            .user
            .ok_or_else(|| DbError::Unauthenticated("no user for session".into()))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, DbError> {
        let response = self
            .backend
            .auth(AuthRequest::SignInWithPassword {
                email: email.into(),
                password: password.into(),
            })
            .await?;
        let session = response
            .session
            .ok_or_else(|| DbError::Unauthenticated("sign-in returned no session".into()))?;
        self.session.set(Some(session.clone()));
        info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    /// Registers a user; the session is absent when email confirmation is
    /// pending.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        data: Value,
    ) -> Result<Option<Session>, DbError> {
        let response = self
            .backend
            .auth(AuthRequest::SignUp {
                email: email.into(),
                password: password.into(),
                data,
            })
            .await?;
        if let Some(session) = &response.session {
            self.session.set(Some(session.clone()));
        }
        info!(email, "Signed up");
        Ok(response.session)
    }

    pub async fn sign_out(&self) -> Result<(), DbError> {
        if let Some(access_token) = self.session.access_token() {
            self.backend
                .auth(AuthRequest::SignOut { access_token })
                .await?;
        }
        self.session.set(None);
        Ok(())
    }

    /// Sends a password-recovery email pointing back to the site.
    pub async fn reset_password(&self, email: &str) -> Result<(), DbError> {
        self.backend
            .auth(AuthRequest::Recover {
                email: email.into(),
                redirect_to: self.config.recovery_redirect(),
            })
            .await?;
        Ok(())
    }

    pub async fn update_password(&self, password: &str) -> Result<AuthUser, DbError> {
        let access_token = self
            .session
            .access_token()
            .ok_or_else(|| DbError::Unauthenticated("no active session".into()))?;
        let response = self
            .backend
            .auth(AuthRequest::UpdateUser {
                access_token,
                password: Some(password.into()),
                data: None,
            })
            .await?;
        response
            .user
            .ok_or_else(|| DbError::Unauthenticated("no user for session".into()))
    }

    /// Id of the signed-in user.
    pub fn current_user_id(&self) -> Result<Uuid, DbError> {
        self.session
            .get()
            .map(|s| s.user.id)
            .ok_or_else(|| DbError::Unauthenticated("no active session".into()))
    }

    /// Organization of the signed-in user, read from the `users` table.
    pub async fn current_organization_id(&self) -> Result<Uuid, DbError> {
        let user_id = self.current_user_id()?;
        let row = self
            .from("users")
            .select("organization_id")
            .eq("id", user_id)
            .single()
            .await?;
        row.get("organization_id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| DbError::Unauthenticated("user has no organization".into()))
    }

    // -- Storage ------------------------------------------------------------

    pub async fn upload_file(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DbError> {
        let response = self
            .storage(StorageRequest::Upload {
                bucket: bucket.into(),
                path: path.into(),
                content_type: content_type.into(),
                bytes,
            })
            .await?;
        match response {
            StorageResponse::Uploaded(key) => Ok(key),
            other => Err(unexpected_storage(other)),
        }
    }

    /// URL of an object in a public bucket. Computed locally.
    pub fn get_public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/object/public/{bucket}/{}",
            self.config.storage_url(),
            path.trim_start_matches('/')
        )
    }

    pub async fn create_signed_upload_url(
        &self,
        bucket: &str,
        path: &str,
    ) -> Result<String, DbError> {
        let response = self
            .storage(StorageRequest::CreateSignedUploadUrl {
                bucket: bucket.into(),
                path: path.into(),
            })
            .await?;
        match response {
            StorageResponse::SignedUrl(url) => Ok(url),
            other => Err(unexpected_storage(other)),
        }
    }

    pub async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: u64,
    ) -> Result<String, DbError> {
        let response = self
            .storage(StorageRequest::CreateSignedUrl {
                bucket: bucket.into(),
                path: path.into(),
                expires_in,
            })
            .await?;
        match response {
            StorageResponse::SignedUrl(url) => Ok(url),
            other => Err(unexpected_storage(other)),
        }
    }

    pub async fn remove_files(&self, bucket: &str, paths: Vec<String>) -> Result<(), DbError> {
        self.storage(StorageRequest::Remove {
            bucket: bucket.into(),
            paths,
        })
        .await?;
        Ok(())
    }

    async fn storage(&self, request: StorageRequest) -> Result<StorageResponse, DbError> {
        self.backend
            .storage(request, self.session.access_token())
            .await
    }

    // -- Edge functions -----------------------------------------------------

    /// Invokes a serverless function with the caller's bearer token.
    pub async fn call_edge_function(&self, name: &str, call: EdgeCall) -> Result<Value, DbError> {
        info!(function = name, method = call.method.as_str(), "Invoking edge function");
        self.backend
            .invoke(name, call, self.session.access_token())
            .await
    }
}

fn unexpected_storage(response: StorageResponse) -> DbError {
    DbError::Storage {
        status: 500,
        message: format!("unexpected storage response: {response:?}"),
    }
}

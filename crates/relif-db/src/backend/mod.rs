//! Engines behind [`SupabaseClient`](crate::client::SupabaseClient).
//!
//! [`RestBackend`](rest::RestBackend) talks to the hosted service over
//! HTTP. [`MemoryBackend`](memory::MemoryBackend) keeps everything in
//! process and is what the test suites run against.

pub mod memory;
pub mod rest;

use relif_core::models::auth::{AuthUser, Session};
use serde_json::Value;

use crate::error::DbError;
use crate::query::{QueryOutput, TableQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Call to the hosted authentication service.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthRequest {
    SignInWithPassword {
        email: String,
        password: String,
    },
    /// `data` becomes the new user's metadata.
    SignUp {
        email: String,
        password: String,
        data: Value,
    },
    SignOut {
        access_token: String,
    },
    Recover {
        email: String,
        redirect_to: String,
    },
    GetUser {
        access_token: String,
    },
    UpdateUser {
        access_token: String,
        password: Option<String>,
        data: Option<Value>,
    },
}

/// What the auth service handed back. Either part may be absent, e.g. a
/// sign-up awaiting email confirmation carries no session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthResponse {
    pub user: Option<AuthUser>,
    pub session: Option<Session>,
}

/// Call to object storage. Paths are relative to the bucket.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageRequest {
    Upload {
        bucket: String,
        path: String,
        content_type: String,
        bytes: Vec<u8>,
    },
    CreateSignedUploadUrl {
        bucket: String,
        path: String,
    },
    CreateSignedUrl {
        bucket: String,
        path: String,
        expires_in: u64,
    },
    Remove {
        bucket: String,
        paths: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageResponse {
    /// Object key of the stored file.
    Uploaded(String),
    /// Absolute URL, signed for upload or download.
    SignedUrl(String),
    Removed(Vec<String>),
}

/// Edge-function invocation parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeCall {
    pub method: HttpMethod,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl EdgeCall {
    pub fn post(body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            body: Some(body),
            headers: Vec::new(),
        }
    }
}

/// An engine that can serve table, procedure, auth, storage and function
/// calls. `token` is the caller's access token, if signed in.
pub trait Backend: Send + Sync + 'static {
    fn execute(
        &self,
        query: TableQuery,
        token: Option<String>,
    ) -> impl Future<Output = Result<QueryOutput, DbError>> + Send;

    fn rpc(
        &self,
        name: &str,
        args: Value,
        token: Option<String>,
    ) -> impl Future<Output = Result<Value, DbError>> + Send;

    fn auth(
        &self,
        request: AuthRequest,
    ) -> impl Future<Output = Result<AuthResponse, DbError>> + Send;

    fn storage(
        &self,
        request: StorageRequest,
        token: Option<String>,
    ) -> impl Future<Output = Result<StorageResponse, DbError>> + Send;

    fn invoke(
        &self,
        name: &str,
        call: EdgeCall,
        token: Option<String>,
    ) -> impl Future<Output = Result<Value, DbError>> + Send;
}

//! Client for the legacy REST API that is being phased out.
//!
//! Routes mirror the entity prefixes the old service exposed
//! (`beneficiaries/{id}`, `organizations/{id}/housings`, ...). Responses
//! are returned as raw JSON so callers keep the legacy shape.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::HttpMethod;
use crate::client::SessionStore;
use crate::error::DbError;

/// One call against the legacy API.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyRequest {
    pub method: HttpMethod,
    /// Path relative to the API base, without a leading slash.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl LegacyRequest {
    fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// `offset` and `limit` parameters of a paginated listing.
    pub fn page(self, pagination: relif_core::repository::Pagination) -> Self {
        self.query("offset", pagination.offset)
            .query("limit", pagination.limit)
    }

    /// Serializes `body` as the JSON payload. A value that fails to
    /// serialize leaves the request without a body.
    pub fn json(mut self, body: &impl Serialize) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.body = Some(value),
            Err(err) => {
                warn!(path = %self.path, error = %err, "Legacy request body could not be serialized");
                self.body = None;
            }
        }
        self
    }
}

/// Anything that can answer legacy API calls.
pub trait LegacyApi: Send + Sync + 'static {
    fn request(
        &self,
        request: LegacyRequest,
    ) -> impl Future<Output = Result<Value, DbError>> + Send;
}

/// reqwest implementation; authenticates with the shared session token.
#[derive(Debug, Clone)]
pub struct HttpLegacyApi {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
}

impl HttpLegacyApi {
    pub fn new(
        base_url: &str,
        session: SessionStore,
        timeout: Duration,
    ) -> Result<Self, DbError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }
}

impl LegacyApi for HttpLegacyApi {
    async fn request(&self, request: LegacyRequest) -> Result<Value, DbError> {
        let url = format!("{}/{}", self.base_url, request.path.trim_start_matches('/'));
        debug!(method = request.method.as_str(), %url, "Legacy API request");

        let mut builder = match request.method {
            HttpMethod::Get => self.http.get(&url),
            HttpMethod::Post => self.http.post(&url),
            HttpMethod::Put => self.http.put(&url),
            HttpMethod::Patch => self.http.patch(&url),
            HttpMethod::Delete => self.http.delete(&url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = self.session.access_token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(DbError::Legacy {
                status: status.as_u16(),
                message: legacy_message(&text),
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// The legacy API reports failures as `{"error": "..."}` or
/// `{"message": "..."}`.
fn legacy_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .or_else(|| v.get("message"))
                .and_then(Value::as_str)
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

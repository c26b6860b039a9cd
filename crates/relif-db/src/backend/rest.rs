//! HTTP engine for the hosted service (PostgREST, auth, storage and
//! functions endpoints).

use relif_core::models::auth::{AuthUser, Session};
use reqwest::header::{CONTENT_RANGE, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response};
use serde_json::{Value, json};
use tracing::debug;

use super::{
    AuthRequest, AuthResponse, Backend, EdgeCall, HttpMethod, StorageRequest, StorageResponse,
};
use crate::connection::ClientConfig;
use crate::error::DbError;
use crate::query::{Operation, QueryOutput, TableQuery};

#[derive(Debug, Clone)]
pub struct RestBackend {
    http: reqwest::Client,
    config: ClientConfig,
}

impl RestBackend {
    pub fn new(config: ClientConfig) -> Result<Self, DbError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    fn request(&self, method: HttpMethod, url: &str, token: Option<&str>) -> RequestBuilder {
        let builder = match method {
            HttpMethod::Get => self.http.get(url),
            HttpMethod::Post => self.http.post(url),
            HttpMethod::Put => self.http.put(url),
            HttpMethod::Patch => self.http.patch(url),
            HttpMethod::Delete => self.http.delete(url),
        };
        builder
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token.unwrap_or(&self.config.anon_key))
    }
}

/// Reads a response body, mapping non-2xx statuses through `on_error`.
async fn read_json(
    response: Response,
    on_error: impl FnOnce(u16, &Value, String) -> DbError,
) -> Result<(Value, Option<String>), DbError> {
    let status = response.status();
    let range = response
        .headers()
        .get(CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let text = response.text().await?;
    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text.clone()))
    };
    if !status.is_success() {
        return Err(on_error(status.as_u16(), &body, text));
    }
    Ok((body, range))
}

/// First present string among `keys`, or the raw body.
fn error_message(body: &Value, keys: &[&str], raw: String) -> String {
    keys.iter()
        .find_map(|k| body.get(*k).and_then(Value::as_str))
        .map(String::from)
        .unwrap_or(raw)
}

fn rest_error(status: u16, body: &Value, raw: String) -> DbError {
    DbError::Backend {
        status,
        code: body.get("code").and_then(Value::as_str).map(String::from),
        message: error_message(body, &["message", "details", "hint"], raw),
    }
}

fn auth_error(status: u16, body: &Value, raw: String) -> DbError {
    DbError::Auth {
        status,
        message: error_message(body, &["error_description", "msg", "message", "error"], raw),
    }
}

fn storage_error(status: u16, body: &Value, raw: String) -> DbError {
    DbError::Storage {
        status,
        message: error_message(body, &["message", "error"], raw),
    }
}

fn function_error(status: u16, body: &Value, raw: String) -> DbError {
    DbError::EdgeFunction {
        status,
        message: error_message(body, &["error", "message"], raw),
    }
}

/// Total from a `Content-Range` header such as `0-19/25` or `*/0`.
pub(crate) fn parse_content_range(header: &str) -> Option<u64> {
    header.rsplit_once('/')?.1.parse().ok()
}

fn decode_auth(body: Value) -> Result<AuthResponse, DbError> {
    if body.get("access_token").is_some() {
        let session: Session = serde_json::from_value(body)?;
        return Ok(AuthResponse {
            user: Some(session.user.clone()),
            session: Some(session),
        });
    }
    if body.get("id").is_some() {
        let user: AuthUser = serde_json::from_value(body)?;
        return Ok(AuthResponse {
            user: Some(user),
            session: None,
        });
    }
    Ok(AuthResponse::default())
}

impl Backend for RestBackend {
    async fn execute(
        &self,
        query: TableQuery,
        token: Option<String>,
    ) -> Result<QueryOutput, DbError> {
        let url = format!("{}/{}", self.config.rest_url(), query.table);
        let (method, body) = match &query.operation {
            Operation::Select => (HttpMethod::Get, None),
            Operation::Insert(rows) => (HttpMethod::Post, Some(Value::Array(rows.clone()))),
            Operation::Update(patch) => (HttpMethod::Patch, Some(patch.clone())),
            Operation::Delete => (HttpMethod::Delete, None),
        };

        let params = match query.operation {
            // Inserts only take the projection of the returned rows.
            Operation::Insert(_) => vec![("select".to_string(), query.select.render())],
            _ => query.params(),
        };
        let mut prefer = vec!["return=representation"];
        if query.count {
            prefer.push("count=exact");
        }

        debug!(table = %query.table, method = method.as_str(), "PostgREST request");
        let mut builder = self
            .request(method, &url, token.as_deref())
            .query(&params)
            .header("Prefer", prefer.join(","));
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let (body, range) = read_json(builder.send().await?, rest_error).await?;
        let rows = match body {
            Value::Array(rows) => rows,
            Value::Null => Vec::new(),
            row => vec![row],
        };
        let count = if query.count {
            range.as_deref().and_then(parse_content_range)
        } else {
            None
        };
        Ok(QueryOutput { rows, count })
    }

    async fn rpc(&self, name: &str, args: Value, token: Option<String>) -> Result<Value, DbError> {
        let url = format!("{}/rpc/{name}", self.config.rest_url());
        let response = self
            .request(HttpMethod::Post, &url, token.as_deref())
            .json(&args)
            .send()
            .await?;
        Ok(read_json(response, rest_error).await?.0)
    }

    async fn auth(&self, request: AuthRequest) -> Result<AuthResponse, DbError> {
        let base = self.config.auth_url();
        let builder = match request {
            AuthRequest::SignInWithPassword { email, password } => self
                .request(HttpMethod::Post, &format!("{base}/token"), None)
                .query(&[("grant_type", "password")])
                .json(&json!({ "email": email, "password": password })),
            AuthRequest::SignUp {
                email,
                password,
                data,
            } => self
                .request(HttpMethod::Post, &format!("{base}/signup"), None)
                .json(&json!({ "email": email, "password": password, "data": data })),
            AuthRequest::SignOut { access_token } => self.request(
                HttpMethod::Post,
                &format!("{base}/logout"),
                Some(&access_token),
            ),
            AuthRequest::Recover { email, redirect_to } => self
                .request(HttpMethod::Post, &format!("{base}/recover"), None)
                .query(&[("redirect_to", redirect_to)])
                .json(&json!({ "email": email })),
            AuthRequest::GetUser { access_token } => {
                self.request(HttpMethod::Get, &format!("{base}/user"), Some(&access_token))
            }
            AuthRequest::UpdateUser {
                access_token,
                password,
                data,
            } => {
                let mut body = serde_json::Map::new();
                if let Some(password) = password {
                    body.insert("password".into(), Value::String(password));
                }
                if let Some(data) = data {
                    body.insert("data".into(), data);
                }
                self.request(HttpMethod::Put, &format!("{base}/user"), Some(&access_token))
                    .json(&Value::Object(body))
            }
        };
        let (body, _) = read_json(builder.send().await?, auth_error).await?;
        decode_auth(body)
    }

    async fn storage(
        &self,
        request: StorageRequest,
        token: Option<String>,
    ) -> Result<StorageResponse, DbError> {
        let base = self.config.storage_url();
        let token = token.as_deref();
        match request {
            StorageRequest::Upload {
                bucket,
                path,
                content_type,
                bytes,
            } => {
                let url = format!("{base}/object/{bucket}/{path}");
                let response = self
                    .request(HttpMethod::Post, &url, token)
                    .header(CONTENT_TYPE, content_type)
                    .header("x-upsert", "false")
                    .body(bytes)
                    .send()
                    .await?;
                let (body, _) = read_json(response, storage_error).await?;
                let key = body
                    .get("Key")
                    .and_then(Value::as_str)
                    .map(String::from)
                    .unwrap_or(format!("{bucket}/{path}"));
                Ok(StorageResponse::Uploaded(key))
            }
            StorageRequest::CreateSignedUploadUrl { bucket, path } => {
                let url = format!("{base}/object/upload/sign/{bucket}/{path}");
                let response = self.request(HttpMethod::Post, &url, token).send().await?;
                let (body, _) = read_json(response, storage_error).await?;
                signed_url(&base, &body, "url")
            }
            StorageRequest::CreateSignedUrl {
                bucket,
                path,
                expires_in,
            } => {
                let url = format!("{base}/object/sign/{bucket}/{path}");
                let response = self
                    .request(HttpMethod::Post, &url, token)
                    .json(&json!({ "expiresIn": expires_in }))
                    .send()
                    .await?;
                let (body, _) = read_json(response, storage_error).await?;
                signed_url(&base, &body, "signedURL")
            }
            StorageRequest::Remove { bucket, paths } => {
                let url = format!("{base}/object/{bucket}");
                let response = self
                    .request(HttpMethod::Delete, &url, token)
                    .json(&json!({ "prefixes": paths }))
                    .send()
                    .await?;
                let (body, _) = read_json(response, storage_error).await?;
                let removed = body
                    .as_array()
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|i| i.get("name").and_then(Value::as_str))
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(StorageResponse::Removed(removed))
            }
        }
    }

    async fn invoke(
        &self,
        name: &str,
        call: EdgeCall,
        token: Option<String>,
    ) -> Result<Value, DbError> {
        let url = format!("{}/{name}", self.config.functions_url());
        let mut builder = self.request(call.method, &url, token.as_deref());
        for (key, value) in &call.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &call.body {
            builder = builder.json(body);
        }
        Ok(read_json(builder.send().await?, function_error).await?.0)
    }
}

/// Storage returns signed paths relative to the storage endpoint.
fn signed_url(base: &str, body: &Value, key: &str) -> Result<StorageResponse, DbError> {
    let path = body
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| DbError::Storage {
            status: 500,
            message: format!("storage response is missing `{key}`"),
        })?;
    if path.starts_with("http") {
        return Ok(StorageResponse::SignedUrl(path.to_string()));
    }
    Ok(StorageResponse::SignedUrl(format!(
        "{base}/{}",
        path.trim_start_matches('/')
    )))
}

//! In-process engine with the same table, auth, storage and function
//! semantics as the hosted service.
//!
//! Tables are created on first write and read as empty before that. All
//! state sits behind one mutex, so every call (procedures included) is
//! atomic.

mod procedures;

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{SecondsFormat, Utc};
use relif_core::models::auth::{AuthUser, Session};
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    AuthRequest, AuthResponse, Backend, EdgeCall, StorageRequest, StorageResponse,
};
use crate::error::DbError;
use crate::query::{Embed, Filter, Operation, QueryOutput, Select, TableQuery};

struct Account {
    user: AuthUser,
    password: String,
}

struct StoredObject {
    content_type: String,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<Value>>,
    accounts: Vec<Account>,
    tokens: HashMap<String, Uuid>,
    recoveries: Vec<(String, String)>,
    objects: BTreeMap<(String, String), StoredObject>,
    functions: HashMap<String, Result<Value, u16>>,
    function_calls: Vec<(String, EdgeCall)>,
    failures: HashMap<String, u16>,
}

/// Test and local-development engine.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts rows as-is, filling `id` and timestamps when missing.
    pub async fn seed(&self, table: &str, rows: Vec<Value>) -> Vec<Value> {
        let mut state = self.state.lock().await;
        rows.into_iter()
            .map(|row| state.insert_row(table, row))
            .collect()
    }

    /// Current contents of `table`.
    pub async fn rows(&self, table: &str) -> Vec<Value> {
        let state = self.state.lock().await;
        state.tables.get(table).cloned().unwrap_or_default()
    }

    /// Creates an auth account plus its `users` row and returns its id.
    pub async fn seed_user(
        &self,
        email: &str,
        password: &str,
        organization_id: Option<Uuid>,
    ) -> Uuid {
        let mut state = self.state.lock().await;
        let metadata = json!({
            "first_name": email.split('@').next().unwrap_or_default(),
            "last_name": "",
            "organization_id": organization_id,
            "platform_role": if organization_id.is_some() { "ORG_ADMIN" } else { "NO_ORG" },
        });
        state.create_account(email, password, metadata).id
    }

    /// Makes every call touching `table` fail with `status`. Procedures
    /// are addressed as `rpc/<name>`.
    pub async fn fail_table(&self, table: &str, status: u16) {
        self.state
            .lock()
            .await
            .failures
            .insert(table.to_string(), status);
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failures.clear();
    }

    /// Scripts the reply of an edge function: a body, or an error status.
    pub async fn set_function_response(&self, name: &str, response: Result<Value, u16>) {
        self.state
            .lock()
            .await
            .functions
            .insert(name.to_string(), response);
    }

    /// Every edge-function call received so far, in order.
    pub async fn function_calls(&self) -> Vec<(String, EdgeCall)> {
        self.state.lock().await.function_calls.clone()
    }

    /// `(email, redirect_to)` of each password-recovery request.
    pub async fn recovery_requests(&self) -> Vec<(String, String)> {
        self.state.lock().await.recoveries.clone()
    }

    /// Content type and bytes of a stored object.
    pub async fn object(&self, bucket: &str, path: &str) -> Option<(String, Vec<u8>)> {
        let state = self.state.lock().await;
        state
            .objects
            .get(&(bucket.to_string(), path.to_string()))
            .map(|o| (o.content_type.clone(), o.bytes.clone()))
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Text form of a column value; `None` for SQL null.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Case-insensitive SQL `LIKE`: `%` matches any run, `_` one character.
pub(crate) fn like(pattern: &str, input: &str) -> bool {
    let p: Vec<char> = pattern.to_lowercase().chars().collect();
    let s: Vec<char> = input.to_lowercase().chars().collect();
    let (mut pi, mut si) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while si < s.len() {
        if pi < p.len() && (p[pi] == '_' || p[pi] == s[si]) {
            pi += 1;
            si += 1;
        } else if pi < p.len() && p[pi] == '%' {
            backtrack = Some((pi, si));
            pi += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            si = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|c| *c == '%')
}

fn matches(row: &Value, filter: &Filter) -> bool {
    match filter {
        Filter::Eq(column, value) => text(row.get(column)).as_deref() == Some(value.as_str()),
        Filter::Neq(column, value) => {
            text(row.get(column)).is_some_and(|actual| actual != *value)
        }
        Filter::Ilike(column, pattern) => {
            text(row.get(column)).is_some_and(|actual| like(pattern, &actual))
        }
        Filter::In(column, values) => {
            text(row.get(column)).is_some_and(|actual| values.contains(&actual))
        }
        Filter::IsNull(column) => text(row.get(column)).is_none(),
        Filter::Or(any) => any.iter().any(|f| matches(row, f)),
    }
}

/// Ascending order with nulls last.
fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => text(Some(x)).cmp(&text(Some(y))),
    }
}

fn project(row: &Value, columns: &[String]) -> Value {
    if columns.is_empty() {
        return row.clone();
    }
    let object: Map<String, Value> = columns
        .iter()
        .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
        .collect();
    Value::Object(object)
}

fn injected(status: u16, target: &str) -> DbError {
    DbError::Backend {
        status,
        code: None,
        message: format!("injected failure for {target}"),
    }
}

impl State {
    fn table(&self, name: &str) -> &[Value] {
        self.tables.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    fn check_failure(&self, target: &str) -> Result<(), DbError> {
        match self.failures.get(target) {
            Some(status) => Err(injected(*status, target)),
            None => Ok(()),
        }
    }

    fn insert_row(&mut self, table: &str, row: Value) -> Value {
        let mut object = match row {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let stamp = now();
        if text(object.get("id")).is_none() {
            object.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
        }
        for key in ["created_at", "updated_at"] {
            if text(object.get(key)).is_none() {
                object.insert(key.into(), Value::String(stamp.clone()));
            }
        }
        let row = Value::Object(object);
        self.tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        row
    }

    /// Applies `patch` to every row matching `filters`.
    fn update_rows(&mut self, table: &str, filters: &[Filter], patch: &Value) -> Vec<Value> {
        let stamp = now();
        let Some(rows) = self.tables.get_mut(table) else {
            return Vec::new();
        };
        let mut updated = Vec::new();
        for row in rows.iter_mut() {
            if !filters.iter().all(|f| matches(row, f)) {
                continue;
            }
            if let (Some(target), Some(changes)) = (row.as_object_mut(), patch.as_object()) {
                for (key, value) in changes {
                    target.insert(key.clone(), value.clone());
                }
                if !changes.contains_key("updated_at") {
                    target.insert("updated_at".into(), Value::String(stamp.clone()));
                }
            }
            updated.push(row.clone());
        }
        updated
    }

    fn find(&self, table: &str, id: &str) -> Option<&Value> {
        self.table(table)
            .iter()
            .find(|row| text(row.get("id")).as_deref() == Some(id))
    }

    fn shape(&self, row: &Value, select: &Select) -> Value {
        let mut shaped = project(row, &select.columns);
        for Embed {
            alias,
            table,
            foreign_key,
            columns,
        } in &select.embeds
        {
            let related = text(row.get(foreign_key))
                .and_then(|id| self.find(table, &id))
                .map(|r| project(r, columns))
                .unwrap_or(Value::Null);
            if let Some(object) = shaped.as_object_mut() {
                object.insert(alias.clone(), related);
            }
        }
        shaped
    }

    fn execute(&mut self, query: TableQuery) -> Result<QueryOutput, DbError> {
        self.check_failure(&query.table)?;
        let TableQuery {
            table,
            operation,
            select,
            filters,
            order,
            window,
            count,
        } = query;

        let rows = match operation {
            Operation::Select => {
                let mut rows: Vec<Value> = self
                    .table(&table)
                    .iter()
                    .filter(|row| filters.iter().all(|f| matches(row, f)))
                    .cloned()
                    .collect();
                let total = rows.len() as u64;
                rows.sort_by(|a, b| {
                    order
                        .iter()
                        .map(|o| {
                            let ord = compare(a.get(&o.column), b.get(&o.column));
                            if o.ascending { ord } else { ord.reverse() }
                        })
                        .find(|ord| *ord != Ordering::Equal)
                        .unwrap_or(Ordering::Equal)
                });
                if let Some((offset, limit)) = window {
                    rows = rows
                        .into_iter()
                        .skip(offset as usize)
                        .take(limit as usize)
                        .collect();
                }
                let rows = rows.iter().map(|r| self.shape(r, &select)).collect();
                return Ok(QueryOutput {
                    rows,
                    count: count.then_some(total),
                });
            }
            Operation::Insert(new_rows) => new_rows
                .into_iter()
                .map(|row| self.insert_row(&table, row))
                .collect::<Vec<_>>(),
            Operation::Update(patch) => self.update_rows(&table, &filters, &patch),
            Operation::Delete => {
                let Some(rows) = self.tables.get_mut(&table) else {
                    return Ok(QueryOutput::default());
                };
                let (removed, kept): (Vec<Value>, Vec<Value>) = rows
                    .drain(..)
                    .partition(|row| filters.iter().all(|f| matches(row, f)));
                *rows = kept;
                removed
            }
        };

        let total = rows.len() as u64;
        let rows = rows.iter().map(|r| self.shape(r, &select)).collect();
        Ok(QueryOutput {
            rows,
            count: count.then_some(total),
        })
    }

    fn create_account(&mut self, email: &str, password: &str, metadata: Value) -> AuthUser {
        let id = Uuid::new_v4();
        let stamp = Utc::now();
        let user = AuthUser {
            id,
            email: Some(email.to_string()),
            user_metadata: metadata.clone(),
            created_at: Some(stamp),
            updated_at: Some(stamp),
        };
        self.accounts.push(Account {
            user: user.clone(),
            password: password.to_string(),
        });

        // Mirrors the hosted `on_auth_user_created` trigger.
        let field = |key: &str| metadata.get(key).cloned().unwrap_or(Value::Null);
        let platform_role = text(metadata.get("platform_role")).unwrap_or("NO_ORG".into());
        self.insert_row(
            "users",
            json!({
                "id": id,
                "email": email,
                "first_name": field("first_name"),
                "last_name": field("last_name"),
                "phones": field("phones"),
                "role": field("role"),
                "preferences": field("preferences"),
                "organization_id": field("organization_id"),
                "platform_role": platform_role,
                "status": "ACTIVE",
            }),
        );
        user
    }

    fn open_session(&mut self, user: AuthUser) -> Session {
        let access_token = Uuid::new_v4().to_string();
        self.tokens.insert(access_token.clone(), user.id);
        Session {
            access_token,
            refresh_token: Uuid::new_v4().to_string(),
            expires_in: 3600,
            token_type: "bearer".into(),
            user,
        }
    }

    fn account_for_token(&mut self, token: &str) -> Result<&mut Account, DbError> {
        let invalid = || DbError::Auth {
            status: 401,
            message: "invalid JWT".into(),
        };
        let id = *self.tokens.get(token).ok_or_else(invalid)?;
        self.accounts
            .iter_mut()
            .find(|a| a.user.id == id)
            .ok_or_else(invalid)
    }

    fn auth(&mut self, request: AuthRequest) -> Result<AuthResponse, DbError> {
        match request {
            AuthRequest::SignInWithPassword { email, password } => {
                let user = self
                    .accounts
                    .iter()
                    .find(|a| {
                        a.password == password
                            && a.user
                                .email
                                .as_deref()
                                .is_some_and(|e| e.eq_ignore_ascii_case(&email))
                    })
                    .map(|a| a.user.clone())
                    .ok_or_else(|| DbError::Auth {
                        status: 400,
                        message: "Invalid login credentials".into(),
                    })?;
                let session = self.open_session(user.clone());
                Ok(AuthResponse {
                    user: Some(user),
                    session: Some(session),
                })
            }
            AuthRequest::SignUp {
                email,
                password,
                data,
            } => {
                let taken = self.accounts.iter().any(|a| {
                    a.user
                        .email
                        .as_deref()
                        .is_some_and(|e| e.eq_ignore_ascii_case(&email))
                });
                if taken {
                    return Err(DbError::Auth {
                        status: 422,
                        message: "User already registered".into(),
                    });
                }
                let user = self.create_account(&email, &password, data);
                let session = self.open_session(user.clone());
                Ok(AuthResponse {
                    user: Some(user),
                    session: Some(session),
                })
            }
            AuthRequest::SignOut { access_token } => {
                self.tokens.remove(&access_token);
                Ok(AuthResponse::default())
            }
            AuthRequest::Recover { email, redirect_to } => {
                self.recoveries.push((email, redirect_to));
                Ok(AuthResponse::default())
            }
            AuthRequest::GetUser { access_token } => {
                let account = self.account_for_token(&access_token)?;
                Ok(AuthResponse {
                    user: Some(account.user.clone()),
                    session: None,
                })
            }
            AuthRequest::UpdateUser {
                access_token,
                password,
                data,
            } => {
                let account = self.account_for_token(&access_token)?;
                if let Some(password) = password {
                    account.password = password;
                }
                if let (Some(Value::Object(changes)), Some(meta)) =
                    (data, account.user.user_metadata.as_object_mut())
                {
                    meta.extend(changes);
                }
                account.user.updated_at = Some(Utc::now());
                Ok(AuthResponse {
                    user: Some(account.user.clone()),
                    session: None,
                })
            }
        }
    }

    fn storage(&mut self, request: StorageRequest) -> Result<StorageResponse, DbError> {
        match request {
            StorageRequest::Upload {
                bucket,
                path,
                content_type,
                bytes,
            } => {
                let key = (bucket.clone(), path.clone());
                if self.objects.contains_key(&key) {
                    return Err(DbError::Storage {
                        status: 409,
                        message: "The resource already exists".into(),
                    });
                }
                self.objects.insert(
                    key,
                    StoredObject {
                        content_type,
                        bytes,
                    },
                );
                Ok(StorageResponse::Uploaded(format!("{bucket}/{path}")))
            }
            StorageRequest::CreateSignedUploadUrl { bucket, path } => {
                Ok(StorageResponse::SignedUrl(format!(
                    "memory://storage/object/upload/sign/{bucket}/{path}?token={}",
                    Uuid::new_v4()
                )))
            }
            StorageRequest::CreateSignedUrl {
                bucket,
                path,
                expires_in,
            } => {
                if !self.objects.contains_key(&(bucket.clone(), path.clone())) {
                    return Err(DbError::Storage {
                        status: 404,
                        message: "Object not found".into(),
                    });
                }
                Ok(StorageResponse::SignedUrl(format!(
                    "memory://storage/object/sign/{bucket}/{path}?token={}&expires_in={expires_in}",
                    Uuid::new_v4()
                )))
            }
            StorageRequest::Remove { bucket, paths } => {
                let removed = paths
                    .into_iter()
                    .filter(|p| self.objects.remove(&(bucket.clone(), p.clone())).is_some())
                    .collect();
                Ok(StorageResponse::Removed(removed))
            }
        }
    }
}

impl Backend for MemoryBackend {
    async fn execute(
        &self,
        query: TableQuery,
        _token: Option<String>,
    ) -> Result<QueryOutput, DbError> {
        self.state.lock().await.execute(query)
    }

    async fn rpc(&self, name: &str, args: Value, _token: Option<String>) -> Result<Value, DbError> {
        let mut state = self.state.lock().await;
        state.check_failure(&format!("rpc/{name}"))?;
        procedures::call(&mut state, name, &args)
    }

    async fn auth(&self, request: AuthRequest) -> Result<AuthResponse, DbError> {
        self.state.lock().await.auth(request)
    }

    async fn storage(
        &self,
        request: StorageRequest,
        _token: Option<String>,
    ) -> Result<StorageResponse, DbError> {
        self.state.lock().await.storage(request)
    }

    async fn invoke(
        &self,
        name: &str,
        call: EdgeCall,
        _token: Option<String>,
    ) -> Result<Value, DbError> {
        let mut state = self.state.lock().await;
        state.function_calls.push((name.to_string(), call));
        match state.functions.get(name) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(DbError::EdgeFunction {
                status: *status,
                message: format!("function {name} failed"),
            }),
            None => Err(DbError::EdgeFunction {
                status: 404,
                message: format!("function {name} not found"),
            }),
        }
    }
}

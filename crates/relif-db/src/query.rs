//! Table query description and the chainable builder used by repositories.
//!
//! A [`TableQuery`] is a backend-neutral description of one table call.
//! The REST engine renders it into PostgREST query parameters; the memory
//! engine evaluates it directly against its rows.

use relif_core::repository::Pagination;
use serde_json::Value;

use crate::backend::Backend;
use crate::client::SupabaseClient;
use crate::error::{DbError, NO_SINGLE_ROW};

/// A row filter. Values are compared in their text form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq(String, String),
    Neq(String, String),
    /// Case-insensitive match; `%` matches any run, `_` one character.
    Ilike(String, String),
    In(String, Vec<String>),
    IsNull(String),
    /// Matches when any of the inner filters matches.
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: &str, value: impl ToString) -> Self {
        Filter::Eq(column.into(), value.to_string())
    }

    pub fn ilike(column: &str, pattern: impl Into<String>) -> Self {
        Filter::Ilike(column.into(), pattern.into())
    }

    /// Renders the `column=op.value` pair of a top-level filter.
    pub fn to_param(&self) -> (String, String) {
        match self {
            Filter::Eq(c, v) => (c.clone(), format!("eq.{v}")),
            Filter::Neq(c, v) => (c.clone(), format!("neq.{v}")),
            Filter::Ilike(c, p) => (c.clone(), format!("ilike.{}", p.replace('%', "*"))),
            Filter::In(c, vs) => {
                let list: Vec<String> = vs.iter().map(|v| quote(v)).collect();
                (c.clone(), format!("in.({})", list.join(",")))
            }
            Filter::IsNull(c) => (c.clone(), "is.null".into()),
            Filter::Or(inner) => ("or".into(), format!("({})", render_group(inner))),
        }
    }

    /// Renders the filter as a member of an `or=(...)` group.
    fn to_condition(&self) -> String {
        match self {
            Filter::Or(inner) => format!("or({})", render_group(inner)),
            Filter::Ilike(c, p) => format!("{c}.ilike.{}", quote(&p.replace('%', "*"))),
            Filter::Eq(c, v) => format!("{c}.eq.{}", quote(v)),
            Filter::Neq(c, v) => format!("{c}.neq.{}", quote(v)),
            other => {
                let (column, op) = other.to_param();
                format!("{column}.{op}")
            }
        }
    }
}

fn render_group(filters: &[Filter]) -> String {
    filters
        .iter()
        .map(Filter::to_condition)
        .collect::<Vec<_>>()
        .join(",")
}

/// Double-quotes values holding PostgREST list delimiters.
fn quote(value: &str) -> String {
    if value.contains([',', '(', ')', '"']) {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A to-one related row embedded under `alias`, joined on
/// `parent.foreign_key = table.id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub alias: String,
    pub table: String,
    pub foreign_key: String,
    pub columns: Vec<String>,
}

impl Embed {
    pub fn new(alias: &str, table: &str, foreign_key: &str, columns: &[&str]) -> Self {
        Self {
            alias: alias.into(),
            table: table.into(),
            foreign_key: foreign_key.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn render(&self) -> String {
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        };
        format!("{}:{}!{}({columns})", self.alias, self.table, self.foreign_key)
    }
}

/// Projection: plain columns (empty means all) plus embedded relations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Select {
    pub columns: Vec<String>,
    pub embeds: Vec<Embed>,
}

impl Select {
    pub fn render(&self) -> String {
        let mut parts = if self.columns.is_empty() {
            vec!["*".to_string()]
        } else {
            self.columns.clone()
        };
        parts.extend(self.embeds.iter().map(Embed::render));
        parts.join(",")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Select,
    Insert(Vec<Value>),
    Update(Value),
    Delete,
}

/// One call against a table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableQuery {
    pub table: String,
    pub operation: Operation,
    pub select: Select,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    /// Page window as `(offset, limit)`.
    pub window: Option<(u64, u64)>,
    /// Request the exact number of matching rows.
    pub count: bool,
}

impl TableQuery {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.into(),
            operation: Operation::Select,
            select: Select::default(),
            filters: Vec::new(),
            order: Vec::new(),
            window: None,
            count: false,
        }
    }

    /// PostgREST query-string parameters for this query.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.select.render())];
        params.extend(self.filters.iter().map(Filter::to_param));
        if !self.order.is_empty() {
            let order: Vec<String> = self
                .order
                .iter()
                .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
                .collect();
            params.push(("order".into(), order.join(",")));
        }
        if let Some((offset, limit)) = self.window {
            params.push(("offset".into(), offset.to_string()));
            params.push(("limit".into(), limit.to_string()));
        }
        params
    }
}

/// Rows returned by a table call, plus the exact match count when asked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    pub rows: Vec<Value>,
    pub count: Option<u64>,
}

/// Chainable builder returned by [`SupabaseClient::from`].
pub struct QueryBuilder<'a, B: Backend> {
    client: &'a SupabaseClient<B>,
    query: TableQuery,
}

impl<'a, B: Backend> QueryBuilder<'a, B> {
    pub(crate) fn new(client: &'a SupabaseClient<B>, table: &str) -> Self {
        Self {
            client,
            query: TableQuery::new(table),
        }
    }

    /// Comma-separated plain columns; `*` selects all.
    pub fn select(mut self, columns: &str) -> Self {
        self.query.select.columns = columns
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != "*")
            .map(String::from)
            .collect();
        self
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.query.select.embeds.push(embed);
        self
    }

    /// Inserts one object or an array of objects.
    pub fn insert(mut self, rows: Value) -> Self {
        let rows = match rows {
            Value::Array(items) => items,
            other => vec![other],
        };
        self.query.operation = Operation::Insert(rows);
        self
    }

    pub fn update(mut self, patch: Value) -> Self {
        self.query.operation = Operation::Update(patch);
        self
    }

    pub fn delete(mut self) -> Self {
        self.query.operation = Operation::Delete;
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.query.filters.push(Filter::eq(column, value));
        self
    }

    pub fn neq(mut self, column: &str, value: impl ToString) -> Self {
        self.query
            .filters
            .push(Filter::Neq(column.into(), value.to_string()));
        self
    }

    pub fn ilike(mut self, column: &str, pattern: impl Into<String>) -> Self {
        self.query.filters.push(Filter::ilike(column, pattern));
        self
    }

    pub fn in_<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let values = values.into_iter().map(|v| v.to_string()).collect();
        self.query.filters.push(Filter::In(column.into(), values));
        self
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.query.filters.push(Filter::IsNull(column.into()));
        self
    }

    pub fn or(mut self, any_of: Vec<Filter>) -> Self {
        if !any_of.is_empty() {
            self.query.filters.push(Filter::Or(any_of));
        }
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.query.order.push(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    /// Inclusive row range, as in `range(0, 19)` for the first twenty rows.
    pub fn range(mut self, from: u64, to: u64) -> Self {
        let limit = if to < from { 0 } else { to - from + 1 };
        self.query.window = Some((from, limit));
        self
    }

    /// Restricts to one page and asks for the exact total.
    pub fn page(mut self, pagination: Pagination) -> Self {
        self.query.window = Some((pagination.offset, pagination.limit));
        self.query.count = true;
        self
    }

    pub fn count(mut self) -> Self {
        self.query.count = true;
        self
    }

    pub fn into_query(self) -> TableQuery {
        self.query
    }

    pub async fn execute(self) -> Result<QueryOutput, DbError> {
        let QueryBuilder { client, query } = self;
        client.execute(query).await
    }

    /// Exactly one row; no match is [`DbError::NotFound`].
    pub async fn single(self) -> Result<Value, DbError> {
        let entity = self.query.table.clone();
        let key = describe(&self.query.filters);
        let mut rows = self.execute().await?.rows;
        match rows.len() {
            0 => Err(DbError::not_found(&entity, key)),
            1 => Ok(rows.remove(0)),
            n => Err(DbError::Backend {
                status: 406,
                code: Some(NO_SINGLE_ROW.into()),
                message: format!("expected a single {entity} row, found {n}"),
            }),
        }
    }

    /// At most one row.
    pub async fn maybe_single(self) -> Result<Option<Value>, DbError> {
        match self.single().await {
            Ok(row) => Ok(Some(row)),
            Err(DbError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn describe(filters: &[Filter]) -> String {
    filters
        .iter()
        .map(|f| {
            let (column, op) = f.to_param();
            format!("{column}={op}")
        })
        .collect::<Vec<_>>()
        .join("&")
}

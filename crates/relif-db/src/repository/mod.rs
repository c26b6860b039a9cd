//! Hosted-first repository implementations.
//!
//! Every repository wraps a [`crate::SupabaseClient`] and a [`crate::Fallback`]. Built
//! with `new` they talk to the hosted backend only; `with_fallback` adds a
//! legacy API that the policy may route failed calls to.

use relif_core::repository::PaginatedResult;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::DbError;
use crate::query::{Filter, QueryOutput};

/// Declares a repository struct holding the client and its fallback.
macro_rules! hosted_repository {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name<
            B: $crate::backend::Backend,
            L: $crate::legacy::LegacyApi = $crate::legacy::HttpLegacyApi,
        > {
            client: $crate::client::SupabaseClient<B>,
            fallback: $crate::fallback::Fallback<L>,
        }

        impl<B: $crate::backend::Backend> $name<B> {
            /// Hosted backend only.
            pub fn new(client: $crate::client::SupabaseClient<B>) -> Self {
                Self {
                    client,
                    fallback: $crate::fallback::Fallback::none(),
                }
            }
        }

        impl<B: $crate::backend::Backend, L: $crate::legacy::LegacyApi> $name<B, L> {
            pub fn with_fallback(
                client: $crate::client::SupabaseClient<B>,
                legacy: L,
                policy: $crate::fallback::FallbackPolicy,
            ) -> Self {
                Self {
                    client,
                    fallback: $crate::fallback::Fallback::new(legacy, policy),
                }
            }
        }

        impl<B: $crate::backend::Backend, L: $crate::legacy::LegacyApi + Clone> Clone
            for $name<B, L>
        {
            fn clone(&self) -> Self {
                Self {
                    client: self.client.clone(),
                    fallback: self.fallback.clone(),
                }
            }
        }
    };
}

pub(crate) use hosted_repository;

mod auth;
mod beneficiary;
mod case;
mod housing;
mod inventory;
mod organization;
mod requests;
mod space;
mod user;
mod volunteer;

pub use auth::SupabaseAuthRepository;
pub use beneficiary::SupabaseBeneficiaryRepository;
pub use case::{SupabaseCaseRepository, extract_file_key};
pub use housing::SupabaseHousingRepository;
pub use inventory::SupabaseInventoryRepository;
pub use organization::SupabaseOrganizationRepository;
pub use requests::SupabaseRequestRepository;
pub use space::SupabaseSpaceRepository;
pub use user::SupabaseUserRepository;
pub use volunteer::SupabaseVolunteerRepository;

/// Builds a page from a counted query.
fn page<T>(output: QueryOutput, transform: fn(&Value) -> T) -> PaginatedResult<T> {
    let count = output.count.unwrap_or(output.rows.len() as u64);
    PaginatedResult {
        count,
        data: output.rows.iter().map(transform).collect(),
    }
}

/// First row returned by a write, or not-found when the write matched
/// nothing.
fn first_row(output: QueryOutput, entity: &str, id: impl ToString) -> Result<Value, DbError> {
    output
        .rows
        .into_iter()
        .next()
        .ok_or_else(|| DbError::not_found(entity, id))
}

/// Serializes an update payload, dropping unset (null) fields.
fn changes(input: &impl Serialize) -> Result<Value, DbError> {
    let value = serde_json::to_value(input)?;
    let object: Map<String, Value> = match value {
        Value::Object(map) => map.into_iter().filter(|(_, v)| !v.is_null()).collect(),
        _ => Map::new(),
    };
    Ok(Value::Object(object))
}

/// Case-insensitive substring match of `term` over any of `columns`;
/// empty when the term is blank.
fn search(columns: &[&str], term: &str) -> Vec<Filter> {
    let term = term.trim();
    if term.is_empty() {
        return Vec::new();
    }
    columns
        .iter()
        .map(|c| Filter::ilike(c, format!("%{term}%")))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn changes_drops_unset_fields() {
        #[derive(Serialize)]
        struct Patch {
            name: Option<String>,
            status: Option<String>,
        }
        let patch = changes(&Patch {
            name: Some("North".into()),
            status: None,
        })
        .unwrap();
        assert_eq!(patch, json!({"name": "North"}));
    }

    #[test]
    fn blank_search_adds_no_filter() {
        assert!(search(&["full_name"], "  ").is_empty());
        assert_eq!(
            search(&["full_name", "email"], "ana"),
            vec![
                Filter::ilike("full_name", "%ana%"),
                Filter::ilike("email", "%ana%")
            ]
        );
    }

    #[test]
    fn page_prefers_exact_count() {
        let output = QueryOutput {
            rows: vec![json!({"name": "a"})],
            count: Some(7),
        };
        let result = page(output, |row| row["name"].as_str().unwrap_or_default().to_string());
        assert_eq!(result.count, 7);
        assert_eq!(result.data, vec!["a".to_string()]);
    }
}

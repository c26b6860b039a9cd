//! Relif DB: hosted-backend client, legacy fallback and repository
//! implementations.
//!
//! This crate provides:
//! - The uniform client ([`SupabaseClient`], [`ClientConfig`], [`connect`])
//!   over a pluggable [`Backend`] engine (REST or in-process memory)
//! - Legacy API access and the fallback policy ([`LegacyApi`],
//!   [`Fallback`], [`FallbackPolicy`])
//! - Row transforms, stats aggregation and server-side schema
//! - Repository implementations of the `relif-core` traits

pub mod backend;
mod client;
mod connection;
mod error;
pub mod fallback;
pub mod legacy;
pub mod query;
pub mod repository;
mod schema;
pub mod stats;
pub mod transform;

pub use backend::{Backend, memory::MemoryBackend, rest::RestBackend};
pub use client::{SessionStore, SupabaseClient};
pub use connection::{ClientConfig, connect, connect_legacy};
pub use error::DbError;
pub use fallback::{Fallback, FallbackPolicy, after_commit, empty_on_not_found};
pub use legacy::{HttpLegacyApi, LegacyApi, LegacyRequest};
pub use repository::extract_file_key;
pub use schema::{Migration, PROCEDURES, migration_script, migrations, schema_v1};

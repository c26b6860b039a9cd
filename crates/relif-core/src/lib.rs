//! Relif Core: domain models, error taxonomy, and repository traits
//! shared by every backend implementation.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{RelifError, RelifResult};

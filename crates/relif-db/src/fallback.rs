//! Hosted-first execution with an optional legacy fallback.

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::DbError;
use crate::legacy::{LegacyApi, LegacyRequest};

/// When a failed hosted call is retried against the legacy API.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    #[default]
    Never,
    Always,
    /// Only for errors carrying one of these HTTP statuses.
    OnStatus(Vec<u16>),
}

impl FallbackPolicy {
    pub fn admits(&self, err: &DbError) -> bool {
        match self {
            FallbackPolicy::Never => false,
            FallbackPolicy::Always => true,
            FallbackPolicy::OnStatus(codes) => {
                err.status().is_some_and(|status| codes.contains(&status))
            }
        }
    }
}

/// Runs hosted calls and, when the policy allows, repeats a failed one
/// exactly once against the legacy API.
#[derive(Debug, Clone)]
pub struct Fallback<L> {
    legacy: Option<L>,
    policy: FallbackPolicy,
}

impl<L> Default for Fallback<L> {
    fn default() -> Self {
        Self::none()
    }
}

impl<L> Fallback<L> {
    /// Hosted only; every error propagates.
    pub fn none() -> Self {
        Self {
            legacy: None,
            policy: FallbackPolicy::Never,
        }
    }

    pub fn new(legacy: L, policy: FallbackPolicy) -> Self {
        Self {
            legacy: Some(legacy),
            policy,
        }
    }

    pub fn policy(&self) -> &FallbackPolicy {
        &self.policy
    }
}

impl<L: LegacyApi> Fallback<L> {
    /// Awaits `hosted`; on an admitted error issues `legacy` and decodes
    /// its response into `T` as-is.
    pub async fn run<T, F>(
        &self,
        operation: &str,
        hosted: F,
        legacy: LegacyRequest,
    ) -> Result<T, DbError>
    where
        T: DeserializeOwned,
        F: Future<Output = Result<T, DbError>>,
    {
        match hosted.await {
            Ok(value) => Ok(value),
            Err(err) => {
                let Some(api) = self.fallback_for(&err) else {
                    return Err(err);
                };
                warn!(operation, error = %err, path = %legacy.path, "Hosted call failed, using legacy API");
                let value = api.request(legacy).await?;
                Ok(serde_json::from_value(value)?)
            }
        }
    }

    /// Like [`Fallback::run`] for calls whose response body is ignored.
    pub async fn run_void<F>(
        &self,
        operation: &str,
        hosted: F,
        legacy: LegacyRequest,
    ) -> Result<(), DbError>
    where
        F: Future<Output = Result<(), DbError>>,
    {
        match hosted.await {
            Ok(()) => Ok(()),
            Err(err) => {
                let Some(api) = self.fallback_for(&err) else {
                    return Err(err);
                };
                warn!(operation, error = %err, path = %legacy.path, "Hosted call failed, using legacy API");
                api.request(legacy).await?;
                Ok(())
            }
        }
    }

    fn fallback_for(&self, err: &DbError) -> Option<&L> {
        self.legacy.as_ref().filter(|_| self.policy.admits(err))
    }
}

/// Result of a follow-up step to a write that already committed. A
/// failure is logged and dropped; the committed write is never replayed.
pub fn after_commit<T>(operation: &str, result: Result<T, DbError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(operation, error = %err, "Follow-up to committed write failed");
            None
        }
    }
}

/// Substitutes `T::default()` for a not-found error.
pub fn empty_on_not_found<T: Default>(result: Result<T, DbError>) -> Result<T, DbError> {
    match result {
        Err(err) if err.is_not_found() => Ok(T::default()),
        other => other,
    }
}

//! Hosted-backend configuration and connection setup.

use std::time::Duration;

use tracing::info;

use crate::backend::rest::RestBackend;
use crate::client::{SessionStore, SupabaseClient};
use crate::error::DbError;
use crate::legacy::HttpLegacyApi;

/// Configuration for reaching the hosted backend and the legacy API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Project base URL (e.g., `https://xyz.supabase.co`).
    pub url: String,
    /// Public anonymous key, sent as `apikey` on every request.
    pub anon_key: String,
    /// Base URL of the legacy REST API, if it is still deployed.
    pub legacy_url: Option<String>,
    /// Origin used to build the password-recovery redirect.
    pub site_url: String,
    /// Per-request timeout for HTTP engines.
    pub timeout: Duration,
    /// Storage bucket holding case documents.
    pub documents_bucket: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:54321".into(),
            anon_key: String::new(),
            legacy_url: None,
            site_url: "http://localhost:3000".into(),
            timeout: Duration::from_secs(30),
            documents_bucket: "case-documents".into(),
        }
    }
}

impl ClientConfig {
    /// Reads the configuration from environment variables.
    ///
    /// `SUPABASE_URL` and `SUPABASE_ANON_KEY` are required; everything
    /// else falls back to [`ClientConfig::default`].
    pub fn from_env() -> Result<Self, DbError> {
        let defaults = Self::default();
        let url = required_var("SUPABASE_URL")?;
        let anon_key = required_var("SUPABASE_ANON_KEY")?;

        let timeout = match std::env::var("RELIF_HTTP_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs = raw.parse::<u64>().map_err(|_| {
                    DbError::Config(format!("RELIF_HTTP_TIMEOUT_SECS is not a number: {raw}"))
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => defaults.timeout,
        };

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key,
            legacy_url: std::env::var("RELIF_LEGACY_API_URL").ok(),
            site_url: std::env::var("RELIF_SITE_URL").unwrap_or(defaults.site_url),
            timeout,
            documents_bucket: std::env::var("RELIF_DOCUMENTS_BUCKET")
                .unwrap_or(defaults.documents_bucket),
        })
    }

    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.url)
    }

    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.url)
    }

    pub fn storage_url(&self) -> String {
        format!("{}/storage/v1", self.url)
    }

    pub fn functions_url(&self) -> String {
        format!("{}/functions/v1", self.url)
    }

    /// Where password-reset emails send the user back to.
    pub fn recovery_redirect(&self) -> String {
        format!("{}/recover-password", self.site_url.trim_end_matches('/'))
    }
}

fn required_var(name: &str) -> Result<String, DbError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(DbError::Config(format!(
            "missing required environment variable {name}"
        ))),
    }
}

/// Builds a client talking to the hosted backend over HTTP.
pub fn connect(config: ClientConfig) -> Result<SupabaseClient<RestBackend>, DbError> {
    info!(url = %config.url, "Connecting to hosted backend");
    let backend = RestBackend::new(config.clone())?;
    Ok(SupabaseClient::new(backend, config))
}

/// Builds the legacy API client, sharing `session` with the hosted
/// client. `None` when no legacy URL is configured.
pub fn connect_legacy(
    config: &ClientConfig,
    session: &SessionStore,
) -> Result<Option<HttpLegacyApi>, DbError> {
    let Some(url) = config.legacy_url.as_deref().filter(|url| !url.trim().is_empty()) else {
        return Ok(None);
    };
    info!(url, "Legacy API fallback enabled");
    HttpLegacyApi::new(url, session.clone(), config.timeout).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_client_only_with_url() {
        let session = SessionStore::default();
        let config = ClientConfig::default();
        assert!(connect_legacy(&config, &session).unwrap().is_none());

        let config = ClientConfig {
            legacy_url: Some("  ".into()),
            ..ClientConfig::default()
        };
        assert!(connect_legacy(&config, &session).unwrap().is_none());

        let config = ClientConfig {
            legacy_url: Some("https://api.relif.org/".into()),
            ..ClientConfig::default()
        };
        assert!(connect_legacy(&config, &session).unwrap().is_some());
    }

    #[test]
    fn derived_urls() {
        let config = ClientConfig {
            url: "https://demo.supabase.co".into(),
            site_url: "https://app.relif.org/".into(),
            ..ClientConfig::default()
        };
        assert_eq!(config.rest_url(), "https://demo.supabase.co/rest/v1");
        assert_eq!(config.functions_url(), "https://demo.supabase.co/functions/v1");
        assert_eq!(
            config.recovery_redirect(),
            "https://app.relif.org/recover-password"
        );
    }
}

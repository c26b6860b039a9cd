//! Authentication payloads exchanged with the hosted auth service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::empty_object;
use super::user::Preferences;

/// User record as returned by the auth service (not the `users` table).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    /// Profile fields supplied at sign-up.
    #[serde(default = "empty_object")]
    pub user_metadata: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: String,
    pub user: AuthUser,
}

/// Result of a password sign-in: the auth user and a live session.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedIn {
    pub user: AuthUser,
    pub session: Session,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SignUpInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub preferences: Preferences,
}

/// Sign-up through an organization or platform-admin invite code.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InviteSignUpInput {
    pub code: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub role: String,
}

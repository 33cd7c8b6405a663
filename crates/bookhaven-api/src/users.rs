//! # Users API
//!
//! Registration, mock login, session caching and profile edits.
//!
//! ## Session Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Users & Sessions                                   │
//! │                                                                         │
//! │  register ──► users table (+ session cached)                           │
//! │  login    ──► lookup by email ──► session cached                       │
//! │  logout   ──► session cleared                                          │
//! │  current_user ──► whatever the session cache holds                     │
//! │                                                                         │
//! │  Credentials are MOCK: any password signs in a known email. The       │
//! │  password is validated at registration (length, confirmation) but     │
//! │  never stored - there is nothing to check it against at login.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Emails are unique case-insensitively: a second registration with the
//! same address is rejected before anything is written.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use bookhaven_core::types::{Role, User};
use bookhaven_core::validation::{
    validate_email, validate_name, validate_password, validate_password_confirmation,
};
use bookhaven_core::{CoreError, ValidationError};
use bookhaven_store::Criteria;

use crate::error::ApiError;
use crate::storefront::Inner;

/// Nominal login round-trip, milliseconds.
const LOGIN_MS: u64 = 800;
/// Nominal registration round-trip, milliseconds.
const REGISTER_MS: u64 = 1000;
/// Nominal session read / logout, milliseconds.
const SESSION_MS: u64 = 300;
/// Nominal profile update, milliseconds.
const UPDATE_MS: u64 = 700;

// =============================================================================
// Users API
// =============================================================================

/// User and session operations.
#[derive(Debug, Clone)]
pub struct UsersApi {
    inner: Arc<Inner>,
}

impl UsersApi {
    pub(crate) fn new(inner: Arc<Inner>) -> Self {
        UsersApi { inner }
    }

    /// Registers a new account and signs it in.
    ///
    /// A duplicate email (case-insensitive) rejects the whole call; no
    /// record is created.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<User, ApiError> {
        self.inner.config.latency.pause(REGISTER_MS).await;

        validate_name(name)?;
        validate_email(email)?;
        validate_password(password)?;
        validate_password_confirmation(password, confirm_password)?;

        let email = email.trim();
        if self.find_by_email(email)?.is_some() {
            return Err(ValidationError::Duplicate {
                field: "email".to_string(),
                value: email.to_string(),
            }
            .into());
        }

        let user = self.inner.store.insert(User {
            id: String::new(),
            name: name.trim().to_string(),
            email: email.to_string(),
            role: Role::User,
            created_at: Utc::now(),
        })?;

        self.inner.sessions.save(&user);
        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user)
    }

    /// Signs in an existing account and caches the session.
    ///
    /// Mock credential check: a known email wins, the password is not
    /// verified against anything.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        self.inner.config.latency.pause(LOGIN_MS).await;

        if password.is_empty() {
            return Err(ApiError::auth("Invalid email or password"));
        }

        let user = self
            .find_by_email(email.trim())?
            .ok_or_else(|| ApiError::auth("Invalid email or password"))?;

        self.inner.sessions.save(&user);
        info!(user_id = %user.id, "user logged in");
        Ok(user)
    }

    /// Clears the cached session.
    pub async fn logout(&self) {
        self.inner.config.latency.pause(SESSION_MS).await;
        self.inner.sessions.clear();
        info!("user logged out");
    }

    /// Returns the signed-in user, if any.
    pub async fn current_user(&self) -> Option<User> {
        self.inner.config.latency.pause(SESSION_MS).await;
        self.inner.sessions.load()
    }

    /// Checks whether the cached session belongs to an admin.
    pub fn is_admin(&self) -> bool {
        self.inner
            .sessions
            .load::<User>()
            .map(|u| u.is_admin())
            .unwrap_or(false)
    }

    /// Applies a partial profile edit.
    ///
    /// When the edited account is the signed-in one, the session cache
    /// is refreshed too.
    pub async fn update_profile(
        &self,
        user_id: &str,
        patch: ProfilePatch,
    ) -> Result<User, ApiError> {
        self.inner.config.latency.pause(UPDATE_MS).await;

        let mut fields = Map::new();
        if let Some(name) = patch.name {
            validate_name(&name)?;
            fields.insert("name".to_string(), Value::String(name.trim().to_string()));
        }
        if let Some(email) = patch.email {
            validate_email(&email)?;
            let email = email.trim().to_string();
            // The new address must not belong to someone else
            if let Some(holder) = self.find_by_email(&email)? {
                if holder.id != user_id {
                    return Err(ValidationError::Duplicate {
                        field: "email".to_string(),
                        value: email,
                    }
                    .into());
                }
            }
            fields.insert("email".to_string(), Value::String(email));
        }
        if fields.is_empty() {
            return Err(ApiError::validation("nothing to update"));
        }

        let mut updated: Vec<User> = self
            .inner
            .store
            .update(Value::Object(fields), &Criteria::eq("id", user_id))?;
        let user = updated
            .pop()
            .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()))?;

        if let Some(current) = self.inner.sessions.load::<User>() {
            if current.id == user.id {
                self.inner.sessions.save(&user);
            }
        }

        info!(user_id = %user.id, "profile updated");
        Ok(user)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let needle = email.to_lowercase();
        let users: Vec<User> = self.inner.store.select(&Criteria::All)?;
        Ok(users
            .into_iter()
            .find(|u| u.email.to_lowercase() == needle))
    }
}

/// Partial profile edit. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

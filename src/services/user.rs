//! User service
//!
//! Signup, credential checks and server-side sessions. Every request is
//! resolved to an [`Identity`] through [`UserService::current_identity`].

use crate::db::is_unique_violation;
use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Credentials, Identity, Session, SignupInput, User};
use crate::services::error::{FieldError, ValidationKind};
use crate::services::password::{hash_password, verify_password};
use crate::services::validation::check_signup;
use anyhow::Context;
use chrono::Duration;
use std::sync::Arc;

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Signup form rejected
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for accounts and sessions
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    /// Create a new user service with the default session lifetime
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self::with_session_expiration(user_repo, session_repo, DEFAULT_SESSION_EXPIRATION_DAYS)
    }

    /// Create a new user service with custom session expiration
    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days,
        }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// - `Validation` when a field is missing, malformed, the passwords
    ///   differ or the username is taken
    /// - `InternalError` for database errors
    pub async fn signup(&self, input: SignupInput) -> Result<User, UserServiceError> {
        check_signup(&input).map_err(UserServiceError::Validation)?;

        let username = input.username.trim().to_string();
        if self
            .user_repo
            .exists_by_username(&username)
            .await
            .context("Failed to check username")?
        {
            tracing::warn!(%username, "signup rejected: username taken");
            return Err(username_taken());
        }

        let password_hash = hash_password(&input.password1)?;
        let user = match self.user_repo.create(&User::new(username, password_hash)).await {
            Ok(user) => user,
            Err(e) if is_unique_violation(&e) => return Err(username_taken()),
            Err(e) => return Err(e.context("Failed to create user").into()),
        };

        tracing::info!(user_id = user.id, username = %user.username, "user signed up");
        Ok(user)
    }

    /// Check credentials without opening a session.
    ///
    /// Unknown users and wrong passwords both resolve to `Anonymous`.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Identity, UserServiceError> {
        let Some(user) = self
            .user_repo
            .get_by_username(credentials.username.trim())
            .await
            .context("Failed to get user by username")?
        else {
            return Ok(Identity::Anonymous);
        };

        let valid = verify_password(&credentials.password, &user.password_hash)
            .context("Failed to verify password")?;
        Ok(if valid {
            Identity::Authenticated(user)
        } else {
            Identity::Anonymous
        })
    }

    /// Verify credentials and open a session.
    ///
    /// # Errors
    ///
    /// - `AuthenticationError` if the username is unknown or the password wrong
    /// - `InternalError` for database errors
    pub async fn login(&self, credentials: Credentials) -> Result<Session, UserServiceError> {
        match self.authenticate(&credentials).await? {
            Identity::Authenticated(user) => {
                let session = self.start_session(user.id).await?;
                tracing::info!(user_id = user.id, "user logged in");
                Ok(session)
            }
            Identity::Anonymous => {
                tracing::warn!(username = %credentials.username, "login failed");
                Err(UserServiceError::AuthenticationError(
                    INVALID_CREDENTIALS.to_string(),
                ))
            }
        }
    }

    /// Open a session for a known user without checking a password
    pub async fn start_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let session = Session::issue(user_id, Duration::days(self.session_expiration_days));
        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;
        Ok(created)
    }

    /// Invalidate a session. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        let removed = self
            .session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        tracing::debug!(removed, "session closed");
        Ok(())
    }

    /// Resolve a session token to the caller's identity.
    ///
    /// Missing, unknown and expired tokens are `Anonymous`. An expired
    /// session is deleted on the way.
    pub async fn current_identity(&self, token: Option<&str>) -> Result<Identity, UserServiceError> {
        let Some(token) = token else {
            return Ok(Identity::Anonymous);
        };
        Ok(self.validate_session(token).await?.into())
    }

    /// Validate a session token and return the associated user
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            self.session_repo
                .delete(token)
                .await
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;
        Ok(user)
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?;
        Ok(user)
    }

    /// Delete all expired sessions, returning how many were removed
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        Ok(count)
    }
}

fn username_taken() -> UserServiceError {
    UserServiceError::Validation(vec![FieldError::new(
        "username",
        ValidationKind::UsernameTaken,
        "Пользователь с таким именем уже существует.",
    )])
}

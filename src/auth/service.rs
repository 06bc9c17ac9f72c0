/// Session flows
///
/// Login, refresh, revoke and credential updates built from the pure auth
/// core plus the storage collaborator. Every fallible step ends the flow.

use actix_web::http::header::HeaderMap;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{
    extract_bearer_token, hash_password, issue_access_token_at, resolve_ttl,
    validate_access_token, verify_password, RefreshToken,
};
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError, DatabaseError, ErrorContext};
use crate::store::{AuthStore, NewUser, UserRecord};
use crate::validators::is_valid_email;

/// Attempts at persisting a freshly generated refresh token before giving up
const MAX_REFRESH_TOKEN_ATTEMPTS: u32 = 3;

/// Verified against on unknown emails so every login pays for one bcrypt check
const DUMMY_PASSWORD: &str = "chirpy-unknown-user";

/// Result of a successful password login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: UserRecord,
    pub access_token: String,
    /// Lifetime of `access_token` in seconds
    pub expires_in: i64,
    pub refresh_token: RefreshToken,
}

pub struct AuthService {
    store: Arc<dyn AuthStore>,
    settings: AuthSettings,
    dummy_hash: String,
}

impl AuthService {
    /// # Errors
    /// Returns `AuthError::Hashing` if `settings.password_cost` is out of range
    pub fn new(store: Arc<dyn AuthStore>, settings: AuthSettings) -> Result<Self, AuthError> {
        let dummy_hash = hash_password(DUMMY_PASSWORD, settings.password_cost)?;
        Ok(Self {
            store,
            settings,
            dummy_hash,
        })
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Create an account with a hashed credential
    ///
    /// # Errors
    /// - `AppError::Validation` for a malformed email
    /// - `AuthError::Hashing` if the password cannot be hashed
    /// - `DatabaseError::UniqueConstraintViolation` if the email is taken
    pub async fn register(&self, email: &str, password: &str) -> Result<UserRecord, AppError> {
        let context = ErrorContext::new("user_registration");

        let email = is_valid_email(email)?;
        let hashed_password = self.hash(password).await?;

        let user = self
            .store
            .create_user(NewUser {
                id: Uuid::new_v4(),
                email,
                hashed_password,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(
            request_id = %context.request_id,
            operation = %context.operation,
            user_id = %user.id,
            "User registered successfully"
        );

        Ok(user)
    }

    /// Authenticate with email and password and open a session
    ///
    /// An unknown email and a wrong password both fail with
    /// `AuthError::PasswordMismatch` after one bcrypt verification.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        requested_expiry: Option<i64>,
    ) -> Result<LoginOutcome, AppError> {
        let context = ErrorContext::new("user_login");

        let user = match self.store.find_user_by_email(email.trim()).await? {
            Some(user) => user,
            None => {
                // Result is irrelevant; only the cost matters
                let _ = self.verify(password, &self.dummy_hash).await;
                tracing::warn!(
                    request_id = %context.request_id,
                    operation = %context.operation,
                    "Login for unknown email"
                );
                return Err(AuthError::PasswordMismatch.into());
            }
        };

        self.verify(password, &user.hashed_password).await?;

        let now = Utc::now();
        let expires_in = resolve_ttl(&self.settings, requested_expiry);
        let access_token = issue_access_token_at(user.id, &self.settings, expires_in, now)?;
        let refresh_token = self.persist_new_refresh_token(user.id).await?;

        tracing::info!(
            request_id = %context.request_id,
            operation = %context.operation,
            user_id = %user.id,
            expires_in,
            "User logged in successfully"
        );

        Ok(LoginOutcome {
            user,
            access_token,
            expires_in,
            refresh_token,
        })
    }

    /// Exchange the refresh token in the `Authorization` header for a new access token
    ///
    /// The refresh token itself is not rotated.
    pub async fn refresh(&self, headers: &HeaderMap) -> Result<String, AppError> {
        let context = ErrorContext::new("token_refresh");

        let raw_token = extract_bearer_token(headers)?;
        let record = self
            .store
            .find_refresh_token(&raw_token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let now = Utc::now();
        if let Err(e) = record.check_usable(now) {
            tracing::warn!(
                request_id = %context.request_id,
                operation = %context.operation,
                user_id = %record.user_id,
                reason = %e,
                "Refresh token rejected"
            );
            return Err(e.into());
        }

        let access_token = issue_access_token_at(
            record.user_id,
            &self.settings,
            self.settings.access_token_expiry,
            now,
        )?;

        tracing::info!(
            request_id = %context.request_id,
            operation = %context.operation,
            user_id = %record.user_id,
            "Access token refreshed"
        );

        Ok(access_token)
    }

    /// Revoke the refresh token in the `Authorization` header
    ///
    /// Revoking an already revoked or expired token succeeds and keeps the
    /// original `revoked_at`.
    pub async fn revoke(&self, headers: &HeaderMap) -> Result<RefreshToken, AppError> {
        let context = ErrorContext::new("token_revoke");

        let raw_token = extract_bearer_token(headers)?;
        let record = self
            .store
            .find_refresh_token(&raw_token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let now = Utc::now();
        let revoked = record.revoke_at(now);
        let stored = self
            .store
            .mark_refresh_token_revoked(&revoked.token, revoked.revoked_at.unwrap_or(now))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        tracing::info!(
            request_id = %context.request_id,
            operation = %context.operation,
            user_id = %stored.user_id,
            "Refresh token revoked"
        );

        Ok(stored)
    }

    /// Resolve the user behind the access token in the `Authorization` header
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Uuid, AuthError> {
        let raw_token = extract_bearer_token(headers)?;
        validate_access_token(&raw_token, &self.settings)
    }

    /// Replace a user's email and password hash together
    pub async fn update_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        password: &str,
    ) -> Result<UserRecord, AppError> {
        let context = ErrorContext::new("credential_update");

        let email = is_valid_email(email)?;
        let hashed_password = self.hash(password).await?;

        let user = self
            .store
            .update_credentials(user_id, &email, &hashed_password, Utc::now())
            .await?
            .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))?;

        tracing::info!(
            request_id = %context.request_id,
            operation = %context.operation,
            user_id = %user.id,
            "User credentials updated"
        );

        Ok(user)
    }

    /// Generate and store a refresh token, regenerating on a value collision
    ///
    /// Running out of attempts is a server fault, never a client conflict.
    async fn persist_new_refresh_token(&self, user_id: Uuid) -> Result<RefreshToken, AppError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let record =
                RefreshToken::issue(user_id, self.settings.refresh_token_expiry, Utc::now())?;

            match self.store.insert_refresh_token(&record).await {
                Ok(()) => return Ok(record),
                Err(DatabaseError::UniqueConstraintViolation(_))
                    if attempt < MAX_REFRESH_TOKEN_ATTEMPTS =>
                {
                    tracing::warn!(user_id = %user_id, attempt, "Refresh token collision, regenerating");
                }
                Err(DatabaseError::UniqueConstraintViolation(msg)) => {
                    return Err(AppError::Internal(format!(
                        "Refresh token still colliding after {} attempts: {}",
                        attempt, msg
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    // bcrypt is deliberately slow; keep it off the async workers
    async fn hash(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_string();
        let cost = self.settings.password_cost;

        let hashed = tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))??;

        Ok(hashed)
    }

    async fn verify(&self, password: &str, hashed_password: &str) -> Result<(), AppError> {
        let password = password.to_string();
        let hashed_password = hashed_password.to_string();

        tokio::task::spawn_blocking(move || verify_password(&password, &hashed_password))
            .await
            .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))??;

        Ok(())
    }
}

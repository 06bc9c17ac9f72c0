/// Refresh Token Management
///
/// Refresh tokens are opaque, long-lived credentials tracked server-side:
/// - 256 bits from the OS CSPRNG, hex-encoded to 64 characters
/// - Persisted by the store with the token value as primary key
/// - Usable until `expires_at`, or until revoked, whichever comes first
/// - Never deleted; revocation stamps `revoked_at` once and never clears it
///
/// Nothing here performs I/O. Callers load a record from the store, run the
/// checks below against it, and persist whatever `revoke` returns.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AuthError;

/// Random bytes per refresh token
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Generate a new refresh token value: 64 lowercase hex characters
///
/// Collisions are not checked here; the store's primary key rejects them.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Lifecycle state of a refresh token at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenState {
    Active,
    Expired,
    Revoked,
}

/// A persisted refresh token row
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RefreshToken {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    /// Build a fresh, unrevoked record for `user_id` with a newly generated value
    ///
    /// # Errors
    /// Returns `AuthError::InvalidTtl` if `now + lifetime_seconds` is not representable
    pub fn issue(
        user_id: Uuid,
        lifetime_seconds: i64,
        now: DateTime<Utc>,
    ) -> Result<Self, AuthError> {
        let expires_at = Duration::try_seconds(lifetime_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or(AuthError::InvalidTtl(lifetime_seconds))?;

        Ok(Self {
            token: generate_refresh_token(),
            user_id,
            created_at: now,
            expires_at,
            revoked_at: None,
        })
    }

    /// State at `now`, with expiry taking precedence over revocation
    pub fn state_at(&self, now: DateTime<Utc>) -> RefreshTokenState {
        if now >= self.expires_at {
            RefreshTokenState::Expired
        } else if self.revoked_at.is_some() {
            RefreshTokenState::Revoked
        } else {
            RefreshTokenState::Active
        }
    }

    /// Check that the token may still be exchanged for an access token
    ///
    /// # Errors
    /// - `AuthError::RefreshTokenExpired` once `now` reaches `expires_at`
    /// - `AuthError::RefreshTokenRevoked` if revoked and not yet expired
    pub fn check_usable(&self, now: DateTime<Utc>) -> Result<(), AuthError> {
        match self.state_at(now) {
            RefreshTokenState::Active => Ok(()),
            RefreshTokenState::Expired => Err(AuthError::RefreshTokenExpired),
            RefreshTokenState::Revoked => Err(AuthError::RefreshTokenRevoked),
        }
    }

    /// Revoke the token now
    pub fn revoke(self) -> Self {
        self.revoke_at(Utc::now())
    }

    /// Stamp `revoked_at` with `now` unless it is already set
    pub fn revoke_at(mut self, now: DateTime<Utc>) -> Self {
        if self.revoked_at.is_none() {
            self.revoked_at = Some(now);
        }
        self
    }
}

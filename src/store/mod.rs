/// Storage collaborator
///
/// The auth core never touches storage itself. Session flows go through
/// `AuthStore`; lookups return `Ok(None)` when the row does not exist so a
/// missing record stays distinguishable from a failing database.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::RefreshToken;
use crate::error::DatabaseError;

pub use memory::InMemoryAuthStore;
pub use postgres::PgAuthStore;

pub type StoreResult<T> = Result<T, DatabaseError>;

/// A user row including its credential hash
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>>;

    /// Fails with `UniqueConstraintViolation` if the email is taken
    async fn create_user(&self, user: NewUser) -> StoreResult<UserRecord>;

    /// Replace email and credential hash together; `None` if the user does not exist
    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<UserRecord>>;

    async fn find_refresh_token(&self, token: &str) -> StoreResult<Option<RefreshToken>>;

    /// Fails with `UniqueConstraintViolation` if the token value already exists
    async fn insert_refresh_token(&self, record: &RefreshToken) -> StoreResult<()>;

    /// Set `revoked_at` unless already set and return the stored row
    async fn mark_refresh_token_revoked(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> StoreResult<Option<RefreshToken>>;
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::auth::RefreshToken;
use crate::error::DatabaseError;
use crate::store::{AuthStore, NewUser, StoreResult, UserRecord};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserRecord>,
    refresh_tokens: HashMap<String, RefreshToken>,
}

/// In-process `AuthStore` with the same uniqueness rules as the Postgres schema
///
/// Used by tests and local runs without a database.
#[derive(Default, Clone)]
pub struct InMemoryAuthStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryAuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a refresh token row as-is, bypassing uniqueness checks
    pub fn put_refresh_token(&self, record: RefreshToken) -> StoreResult<()> {
        self.lock()?
            .refresh_tokens
            .insert(record.token.clone(), record);
        Ok(())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| DatabaseError::ConnectionPool("in-memory store poisoned".to_string()))
    }
}

#[async_trait]
impl AuthStore for InMemoryAuthStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<UserRecord> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "users_email_key".to_string(),
            ));
        }

        let record = UserRecord {
            id: user.id,
            email: user.email,
            hashed_password: user.hashed_password,
            created_at: user.created_at,
            updated_at: user.created_at,
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<UserRecord>> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|u| u.email == email && u.id != id) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "users_email_key".to_string(),
            ));
        }

        Ok(tables.users.get_mut(&id).map(|user| {
            user.email = email.to_string();
            user.hashed_password = hashed_password.to_string();
            user.updated_at = updated_at;
            user.clone()
        }))
    }

    async fn find_refresh_token(&self, token: &str) -> StoreResult<Option<RefreshToken>> {
        Ok(self.lock()?.refresh_tokens.get(token).cloned())
    }

    async fn insert_refresh_token(&self, record: &RefreshToken) -> StoreResult<()> {
        let mut tables = self.lock()?;
        if tables.refresh_tokens.contains_key(&record.token) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "refresh_tokens_pkey".to_string(),
            ));
        }
        tables
            .refresh_tokens
            .insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn mark_refresh_token_revoked(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> StoreResult<Option<RefreshToken>> {
        Ok(self.lock()?.refresh_tokens.get_mut(token).map(|record| {
            if record.revoked_at.is_none() {
                record.revoked_at = Some(revoked_at);
            }
            record.clone()
        }))
    }
}

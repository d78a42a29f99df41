//! User store.

use chrono::Utc;
use tokio::sync::RwLock;

use zaulimi_core::{Email, Role, UserId};

use super::RepositoryError;
use crate::models::user::User;

/// A user row together with its password hash.
#[derive(Debug, Clone)]
struct UserRecord {
    user: User,
    password_hash: String,
}

/// Store for registered users, keyed by id and unique by email.
pub struct UserStore {
    inner: RwLock<UsersInner>,
}

struct UsersInner {
    records: Vec<UserRecord>,
    next_id: i32,
}

impl UserStore {
    /// Create an empty store. The first user gets id 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(UsersInner {
                records: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    pub async fn create(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
        role: Role,
    ) -> Result<User, RepositoryError> {
        let mut inner = self.inner.write().await;

        if inner.records.iter().any(|r| &r.user.email == email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let id = UserId::new(inner.next_id);
        inner.next_id = inner
            .next_id
            .checked_add(1)
            .ok_or(RepositoryError::IdsExhausted)?;

        let user = User {
            id,
            name: name.to_owned(),
            email: email.clone(),
            role,
            created_at: Utc::now(),
        };
        inner.records.push(UserRecord {
            user: user.clone(),
            password_hash: password_hash.to_owned(),
        });

        Ok(user)
    }

    /// Get a user and their password hash by email.
    pub async fn get_password_hash(&self, email: &Email) -> Option<(User, String)> {
        self.inner
            .read()
            .await
            .records
            .iter()
            .find(|r| &r.user.email == email)
            .map(|r| (r.user.clone(), r.password_hash.clone()))
    }

    /// Get a user by id.
    pub async fn get_by_id(&self, id: UserId) -> Option<User> {
        self.inner
            .read()
            .await
            .records
            .iter()
            .find(|r| r.user.id == id)
            .map(|r| r.user.clone())
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

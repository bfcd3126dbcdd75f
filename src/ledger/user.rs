use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Opaque credential produced by a [`crate::auth::PasswordHasher`].
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            created_at: Utc::now(),
        }
    }

    /// Matches either the username or the (case-insensitive) email.
    pub fn matches_identifier(&self, identifier: &str) -> bool {
        self.username == identifier || self.email.eq_ignore_ascii_case(identifier)
    }
}

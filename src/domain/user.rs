use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a registered user in the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub full_name: String,
}

impl UserCreate {
    pub fn new(username: impl Into<String>, email: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            full_name: full_name.into(),
        }
    }
}

/// Payload for updating an existing user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

/// Lookup by unique attribute. Both unset selects every user.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub username: Option<String>,
    pub email: Option<String>,
}

impl User {
    /// Emails are unique regardless of letter case.
    pub fn same_email(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
    }
}

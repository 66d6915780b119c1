use chrono::Utc;

use crate::actor_framework::Entity;
use crate::domain::{User, UserCreate, UserFilter, UserPatch};
use super::error::UserError;

fn validate_username(username: &str) -> Result<(), UserError> {
    if username.trim().is_empty() {
        return Err(UserError::ValidationError("Username required".to_string()));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), UserError> {
    if email.trim().is_empty() {
        return Err(UserError::ValidationError("Email required".to_string()));
    }
    if !email.contains('@') {
        return Err(UserError::ValidationError(format!("Invalid email: {}", email)));
    }
    Ok(())
}

impl Entity for User {
    type Id = String;
    type CreateParams = UserCreate;
    type Patch = UserPatch;
    type Filter = UserFilter;
    type Action = ();
    type ActionResult = ();
    type Error = UserError;

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a new User from creation parameters.
    ///
    /// # Arguments
    /// * `id` - Unique identifier for the user
    /// * `params` - User creation parameters containing username, email and full name
    fn from_create_params(id: String, params: UserCreate) -> Result<Self, UserError> {
        validate_username(&params.username)?;
        validate_email(&params.email)?;
        let now = Utc::now();
        Ok(Self {
            id,
            username: params.username,
            email: params.email,
            full_name: params.full_name,
            created_at: now,
            updated_at: now,
        })
    }

    /// Updates the user's profile information.
    ///
    /// # Fields Updated
    /// - `username`: Login name, must stay unique
    /// - `email`: Contact address, must stay unique
    /// - `full_name`: Display name
    fn on_update(&mut self, patch: UserPatch) -> Result<(), UserError> {
        if let Some(username) = patch.username {
            validate_username(&username)?;
            self.username = username;
        }
        if let Some(email) = patch.email {
            validate_email(&email)?;
            self.email = email;
        }
        if let Some(full_name) = patch.full_name {
            self.full_name = full_name;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    fn matches(&self, filter: &UserFilter) -> bool {
        let username_ok = filter
            .username
            .as_deref()
            .map_or(true, |username| self.username == username);
        let email_ok = filter.email.as_deref().map_or(true, |email| self.same_email(email));
        username_ok && email_ok
    }

    fn conflicts_with(&self, other: &Self) -> bool {
        self.username == other.username || self.same_email(&other.email)
    }

    /// Handles user-specific actions.
    ///
    /// Currently, no custom actions are defined for users.
    fn handle_action(&mut self, _action: ()) -> Result<(), UserError> {
        Ok(())
    }
}

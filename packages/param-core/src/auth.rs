//! Users, roles and the capability check applied to mutations.

use serde::{Deserialize, Serialize};

use crate::error::{ParamError, Result};

/// User role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// Stored user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl User {
    /// Returns true for administrators.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Authenticated caller of a database operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    user: User,
}

impl Session {
    /// Wraps an authenticated user.
    pub fn new(user: User) -> Self {
        Self { user }
    }

    /// The logged-in user.
    pub fn user(&self) -> &User {
        &self.user
    }

    /// Fails unless the session belongs to an administrator.
    ///
    /// # Arguments
    /// * `action` - Name of the guarded operation, used in the error
    pub fn require_admin(&self, action: &'static str) -> Result<()> {
        if self.user.is_admin() {
            Ok(())
        } else {
            tracing::warn!(user = %self.user.username, action, "Permission denied");
            Err(ParamError::PermissionDenied { action })
        }
    }
}

/// Finds the user with exactly this username and password.
pub fn authenticate<'a>(users: &'a [User], username: &str, password: &str) -> Result<&'a User> {
    users
        .iter()
        .find(|u| u.username == username && u.password == password)
        .ok_or(ParamError::InvalidCredentials)
}

/// Validates a new account against the existing users.
pub fn validate_new_user(users: &[User], username: &str, password: &str) -> Result<()> {
    if username.is_empty() || password.is_empty() {
        return Err(ParamError::IncompleteCredentials);
    }
    if users.iter().any(|u| u.username == username) {
        return Err(ParamError::UserAlreadyExists(username.to_string()));
    }
    Ok(())
}

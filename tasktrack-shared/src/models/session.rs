/// Session credential and authentication requests
///
/// A [`SessionCredential`] is produced by a successful login and consumed
/// read-only by everything that talks to the task API. Its `Debug` output
/// never includes the bearer token.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::models::id::EntityId;
use crate::models::task::validate_not_blank;

/// Minimal profile of the logged-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: EntityId,

    #[serde(default, alias = "username")]
    pub name: String,

    #[serde(default)]
    pub email: String,
}

/// Bearer token plus the profile it was issued for
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredential {
    pub token: String,
    pub user: UserProfile,
}

impl SessionCredential {
    /// Value of the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Registration response
///
/// Backends answer either with the created user or with a bare message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub user: Option<UserProfile>,

    #[serde(default)]
    pub message: Option<String>,
}

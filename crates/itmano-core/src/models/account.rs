//! Account request and response types.

use serde::{Deserialize, Serialize};

use crate::api::ApiError;

/// Profile returned by `GET /accounts/profile/`.
///
/// `username` is required: a 2xx response without it does not parse and is
/// treated as a malformed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl Profile {
    pub fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Body of a successful `POST /accounts/login/`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Fields of the registration form, sent as-is to `POST /accounts/register/`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegisterForm {
    pub email: String,
    pub username: String,
    pub password: String,
    pub password2: String,
}

impl RegisterForm {
    /// Client-side checks run before the form is submitted.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.username.trim().is_empty() {
            return Err(ApiError::Validation("Username is required".to_string()));
        }
        if !self.email.contains('@') {
            return Err(ApiError::Validation(
                "A valid email address is required".to_string(),
            ));
        }
        if self.password.is_empty() {
            return Err(ApiError::Validation("Password is required".to_string()));
        }
        if self.password != self.password2 {
            return Err(ApiError::Validation("Passwords do not match".to_string()));
        }
        Ok(())
    }
}

/// Body of a successful `POST /accounts/register/`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<Profile>,
    #[serde(default)]
    pub message: Option<String>,
}

impl RegisterResponse {
    /// Username to commit to the session, preferring what the server echoed.
    pub fn username_or<'a>(&'a self, submitted: &'a str) -> &'a str {
        self.user
            .as_ref()
            .map(|u| u.username.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(submitted)
    }
}

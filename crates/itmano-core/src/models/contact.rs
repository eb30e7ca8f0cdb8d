use serde::{Deserialize, Serialize};

use crate::api::ApiError;

/// Contact form submission for `POST /contact/message/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub phone: String,
    pub subject: String,
    pub message: String,
}

impl ContactMessage {
    pub fn validate(&self) -> Result<(), ApiError> {
        let required = [
            ("Name", &self.name),
            ("Subject", &self.subject),
            ("Message", &self.message),
        ];
        for (label, value) in required {
            if value.trim().is_empty() {
                return Err(ApiError::Validation(format!("{} is required", label)));
            }
        }
        if !self.email.contains('@') {
            return Err(ApiError::Validation(
                "A valid email address is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Newsletter signup for `POST /contact/newsletter/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsletterSubscription {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Acknowledgement returned by the contact and newsletter endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactResponse {
    #[serde(default)]
    pub message: Option<String>,
}

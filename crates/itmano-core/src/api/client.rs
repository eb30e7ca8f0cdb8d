//! API client for communicating with the ITMANO REST backend.
//!
//! This module provides the `ApiClient` struct for the account endpoints,
//! the public service catalog and the contact form.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::{
    ContactMessage, ContactResponse, LoginRequest, LoginResponse, NewsletterSubscription, Profile,
    RegisterForm, RegisterResponse, Service,
};

use super::{AccountsBackend, ApiError};

// ============================================================================
// Constants
// ============================================================================

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

const LOGIN_FALLBACK_MESSAGE: &str = "An error occurred during login";
const REGISTER_FALLBACK_MESSAGE: &str = "Registration error occurred.";
const REGISTER_PARSE_MESSAGE: &str = "Unexpected server response. Please try again later.";
const REGISTER_FORMAT_MESSAGE: &str = "Invalid server response format. Please contact support.";

/// A paginated DRF list response
#[derive(Debug, Deserialize)]
struct Page<T> {
    results: Vec<T>,
}

/// API client for the ITMANO backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    initial_backoff: Duration,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url` (e.g. `http://localhost:8000/api`)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Override the first rate-limit backoff delay; it doubles on each retry
    #[cfg(test)]
    pub(crate) fn with_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn token_header(token: &str) -> String {
        format!("Token {}", token)
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// Exchange username and password for a token
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let url = self.url("accounts/login/");
        debug!(username, "Sending login request");

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        let response = Self::check_response(response, Some(LOGIN_FALLBACK_MESSAGE)).await?;
        let login: LoginResponse = Self::parse_json(response).await?;
        info!(username = %login.username, "Login accepted");
        Ok(login)
    }

    /// Create an account. The form is validated locally before anything is sent.
    pub async fn register(&self, form: &RegisterForm) -> Result<RegisterResponse, ApiError> {
        form.validate()?;

        let url = self.url("accounts/register/");
        debug!(username = %form.username, "Sending registration request");

        let response = self.client.post(&url).json(form).send().await?;

        let status = response.status();
        let is_json = Self::is_json_content_type(response.headers());
        let text = response.text().await?;

        Self::parse_register_response(status, is_json, &text)
    }

    /// Interpret a registration response. The content type is checked before
    /// the body is parsed so an HTML error page is reported as such.
    fn parse_register_response(
        status: StatusCode,
        is_json: bool,
        text: &str,
    ) -> Result<RegisterResponse, ApiError> {
        if !is_json {
            warn!(%status, "Registration response was not JSON");
            return Err(ApiError::MalformedResponse(REGISTER_FORMAT_MESSAGE.to_string()));
        }

        if !status.is_success() {
            if serde_json::from_str::<serde_json::Value>(text).is_err() {
                warn!(%status, "Registration error body was not valid JSON");
                return Err(ApiError::MalformedResponse(REGISTER_PARSE_MESSAGE.to_string()));
            }
            return Err(ApiError::from_status(status, text, Some(REGISTER_FALLBACK_MESSAGE)));
        }

        serde_json::from_str(text).map_err(|e| {
            warn!(error = %e, "Failed to parse registration response");
            ApiError::MalformedResponse(REGISTER_PARSE_MESSAGE.to_string())
        })
    }

    /// Fetch the profile owning `token`
    pub async fn fetch_profile(&self, token: &str) -> Result<Profile, ApiError> {
        let url = self.url("accounts/profile/");

        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, Self::token_header(token))
            .send()
            .await?;

        let response = Self::check_response(response, None).await?;
        Self::parse_json(response).await
    }

    /// End the server-side session for `token`. The response body is ignored.
    pub async fn logout(&self, token: &str) -> Result<(), ApiError> {
        let url = self.url("accounts/logout/");

        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, Self::token_header(token))
            .send()
            .await?;

        Self::check_response(response, None).await?;
        Ok(())
    }

    // ========================================================================
    // Services
    // ========================================================================

    /// Fetch the service catalog
    pub async fn fetch_services(&self) -> Result<Vec<Service>, ApiError> {
        let url = self.url("services/");
        let text = self.get_text(&url).await?;
        Self::parse_service_list(&text)
    }

    /// Fetch a single service. The backend looks services up by slug.
    pub async fn fetch_service(&self, slug: &str) -> Result<Service, ApiError> {
        let url = self.url(&Self::service_path(slug)?);
        let text = self.get_text(&url).await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::MalformedResponse(format!("Failed to parse service '{}': {}", slug, e))
        })
    }

    fn service_path(slug: &str) -> Result<String, ApiError> {
        let slug = slug.trim();
        let valid = !slug.is_empty()
            && slug
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ApiError::Validation(format!("Invalid service slug '{}'", slug)));
        }
        Ok(format!("services/{}/", slug))
    }

    /// The catalog endpoint returns either a bare array or a paginated page.
    fn parse_service_list(text: &str) -> Result<Vec<Service>, ApiError> {
        if let Ok(services) = serde_json::from_str::<Vec<Service>>(text) {
            debug!("Parsed services as direct array with {} entries", services.len());
            return Ok(services);
        }

        if let Ok(page) = serde_json::from_str::<Page<Service>>(text) {
            debug!("Parsed services as paginated page with {} entries", page.results.len());
            return Ok(page.results);
        }

        warn!("Unexpected services response structure");
        Err(ApiError::MalformedResponse(
            "Unexpected API response format".to_string(),
        ))
    }

    // ========================================================================
    // Contact
    // ========================================================================

    /// Send a contact form message, returning the server's acknowledgement
    pub async fn submit_contact(&self, message: &ContactMessage) -> Result<Option<String>, ApiError> {
        message.validate()?;
        let url = self.url("contact/message/");
        let response: ContactResponse = self.post_json(&url, message).await?;
        info!(subject = %message.subject, "Contact message sent");
        Ok(response.message)
    }

    /// Subscribe an email address to the newsletter
    pub async fn subscribe_newsletter(
        &self,
        subscription: &NewsletterSubscription,
    ) -> Result<Option<String>, ApiError> {
        if !subscription.email.contains('@') {
            return Err(ApiError::Validation(
                "A valid email address is required".to_string(),
            ));
        }
        let url = self.url("contact/newsletter/");
        // An address already on the list is answered with 200 and a message saying so
        let response: ContactResponse = self.post_json(&url, subscription).await?;
        Ok(response.message)
    }

    // ========================================================================
    // Request helpers
    // ========================================================================

    fn is_json_content_type(headers: &header::HeaderMap) -> bool {
        headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase().contains("application/json"))
            .unwrap_or(false)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: Response) -> Result<Option<Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status() == StatusCode::TOO_MANY_REQUESTS {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body, None))
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response, fallback: Option<&str>) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body, fallback))
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let url = response.url().to_string();
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::MalformedResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    async fn get_text(&self, url: &str) -> Result<String, ApiError> {
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let response = self.client.get(url).send().await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Ok(response.text().await?),
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::Http {
                            status: StatusCode::TOO_MANY_REQUESTS,
                            message: "Rate limited - please wait before retrying".to_string(),
                        });
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(&self, url: &str, body: &B) -> Result<T, ApiError> {
        let response = self.client.post(url).json(body).send().await?;
        let response = Self::check_response(response, None).await?;
        Self::parse_json(response).await
    }
}

#[async_trait]
impl AccountsBackend for ApiClient {
    async fn fetch_profile(&self, token: &str) -> Result<Profile, ApiError> {
        ApiClient::fetch_profile(self, token).await
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        ApiClient::logout(self, token).await
    }
}

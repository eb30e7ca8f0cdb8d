use async_trait::async_trait;

use crate::models::Profile;

use super::ApiError;

/// The account endpoints the session manager needs.
///
/// `ApiClient` is the production implementation; tests substitute a fake
/// so session transitions can be checked without a server.
#[async_trait]
pub trait AccountsBackend: Send + Sync {
    /// Look up the profile that owns `token`.
    async fn fetch_profile(&self, token: &str) -> Result<Profile, ApiError>;

    /// Tell the backend the session for `token` is ending.
    async fn logout(&self, token: &str) -> Result<(), ApiError>;
}

//! REST API client module for the ITMANO backend.
//!
//! This module provides the `ApiClient` for the account endpoints (login,
//! registration, profile, logout), the public service catalog and the
//! contact form.
//!
//! Authenticated endpoints take an opaque DRF token sent as
//! `Authorization: Token <token>`.

pub mod backend;
pub mod client;
pub mod error;

#[cfg(test)]
pub(crate) mod test_server;

pub use backend::AccountsBackend;
pub use client::ApiClient;
pub use error::ApiError;

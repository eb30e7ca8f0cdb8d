//! Core library for the ITMANO client.
//!
//! Provides the pieces every front end shares:
//!
//! - `api`: REST client for the ITMANO backend (accounts, services, contact)
//! - `auth`: the session manager and durable token storage
//! - `config`: API address, token storage backend and timeouts
//! - `models`: request and response types

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{AccountsBackend, ApiClient, ApiError};
pub use auth::{Session, SessionManager, SessionState, TokenStore, User};
pub use config::Config;

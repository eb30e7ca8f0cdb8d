//! Authentication module for managing the signed-in user.
//!
//! This module provides:
//! - `SessionManager`: single source of truth for who is signed in, kept in
//!   sync with a persisted token and the backend's profile endpoint
//! - `TokenStore`: durable storage for the one opaque token, with file,
//!   OS keychain and in-memory backends
//!
//! A session starts anonymous and only becomes authenticated through
//! hydration from a stored token or an explicit login commit.

pub mod keychain;
pub mod session;
pub mod store;

pub use keychain::KeyringTokenStore;
pub use session::{Session, SessionManager, SessionState, User};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};

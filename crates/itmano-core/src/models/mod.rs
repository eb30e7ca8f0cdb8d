//! Data models for ITMANO backend entities.
//!
//! - `Profile`, `LoginResponse`, `RegisterForm`, `RegisterResponse`: account types
//! - `Service`: entries of the public service catalog
//! - `ContactMessage`, `NewsletterSubscription`, `ContactResponse`: contact form payloads

pub mod account;
pub mod contact;
pub mod service;

pub use account::{LoginRequest, LoginResponse, Profile, RegisterForm, RegisterResponse};
pub use contact::{ContactMessage, ContactResponse, NewsletterSubscription};
pub use service::Service;

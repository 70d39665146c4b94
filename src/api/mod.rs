//! API client module for the movie catalog backend.
//!
//! Provides the HTTP client with bearer auth injection, credential stores,
//! the shared error type, and one module per group of endpoints.

pub mod client;
pub mod credentials;
pub mod error;
pub mod favorites;
pub mod movies;
pub mod types;
pub mod users;

pub use client::{extract_response_data, ApiClient, Auth};
pub use credentials::{CredentialKey, CredentialSource, FileCredentials, MemoryCredentials};
#[cfg(feature = "keychain")]
pub use credentials::KeychainCredentials;
pub use error::{ApiError, ErrorKind, GENERIC_FAILURE};

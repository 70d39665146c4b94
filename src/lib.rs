//! Async client for the movie catalog REST API.
//!
//! ```no_run
//! use std::sync::Arc;
//! use movie_api_client::{api, ApiClient, ClientConfig, MemoryCredentials};
//!
//! # async fn run() -> Result<(), api::ApiError> {
//! let client = ApiClient::new(&ClientConfig::from_env(), Arc::new(MemoryCredentials::new()));
//! let login = api::types::LoginRequest {
//!     username: "bob".into(),
//!     password: "hunter2".into(),
//! };
//! api::users::sign_in(&client, &login).await?;
//! let movies = api::movies::list_movies(&client).await?;
//! println!("{}", movies);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;

pub use api::{ApiClient, ApiError, CredentialKey, CredentialSource, FileCredentials, MemoryCredentials};
pub use config::ClientConfig;

//! HTTP client with bearer auth header injection.
//!
//! Credentials are read from the injected [`CredentialSource`] on every call.
//! All outcomes go through one path: non-success statuses and transport
//! failures are logged by [`handle_error`] and returned as [`ApiError`].
//! Success bodies of authenticated calls pass through
//! [`extract_response_data`]; anonymous calls return the body as parsed.

use std::borrow::Cow;
use std::sync::Arc;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::{Map, Value};
use zeroize::Zeroizing;

use super::credentials::{CredentialKey, CredentialSource};
use super::error::{handle_error, ApiError};
use crate::config::ClientConfig;

/// Rendered in place of a credential that is not stored.
pub const MISSING_CREDENTIAL: &str = "null";

/// Whether a request carries the `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    Anonymous,
    Bearer,
}

/// HTTP client wrapper for the movie API.
///
/// Cheap to clone; clones share the connection pool and the credential source.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialSource>,
}

impl ApiClient {
    /// Create a client for the configured backend.
    pub fn new(config: &ClientConfig, credentials: Arc<dyn CredentialSource>) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_else(|e| {
            log::warn!("Falling back to default HTTP client: {}", e);
            Client::new()
        });
        Self {
            client,
            base_url: config.base_url().to_string(),
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialSource> {
        &self.credentials
    }

    /// Absolute URL for a path relative to the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Stored credential as a path segment, `null` when absent.
    pub(crate) fn credential_segment(&self, key: CredentialKey) -> String {
        match self.credentials.get(key) {
            Some(value) => path_segment(&value).into_owned(),
            None => {
                log::warn!("No {} stored, request will target '{}'", key.as_str(), MISSING_CREDENTIAL);
                MISSING_CREDENTIAL.to_string()
            }
        }
    }

    fn authorization(&self) -> Result<HeaderValue, ApiError> {
        let token = self.credentials.get(CredentialKey::Token).map(Zeroizing::new);
        let value = Zeroizing::new(bearer_value(token.as_ref().map(|t| t.as_str())));
        let mut header = HeaderValue::from_str(&value)
            .map_err(|e| ApiError::transport(format!("Invalid authorization header: {}", e)))?;
        header.set_sensitive(true);
        Ok(header)
    }

    /// Send a GET request.
    pub async fn get(&self, path: &str, auth: Auth) -> Result<Value, ApiError> {
        self.send(Method::GET, path, None::<&()>, auth).await
    }

    /// Send a POST request with a JSON body.
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        auth: Auth,
    ) -> Result<Value, ApiError> {
        self.send(Method::POST, path, Some(body), auth).await
    }

    /// Send a PUT request with a JSON body.
    pub async fn put<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        auth: Auth,
    ) -> Result<Value, ApiError> {
        self.send(Method::PUT, path, Some(body), auth).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str, auth: Auth) -> Result<Value, ApiError> {
        self.send(Method::DELETE, path, None::<&()>, auth).await
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&T>,
        auth: Auth,
    ) -> Result<Value, ApiError> {
        let url = self.url(path);
        log::debug!("{} {}", method, url);

        let mut builder = self.client.request(method, &url);
        if auth == Auth::Bearer {
            builder = builder.header(AUTHORIZATION, self.authorization().map_err(handle_error)?);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let body = execute(builder).await.map_err(handle_error)?;
        Ok(match auth {
            Auth::Bearer => extract_response_data(body),
            Auth::Anonymous => body,
        })
    }
}

async fn execute(builder: RequestBuilder) -> Result<Value, ApiError> {
    let resp = builder.send().await?;
    let status = resp.status();
    let bytes = resp.bytes().await?;

    if !status.is_success() {
        return Err(ApiError::server(
            status.as_u16(),
            String::from_utf8_lossy(&bytes),
        ));
    }

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes).map_err(|e| {
        ApiError::server(
            status.as_u16(),
            format!("Failed to parse response body: {}", e),
        )
    })
}

/// Return the body unchanged, or an empty object when it is falsy
/// (`null`, `false`, `0`, `""`).
pub fn extract_response_data(body: Value) -> Value {
    let falsy = match &body {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    };
    if falsy {
        Value::Object(Map::new())
    } else {
        body
    }
}

/// `Authorization` header value for a stored token, `Bearer null` when absent.
pub fn bearer_value(token: Option<&str>) -> String {
    format!("Bearer {}", token.unwrap_or(MISSING_CREDENTIAL))
}

/// Percent-encode a value for use as a single URL path segment.
pub fn path_segment(raw: &str) -> Cow<'_, str> {
    urlencoding::encode(raw)
}

//! Request failures and the shared error handler.
//!
//! Every operation collapses its failure into an [`ApiError`] whose display
//! text is the same generic message. The kind, status code and server
//! message stay available through accessors for callers that want them.

use thiserror::Error;

/// Text shown to users for every failed request.
pub const GENERIC_FAILURE: &str = "Something bad happened; please try again later.";

/// Where a request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No usable response: DNS, refused connection, timeout, body read error.
    Transport,
    /// The server answered with a non-success status, or a success body
    /// that is not JSON.
    Server,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", GENERIC_FAILURE)]
pub struct ApiError {
    kind: ErrorKind,
    status: Option<u16>,
    message: Option<String>,
}

impl ApiError {
    /// A failure before any response was received.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Transport,
            status: None,
            message: Some(message.into()),
        }
    }

    /// A non-success response with its status code and body text.
    pub fn server(status: u16, body: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Server,
            status: Some(status),
            message: Some(body.into()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// HTTP status, only present for server failures.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Client-side message or server body.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The line written to the log for this failure.
    pub fn diagnostic(&self) -> String {
        let message = self.message.as_deref().unwrap_or_default();
        match (self.kind, self.status) {
            (ErrorKind::Server, Some(status)) => {
                format!("Error Status code {}, Error body is: {}", status, message)
            }
            _ => format!("Some error occurred: {}", message),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::transport(err.to_string())
    }
}

/// Log a failed request and hand the error back to the caller.
pub fn handle_error(error: ApiError) -> ApiError {
    log::error!("{}", error.diagnostic());
    error
}

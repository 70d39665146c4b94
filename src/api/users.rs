//! Account endpoints and session management.
//!
//! `register` and `login` are the only unauthenticated calls. `sign_in`
//! wraps `login` and stores the returned token and username in the
//! client's credential source; `sign_out` clears them.

use serde_json::Value;

use super::client::{ApiClient, Auth};
use super::credentials::{CredentialError, CredentialKey};
use super::error::{handle_error, ApiError};
use super::types::{LoginRequest, LoginResponse, UserDetails, UserUpdate};

/// POST /users, returns the created user.
pub async fn register(client: &ApiClient, details: &UserDetails) -> Result<Value, ApiError> {
    log::debug!("Registering user {}", details.username);
    client.post("users", details, Auth::Anonymous).await
}

/// POST /login, returns `{ user, token }`.
///
/// Does not touch the credential source; see [`sign_in`].
pub async fn login(client: &ApiClient, credentials: &LoginRequest) -> Result<Value, ApiError> {
    client.post("login", credentials, Auth::Anonymous).await
}

/// GET /users/{user}
pub async fn get_user(client: &ApiClient) -> Result<Value, ApiError> {
    let user = client.credential_segment(CredentialKey::User);
    client.get(&format!("users/{}", user), Auth::Bearer).await
}

/// PUT /users/{Username}, returns the updated user.
pub async fn edit_user(client: &ApiClient, update: &UserUpdate) -> Result<Value, ApiError> {
    let username = client.credential_segment(CredentialKey::Username);
    client
        .put(&format!("users/{}", username), update, Auth::Bearer)
        .await
}

/// DELETE /users/{user}, returns the server's confirmation.
pub async fn delete_user(client: &ApiClient) -> Result<Value, ApiError> {
    let user = client.credential_segment(CredentialKey::User);
    client.delete(&format!("users/{}", user), Auth::Bearer).await
}

/// Log in and persist the session.
///
/// Stores `token`, `user` and `Username` in the credential source and
/// returns the raw login payload.
pub async fn sign_in(client: &ApiClient, credentials: &LoginRequest) -> Result<Value, ApiError> {
    let payload = login(client, credentials).await?;

    let session: LoginResponse = serde_json::from_value(payload.clone()).map_err(|e| {
        handle_error(ApiError::transport(format!(
            "Unexpected login response: {}",
            e
        )))
    })?;

    store_session(client, &session).map_err(|e| {
        handle_error(ApiError::transport(format!(
            "Failed to store session: {}",
            e
        )))
    })?;

    log::info!("Signed in as {}", session.user.username);
    Ok(payload)
}

/// Remove the stored session. Succeeds when nothing is stored.
pub fn sign_out(client: &ApiClient) -> Result<(), CredentialError> {
    for key in CredentialKey::ALL {
        client.credentials().remove(key)?;
    }
    log::info!("Signed out");
    Ok(())
}

/// Write all three session keys, or none of them.
fn store_session(client: &ApiClient, session: &LoginResponse) -> Result<(), CredentialError> {
    let store = client.credentials();
    let entries = [
        (CredentialKey::Token, session.token.as_str()),
        (CredentialKey::User, session.user.username.as_str()),
        (CredentialKey::Username, session.user.username.as_str()),
    ];

    for (written, (key, value)) in entries.iter().enumerate() {
        if let Err(e) = store.set(*key, value) {
            for (stored, _) in &entries[..written] {
                if let Err(cleanup) = store.remove(*stored) {
                    log::warn!("Failed to roll back {}: {}", stored.as_str(), cleanup);
                }
            }
            return Err(e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::credentials::{CredentialSource, MemoryCredentials};
    use crate::api::error::ErrorKind;
    use crate::api::favorites;
    use crate::config::ClientConfig;
    use serde_json::json;

    fn client_with(url: &str, credentials: Arc<MemoryCredentials>) -> ApiClient {
        ApiClient::new(&ClientConfig::new(url), credentials)
    }

    fn bob_login() -> LoginRequest {
        LoginRequest {
            username: "bob".to_string(),
            password: "hunter2".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_is_anonymous() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/users")
            .match_header("authorization", mockito::Matcher::Missing)
            .match_body(mockito::Matcher::Json(json!({
                "Username": "bob",
                "Password": "hunter2",
                "Email": "bob@example.com"
            })))
            .with_status(201)
            .with_body(r#"{"_id":"u1","Username":"bob"}"#)
            .create_async()
            .await;

        let client = client_with(&server.url(), Arc::new(MemoryCredentials::new()));
        let details = UserDetails {
            username: "bob".to_string(),
            password: "hunter2".to_string(),
            email: "bob@example.com".to_string(),
            birthday: None,
        };
        let created = register(&client, &details).await.unwrap();

        mock.assert_async().await;
        assert_eq!(created["Username"], "bob");
    }

    #[tokio::test]
    async fn test_login_does_not_store_credentials() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/login")
            .with_status(200)
            .with_body(r#"{"user":{"Username":"bob"},"token":"abc"}"#)
            .create_async()
            .await;

        let store = Arc::new(MemoryCredentials::new());
        let client = client_with(&server.url(), Arc::clone(&store));
        login(&client, &bob_login()).await.unwrap();

        assert_eq!(store.get(CredentialKey::Token), None);
    }

    #[tokio::test]
    async fn test_get_user_and_delete_user_paths() {
        let mut server = mockito::Server::new_async().await;
        let get = server
            .mock("GET", "/users/bob")
            .match_header("authorization", "Bearer abc")
            .with_status(200)
            .with_body(r#"{"Username":"bob"}"#)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/users/bob")
            .match_header("authorization", "Bearer abc")
            .with_status(200)
            .with_body(r#""bob was deleted.""#)
            .create_async()
            .await;

        let client = client_with(
            &server.url(),
            Arc::new(MemoryCredentials::with_session("abc", "bob")),
        );
        assert_eq!(get_user(&client).await.unwrap()["Username"], "bob");
        assert_eq!(delete_user(&client).await.unwrap(), json!("bob was deleted."));

        get.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_edit_user_puts_partial_update() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/users/bob")
            .match_header("authorization", "Bearer abc")
            .match_body(mockito::Matcher::Json(json!({"Email": "new@example.com"})))
            .with_status(200)
            .with_body(r#"{"Username":"bob","Email":"new@example.com"}"#)
            .create_async()
            .await;

        let client = client_with(
            &server.url(),
            Arc::new(MemoryCredentials::with_session("abc", "bob")),
        );
        let update = UserUpdate {
            email: Some("new@example.com".to_string()),
            ..Default::default()
        };
        let updated = edit_user(&client, &update).await.unwrap();

        mock.assert_async().await;
        assert_eq!(updated["Email"], "new@example.com");
    }

    #[tokio::test]
    async fn test_sign_in_then_list_favorites() {
        let mut server = mockito::Server::new_async().await;
        let login_mock = server
            .mock("POST", "/login")
            .with_status(200)
            .with_body(r#"{"user":{"_id":"u1","Username":"bob"},"token":"abc"}"#)
            .create_async()
            .await;
        let favorites_mock = server
            .mock("GET", "/users/bob/movies")
            .match_header("authorization", "Bearer abc")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let store = Arc::new(MemoryCredentials::new());
        let client = client_with(&server.url(), Arc::clone(&store));

        let payload = sign_in(&client, &bob_login()).await.unwrap();
        assert_eq!(payload["token"], "abc");
        assert_eq!(store.get(CredentialKey::Token).as_deref(), Some("abc"));
        assert_eq!(store.get(CredentialKey::User).as_deref(), Some("bob"));
        assert_eq!(store.get(CredentialKey::Username).as_deref(), Some("bob"));

        let favorites = favorites::list_favorites(&client).await.unwrap();
        assert_eq!(favorites, json!([]));

        login_mock.assert_async().await;
        favorites_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_sign_in_rejected_leaves_store_empty() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/login")
            .with_status(400)
            .with_body(r#"{"message":"Something is not right"}"#)
            .create_async()
            .await;

        let store = Arc::new(MemoryCredentials::new());
        let client = client_with(&server.url(), Arc::clone(&store));
        let err = sign_in(&client, &bob_login()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(err.status(), Some(400));
        assert_eq!(store.get(CredentialKey::Token), None);
    }

    #[tokio::test]
    async fn test_sign_in_unexpected_payload_is_transport_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/login")
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let store = Arc::new(MemoryCredentials::new());
        let client = client_with(&server.url(), Arc::clone(&store));
        let err = sign_in(&client, &bob_login()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.message().unwrap().contains("Unexpected login response"));
        assert_eq!(store.get(CredentialKey::Token), None);
    }

    /// Store that refuses to write the `user` key.
    struct RejectUserStore {
        inner: MemoryCredentials,
    }

    impl CredentialSource for RejectUserStore {
        fn get(&self, key: CredentialKey) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&self, key: CredentialKey, value: &str) -> Result<(), CredentialError> {
            if key == CredentialKey::User {
                return Err(CredentialError::OperationFailed("read-only entry".to_string()));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: CredentialKey) -> Result<(), CredentialError> {
            self.inner.remove(key)
        }
    }

    #[tokio::test]
    async fn test_sign_in_store_failure_leaves_no_partial_session() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/login")
            .with_status(200)
            .with_body(r#"{"user":{"Username":"bob"},"token":"abc"}"#)
            .create_async()
            .await;

        let store = Arc::new(RejectUserStore {
            inner: MemoryCredentials::new(),
        });
        let client = ApiClient::new(&ClientConfig::new(&server.url()), store.clone());
        let err = sign_in(&client, &bob_login()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.message().unwrap().contains("Failed to store session"));
        for key in CredentialKey::ALL {
            assert_eq!(store.get(key), None);
        }
    }

    #[test]
    fn test_sign_out_clears_every_key() {
        let store = Arc::new(MemoryCredentials::with_session("abc", "bob"));
        let client = client_with("http://localhost", Arc::clone(&store));

        sign_out(&client).unwrap();
        for key in CredentialKey::ALL {
            assert_eq!(store.get(key), None);
        }
        // Idempotent
        sign_out(&client).unwrap();
    }
}

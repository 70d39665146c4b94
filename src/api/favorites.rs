//! The signed-in user's list of favorite movies.
//!
//! Listing uses the `user` credential, adding and removing use `Username`.

use serde_json::{json, Value};

use super::client::{path_segment, ApiClient, Auth};
use super::credentials::CredentialKey;
use super::error::ApiError;

/// GET /users/{user}/movies
pub async fn list_favorites(client: &ApiClient) -> Result<Value, ApiError> {
    let user = client.credential_segment(CredentialKey::User);
    client.get(&format!("users/{}/movies", user), Auth::Bearer).await
}

/// POST /users/{Username}/movies/{movie_id} with an empty object body.
///
/// Returns the updated user document.
pub async fn add_favorite(client: &ApiClient, movie_id: &str) -> Result<Value, ApiError> {
    let path = favorite_path(client, movie_id);
    client.post(&path, &json!({}), Auth::Bearer).await
}

/// DELETE /users/{Username}/movies/{movie_id}
///
/// Returns the updated user document.
pub async fn remove_favorite(client: &ApiClient, movie_id: &str) -> Result<Value, ApiError> {
    let path = favorite_path(client, movie_id);
    client.delete(&path, Auth::Bearer).await
}

fn favorite_path(client: &ApiClient, movie_id: &str) -> String {
    let username = client.credential_segment(CredentialKey::Username);
    format!("users/{}/movies/{}", username, path_segment(movie_id))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::credentials::{CredentialSource, MemoryCredentials};
    use crate::config::ClientConfig;

    const MOVIE_ID: &str = "60d5ec49f1a2c8b1f8e4e1a1";

    fn client_with(url: &str, credentials: MemoryCredentials) -> ApiClient {
        ApiClient::new(&ClientConfig::new(url), Arc::new(credentials))
    }

    #[tokio::test]
    async fn test_add_favorite_posts_empty_object() {
        let mut server = mockito::Server::new_async().await;
        let updated = r#"{"Username":"bob","FavoriteMovies":["60d5ec49f1a2c8b1f8e4e1a1"]}"#;
        let mock = server
            .mock("POST", format!("/users/bob/movies/{}", MOVIE_ID).as_str())
            .match_header("authorization", "Bearer abc")
            .match_body(mockito::Matcher::JsonString("{}".to_string()))
            .with_status(200)
            .with_body(updated)
            .create_async()
            .await;

        let client = client_with(&server.url(), MemoryCredentials::with_session("abc", "bob"));
        let body = add_favorite(&client, MOVIE_ID).await.unwrap();

        mock.assert_async().await;
        assert_eq!(body, serde_json::from_str::<Value>(updated).unwrap());
    }

    #[tokio::test]
    async fn test_remove_favorite_uses_username_key() {
        let credentials = MemoryCredentials::new();
        credentials.set(CredentialKey::Token, "abc").unwrap();
        credentials.set(CredentialKey::Username, "bob").unwrap();
        credentials.set(CredentialKey::User, "someone-else").unwrap();

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", format!("/users/bob/movies/{}", MOVIE_ID).as_str())
            .match_header("authorization", "Bearer abc")
            .with_status(200)
            .with_body(r#"{"Username":"bob","FavoriteMovies":[]}"#)
            .create_async()
            .await;

        let body = remove_favorite(&client_with(&server.url(), credentials), MOVIE_ID)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(body["FavoriteMovies"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_list_favorites_uses_user_key() {
        let credentials = MemoryCredentials::new();
        credentials.set(CredentialKey::Token, "abc").unwrap();
        credentials.set(CredentialKey::User, "bob").unwrap();

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/users/bob/movies")
            .match_header("authorization", "Bearer abc")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let body = list_favorites(&client_with(&server.url(), credentials))
            .await
            .unwrap();

        mock.assert_async().await;
        // An empty array is returned as-is, not replaced by {}
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_list_favorites_without_user_targets_null() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/users/null/movies")
            .match_header("authorization", "Bearer null")
            .with_status(401)
            .with_body("Unauthorized")
            .create_async()
            .await;

        let err = list_favorites(&client_with(&server.url(), MemoryCredentials::new()))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(err.status(), Some(401));
    }
}

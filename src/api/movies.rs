//! Catalog lookups: movies, directors and genres.
//!
//! All endpoints require the bearer token. Path parameters are
//! percent-encoded as single segments.

use serde_json::Value;

use super::client::{path_segment, ApiClient, Auth};
use super::error::ApiError;

/// GET /movies, array of every movie in the catalog.
pub async fn list_movies(client: &ApiClient) -> Result<Value, ApiError> {
    client.get("movies", Auth::Bearer).await
}

/// GET /movies/{title}
pub async fn get_movie(client: &ApiClient, title: &str) -> Result<Value, ApiError> {
    let path = format!("movies/{}", path_segment(title));
    client.get(&path, Auth::Bearer).await
}

/// GET /movies/director/{name}
pub async fn get_director(client: &ApiClient, name: &str) -> Result<Value, ApiError> {
    let path = format!("movies/director/{}", path_segment(name));
    client.get(&path, Auth::Bearer).await
}

/// GET /genre/{name}
pub async fn get_genre(client: &ApiClient, name: &str) -> Result<Value, ApiError> {
    let path = format!("genre/{}", path_segment(name));
    client.get(&path, Auth::Bearer).await
}

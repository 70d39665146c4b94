//! Command-line front end for the movie API client.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;

use movie_api_client::api::types::{LoginRequest, Movie, UserDetails, UserUpdate};
use movie_api_client::api::error::handle_error;
use movie_api_client::api::{favorites, movies, users};
use movie_api_client::{ApiClient, ApiError, ClientConfig, CredentialSource, FileCredentials, MemoryCredentials};

#[derive(Parser, Debug)]
#[command(name = "movie-api", version, about = "Browse the movie catalog and manage your account")]
struct Args {
    /// Backend base URL (overrides MOVIE_API_URL / API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session file (defaults to the platform config directory)
    #[arg(long, global = true)]
    credentials: Option<PathBuf>,

    /// Keep the session in the OS keychain instead of a file
    #[cfg(feature = "keychain")]
    #[arg(long, global = true)]
    keychain: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long, env = "MOVIE_API_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        birthday: Option<String>,
    },
    /// Log in and store the session
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "MOVIE_API_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// List every movie
    Movies {
        /// Print one title per line instead of JSON
        #[arg(long)]
        titles: bool,
    },
    /// Show one movie by title
    Movie { title: String },
    /// Show a director by name
    Director { name: String },
    /// Show a genre by name
    Genre { name: String },
    /// Show the signed-in user's profile
    User,
    /// List the signed-in user's favorite movies
    Favorites,
    /// Add a movie to the favorites list
    AddFavorite { movie_id: String },
    /// Remove a movie from the favorites list
    RemoveFavorite { movie_id: String },
    /// Update profile fields
    EditUser {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        birthday: Option<String>,
    },
    /// Delete the signed-in user's account
    DeleteUser,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    env_logger::init();

    let args = Args::parse();

    let mut config = ClientConfig::from_env();
    if let Some(ref url) = args.api_url {
        config = config.with_base_url(url);
    }
    let client = ApiClient::new(&config, credential_source(&args));
    log::debug!("Using API at {}", client.base_url());

    match run(&client, args.command).await {
        Ok(Some(output)) => println!("{}", output),
        Ok(None) => {}
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    }
}

fn credential_source(args: &Args) -> Arc<dyn CredentialSource> {
    if let Some(keychain) = keychain_source(args) {
        return keychain;
    }

    match args.credentials.clone().or_else(FileCredentials::default_path) {
        Some(path) => Arc::new(FileCredentials::new(path)),
        None => {
            log::warn!("No config directory found, session will not be persisted");
            Arc::new(MemoryCredentials::new())
        }
    }
}

#[cfg(feature = "keychain")]
fn keychain_source(args: &Args) -> Option<Arc<dyn CredentialSource>> {
    if args.keychain {
        Some(Arc::new(movie_api_client::api::KeychainCredentials::new()))
    } else {
        None
    }
}

#[cfg(not(feature = "keychain"))]
fn keychain_source(_args: &Args) -> Option<Arc<dyn CredentialSource>> {
    None
}

async fn run(client: &ApiClient, command: Command) -> Result<Option<String>, ApiError> {
    let payload = match command {
        Command::Register {
            username,
            password,
            email,
            birthday,
        } => {
            let details = UserDetails {
                username,
                password,
                email,
                birthday,
            };
            users::register(client, &details).await?
        }
        Command::Login { username, password } => {
            let payload = users::sign_in(client, &LoginRequest { username, password }).await?;
            // The token stays in the credential store
            payload.get("user").cloned().unwrap_or(payload)
        }
        Command::Logout => {
            users::sign_out(client).map_err(|e| handle_error(ApiError::transport(e.to_string())))?;
            return Ok(None);
        }
        Command::Movies { titles } => {
            let payload = movies::list_movies(client).await?;
            if titles {
                return Ok(Some(movie_titles(payload)));
            }
            payload
        }
        Command::Movie { title } => movies::get_movie(client, &title).await?,
        Command::Director { name } => movies::get_director(client, &name).await?,
        Command::Genre { name } => movies::get_genre(client, &name).await?,
        Command::User => users::get_user(client).await?,
        Command::Favorites => favorites::list_favorites(client).await?,
        Command::AddFavorite { movie_id } => favorites::add_favorite(client, &movie_id).await?,
        Command::RemoveFavorite { movie_id } => {
            favorites::remove_favorite(client, &movie_id).await?
        }
        Command::EditUser {
            username,
            password,
            email,
            birthday,
        } => {
            let update = UserUpdate {
                username,
                password,
                email,
                birthday,
            };
            if update.is_empty() {
                log::warn!("No fields given, sending an empty update");
            }
            users::edit_user(client, &update).await?
        }
        Command::DeleteUser => users::delete_user(client).await?,
    };

    Ok(Some(pretty(&payload)))
}

fn pretty(payload: &Value) -> String {
    serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
}

fn movie_titles(payload: Value) -> String {
    match serde_json::from_value::<Vec<Movie>>(payload.clone()) {
        Ok(list) => list
            .into_iter()
            .map(|m| m.title)
            .collect::<Vec<_>>()
            .join("\n"),
        Err(e) => {
            log::warn!("Movie list did not match the expected shape: {}", e);
            pretty(&payload)
        }
    }
}

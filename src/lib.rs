mod api;
mod database;
mod error;
mod models;
mod pagination;
mod repo;
mod schema;
mod settings;
mod validation;

use std::error::Error;
use std::fmt;

use axum::{serve::Serve, Router};
use tokio::net::TcpListener;
use tracing::info;

use api::build_api;
use database::{create_db_pool, DatabaseBookRepo};
use repo::BookRepo;

pub use database::DatabaseError;
pub use error::AppError;
pub use settings::Settings;

/// Connects to the store, makes sure the books table exists and binds the HTTP
/// listener. The returned future runs the server until it fails.
pub async fn start_server(settings: Settings) -> Result<Serve<TcpListener, Router, Router>, StartupError> {
    let pool = create_db_pool(settings.database_url.clone(), settings.pool_size).await?;
    let repo = DatabaseBookRepo::new(pool);

    repo.create_table().await.map_err(StartupError::Schema)?;
    info!("Books table is ready");

    let router = build_api(repo);

    let listener = TcpListener::bind(settings.bind_address())
        .await
        .map_err(StartupError::Bind)?;
    let local_addr = listener.local_addr().map_err(StartupError::Bind)?;
    info!("Listening on {}", local_addr);

    Ok(axum::serve(listener, router))
}

#[derive(Debug)]
pub enum StartupError {
    Database(DatabaseError),
    Schema(AppError),
    Bind(std::io::Error),
}

impl From<DatabaseError> for StartupError {
    fn from(error: DatabaseError) -> Self {
        StartupError::Database(error)
    }
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::Database(e) => write!(f, "could not create the DB connection pool: {e}"),
            StartupError::Schema(e) => write!(f, "could not prepare the books table: {e}"),
            StartupError::Bind(e) => write!(f, "could not bind the HTTP listener: {e}"),
        }
    }
}

impl Error for StartupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StartupError::Database(e) => Some(e),
            StartupError::Schema(e) => Some(e),
            StartupError::Bind(e) => Some(e),
        }
    }
}

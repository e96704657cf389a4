use std::process::ExitCode;

use book_catalog_api::{start_server, Settings};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let server = match start_server(settings).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to start the server: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.await {
        error!("Server stopped with an error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

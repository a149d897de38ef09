use std::net::SocketAddr;

use clap::Parser;
use compile_relay::{config::Config, router, spawn_workers};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();

    // Ensure we are not root
    if nix::unistd::Uid::effective().is_root() && !config.allow_root {
        eprintln!(
            "This server should not be run as root for security reasons \
             (pass --allow-root to override)."
        );
        std::process::exit(1);
    }

    if let Err(e) = tokio::fs::create_dir_all(&config.work_dir).await {
        error!("Failed to create work directory {}: {e}", config.work_dir.display());
        std::process::exit(1);
    }

    let state = spawn_workers(config.compiler_settings(), config.num_workers);
    let app = router(state, &config.index_path, Some(config.rate_limit_per_second));

    let address = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {address}: {e}");
            std::process::exit(1);
        }
    };

    info!("Listening on http://{address}");
    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        error!("Server error: {e}");
        std::process::exit(1);
    }
}

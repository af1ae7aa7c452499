mod api;
mod archive;
mod auth;
mod config;
mod error;
mod state;
mod summary;
mod time;
mod types;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::routes::{router, ApiState};
use crate::archive::FinishedArchive;
use crate::auth::TokenBinder;
use crate::config::Config;
use crate::error::Result;
use crate::state::SessionStore;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let archive = FinishedArchive::load(&cfg.data_file);
    info!(
        "Finished archive ready at {} ({} users)",
        cfg.data_file,
        archive.user_count()
    );

    let state = ApiState {
        binder: TokenBinder::new(),
        sessions: SessionStore::new(),
        archive,
    };
    let app = router(state);

    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

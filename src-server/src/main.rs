mod error;
mod logging;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use shopfloor::{load_config, Config, Database};
use tokio::net::TcpListener;
use tracing::info;

use state::AppState;

#[derive(Debug, Parser)]
#[command(name = "shopfloor-server", version, about = "Shop-floor sequencing and apontamento API")]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address, overrides `server.host`.
    #[arg(long)]
    host: Option<String>,

    /// Listen port, overrides `server.port`.
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database file, overrides `database.path`.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(db) = &self.db {
            config.database.path = db.clone();
        }
        if self.json_logs {
            config.logging.json = true;
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = logging::init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(2);
    }

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server terminated with an error");
        std::process::exit(1);
    }
}

fn load(cli: &Cli) -> Result<Config, shopfloor::ConfigError> {
    let mut config = load_config(cli.config.as_deref())?;
    cli.apply(&mut config);
    shopfloor::config::validate_config(&config)?;
    Ok(config)
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Starting shopfloor-server v{}", env!("CARGO_PKG_VERSION"));

    let db_config = config.database.clone();
    let db = tokio::task::spawn_blocking(move || Database::open(&db_config)).await??;

    let state = AppState::new(db, config.downloads.clone());
    let router = routes::build_router(state, &config.server.cors_origins);

    let addr: SocketAddr = config.server.socket_addr().parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}

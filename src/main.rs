use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pokedex_api::auth::hash_password;
use pokedex_api::config::{config, AppConfig};
use pokedex_api::database::models::{Monster, MonsterCategory, MonsterType, User};
use pokedex_api::database::{DatabaseManager, PgCoordinator, Repository};
use pokedex_api::handlers::{router, AppState};
use pokedex_api::services::{AuthService, CatalogService, MonsterReadService, MonsterWriteService};
use pokedex_api::storage::LocalImageStorage;

#[derive(Parser)]
#[command(name = "pokedex-api")]
#[command(about = "Monster catalog API server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overrides PORT_API")]
        port: Option<u16>,
    },

    #[command(about = "Print a bcrypt hash for seeding a user password")]
    HashPassword { password: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pokedex_api=info,tower_http=info")),
        )
        .init();

    match Cli::parse().command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => serve(config(), port).await,
        Commands::HashPassword { password } => {
            println!("{}", hash_password(&password).context("failed to hash password")?);
            Ok(())
        }
    }
}

async fn serve(config: &AppConfig, port: Option<u16>) -> anyhow::Result<()> {
    info!("Starting pokedex API in {:?} mode", config.environment);
    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_KEY must be set");
    }

    let db = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    let pool = db.pool().clone();
    let deadline = config.request_timeout();

    tokio::fs::create_dir_all(&config.images.dir)
        .await
        .with_context(|| format!("failed to create image directory {}", config.images.dir))?;

    let state = AppState {
        auth: Arc::new(AuthService::new(
            Repository::<User>::new(pool.clone()),
            config.security.jwt_secret.clone(),
            config.security.jwt_expiry_hours,
            deadline,
        )),
        catalog: Arc::new(CatalogService::new(
            Repository::<MonsterCategory>::new(pool.clone()),
            Repository::<MonsterType>::new(pool.clone()),
            deadline,
        )),
        reader: Arc::new(MonsterReadService::new(
            Repository::<Monster>::new(pool.clone()),
            config.server.base_url.clone(),
            deadline,
        )),
        writer: Arc::new(MonsterWriteService::new(
            Repository::<Monster>::new(pool.clone()),
            PgCoordinator::new(pool),
            Arc::new(LocalImageStorage::new(&config.images.dir)),
            deadline,
        )),
        health: Arc::new(db),
        images: Arc::new(config.images.clone()),
        jwt_secret: Arc::from(config.security.jwt_secret.as_str()),
    };

    let app = router(state, config.server.enable_cors);

    let port = port.unwrap_or(config.server.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Pokedex API listening on http://{}", bind_addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

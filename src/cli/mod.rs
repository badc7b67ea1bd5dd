use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::app::{app, AppState};
use crate::auth::issue_session_token;
use crate::config::{AppConfig, StoreBackend};
use crate::database::{DatabaseManager, DocumentStore, MemoryStore, PgDocumentStore};
use crate::models::COLLECTIONS;

#[derive(Parser)]
#[command(name = "movies-to-watch-api")]
#[command(about = "Movies-to-watch tracker REST API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overriding PORT")]
        port: Option<u16>,

        #[arg(long, help = "Use the in-memory store instead of PostgreSQL")]
        memory: bool,
    },

    #[command(about = "Mint a session token for a user identifier")]
    SessionToken {
        #[arg(long, help = "Identifier stored as the owner of the user's reviews and watchlists")]
        user_id: String,

        #[arg(long, help = "Display name shown on the root endpoint")]
        name: Option<String>,
    },
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { port: None, memory: false }) {
        Commands::Serve { port, memory } => serve(config, port, memory).await,
        Commands::SessionToken { user_id, name } => {
            let token = issue_session_token(&config.security, user_id, name)?;
            println!("{}", token);
            Ok(())
        }
    }
}

async fn serve(mut config: AppConfig, port: Option<u16>, memory: bool) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.api.port = port;
    }
    if memory {
        config.database.backend = StoreBackend::Memory;
    }
    config.validate().map_err(anyhow::Error::msg)?;

    info!("Starting movies-to-watch API in {:?} mode", config.environment);

    let store = open_store(&config).await?;
    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let router = app(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Listening on http://{}", bind_addr);
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match config.database.backend {
        StoreBackend::Memory => {
            info!("Using in-memory store; data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database)
                .await
                .context("failed to connect to the database")?;
            let store = PgDocumentStore::new(pool);
            store
                .ensure_collections(COLLECTIONS)
                .await
                .context("failed to prepare collections")?;
            Ok(Arc::new(store))
        }
    }
}

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::sync::Arc;

mod bootstrap;
mod config;
mod controllers;
mod db;
mod error;
mod identity;
mod models;
mod notes;

use config::Config;
use db::Database;
use notes::NoteStore;

pub struct AppState {
    pub db: Arc<Database>,
    pub notes: NoteStore,
    pub config: Config,
}

impl AppState {
    pub fn new(db: Arc<Database>, config: Config) -> Self {
        Self {
            notes: NoteStore::new(Arc::clone(&db)),
            db,
            config,
        }
    }
}

#[derive(Parser)]
#[command(name = "notes-backend", version, about = "Shared notes service with per-field history")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create the `system` and `admin` superuser accounts
    CreateDefaultUsers,
    /// Create users with random usernames
    CreateRandomUsers {
        #[arg(long, default_value_t = 10)]
        count: usize,
    },
    /// Create one shared note for every regular user
    CreateDummyNotes,
    /// Enable or disable login for an account
    SetUserActive {
        #[arg(long)]
        username: String,
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
}

fn to_io(e: error::NotesError) -> std::io::Error {
    std::io::Error::other(e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::from_env();

    log::info!("Notes backend v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Opening database at {}", config.database_url);
    let db = Arc::new(Database::new(&config).map_err(to_io)?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(db, config).await,
        Command::CreateDefaultUsers => {
            bootstrap::create_default_users(&db).map_err(to_io)?;
            Ok(())
        }
        Command::CreateRandomUsers { count } => {
            bootstrap::create_random_users(&db, count).map_err(to_io)?;
            Ok(())
        }
        Command::CreateDummyNotes => {
            bootstrap::create_dummy_notes(&NoteStore::new(db)).map_err(to_io)?;
            Ok(())
        }
        Command::SetUserActive { username, active } => {
            bootstrap::set_user_active(&db, &username, active).map_err(to_io)?;
            Ok(())
        }
    }
}

async fn serve(db: Arc<Database>, config: Config) -> std::io::Result<()> {
    let port = config.port;

    match db.purge_expired_sessions() {
        Ok(0) => {}
        Ok(n) => log::info!("Purged {} expired session(s)", n),
        Err(e) => log::warn!("Failed to purge expired sessions: {}", e),
    }

    log::info!("Starting notes server on port {}", port);

    let state = web::Data::new(AppState::new(db, config));

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .app_data(controllers::json_config())
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config_routes)
            .configure(controllers::auth::config)
            .configure(controllers::notes::config)
    })
    .bind(("0.0.0.0", port))?
    .run();

    // Get server handle for graceful shutdown
    let server_handle = server.handle();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        log::info!("Received Ctrl+C, shutting down...");

        let server_stop = server_handle.stop(true);
        if tokio::time::timeout(std::time::Duration::from_secs(5), server_stop)
            .await
            .is_err()
        {
            log::warn!("Timeout waiting for HTTP server to stop, forcing exit...");
        }

        log::info!("Shutdown complete");
    });

    server.await
}

use axum::{Router, extract::DefaultBodyLimit};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tokio::{net::TcpListener, signal::ctrl_c};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod db;
mod error;
mod handlers;
mod models;

use config::{DatabaseArgs, ServeArgs, Storage};
use handlers::{ApiDoc, AppState};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(version, about = "QR table ordering backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run migrations, then serve HTTP until SIGINT/SIGTERM
    Serve(ServeArgs),
    /// Run pending migrations and exit
    Migrate(DatabaseArgs),
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenv().ok();
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::Migrate(args) => db::run_migrations(args.require_url()?).await,
    }
}

async fn serve(args: ServeArgs) -> Result<(), BoxError> {
    let (state, pool) = match args.storage {
        Storage::Memory => {
            warn!("using in-memory storage, data is lost on exit");
            (AppState::in_memory(args.blob_chunk_size), None)
        }
        Storage::Postgres => {
            let database_url = args.database.require_url()?;
            db::run_migrations(database_url).await?;
            let pool = db::build_pool(database_url, args.pool_size)?;
            (
                AppState::postgres(pool.clone(), args.blob_chunk_size),
                Some(pool),
            )
        }
    };

    let app = Router::new()
        .merge(handlers::router())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(DefaultBodyLimit::max(args.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = TcpListener::bind(args.listen_addr).await?;
    info!("API Gateway listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        pool.close();
        info!("database pool closed");
    }
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

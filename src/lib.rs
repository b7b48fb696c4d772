//! Backend of a language-exchange social app: accounts, friend requests and
//! the friendships they turn into.
//!
//! # Layout
//! - [`friendship`] owns the request lifecycle and is the only writer of
//!   friendship edges.
//! - [`store`] holds the storage traits it runs on, implemented for SQLite.
//! - [`auth`] and [`users`] are the HTTP handlers, mounted under `/api`.
//!
//! # Running
//! ```sh
//! RUST_LOG=tandem=debug,tower_http=info cargo run
//! ```
//! Settings come from the environment or a `.env` file, see [`config::Config`].

pub mod appresult;
pub mod auth;
pub mod config;
pub mod db;
pub mod extract;
pub mod friendship;
pub mod models;
pub mod session;
pub mod store;
pub mod users;

use axum::{
    extract::FromRef,
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    Router,
};
use sqlx::SqlitePool;
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

pub use appresult::{AppError, AppResult};
pub use config::Config;
pub use friendship::FriendManager;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub friends: FriendManager,
}

impl AppState {
    pub fn new(db_pool: SqlitePool) -> Self {
        AppState {
            friends: FriendManager::new(db_pool.clone()),
            db_pool,
        }
    }
}

pub fn app(app_state: AppState, config: &Config) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(config.session_inactivity_days)));

    let origins: Vec<HeaderValue> = config.client_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                warn!("ignoring malformed client origin {origin}");
                None
            }
        })
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .nest("/api/auth", auth::router())
        .nest("/api/users", users::router())

        .with_state(app_state)
        .layer(session_layer)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn start_server() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;

    info!("Connecting to {}...", config.database_url);
    let db_pool = db::connect(&config.database_url, config.database_max_connections).await?;
    let app = app(AppState::new(db_pool), &config);

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

//! Documentation of a protest event intake service.
//!
//! [Publishing](https://www.reddit.com/r/rust/comments/195ao81/publishing_documentation_as_github_page/) docs to GitHub Pages.
//!
//!
//!
//! # General Infrastructure
//! - The form page posts urlencoded bodies to `/form`
//! - Everything is stored in a hosted Supabase project, we only speak PostgREST to it
//! - Bot protection is Cloudflare Turnstile, verified server side before anything is written
//! - Optional Umami instance receives submission funnel events
//!
//!
//!
//! # Endpoints
//!
//! | Method | Path | Notes |
//! |---|---|---|
//! | `POST` | `/form` | `303` to the success page, `400` with field errors, `500` on store failure |
//! | `GET` | `/api/form-options` | states and the five option lists |
//! | `GET` | `/api/protests/{id}` | one protest with its junction lists |
//! | `GET` | `/api/protests/search` | `q`, `limit`, `offset` |
//! | `POST` | `/api/validate-turnstile` | `{ "token": "..." }` |
//! | `GET` | `/health` | |
//!
//!
//!
//! # Notes
//!
//! ## Validation lives in `catalog`
//! The catalog crate has no I/O. The form, its defaults, both validation passes and the store payload are
//! all plain functions over plain structs, so the whole pipeline is tested without a server.
//!
//! ## In-person rule
//! Whether an in-person event also needs crowd sizes changed between form versions. Both versions exist,
//! `IN_PERSON_RULE` picks one at startup.
//!
//!
//!
//! # Setup
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
//!
//! Run locally against a Supabase project.
//! ```sh
//! SUPABASE_URL=https://<project>.supabase.co \
//! SUPABASE_ANON_KEY=<key> \
//! TURNSTILE_SECRET_KEY=<secret> \
//! RUST_LOG=info cargo run
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod analytics;
pub mod config;
pub mod database;
pub mod error;
pub mod protests;
pub mod routes;
pub mod search;
pub mod state;
pub mod submit;
pub mod turnstile;
pub mod utils;

use config::Config;
use routes::{
    form_handler, form_options_handler, health_handler, protest_handler, search_handler,
    validate_turnstile_handler,
};
use state::State;

pub fn router(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/form", post(form_handler))
        .route("/api/form-options", get(form_options_handler))
        .route("/api/protests/search", get(search_handler))
        .route("/api/protests/{id}", get(protest_handler))
        .route("/api/validate-turnstile", post(validate_turnstile_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .with_state(state)
}

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;
    info!("In-person rule: {}", config.in_person_rule);

    info!("Initializing state...");
    let state = State::new(config)?;

    if state.analytics.is_enabled() {
        state.analytics.mark_ready();
        state
            .analytics
            .clone()
            .spawn_flusher(state.config.analytics_flush);
        info!("Analytics enabled");
    }

    info!("Starting server...");
    let app = router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Flushing analytics before exit");
    state.analytics.flush().await;

    info!("Server shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
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

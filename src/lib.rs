//! Documentation of a video voting backend.
//!
//! # General Infrastructure
//! - Frontend shows a fixed lineup of videos (1..=6 by default) and lets a visitor vote once
//! - Voting requires claiming follows on three social platforms; claims are client-supplied and trusted
//! - Deduplication is per network address via a one-way hash, so restarts reset all counts
//! - Everything lives in process memory; an optional JSONL record file keeps an offline trail
//!
//! # Notes
//!
//! ## Why in-memory
//! The whole dataset is six counters and one hash per voter. A database buys
//! nothing here except operational surface; a single mutex over the counters
//! and the voted set already gives the atomicity the dedup check needs.
//! The tradeoff is that a restart starts from zero, which is acceptable for a
//! one-off campaign. The JSONL record file exists for anyone who needs the
//! raw votes afterwards.
//!
//! ## Proxy
//! The backend is expected to sit behind a reverse proxy, so the client
//! address is taken from `X-Forwarded-For` (first entry) when present and
//! from the socket peer otherwise.
use std::{net::SocketAddr, sync::Arc, time::Duration};

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
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;
pub mod sink;
pub mod state;
pub mod store;

use routes::{
    analytics_handler, check_voted_handler, social_verify_handler, vote_handler, votes_handler,
};
use state::State;

pub fn build_router(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/vote", post(vote_handler))
        .route("/votes", get(votes_handler))
        .route("/check-voted", post(check_voted_handler))
        .route("/social-verify", post(social_verify_handler))
        .route("/analytics", get(analytics_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new();

    info!("Starting server...");

    let app = build_router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
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

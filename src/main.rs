// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Clan-Ops API Server
//!
//! Serves the clan's operations tool: equipment issuance, deliveries, cash
//! tickets and goals, time clocking and tuning quotes.

use clan_ops::{config::Config, db, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.store_backend,
        civil_timezone = %config.civil_timezone,
        "Starting Clan-Ops API"
    );

    // Connect the document store before accepting requests
    let store = db::connect(&config).await?;
    tracing::info!("Document store connected");

    let state = Arc::new(AppState::new(config.clone(), store));

    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
        state.users.ensure_admin(username, password).await?;
    }
    if config.retell.is_none() {
        tracing::warn!("RETELL_API_KEY not set; calling proxy disabled");
    }

    // Build router
    let app = clan_ops::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("clan_ops=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}

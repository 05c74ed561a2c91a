// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use monkey_pocket_server::{
    api::{cors_layer, router},
    auth::SessionManager,
    bootstrap::ensure_admin,
    config::{LogFormat, ServerConfig, DEFAULT_LOG_FILTER},
    mailer::{LogMailer, Mailer, SmtpMailer},
    session_sweeper::SessionSweeper,
    state::AppState,
    storage::Database,
};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
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
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env();
    init_tracing(config.log_format);

    info!("Starting Monkey Pocket server...");

    let db_path = config.database_path();
    let db = Database::open(&db_path)?;
    info!(path = %db_path.display(), "Database opened");

    let secret = match &config.session_secret {
        Some(secret) => secret.clone(),
        None => {
            warn!("SESSION_SECRET not set; sessions will not survive a restart");
            SessionManager::generate_secret()?
        }
    };
    let sessions = SessionManager::new(&secret)?;

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => {
            info!(host = %smtp.host, "SMTP delivery enabled");
            Arc::new(SmtpMailer::new(smtp, &config.mail_from)?)
        }
        None => {
            warn!("SMTP_HOST not set; verification codes will only be logged");
            Arc::new(LogMailer)
        }
    };

    let state = AppState::new(db, sessions, mailer);
    ensure_admin(state.db(), config.admin_bootstrap.as_ref())?;

    let shutdown = CancellationToken::new();
    let sweeper = SessionSweeper::new(state.db.clone()).with_interval(config.session_sweep_interval);
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown.clone()));

    let mut app = router(state);
    if let Some(dir) = &config.client_dir {
        info!(dir = %dir.display(), "Serving static client");
        app = app.fallback_service(ServeDir::new(dir));
    }
    let app = app.layer(cors_layer(&config.cors_origin)?);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Monkey Pocket server listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    if let Err(e) = sweeper_handle.await {
        warn!(error = %e, "Session sweeper task failed");
    }
    info!("Server stopped");
    Ok(())
}

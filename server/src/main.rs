//! storefront HTTP server.
//!
//! Run from repo root: `cargo run -p storefront-server`

use storefront::{app, ensure_database_exists, ensure_schema, init_tracing, AppState, Database, Settings};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;
    let _log_guard = init_tracing(&settings.log)?;

    ensure_database_exists(&settings.database.options).await?;
    let db = Database::connect(&settings.database).await?;
    ensure_schema(db.pool()).await?;

    let state = AppState::new(db.clone(), settings.fulfillment);
    let router = app(state);

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!(
        project = %settings.project,
        addr = %listener.local_addr()?,
        policy = ?settings.fulfillment,
        "listening"
    );
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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
    tracing::info!("shutdown signal received");
}

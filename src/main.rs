use std::sync::Arc;

use anyhow::Result;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sensor_dashboard::{
    api,
    app::Dashboard,
    config::Config,
    firebase::FirebaseClient,
    panel::PanelOptions,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env (ignore error if file absent, env vars may be set externally)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    info!(
        database_url = %config.firebase.database_url,
        sensor_path = %config.sensor_path,
        event_log = config.event_log,
        "Configuration loaded"
    );

    // One client signs users in and hands out database transports for them.
    let firebase = FirebaseClient::new(&config);
    let dashboard = Arc::new(Dashboard::new(
        Arc::new(firebase.clone()),
        firebase.transport_factory(),
        PanelOptions {
            sensor_path: config.sensor_path.clone(),
            event_log: config.event_log,
        },
    ));

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, api::router(Arc::clone(&dashboard)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    dashboard.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

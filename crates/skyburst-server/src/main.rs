use tracing_subscriber::EnvFilter;

use skyburst_server::config::ServerConfig;
use skyburst_server::{build_app, spawn_background_tasks};

#[tokio::main]
async fn main() {
    let json_logs = std::env::var("SKYBURST_LOG_FORMAT").is_ok_and(|v| v == "json");
    let builder = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env());
    if json_logs {
        builder.json().init();
    } else {
        builder.init();
    }

    let config = ServerConfig::load();
    config.validate();

    let addr = config.listen_addr.clone();
    let (app, state) = build_app(config);
    spawn_background_tasks(&state);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%addr, "Failed to bind: {e}");
            std::process::exit(1);
        },
    };

    tracing::info!(
        %addr,
        channel = state.relay.channel(),
        "Skyburst server listening"
    );

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

//! Quiz anti-bot service binary entrypoint.
//! Loads configuration, wires the classifier and delivery, and serves the
//! Axum router.

use std::net::SocketAddr;

use quiz_antibot::{
    api::{self, AppState},
    classifier::build_classifier,
    config::AppConfig,
    logging::init_tracing,
    metrics::Metrics,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = match AppConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let metrics = Metrics::init()?;
    let http = quiz_antibot::http_client()?;
    let classifier = build_classifier(&config.classifier, http.clone());
    info!(
        provider = classifier.provider_name(),
        model = %config.classifier.model,
        blacklisted_phones = config.blacklist.phones.len(),
        blacklisted_ips = config.blacklist.ips.len(),
        blacklisted_uas = config.blacklist.user_agents.len(),
        "classifier ready"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(config, classifier, http);
    let app = api::router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "quiz anti-bot listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

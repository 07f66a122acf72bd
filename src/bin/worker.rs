use std::sync::Arc;

use pawtrack::{config::Config, notifications::Mailer, reminders::RedisReminderQueue, worker};
use sea_orm::Database;

const METRICS_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 9091);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        tracing::error!("Worker failed: {}", e);
        eprintln!("pawtrack worker failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> pawtrack::Result<()> {
    let config = Config::from_env()?;
    pawtrack::telemetry::init_telemetry("pawtrack-worker", &config.telemetry);

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    tokio::spawn(async move {
        let app = axum::Router::new()
            .route(
                "/metrics",
                axum::routing::get(|| async move { metric_handle.render() }),
            )
            .layer(prometheus_layer);
        let addr = std::net::SocketAddr::from(METRICS_ADDR);
        tracing::info!("Metrics server listening on {}", addr);
        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                if let Err(e) = axum::serve(listener, app).await {
                    tracing::error!("Metrics server stopped: {}", e);
                }
            }
            Err(e) => tracing::error!("Metrics server could not bind {}: {}", addr, e),
        }
    });

    let db = Database::connect(&config.database_url).await?;
    let redis_client = redis::Client::open(config.redis_url.as_str())?;
    let queue = Arc::new(RedisReminderQueue::new(redis_client));
    let mailer = Mailer::new(config.sendgrid_api_key.clone(), config.email_from.clone())?;

    tracing::info!("Starting reminder worker...");
    tokio::spawn(worker::run_reminder_loop(db, queue, mailer, config.reminder_poll));

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutting down worker process"),
        Err(err) => tracing::error!("Unable to listen for shutdown signal: {}", err),
    }
    Ok(())
}

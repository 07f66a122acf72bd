use std::sync::Arc;

use axum::{routing::get, Router};
use pawtrack::{
    api::{self, ApiSettings, Services, SharedImages},
    auth::SessionRegistry,
    config::Config,
    images::{GcsImageStore, ImageStore},
    migrator,
    notifications::Mailer,
    reminders::RedisReminderQueue,
    store,
};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        tracing::error!("Server failed: {}", e);
        eprintln!("pawtrack server failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> pawtrack::Result<()> {
    let config = Config::from_env()?;
    pawtrack::telemetry::init_telemetry("pawtrack-server", &config.telemetry);

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    let db = Database::connect(&config.database_url).await?;
    migrator::Migrator::up(&db, None).await?;

    if let Some(path) = &config.vet_seed_file {
        let seeded = store::vets::seed_from_file(&db, path).await?;
        tracing::info!("Seeded {} vet clinics from {}", seeded, path);
    }

    pawtrack::metrics::init_metrics(&db).await;

    let redis_client = redis::Client::open(config.redis_url.as_str())?;
    let mailer = Mailer::new(config.sendgrid_api_key.clone(), config.email_from.clone())?;

    let images: SharedImages = match &config.gcs_bucket {
        Some(bucket) => {
            let store: Arc<dyn ImageStore> = Arc::new(GcsImageStore::connect(bucket.clone()).await?);
            Some(store)
        }
        None => {
            tracing::warn!("GCS_BUCKET_NAME not set. Pet photo uploads are disabled.");
            None
        }
    };

    let services = Services {
        db,
        sessions: SessionRegistry::new(config.session_ttl),
        mailer,
        reminders: Arc::new(RedisReminderQueue::new(redis_client)),
        images,
        settings: ApiSettings {
            public_base_url: config.public_base_url.clone(),
            app_base_url: config.app_base_url.clone(),
            recent_login_window: config.recent_login_window,
        },
    };

    let cors_origin = config
        .cors_origin
        .parse::<axum::http::HeaderValue>()
        .map_err(|e| pawtrack::Error::Config(format!("invalid CORS_ORIGIN: {e}")))?;

    let app = app(services, cors_origin, prometheus_layer, metric_handle);

    tracing::info!("listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| pawtrack::Error::Config(format!("cannot bind {}: {e}", config.bind_addr)))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| pawtrack::Error::Internal {
            operation: format!("serve HTTP: {e}"),
        })
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutting down server"),
        Err(err) => tracing::error!("Unable to listen for shutdown signal: {}", err),
    }
}

fn app(
    services: Services,
    cors_origin: axum::http::HeaderValue,
    prometheus_layer: axum_prometheus::PrometheusMetricLayer<'static>,
    metric_handle: metrics_exporter_prometheus::PrometheusHandle,
) -> Router {
    api::router(services)
        .layer(prometheus_layer)
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<axum::body::Body>| {
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched| matched.as_str());

                    // "METHOD /route", e.g. "POST /pets"
                    let span_name = match matched_path {
                        Some(path) => format!("{} {}", request.method(), path),
                        None => format!("{} {}", request.method(), request.uri().path()),
                    };

                    let user_ip = request
                        .headers()
                        .get("x-forwarded-for")
                        .and_then(|v| v.to_str().ok())
                        .or_else(|| {
                            request
                                .headers()
                                .get("x-real-ip")
                                .and_then(|v| v.to_str().ok())
                        })
                        .unwrap_or("unknown");

                    // Handlers fill the empty fields as they go
                    tracing::info_span!(
                        "request",
                        "otel.name" = span_name,
                        user_ip = user_ip,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        table = tracing::field::Empty,
                        action = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        pet_id = tracing::field::Empty,
                        business_event = tracing::field::Empty,
                        error = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency = tracing::field::Empty,
                    )
                })
                .on_request(|_request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {})
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        span.record("status", tracing::field::display(response.status()));
                        span.record("latency", tracing::field::debug(latency));
                        tracing::info!("request completed");
                    },
                ),
        )
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(cors_origin)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PATCH,
                    axum::http::Method::DELETE,
                ])
                .allow_headers([axum::http::header::CONTENT_TYPE])
                .allow_credentials(true),
        )
        .route("/metrics", get(|| async move { metric_handle.render() }))
}

use std::{env, fmt::Display, net::SocketAddr, str::FromStr, time::Duration};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Process configuration, read from the environment (and `.env` when present).
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub bind_addr: SocketAddr,
    pub cors_origin: String,
    pub public_base_url: String,
    pub app_base_url: String,
    pub gcs_bucket: Option<String>,
    pub sendgrid_api_key: Option<String>,
    pub email_from: String,
    pub reminder_poll: Duration,
    pub recent_login_window: Duration,
    pub session_ttl: Duration,
    pub vet_seed_file: Option<String>,
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Default)]
pub struct TelemetryConfig {
    pub json_logs: bool,
    pub otlp_endpoint: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url =
            var("DATABASE_URL").ok_or_else(|| Error::Config("DATABASE_URL must be set".into()))?;

        Ok(Self {
            database_url,
            redis_url: var_or("REDIS_URL", "redis://localhost:6379"),
            bind_addr: parse_or("BIND_ADDR", "0.0.0.0:8000")?,
            cors_origin: var_or("CORS_ORIGIN", "http://localhost:3003"),
            public_base_url: var_or("PUBLIC_BASE_URL", "http://localhost:8000"),
            app_base_url: var_or("APP_BASE_URL", "pawtrack://app"),
            gcs_bucket: var("GCS_BUCKET_NAME"),
            sendgrid_api_key: var("SENDGRID_API_KEY"),
            email_from: var_or("NOTIFICATION_EMAIL_FROM", "reminders@pawtrack.app"),
            reminder_poll: Duration::from_secs(parse_or("REMINDER_POLL_SECS", "30")?),
            recent_login_window: Duration::from_secs(parse_or("RECENT_LOGIN_SECS", "300")?),
            session_ttl: Duration::from_secs(parse_or("SESSION_TTL_SECS", "604800")?),
            vet_seed_file: var("VET_SEED_FILE"),
            telemetry: TelemetryConfig {
                json_logs: var_or("RUST_LOG_FORMAT", "text") == "json",
                otlp_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT"),
            },
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn var_or(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|| {
        debug!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn parse_or<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    var_or(key, default).parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        Error::Config(format!("invalid {key}: {e}"))
    })
}

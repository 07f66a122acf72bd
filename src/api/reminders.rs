use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use super::SharedReminders;
use crate::auth::Session;
use crate::error::Result;
use crate::reminders::Reminder;

pub async fn schedule_reminder(
    Extension(reminders): Extension<SharedReminders>,
    Extension(session): Extension<Session>,
    Json(payload): Json<Reminder>,
) -> Result<impl IntoResponse> {
    payload.validate(chrono::Utc::now())?;
    let queued = reminders.schedule(session.user_id, payload).await?;

    tracing::Span::current()
        .record("table", "reminders")
        .record("action", "schedule_reminder");
    crate::metrics::increment_reminders_scheduled();

    Ok((StatusCode::CREATED, Json(queued)))
}

pub async fn cancel_reminders(
    Extension(reminders): Extension<SharedReminders>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse> {
    let cancelled = reminders.cancel_all(session.user_id).await?;

    tracing::Span::current()
        .record("table", "reminders")
        .record("action", "cancel_reminders");

    Ok(Json(json!({ "cancelled": cancelled })))
}
